//! Self-querying retriever
//!
//! An LLM rewrites the user question into a search string plus an optional
//! metadata filter over a fixed attribute schema. The search string is
//! embedded and the vector store is queried with the translated filter.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::providers::{ChatModel, ChatRequest, EmbeddingProvider, VectorStoreProvider};
use crate::types::DocumentChunk;

use super::filter::{self, Comparator, Filter, FilterSupport, Operator};

/// Description of a filterable metadata attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
}

impl AttributeInfo {
    pub fn new(name: &str, description: &str, attribute_type: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            attribute_type: attribute_type.to_string(),
        }
    }
}

/// Description of the indexed documents given to the query constructor
pub const DOCUMENT_CONTENT_DESCRIPTION: &str = "Uploaded Data";

/// The metadata schema every uploaded chunk carries
pub fn document_schema() -> Vec<AttributeInfo> {
    vec![
        AttributeInfo::new("source", "Source of the document", "string"),
        AttributeInfo::new("title", "Title of the document", "string"),
        AttributeInfo::new("author", "Author of the document", "string"),
        AttributeInfo::new(
            "document_type",
            "Type of document, e.g., CV, Report",
            "string",
        ),
    ]
}

/// Search string and filter produced by the query constructor
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub query: String,
    pub filter: Option<Filter>,
}

#[derive(Debug, Deserialize)]
struct RawStructuredQuery {
    #[serde(default)]
    query: String,
    #[serde(default)]
    filter: Option<String>,
}

/// Build the query-constructor prompt for `question`, offering only the
/// comparators and operators in `support`
pub fn query_constructor_prompt(
    content_description: &str,
    schema: &[AttributeInfo],
    support: FilterSupport,
    question: &str,
) -> Result<String> {
    let comparators = support
        .comparators
        .iter()
        .map(Comparator::as_str)
        .collect::<Vec<_>>()
        .join(" | ");
    let operators = support
        .operators
        .iter()
        .map(Operator::as_str)
        .collect::<Vec<_>>()
        .join(" | ");

    let attributes: serde_json::Map<String, serde_json::Value> = schema
        .iter()
        .map(|a| {
            (
                a.name.clone(),
                serde_json::json!({ "description": a.description, "type": a.attribute_type }),
            )
        })
        .collect();
    let attributes = serde_json::to_string_pretty(&attributes)?;

    Ok(format!(
        r#"Your goal is to structure the user's query to match the request schema provided below.

<< Structured Request Schema >>
When responding use a markdown code snippet with a JSON object formatted in the following schema:

```json
{{
    "query": string \ text string to compare to document contents
    "filter": string \ logical condition statement for filtering documents
}}
```

The query string should contain only text that is expected to match the contents of documents. Any conditions in the filter should not be mentioned in the query as well.

A logical condition statement is composed of one or more comparison and logical operation statements.

A comparison statement takes the form: `comp(attr, val)`:
- `comp` ({comparators}): comparator
- `attr` (string): name of attribute to apply the comparison to
- `val` (string): is the comparison value

A logical operation statement takes the form `op(statement1, statement2, ...)`:
- `op` ({operators}): logical operator
- `statement1`, `statement2`, ... (comparison statements or logical operation statements): one or more statements to apply the operation to

Make sure that you only use the comparators and logical operators listed above and no others.
Make sure that filters only refer to attributes that exist in the data source.
Make sure that filters only use the attribute names with its function names if there are functions applied on them.
Make sure that filters take into account the descriptions of attributes and only make comparisons that are feasible given the type of data being stored.
Make sure that filters are only used as needed. If there are no filters that should be applied return "NO_FILTER" for the filter value.

<< Data Source >>
```json
{{
    "content": "{content_description}",
    "attributes": {attributes}
}}
```

<< User Query >>
{question}

<< Structured Request >>
"#
    ))
}

fn json_block() -> &'static Regex {
    static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();
    JSON_BLOCK.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("Invalid regex")
    })
}

/// Parse the constructor's reply into a structured query.
///
/// A filter that fails to parse, names attributes outside `schema`, or uses
/// something outside `support` is dropped with a warning rather than failing
/// the retrieval.
pub fn parse_structured_query(
    reply: &str,
    question: &str,
    schema: &[AttributeInfo],
    support: FilterSupport,
) -> Result<StructuredQuery> {
    let json = match json_block().captures(reply) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => match (reply.find('{'), reply.rfind('}')) {
            (Some(start), Some(end)) if start < end => &reply[start..=end],
            _ => {
                return Err(Error::llm(format!(
                    "Query constructor returned no JSON object: {}",
                    reply
                )))
            }
        },
    };

    let raw: RawStructuredQuery = serde_json::from_str(json)?;

    let query = if raw.query.trim().is_empty() {
        question.to_string()
    } else {
        raw.query.trim().to_string()
    };

    let names: Vec<&str> = schema.iter().map(|a| a.name.as_str()).collect();
    let filter = match Filter::parse(raw.filter.as_deref().unwrap_or(filter::NO_FILTER)) {
        Ok(Some(f)) => match f.validate(&names).and_then(|()| support.check(&f)) {
            Ok(()) => Some(f),
            Err(e) => {
                tracing::warn!("Ignoring filter the store cannot apply: {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Ignoring unparseable filter: {}", e);
            None
        }
    };

    Ok(StructuredQuery { query, filter })
}

/// Retriever that lets the LLM choose metadata filters
pub struct SelfQueryRetriever {
    llm: Arc<dyn ChatModel>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    schema: Vec<AttributeInfo>,
    content_description: String,
    top_k: usize,
}

impl SelfQueryRetriever {
    /// Create a retriever over the document schema
    pub fn new(
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            llm,
            embedder,
            store,
            schema: document_schema(),
            content_description: DOCUMENT_CONTENT_DESCRIPTION.to_string(),
            top_k,
        }
    }

    pub fn schema(&self) -> &[AttributeInfo] {
        &self.schema
    }

    /// Ask the LLM to structure `question`
    pub async fn structure(&self, question: &str) -> Result<StructuredQuery> {
        let support = self.store.filter_support();
        let prompt =
            query_constructor_prompt(&self.content_description, &self.schema, support, question)?;
        let reply = self.llm.complete(ChatRequest::prompt(prompt)).await?;
        parse_structured_query(&reply, question, &self.schema, support)
    }

    /// Retrieve the chunks most relevant to `question`
    pub async fn retrieve(&self, question: &str) -> Result<Vec<DocumentChunk>> {
        let structured = self.structure(question).await?;
        tracing::info!(
            query = %structured.query,
            filter = %filter::describe(structured.filter.as_ref()),
            "Self-query"
        );

        let embedding = self.embedder.embed(&structured.query).await?;
        let results = self
            .store
            .search(&embedding, self.top_k, structured.filter.as_ref())
            .await?;

        tracing::debug!("Retrieved {} chunks from {}", results.len(), self.store.name());
        Ok(results.into_iter().map(|r| r.chunk).collect())
    }
}
