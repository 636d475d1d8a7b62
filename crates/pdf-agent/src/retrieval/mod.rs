//! Retrieval: metadata filters and the self-querying retriever

pub mod filter;
mod self_query;

pub use filter::{Comparator, Filter, FilterSupport, Operator, NO_FILTER};
pub use self_query::{
    document_schema, parse_structured_query, query_constructor_prompt, AttributeInfo,
    SelfQueryRetriever, StructuredQuery, DOCUMENT_CONTENT_DESCRIPTION,
};
