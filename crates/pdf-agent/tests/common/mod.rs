//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use pdf_agent::config::{AgentConfig, VectorStoreBackend};
use pdf_agent::error::{Error, Result};
use pdf_agent::providers::{
    ChatModel, ChatRequest, EmbeddingProvider, MemoryVectorStore, SearchHit, VectorSearchResult,
    VectorStoreProvider, WebSearchProvider,
};
use pdf_agent::retrieval::Filter;
use pdf_agent::types::DocumentChunk;
use pdf_agent::server::state::AppState;

pub const DIMENSIONS: usize = 32;

/// Bag-of-words embedding: each lowercase word bumps one hashed dimension
pub struct HashEmbedder;

impl HashEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; DIMENSIONS];
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            v[(hasher.finish() as usize) % DIMENSIONS] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Chat model replaying canned replies and recording every request
pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| Error::llm("no scripted reply left"))
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Web search returning one fixed hit
pub struct FakeSearch;

#[async_trait]
impl WebSearchProvider for FakeSearch {
    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
        Ok(vec![SearchHit {
            title: format!("About {}", query),
            link: "https://example.com/".to_string(),
            snippet: "Example snippet".to_string(),
        }])
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Memory store whose index can be made unreachable
pub struct FlakyStore {
    inner: MemoryVectorStore,
    reachable: AtomicBool,
}

impl FlakyStore {
    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryVectorStore::new(DIMENSIONS),
            reachable: AtomicBool::new(false),
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl VectorStoreProvider for FlakyStore {
    async fn ensure_index(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            self.inner.ensure_index().await
        } else {
            Err(Error::vector_db("index 'pdf-index' is unreachable"))
        }
    }

    async fn add_chunks(&self, chunks: &[DocumentChunk]) -> Result<usize> {
        self.inner.add_chunks(chunks).await
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<VectorSearchResult>> {
        self.inner.search(query_embedding, top_k, filter).await
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Config pointing uploads at `upload_dir` with an in-memory store
pub fn test_config(upload_dir: &Path) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.server.upload_dir = upload_dir.to_path_buf();
    config.vector_store.backend = VectorStoreBackend::Memory;
    config.embeddings.dimensions = DIMENSIONS;
    config
}

/// App state over fakes; returns the store so tests can inspect it
pub fn test_state(upload_dir: &Path, llm: Arc<ScriptedChat>) -> (AppState, Arc<MemoryVectorStore>) {
    let store = Arc::new(MemoryVectorStore::new(DIMENSIONS));
    (state_with_store(upload_dir, llm, store.clone()), store)
}

/// App state over fakes and the given store
pub fn state_with_store(
    upload_dir: &Path,
    llm: Arc<ScriptedChat>,
    store: Arc<dyn VectorStoreProvider>,
) -> AppState {
    AppState::new(
        test_config(upload_dir),
        Arc::new(HashEmbedder),
        llm,
        store,
        Arc::new(FakeSearch),
    )
}

/// Build a single-page PDF with one text line per entry and an Info title
pub fn sample_pdf(title: &str, lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new(
            "Td",
            vec![72.into(), (750 - 16 * i as i64).into()],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save pdf");
    bytes
}

pub const BOUNDARY: &str = "pdf-agent-test-boundary";

/// Encode a multipart body with one file part and optional text parts
pub fn multipart_body(filename: &str, file: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}
