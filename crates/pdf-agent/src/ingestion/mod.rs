//! Document ingestion: PDF loading and recursive splitting

mod parser;
mod processor;
mod splitter;

pub use parser::{PdfInfo, PdfLoader};
pub use processor::{IngestPipeline, MetadataOverrides};
pub use splitter::{RecursiveCharacterSplitter, DEFAULT_SEPARATORS};
