//! PDF loading with per-page text and document info metadata

use lopdf::{Dictionary, Document, Object};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, LoadedPage};

/// Upper bound on concurrently running pdf-extract fallback threads
const MAX_EXTRACTION_THREADS: usize = 4;

static EXTRACTION_THREADS: AtomicUsize = AtomicUsize::new(0);

/// A slot in a bounded pool of extraction threads, released on drop
struct ExtractionPermit(&'static AtomicUsize);

impl ExtractionPermit {
    fn try_acquire(counter: &'static AtomicUsize, limit: usize) -> Option<Self> {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit).then_some(n + 1)
            })
            .ok()
            .map(|_| Self(counter))
    }
}

impl Drop for ExtractionPermit {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Replace ligatures and typographic characters that PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    let text = text
        .replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space
        .replace('\u{2010}', "-") // Hyphen
        .replace('\u{2011}', "-") // Non-breaking hyphen
        .replace('\u{2013}', "-") // En dash
        .replace('\u{2014}', "--") // Em dash
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ") // Bullet
        .replace('\u{2026}', "...")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    // Keep paragraph breaks (the splitter prefers them) but collapse runs of
    // blank lines into one.
    let mut cleaned = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run == 1 && !cleaned.is_empty() {
                cleaned.push('\n');
            }
            continue;
        }
        blank_run = 0;
        cleaned.push_str(line);
        cleaned.push('\n');
    }

    cleaned.trim().to_string()
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte-per-char)
fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    let decoded = if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    };

    let decoded = decoded.trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

/// Title and author from the document information dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl PdfInfo {
    fn read(doc: &Document) -> Self {
        let info = match doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => doc.get_object(*id).and_then(Object::as_dict).ok(),
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        };

        match info {
            Some(dict) => Self {
                title: Self::field(dict, b"Title"),
                author: Self::field(dict, b"Author"),
            },
            None => Self::default(),
        }
    }

    fn field(dict: &Dictionary, key: &[u8]) -> Option<String> {
        dict.get(key)
            .and_then(Object::as_str)
            .ok()
            .and_then(decode_pdf_string)
    }
}

/// Loads PDFs into one [`LoadedPage`] per page
pub struct PdfLoader;

impl PdfLoader {
    /// Load a PDF from disk; `source` metadata is the path as given
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<LoadedPage>> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::load_bytes(&path.to_string_lossy(), &data)
    }

    /// Load a PDF held in memory
    pub fn load_bytes(source: &str, data: &[u8]) -> Result<Vec<LoadedPage>> {
        let doc = Document::load_mem(data)
            .map_err(|e| Error::pdf(source, format!("Failed to load PDF: {}", e)))?;

        let info = PdfInfo::read(&doc);
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

        if page_numbers.is_empty() {
            return Err(Error::pdf(source, "PDF has no pages"));
        }

        let mut pages: Vec<LoadedPage> = page_numbers
            .iter()
            .enumerate()
            .map(|(index, &number)| {
                let text = match doc.extract_text(&[number]) {
                    Ok(text) => cleanup_pdf_text(&text),
                    Err(e) => {
                        tracing::debug!("Could not extract text from page {}: {}", number, e);
                        String::new()
                    }
                };
                LoadedPage {
                    content: text,
                    metadata: Self::page_metadata(source, index as u32, &info),
                }
            })
            .collect();

        if pages.iter().all(|p| p.content.is_empty()) {
            tracing::warn!("Per-page extraction found no text in '{}', trying pdf-extract", source);
            match Self::extract_with_timeout(source, data) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    if !text.is_empty() {
                        pages = vec![LoadedPage {
                            content: text,
                            metadata: Self::page_metadata(source, 0, &info),
                        }];
                    }
                }
                Err(e) => tracing::warn!("pdf-extract fallback failed for '{}': {}", source, e),
            }
        }

        tracing::debug!(
            "Loaded '{}': {} pages, title={:?}, author={:?}",
            source,
            pages.len(),
            info.title,
            info.author
        );

        Ok(pages)
    }

    fn page_metadata(source: &str, page: u32, info: &PdfInfo) -> ChunkMetadata {
        let mut metadata = ChunkMetadata::for_page(source, page);
        metadata.title = info.title.clone();
        metadata.author = info.author.clone();
        metadata
    }

    /// Whole-document extraction with a hard wait limit; some fonts make
    /// pdf-extract spin for a very long time.
    ///
    /// A timed-out thread cannot be cancelled and keeps its permit until it
    /// returns, so at most [`MAX_EXTRACTION_THREADS`] can be running at once.
    fn extract_with_timeout(source: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let permit = ExtractionPermit::try_acquire(&EXTRACTION_THREADS, MAX_EXTRACTION_THREADS)
            .ok_or_else(|| {
                tracing::warn!(
                    "{} pdf-extract threads still running; refusing '{}'",
                    MAX_EXTRACTION_THREADS,
                    source
                );
                Error::pdf(source, "too many text extractions in progress")
            })?;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _permit = permit;
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Duration::from_secs(60)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::pdf(source, e.to_string())),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction timeout after 60s - PDF may have complex fonts");
                Err(Error::pdf(source, "text extraction timed out"))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::pdf(source, "text extraction thread crashed"))
            }
        }
    }
}
