//! Recursive character text splitter
//!
//! Splits on the first separator that occurs in the text (paragraphs, then
//! lines, then words), merges neighbouring pieces back up to `chunk_size`
//! characters with `chunk_overlap` characters of carry-over, and recurses with
//! finer separators into any piece that is still too long. The last resort is
//! cutting between grapheme clusters.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{DocumentChunk, LoadedPage};

/// Default separators, coarsest first; the empty separator means "graphemes"
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Recursive character splitter with character-based length
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators.
    ///
    /// Overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split raw text into chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split pages into chunks that inherit each page's metadata
    pub fn split_pages(&self, pages: &[LoadedPage]) -> Vec<DocumentChunk> {
        pages
            .iter()
            .flat_map(|page| {
                self.split_text(&page.content)
                    .into_iter()
                    .map(|content| DocumentChunk::new(content, page.metadata.clone()))
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // Pick the first separator present in the text
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[i + 1..];
                break;
            }
        }

        let splits = split_keeping_separator(text, separator);

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in splits {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if finer.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily merge pieces into chunks, keeping a tail of up to
    /// `chunk_overlap` characters as the start of the next chunk.
    ///
    /// Separators are already attached to the pieces, so pieces are joined
    /// with nothing in between.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(current.iter().copied()) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some(front) => total -= char_len(front),
                            None => break,
                        }
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_pieces(current.iter().copied()) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(500, 200)
    }
}

/// Split on `separator`, attaching each separator to the piece that follows
/// it. Empty pieces are dropped. The empty separator splits into graphemes.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text.graphemes(true).collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

fn join_pieces<'a>(pieces: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined: String = pieces.collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
