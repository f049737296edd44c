//! Relevance gate over semantic search hits

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::documents::{FilteredDocument, FilteredDocuments};
use super::hit::SearchHit;

/// Reranker score a hit must strictly exceed to be kept
pub const DEFAULT_THRESHOLD: f64 = 1.5;

/// Maximum chunks and captions kept per document
pub const DEFAULT_CAP: usize = 10;

/// Required hit field that was absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitField {
    RerankScore,
    SourcePath,
    Chunks,
}

impl fmt::Display for HitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HitField::RerankScore => "@search.rerankerScore",
            HitField::SourcePath => "metadata_storage_path",
            HitField::Chunks => "pages",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed search hit at index {index}: missing {field}")]
pub struct MalformedHitError {
    pub index: usize,
    pub field: HitField,
}

/// Keeps hits whose reranker score clears the threshold, capping their content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceFilter {
    pub threshold: f64,
    pub chunk_cap: usize,
    pub caption_cap: usize,
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            chunk_cap: DEFAULT_CAP,
            caption_cap: DEFAULT_CAP,
        }
    }
}

impl RelevanceFilter {
    pub fn new(threshold: f64, chunk_cap: usize, caption_cap: usize) -> Self {
        Self {
            threshold,
            chunk_cap,
            caption_cap,
        }
    }

    /// Filter hits in the order given.
    ///
    /// A hit is kept only when `rerank_score > threshold`. Later hits with an
    /// already-kept source path replace the earlier document in place. The
    /// first hit missing a required field aborts the call, whatever its score.
    pub fn filter(&self, hits: &[SearchHit]) -> Result<FilteredDocuments, MalformedHitError> {
        let mut documents = FilteredDocuments::new();

        for (index, hit) in hits.iter().enumerate() {
            let (score, path, chunks) = required_fields(index, hit)?;

            // NaN compares false and is dropped here
            let relevant = score > self.threshold;
            if !relevant {
                tracing::debug!(index, path, score, "Dropping hit at or below threshold");
                continue;
            }

            let file_name = hit
                .source_name
                .clone()
                .unwrap_or_else(|| file_name_from_path(path).to_string());

            let retained_captions = hit
                .captions
                .iter()
                .flatten()
                .take(self.caption_cap)
                .map(|caption| caption.text.clone())
                .collect();

            let document = FilteredDocument {
                source_path: path.to_string(),
                file_name,
                score,
                retained_chunks: chunks.iter().take(self.chunk_cap).cloned().collect(),
                retained_captions,
            };

            if documents.insert(document).is_some() {
                tracing::debug!(index, path, "Duplicate source path replaced earlier hit");
            }
        }

        Ok(documents)
    }
}

/// Filter with the default threshold and caps
pub fn filter_documents(hits: &[SearchHit]) -> Result<FilteredDocuments, MalformedHitError> {
    RelevanceFilter::default().filter(hits)
}

fn required_fields(
    index: usize,
    hit: &SearchHit,
) -> Result<(f64, &str, &[String]), MalformedHitError> {
    let missing = |field| MalformedHitError { index, field };

    let score = hit.rerank_score.ok_or(missing(HitField::RerankScore))?;
    let path = hit
        .source_path
        .as_deref()
        .ok_or(missing(HitField::SourcePath))?;
    let chunks = hit.chunks.as_deref().ok_or(missing(HitField::Chunks))?;

    Ok((score, path, chunks))
}

fn file_name_from_path(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(path)
}
