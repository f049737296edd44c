//! Wire types returned by the hosted semantic search service

use serde::{Deserialize, Serialize};

/// One ranked result from a semantic search call.
///
/// Every field is optional on the wire. Required fields are checked by
/// [`RelevanceFilter`](crate::retrieval::RelevanceFilter), which reports the
/// offending hit by position instead of failing the whole response decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Unique identifier of the originating document
    #[serde(
        rename = "metadata_storage_path",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_path: Option<String>,

    /// Human-readable file name
    #[serde(
        rename = "metadata_storage_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_name: Option<String>,

    /// Semantic reranker score, 1.0 to 4.0 (higher is better)
    #[serde(
        rename = "@search.rerankerScore",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub rerank_score: Option<f64>,

    /// Page-sized text chunks of the document, in document order
    #[serde(rename = "pages", default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,

    /// Extractive captions attached by the reranker
    #[serde(
        rename = "@search.captions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub captions: Option<Vec<Caption>>,
}

impl SearchHit {
    /// Create a well-formed hit with no name or captions
    pub fn new(source_path: impl Into<String>, rerank_score: f64, chunks: Vec<String>) -> Self {
        Self {
            source_path: Some(source_path.into()),
            source_name: None,
            rerank_score: Some(rerank_score),
            chunks: Some(chunks),
            captions: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn with_captions<I, S>(mut self, captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.captions = Some(captions.into_iter().map(Caption::new).collect());
        self
    }
}

/// Extractive caption for a hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<String>,
}

impl Caption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlights: None,
        }
    }
}

/// Extractive answer produced by the semantic ranker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticAnswer {
    pub key: String,
    pub text: String,
    pub score: f64,
}

/// Body of a search call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total number of matching documents (requested with `$count=true`)
    #[serde(rename = "@odata.count", default)]
    pub total_count: Option<u64>,

    #[serde(rename = "@search.answers", default)]
    pub answers: Vec<SemanticAnswer>,

    /// Hits in rank order
    #[serde(default)]
    pub value: Vec<SearchHit>,
}
