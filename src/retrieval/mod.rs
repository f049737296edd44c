//! Search hit filtering
//!
//! Turns the ranked hits of one semantic search call into an ordered set of
//! source documents ready for embedding.

mod documents;
mod filter;
mod hit;

pub use documents::{FilteredDocument, FilteredDocuments, KeyedChunk, SourcedChunk};
pub use filter::{
    filter_documents, HitField, MalformedHitError, RelevanceFilter, DEFAULT_CAP,
    DEFAULT_THRESHOLD,
};
pub use hit::{Caption, SearchHit, SearchResponse, SemanticAnswer};
