//! Filtered documents and their downstream projections

use ahash::AHashMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A search hit that passed the relevance gate, with its content capped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredDocument {
    pub source_path: String,
    pub file_name: String,
    pub score: f64,
    pub retained_chunks: Vec<String>,
    pub retained_captions: Vec<String>,
}

/// A chunk paired with the file it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcedChunk {
    pub text: String,
    pub source: String,
}

/// A chunk under a synthesized `<file_name>_<n>` key, n starting at 1 per file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedChunk {
    pub id: String,
    pub text: String,
    pub source: String,
}

/// Documents keyed by source path, in first-seen order.
///
/// Re-inserting an existing path replaces the document in place, so the key
/// keeps the position of its first appearance.
#[derive(Debug, Clone, Default)]
pub struct FilteredDocuments {
    documents: Vec<FilteredDocument>,
    positions: AHashMap<String, usize>,
}

impl PartialEq for FilteredDocuments {
    fn eq(&self, other: &Self) -> bool {
        self.documents == other.documents
    }
}

impl FilteredDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by `source_path`, returning the replaced document
    pub fn insert(&mut self, document: FilteredDocument) -> Option<FilteredDocument> {
        match self.positions.get(&document.source_path) {
            Some(&slot) => Some(std::mem::replace(&mut self.documents[slot], document)),
            None => {
                self.positions
                    .insert(document.source_path.clone(), self.documents.len());
                self.documents.push(document);
                None
            }
        }
    }

    pub fn get(&self, source_path: &str) -> Option<&FilteredDocument> {
        self.positions
            .get(source_path)
            .map(|&slot| &self.documents[slot])
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilteredDocument> {
        self.documents.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|doc| doc.source_path.as_str())
    }

    /// Total number of retained chunks across all documents
    pub fn chunk_count(&self) -> usize {
        self.documents
            .iter()
            .map(|doc| doc.retained_chunks.len())
            .sum()
    }

    /// Flatten retained chunks in key order, tagging each with its file name
    pub fn sourced_chunks(&self) -> Vec<SourcedChunk> {
        self.documents
            .iter()
            .flat_map(|doc| {
                doc.retained_chunks.iter().map(|text| SourcedChunk {
                    text: text.clone(),
                    source: doc.file_name.clone(),
                })
            })
            .collect()
    }

    /// Retained chunks under `<file_name>_<n>` ids.
    ///
    /// Ids depend on the file name only, so two source paths sharing a file
    /// name yield colliding ids.
    pub fn keyed_chunks(&self) -> Vec<KeyedChunk> {
        self.documents
            .iter()
            .flat_map(|doc| {
                doc.retained_chunks
                    .iter()
                    .enumerate()
                    .map(|(i, text)| KeyedChunk {
                        id: format!("{}_{}", doc.file_name, i + 1),
                        text: text.clone(),
                        source: doc.file_name.clone(),
                    })
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FilteredDocuments {
    type Item = &'a FilteredDocument;
    type IntoIter = std::slice::Iter<'a, FilteredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for FilteredDocuments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.documents.len()))?;
        for doc in &self.documents {
            map.serialize_entry(&doc.source_path, doc)?;
        }
        map.end()
    }
}
