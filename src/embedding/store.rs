//! Volatile in-memory collections of embedded text

use ahash::AHashMap;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryStoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Empty embedding for record {0}")]
    EmptyEmbedding(String),
}

/// One stored piece of text and its embedding
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    /// Where the text came from (file name)
    pub description: String,
    pub embedding: Vec<f32>,
}

/// A recalled record with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryQueryResult {
    pub id: String,
    pub text: String,
    pub description: String,
    pub relevance: f32,
}

#[derive(Debug, Default)]
struct Collection {
    records: Vec<MemoryRecord>,
    positions: AHashMap<String, usize>,
    dimension: Option<usize>,
}

/// Named collections searched by brute-force cosine similarity.
///
/// Meant for the few dozen chunks of a single question; nothing is persisted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: AHashMap<String, Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection if it does not exist yet
    pub fn create_collection(&mut self, name: &str) {
        self.collections.entry(name.to_string()).or_default();
    }

    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of records in a collection (0 if it does not exist)
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map_or(0, |c| c.records.len())
    }

    /// Insert a record, replacing any record with the same id.
    ///
    /// The collection is created on first save and takes its dimension from
    /// the first embedding stored in it.
    pub fn save_information(
        &mut self,
        collection: &str,
        record: MemoryRecord,
    ) -> Result<(), MemoryStoreError> {
        if record.embedding.is_empty() {
            return Err(MemoryStoreError::EmptyEmbedding(record.id));
        }

        let coll = self.collections.entry(collection.to_string()).or_default();

        let expected = *coll.dimension.get_or_insert(record.embedding.len());
        if record.embedding.len() != expected {
            return Err(MemoryStoreError::InvalidDimension {
                expected,
                actual: record.embedding.len(),
            });
        }

        match coll.positions.get(&record.id) {
            Some(&slot) => coll.records[slot] = record,
            None => {
                coll.positions.insert(record.id.clone(), coll.records.len());
                coll.records.push(record);
            }
        }

        Ok(())
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<&MemoryRecord> {
        let coll = self.collections.get(collection)?;
        coll.positions.get(id).map(|&slot| &coll.records[slot])
    }

    /// Records most similar to `query`, best first.
    ///
    /// Results below `min_relevance` are dropped. Equal scores keep insertion
    /// order.
    pub fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
        min_relevance: f32,
    ) -> Result<Vec<MemoryQueryResult>, MemoryStoreError> {
        let coll = self
            .collections
            .get(collection)
            .ok_or_else(|| MemoryStoreError::CollectionNotFound(collection.to_string()))?;

        if let Some(expected) = coll.dimension {
            if query.len() != expected {
                return Err(MemoryStoreError::InvalidDimension {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = coll
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (i, cosine_similarity(query, &record.embedding)))
            .filter(|(_, relevance)| *relevance >= min_relevance)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(i, relevance)| {
                let record = &coll.records[i];
                MemoryQueryResult {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    description: record.description.clone(),
                    relevance,
                }
            })
            .collect())
    }
}

/// Cosine similarity, 0.0 when either vector has zero magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> MemoryRecord {
        MemoryRecord {
            id: id.to_string(),
            text: format!("text of {id}"),
            description: "doc.pdf".to_string(),
            embedding,
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.save_information("c", record("x", vec![1.0, 0.0])).unwrap();
        store.save_information("c", record("y", vec![0.0, 1.0])).unwrap();
        store.save_information("c", record("xy", vec![1.0, 1.0])).unwrap();
        store
    }

    #[test]
    fn test_search_orders_by_relevance() {
        let results = store().search("c", &[1.0, 0.1], 3, -1.0).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "xy", "y"]);
        assert!(results[0].relevance >= results[1].relevance);
    }

    #[test]
    fn test_search_limit_and_min_relevance() {
        let store = store();

        assert_eq!(store.search("c", &[1.0, 0.0], 1, 0.0).unwrap().len(), 1);

        let strict = store.search("c", &[1.0, 0.0], 10, 0.9).unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].id, "x");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut store = MemoryStore::new();
        store.save_information("c", record("first", vec![1.0, 0.0])).unwrap();
        store.save_information("c", record("second", vec![2.0, 0.0])).unwrap();

        let results = store.search("c", &[1.0, 0.0], 2, 0.0).unwrap();
        assert_eq!(results[0].id, "first");
        assert_eq!(results[1].id, "second");
    }

    #[test]
    fn test_save_upserts_by_id() {
        let mut store = store();
        let mut replacement = record("x", vec![0.5, 0.5]);
        replacement.text = "replaced".to_string();
        store.save_information("c", replacement).unwrap();

        assert_eq!(store.len("c"), 3);
        assert_eq!(store.get("c", "x").unwrap().text, "replaced");
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut store = store();
        let err = store
            .save_information("c", record("z", vec![1.0, 0.0, 0.0]))
            .unwrap_err();
        assert_eq!(
            err,
            MemoryStoreError::InvalidDimension {
                expected: 2,
                actual: 3
            }
        );

        assert!(store.search("c", &[1.0], 1, 0.0).is_err());
    }

    #[test]
    fn test_unknown_collection() {
        let err = MemoryStore::new().search("nope", &[1.0], 1, 0.0).unwrap_err();
        assert_eq!(err, MemoryStoreError::CollectionNotFound("nope".to_string()));
    }

    #[test]
    fn test_empty_embedding_rejected() {
        let mut store = MemoryStore::new();
        assert!(store.save_information("c", record("e", vec![])).is_err());
        assert!(store.collections().is_empty());
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
