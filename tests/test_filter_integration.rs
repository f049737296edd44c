//! Relevance filter behaviour against realistic search payloads

use docqa::retrieval::{
    filter_documents, FilteredDocuments, HitField, RelevanceFilter, SearchHit, SearchResponse,
};

fn chunks(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn keys(docs: &FilteredDocuments) -> Vec<&str> {
    docs.keys().collect()
}

#[test]
fn test_score_below_threshold_is_dropped() {
    let hits = vec![SearchHit::new("a", 1.2, chunks(&["x"]))];
    assert!(filter_documents(&hits).unwrap().is_empty());
}

#[test]
fn test_score_at_threshold_is_dropped() {
    let hits = vec![SearchHit::new("a", 1.5, chunks(&["x"]))];
    assert!(filter_documents(&hits).unwrap().is_empty());
}

#[test]
fn test_passing_hits_keep_input_order() {
    let hits = vec![
        SearchHit::new("a", 2.0, chunks(&["x", "y"])),
        SearchHit::new("b", 3.9, chunks(&["z"])),
    ];

    let out = filter_documents(&hits).unwrap();
    assert_eq!(keys(&out), vec!["a", "b"]);
    assert_eq!(out.get("a").unwrap().retained_chunks, chunks(&["x", "y"]));
    assert_eq!(out.get("b").unwrap().retained_chunks, chunks(&["z"]));
}

#[test]
fn test_fifteen_chunks_capped_to_ten() {
    let many: Vec<String> = (1..=15).map(|i| format!("c{i}")).collect();
    let hits = vec![SearchHit::new("a", 2.0, many.clone())];

    let out = filter_documents(&hits).unwrap();
    assert_eq!(out.get("a").unwrap().retained_chunks, many[..10].to_vec());
}

#[test]
fn test_duplicate_path_last_write_wins() {
    let hits = vec![
        SearchHit::new("a", 2.0, chunks(&["x"])),
        SearchHit::new("a", 3.0, chunks(&["y"])),
    ];

    let out = filter_documents(&hits).unwrap();
    assert_eq!(out.len(), 1);
    let doc = out.get("a").unwrap();
    assert_eq!(doc.retained_chunks, chunks(&["y"]));
    assert_eq!(doc.score, 3.0);
}

#[test]
fn test_duplicate_keeps_first_position() {
    let hits = vec![
        SearchHit::new("a", 2.0, chunks(&["x"])),
        SearchHit::new("b", 2.5, chunks(&["y"])),
        SearchHit::new("a", 3.0, chunks(&["z"])),
    ];

    let out = filter_documents(&hits).unwrap();
    assert_eq!(keys(&out), vec!["a", "b"]);
    assert_eq!(out.get("a").unwrap().retained_chunks, chunks(&["z"]));
}

#[test]
fn test_below_threshold_duplicate_does_not_overwrite() {
    let hits = vec![
        SearchHit::new("a", 2.0, chunks(&["x"])),
        SearchHit::new("a", 1.1, chunks(&["y"])),
    ];

    let out = filter_documents(&hits).unwrap();
    assert_eq!(out.get("a").unwrap().retained_chunks, chunks(&["x"]));
}

#[test]
fn test_missing_path_is_malformed_at_index_zero() {
    let hits = vec![SearchHit {
        rerank_score: Some(2.0),
        chunks: Some(chunks(&["x"])),
        ..SearchHit::default()
    }];

    let err = filter_documents(&hits).unwrap_err();
    assert_eq!(err.index, 0);
    assert_eq!(err.field, HitField::SourcePath);
}

#[test]
fn test_missing_score_after_valid_hits_fails_whole_call() {
    let hits = vec![
        SearchHit::new("a", 2.0, chunks(&["x"])),
        SearchHit::new("b", 3.1, chunks(&["y"])),
        SearchHit {
            source_path: Some("c".to_string()),
            chunks: Some(chunks(&["z"])),
            ..SearchHit::default()
        },
        SearchHit::new("d", 2.4, chunks(&["w"])),
    ];

    let err = filter_documents(&hits).unwrap_err();
    assert_eq!(err.index, 2);
    assert_eq!(err.field, HitField::RerankScore);
    assert_eq!(
        err.to_string(),
        "Malformed search hit at index 2: missing @search.rerankerScore"
    );
}

#[test]
fn test_nan_score_never_kept() {
    let hits = vec![
        SearchHit::new("a", f64::NAN, chunks(&["x"])),
        SearchHit::new("a", 2.0, chunks(&["y"])),
        SearchHit::new("b", f64::NAN, chunks(&["z"])),
    ];

    let out = filter_documents(&hits).unwrap();
    assert_eq!(keys(&out), vec!["a"]);
    assert_eq!(out.get("a").unwrap().retained_chunks, chunks(&["y"]));
}

#[test]
fn test_empty_input() {
    assert!(filter_documents(&[]).unwrap().is_empty());
}

#[test]
fn test_decoded_response_end_to_end() {
    let payload = r#"{
        "@odata.count": 17,
        "value": [
            {
                "@search.rerankerScore": 2.8,
                "metadata_storage_path": "https://acct.blob.core.windows.net/docs/prompting.pdf",
                "metadata_storage_name": "prompting.pdf",
                "pages": ["Be specific.", "Give examples."],
                "@search.captions": [{"text": "Be specific about the output format."}]
            },
            {
                "@search.rerankerScore": 1.3,
                "metadata_storage_path": "https://acct.blob.core.windows.net/docs/billing.pdf",
                "metadata_storage_name": "billing.pdf",
                "pages": ["Invoices are monthly."],
                "@search.captions": []
            }
        ]
    }"#;

    let response: SearchResponse = serde_json::from_str(payload).unwrap();
    let out = filter_documents(&response.value).unwrap();

    assert_eq!(out.len(), 1);
    let doc = out.iter().next().unwrap();
    assert_eq!(doc.file_name, "prompting.pdf");
    assert_eq!(
        doc.retained_captions,
        vec!["Be specific about the output format."]
    );
    assert_eq!(out.keyed_chunks()[1].id, "prompting.pdf_2");
}

/// Deterministic pseudo-random hit sets covering duplicates and boundary scores
fn generated_hits(seed: u64) -> Vec<SearchHit> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as usize
    };

    let scores = [1.0, 1.2, 1.5, 1.51, 2.0, 2.7, 3.3, 4.0];
    let count = next() % 12;
    (0..count)
        .map(|_| {
            let path = format!("doc{}", next() % 5);
            let score = scores[next() % scores.len()];
            let pages: Vec<String> = (0..next() % 14).map(|p| format!("{path}-p{p}")).collect();
            let captions = (0..next() % 13).map(|c| format!("cap{c}"));
            SearchHit::new(path, score, pages).with_captions(captions)
        })
        .collect()
}

#[test]
fn test_properties_over_generated_inputs() {
    let filter = RelevanceFilter::default();

    for seed in 0..200 {
        let hits = generated_hits(seed);
        let out = filter.filter(&hits).unwrap();

        // every kept document clears the threshold
        assert!(out.iter().all(|doc| doc.score > filter.threshold));

        // bounded by input size and by distinct qualifying paths
        let mut qualifying: Vec<&str> = Vec::new();
        for hit in &hits {
            let path = hit.source_path.as_deref().unwrap();
            if hit.rerank_score.unwrap() > filter.threshold && !qualifying.contains(&path) {
                qualifying.push(path);
            }
        }
        assert!(out.len() <= hits.len());
        assert!(out.len() <= qualifying.len());

        // keys follow first qualifying occurrence
        assert_eq!(keys(&out), qualifying);

        // truncation matches the last qualifying hit for each path
        for doc in &out {
            let last = hits
                .iter()
                .rev()
                .find(|h| {
                    h.source_path.as_deref() == Some(doc.source_path.as_str())
                        && h.rerank_score.unwrap() > filter.threshold
                })
                .unwrap();
            let original = last.chunks.as_ref().unwrap().len();
            assert_eq!(doc.retained_chunks.len(), original.min(filter.chunk_cap));
            assert!(doc.retained_captions.len() <= filter.caption_cap);
        }

        // filtering a reconstruction of the output is a no-op
        let rebuilt: Vec<SearchHit> = out
            .iter()
            .map(|doc| {
                SearchHit::new(&doc.source_path, doc.score, doc.retained_chunks.clone())
                    .with_name(&doc.file_name)
                    .with_captions(doc.retained_captions.clone())
            })
            .collect();
        assert_eq!(filter.filter(&rebuilt).unwrap(), out);
    }
}
