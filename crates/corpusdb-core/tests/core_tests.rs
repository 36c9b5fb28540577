use corpusdb_core::chunker::{derive_chunk_id, Chunker};
use corpusdb_core::config::PipelineConfig;
use corpusdb_core::error::Error;
use corpusdb_core::types::SimilarityMetric;

#[test]
fn chunk_boundaries_follow_the_window_formula() {
    let chunker = Chunker::new(10, 2).expect("valid params");
    let chunks = chunker.chunk("doc1", "Alpha. Beta. Gamma.");

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Alpha. Bet", "eta. Gamma", "ma."]);
    assert_eq!(chunks[0].start, 0);
    assert_eq!(chunks[1].start, 8);
    assert_eq!(chunks[2].start, 16);
    assert_eq!(chunks[2].end, 19);
    assert!(chunks.iter().all(|c| c.total_chunks == 3));
    assert!(chunks.iter().enumerate().all(|(i, c)| c.position == i));
}

#[test]
fn non_overlapping_spans_reconstruct_the_text() {
    // multi-byte chars make sure spans are char-based, not byte-based
    let text = "Grüße aus München! Viel Spaß beim Wandern über die Alpen.";
    let overlap = 3usize;
    let chunker = Chunker::new(12, overlap).expect("valid params");
    let chunks = chunker.chunk("doc", text);
    assert!(chunks.len() > 2, "fixture should span several chunks");

    let mut rebuilt = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            rebuilt.push_str(&chunk.text);
        } else {
            rebuilt.extend(chunk.text.chars().skip(overlap));
        }
    }
    assert_eq!(rebuilt, text, "dropping each chunk's overlap rebuilds the document");
}

#[test]
fn chunk_ids_are_deterministic() {
    let chunker = Chunker::new(64, 16).expect("valid params");
    let text = "The quick brown fox jumps over the lazy dog. Pack my box with five dozen liquor jugs.";

    let first: Vec<String> = chunker.chunk("guide", text).into_iter().map(|c| c.id).collect();
    let second: Vec<String> = chunker.chunk("guide", text).into_iter().map(|c| c.id).collect();
    assert_eq!(first, second, "identical input must yield identical ids");

    let other_source: Vec<String> = chunker.chunk("manual", text).into_iter().map(|c| c.id).collect();
    assert!(
        first.iter().zip(&other_source).all(|(a, b)| a != b),
        "the source id is part of every identifier"
    );

    assert_ne!(derive_chunk_id("guide", 0, "abc"), derive_chunk_id("guide", 0, "abd"));
}

#[test]
fn rejects_overlap_not_smaller_than_max_size() {
    for (max_size, overlap) in [(10, 10), (10, 12), (0, 0)] {
        let err = Chunker::new(max_size, overlap).expect_err("invalid sizing must fail");
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }
    assert!(Chunker::new(10, 0).is_ok(), "zero overlap is valid");
}

#[test]
fn empty_input_yields_no_chunks() {
    let chunker = Chunker::new(10, 2).expect("valid params");
    assert!(chunker.chunk("doc", "").is_empty());
}

#[test]
fn short_input_yields_a_single_full_chunk() {
    let chunker = Chunker::new(10, 2).expect("valid params");
    let chunks = chunker.chunk("doc", "tiny");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "tiny");

    // exact fit: no degenerate trailing window
    let exact = chunker.chunk("doc", "0123456789");
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].text, "0123456789");
}

#[test]
fn config_defaults_validate() {
    let config = PipelineConfig::default();
    config.validate().expect("defaults are valid");
    assert_eq!(config.metric, SimilarityMetric::Cosine);
    assert_eq!(config.upsert_batch_size, 100);
}

#[test]
fn config_rejects_bad_sizing() {
    let mut config = PipelineConfig::default();
    config.overlap = config.chunk_size;
    assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));

    let mut config = PipelineConfig::default();
    config.top_k = 0;
    assert!(config.validate().is_err(), "top_k of zero is rejected");
}

#[test]
fn config_files_are_merged_from_a_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("config.toml"),
        "index_name = \"field-notes\"\nchunk_size = 500\noverlap = 50\n",
    )
    .expect("write config");

    let config = PipelineConfig::load_from(dir.path()).expect("load from dir");
    assert_eq!(config.index_name, "field-notes");
    assert_eq!(config.chunk_size, 500);
    assert_eq!(config.overlap, 50);
    assert_eq!(config.dimension, 1024, "untouched fields keep their defaults");
}

#[test]
fn env_overrides_reach_the_config() {
    std::env::set_var("APP_TOP_K", "7");
    let config = PipelineConfig::load().expect("load with env override");
    assert_eq!(config.top_k, 7);
    std::env::remove_var("APP_TOP_K");
}

#[test]
fn metric_uses_lowercase_wire_names() {
    let json = serde_json::to_string(&SimilarityMetric::DotProduct).expect("serialize");
    assert_eq!(json, "\"dotproduct\"");
    let parsed: SimilarityMetric = serde_json::from_str("\"cosine\"").expect("parse");
    assert_eq!(parsed, SimilarityMetric::Cosine);
}
