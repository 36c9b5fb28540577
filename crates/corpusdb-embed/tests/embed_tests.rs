use corpusdb_core::traits::EmbeddingClient;
use corpusdb_embed::HashingEmbeddingClient;

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[tokio::test]
async fn hashing_embeddings_are_deterministic() -> anyhow::Result<()> {
    let client = HashingEmbeddingClient::new(256);
    let a = client.embed("the quick brown fox").await?;
    let b = client.embed("the quick brown fox").await?;
    assert_eq!(a, b);
    Ok(())
}

#[tokio::test]
async fn vectors_use_the_declared_dimension_and_unit_norm() -> anyhow::Result<()> {
    let client = HashingEmbeddingClient::new(512);
    assert_eq!(client.dimension(), 512);
    assert_eq!(client.model_id(), "hashing-v1");

    let v = client.embed("alpha beta gamma").await?;
    assert_eq!(v.len(), 512);
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    Ok(())
}

#[tokio::test]
async fn tokenization_ignores_case_and_punctuation() -> anyhow::Result<()> {
    let client = HashingEmbeddingClient::new(1024);
    let plain = client.embed("Alpha").await?;
    let decorated = client.embed("alpha!").await?;
    assert_eq!(plain, decorated);
    Ok(())
}

#[tokio::test]
async fn shared_tokens_score_higher_than_disjoint_tokens() -> anyhow::Result<()> {
    let client = HashingEmbeddingClient::new(1024);
    let query = client.embed("Alpha").await?;
    let hit = client.embed("Alpha. Bet").await?;
    let miss = client.embed("eta. Gamma").await?;

    assert!(cosine(&query, &hit) > 0.5, "overlapping token dominates");
    assert!(cosine(&query, &miss).abs() < 1e-6, "disjoint tokens share no buckets");
    Ok(())
}

#[tokio::test]
async fn empty_text_maps_to_the_zero_vector() -> anyhow::Result<()> {
    let client = HashingEmbeddingClient::new(64);
    let v = client.embed("  \t \n ").await?;
    assert_eq!(v.len(), 64);
    assert!(v.iter().all(|x| *x == 0.0));
    Ok(())
}

#[tokio::test]
async fn batch_order_matches_input_order() -> anyhow::Result<()> {
    let client = HashingEmbeddingClient::new(128);
    let texts = vec!["one".to_string(), "two".to_string(), "three".to_string()];
    let batch = client.embed_batch(&texts).await?;
    assert_eq!(batch.len(), texts.len());
    for (text, vector) in texts.iter().zip(&batch) {
        assert_eq!(vector, &client.embed(text).await?);
    }
    Ok(())
}

#[tokio::test]
async fn default_client_honors_the_fake_switch() -> anyhow::Result<()> {
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let client = corpusdb_embed::default_client(256)?;
    assert_eq!(client.dimension(), 256);
    assert_eq!(client.model_id(), "hashing-v1");
    Ok(())
}
