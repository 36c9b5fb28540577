use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use corpusdb_core::config::PipelineConfig;
use corpusdb_embed::default_client;
use corpusdb_index::InMemoryIndexProvider;
use corpusdb_pipeline::DocumentPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir: Option<PathBuf> = None;
    let mut demo_query: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--query" | "-q" => {
                if i + 1 < args.len() {
                    demo_query = Some(args[i + 1].clone());
                    i += 1;
                } else {
                    eprintln!("Error: --query requires text");
                    std::process::exit(1);
                }
            }
            other if !other.starts_with('-') => data_dir = Some(PathBuf::from(other)),
            other => {
                eprintln!("Unknown flag: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }
    let Some(data_dir) = data_dir else {
        eprintln!("Usage: corpusdb-ingest <dir> [--query \"<text>\"]");
        std::process::exit(1);
    };

    let config = PipelineConfig::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    println!("corpusdb ingest\n===============");
    println!("Data directory: {}", data_dir.display());
    println!(
        "Index: {} (dimension {}, metric {})",
        config.index_name, config.dimension, config.metric
    );

    let embedder = default_client(config.dimension)?;
    let provider = Arc::new(InMemoryIndexProvider::new());
    let pipeline = DocumentPipeline::new(provider, embedder, config)?;

    let files = collect_documents(&data_dir);
    if files.is_empty() {
        println!("No .txt or .md files under {}", data_dir.display());
        return Ok(());
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );

    let mut total_chunks = 0usize;
    let mut total_written = 0usize;
    let mut total_skipped = 0usize;
    let mut total_failed = 0usize;
    for path in &files {
        let source_id = source_id_for(path);
        pb.set_message(source_id.clone());
        let text = std::fs::read_to_string(path)?;
        let report = pipeline.ingest(&source_id, &text).await?;
        total_chunks += report.chunk_count;
        total_written += report.upsert.written.len();
        total_skipped += report.upsert.skipped.len();
        total_failed += report.upsert.failed.len();
        if !report.upsert.failed.is_empty() {
            pb.println(format!(
                "⚠️  {}: {} chunks failed to write",
                source_id,
                report.upsert.failed.len()
            ));
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("\n✅ Ingest complete");
    println!(
        "📊 {} files, {} chunks ({} written, {} skipped, {} failed)",
        files.len(),
        total_chunks,
        total_written,
        total_skipped,
        total_failed
    );

    if let Some(query) = demo_query {
        println!("\n🔍 Query: \"{}\"", query);
        let response = pipeline.query(&query, None).await?;
        for (i, m) in response.matches.iter().enumerate() {
            println!(
                "  {}. score={:.4}  id={}  source={}",
                i + 1,
                m.score,
                m.id,
                m.source_id
            );
        }
        if !response.context.is_empty() {
            println!(
                "\n📝 Context ({} chunks):\n{}",
                response.context.chunk_ids.len(),
                response.context.text
            );
        }
    } else {
        println!("💡 The index lives in this process only; pass --query \"<text>\" to search it now,");
        println!("💡 or run: corpusdb-query \"<text>\" --data {}", data_dir.display());
    }
    Ok(())
}

fn collect_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("txt") | Some("md")
            )
        })
        .collect();
    files.sort();
    files
}

fn source_id_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("document")
        .to_string()
}
