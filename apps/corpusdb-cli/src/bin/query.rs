use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

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

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [-k N] [--data <dir>]", args[0]);
        eprintln!("The index is process-local: --data ingests a directory before querying.");
        std::process::exit(1);
    }
    let query_text = args[1].clone();
    let mut k: Option<usize> = None;
    let mut data_dir: Option<PathBuf> = None;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-k" | "--top-k" => {
                if i + 1 < args.len() {
                    if let Ok(n) = args[i + 1].parse::<usize>() {
                        k = Some(n);
                        i += 1;
                    } else {
                        eprintln!("Error: -k requires a number");
                        std::process::exit(1);
                    }
                } else {
                    eprintln!("Error: -k requires a number");
                    std::process::exit(1);
                }
            }
            "--data" => {
                if i + 1 < args.len() {
                    data_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --data requires a directory");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = PipelineConfig::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    println!("corpusdb query\n==============");
    println!("Query: {}", query_text);
    println!("Index: {}", config.index_name);

    let embedder = default_client(config.dimension)?;
    let provider = Arc::new(InMemoryIndexProvider::new());
    let pipeline = DocumentPipeline::new(provider, embedder, config)?;

    if let Some(dir) = data_dir {
        let files = collect_documents(&dir);
        println!("📦 Ingesting {} files from {}", files.len(), dir.display());
        for path in &files {
            let text = std::fs::read_to_string(path)?;
            pipeline.ingest(&source_id_for(path), &text).await?;
        }
    }

    let response = pipeline.query(&query_text, k).await?;
    println!("\n🔍 Found {} matches for: \"{}\"", response.matches.len(), query_text);
    for (i, m) in response.matches.iter().enumerate() {
        println!(
            "  {}. score={:.4}  id={}  source={}  position={}",
            i + 1,
            m.score,
            m.id,
            m.source_id,
            m.position
        );
    }
    if response.context.is_empty() {
        println!("\n(no context could be assembled)");
    } else {
        println!(
            "\n📝 Context ({} chunks):\n{}",
            response.context.chunk_ids.len(),
            response.context.text
        );
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
