use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use docrag_core::config::{Config, Settings};
use docrag_core::corpus::{list_text_files, read_text_lossy, split_duplicate_ids};
use docrag_embed::get_default_embedder;
use docrag_retrieve::{ContextOutcome, Purpose, RetrievalEngine};
use docrag_vector::{FsBlobStore, IndexStore};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: docrag <command> [args...]

Commands:
  ingest <doc_id> <file>            chunk, embed and store one text file
  ingest-dir <dir>                  ingest every .txt file below <dir> (doc id = file stem)
  query <doc_id> <query> [top_k]    best passages from one document
  query-multi [-k <top_k>] <query> <doc_id>...
                                    best passages across documents, with sources
  context <purpose> <doc_id> [query]  prompt context for chat|mindmap|quiz|summary
  delete <doc_id>                   remove a document's index";

/// Split argv (without the program name) into command and arguments; `None` asks for usage.
fn parse_command(mut args: Vec<String>) -> Option<(String, Vec<String>)> {
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" { return None; }
    let cmd = args.remove(0);
    Some((cmd, args))
}

/// `query-multi` arguments: an optional `-k/--top-k` flag, the query, then doc ids.
fn parse_multi_args(args: &[String], default_top_k: usize) -> anyhow::Result<(String, Vec<String>, usize)> {
    let mut top_k = default_top_k;
    let mut rest = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-k" | "--top-k" => {
                let value = args.get(i + 1).ok_or_else(|| anyhow!("{} requires a number", args[i]))?;
                top_k = parse_top_k(Some(value), default_top_k)?;
                i += 1;
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }
    if rest.is_empty() { return Err(anyhow!("missing <query>\n\n{USAGE}")); }
    let query = rest.remove(0);
    Ok((query, rest, top_k))
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn open_blobs(settings: &Settings) -> anyhow::Result<Arc<FsBlobStore>> {
    let root = settings.storage.resolved_root();
    let blobs = FsBlobStore::new(&root).with_context(|| format!("opening index store at {}", root.display()))?;
    tracing::debug!(root = %root.display(), "index store ready");
    Ok(Arc::new(blobs))
}

fn build_engine(settings: &Settings) -> anyhow::Result<RetrievalEngine> {
    let blobs = open_blobs(settings)?;
    let embedder = Arc::from(get_default_embedder(&settings.embedder)?);
    Ok(RetrievalEngine::from_settings(blobs, embedder, settings)?)
}

/// Deleting touches only the blob store, so it works without an embedding model.
fn delete_index(settings: &Settings, doc_id: &str) -> anyhow::Result<()> {
    IndexStore::new(open_blobs(settings)?).delete(doc_id)?;
    tracing::info!(doc_id, "deleted document index");
    Ok(())
}

fn require<'a>(args: &'a [String], i: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(i).map(String::as_str).ok_or_else(|| anyhow!("missing <{what}>\n\n{USAGE}"))
}

fn parse_top_k(arg: Option<&String>, default: usize) -> anyhow::Result<usize> {
    match arg {
        Some(s) => s.parse().with_context(|| format!("top_k must be a number, got '{s}'")),
        None => Ok(default),
    }
}

fn ingest_dir(engine: &RetrievalEngine, dir: &Path) -> anyhow::Result<()> {
    let (files, shadowed) = split_duplicate_ids(list_text_files(dir));
    for file in &shadowed {
        tracing::warn!(doc_id = %file.doc_id, path = %file.path.display(), "skipping file whose doc id is already taken by an earlier path");
    }
    if files.is_empty() { println!("No .txt files under {}", dir.display()); return Ok(()); }
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")?.progress_chars("#>-"));
    let (mut ok, mut failed, mut chunks) = (0usize, 0usize, 0usize);
    for file in &files {
        pb.set_message(file.doc_id.clone());
        let outcome = read_text_lossy(&file.path).and_then(|text| engine.ingest(&file.doc_id, &text));
        match outcome {
            Ok(n) => { ok += 1; chunks += n; }
            Err(e) => { failed += 1; pb.suspend(|| tracing::warn!(doc_id = %file.doc_id, error = %e, "ingest failed")); }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    println!("✅ Ingested {ok} documents ({chunks} chunks), {failed} failed, {} skipped as duplicate ids", shadowed.len());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let Some((cmd, args)) = parse_command(env::args().skip(1).collect()) else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    init_logging(&settings);
    match cmd.as_str() {
        "ingest" => {
            let doc_id = require(&args, 0, "doc_id")?;
            let path = PathBuf::from(require(&args, 1, "file")?);
            let text = read_text_lossy(&path)?;
            let chunks = build_engine(&settings)?.ingest(doc_id, &text)?;
            println!("✅ Ingested '{doc_id}' ({chunks} chunks)");
        }
        "ingest-dir" => {
            let dir = PathBuf::from(require(&args, 0, "dir")?);
            ingest_dir(&build_engine(&settings)?, &dir)?;
        }
        "query" => {
            let doc_id = require(&args, 0, "doc_id")?;
            let query = require(&args, 1, "query")?;
            let top_k = parse_top_k(args.get(2), settings.retrieval.top_k_single)?;
            let passages = build_engine(&settings)?.retrieve_single(doc_id, query, top_k)?;
            println!("{}", serde_json::to_string_pretty(&passages)?);
        }
        "query-multi" => {
            let (query, doc_ids, top_k) = parse_multi_args(&args, settings.retrieval.top_k_multi)?;
            let engine = build_engine(&settings)?;
            let runtime = tokio::runtime::Runtime::new()?;
            let passages = runtime.block_on(engine.retrieve_multi_concurrent(&doc_ids, &query, top_k, None))?;
            println!("{}", serde_json::to_string_pretty(&passages)?);
        }
        "context" => {
            let purpose: Purpose = require(&args, 0, "purpose")?.parse().map_err(|e: String| anyhow!(e))?;
            let doc_id = require(&args, 1, "doc_id")?;
            let query = args.get(2).map(String::as_str).unwrap_or("");
            match build_engine(&settings)?.context_for(purpose, doc_id, query)? {
                ContextOutcome::Context(text) => println!("{text}"),
                ContextOutcome::NoRelevantContext => println!("No relevant context found."),
            }
        }
        "delete" => {
            let doc_id = require(&args, 0, "doc_id")?;
            delete_index(&settings, doc_id)?;
            println!("🗑️  Deleted '{doc_id}'");
        }
        _ => { eprintln!("Unknown command: {}\n\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}
