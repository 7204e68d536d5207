use std::fs;

use docrag_core::chunker::{chunk_text, Chunker, ChunkingConfig};
use docrag_core::config::{Config, EmbedderKind};
use docrag_core::corpus::{list_text_files, read_text_lossy, split_duplicate_ids};
use docrag_core::Error;
use tempfile::TempDir;

fn words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("word{i}")).collect()
}

/// Remove the overlapping prefix of every chunk after the first and concatenate.
fn reconstruct(chunks: &[String], overlap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (i, chunk) in chunks.iter().enumerate() {
        let ws = chunk.split(' ').map(str::to_string);
        if i == 0 { out.extend(ws); } else { out.extend(ws.skip(overlap)); }
    }
    out
}

#[test]
fn empty_text_has_no_chunks() {
    assert!(chunk_text("", 500, 80).unwrap().is_empty());
    assert!(chunk_text(" \n\t ", 500, 80).unwrap().is_empty());
}

#[test]
fn overlap_equal_to_chunk_size_is_a_configuration_error() {
    assert!(matches!(chunk_text("some text", 80, 80), Err(Error::Configuration(_))));
    assert!(matches!(chunk_text("some text", 80, 120), Err(Error::Configuration(_))));
}

#[test]
fn chunk_count_matches_window_formula() {
    let chunker = Chunker::default();
    for n in [501usize, 919, 920, 921, 1000, 1340, 1341, 5000] {
        let text = words(n).join(" ");
        let chunks = chunker.chunk(&text);
        let expected = (n - 80).div_ceil(420);
        assert_eq!(chunks.len(), expected, "n={n}");
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }
}

#[test]
fn chunks_reconstruct_the_original_words() {
    let original = words(2345);
    let chunks = Chunker::default().chunk(&original.join("  \n"));
    assert_eq!(reconstruct(&chunks, 80), original);
    assert!(chunks.iter().all(|c| c.split(' ').count() <= 500));
}

#[test]
fn config_defaults_and_overrides() {
    let cfg = Config::from_toml_str(
        r#"
        [chunking]
        overlap = 40

        [embedder]
        kind = "hashing"
        dim = 64
        "#,
    )
    .expect("config");
    let settings = cfg.settings().expect("settings");
    assert_eq!(settings.chunking, ChunkingConfig { chunk_size: 500, overlap: 40 });
    assert_eq!(settings.retrieval.top_k_single, 5);
    assert_eq!(settings.retrieval.top_k_multi, 10);
    assert_eq!(settings.embedder.kind, EmbedderKind::Hashing);
    assert_eq!(cfg.get::<usize>("embedder.dim").unwrap(), 64);
}

#[test]
fn invalid_chunking_config_fails_to_load() {
    let res = Config::from_toml_str("[chunking]\nchunk_size = 80\noverlap = 80\n");
    assert!(matches!(res, Err(Error::Configuration(_))));
}

#[test]
fn list_text_files_uses_file_stems_in_path_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.txt"), "bravo").unwrap();
    fs::write(dir.join("nested/a.txt"), "alpha").unwrap();
    fs::write(dir.join("ignored.md"), "nope").unwrap();

    let files = list_text_files(dir);
    let ids: Vec<&str> = files.iter().map(|f| f.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(read_text_lossy(&files[1].path).unwrap(), "alpha");
}

#[test]
fn same_stem_in_two_folders_keeps_the_first_path() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.txt"), "top").unwrap();
    fs::write(dir.join("nested/a.txt"), "nested").unwrap();
    fs::write(dir.join("c.txt"), "other").unwrap();

    let (kept, shadowed) = split_duplicate_ids(list_text_files(dir));
    let ids: Vec<&str> = kept.iter().map(|f| f.doc_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(read_text_lossy(&kept[0].path).unwrap(), "top");
    assert_eq!(shadowed.len(), 1);
    assert_eq!(shadowed[0].path, dir.join("nested/a.txt"));
}

#[test]
fn read_text_lossy_tolerates_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.txt");
    fs::write(&path, [b'o', b'k', 0xff, b'!']).unwrap();
    assert_eq!(read_text_lossy(&path).unwrap(), "ok\u{fffd}!");
}
