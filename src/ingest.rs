//! Document ingestion.
//!
//! Turns uploaded files into [`Document`]s. Decoding is a lossy UTF-8 decode
//! of the raw bytes whatever the declared media type, so it cannot fail: a PDF
//! upload produces whatever text its bytes happen to decode to.
//!
//! # Batch semantics
//!
//! [`ingest_paths`] reads every file concurrently and awaits them together. If
//! any read fails the whole batch fails and nothing is appended to the store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::{chunk_text, count_clauses};
use crate::config::Config;
use crate::models::{Document, DocumentStatus, UploadFile};
use crate::store;

/// Decode an upload into a document with a fresh id.
///
/// `chunk_tokens` is the token budget used for the `chunks` counter.
pub fn decode_upload(file: UploadFile, chunk_tokens: usize) -> Document {
    let size_bytes = file.bytes.len() as u64;
    let content = String::from_utf8_lossy(&file.bytes).into_owned();

    let chunks = if content.trim().is_empty() {
        0
    } else {
        chunk_text(&content, chunk_tokens).len()
    };
    let clauses = count_clauses(&content);

    Document {
        id: Uuid::new_v4().to_string(),
        name: file.name,
        size: human_size(size_bytes),
        size_bytes,
        media_type: file.media_type,
        uploaded_at: Utc::now(),
        chunks,
        clauses,
        status: DocumentStatus::Processed,
        content,
    }
}

/// Format a byte count as `B`, `KB` or `MB`.
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = 1024.0 * 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// Read one file from disk. The media type is guessed from the extension.
pub async fn load_upload(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    debug!(file = %path.display(), bytes = bytes.len(), media_type = %media_type, "read upload");
    Ok(UploadFile {
        name,
        media_type,
        bytes,
    })
}

/// Expand directories into the regular files beneath them.
///
/// Files given directly are kept in argument order; each directory expands to
/// its files sorted by path, following symlinks. Missing paths and entries
/// that cannot be scanned are an error.
pub fn collect_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path).follow_links(true) {
                let entry =
                    entry.with_context(|| format!("Failed to scan {}", path.display()))?;
                if entry.file_type().is_file() {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            out.extend(found);
        } else if path.is_file() {
            out.push(path.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", path.display());
        }
    }
    Ok(out)
}

/// Read and decode every file concurrently. Fails as a whole if any read fails.
pub async fn ingest_paths(paths: &[PathBuf], chunk_tokens: usize) -> Result<Vec<Document>> {
    let uploads = try_join_all(paths.iter().map(|p| load_upload(p))).await?;
    Ok(uploads
        .into_iter()
        .map(|u| decode_upload(u, chunk_tokens))
        .collect())
}

/// `plens upload` entry point.
pub async fn run_upload(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let files = collect_paths(paths)?;
    if files.is_empty() {
        println!("No files to upload.");
        return Ok(());
    }

    let docs = ingest_paths(&files, config.chunking.max_tokens).await?;

    let mut store = store::open(config).await?;
    println!("upload");
    for d in &docs {
        println!(
            "  {}  {:<32} {:>10}  chunks={} clauses={}",
            d.id, d.name, d.size, d.chunks, d.clauses
        );
    }
    let count = docs.len();
    store.add_documents(docs).await?;
    info!(count, total = store.documents().len(), "documents uploaded");
    println!("  uploaded: {}", count);
    println!("  total documents: {}", store.documents().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn upload(name: &str, bytes: &[u8]) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            media_type: "text/plain".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_decode_text() {
        let d = decode_upload(upload("policy.txt", b"Knee surgery covered after 2 years."), 700);
        assert_eq!(d.name, "policy.txt");
        assert_eq!(d.content, "Knee surgery covered after 2 years.");
        assert_eq!(d.size_bytes, 35);
        assert_eq!(d.size, "35 B");
        assert_eq!(d.chunks, 1);
        assert_eq!(d.clauses, 1);
        assert_eq!(d.status, DocumentStatus::Processed);
    }

    #[test]
    fn test_decode_binary_never_fails() {
        let d = decode_upload(
            UploadFile {
                name: "scan.pdf".to_string(),
                media_type: "application/pdf".to_string(),
                bytes: vec![0x25, 0x50, 0x44, 0x46, 0xff, 0xfe, 0x00],
            },
            700,
        );
        assert!(d.content.starts_with("%PDF"));
        assert!(d.content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_empty_upload_has_no_chunks() {
        let d = decode_upload(upload("empty.txt", b""), 700);
        assert_eq!(d.chunks, 0);
        assert_eq!(d.clauses, 0);
    }

    #[test]
    fn test_ids_unique() {
        let ids: HashSet<String> = (0..200)
            .map(|_| decode_upload(upload("same.txt", b"same"), 700).id)
            .collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_ingest_paths_and_collect() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("docs");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("b.txt"), "Beta.").unwrap();
        std::fs::write(dir.join("sub/a.md"), "# Alpha").unwrap();
        let single = tmp.path().join("policy.txt");
        std::fs::write(&single, "Knee surgery covered after 2 years.").unwrap();

        let paths = collect_paths(&[single.clone(), dir.clone()]).unwrap();
        assert_eq!(paths, vec![single, dir.join("b.txt"), dir.join("sub/a.md")]);

        let docs = ingest_paths(&paths, 700).await.unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["policy.txt", "b.txt", "a.md"]);
        assert_eq!(docs[0].media_type, "text/plain");
        assert_eq!(docs[0].content, "Knee surgery covered after 2 years.");
    }

    #[tokio::test]
    async fn test_batch_fails_as_a_whole() {
        let tmp = TempDir::new().unwrap();
        let ok = tmp.path().join("ok.txt");
        std::fs::write(&ok, "fine").unwrap();
        let missing = tmp.path().join("missing.txt");

        assert!(ingest_paths(&[ok.clone(), missing.clone()], 700).await.is_err());
        assert!(collect_paths(&[ok, missing]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_unscannable_entry_fails_collect() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("docs");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("a.txt"), "Alpha.").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone"), dir.join("sub/dangling")).unwrap();

        let err = collect_paths(&[dir]).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to scan"));
    }
}
