use std::io;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, WINDOWS_1252};
use futures::stream::{self, StreamExt};
use globset::Glob;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("corpus folder not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("corpus path is not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid file pattern: {0}")]
    InvalidPattern(String),

    #[error("cannot read corpus folder {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file's name, path and decoded text, before any analysis.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub name: String,
    pub location: PathBuf,
    pub text: String,
}

/// Read every file in `dir` whose name matches `pattern`, in name order.
///
/// Files are read concurrently (at most `concurrency` at a time) but the
/// output keeps name order. A file that cannot be read is skipped.
pub async fn load_dir(
    dir: &Path,
    pattern: &str,
    concurrency: usize,
) -> Result<Vec<RawDocument>, CorpusError> {
    let matcher = Glob::new(pattern)
        .map_err(|e| CorpusError::InvalidPattern(e.to_string()))?
        .compile_matcher();

    let metadata = tokio::fs::metadata(dir).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CorpusError::NotFound(dir.to_path_buf()),
        _ => CorpusError::Read {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_dir() {
        return Err(CorpusError::NotADirectory(dir.to_path_buf()));
    }

    let read_err = |source: io::Error| CorpusError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && matcher.is_match(&name) {
            files.push((name, entry.path()));
        }
    }
    files.sort();

    let reads: Vec<_> = stream::iter(files)
        .map(|(name, path)| async move {
            let bytes = tokio::fs::read(&path).await;
            (name, path, bytes)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut documents = Vec::with_capacity(reads.len());
    for (name, location, bytes) in reads {
        match bytes {
            Ok(bytes) => documents.push(RawDocument {
                text: decode(&bytes),
                name,
                location,
            }),
            Err(e) => warn!(document = %name, error = %e, "skipping unreadable document"),
        }
    }

    debug!(dir = %dir.display(), documents = documents.len(), "corpus loaded");
    Ok(documents)
}

/// Decode file bytes: BOM first, then UTF-8, then Windows-1252 as the last resort.
fn decode(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}
