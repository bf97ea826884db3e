use anyhow::{Context, Result};
use indicatif::ProgressBar;
use memmap2::Mmap;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::aggregate::PatternFrequencyMap;
use crate::core::records::{ExtractionBundle, load_bundle};

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

pub enum FileContent {
    Mapped(Mmap),
    Buffered(String),
}

impl FileContent {
    /// UTF-8 view of the content
    pub fn as_str(&self) -> Result<&str> {
        match self {
            FileContent::Mapped(mmap) => {
                std::str::from_utf8(mmap).context("File is not valid UTF-8")
            }
            FileContent::Buffered(s) => Ok(s.as_str()),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        // Use memory mapping for large files
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: read-only mapping; inputs are not modified while mapped
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        // Read small files into memory
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// Read and parse one extraction bundle
pub fn read_bundle(path: &Path) -> Result<ExtractionBundle> {
    let content = read_file_smart(path)?;
    let text = content
        .as_str()
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    load_bundle(text).with_context(|| format!("Invalid extraction bundle {}", path.display()))
}

/// Read bundles in parallel and concatenate them in argument order
pub fn read_bundles(paths: &[PathBuf], progress: &ProgressBar) -> Result<ExtractionBundle> {
    let parsed: Vec<Result<ExtractionBundle>> = paths
        .par_iter()
        .map(|path| {
            let bundle = read_bundle(path);
            progress.inc(1);
            bundle
        })
        .collect();

    let mut merged = ExtractionBundle::default();
    for bundle in parsed {
        merged.extend(bundle?);
    }
    Ok(merged)
}

/// Read a frequency map written by `cpk aggregate`
pub fn read_frequency_map(path: &Path) -> Result<PatternFrequencyMap> {
    let content = read_file_smart(path)?;
    let text = content
        .as_str()
        .with_context(|| format!("Failed to decode {}", path.display()))?;
    serde_json::from_str(text)
        .with_context(|| format!("Invalid frequency map {}", path.display()))
}

/// Pretty JSON to `output`, or stdout when `None`
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    json.push('\n');

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write to {}", path.display()))
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(json.as_bytes())
                .context("Failed to write to stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_files_are_buffered() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("bundle.json");
        std::fs::write(&path, r#"{ "html": [], "jsx": [] }"#).unwrap();

        let content = read_file_smart(&path).unwrap();
        assert!(matches!(content, FileContent::Buffered(_)));
        assert!(read_bundle(&path).unwrap().is_empty());
    }

    #[test]
    fn bundles_concatenate_in_argument_order() {
        let dir = assert_fs::TempDir::new().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        std::fs::write(&a, r#"{ "html": [{ "filePath": "a.html", "classes": [] }] }"#).unwrap();
        std::fs::write(&b, r#"{ "html": [{ "filePath": "b.html", "classes": [] }] }"#).unwrap();

        let merged = read_bundles(&[a, b], &ProgressBar::hidden()).unwrap();
        let files: Vec<&str> = merged.html.iter().map(|h| h.file_path.as_str()).collect();
        assert_eq!(files, vec!["a.html", "b.html"]);
    }

    #[test]
    fn malformed_bundle_names_the_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_bundle(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
