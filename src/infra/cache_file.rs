//! On-disk persistence: the standalone name cache file and a directory-backed
//! result store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{CacheError, CacheOperation};
use crate::core::store::CacheStore;

/// Read `{ "<class>": "<identifier>" }`; a missing file is an empty cache
pub fn load_name_cache(path: &Path) -> Result<BTreeMap<String, String>, CacheError>
{
    let text = match std::fs::read_to_string(path)
    {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "no name cache yet");
            return Ok(BTreeMap::new());
        }
        Err(e) =>
        {
            return Err(CacheError::new(CacheOperation::Load, "cannot read name cache")
                .with_path(path)
                .with_cause(e));
        }
    };

    serde_json::from_str(&text).map_err(|e| {
        CacheError::new(CacheOperation::Decode, "name cache is not a class -> identifier object")
            .with_path(path)
            .with_cause(e)
    })
}

/// Write the mapping, replacing the file only once the new content is complete
pub fn save_name_cache(
    path: &Path,
    mappings: &BTreeMap<String, String>,
) -> Result<(), CacheError>
{
    let json = serde_json::to_string_pretty(mappings).map_err(|e| {
        CacheError::new(CacheOperation::Encode, "cannot encode name cache")
            .with_path(path)
            .with_cause(e)
    })?;

    write_replacing(path, json.as_bytes()).map_err(|e| {
        CacheError::new(CacheOperation::Save, "cannot write name cache")
            .with_path(path)
            .with_cause(e)
    })?;

    debug!(path = %path.display(), entries = mappings.len(), "name cache saved");
    Ok(())
}

fn write_replacing(
    path: &Path,
    bytes: &[u8],
) -> std::io::Result<()>
{
    if let Some(parent) = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path
        .as_os_str()
        .to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

/// Result store keeping one `<key>.json` file per fingerprint
#[derive(Debug, Clone)]
pub struct FileStore
{
    dir: PathBuf,
}

impl FileStore
{
    pub fn new(dir: impl Into<PathBuf>) -> Self
    {
        Self { dir: dir.into() }
    }

    fn entry(
        &self,
        key: &str,
    ) -> PathBuf
    {
        self.dir
            .join(format!("{key}.json"))
    }
}

impl CacheStore for FileStore
{
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, CacheError>
    {
        let path = self.entry(key);
        match std::fs::read_to_string(&path)
        {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::new(CacheOperation::Get, "cannot read stored result")
                .with_path(path)
                .with_cause(e)),
        }
    }

    fn set(
        &mut self,
        key: &str,
        value: String,
    ) -> Result<(), CacheError>
    {
        let path = self.entry(key);
        write_replacing(&path, value.as_bytes()).map_err(|e| {
            CacheError::new(CacheOperation::Set, "cannot write stored result")
                .with_path(path)
                .with_cause(e)
        })
    }
}
