//! Incremental result store keyed by a content/config fingerprint.
//!
//! The store itself is external (disk, remote cache); this module only
//! needs `get`/`set` of opaque strings.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};
use xxhash_rust::xxh64::Xxh64;

use crate::core::aggregate::PatternFrequencyMap;
use crate::core::collision::NameCollisionCache;
use crate::core::error::{CacheError, CacheOperation, NameGenError};
use crate::core::names::engine::generate;
use crate::core::names::options::GenerationOptions;
use crate::core::names::result::GenerationResult;

/// Key/value persistence for serialized generation results
pub trait CacheStore
{
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, CacheError>;

    fn set(
        &mut self,
        key: &str,
        value: String,
    ) -> Result<(), CacheError>;
}

/// In-process store, mostly for tests and single runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore
{
    entries: BTreeMap<String, String>,
}

impl MemoryStore
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn len(&self) -> usize
    {
        self.entries
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }
}

impl CacheStore for MemoryStore
{
    fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, CacheError>
    {
        Ok(self
            .entries
            .get(key)
            .cloned())
    }

    fn set(
        &mut self,
        key: &str,
        value: String,
    ) -> Result<(), CacheError>
    {
        self.entries
            .insert(key.to_string(), value);
        Ok(())
    }
}

fn feed<T: Serialize>(
    hasher: &mut Xxh64,
    value: &T,
) -> Result<(), CacheError>
{
    let bytes = serde_json::to_vec(value).map_err(|e| {
        CacheError::new(CacheOperation::Encode, "fingerprint input is not serializable").with_cause(e)
    })?;
    hasher.update(&bytes);
    // Separator so adjacent inputs cannot run together
    hasher.update(&[0]);
    Ok(())
}

/// xxh64 of the canonical JSON of the map and options, as 16 hex digits.
///
/// The map serializes with sorted keys, so equal maps hash equally
/// regardless of how they were built.
pub fn fingerprint(
    map: &PatternFrequencyMap,
    options: &GenerationOptions,
) -> Result<String, CacheError>
{
    let mut hasher = Xxh64::new(0);
    feed(&mut hasher, map)?;
    feed(&mut hasher, options)?;
    Ok(format!("{:016x}", hasher.digest()))
}

/// Fingerprint extended with the seeded cache state the run starts from
fn run_key(
    map: &PatternFrequencyMap,
    options: &GenerationOptions,
    cache: &NameCollisionCache,
) -> Result<String, CacheError>
{
    let mut hasher = Xxh64::new(0);
    feed(&mut hasher, map)?;
    feed(&mut hasher, options)?;
    feed(&mut hasher, &cache.save_to_cache())?;
    feed(&mut hasher, cache.reserved_names())?;
    feed(&mut hasher, &cache.cursor())?;
    Ok(format!("{:016x}", hasher.digest()))
}

fn decode_result(text: &str) -> Result<GenerationResult, CacheError>
{
    serde_json::from_str(text).map_err(|e| {
        CacheError::new(CacheOperation::Decode, "stored generation result is unreadable").with_cause(e)
    })
}

/// Whether every stored assignment can be claimed in `cache` as is
fn replayable(
    result: &GenerationResult,
    options: &GenerationOptions,
    cache: &NameCollisionCache,
) -> bool
{
    let mut names = BTreeSet::new();

    result
        .name_map
        .iter()
        .all(|(class, name)| {
            names.insert(name.as_str())
                && (cache.mapping_for(class) == Some(name.as_str())
                    || (cache.is_available(name)
                        && !options
                            .reserved_names
                            .contains(name)))
        })
}

/// Put `cache` in the state a fresh run would have left it in
fn replay(
    result: &GenerationResult,
    options: &GenerationOptions,
    cache: &mut NameCollisionCache,
) -> Result<(), CacheError>
{
    cache.extend_reserved(&options.reserved_names);

    for (class, name) in &result.name_map
    {
        if cache.mapping_for(class) == Some(name.as_str())
        {
            continue;
        }
        if !cache.reserve_name(name, Some(class))
        {
            return Err(CacheError::new(
                CacheOperation::Load,
                format!("stored identifier '{name}' for '{class}' collides with the name cache"),
            ));
        }
    }

    cache.advance_cursor_to(
        result
            .statistics
            .cache
            .cursor,
    );
    Ok(())
}

/// Serve the result from `store` when this exact run was seen before,
/// otherwise generate and store it.
///
/// On a hit the stored assignments and the final cursor are replayed into
/// `cache`, so a later `save_to_cache` matches what a fresh run would have
/// produced. An unreadable entry, or one that conflicts with the cache, is
/// treated as a miss and overwritten.
pub fn generate_with_store(
    store: &mut dyn CacheStore,
    map: &PatternFrequencyMap,
    options: &GenerationOptions,
    cache: &mut NameCollisionCache,
) -> Result<GenerationResult, NameGenError>
{
    let key = run_key(map, options, cache)?;

    if let Some(text) = store.get(&key)?
    {
        match decode_result(&text)
        {
            Ok(mut result) if replayable(&result, options, cache) =>
            {
                replay(&result, options, cache)?;
                result
                    .metadata
                    .from_store = true;
                debug!(key = %key, names = result.name_map.len(), "generation served from store");
                return Ok(result);
            }
            Ok(_) => warn!(key = %key, "ignoring stored result that conflicts with the name cache"),
            Err(e) => warn!(key = %key, error = %e, "ignoring unreadable stored result"),
        }
    }

    let result = generate(map, options, cache)?;
    let encoded = serde_json::to_string(&result).map_err(|e| {
        CacheError::new(CacheOperation::Encode, "generation result is not serializable").with_cause(e)
    })?;
    store.set(&key, encoded)?;

    Ok(result)
}
