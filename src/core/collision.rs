//! Collision manager shared by every generation strategy.
//!
//! The cache is passed explicitly as `&mut NameCollisionCache`; acceptance of
//! one identifier changes which identifiers are eligible next, so the handle
//! is never hidden behind globals or closures.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{CacheError, CacheOperation};
use crate::core::names::sequential::NameLayout;
use crate::core::names::validate::is_css_keyword;

/// Why a candidate cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind
{
    CssKeyword,
    Reserved,
    Used,
}

/// Point-in-time counters for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats
{
    pub used_names: usize,
    pub reserved_names: usize,
    pub cursor: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Used/reserved identifier bookkeeping for one generation run
#[derive(Debug, Clone, Default)]
pub struct NameCollisionCache
{
    /// Every identifier handed out (this run or seeded)
    used_names: HashSet<String>,

    /// Caller-supplied names; exact match
    reserved_names: BTreeSet<String>,

    /// class -> identifier
    mappings: BTreeMap<String, String>,

    /// Next sequential index to try
    cursor: u64,

    hits: u64,
    misses: u64,
}

impl NameCollisionCache
{
    /// Empty cache; CSS keywords are always reserved
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Cache with additional caller-reserved names
    pub fn with_reserved<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cache = Self::new();
        cache
            .reserved_names
            .extend(
                names
                    .into_iter()
                    .map(Into::into),
            );
        cache
    }

    /// Add caller-reserved names
    pub fn extend_reserved<'a, I>(
        &mut self,
        names: I,
    ) where
        I: IntoIterator<Item = &'a String>,
    {
        self.reserved_names
            .extend(
                names
                    .into_iter()
                    .cloned(),
            );
    }

    /// Why `name` is unavailable, or `None` when it is free
    pub fn conflict(
        &self,
        name: &str,
    ) -> Option<ConflictKind>
    {
        if is_css_keyword(name)
        {
            Some(ConflictKind::CssKeyword)
        }
        else if self
            .reserved_names
            .contains(name)
        {
            Some(ConflictKind::Reserved)
        }
        else if self
            .used_names
            .contains(name)
        {
            Some(ConflictKind::Used)
        }
        else
        {
            None
        }
    }

    pub fn is_available(
        &self,
        name: &str,
    ) -> bool
    {
        self.conflict(name)
            .is_none()
    }

    /// Claim `name`, optionally recording which class it replaces.
    ///
    /// Returns false (and records nothing) when the name collides.
    pub fn reserve_name(
        &mut self,
        name: &str,
        original_class: Option<&str>,
    ) -> bool
    {
        if !self.is_available(name)
        {
            return false;
        }

        self.used_names
            .insert(name.to_string());

        if let Some(class) = original_class
        {
            self.mappings
                .insert(class.to_string(), name.to_string());
        }

        true
    }

    /// Seed from a persisted class -> identifier mapping.
    ///
    /// Advances the cursor past the highest sequential index implied by the
    /// seeded identifiers so new names continue without gaps. Returns the
    /// number of mappings loaded.
    pub fn load_from_cache(
        &mut self,
        existing: &BTreeMap<String, String>,
        layout: &NameLayout,
    ) -> Result<usize, CacheError>
    {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

        for (class, name) in existing
        {
            if let Some(other) = seen.insert(name.as_str(), class.as_str())
            {
                return Err(CacheError::new(
                    CacheOperation::Load,
                    format!("identifier '{name}' is mapped to both '{other}' and '{class}'"),
                ));
            }

            // Already handed out in this cache, to another class or to none
            if self
                .used_names
                .contains(name)
                && self.mapping_for(class) != Some(name.as_str())
            {
                let owner = self
                    .mappings
                    .iter()
                    .find(|(_, used)| *used == name)
                    .map_or_else(|| "an unmapped reservation".to_string(), |(owner, _)| format!("'{owner}'"));
                return Err(CacheError::new(
                    CacheOperation::Load,
                    format!("identifier '{name}' for '{class}' is already taken by {owner}"),
                ));
            }
        }

        for (class, name) in existing
        {
            self.used_names
                .insert(name.clone());
            self.mappings
                .insert(class.clone(), name.clone());

            if let Some(index) = layout.index_of(name)
            {
                self.cursor = self
                    .cursor
                    .max(index.saturating_add(1));
            }
        }

        debug!(seeded = existing.len(), cursor = self.cursor, "collision cache seeded");
        Ok(existing.len())
    }

    /// Export the class -> identifier mapping
    pub fn save_to_cache(&self) -> BTreeMap<String, String>
    {
        self.mappings
            .clone()
    }

    /// Current identifier for `class`, without touching the counters
    pub fn mapping_for(
        &self,
        class: &str,
    ) -> Option<&str>
    {
        self.mappings
            .get(class)
            .map(String::as_str)
    }

    /// Prior identifier for `class`, counting the lookup as hit or miss
    pub fn lookup(
        &mut self,
        class: &str,
    ) -> Option<String>
    {
        match self
            .mappings
            .get(class)
        {
            Some(name) =>
            {
                self.hits += 1;
                Some(name.clone())
            }
            None =>
            {
                self.misses += 1;
                None
            }
        }
    }

    /// Drop a stale mapping without freeing its identifier
    pub fn forget_mapping(
        &mut self,
        class: &str,
    )
    {
        self.mappings
            .remove(class);
    }

    pub fn get_stats(&self) -> CacheStats
    {
        let lookups = self.hits + self.misses;
        CacheStats {
            used_names: self
                .used_names
                .len(),
            reserved_names: self
                .reserved_names
                .len()
                + crate::core::names::validate::CSS_RESERVED_KEYWORDS.len(),
            cursor: self.cursor,
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups == 0 { 0.0 } else { self.hits as f64 / lookups as f64 },
        }
    }

    /// Reset usage state, keeping the reserved set
    pub fn clear(&mut self)
    {
        self.used_names
            .clear();
        self.mappings
            .clear();
        self.cursor = 0;
        self.hits = 0;
        self.misses = 0;
    }

    pub fn cursor(&self) -> u64
    {
        self.cursor
    }

    pub fn advance_cursor(&mut self)
    {
        self.cursor = self
            .cursor
            .saturating_add(1);
    }

    /// Move the cursor forward to at least `index`
    pub fn advance_cursor_to(
        &mut self,
        index: u64,
    )
    {
        self.cursor = self
            .cursor
            .max(index);
    }

    pub fn used_count(&self) -> usize
    {
        self.used_names
            .len()
    }

    pub fn mapping_count(&self) -> usize
    {
        self.mappings
            .len()
    }

    pub fn reserved_names(&self) -> &BTreeSet<String>
    {
        &self.reserved_names
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::names::alphabet::Alphabet;

    fn layout() -> NameLayout
    {
        NameLayout::new(Alphabet::lowercase(), false)
    }

    #[test]
    fn reserve_rejects_keywords_reserved_and_used()
    {
        let mut cache = NameCollisionCache::with_reserved(["btn"]);

        assert_eq!(cache.conflict("AUTO"), Some(ConflictKind::CssKeyword));
        assert_eq!(cache.conflict("btn"), Some(ConflictKind::Reserved));
        assert!(cache.reserve_name("a", Some("flex")));
        assert_eq!(cache.conflict("a"), Some(ConflictKind::Used));
        assert!(!cache.reserve_name("a", Some("block")));
        assert_eq!(
            cache
                .save_to_cache()
                .get("flex")
                .map(String::as_str),
            Some("a")
        );
    }

    #[test]
    fn load_advances_cursor_past_short_names()
    {
        let mut cache = NameCollisionCache::new();
        let existing: BTreeMap<String, String> = [
            ("flex".to_string(), "a".to_string()),
            ("p-4".to_string(), "ab".to_string()),
            ("custom".to_string(), "my-name".to_string()),
        ]
        .into_iter()
        .collect();

        let n = cache
            .load_from_cache(&existing, &layout())
            .unwrap();

        assert_eq!(n, 3);
        // "ab" is index 27
        assert_eq!(cache.cursor(), 28);
        assert!(!cache.is_available("my-name"));
    }

    #[test]
    fn load_rejects_duplicate_identifiers()
    {
        let mut cache = NameCollisionCache::new();
        let existing: BTreeMap<String, String> = [
            ("flex".to_string(), "a".to_string()),
            ("grid".to_string(), "a".to_string()),
        ]
        .into_iter()
        .collect();

        let err = cache
            .load_from_cache(&existing, &layout())
            .unwrap_err();
        assert_eq!(err.operation, CacheOperation::Load);
    }

    #[test]
    fn lookup_tracks_hit_rate()
    {
        let mut cache = NameCollisionCache::new();
        cache.reserve_name("a", Some("flex"));

        assert_eq!(cache.lookup("flex"), Some("a".to_string()));
        assert_eq!(cache.lookup("grid"), None);

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_keeps_reserved_names()
    {
        let mut cache = NameCollisionCache::with_reserved(["keep"]);
        cache.reserve_name("a", Some("flex"));
        cache.advance_cursor_to(10);

        cache.clear();

        assert!(cache.is_available("a"));
        assert_eq!(cache.cursor(), 0);
        assert_eq!(cache.mapping_count(), 0);
        assert!(!cache.is_available("keep"));
    }
}
