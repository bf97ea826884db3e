//! Sequential identifiers and the shared candidate-acceptance loop.
//!
//! Every strategy produces raw candidates through [`CandidateSource`];
//! [`acquire`] is the single place where candidates are validated, checked
//! against the collision cache, and either reserved or rejected.

use tracing::trace;

use crate::core::collision::NameCollisionCache;
use crate::core::error::{CollisionError, NameGenError};
use crate::core::names::alphabet::Alphabet;
use crate::core::names::options::{GenerationOptions, Strategy};
use crate::core::names::validate::validate_css_identifier;

/// How an index becomes a full identifier: alphabet, suffix mode, affixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameLayout
{
    alphabet: Alphabet,
    numeric_suffix: bool,
    prefix: String,
    suffix: String,
}

impl NameLayout
{
    pub fn new(
        alphabet: Alphabet,
        numeric_suffix: bool,
    ) -> Self
    {
        Self { alphabet, numeric_suffix, prefix: String::new(), suffix: String::new() }
    }

    pub fn from_options(options: &GenerationOptions) -> Result<Self, NameGenError>
    {
        Ok(Self {
            alphabet: options.parsed_alphabet()?,
            numeric_suffix: options.numeric_suffix,
            prefix: options
                .prefix
                .clone(),
            suffix: options
                .suffix
                .clone(),
        })
    }

    pub fn alphabet(&self) -> &Alphabet
    {
        &self.alphabet
    }

    /// Core (un-affixed) candidate for a sequential index
    pub fn core_at(
        &self,
        index: u64,
    ) -> String
    {
        if !self.numeric_suffix
        {
            return self
                .alphabet
                .encode(index);
        }

        let n = self
            .alphabet
            .len() as u64;
        let mut core = self.alphabet.chars()[(index % n) as usize].to_string();
        let round = index / n;
        if round > 0
        {
            core.push_str(&round.to_string());
        }
        core
    }

    /// Full identifier for a sequential index
    pub fn name_at(
        &self,
        index: u64,
    ) -> String
    {
        self.compose(&self.core_at(index))
    }

    /// Wrap a core in the configured prefix and suffix
    pub fn compose(
        &self,
        core: &str,
    ) -> String
    {
        format!("{}{}{}", self.prefix, core, self.suffix)
    }

    /// Strip prefix and suffix, if both are present
    pub fn core_of<'a>(
        &self,
        name: &'a str,
    ) -> Option<&'a str>
    {
        name.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
            .filter(|core| !core.is_empty())
    }

    /// Sequential index a full identifier corresponds to, if any
    pub fn index_of(
        &self,
        name: &str,
    ) -> Option<u64>
    {
        let core = self.core_of(name)?;

        if !self.numeric_suffix
        {
            return self
                .alphabet
                .decode(core)
                .ok();
        }

        let mut chars = core.chars();
        let head = chars.next()?;
        let pos = self
            .alphabet
            .position(head)? as u64;
        let digits = chars.as_str();

        if digits.is_empty()
        {
            return Some(pos);
        }

        // round 0 renders without digits, so "a0" or "a01" never occur
        if digits.starts_with('0')
            || !digits
                .chars()
                .all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let round: u64 = digits
            .parse()
            .ok()?;
        round
            .checked_mul(
                self.alphabet
                    .len() as u64,
            )?
            .checked_add(pos)
    }
}

/// A stream of raw identifier candidates
pub(crate) trait CandidateSource
{
    /// Next candidate, or `None` once the source is exhausted
    fn next_candidate(
        &mut self,
        cache: &mut NameCollisionCache,
    ) -> Option<String>;

    /// Strategy reported for names produced by this source
    fn strategy(&self) -> Strategy;
}

/// Counts through the layout starting at the cache cursor
pub(crate) struct SequentialSource<'a>
{
    layout: &'a NameLayout,
}

impl<'a> SequentialSource<'a>
{
    pub(crate) fn new(layout: &'a NameLayout) -> Self
    {
        Self { layout }
    }
}

impl CandidateSource for SequentialSource<'_>
{
    fn next_candidate(
        &mut self,
        cache: &mut NameCollisionCache,
    ) -> Option<String>
    {
        let index = cache.cursor();
        cache.advance_cursor();
        Some(
            self.layout
                .name_at(index),
        )
    }

    fn strategy(&self) -> Strategy
    {
        Strategy::Sequential
    }
}

/// Pull candidates until one is accepted, recording it for `class`.
///
/// Returns `Ok(None)` when the source runs dry. Rejections (invalid grammar,
/// reserved, already used) count toward the consecutive-retry budget; hitting
/// the budget raises [`CollisionError`].
pub(crate) fn acquire<S: CandidateSource + ?Sized>(
    source: &mut S,
    cache: &mut NameCollisionCache,
    options: &GenerationOptions,
    alphabet_len: usize,
    class: Option<&str>,
) -> Result<Option<String>, NameGenError>
{
    let budget = options.retry_budget(alphabet_len, cache.used_count());
    let mut attempted: Vec<String> = Vec::new();

    while let Some(candidate) = source.next_candidate(cache)
    {
        let grammar_ok = !options.enforce_css_validity || validate_css_identifier(&candidate).is_ok();

        if grammar_ok && cache.reserve_name(&candidate, class)
        {
            return Ok(Some(candidate));
        }

        trace!(candidate = %candidate, "candidate rejected");
        attempted.push(candidate);

        if attempted.len() >= budget
        {
            let conflicting = attempted
                .last()
                .cloned()
                .unwrap_or_default();
            return Err(CollisionError { conflicting, attempted }.into());
        }
    }

    Ok(None)
}

/// Accept the next free sequential identifier without tying it to a class
pub fn next_available_name(
    options: &GenerationOptions,
    cache: &mut NameCollisionCache,
) -> Result<String, NameGenError>
{
    let layout = NameLayout::from_options(options)?;
    let alphabet_len = layout
        .alphabet()
        .len();
    cache.extend_reserved(&options.reserved_names);
    cache.advance_cursor_to(options.start_index);

    let mut source = SequentialSource::new(&layout);
    acquire(&mut source, cache, options, alphabet_len, None)?
        .ok_or_else(|| NameGenError::generation("sequential source ended unexpectedly"))
}

/// Accept `count` fresh sequential identifiers in ascending index order
pub fn generate_sequential_names(
    count: usize,
    options: &GenerationOptions,
    cache: &mut NameCollisionCache,
) -> Result<Vec<String>, NameGenError>
{
    let layout = NameLayout::from_options(options)?;
    let alphabet_len = layout
        .alphabet()
        .len();
    cache.extend_reserved(&options.reserved_names);
    cache.advance_cursor_to(options.start_index);

    let mut source = SequentialSource::new(&layout);
    let mut names = Vec::with_capacity(count);

    for _ in 0..count
    {
        let name = acquire(&mut source, cache, options, alphabet_len, None)?
            .ok_or_else(|| NameGenError::generation("sequential source ended unexpectedly"))?;
        names.push(name);
    }

    Ok(names)
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn layout(numeric_suffix: bool) -> NameLayout
    {
        NameLayout::new(Alphabet::lowercase(), numeric_suffix)
    }

    #[test]
    fn numeric_suffix_rounds()
    {
        let l = layout(true);
        assert_eq!(l.core_at(0), "a");
        assert_eq!(l.core_at(25), "z");
        assert_eq!(l.core_at(26), "a1");
        assert_eq!(l.core_at(53), "b2");
    }

    #[test]
    fn index_of_inverts_core_at()
    {
        for numeric in [false, true]
        {
            let l = layout(numeric);
            for i in 0..2_000
            {
                assert_eq!(l.index_of(&l.name_at(i)), Some(i), "numeric={numeric} i={i}");
            }
        }
    }

    #[test]
    fn index_of_rejects_foreign_names()
    {
        let l = layout(true);
        assert_eq!(l.index_of("a0"), None);
        assert_eq!(l.index_of("a01"), None);
        assert_eq!(l.index_of("1a"), None);

        let plain = layout(false);
        assert_eq!(plain.index_of("a-b"), None);
    }

    #[test]
    fn affixes_wrap_and_strip()
    {
        let opts = GenerationOptions::default().with_affixes("x-", "-y");
        let l = NameLayout::from_options(&opts).unwrap();
        assert_eq!(l.name_at(26), "x-aa-y");
        assert_eq!(l.core_of("x-aa-y"), Some("aa"));
        assert_eq!(l.index_of("x-aa-y"), Some(26));
        assert_eq!(l.core_of("aa"), None);
        assert_eq!(l.core_of("x--y"), None);
    }

    #[test]
    fn sequential_names_skip_reserved()
    {
        let opts = GenerationOptions::default().with_reserved(["b"]);
        let mut cache = NameCollisionCache::new();
        let names = generate_sequential_names(3, &opts, &mut cache).unwrap();
        assert_eq!(names, vec!["a", "c", "d"]);
    }
}
