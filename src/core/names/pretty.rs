//! Pretty identifiers: scored permutations without repeated characters.
//!
//! The pool holds repetition-free cores of length `1..=max_length`, ordered
//! once by score. A run builds only the length tiers it can consume (see
//! [`PrettyPool::build_for`]). Sources walk the pool with their own cursor;
//! when it runs dry the exhaustion policy picks a fallback in
//! [`resolve_exhaustion`].

use itertools::Itertools;
use tracing::{debug, warn};

use crate::core::collision::NameCollisionCache;
use crate::core::error::{NameGenError, PrettyNameExhaustionError};
use crate::core::names::alphabet::Alphabet;
use crate::core::names::options::{ExhaustionPolicy, GenerationOptions, PrettyOptions, ScoreWeights, Strategy};
use crate::core::names::sequential::{CandidateSource, NameLayout, SequentialSource, acquire};

/// Largest pool built in memory, counted over the tiers actually built
pub const MAX_POOL_SIZE: u64 = 2_000_000;

/// Upper bound of the aesthetic component, keeping it below one length step
const AESTHETIC_CEILING: f64 = 0.999;

/// Consonant pairs that read smoothly and are not penalized
const SMOOTH_CLUSTERS: &[&str] = &[
    "bl", "br", "ch", "ck", "cl", "cr", "dr", "fl", "fr", "gl", "gr", "ld", "lk", "lm", "lp", "lt", "mb",
    "mp", "nd", "ng", "nk", "nt", "ph", "pl", "pr", "rd", "rk", "rm", "rn", "rt", "sc", "sh", "sk", "sl",
    "sm", "sn", "sp", "st", "sw", "th", "tr", "wh",
];

fn is_vowel(c: char) -> bool
{
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn is_harsh_pair(
    a: char,
    b: char,
) -> bool
{
    if is_vowel(a) || is_vowel(b)
    {
        return false;
    }

    let pair: String = [a.to_ascii_lowercase(), b.to_ascii_lowercase()]
        .iter()
        .collect();
    !SMOOTH_CLUSTERS.contains(&pair.as_str())
}

/// Aesthetic component of a core's score, within `[0, 1)`.
///
/// Rewards vowel/consonant alternation and a preferred leading character;
/// penalizes harsh consonant pairs. Weights are configuration, not law.
pub fn aesthetic_score(
    core: &str,
    weights: &ScoreWeights,
) -> f64
{
    let chars: Vec<char> = core
        .chars()
        .collect();
    let Some(&first) = chars.first()
    else
    {
        return 0.0;
    };

    let pairs = chars.len() - 1;
    let (alternation, harsh) = if pairs == 0
    {
        (1.0, 0.0)
    }
    else
    {
        let alternating = chars
            .iter()
            .tuple_windows()
            .filter(|&(a, b)| is_vowel(*a) != is_vowel(*b))
            .count();
        let harsh = chars
            .iter()
            .tuple_windows()
            .filter(|&(a, b)| is_harsh_pair(*a, *b))
            .count();
        (alternating as f64 / pairs as f64, harsh as f64 / pairs as f64)
    };

    let leading = if weights
        .preferred_leading
        .chars()
        .any(|c| c.eq_ignore_ascii_case(&first))
    {
        1.0
    }
    else
    {
        0.0
    };

    let scale = weights.alternation + weights.leading;
    if !(scale.is_finite() && scale > 0.0)
    {
        return 0.0;
    }

    let raw = (weights.alternation * alternation + weights.leading * leading
        - weights.cluster_penalty * harsh)
        / scale;
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, AESTHETIC_CEILING) }
}

/// Full score in `[0, 1)`: one point per character saved below
/// `max_length`, plus the aesthetic component, normalized.
///
/// A shorter core always outscores a longer one.
pub fn score(
    core: &str,
    max_length: usize,
    weights: &ScoreWeights,
) -> f64
{
    let max_length = max_length.max(1);
    let len = core
        .chars()
        .count();
    let saved = max_length.saturating_sub(len) as f64;

    (saved + aesthetic_score(core, weights)) / max_length as f64
}

#[derive(Debug, Clone, PartialEq)]
struct ScoredCore
{
    core: String,
    len: usize,
    aesthetic: f64,
    score: f64,
}

/// Pretty cores, in consumption order
#[derive(Debug, Clone, PartialEq)]
pub struct PrettyPool
{
    cores: Vec<ScoredCore>,
    /// Every tier up to `max_length` was built
    complete: bool,
}

impl PrettyPool
{
    /// Every core of length `1..=max_length`
    pub fn build(
        alphabet: &Alphabet,
        options: &PrettyOptions,
    ) -> Result<Self, NameGenError>
    {
        Self::build_for(alphabet, options, usize::MAX, |_| true)
    }

    /// Cores for a run that needs `demand` of them to pass `accepts`.
    ///
    /// With `prefer_shorter`, tiers are built shortest first and building
    /// stops once the accepted count reaches `demand`, so longer tiers are
    /// never materialized (nor checked against [`MAX_POOL_SIZE`]) unless the
    /// run reaches them. Ordering across tiers by aesthetics alone needs
    /// every tier.
    pub fn build_for<F>(
        alphabet: &Alphabet,
        options: &PrettyOptions,
        demand: usize,
        mut accepts: F,
    ) -> Result<Self, NameGenError>
    where
        F: FnMut(&str) -> bool,
    {
        let max_len = options
            .max_length
            .min(alphabet.len());
        let mut cores: Vec<ScoredCore> = Vec::new();
        let mut accepted = 0usize;
        let mut complete = true;

        for len in 1..=max_len
        {
            if options.prefer_shorter && accepted >= demand
            {
                complete = false;
                break;
            }

            let capacity = alphabet.permutation_capacity(len);
            if capacity > MAX_POOL_SIZE
            {
                return Err(NameGenError::generation(format!(
                    "pretty pool of {capacity} candidates (length {len}) exceeds the limit of {MAX_POOL_SIZE}; lower pretty.max_length"
                )));
            }
            cores.reserve((capacity as usize).saturating_sub(cores.len()));

            for perm in alphabet
                .chars()
                .iter()
                .copied()
                .permutations(len)
            {
                let core: String = perm
                    .into_iter()
                    .collect();
                if accepts(&core)
                {
                    accepted += 1;
                }
                let aesthetic = aesthetic_score(&core, &options.weights);
                let score = score(&core, options.max_length, &options.weights);
                cores.push(ScoredCore { core, len, aesthetic, score });
            }
        }

        if options.prefer_shorter
        {
            cores.sort_by(|a, b| {
                b.score
                    .total_cmp(&a.score)
                    .then_with(|| {
                        a.core
                            .cmp(&b.core)
                    })
            });
        }
        else
        {
            cores.sort_by(|a, b| {
                b.aesthetic
                    .total_cmp(&a.aesthetic)
                    .then(a.len.cmp(&b.len))
                    .then_with(|| {
                        a.core
                            .cmp(&b.core)
                    })
            });
        }

        debug!(pool = cores.len(), complete, max_length = options.max_length, "pretty pool built");
        Ok(Self { cores, complete })
    }

    pub fn is_complete(&self) -> bool
    {
        self.complete
    }

    pub fn len(&self) -> usize
    {
        self.cores
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.cores
            .is_empty()
    }

    /// Core at `position` in consumption order
    pub fn core(
        &self,
        position: usize,
    ) -> Option<&str>
    {
        self.cores
            .get(position)
            .map(|c| c.core.as_str())
    }

    /// Cores in consumption order
    pub fn cores(&self) -> impl Iterator<Item = &str>
    {
        self.cores
            .iter()
            .map(|c| c.core.as_str())
    }
}

/// Walks the pool once
pub(crate) struct PrettySource<'a>
{
    pool: &'a PrettyPool,
    layout: &'a NameLayout,
    next: usize,
}

impl<'a> PrettySource<'a>
{
    pub(crate) fn new(
        pool: &'a PrettyPool,
        layout: &'a NameLayout,
    ) -> Self
    {
        Self { pool, layout, next: 0 }
    }
}

impl CandidateSource for PrettySource<'_>
{
    fn next_candidate(
        &mut self,
        _cache: &mut NameCollisionCache,
    ) -> Option<String>
    {
        let core = self
            .pool
            .core(self.next)?;
        self.next += 1;
        Some(
            self.layout
                .compose(core),
        )
    }

    fn strategy(&self) -> Strategy
    {
        Strategy::Pretty
    }
}

/// Cycles the pool with numeric suffixes: `a1, e1, … a2, e2, …`
pub(crate) struct SuffixedPrettySource<'a>
{
    pool: &'a PrettyPool,
    layout: &'a NameLayout,
    next: usize,
    round: u64,
}

impl<'a> SuffixedPrettySource<'a>
{
    pub(crate) fn new(
        pool: &'a PrettyPool,
        layout: &'a NameLayout,
    ) -> Self
    {
        Self { pool, layout, next: 0, round: 1 }
    }
}

impl CandidateSource for SuffixedPrettySource<'_>
{
    fn next_candidate(
        &mut self,
        _cache: &mut NameCollisionCache,
    ) -> Option<String>
    {
        if self
            .pool
            .is_empty()
        {
            return None;
        }

        if self.next
            >= self
                .pool
                .len()
        {
            self.next = 0;
            self.round = self
                .round
                .checked_add(1)?;
        }

        let core = self
            .pool
            .core(self.next)?;
        self.next += 1;
        Some(
            self.layout
                .compose(&format!("{core}{}", self.round)),
        )
    }

    fn strategy(&self) -> Strategy
    {
        Strategy::Hybrid
    }
}

/// Single decision point for pretty-pool exhaustion.
///
/// Returns the source that takes over, or the fatal error when the policy
/// allows no recovery.
pub(crate) fn resolve_exhaustion<'a>(
    policy: ExhaustionPolicy,
    pool: &'a PrettyPool,
    layout: &'a NameLayout,
    max_length: usize,
    generated: usize,
) -> Result<Box<dyn CandidateSource + 'a>, NameGenError>
{
    match policy
    {
        ExhaustionPolicy::Sequential =>
        {
            warn!(generated, max_length, "pretty names exhausted; continuing with sequential names");
            Ok(Box::new(SequentialSource::new(layout)))
        }
        ExhaustionPolicy::Hybrid =>
        {
            if pool.is_empty()
            {
                return Err(PrettyNameExhaustionError {
                    max_length,
                    generated,
                    attempted_fallbacks: vec![Strategy::Hybrid],
                }
                .into());
            }
            warn!(generated, max_length, "pretty names exhausted; continuing with suffixed pretty names");
            Ok(Box::new(SuffixedPrettySource::new(pool, layout)))
        }
        ExhaustionPolicy::Error => Err(PrettyNameExhaustionError {
            max_length,
            generated,
            attempted_fallbacks: Vec::new(),
        }
        .into()),
    }
}

/// Pretty assignment with the exhaustion policy applied once the pool runs dry
pub(crate) struct PrettyAssigner<'a>
{
    pool: &'a PrettyPool,
    layout: &'a NameLayout,
    policy: ExhaustionPolicy,
    max_length: usize,
    primary: PrettySource<'a>,
    fallback: Option<Box<dyn CandidateSource + 'a>>,
    generated: usize,
}

impl<'a> PrettyAssigner<'a>
{
    pub(crate) fn new(
        pool: &'a PrettyPool,
        layout: &'a NameLayout,
        pretty: &PrettyOptions,
    ) -> Self
    {
        Self {
            pool,
            layout,
            policy: pretty.exhaustion_policy,
            max_length: pretty.max_length,
            primary: PrettySource::new(pool, layout),
            fallback: None,
            generated: 0,
        }
    }

    /// Override the exhaustion policy
    pub(crate) fn with_policy(
        mut self,
        policy: ExhaustionPolicy,
    ) -> Self
    {
        self.policy = policy;
        self
    }

    /// Accept the next identifier for `class`
    pub(crate) fn assign(
        &mut self,
        class: &str,
        cache: &mut NameCollisionCache,
        options: &GenerationOptions,
        alphabet_len: usize,
    ) -> Result<String, NameGenError>
    {
        if self
            .fallback
            .is_none()
        {
            if let Some(name) = acquire(&mut self.primary, cache, options, alphabet_len, Some(class))?
            {
                self.generated += 1;
                return Ok(name);
            }

            self.fallback = Some(resolve_exhaustion(
                self.policy,
                self.pool,
                self.layout,
                self.max_length,
                self.generated,
            )?);
        }

        let Some(fallback) = self
            .fallback
            .as_mut()
        else
        {
            return Err(NameGenError::generation("no fallback source after pretty exhaustion"));
        };

        acquire(fallback.as_mut(), cache, options, alphabet_len, Some(class))?
            .ok_or_else(|| NameGenError::generation("fallback source ended unexpectedly"))
    }

    /// Strategy of the active fallback, once exhaustion has happened
    pub(crate) fn fallback_strategy(&self) -> Option<Strategy>
    {
        self.fallback
            .as_ref()
            .map(|s| s.strategy())
    }

    /// Pretty names accepted so far
    pub(crate) fn generated(&self) -> usize
    {
        self.generated
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn weights() -> ScoreWeights
    {
        ScoreWeights::default()
    }

    #[test]
    fn shorter_always_scores_higher()
    {
        let w = weights();
        assert!(score("x", 3, &w) > score("ab", 3, &w));
        assert!(score("zq", 3, &w) > score("bad", 3, &w));
    }

    #[test]
    fn alternation_beats_clusters()
    {
        let w = weights();
        assert!(aesthetic_score("bad", &w) > aesthetic_score("bcd", &w));
        assert!(score("bad", 3, &w) > score("bcd", 3, &w));
    }

    #[test]
    fn degenerate_weights_do_not_produce_nan()
    {
        let w = ScoreWeights {
            alternation: 0.0,
            leading: 0.0,
            cluster_penalty: 1.0,
            preferred_leading: String::new(),
        };
        assert_eq!(aesthetic_score("ab", &w), 0.0);
        assert!(
            score("ab", 2, &w)
                .is_finite()
        );
    }

    #[test]
    fn pool_has_no_repeated_characters()
    {
        let pool = PrettyPool::build(&Alphabet::lowercase(), &PrettyOptions::default()).unwrap();
        assert_eq!(pool.len(), 26 + 26 * 25 + 26 * 25 * 24);

        for core in pool.cores()
        {
            let unique: std::collections::HashSet<char> = core
                .chars()
                .collect();
            assert_eq!(unique.len(), core.len(), "{core}");
        }
    }

    #[test]
    fn pool_is_tiered_by_length_when_preferring_shorter()
    {
        let pool = PrettyPool::build(&Alphabet::lowercase(), &PrettyOptions::default()).unwrap();
        let lengths: Vec<usize> = pool
            .cores()
            .map(str::len)
            .collect();
        assert!(
            lengths
                .windows(2)
                .all(|w| w[0] <= w[1])
        );
    }

    #[test]
    fn oversized_pool_is_rejected()
    {
        let opts = PrettyOptions { max_length: 6, ..Default::default() };
        assert!(PrettyPool::build(&Alphabet::lowercase(), &opts).is_err());
    }

    #[test]
    fn demand_limits_the_tiers_built()
    {
        let opts = PrettyOptions { max_length: 6, ..Default::default() };
        let pool = PrettyPool::build_for(&Alphabet::lowercase(), &opts, 30, |_| true).unwrap();

        // 26 one-char cores are not enough, so the two-char tier is added
        assert_eq!(pool.len(), 26 + 26 * 25);
        assert!(!pool.is_complete());

        let few = PrettyPool::build_for(&Alphabet::lowercase(), &opts, 30, |core| core.len() > 1).unwrap();
        assert_eq!(few.len(), 26 + 26 * 25);

        let full = PrettyPool::build(&Alphabet::new("abc").unwrap(), &opts).unwrap();
        assert!(full.is_complete());
        assert_eq!(full.len(), 3 + 6 + 6);
    }

    #[test]
    fn suffixed_source_cycles_rounds()
    {
        let alpha = Alphabet::new("ab").unwrap();
        let opts = PrettyOptions { max_length: 1, ..Default::default() };
        let pool = PrettyPool::build(&alpha, &opts).unwrap();
        let layout = NameLayout::new(alpha, false);
        let mut cache = NameCollisionCache::new();

        let mut source = SuffixedPrettySource::new(&pool, &layout);
        let names: Vec<String> = (0..4)
            .filter_map(|_| source.next_candidate(&mut cache))
            .collect();
        assert_eq!(names, vec!["a1", "b1", "a2", "b2"]);
    }

    #[test]
    fn error_policy_reports_no_fallbacks()
    {
        let alpha = Alphabet::new("ab").unwrap();
        let pool = PrettyPool::build(&alpha, &PrettyOptions::default()).unwrap();
        let layout = NameLayout::new(alpha, false);

        let result = resolve_exhaustion(ExhaustionPolicy::Error, &pool, &layout, 3, 4);
        match result
        {
            Err(NameGenError::PrettyExhaustion(e)) =>
            {
                assert_eq!(e.generated, 4);
                assert!(
                    e.attempted_fallbacks
                        .is_empty()
                );
            }
            _ => panic!("expected exhaustion error"),
        }
    }
}
