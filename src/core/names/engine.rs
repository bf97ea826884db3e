//! The generation pass: order classes, reuse seeded identifiers, assign the
//! rest through the selected strategy, then collect statistics.

use std::collections::BTreeMap;
use std::time::Instant;

use itertools::Itertools;
use tracing::{debug, info, instrument};

use crate::core::aggregate::{AggregatedClassData, PatternFrequencyMap};
use crate::core::analyze::{BucketSummary, bucket_by_frequency, compression_stats};
use crate::core::collision::NameCollisionCache;
use crate::core::error::NameGenError;
use crate::core::names::frequency::assignment_order;
use crate::core::names::hybrid::{HybridAssigner, pretty_head_size};
use crate::core::names::options::{GenerationOptions, Strategy};
use crate::core::names::pretty::{PrettyAssigner, PrettyPool};
use crate::core::names::result::{GenerationMetadata, GenerationResult, GenerationStatistics};
use crate::core::names::sequential::{NameLayout, SequentialSource, acquire};
use crate::core::names::validate::{is_css_keyword, validate_css_identifier};

/// Per-strategy assignment state for one run
enum Assigner<'a>
{
    /// Sequential and frequency-optimized share counting; only order differs
    Counting(SequentialSource<'a>),
    Pretty(PrettyAssigner<'a>),
    Hybrid(HybridAssigner<'a>),
}

impl Assigner<'_>
{
    fn assign(
        &mut self,
        class: &str,
        cache: &mut NameCollisionCache,
        options: &GenerationOptions,
        alphabet_len: usize,
    ) -> Result<String, NameGenError>
    {
        match self
        {
            Assigner::Counting(source) => acquire(source, cache, options, alphabet_len, Some(class))?
                .ok_or_else(|| NameGenError::generation("sequential source ended unexpectedly")),
            Assigner::Pretty(pretty) => pretty.assign(class, cache, options, alphabet_len),
            Assigner::Hybrid(hybrid) => hybrid.assign(class, cache, options, alphabet_len),
        }
    }

    fn fallback_strategy(&self) -> Option<Strategy>
    {
        match self
        {
            Assigner::Pretty(pretty) => pretty.fallback_strategy(),
            Assigner::Counting(_) | Assigner::Hybrid(_) => None,
        }
    }
}

/// Assign one identifier to every class at or above the frequency threshold.
///
/// The result depends only on the map contents, the options, and the state
/// of `cache`; the map's iteration order never matters.
#[instrument(level = "debug", skip_all, fields(strategy = %options.strategy, classes = map.len()))]
pub fn generate(
    map: &PatternFrequencyMap,
    options: &GenerationOptions,
    cache: &mut NameCollisionCache,
) -> Result<GenerationResult, NameGenError>
{
    let started = Instant::now();

    options.validate()?;
    let layout = NameLayout::from_options(options)?;
    let alphabet_len = layout
        .alphabet()
        .len();
    check_affixes(&layout, options)?;

    cache.extend_reserved(&options.reserved_names);
    cache.advance_cursor_to(options.start_index);

    let order = assignment_order(map, options);
    let mut name_map: BTreeMap<String, String> = BTreeMap::new();
    let mut pending: Vec<&AggregatedClassData> = Vec::with_capacity(order.len());

    for &data in &order
    {
        match reusable_name(cache, &data.class_name, options, &layout)
        {
            Some(name) =>
            {
                name_map.insert(
                    data.class_name
                        .clone(),
                    name,
                );
            }
            None => pending.push(data),
        }
    }
    let reused_from_cache = name_map.len();

    let pool = match options.strategy
    {
        Strategy::Pretty | Strategy::Hybrid => Some(PrettyPool::build_for(
            layout.alphabet(),
            &options.pretty,
            pending.len(),
            |core| {
                let name = layout.compose(core);
                cache.is_available(&name)
                    && (!options.enforce_css_validity || validate_css_identifier(&name).is_ok())
            },
        )?),
        Strategy::Sequential | Strategy::FrequencyOptimized => None,
    };

    let mut assigner = match (options.strategy, pool.as_ref())
    {
        (Strategy::Pretty, Some(pool)) => Assigner::Pretty(PrettyAssigner::new(pool, &layout, &options.pretty)),
        (Strategy::Hybrid, Some(pool)) =>
        {
            // A partial pool already holds enough free cores for every class
            let head = if pool.is_complete()
            {
                pretty_head_size(pool.len(), cache.used_count(), pending.len())
            }
            else
            {
                pending.len()
            };
            Assigner::Hybrid(HybridAssigner::new(pool, &layout, options, head))
        }
        _ => Assigner::Counting(SequentialSource::new(&layout)),
    };

    let batches = pending
        .len()
        .div_ceil(options.batch_size);
    for (batch, chunk) in pending
        .chunks(options.batch_size)
        .enumerate()
    {
        for data in chunk
        {
            let name = assigner.assign(&data.class_name, cache, options, alphabet_len)?;
            name_map.insert(
                data.class_name
                    .clone(),
                name,
            );
        }
        debug!(batch = batch + 1, batches, assigned = name_map.len(), "batch assigned");
    }

    if let Assigner::Hybrid(hybrid) = &assigner
    {
        debug!(pretty = hybrid.pretty_count(), "hybrid pretty names");
    }

    let stats = compression_stats(map, &name_map)
        .map_err(|e| NameGenError::caused_by("compression statistics failed", e))?;
    let buckets = bucket_by_frequency(&order, alphabet_len)
        .map_err(|e| NameGenError::caused_by("frequency bucketing failed", e))?;

    let generated_names: Vec<String> = order
        .iter()
        .filter_map(|d| {
            name_map
                .get(&d.class_name)
                .cloned()
        })
        .collect();
    let reverse_map: BTreeMap<String, String> = name_map
        .iter()
        .map(|(class, name)| (name.clone(), class.clone()))
        .collect();
    let length_distribution: BTreeMap<usize, usize> = name_map
        .values()
        .map(|name| {
            name.chars()
                .count()
        })
        .counts()
        .into_iter()
        .collect();

    let duration_ms = u64::try_from(
        started
            .elapsed()
            .as_millis(),
    )
    .unwrap_or(u64::MAX);

    info!(
        strategy = %options.strategy,
        names = name_map.len(),
        reused = reused_from_cache,
        ratio = stats.overall_compression_ratio,
        duration_ms,
        "identifiers generated"
    );

    Ok(GenerationResult {
        metadata: GenerationMetadata {
            strategy: options.strategy,
            total_names: name_map.len(),
            duration_ms,
            overall_compression_ratio: stats.overall_compression_ratio,
            fallback_strategy: assigner.fallback_strategy(),
            reused_from_cache,
            from_store: false,
        },
        statistics: GenerationStatistics {
            length_distribution,
            frequency_buckets: buckets
                .iter()
                .map(BucketSummary::from)
                .collect(),
            best_compressed: stats.best_compressed,
            worst_compressed: stats.worst_compressed,
            cache: cache.get_stats(),
        },
        name_map,
        reverse_map,
        generated_names,
    })
}

/// Seeded identifier for `class` when it is still acceptable under the
/// current options; stale mappings are dropped.
///
/// An identifier that no longer carries the configured prefix and suffix is
/// stale too.
fn reusable_name(
    cache: &mut NameCollisionCache,
    class: &str,
    options: &GenerationOptions,
    layout: &NameLayout,
) -> Option<String>
{
    if !options.use_cache
    {
        return None;
    }

    let name = cache.lookup(class)?;
    let valid = !options.enforce_css_validity || validate_css_identifier(&name).is_ok();
    let blocked = is_css_keyword(&name)
        || cache
            .reserved_names()
            .contains(&name);
    let wrapped = layout
        .core_of(&name)
        .is_some();

    if valid && !blocked && wrapped
    {
        return Some(name);
    }

    debug!(class, name = %name, "dropping stale cached identifier");
    cache.forget_mapping(class);
    None
}

/// Fail early when the prefix or suffix can never form a valid identifier
fn check_affixes(
    layout: &NameLayout,
    options: &GenerationOptions,
) -> Result<(), NameGenError>
{
    if !options.enforce_css_validity
        || (options
            .prefix
            .is_empty()
            && options
                .suffix
                .is_empty())
    {
        return Ok(());
    }

    let chars = layout
        .alphabet()
        .chars();
    let probe = chars
        .iter()
        .find(|c| c.is_ascii_alphabetic())
        .or_else(|| chars.first())
        .copied()
        .unwrap_or('a');

    validate_css_identifier(&layout.compose(&probe.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::aggregate::SourceType;
    use crate::core::error::InvalidNameReason;
    use crate::core::names::options::{ExhaustionPolicy, PrettyOptions};

    fn class(
        name: &str,
        freq: u64,
    ) -> AggregatedClassData
    {
        let mut d = AggregatedClassData::new(name, SourceType::HtmlOnly);
        d.total_frequency = freq;
        d.html_frequency = freq;
        d
    }

    fn map_of(entries: &[(&str, u64)]) -> PatternFrequencyMap
    {
        entries
            .iter()
            .map(|(n, f)| class(n, *f))
            .collect()
    }

    #[test]
    fn empty_map_yields_empty_result()
    {
        let mut cache = NameCollisionCache::new();
        let result = generate(&PatternFrequencyMap::new(), &GenerationOptions::default(), &mut cache).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.metadata.total_names, 0);
        assert_eq!(result.metadata.overall_compression_ratio, 1.0);
    }

    #[test]
    fn sequential_assigns_alphabetically()
    {
        let map = map_of(&[("zz-top", 1), ("alpha", 100), ("mid", 50)]);
        let opts = GenerationOptions::default().with_strategy(Strategy::Sequential);
        let result = generate(&map, &opts, &mut NameCollisionCache::new()).unwrap();

        assert_eq!(result.name_for("alpha"), Some("a"));
        assert_eq!(result.name_for("mid"), Some("b"));
        assert_eq!(result.name_for("zz-top"), Some("c"));
    }

    #[test]
    fn reserved_alphabet_raises_collision()
    {
        let map = map_of(&[("flex", 1)]);
        let opts = GenerationOptions::default()
            .with_alphabet("ab")
            .with_reserved(["a", "b"]);

        let err = generate(&map, &opts, &mut NameCollisionCache::new()).unwrap_err();
        match err
        {
            NameGenError::Collision(e) => assert_eq!(e.attempted, vec!["a", "b"]),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn invalid_prefix_is_rejected_up_front()
    {
        let map = map_of(&[("flex", 1)]);
        let opts = GenerationOptions::default().with_affixes("9", "");

        let err = generate(&map, &opts, &mut NameCollisionCache::new()).unwrap_err();
        match err
        {
            NameGenError::InvalidName(e) => assert_eq!(e.reason, InvalidNameReason::LeadingDigit),
            other => panic!("expected invalid name, got {other:?}"),
        }
    }

    #[test]
    fn cached_mapping_is_kept_and_counted()
    {
        let map = map_of(&[("flex", 10), ("grid", 5)]);
        let mut cache = NameCollisionCache::new();
        cache.reserve_name("q", Some("grid"));

        let result = generate(&map, &GenerationOptions::default(), &mut cache).unwrap();

        assert_eq!(result.name_for("grid"), Some("q"));
        assert_eq!(result.name_for("flex"), Some("a"));
        assert_eq!(result.metadata.reused_from_cache, 1);
        assert_eq!(result.statistics.cache.hits, 1);
    }

    #[test]
    fn cached_mapping_to_reserved_name_is_replaced()
    {
        let map = map_of(&[("flex", 10)]);
        let mut cache = NameCollisionCache::new();
        cache.reserve_name("q", Some("flex"));

        let opts = GenerationOptions::default().with_reserved(["q"]);
        let result = generate(&map, &opts, &mut cache).unwrap();

        assert_eq!(result.name_for("flex"), Some("a"));
        assert_eq!(result.metadata.reused_from_cache, 0);
    }

    #[test]
    fn cached_mapping_without_current_prefix_is_replaced()
    {
        let map = map_of(&[("flex", 10), ("grid", 5)]);
        let mut cache = NameCollisionCache::new();
        cache.reserve_name("a", Some("flex"));

        let opts = GenerationOptions::default().with_affixes("tw-", "");
        let result = generate(&map, &opts, &mut cache).unwrap();

        assert_eq!(result.name_for("flex"), Some("tw-a"));
        assert_eq!(result.name_for("grid"), Some("tw-b"));
        assert_eq!(result.metadata.reused_from_cache, 0);
    }

    #[test]
    fn pretty_error_policy_fails_on_exhaustion()
    {
        let map = map_of(&[("a1", 5), ("a2", 4), ("a3", 3)]);
        let opts = GenerationOptions::default()
            .with_strategy(Strategy::Pretty)
            .with_alphabet("ab")
            .with_pretty(PrettyOptions {
                max_length: 1,
                exhaustion_policy: ExhaustionPolicy::Error,
                ..Default::default()
            });

        let err = generate(&map, &opts, &mut NameCollisionCache::new()).unwrap_err();
        match err
        {
            NameGenError::PrettyExhaustion(e) =>
            {
                assert_eq!(e.max_length, 1);
                assert_eq!(e.generated, 2);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn pretty_sequential_policy_records_fallback()
    {
        let map = map_of(&[("a1", 5), ("a2", 4), ("a3", 3)]);
        let opts = GenerationOptions::default()
            .with_strategy(Strategy::Pretty)
            .with_alphabet("ab")
            .with_pretty(PrettyOptions { max_length: 1, ..Default::default() });

        let result = generate(&map, &opts, &mut NameCollisionCache::new()).unwrap();

        assert_eq!(result.metadata.fallback_strategy, Some(Strategy::Sequential));
        assert_eq!(result.name_for("a3"), Some("aa"));
    }

    #[test]
    fn long_pretty_max_length_builds_only_needed_tiers()
    {
        let map = map_of(&[("flex", 5), ("grid", 4), ("block", 3)]);
        let opts = GenerationOptions::default()
            .with_strategy(Strategy::Pretty)
            .with_pretty(PrettyOptions { max_length: 8, ..Default::default() });

        let result = generate(&map, &opts, &mut NameCollisionCache::new()).unwrap();

        assert_eq!(result.metadata.fallback_strategy, None);
        assert!(
            result
                .name_map
                .values()
                .all(|name| name.len() == 1)
        );
    }

    #[test]
    fn batching_does_not_change_assignment()
    {
        let map: PatternFrequencyMap = (0..40)
            .map(|i| class(&format!("c-{i:02}"), 100 - i))
            .collect();

        let whole = generate(&map, &GenerationOptions::default(), &mut NameCollisionCache::new()).unwrap();
        let small = GenerationOptions { batch_size: 3, ..Default::default() };
        let chunked = generate(&map, &small, &mut NameCollisionCache::new()).unwrap();

        assert_eq!(whole.name_map, chunked.name_map);
        assert_eq!(whole.generated_names, chunked.generated_names);
    }
}
