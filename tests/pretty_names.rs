//! Integration tests for pretty and hybrid naming, including pool exhaustion.

use std::collections::BTreeSet;

use classpack::core::collision::NameCollisionCache;
use classpack::core::error::NameGenError;
use classpack::core::names::{
    Alphabet, ExhaustionPolicy, GenerationOptions, PrettyOptions, PrettyPool, Strategy, generate, score,
};

mod util;
use util::map_of;

/// Six classes with strictly decreasing frequency: c1 (hottest) .. c6
fn six_classes() -> classpack::core::PatternFrequencyMap
{
    map_of(&[("c1", 60), ("c2", 50), ("c3", 40), ("c4", 30), ("c5", 20), ("c6", 10)])
}

/// Alphabet `ab` with cores up to two characters: pool is a, b, ab, ba
fn tiny_pretty(
    strategy: Strategy,
    policy: ExhaustionPolicy,
) -> GenerationOptions
{
    GenerationOptions::default()
        .with_strategy(strategy)
        .with_alphabet("ab")
        .with_pretty(PrettyOptions {
            max_length: 2,
            exhaustion_policy: policy,
            ..PrettyOptions::default()
        })
}

#[test]
fn pretty_names_never_repeat_a_character()
{
    let map = map_of(&[("flex", 50), ("grid", 40), ("block", 30), ("hidden", 20), ("p-4", 10)]);
    let opts = GenerationOptions::default().with_strategy(Strategy::Pretty);
    let result = generate(&map, &opts, &mut NameCollisionCache::new()).expect("generate");

    assert_eq!(result.metadata.total_names, 5);
    assert_eq!(result.metadata.fallback_strategy, None);
    assert_eq!(result.name_for("flex"), Some("a"));

    for name in result.name_map.values()
    {
        let unique: BTreeSet<char> = name.chars().collect();
        assert_eq!(unique.len(), name.chars().count(), "{name} repeats a character");
    }
}

#[test]
fn pool_order_follows_score()
{
    let opts = PrettyOptions::default();
    let pool = PrettyPool::build(&Alphabet::lowercase(), &opts).expect("pool");

    let scores: Vec<f64> = pool
        .cores()
        .map(|core| score(core, opts.max_length, &opts.weights))
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn sequential_policy_continues_after_the_pool()
{
    let opts = tiny_pretty(Strategy::Pretty, ExhaustionPolicy::Sequential);
    let result = generate(&six_classes(), &opts, &mut NameCollisionCache::new()).expect("generate");

    let names: Vec<&str> = ["c1", "c2", "c3", "c4", "c5", "c6"]
        .iter()
        .filter_map(|c| result.name_for(c))
        .collect();
    assert_eq!(names, vec!["a", "b", "ab", "ba", "aa", "bb"]);
    assert_eq!(result.metadata.fallback_strategy, Some(Strategy::Sequential));
}

#[test]
fn hybrid_policy_suffixes_pool_cores()
{
    let opts = tiny_pretty(Strategy::Pretty, ExhaustionPolicy::Hybrid);
    let result = generate(&six_classes(), &opts, &mut NameCollisionCache::new()).expect("generate");

    assert_eq!(result.name_for("c5"), Some("a1"));
    assert_eq!(result.name_for("c6"), Some("b1"));
    assert_eq!(result.metadata.fallback_strategy, Some(Strategy::Hybrid));
}

#[test]
fn error_policy_fails_once_the_pool_is_spent()
{
    let opts = tiny_pretty(Strategy::Pretty, ExhaustionPolicy::Error);
    let err = generate(&six_classes(), &opts, &mut NameCollisionCache::new()).unwrap_err();

    match err
    {
        NameGenError::PrettyExhaustion(e) =>
        {
            assert_eq!(e.max_length, 2);
            assert_eq!(e.generated, 4);
            assert!(e.attempted_fallbacks.is_empty());
        }
        other => panic!("expected pretty exhaustion, got {other:?}"),
    }
}

#[test]
fn hybrid_strategy_splits_head_and_tail()
{
    // Error policy on the options must not leak into the hybrid head
    let opts = tiny_pretty(Strategy::Hybrid, ExhaustionPolicy::Error);
    let result = generate(&six_classes(), &opts, &mut NameCollisionCache::new()).expect("generate");

    assert_eq!(result.name_for("c1"), Some("a"));
    assert_eq!(result.name_for("c4"), Some("ba"));
    assert_eq!(result.name_for("c5"), Some("aa"));
    assert_eq!(result.name_for("c6"), Some("bb"));
    assert_eq!(result.metadata.fallback_strategy, None);
    assert_eq!(result.metadata.strategy, Strategy::Hybrid);
}
