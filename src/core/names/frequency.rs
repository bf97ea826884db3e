//! Assignment order: which classes get identifiers, and in what sequence.
//!
//! Frequency-optimized assignment is sequential counting over a
//! frequency-descending list, so the densest tier of classes receives the
//! shortest identifiers.

use crate::core::aggregate::{AggregatedClassData, PatternFrequencyMap};
use crate::core::analyze::{SortOrder, sort};
use crate::core::names::options::{GenerationOptions, Strategy};

/// Sort order a strategy assigns in
pub fn assignment_sort_order(strategy: Strategy) -> SortOrder
{
    match strategy
    {
        Strategy::Sequential => SortOrder::Alphabetical,
        Strategy::FrequencyOptimized | Strategy::Pretty | Strategy::Hybrid => SortOrder::FrequencyDesc,
    }
}

/// Classes at or above the frequency threshold, in assignment order
pub fn assignment_order<'m>(
    map: &'m PatternFrequencyMap,
    options: &GenerationOptions,
) -> Vec<&'m AggregatedClassData>
{
    sort(map, assignment_sort_order(options.strategy))
        .into_iter()
        .filter(|d| d.total_frequency >= options.frequency_threshold)
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::aggregate::SourceType;

    fn class(
        name: &str,
        freq: u64,
    ) -> AggregatedClassData
    {
        let mut d = AggregatedClassData::new(name, SourceType::Mixed);
        d.total_frequency = freq;
        d
    }

    #[test]
    fn threshold_filters_and_order_follows_strategy()
    {
        let map: PatternFrequencyMap = [class("zeta", 10), class("alpha", 1), class("mid", 5)]
            .into_iter()
            .collect();

        let freq = GenerationOptions::default().with_threshold(2);
        let names: Vec<&str> = assignment_order(&map, &freq)
            .iter()
            .map(|d| d.class_name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "mid"]);

        let seq = GenerationOptions::default().with_strategy(Strategy::Sequential);
        let names: Vec<&str> = assignment_order(&map, &seq)
            .iter()
            .map(|d| d.class_name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
