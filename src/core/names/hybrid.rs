//! Hybrid assignment: pretty names for the hottest classes, sequential
//! counting for the rest.

use tracing::debug;

use crate::core::collision::NameCollisionCache;
use crate::core::error::NameGenError;
use crate::core::names::options::{ExhaustionPolicy, GenerationOptions};
use crate::core::names::pretty::{PrettyAssigner, PrettyPool};
use crate::core::names::sequential::{NameLayout, SequentialSource, acquire};

/// Number of classes that can take pretty names without exhausting the
/// pool, given identifiers already claimed by the cache
pub fn pretty_head_size(
    pool_len: usize,
    already_used: usize,
    class_count: usize,
) -> usize
{
    pool_len
        .saturating_sub(already_used)
        .min(class_count)
}

pub(crate) struct HybridAssigner<'a>
{
    head: usize,
    assigned: usize,
    pretty: PrettyAssigner<'a>,
    tail: SequentialSource<'a>,
}

impl<'a> HybridAssigner<'a>
{
    pub(crate) fn new(
        pool: &'a PrettyPool,
        layout: &'a NameLayout,
        options: &GenerationOptions,
        head: usize,
    ) -> Self
    {
        debug!(head, pool = pool.len(), "hybrid split");
        Self {
            head,
            assigned: 0,
            // A pool that runs dry inside the head spills into counting
            pretty: PrettyAssigner::new(pool, layout, &options.pretty).with_policy(ExhaustionPolicy::Sequential),
            tail: SequentialSource::new(layout),
        }
    }

    pub(crate) fn assign(
        &mut self,
        class: &str,
        cache: &mut NameCollisionCache,
        options: &GenerationOptions,
        alphabet_len: usize,
    ) -> Result<String, NameGenError>
    {
        let name = if self.assigned < self.head
        {
            self.pretty
                .assign(class, cache, options, alphabet_len)?
        }
        else
        {
            acquire(&mut self.tail, cache, options, alphabet_len, Some(class))?
                .ok_or_else(|| NameGenError::generation("sequential source ended unexpectedly"))?
        };

        self.assigned += 1;
        Ok(name)
    }

    /// Pretty names accepted in the head
    pub(crate) fn pretty_count(&self) -> usize
    {
        self.pretty
            .generated()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn head_shrinks_by_claimed_names()
    {
        assert_eq!(pretty_head_size(16_276, 0, 40), 40);
        assert_eq!(pretty_head_size(10, 4, 40), 6);
        assert_eq!(pretty_head_size(3, 5, 40), 0);
    }
}
