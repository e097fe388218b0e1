//! Candidate sampling

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::cluster::ClusterApi;
use crate::error::{Error, Result};
use crate::selector::{Selector, UnitRef};

/// Lists the pods behind a selector and draws a random subset of them
pub struct CandidateSampler {
    cluster: Arc<dyn ClusterApi>,
}

impl CandidateSampler {
    /// Create a sampler over the given cluster
    pub fn new(cluster: Arc<dyn ClusterApi>) -> Self {
        Self { cluster }
    }

    /// Draw `min(count, candidates)` pods uniformly at random, without replacement.
    ///
    /// `count` must be at least 1. The order of the returned pods is fixed for a
    /// given `rng` state.
    pub async fn sample<R: Rng + ?Sized>(
        &self,
        namespace: &str,
        selector: &Selector,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<UnitRef>> {
        debug_assert!(count >= 1, "sample count must be validated by the caller");

        let candidates = self
            .cluster
            .list_units(namespace, selector)
            .await
            .map_err(|e| Error::transport("list pods", e.to_string()))?;

        if candidates.is_empty() {
            return Err(Error::NoCandidates {
                namespace: namespace.to_string(),
                selector: selector.to_string(),
            });
        }

        Ok(draw(&candidates, count, rng))
    }
}

fn draw<R: Rng + ?Sized>(candidates: &[UnitRef], count: usize, rng: &mut R) -> Vec<UnitRef> {
    let amount = count.min(candidates.len());
    let drawn: Vec<UnitRef> = candidates.choose_multiple(rng, amount).cloned().collect();
    debug!(candidates = candidates.len(), requested = count, drawn = drawn.len(), "sampled pods");
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterError, MockClusterApi};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn pods(n: usize) -> Vec<UnitRef> {
        (0..n)
            .map(|i| UnitRef::new("prod", format!("checkout-{}", i)))
            .collect()
    }

    fn sampler_with(units: Vec<UnitRef>) -> CandidateSampler {
        let mut mock = MockClusterApi::new();
        mock.expect_list_units()
            .returning(move |_, _| Ok(units.clone()));
        CandidateSampler::new(Arc::new(mock))
    }

    fn selector() -> Selector {
        Selector::default().with_label("app", "checkout")
    }

    #[test]
    fn draw_never_repeats_and_is_bounded_by_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        for pool in 1..8 {
            let candidates = pods(pool);
            for requested in 1..10 {
                let drawn = draw(&candidates, requested, &mut rng);
                assert_eq!(drawn.len(), requested.min(pool));

                let unique: BTreeSet<_> = drawn.iter().collect();
                assert_eq!(unique.len(), drawn.len(), "duplicate in {:?}", drawn);
                assert!(drawn.iter().all(|u| candidates.contains(u)));
            }
        }
    }

    #[test]
    fn draw_is_reproducible_for_a_seed() {
        let candidates = pods(20);
        let a = draw(&candidates, 5, &mut StdRng::seed_from_u64(42));
        let b = draw(&candidates, 5, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn draw_covers_the_whole_pool_over_many_seeds() {
        let candidates = pods(4);
        let mut seen = BTreeSet::new();
        for seed in 0..64 {
            seen.extend(draw(&candidates, 1, &mut StdRng::seed_from_u64(seed)));
        }
        assert_eq!(seen.len(), 4);
    }

    #[tokio::test]
    async fn requesting_more_than_exist_returns_all() {
        let sampler = sampler_with(pods(2));
        let drawn = sampler
            .sample("prod", &selector(), 5, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
        assert_eq!(drawn.len(), 2);
    }

    #[tokio::test]
    async fn empty_pool_is_no_candidates() {
        let sampler = sampler_with(vec![]);
        let err = sampler
            .sample("prod", &selector(), 1, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCandidates { ref selector, .. } if selector == "app=checkout"));
    }

    #[tokio::test]
    async fn listing_failure_is_a_transport_error() {
        let mut mock = MockClusterApi::new();
        mock.expect_list_units()
            .returning(|_, _| Err(ClusterError::transport("connection refused")));
        let sampler = CandidateSampler::new(Arc::new(mock));

        let err = sampler
            .sample("prod", &selector(), 1, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { ref operation, .. } if operation == "list pods"));
    }
}
