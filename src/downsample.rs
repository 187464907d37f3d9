//! Coverage capping at a locus via reservoir selection.
//!
//! Downsampling only thins pileups; discarded reads stay in the active set,
//! keep contributing at later loci, and are still retained once consumed.

use log::debug;
use rand::Rng;

use crate::error::PileupError;
use crate::pileup::AlignmentContext;

/// How (and whether) to cap the number of reads contributing at a locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownsamplingMethod {
    /// Keep everything.
    None,
    /// Cap the total across all samples.
    ByCoverage(usize),
    /// Cap each sample independently.
    BySample(usize),
}

impl DownsamplingMethod {
    pub fn validate(&self) -> Result<(), PileupError> {
        match self {
            DownsamplingMethod::ByCoverage(0) | DownsamplingMethod::BySample(0) => Err(
                PileupError::Config("downsampling cap must be positive".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Thin `context` in place to respect the cap. Survivors keep their
    /// original order. Returns the number of elements removed.
    pub fn apply<R: Rng>(&self, context: &mut AlignmentContext, rng: &mut R) -> usize {
        let locus = context.locus;
        match *self {
            DownsamplingMethod::None => 0,
            DownsamplingMethod::BySample(cap) => {
                let mut removed = 0;
                for (sample, elements) in context.samples_mut().iter_mut() {
                    let n = elements.len();
                    if n > cap {
                        debug!("downsampling sample '{sample}' at {locus}: keeping {cap} of {n}");
                        let keep = reservoir_indices(n, cap, rng);
                        retain_indices(elements, &keep);
                        removed += n - cap;
                    }
                }
                removed
            }
            DownsamplingMethod::ByCoverage(cap) => {
                let total = context.depth();
                if total <= cap {
                    return 0;
                }
                debug!("downsampling coverage at {locus}: keeping {cap} of {total}");
                // Select over the flattened (sample, element) index space so
                // the cap applies in aggregate, then regroup per sample.
                let keep = reservoir_indices(total, cap, rng);
                let mut next_keep = keep.iter().copied().peekable();
                let mut flat = 0usize;
                for (_, elements) in context.samples_mut().iter_mut() {
                    let mut local_keep = Vec::new();
                    for i in 0..elements.len() {
                        if next_keep.peek() == Some(&flat) {
                            local_keep.push(i);
                            next_keep.next();
                        }
                        flat += 1;
                    }
                    retain_indices(elements, &local_keep);
                }
                total - cap
            }
        }
    }
}

/// Choose exactly `cap` of `n` indices uniformly at random, returned sorted so
/// the kept elements preserve their input order.
fn reservoir_indices<R: Rng>(n: usize, cap: usize, rng: &mut R) -> Vec<usize> {
    debug_assert!(cap > 0);
    if n <= cap {
        return (0..n).collect();
    }
    let mut reservoir: Vec<usize> = (0..cap).collect();
    for i in cap..n {
        let j = rng.gen_range(0..=i);
        if j < cap {
            reservoir[j] = i;
        }
    }
    reservoir.sort_unstable();
    reservoir
}

fn retain_indices<T>(items: &mut Vec<T>, sorted_keep: &[usize]) {
    let mut keep_iter = sorted_keep.iter().copied().peekable();
    let mut idx = 0;
    items.retain(|_| {
        let keep = keep_iter.peek() == Some(&idx);
        if keep {
            keep_iter.next();
        }
        idx += 1;
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_validate_rejects_zero_cap() {
        assert!(DownsamplingMethod::ByCoverage(0).validate().is_err());
        assert!(DownsamplingMethod::BySample(0).validate().is_err());
        assert!(DownsamplingMethod::None.validate().is_ok());
        assert!(DownsamplingMethod::BySample(1).validate().is_ok());
    }

    #[test]
    fn test_reservoir_identity_under_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(reservoir_indices(3, 5, &mut rng), vec![0, 1, 2]);
        assert_eq!(reservoir_indices(5, 5, &mut rng), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reservoir_exact_size_and_order() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in [10usize, 100, 1000] {
            for cap in [1usize, 3, 9] {
                let keep = reservoir_indices(n, cap, &mut rng);
                assert_eq!(keep.len(), cap);
                assert!(keep.windows(2).all(|w| w[0] < w[1]), "sorted, unique");
                assert!(keep.iter().all(|&i| i < n));
            }
        }
    }

    #[test]
    fn test_reservoir_deterministic_for_seed() {
        let a = reservoir_indices(100, 10, &mut StdRng::seed_from_u64(7));
        let b = reservoir_indices(100, 10, &mut StdRng::seed_from_u64(7));
        let c = reservoir_indices(100, 10, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c, "different seeds should (almost surely) differ");
    }

    #[test]
    fn test_reservoir_covers_tail() {
        // Every index must be reachable, including ones past the initial fill
        let mut seen_tail = false;
        for seed in 0..50 {
            let keep = reservoir_indices(20, 3, &mut StdRng::seed_from_u64(seed));
            if keep.iter().any(|&i| i >= 10) {
                seen_tail = true;
                break;
            }
        }
        assert!(seen_tail);
    }

    #[test]
    fn test_retain_indices() {
        let mut v = vec!["a", "b", "c", "d", "e"];
        retain_indices(&mut v, &[0, 2, 4]);
        assert_eq!(v, vec!["a", "c", "e"]);
    }
}
