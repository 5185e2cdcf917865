use keyloc_core::{hamming_distance, Descriptor, Match};
use rayon::prelude::*;

use crate::config::MatcherConfig;
use crate::error::FeatureResult;

/// Brute-force Hamming matcher with ratio test and optional cross-check
#[derive(Debug, Clone)]
pub struct HammingMatcher {
    cfg: MatcherConfig,
}

impl HammingMatcher {
    pub fn new(cfg: MatcherConfig) -> FeatureResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    /// Match every query descriptor against `train`, in query order
    pub fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        query
            .par_iter()
            .enumerate()
            .filter_map(|(query_idx, q)| {
                let (train_idx, distance, second) = two_nearest(q, train)?;

                if let Some(ratio) = self.cfg.ratio {
                    if let Some(second) = second {
                        if distance as f32 >= ratio * second as f32 {
                            return None;
                        }
                    }
                }
                if let Some(max) = self.cfg.max_distance {
                    if distance > max {
                        return None;
                    }
                }
                if self.cfg.cross_check {
                    let (reverse_idx, _, _) = two_nearest(&train[train_idx], query)?;
                    if reverse_idx != query_idx {
                        return None;
                    }
                }

                Some(Match { query_idx, train_idx, distance })
            })
            .collect()
    }
}

impl Default for HammingMatcher {
    fn default() -> Self {
        Self { cfg: MatcherConfig::default() }
    }
}

/// Index and distance of the nearest descriptor, plus the runner-up distance.
/// Ties keep the lowest index.
fn two_nearest(q: &Descriptor, train: &[Descriptor]) -> Option<(usize, u32, Option<u32>)> {
    let mut best: Option<(usize, u32)> = None;
    let mut second: Option<u32> = None;

    for (idx, t) in train.iter().enumerate() {
        let distance = hamming_distance(q, t);
        match best {
            None => best = Some((idx, distance)),
            Some((_, best_dist)) if distance < best_dist => {
                second = Some(best_dist);
                best = Some((idx, distance));
            }
            Some(_) => {
                if second.map_or(true, |s| distance < s) {
                    second = Some(distance);
                }
            }
        }
    }

    best.map(|(idx, distance)| (idx, distance, second))
}
