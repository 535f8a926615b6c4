//! Random-forest regressor
//!
//! An ensemble of variance-minimizing decision trees, each fit on a
//! bootstrap sample drawn with a seeded generator so identical data always
//! yields an identical model. Trees store their nodes in a flat arena with
//! children preceding parents, which keeps serialized artifacts free of
//! deep recursion and makes scoring a bounded walk.

use serde::{Deserialize, Serialize};

use crate::features::{FEATURE_COUNT, FEATURE_NAMES};

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// Unlimited when `None`; nodes stop splitting once pure or too small.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// Deterministic linear congruential generator for bootstrap sampling and
/// shuffling. Not suitable for anything security related.
#[derive(Debug)]
pub(crate) struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(12345),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        self.state
    }

    /// Uniform index in `[0, bound)`. `bound` must be nonzero.
    pub(crate) fn index(&mut self, bound: usize) -> usize {
        ((self.next_u64() >> 33) as usize) % bound
    }

    /// Fisher-Yates shuffle.
    pub(crate) fn shuffle(&mut self, slice: &mut [usize]) {
        for i in (1..slice.len()).rev() {
            let j = self.index(i + 1);
            slice.swap(i, j);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    /// Children precede their parent; the root is the last node.
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn grow(
        config: &ForestConfig,
        rows: &[[f64; FEATURE_COUNT]],
        targets: &[f64],
        sample: &[usize],
    ) -> Self {
        let mut nodes = Vec::new();
        grow_node(config, rows, targets, sample, 0, &mut nodes);
        Self { nodes }
    }

    fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut position = self.nodes.len().saturating_sub(1);
        loop {
            match self.nodes.get(position) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = match features.get(*feature) {
                        Some(v) => *v,
                        None => return 0.0,
                    };
                    let next = if value <= *threshold { *left } else { *right };
                    if next >= position {
                        return 0.0;
                    }
                    position = next;
                }
                None => return 0.0,
            }
        }
    }

    fn is_consistent(&self, feature_count: usize) -> bool {
        !self.nodes.is_empty()
            && self
                .nodes
                .iter()
                .enumerate()
                .all(|(position, node)| match node {
                    TreeNode::Leaf { .. } => true,
                    TreeNode::Split {
                        feature,
                        left,
                        right,
                        ..
                    } => *feature < feature_count && *left < position && *right < position,
                })
    }
}

/// Trained ensemble. Serialized artifacts carry the feature-name list so a
/// model built under a different column layout can be recognized and
/// refused at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit an ensemble on the given rows. An empty dataset yields an empty
    /// forest that predicts 0 and fails [`Self::is_consistent`].
    pub fn fit(config: &ForestConfig, rows: &[[f64; FEATURE_COUNT]], targets: &[f64]) -> Self {
        let feature_names = FEATURE_NAMES.iter().map(|name| name.to_string()).collect();
        if rows.is_empty() || rows.len() != targets.len() {
            return Self {
                feature_names,
                trees: Vec::new(),
            };
        }

        let mut rng = SeededRng::new(config.seed);
        let trees = (0..config.n_trees)
            .map(|_| {
                let sample: Vec<usize> =
                    (0..rows.len()).map(|_| rng.index(rows.len())).collect();
                DecisionTree::grow(config, rows, targets, &sample)
            })
            .collect();

        Self {
            feature_names,
            trees,
        }
    }

    /// Mean prediction over all trees.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        total / self.trees.len() as f64
    }

    /// Feature columns this model was trained with, in order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// True when every tree is non-empty and all node references stay in
    /// bounds. Deserialized artifacts must pass this before being scored.
    pub fn is_consistent(&self) -> bool {
        !self.trees.is_empty()
            && self
                .trees
                .iter()
                .all(|tree| tree.is_consistent(self.feature_names.len()))
    }
}

fn grow_node(
    config: &ForestConfig,
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    indices: &[usize],
    depth: usize,
    nodes: &mut Vec<TreeNode>,
) -> usize {
    let value = mean(targets, indices);
    let depth_capped = config.max_depth.map_or(false, |max| depth >= max);

    if indices.len() < config.min_samples_split || depth_capped || is_pure(targets, indices) {
        nodes.push(TreeNode::Leaf { value });
        return nodes.len() - 1;
    }

    let Some(split) = best_split(rows, targets, indices) else {
        nodes.push(TreeNode::Leaf { value });
        return nodes.len() - 1;
    };

    let left = grow_node(config, rows, targets, &split.left, depth + 1, nodes);
    let right = grow_node(config, rows, targets, &split.right, depth + 1, nodes);
    nodes.push(TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    });
    nodes.len() - 1
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Exhaustive search for the split minimizing the summed squared error of
/// the two sides. Candidate thresholds are midpoints between consecutive
/// distinct values of each feature.
fn best_split(
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    indices: &[usize],
) -> Option<SplitCandidate> {
    let mut best: Option<(f64, usize, f64)> = None;

    for feature in 0..FEATURE_COUNT {
        let mut ordered: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (rows[i][feature], targets[i]))
            .collect();
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f64 = ordered.iter().map(|(_, target)| target).sum();
        let total_sumsq: f64 = ordered.iter().map(|(_, target)| target * target).sum();
        let mut sum_left = 0.0;
        let mut sumsq_left = 0.0;

        for split_at in 1..ordered.len() {
            let (value, target) = ordered[split_at - 1];
            sum_left += target;
            sumsq_left += target * target;

            let next_value = ordered[split_at].0;
            if next_value <= value {
                continue;
            }

            let n_left = split_at as f64;
            let n_right = (ordered.len() - split_at) as f64;
            let sum_right = total_sum - sum_left;
            let sumsq_right = total_sumsq - sumsq_left;
            let sse = (sumsq_left - sum_left * sum_left / n_left)
                + (sumsq_right - sum_right * sum_right / n_right);

            if best.map_or(true, |(best_sse, _, _)| sse < best_sse) {
                best = Some((sse, feature, (value + next_value) / 2.0));
            }
        }
    }

    let (_, feature, threshold) = best?;
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| rows[i][feature] <= threshold);

    Some(SplitCandidate {
        feature,
        threshold,
        left,
        right,
    })
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();
    total / indices.len() as f64
}

fn is_pure(targets: &[f64], indices: &[usize]) -> bool {
    let Some(&first) = indices.first() else {
        return true;
    };
    indices.iter().all(|&i| targets[i] == targets[first])
}
