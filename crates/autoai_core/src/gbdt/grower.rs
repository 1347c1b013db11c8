//! Histogram-based tree construction
//!
//! One [`TreeGrower`] builds one tree for one output from binned features and
//! per-row gradients/hessians. The three growth policies share the split
//! search and differ only in which node is split next.

use std::ops::{AddAssign, Sub};

use super::binning::{BinMapper, BinnedMatrix};
use super::params::{BoostParams, GrowthPolicy};
use super::tree::{Node, Tree};
use crate::deterministic::SplitTieBreaker;

/// Gradient statistics of a set of rows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BinStats {
    grad: f64,
    hess: f64,
    count: usize,
}

impl AddAssign for BinStats {
    fn add_assign(&mut self, other: Self) {
        self.grad += other.grad;
        self.hess += other.hess;
        self.count += other.count;
    }
}

impl Sub for BinStats {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
            count: self.count - other.count,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    bin: u16,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, bin: u16, threshold: f64, gain: f64, node_id: usize) -> Self {
        Self {
            feature_idx,
            bin,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, bin as usize, node_id),
        }
    }

    fn beats(&self, current: &Option<SplitCandidate>) -> bool {
        match current {
            None => true,
            Some(current) => {
                self.gain > current.gain
                    || (self.gain == current.gain && self.tie_breaker < current.tie_breaker)
            }
        }
    }
}

/// A leaf of a leaf-wise tree that may still be split
struct OpenLeaf {
    node: usize,
    rows: Vec<usize>,
    depth: usize,
    totals: BinStats,
    split: Option<SplitCandidate>,
}

/// Per-feature histograms, indexed by feature then bin
type Histogram = Vec<Vec<BinStats>>;

pub(crate) struct TreeGrower<'a> {
    binned: &'a BinnedMatrix,
    mapper: &'a BinMapper,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: &'a BoostParams,
}

impl<'a> TreeGrower<'a> {
    pub(crate) fn new(
        binned: &'a BinnedMatrix,
        mapper: &'a BinMapper,
        grad: &'a [f64],
        hess: &'a [f64],
        features: &'a [usize],
        params: &'a BoostParams,
    ) -> Self {
        Self {
            binned,
            mapper,
            grad,
            hess,
            features,
            params,
        }
    }

    /// Grow a tree over the given training rows
    pub(crate) fn grow(&self, rows: &[usize]) -> Tree {
        match self.params.growth {
            GrowthPolicy::DepthWise => {
                let mut nodes = Vec::new();
                self.build_node(rows, 0, &mut nodes, 0);
                Tree::new(nodes)
            }
            GrowthPolicy::LeafWise => self.grow_leaf_wise(rows),
            GrowthPolicy::Oblivious => self.grow_oblivious(rows),
        }
    }

    /// Recursively build depth-wise tree nodes
    fn build_node(&self, rows: &[usize], depth: usize, nodes: &mut Vec<Node>, node_id: usize) -> i32 {
        let current = nodes.len();
        let totals = self.totals(rows);

        let split = if self.can_split(rows.len(), depth) {
            self.find_best_split(rows, &totals, node_id)
        } else {
            None
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current as i32, self.leaf_value(&totals)));
            return current as i32;
        };

        let (left_rows, right_rows) = self.partition(rows, &split);

        // Reserve the slot, children are filled in once built
        nodes.push(Node::internal(
            current as i32,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left = self.build_node(
            &left_rows,
            depth + 1,
            nodes,
            node_id.saturating_mul(2).saturating_add(1),
        );
        let right = self.build_node(
            &right_rows,
            depth + 1,
            nodes,
            node_id.saturating_mul(2).saturating_add(2),
        );

        nodes[current].left = left;
        nodes[current].right = right;
        current as i32
    }

    fn grow_leaf_wise(&self, rows: &[usize]) -> Tree {
        let max_leaves = self.params.max_leaves.unwrap_or(usize::MAX);
        let mut nodes = vec![Node::leaf(0, 0.0)];
        let mut open = vec![self.open_leaf(0, rows.to_vec(), 0)];
        let mut n_leaves = 1usize;

        while n_leaves < max_leaves {
            let best = open
                .iter()
                .enumerate()
                .filter_map(|(i, leaf)| leaf.split.as_ref().map(|split| (i, split)))
                .max_by(|a, b| {
                    a.1.gain
                        .total_cmp(&b.1.gain)
                        .then_with(|| b.1.tie_breaker.cmp(&a.1.tie_breaker))
                })
                .map(|(i, _)| i);
            let Some(best) = best else {
                break;
            };

            let leaf = open.swap_remove(best);
            let Some(split) = leaf.split else {
                break;
            };
            let (left_rows, right_rows) = self.partition(&leaf.rows, &split);

            let left = nodes.len();
            let right = left + 1;
            nodes[leaf.node] = Node::internal(
                leaf.node as i32,
                split.feature_idx as i32,
                split.threshold,
                left as i32,
                right as i32,
            );
            nodes.push(Node::leaf(left as i32, 0.0));
            nodes.push(Node::leaf(right as i32, 0.0));

            open.push(self.open_leaf(left, left_rows, leaf.depth + 1));
            open.push(self.open_leaf(right, right_rows, leaf.depth + 1));
            n_leaves += 1;
        }

        for leaf in open {
            nodes[leaf.node] = Node::leaf(leaf.node as i32, self.leaf_value(&leaf.totals));
        }
        Tree::new(nodes)
    }

    fn open_leaf(&self, node: usize, rows: Vec<usize>, depth: usize) -> OpenLeaf {
        let totals = self.totals(&rows);
        let split = if self.can_split(rows.len(), depth) {
            self.find_best_split(&rows, &totals, node)
        } else {
            None
        };
        OpenLeaf {
            node,
            rows,
            depth,
            totals,
            split,
        }
    }

    fn grow_oblivious(&self, rows: &[usize]) -> Tree {
        let max_depth = self.params.max_depth.unwrap_or(6);
        let mut groups: Vec<Vec<usize>> = vec![rows.to_vec()];
        let mut levels: Vec<SplitCandidate> = Vec::new();

        for level in 0..max_depth {
            let stats: Vec<(BinStats, Histogram)> = groups
                .iter()
                .map(|group| (self.totals(group), self.build_histogram(group)))
                .collect();

            let mut best: Option<SplitCandidate> = None;
            for &feature in self.features {
                let thresholds = self.mapper.thresholds(feature);
                let mut lefts = vec![BinStats::default(); stats.len()];

                for (bin, &threshold) in thresholds.iter().enumerate() {
                    let mut total_gain = 0.0;
                    let mut admissible = false;

                    for ((totals, hist), left) in stats.iter().zip(lefts.iter_mut()) {
                        *left += hist[feature][bin];
                        let right = *totals - *left;
                        // Groups too small to split still follow the shared split
                        if self.admissible(left, &right) {
                            total_gain += self.raw_gain(left, &right, totals);
                            admissible = true;
                        }
                    }

                    let gain = total_gain - self.params.min_split_gain;
                    if !admissible || gain <= 0.0 {
                        continue;
                    }

                    let candidate = SplitCandidate::new(feature, bin as u16, threshold, gain, level);
                    if candidate.beats(&best) {
                        best = Some(candidate);
                    }
                }
            }

            let Some(split) = best else {
                break;
            };
            groups = groups
                .iter()
                .flat_map(|group| {
                    let (left, right) = self.partition(group, &split);
                    [left, right]
                })
                .collect();
            levels.push(split);
        }

        let values: Vec<f64> = groups
            .iter()
            .map(|group| self.leaf_value(&self.totals(group)))
            .collect();
        let mut nodes = Vec::with_capacity(2 * values.len() - 1);
        build_symmetric(&levels, 0, 0, &values, &mut nodes);
        Tree::new(nodes)
    }

    fn can_split(&self, n_rows: usize, depth: usize) -> bool {
        self.params.max_depth.map_or(true, |max| depth < max)
            && n_rows >= 2 * self.params.min_samples_leaf.max(1)
    }

    fn totals(&self, rows: &[usize]) -> BinStats {
        let mut stats = BinStats::default();
        for &row in rows {
            stats += BinStats {
                grad: self.grad[row],
                hess: self.hess[row],
                count: 1,
            };
        }
        stats
    }

    fn build_histogram(&self, rows: &[usize]) -> Histogram {
        let mut hist: Histogram = vec![Vec::new(); self.mapper.n_features()];
        for &feature in self.features {
            let mut bins = vec![BinStats::default(); self.mapper.n_bins(feature)];
            let column = self.binned.column(feature);
            for &row in rows {
                bins[column[row] as usize] += BinStats {
                    grad: self.grad[row],
                    hess: self.hess[row],
                    count: 1,
                };
            }
            hist[feature] = bins;
        }
        hist
    }

    fn find_best_split(&self, rows: &[usize], totals: &BinStats, node_id: usize) -> Option<SplitCandidate> {
        let hist = self.build_histogram(rows);
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.features {
            let mut left = BinStats::default();
            // The last bin has no threshold above it
            for (bin, &threshold) in self.mapper.thresholds(feature).iter().enumerate() {
                left += hist[feature][bin];
                let right = *totals - left;
                if !self.admissible(&left, &right) {
                    continue;
                }

                let gain = self.raw_gain(&left, &right, totals) - self.params.min_split_gain;
                if gain <= 0.0 {
                    continue;
                }

                let candidate = SplitCandidate::new(feature, bin as u16, threshold, gain, node_id);
                if candidate.beats(&best) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn admissible(&self, left: &BinStats, right: &BinStats) -> bool {
        let min_count = self.params.min_samples_leaf.max(1);
        left.count >= min_count
            && right.count >= min_count
            && left.hess >= self.params.min_child_weight
            && right.hess >= self.params.min_child_weight
    }

    /// ½ [G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ)]
    fn raw_gain(&self, left: &BinStats, right: &BinStats, parent: &BinStats) -> f64 {
        0.5 * (self.structure_score(left) + self.structure_score(right)
            - self.structure_score(parent))
    }

    fn structure_score(&self, stats: &BinStats) -> f64 {
        let denom = stats.hess + self.params.reg_lambda;
        if denom <= 0.0 {
            0.0
        } else {
            stats.grad * stats.grad / denom
        }
    }

    /// Shrunk optimal leaf weight: −G/(H+λ) · η
    fn leaf_value(&self, stats: &BinStats) -> f64 {
        let denom = stats.hess + self.params.reg_lambda;
        if denom <= 0.0 {
            return 0.0;
        }
        -stats.grad / denom * self.params.learning_rate
    }

    fn partition(&self, rows: &[usize], split: &SplitCandidate) -> (Vec<usize>, Vec<usize>) {
        let column = self.binned.column(split.feature_idx);
        rows.iter().copied().partition(|&row| column[row] <= split.bin)
    }
}

/// Lay out a symmetric tree whose level `l` uses `levels[l]`.
///
/// Leaf values are indexed by the left/right path read as binary digits,
/// first level most significant.
fn build_symmetric(
    levels: &[SplitCandidate],
    level: usize,
    offset: usize,
    values: &[f64],
    nodes: &mut Vec<Node>,
) -> i32 {
    let current = nodes.len();
    let Some(split) = levels.get(level) else {
        nodes.push(Node::leaf(current as i32, values[offset]));
        return current as i32;
    };

    nodes.push(Node::internal(
        current as i32,
        split.feature_idx as i32,
        split.threshold,
        -1,
        -1,
    ));
    let span = 1usize << (levels.len() - level - 1);
    let left = build_symmetric(levels, level + 1, offset, values, nodes);
    let right = build_symmetric(levels, level + 1, offset + span, values, nodes);
    nodes[current].left = left;
    nodes[current].right = right;
    current as i32
}
