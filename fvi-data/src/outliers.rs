//! Isolation-forest outlier detection over a single numeric column.

use rand::rngs::StdRng;
use rand::{seq::index, Rng, SeedableRng};

/// Euler–Mascheroni constant, used to approximate harmonic numbers.
const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Parameters of the isolation forest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationForestParams {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Expected share of outliers; sets the score threshold
    pub contamination: f64,
    /// Upper bound on the per-tree sub-sample size
    pub max_samples: usize,
    /// RNG seed for reproducible flags
    pub seed: u64,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self {
            n_trees: 150,
            contamination: 0.075,
            max_samples: 256,
            seed: 10,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split {
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One isolation tree stored as an arena of nodes; node 0 is the root.
#[derive(Debug)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(sample: &[f64], max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.build(sample.to_vec(), 0, max_depth, rng);
        tree
    }

    fn build(&mut self, values: Vec<f64>, depth: usize, max_depth: usize, rng: &mut StdRng) -> usize {
        let id = self.nodes.len();
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        // constant nodes cannot be split
        if depth >= max_depth || values.len() <= 1 || min >= max {
            self.nodes.push(Node::Leaf { size: values.len() });
            return id;
        }
        let threshold = rng.gen_range(min..max);
        self.nodes.push(Node::Leaf { size: 0 });
        let (left_values, right_values): (Vec<f64>, Vec<f64>) =
            values.into_iter().partition(|&v| v <= threshold);
        let left = self.build(left_values, depth + 1, max_depth, rng);
        let right = self.build(right_values, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            threshold,
            left,
            right,
        };
        id
    }

    /// Depth of the leaf reached by `x` plus the expected remaining depth.
    fn path_length(&self, x: f64) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Split {
                    threshold,
                    left,
                    right,
                } => {
                    node = if x <= threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }
}

/// Average path length of an unsuccessful BST search among `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Anomaly score in (0, 1] per value; higher is more anomalous.
pub fn anomaly_scores(values: &[f64], params: &IsolationForestParams) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let sub_sample = params.max_samples.min(n).max(1);
    let max_depth = (sub_sample as f64).log2().ceil() as usize;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let trees: Vec<IsolationTree> = (0..params.n_trees)
        .map(|_| {
            let sample: Vec<f64> = index::sample(&mut rng, n, sub_sample)
                .into_iter()
                .map(|i| values[i])
                .collect();
            IsolationTree::grow(&sample, max_depth, &mut rng)
        })
        .collect();

    let normaliser = average_path_length(sub_sample);
    values
        .iter()
        .map(|&x| {
            let mean_depth =
                trees.iter().map(|t| t.path_length(x)).sum::<f64>() / trees.len().max(1) as f64;
            if normaliser == 0.0 {
                0.5
            } else {
                2f64.powf(-mean_depth / normaliser)
            }
        })
        .collect()
}

/// Linear-interpolated percentile (0–100) of `values`.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Flag values whose score is more anomalous than the contamination cut.
pub fn detect_outliers(values: &[f64], params: &IsolationForestParams) -> Vec<bool> {
    let negated: Vec<f64> = anomaly_scores(values, params).iter().map(|s| -s).collect();
    if negated.is_empty() {
        return Vec::new();
    }
    let offset = percentile(&negated, params.contamination * 100.0);
    let flags: Vec<bool> = negated.iter().map(|&s| s < offset).collect();
    log::debug!(
        "isolation forest flagged {} of {} value(s)",
        flags.iter().filter(|&&f| f).count(),
        values.len()
    );
    flags
}
