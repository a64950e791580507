// Random Forest Classifier
//
// Binary classifier behind the `Classifier` trait:
// - bootstrap sample per tree, trees seeded from the forest seed; a row drawn
//   k times is kept once with k times its class weight, so leaf and split
//   sizes count distinct rows
// - √features candidates per split, falling back to the remaining features
//   when none of the candidates splits
// - weighted Gini with balanced class weights
// - trees fitted in parallel with rayon

use super::TrainingError;
use brandsight_common::config::TrainingConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Class probabilities `[negative, positive]`
pub type Proba = [f64; 2];

/// Fit/predict contract of the scoring engine
pub trait Classifier: Send + Sync + fmt::Debug {
    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), TrainingError>;

    fn predict_proba(&self, row: &[f64]) -> Proba;

    /// Arg-max class; ties go to the negative class
    fn predict(&self, row: &[f64]) -> bool {
        let proba = self.predict_proba(row);
        proba[1] > proba[0]
    }

    fn summary(&self) -> ClassifierSummary;
}

/// Descriptive metadata of a fitted classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierSummary {
    pub model_type: String,
    pub n_estimators: usize,
    pub max_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from(&TrainingConfig::default())
    }
}

impl From<&TrainingConfig> for ForestParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        proba: Proba,
        /// Distinct training rows that reached the leaf
        rows: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict_proba(&self, row: &[f64]) -> Proba {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { proba, .. } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Training data shared by every tree
struct FitData<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [bool],
    class_weight: [f64; 2],
    n_features: usize,
    params: ForestParams,
}

/// Best split found for a node
struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<Tree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), TrainingError> {
        if rows.is_empty() {
            return Err(TrainingError::EmptyCorpus);
        }
        if rows.len() != labels.len() {
            return Err(TrainingError::DimensionMismatch {
                expected: rows.len(),
                found: labels.len(),
            });
        }
        if self.params.n_estimators == 0 || self.params.max_depth == 0 {
            return Err(TrainingError::InvalidParameters(
                "n_estimators and max_depth must be > 0".to_string(),
            ));
        }

        let n_features = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n_features) {
            return Err(TrainingError::DimensionMismatch {
                expected: n_features,
                found: bad.len(),
            });
        }

        let positives = labels.iter().filter(|l| **l).count();
        let negatives = labels.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(TrainingError::SingleClass);
        }

        // Balanced: n_samples / (n_classes * n_class_samples)
        let n = labels.len() as f64;
        let class_weight = [n / (2.0 * negatives as f64), n / (2.0 * positives as f64)];

        let data = FitData {
            rows,
            labels,
            class_weight,
            n_features,
            params: self.params,
        };

        let seed = self.params.seed;
        let trees: Vec<Tree> = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                grow_tree(&data, &mut rng)
            })
            .collect();
        self.trees = trees;

        debug!(
            trees = self.trees.len(),
            nodes = self.trees.iter().map(|t| t.nodes.len()).sum::<usize>(),
            min_samples_leaf = self.params.min_samples_leaf,
            "Random forest fitted"
        );
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Proba {
        if self.trees.is_empty() {
            return [0.5, 0.5];
        }
        let mut total = [0.0, 0.0];
        for tree in &self.trees {
            let proba = tree.predict_proba(row);
            total[0] += proba[0];
            total[1] += proba[1];
        }
        let count = self.trees.len() as f64;
        [total[0] / count, total[1] / count]
    }

    fn summary(&self) -> ClassifierSummary {
        ClassifierSummary {
            model_type: "RandomForestClassifier".to_string(),
            n_estimators: self.params.n_estimators,
            max_depth: self.params.max_depth,
        }
    }
}

fn grow_tree(data: &FitData<'_>, rng: &mut StdRng) -> Tree {
    let n = data.rows.len();
    let mut draws = vec![0u32; n];
    for _ in 0..n {
        draws[rng.gen_range(0..n)] += 1;
    }

    let weights: Vec<f64> = draws
        .iter()
        .zip(data.labels)
        .map(|(&k, &label)| f64::from(k) * data.class_weight[usize::from(label)])
        .collect();
    let in_bag: Vec<usize> = (0..n).filter(|&i| draws[i] > 0).collect();

    let mut tree = Tree { nodes: Vec::new() };
    let grower = Grower {
        data,
        weights: &weights,
    };
    grower.grow(&mut tree, in_bag, 0, rng);
    tree
}

/// Per-tree view: training data plus bootstrap-weighted rows
struct Grower<'a> {
    data: &'a FitData<'a>,
    /// Class weight × bootstrap draws, 0 for out-of-bag rows
    weights: &'a [f64],
}

impl Grower<'_> {
    /// Grow the subtree for `samples` (distinct rows), returning its node index
    fn grow(&self, tree: &mut Tree, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let params = &self.data.params;
        let weights = self.class_totals(&samples);
        let index = tree.nodes.len();
        tree.nodes.push(Node::Leaf {
            proba: normalize(weights),
            rows: samples.len(),
        });

        let pure = weights[0] == 0.0 || weights[1] == 0.0;
        if pure || depth >= params.max_depth || samples.len() < params.min_samples_split {
            return index;
        }

        let parent_impurity = gini(weights) * (weights[0] + weights[1]);
        let Some(best) = self.best_split(&samples, rng) else {
            return index;
        };
        if best.impurity >= parent_impurity - 1e-12 {
            return index;
        }

        let rows = self.data.rows;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| rows[i][best.feature] <= best.threshold);

        let left = self.grow(tree, left, depth + 1, rng);
        let right = self.grow(tree, right, depth + 1, rng);
        tree.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        index
    }

    /// Search √features random candidates, continuing through the remaining
    /// features until at least one candidate produced a valid split
    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<Candidate> {
        let n_features = self.data.n_features;
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<Candidate> = None;
        for (visited, feature) in features.into_iter().enumerate() {
            if visited >= max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_threshold(samples, feature) {
                if best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.impurity)
                {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Lowest weighted child impurity over thresholds of one feature
    ///
    /// Both children must keep `min_samples_leaf` distinct rows.
    fn best_threshold(&self, samples: &[usize], feature: usize) -> Option<Candidate> {
        let mut sorted: Vec<(f64, usize)> = samples
            .iter()
            .map(|&i| (self.data.rows[i][feature], i))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = self.class_totals(samples);
        let min_leaf = self.data.params.min_samples_leaf.max(1);
        let mut left = [0.0, 0.0];
        let mut best: Option<Candidate> = None;

        for split in 1..sorted.len() {
            let (value, i) = sorted[split - 1];
            left[usize::from(self.data.labels[i])] += self.weights[i];

            let next = sorted[split].0;
            if next <= value || split < min_leaf || sorted.len() - split < min_leaf {
                continue;
            }

            let right = [total[0] - left[0], total[1] - left[1]];
            let impurity =
                gini(left) * (left[0] + left[1]) + gini(right) * (right[0] + right[1]);
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Candidate {
                    feature,
                    threshold: value + (next - value) / 2.0,
                    impurity,
                });
            }
        }
        best
    }

    fn class_totals(&self, samples: &[usize]) -> [f64; 2] {
        let mut totals = [0.0, 0.0];
        for &i in samples {
            totals[usize::from(self.data.labels[i])] += self.weights[i];
        }
        totals
    }
}

fn gini(weights: [f64; 2]) -> f64 {
    let total = weights[0] + weights[1];
    if total <= 0.0 {
        return 0.0;
    }
    let p0 = weights[0] / total;
    let p1 = weights[1] / total;
    1.0 - p0 * p0 - p1 * p1
}

fn normalize(weights: [f64; 2]) -> Proba {
    let total = weights[0] + weights[1];
    if total <= 0.0 {
        [0.5, 0.5]
    } else {
        [weights[0] / total, weights[1] / total]
    }
}
