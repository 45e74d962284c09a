//! Hand-rolled value network: shared ReLU trunk with one head per train.
//!
//! Maps the dense state vector to one scalar per (train, action-kind)
//! pair. Forward, backward, and the SGD step are explicit; the network is
//! small enough (two hidden layers plus linear heads) that tensor crates
//! would be ballast.

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

/// Fully-connected layer, row-major weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Linear {
    weights: Vec<f64>,
    biases: Vec<f64>,
    in_dim: usize,
    out_dim: usize,
}

impl Linear {
    fn new(rng: &mut StdRng, in_dim: usize, out_dim: usize) -> Self {
        // Uniform ±1/√fan_in initialisation.
        let bound = 1.0 / (in_dim as f64).sqrt();
        let weights = (0..in_dim * out_dim)
            .map(|_| rng.random_range(-bound..bound))
            .collect();
        let biases = vec![0.0; out_dim];
        Self {
            weights,
            biases,
            in_dim,
            out_dim,
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out = self.biases.clone();
        for (row, out_value) in out.iter_mut().enumerate() {
            let weights = &self.weights[row * self.in_dim..(row + 1) * self.in_dim];
            *out_value += weights.iter().zip(input).map(|(w, x)| w * x).sum::<f64>();
        }
        out
    }

    fn zero_grad(&self) -> LinearGrad {
        LinearGrad {
            weights: vec![0.0; self.weights.len()],
            biases: vec![0.0; self.biases.len()],
        }
    }

    fn apply(&mut self, grad: &LinearGrad, learning_rate: f64) {
        for (w, g) in self.weights.iter_mut().zip(&grad.weights) {
            *w -= learning_rate * g;
        }
        for (b, g) in self.biases.iter_mut().zip(&grad.biases) {
            *b -= learning_rate * g;
        }
    }
}

struct LinearGrad {
    weights: Vec<f64>,
    biases: Vec<f64>,
}

fn relu(values: &mut [f64]) {
    for v in values {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}

/// One training sample: state, chosen kind per train, scalar target.
pub(crate) struct TrainSample<'a> {
    pub state: &'a [f64],
    pub actions: &'a [usize],
    pub target: f64,
}

/// Per-(train, kind) value estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueNetwork {
    trunk1: Linear,
    trunk2: Linear,
    heads: Vec<Linear>,
    input_dim: usize,
    kinds: usize,
}

impl ValueNetwork {
    /// Fresh network with the given trunk widths and one head per train.
    pub fn new(
        rng: &mut StdRng,
        input_dim: usize,
        hidden: [usize; 2],
        trains: usize,
        kinds: usize,
    ) -> Self {
        Self {
            trunk1: Linear::new(rng, input_dim, hidden[0]),
            trunk2: Linear::new(rng, hidden[0], hidden[1]),
            heads: (0..trains)
                .map(|_| Linear::new(rng, hidden[1], kinds))
                .collect(),
            input_dim,
            kinds,
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn train_count(&self) -> usize {
        self.heads.len()
    }

    /// Q-values: one row of `kinds` scores per train.
    pub fn forward(&self, state: &[f64]) -> Vec<Vec<f64>> {
        let (_, _, out) = self.forward_cached(state);
        out
    }

    /// Σ over trains of the per-train maximum score; the bootstrap term of
    /// the update target.
    pub fn max_sum(&self, state: &[f64]) -> f64 {
        self.forward(state)
            .iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .sum()
    }

    fn forward_cached(&self, state: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<Vec<f64>>) {
        let mut a1 = self.trunk1.forward(state);
        relu(&mut a1);
        let mut a2 = self.trunk2.forward(&a1);
        relu(&mut a2);
        let out = self.heads.iter().map(|head| head.forward(&a2)).collect();
        (a1, a2, out)
    }

    /// One SGD step on the batch-mean squared error between the summed
    /// chosen-action scores and the targets. Returns the batch loss.
    pub(crate) fn train_batch(&mut self, batch: &[TrainSample<'_>], learning_rate: f64) -> f64 {
        let mut g_trunk1 = self.trunk1.zero_grad();
        let mut g_trunk2 = self.trunk2.zero_grad();
        let mut g_heads: Vec<LinearGrad> = self.heads.iter().map(Linear::zero_grad).collect();

        let scale = 1.0 / batch.len() as f64;
        let mut loss = 0.0;

        for sample in batch {
            let (a1, a2, out) = self.forward_cached(sample.state);
            let prediction: f64 = out
                .iter()
                .zip(sample.actions)
                .map(|(row, &kind)| row[kind])
                .sum();
            let error = prediction - sample.target;
            loss += error * error * scale;

            // d(loss)/d(prediction), shared by every selected head output.
            let g = 2.0 * error * scale;

            let mut d_a2 = vec![0.0; a2.len()];
            for (head_index, &kind) in sample.actions.iter().enumerate() {
                let head = &self.heads[head_index];
                let grad = &mut g_heads[head_index];
                let row = &head.weights[kind * head.in_dim..(kind + 1) * head.in_dim];
                for (j, (&a, &w)) in a2.iter().zip(row).enumerate() {
                    grad.weights[kind * head.in_dim + j] += g * a;
                    d_a2[j] += g * w;
                }
                grad.biases[kind] += g;
            }

            // Through trunk2's ReLU.
            let d_z2: Vec<f64> = d_a2
                .iter()
                .zip(&a2)
                .map(|(&d, &a)| if a > 0.0 { d } else { 0.0 })
                .collect();
            let mut d_a1 = vec![0.0; a1.len()];
            for (row, &dz) in d_z2.iter().enumerate() {
                if dz == 0.0 {
                    continue;
                }
                let offset = row * self.trunk2.in_dim;
                for (j, &a) in a1.iter().enumerate() {
                    g_trunk2.weights[offset + j] += dz * a;
                    d_a1[j] += dz * self.trunk2.weights[offset + j];
                }
                g_trunk2.biases[row] += dz;
            }

            // Through trunk1's ReLU.
            for (row, (&d, &a)) in d_a1.iter().zip(&a1).enumerate() {
                if a <= 0.0 || d == 0.0 {
                    continue;
                }
                let offset = row * self.trunk1.in_dim;
                for (j, &x) in sample.state.iter().enumerate() {
                    g_trunk1.weights[offset + j] += d * x;
                }
                g_trunk1.biases[row] += d;
            }
        }

        self.trunk1.apply(&g_trunk1, learning_rate);
        self.trunk2.apply(&g_trunk2, learning_rate);
        for (head, grad) in self.heads.iter_mut().zip(&g_heads) {
            head.apply(grad, learning_rate);
        }
        loss
    }
}
