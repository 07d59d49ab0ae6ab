//! Multinomial logistic regression fitted with accelerated gradient descent
//!
//! Minimizes the class-weighted mean cross-entropy plus an L2 penalty on the
//! weights (intercepts are not penalized):
//!
//! ```text
//! (1/n) Σ s_i · CE(softmax(W x_i + b), y_i) + ‖W‖² / (2 C n)
//! ```
//!
//! The objective is smooth and strongly convex in `W`, so a fixed step of
//! `1/L` with Nesterov momentum (restarted whenever the step stops descending)
//! converges to the unique optimum without a line search.

use super::{ClassWeight, TrainingConfig};
use crate::features::SparseVector;

/// Fitted parameters, row-major `n_classes × n_features`
pub(crate) struct SoftmaxFit {
    pub weights: Vec<f64>,
    pub intercepts: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Per-sample weights for the given labels
fn sample_weights(labels: &[usize], n_classes: usize, class_weight: ClassWeight) -> Vec<f64> {
    match class_weight {
        ClassWeight::None => vec![1.0; labels.len()],
        ClassWeight::Balanced => {
            let mut counts = vec![0usize; n_classes];
            for &label in labels {
                counts[label] += 1;
            }
            let n = labels.len() as f64;
            labels
                .iter()
                .map(|&label| n / (n_classes as f64 * counts[label] as f64))
                .collect()
        }
    }
}

/// `out[k] = b[k] + W[k] · x`
pub(crate) fn logits(
    weights: &[f64],
    intercepts: &[f64],
    n_features: usize,
    x: &SparseVector,
    out: &mut [f64],
) {
    for (k, z) in out.iter_mut().enumerate() {
        let row = &weights[k * n_features..(k + 1) * n_features];
        *z = intercepts[k] + x.iter().map(|&(j, v)| row[j] * v).sum::<f64>();
    }
}

/// Numerically stable in-place softmax
pub(crate) fn softmax_in_place(z: &mut [f64]) {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in z.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in z.iter_mut() {
        *v /= sum;
    }
}

struct Problem<'a> {
    rows: &'a [SparseVector],
    labels: &'a [usize],
    sample_weights: Vec<f64>,
    n_classes: usize,
    n_features: usize,
    reg: f64,
}

impl Problem<'_> {
    /// Gradient of the objective at (w, b); returns the largest absolute component
    fn gradient(&self, w: &[f64], b: &[f64], gw: &mut [f64], gb: &mut [f64]) -> f64 {
        let n = self.rows.len() as f64;
        let d = self.n_features;
        let mut probs = vec![0.0; self.n_classes];

        for (g, wi) in gw.iter_mut().zip(w) {
            *g = self.reg * wi;
        }
        gb.fill(0.0);

        for ((x, &label), &s) in self.rows.iter().zip(self.labels).zip(&self.sample_weights) {
            logits(w, b, d, x, &mut probs);
            softmax_in_place(&mut probs);
            for (k, &p) in probs.iter().enumerate() {
                let target = if k == label { 1.0 } else { 0.0 };
                let g = s * (p - target) / n;
                gb[k] += g;
                let row = &mut gw[k * d..(k + 1) * d];
                for &(j, v) in x {
                    row[j] += g * v;
                }
            }
        }

        gw.iter()
            .chain(gb.iter())
            .fold(0.0f64, |acc, g| acc.max(g.abs()))
    }

    /// Lipschitz bound on the gradient; rows are unit length or empty
    fn lipschitz(&self) -> f64 {
        let n = self.rows.len() as f64;
        let data: f64 = self
            .rows
            .iter()
            .zip(&self.sample_weights)
            .map(|(x, s)| {
                let sq_norm: f64 = x.iter().map(|(_, v)| v * v).sum();
                s * 0.5 * (sq_norm + 1.0)
            })
            .sum();
        data / n + self.reg
    }
}

pub(crate) fn fit(
    rows: &[SparseVector],
    labels: &[usize],
    n_classes: usize,
    n_features: usize,
    config: &TrainingConfig,
) -> SoftmaxFit {
    let problem = Problem {
        rows,
        labels,
        sample_weights: sample_weights(labels, n_classes, config.class_weight),
        n_classes,
        n_features,
        reg: 1.0 / (config.c * rows.len() as f64),
    };
    let step = 1.0 / problem.lipschitz();

    let size = n_classes * n_features;
    let mut w = vec![0.0; size];
    let mut b = vec![0.0; n_classes];
    let mut yw = w.clone();
    let mut yb = b.clone();
    let mut gw = vec![0.0; size];
    let mut gb = vec![0.0; n_classes];
    let mut t = 1.0f64;

    for iteration in 0..config.max_iter {
        let grad_max = problem.gradient(&yw, &yb, &mut gw, &mut gb);
        if grad_max < config.tolerance {
            return SoftmaxFit {
                weights: yw,
                intercepts: yb,
                iterations: iteration,
                converged: true,
            };
        }

        let next_w: Vec<f64> = yw.iter().zip(&gw).map(|(y, g)| y - step * g).collect();
        let next_b: Vec<f64> = yb.iter().zip(&gb).map(|(y, g)| y - step * g).collect();

        // Restart momentum when the gradient points against the last move
        let ascent: f64 = gw
            .iter()
            .zip(next_w.iter().zip(&w))
            .chain(gb.iter().zip(next_b.iter().zip(&b)))
            .map(|(g, (next, prev))| g * (next - prev))
            .sum();
        if ascent > 0.0 {
            t = 1.0;
        }

        let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
        let beta = (t - 1.0) / t_next;
        for ((y, next), prev) in yw.iter_mut().zip(&next_w).zip(&w) {
            *y = next + beta * (next - prev);
        }
        for ((y, next), prev) in yb.iter_mut().zip(&next_b).zip(&b) {
            *y = next + beta * (next - prev);
        }

        w = next_w;
        b = next_b;
        t = t_next;
    }

    SoftmaxFit {
        weights: w,
        intercepts: b,
        iterations: config.max_iter,
        converged: false,
    }
}
