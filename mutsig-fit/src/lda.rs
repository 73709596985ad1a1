//! Latent Dirichlet allocation with a pinned topic-word matrix.
//!
//! Only inference of document-topic proportions is performed: the topics are
//! the reference signatures and the vocabulary is the set of basis contexts.
//! Each document's tokens start with zero topic responsibility and are updated
//! by the collapsed mean-field rule
//!
//! `p_new(t | w) ∝ phi[t, w] * (S[t] - p_old(t | w) + alpha)`
//!
//! where `S` sums the responsibilities of every token in the document. Tokens
//! sharing a context share a responsibility vector, so updates run once per
//! distinct context weighted by its count.

use anyhow::{bail, Result};
use log::debug;
use mutsig_core::SignatureBasis;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub struct FixedBasisLda {
    /// shape: (n_topics, n_contexts); never updated.
    components: Array2<f64>,
    alpha: f64,
    tolerance: f64,
}

impl FixedBasisLda {
    /// Pin the topic-context matrix to the transpose of the signature basis.
    pub fn from_basis(basis: &SignatureBasis, alpha: f64, tolerance: f64) -> Result<Self> {
        Self::new(basis.probabilities.t().to_owned(), alpha, tolerance)
    }

    pub fn new(components: Array2<f64>, alpha: f64, tolerance: f64) -> Result<Self> {
        if components.nrows() == 0 {
            bail!("Topic model needs at least one topic");
        }
        if components.iter().any(|p| !p.is_finite() || *p < 0.0) {
            bail!("Topic-context probabilities must be finite and non-negative");
        }
        if alpha <= 0.0 {
            bail!("Dirichlet alpha must be positive (got {})", alpha);
        }
        Ok(Self {
            components,
            alpha,
            tolerance,
        })
    }

    pub fn n_topics(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_contexts(&self) -> usize {
        self.components.ncols()
    }

    /// Infer topic proportions for each row of a document x context count matrix.
    pub fn transform(&self, counts: ArrayView2<'_, u64>, max_iter: usize) -> Result<Array2<f64>> {
        if counts.ncols() != self.n_contexts() {
            bail!(
                "Count matrix has {} contexts, model has {}",
                counts.ncols(),
                self.n_contexts()
            );
        }
        let mut theta = Array2::<f64>::zeros((counts.nrows(), self.n_topics()));
        for (d, doc) in counts.rows().into_iter().enumerate() {
            let doc_theta = self.transform_single(doc, max_iter)?;
            theta.row_mut(d).assign(&doc_theta);
        }
        Ok(theta)
    }

    fn transform_single(&self, doc: ArrayView1<'_, u64>, max_iter: usize) -> Result<Array1<f64>> {
        let words: Vec<(usize, f64)> = doc
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(w, &n)| (w, n as f64))
            .collect();
        if words.is_empty() {
            bail!("Cannot infer topic proportions for a document with no variants");
        }

        let k = self.n_topics();
        let mut pzs = Array2::<f64>::zeros((words.len(), k));

        for iteration in 0..=max_iter {
            let mut totals = Array1::<f64>::zeros(k);
            for (i, (_, n)) in words.iter().enumerate() {
                totals.scaled_add(*n, &pzs.row(i));
            }

            let mut next = Array2::<f64>::zeros((words.len(), k));
            let mut delta = 0.0;
            for (i, (w, n)) in words.iter().enumerate() {
                let mut norm = 0.0;
                for t in 0..k {
                    let v = self.components[(t, *w)] * (totals[t] - pzs[(i, t)] + self.alpha);
                    next[(i, t)] = v;
                    norm += v;
                }
                if !(norm > 0.0) || !norm.is_finite() {
                    bail!(
                        "Context {} has zero probability under every signature",
                        w
                    );
                }
                for t in 0..k {
                    next[(i, t)] /= norm;
                    delta += n * (next[(i, t)] - pzs[(i, t)]).abs();
                }
            }

            debug!("transform iter {}, delta {}", iteration, delta);
            pzs = next;
            if delta < self.tolerance {
                break;
            }
        }

        let mut theta = Array1::<f64>::zeros(k);
        for (i, (_, n)) in words.iter().enumerate() {
            theta.scaled_add(*n, &pzs.row(i));
        }
        let total = theta.sum();
        Ok(theta / total)
    }
}
