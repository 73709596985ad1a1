//! mutsig-stats: ancestral vs descendant comparison of signature exposures.
//!
//! The comparison is a two-sided Mann-Whitney U (Wilcoxon rank-sum) test.
//! Small samples without ties get the exact null distribution of U; otherwise
//! the normal approximation with tie and continuity corrections is used.

use anyhow::{anyhow, bail, Result};
use log::debug;
use mutsig_core::{BranchRole, ExposureTable, GroupKey};
use ndarray::ArrayView1;
use statrs::distribution::{ContinuousCDF, Normal};

/// Largest size of the smaller sample for which the exact distribution is used
pub const EXACT_MAX_SAMPLE: usize = 8;

/// Result of a Mann-Whitney U test.
#[derive(Debug, Clone, Copy)]
pub struct MannWhitneyResult {
    /// U statistic of the first sample.
    pub u_statistic: f64,
    /// Continuity-corrected z score of the larger U.
    pub z_score: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Whether `p_value` comes from the exact distribution of U.
    pub exact: bool,
}

/// Average ranks (1-based) of the pooled values plus the tie correction term
/// sum(t^3 - t) over tie groups.
fn rank_with_ties(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // positions i..=j share the average of ranks i+1..=j+1
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        let t = (j - i + 1) as f64;
        tie_term += t * t * t - t;
        i = j + 1;
    }
    (ranks, tie_term)
}

/// P(U >= u) under the null for samples of size `n1` and `n2` without ties.
///
/// Built up one pooled observation at a time: the largest of `i + j` values
/// belongs to the first sample with probability `i / (i + j)` and then beats
/// all `j` values of the second.
fn exact_upper_tail(n1: usize, n2: usize, u: usize) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    // dist[i][k] = P(U = k) for sizes (i, j) at the current j
    let mut dist: Vec<Vec<f64>> = vec![vec![1.0]; m + 1];
    for j in 1..=n {
        for i in 1..=m {
            let total = (i + j) as f64;
            let mut next = vec![0.0; i * j + 1];
            for (k, &p) in dist[i - 1].iter().enumerate() {
                next[k + j] += p * i as f64 / total;
            }
            for (k, &p) in dist[i].iter().enumerate() {
                next[k] += p * j as f64 / total;
            }
            dist[i] = next;
        }
    }
    dist[m].iter().skip(u).sum()
}

/// Two-sided Mann-Whitney U test between independent samples `x` and `y`.
///
/// When the smaller sample has at most [`EXACT_MAX_SAMPLE`] values and there
/// are no ties the p-value is exact, otherwise it comes from the normal
/// approximation. Fails when either sample is empty or contains NaN.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Result<MannWhitneyResult> {
    if x.is_empty() || y.is_empty() {
        bail!(
            "Mann-Whitney U needs two non-empty samples (got {} and {})",
            x.len(),
            y.len()
        );
    }
    if x.iter().chain(y.iter()).any(|v| v.is_nan()) {
        bail!("Mann-Whitney U input contains NaN");
    }

    let n1 = x.len() as f64;
    let n2 = y.len() as f64;
    let n = n1 + n2;

    let pooled: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    let (ranks, tie_term) = rank_with_ties(&pooled);
    let rank_sum_x: f64 = ranks[..x.len()].iter().sum();

    let u1 = rank_sum_x - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let big_u = u1.max(u2);
    let mean_u = n1 * n2 / 2.0;
    let var_u = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    if var_u <= 0.0 {
        // Every value tied: no evidence of a shift.
        return Ok(MannWhitneyResult {
            u_statistic: u1,
            z_score: 0.0,
            p_value: 1.0,
            exact: false,
        });
    }

    let z = (big_u - mean_u - 0.5) / var_u.sqrt();
    let exact = tie_term == 0.0 && x.len().min(y.len()) <= EXACT_MAX_SAMPLE;
    let p_value = if exact {
        // without ties U is an integer
        2.0 * exact_upper_tail(x.len(), y.len(), big_u.round() as usize)
    } else {
        let normal = Normal::new(0.0, 1.0)?;
        2.0 * normal.sf(z)
    };

    Ok(MannWhitneyResult {
        u_statistic: u1,
        z_score: z,
        p_value: p_value.clamp(0.0, 1.0),
        exact,
    })
}

/// Split one signature's exposures by branch role and test for a shift.
///
/// Every key must carry a role; an empty class is an error.
pub fn test_ancestral_descendant(keys: &[GroupKey], values: ArrayView1<'_, f64>) -> Result<f64> {
    if keys.len() != values.len() {
        bail!(
            "{} group keys but {} exposure values",
            keys.len(),
            values.len()
        );
    }
    let mut ancestral = Vec::new();
    let mut descendant = Vec::new();
    for (key, &v) in keys.iter().zip(values.iter()) {
        match key.role {
            Some(BranchRole::Ancestral) => ancestral.push(v),
            Some(BranchRole::Descendant) => descendant.push(v),
            None => bail!("Group {} has no branch role", key.label),
        }
    }
    let result = mann_whitney_u(&ancestral, &descendant)?;
    Ok(result.p_value)
}

/// p-value of the ancestral vs descendant test for every signature column.
pub fn signature_pvalues(table: &ExposureTable) -> Result<Vec<(String, f64)>> {
    table
        .signatures
        .iter()
        .enumerate()
        .map(|(j, sig)| {
            let p = test_ancestral_descendant(&table.keys, table.column(j))
                .map_err(|e| anyhow!("Signature {}: {}", sig, e))?;
            debug!("Signature {} ancestral vs descendant p = {:e}", sig, p);
            Ok((sig.clone(), p))
        })
        .collect()
}
