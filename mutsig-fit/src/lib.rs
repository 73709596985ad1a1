//! mutsig-fit: per-group mutational signature exposures.
//!
//! Variants are tallied per group over the basis contexts, groups with too
//! few variants are dropped, and each remaining group's context histogram is
//! projected onto the fixed signature basis with [`lda::FixedBasisLda`].

pub mod lda;

use anyhow::Result;
use log::info;
use mutsig_core::{CountMatrix, ExposureTable, GroupKey, SignatureBasis};

pub use lda::FixedBasisLda;

/// Settings for signature fitting.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Groups need strictly more than this many variants to be fitted.
    pub min_variants: u64,
    /// Symmetric Dirichlet prior on document-topic proportions.
    pub alpha: f64,
    /// Maximum inference iterations per group.
    pub max_iter: usize,
    /// Stop once the summed absolute change of token responsibilities drops below this.
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_variants: 100,
            alpha: 0.01,
            max_iter: 1000,
            tolerance: 10.0,
        }
    }
}

/// Fit signature exposures for every group with enough variants.
///
/// `assignments` yields one (group, context index) pair per variant. Rows of
/// the returned table are sorted by group label and sum to one. When no group
/// passes the variant filter the table is empty.
pub fn fit_sample_signatures<I>(
    assignments: I,
    basis: &SignatureBasis,
    config: &FitConfig,
) -> Result<ExposureTable>
where
    I: IntoIterator<Item = (GroupKey, usize)>,
{
    let counts = CountMatrix::tally(assignments, basis.n_contexts())?;
    let kept = counts.retain_above(config.min_variants);
    info!(
        "{} of {} groups have more than {} variants",
        kept.n_groups(),
        counts.n_groups(),
        config.min_variants
    );

    if kept.n_groups() == 0 {
        return Ok(ExposureTable::empty(basis.signature_ids()));
    }

    let model = FixedBasisLda::from_basis(basis, config.alpha, config.tolerance)?;
    let proportions = model.transform(kept.counts.view(), config.max_iter)?;

    Ok(ExposureTable {
        keys: kept.keys,
        signatures: basis.signature_ids(),
        proportions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mutsig_core::BasisRow;

    fn two_context_basis() -> SignatureBasis {
        SignatureBasis::from_rows(
            vec!["Signature 1".into(), "Signature 2".into()],
            vec![
                BasisRow {
                    trinucleotide: "ACA".into(),
                    substitution_type: "C>A".into(),
                    probabilities: vec![0.95, 0.05],
                },
                BasisRow {
                    trinucleotide: "TCG".into(),
                    substitution_type: "C>T".into(),
                    probabilities: vec![0.05, 0.95],
                },
            ],
        )
        .unwrap()
    }

    fn variants(key: &GroupKey, idx: usize, n: usize) -> Vec<(GroupKey, usize)> {
        (0..n).map(|_| (key.clone(), idx)).collect()
    }

    #[test]
    fn groups_at_or_below_threshold_are_dropped() {
        let small = GroupKey::sample("P1", "small");
        let edge = GroupKey::sample("P1", "edge");
        let big = GroupKey::sample("P1", "big");
        let mut items = variants(&small, 0, 10);
        items.extend(variants(&edge, 0, 100));
        items.extend(variants(&big, 1, 101));

        let table =
            fit_sample_signatures(items, &two_context_basis(), &FitConfig::default()).unwrap();
        assert_eq!(table.keys, vec![big]);
        assert_eq!(table.signatures, vec!["1", "2"]);
    }

    #[test]
    fn rows_sum_to_one() {
        let a = GroupKey::sample("P1", "A");
        let b = GroupKey::sample("P2", "B");
        let mut items = variants(&a, 0, 80);
        items.extend(variants(&a, 1, 70));
        items.extend(variants(&b, 1, 300));
        items.extend(variants(&b, 0, 3));

        let table =
            fit_sample_signatures(items, &two_context_basis(), &FitConfig::default()).unwrap();
        assert_eq!(table.n_groups(), 2);
        for row in table.proportions.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
        assert!(table.proportions[(1, 1)] > 0.9);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = fit_sample_signatures(
            Vec::<(GroupKey, usize)>::new(),
            &two_context_basis(),
            &FitConfig::default(),
        )
        .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.n_signatures(), 2);
    }
}
