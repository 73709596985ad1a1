//! Count matrices and exposure tables.

use crate::group::GroupKey;
use anyhow::{bail, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::collections::BTreeMap;

/// Group x context count matrix.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    pub keys: Vec<GroupKey>,
    /// shape: (n_groups, n_contexts)
    pub counts: Array2<u64>,
}

impl CountMatrix {
    /// Tally (group, context index) assignments. Rows are sorted by group label
    /// and contexts never observed for a group stay at zero.
    pub fn tally<I>(assignments: I, n_contexts: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (GroupKey, usize)>,
    {
        let mut by_group: BTreeMap<GroupKey, Vec<u64>> = BTreeMap::new();
        for (key, idx) in assignments {
            if idx >= n_contexts {
                bail!(
                    "Context index {} for {} is outside the basis (n_contexts={})",
                    idx,
                    key,
                    n_contexts
                );
            }
            by_group.entry(key).or_insert_with(|| vec![0; n_contexts])[idx] += 1;
        }

        let mut counts = Array2::<u64>::zeros((by_group.len(), n_contexts));
        let mut keys = Vec::with_capacity(by_group.len());
        for (i, (key, row)) in by_group.into_iter().enumerate() {
            for (j, c) in row.into_iter().enumerate() {
                counts[(i, j)] = c;
            }
            keys.push(key);
        }
        Ok(Self { keys, counts })
    }

    pub fn n_groups(&self) -> usize {
        self.keys.len()
    }

    pub fn n_contexts(&self) -> usize {
        self.counts.ncols()
    }

    pub fn totals(&self) -> Array1<u64> {
        self.counts.sum_axis(Axis(1))
    }

    /// Keep groups whose total variant count is strictly above `min_total`.
    pub fn retain_above(&self, min_total: u64) -> Self {
        let totals = self.totals();
        let kept: Vec<usize> = (0..self.n_groups())
            .filter(|&i| totals[i] > min_total)
            .collect();
        Self {
            keys: kept.iter().map(|&i| self.keys[i].clone()).collect(),
            counts: self.counts.select(Axis(0), &kept),
        }
    }
}

/// Group x signature exposure proportions; every row sums to one.
#[derive(Debug, Clone)]
pub struct ExposureTable {
    pub keys: Vec<GroupKey>,
    /// Bare signature identifiers ("1", "2", ...).
    pub signatures: Vec<String>,
    /// shape: (n_groups, n_signatures)
    pub proportions: Array2<f64>,
}

impl ExposureTable {
    pub fn empty(signatures: Vec<String>) -> Self {
        let n = signatures.len();
        Self {
            keys: Vec::new(),
            signatures,
            proportions: Array2::zeros((0, n)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn n_groups(&self) -> usize {
        self.keys.len()
    }

    pub fn n_signatures(&self) -> usize {
        self.signatures.len()
    }

    pub fn signature_index(&self, signature: &str) -> Option<usize> {
        self.signatures.iter().position(|s| s == signature)
    }

    pub fn column(&self, signature: usize) -> ArrayView1<'_, f64> {
        self.proportions.column(signature)
    }

    /// True when any key carries a branch role.
    pub fn has_roles(&self) -> bool {
        self.keys.iter().any(|k| k.role.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn tally_fills_missing_contexts_with_zero() {
        let a = GroupKey::sample("P1", "A");
        let b = GroupKey::sample("P1", "B");
        let m = CountMatrix::tally(
            vec![(b.clone(), 2), (a.clone(), 0), (a.clone(), 0), (b.clone(), 1)],
            3,
        )
        .unwrap();
        assert_eq!(m.keys, vec![a, b]);
        assert_eq!(m.counts, array![[2, 0, 0], [0, 1, 1]]);
    }

    #[test]
    fn tally_rejects_out_of_range_index() {
        let a = GroupKey::sample("P1", "A");
        assert!(CountMatrix::tally(vec![(a, 3)], 3).is_err());
    }

    #[test]
    fn retain_is_strict() {
        let a = GroupKey::sample("P1", "A");
        let b = GroupKey::sample("P1", "B");
        let mut items: Vec<(GroupKey, usize)> = (0..3).map(|_| (a.clone(), 0)).collect();
        items.extend((0..4).map(|_| (b.clone(), 1)));
        let m = CountMatrix::tally(items, 2).unwrap().retain_above(3);
        assert_eq!(m.keys, vec![b]);
        assert_eq!(m.counts, array![[0, 4]]);
    }

    #[test]
    fn empty_exposure_table_keeps_columns() {
        let t = ExposureTable::empty(vec!["1".into(), "2".into()]);
        assert!(t.is_empty());
        assert_eq!(t.proportions.dim(), (0, 2));
        assert_eq!(t.signature_index("2"), Some(1));
    }
}
