//! Reference signature basis and the strand-collapsed context lookup.

use anyhow::{anyhow, bail, Result};
use ndarray::Array2;
use std::collections::HashMap;

/// Column-name prefix shared by every reference signature.
pub const SIGNATURE_PREFIX: &str = "Signature ";

/// Reverse complement a nucleotide string, preserving case.
///
/// Characters other than A/C/G/T (either case) are kept as-is.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            'a' => 't',
            't' => 'a',
            'c' => 'g',
            'g' => 'c',
            other => other,
        })
        .collect()
}

/// Split an "X>Y" substitution type into (ref, alt).
pub fn split_substitution(substitution: &str) -> Result<(String, String)> {
    let mut parts = substitution.split('>');
    let ref_allele = parts.next().unwrap_or_default();
    let alt_allele = parts
        .next()
        .ok_or_else(|| anyhow!("Substitution type '{}' is missing '>'", substitution))?;
    Ok((ref_allele.to_string(), alt_allele.to_string()))
}

/// One raw row of the reference table before indexing.
#[derive(Debug, Clone)]
pub struct BasisRow {
    pub trinucleotide: String,
    pub substitution_type: String,
    pub probabilities: Vec<f64>,
}

/// A trinucleotide context of the basis, in its reference orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationContext {
    pub index: usize,
    pub ref_allele: String,
    pub alt_allele: String,
    pub tri_nucleotide_context: String,
}

/// Fixed context x signature probability matrix.
#[derive(Debug, Clone)]
pub struct SignatureBasis {
    pub contexts: Vec<MutationContext>,
    /// Full column names, e.g. "Signature 1".
    pub signature_names: Vec<String>,
    /// shape: (n_contexts, n_signatures)
    pub probabilities: Array2<f64>,
}

impl SignatureBasis {
    /// Build the basis from table rows. Row order defines the context index.
    pub fn from_rows(signature_names: Vec<String>, rows: Vec<BasisRow>) -> Result<Self> {
        let n_sigs = signature_names.len();
        if n_sigs == 0 {
            bail!("Signature table has no '{}' columns", SIGNATURE_PREFIX.trim_end());
        }

        let mut contexts = Vec::with_capacity(rows.len());
        let mut seen: HashMap<ContextKey, usize> = HashMap::new();
        let mut probabilities = Array2::<f64>::zeros((rows.len(), n_sigs));

        for (index, row) in rows.into_iter().enumerate() {
            let (ref_allele, alt_allele) = split_substitution(&row.substitution_type)?;
            let key = ContextKey::new(&ref_allele, &alt_allele, &row.trinucleotide);
            if let Some(prev) = seen.insert(key, index) {
                bail!(
                    "Context {} {} appears on rows {} and {}; expected one row per context",
                    row.substitution_type,
                    row.trinucleotide,
                    prev,
                    index
                );
            }
            if row.probabilities.len() != n_sigs {
                bail!(
                    "Row {} has {} probabilities, expected {}",
                    index,
                    row.probabilities.len(),
                    n_sigs
                );
            }
            for (j, p) in row.probabilities.iter().enumerate() {
                probabilities[(index, j)] = *p;
            }
            contexts.push(MutationContext {
                index,
                ref_allele,
                alt_allele,
                tri_nucleotide_context: row.trinucleotide,
            });
        }

        Ok(Self {
            contexts,
            signature_names,
            probabilities,
        })
    }

    pub fn n_contexts(&self) -> usize {
        self.contexts.len()
    }

    pub fn n_signatures(&self) -> usize {
        self.signature_names.len()
    }

    /// Signature identifiers with the "Signature " prefix stripped.
    pub fn signature_ids(&self) -> Vec<String> {
        self.signature_names
            .iter()
            .map(|name| {
                name.strip_prefix(SIGNATURE_PREFIX)
                    .unwrap_or(name)
                    .to_string()
            })
            .collect()
    }

    /// Lookup from (ref, alt, context) in both orientations to the context index.
    pub fn context_lookup(&self) -> Result<ContextLookup> {
        ContextLookup::from_contexts(&self.contexts)
    }
}

/// Join key of a single-nucleotide substitution in its trinucleotide context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey {
    pub ref_allele: String,
    pub alt_allele: String,
    pub tri_nucleotide_context: String,
}

impl ContextKey {
    pub fn new(ref_allele: &str, alt_allele: &str, tri_nucleotide_context: &str) -> Self {
        Self {
            ref_allele: ref_allele.to_string(),
            alt_allele: alt_allele.to_string(),
            tri_nucleotide_context: tri_nucleotide_context.to_string(),
        }
    }

    /// The same substitution read off the opposite strand.
    pub fn reverse_complement(&self) -> Self {
        Self {
            ref_allele: reverse_complement(&self.ref_allele),
            alt_allele: reverse_complement(&self.alt_allele),
            tri_nucleotide_context: reverse_complement(&self.tri_nucleotide_context),
        }
    }
}

/// Union of the basis contexts and their reverse complements, keyed to the
/// index of the original orientation.
#[derive(Debug, Clone, Default)]
pub struct ContextLookup {
    entries: HashMap<ContextKey, usize>,
}

impl ContextLookup {
    pub fn from_contexts(contexts: &[MutationContext]) -> Result<Self> {
        let mut entries = HashMap::with_capacity(contexts.len() * 2);
        for ctx in contexts {
            let original = ContextKey::new(
                &ctx.ref_allele,
                &ctx.alt_allele,
                &ctx.tri_nucleotide_context,
            );
            let complement = original.reverse_complement();
            for key in [original, complement] {
                if let Some(&existing) = entries.get(&key) {
                    if existing != ctx.index {
                        bail!(
                            "Context {}>{} {} maps to both index {} and {}",
                            key.ref_allele,
                            key.alt_allele,
                            key.tri_nucleotide_context,
                            existing,
                            ctx.index
                        );
                    }
                }
                entries.insert(key, ctx.index);
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, ref_allele: &str, alt_allele: &str, tri_nucleotide_context: &str) -> Option<usize> {
        self.entries
            .get(&ContextKey::new(ref_allele, alt_allele, tri_nucleotide_context))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContextKey, usize)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tri: &str, sub: &str, probs: &[f64]) -> BasisRow {
        BasisRow {
            trinucleotide: tri.to_string(),
            substitution_type: sub.to_string(),
            probabilities: probs.to_vec(),
        }
    }

    fn small_basis() -> SignatureBasis {
        SignatureBasis::from_rows(
            vec!["Signature 1".into(), "Signature 13".into()],
            vec![
                row("ACA", "C>A", &[0.9, 0.1]),
                row("TCG", "C>T", &[0.1, 0.9]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn reverse_complement_is_an_involution() {
        for seq in ["ACA", "TCG", "GgT", "C", "a", "ANT", ""] {
            assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
        }
        assert_eq!(reverse_complement("ACG"), "CGT");
        assert_eq!(reverse_complement("aCg"), "cGt");
    }

    #[test]
    fn substitution_requires_separator() {
        assert_eq!(
            split_substitution("C>A").unwrap(),
            ("C".to_string(), "A".to_string())
        );
        assert!(split_substitution("CA").is_err());
    }

    #[test]
    fn lookup_maps_both_strands_to_same_index() {
        let basis = small_basis();
        let lookup = basis.context_lookup().unwrap();
        assert_eq!(lookup.len(), 4);
        for (key, idx) in lookup.iter() {
            let rc = key.reverse_complement();
            assert_eq!(
                lookup.get(&rc.ref_allele, &rc.alt_allele, &rc.tri_nucleotide_context),
                Some(idx)
            );
        }
        assert_eq!(lookup.get("C", "A", "ACA"), Some(0));
        assert_eq!(lookup.get("G", "T", "TGT"), Some(0));
        assert_eq!(lookup.get("G", "A", "CGA"), Some(1));
        assert_eq!(lookup.get("T", "A", "ACA"), None);
    }

    #[test]
    fn signature_ids_drop_prefix() {
        assert_eq!(small_basis().signature_ids(), vec!["1", "13"]);
    }

    #[test]
    fn duplicate_context_rows_are_rejected() {
        let err = SignatureBasis::from_rows(
            vec!["Signature 1".into()],
            vec![row("ACA", "C>A", &[0.5]), row("ACA", "C>A", &[0.5])],
        );
        assert!(err.is_err());
    }

    #[test]
    fn strand_collision_is_rejected() {
        let basis = SignatureBasis::from_rows(
            vec!["Signature 1".into()],
            vec![row("ACA", "C>A", &[0.5]), row("TGT", "G>T", &[0.5])],
        )
        .unwrap();
        assert!(basis.context_lookup().is_err());
    }

    #[test]
    fn ragged_probability_rows_are_rejected() {
        let err = SignatureBasis::from_rows(
            vec!["Signature 1".into(), "Signature 2".into()],
            vec![row("ACA", "C>A", &[0.5])],
        );
        assert!(err.is_err());
    }
}
