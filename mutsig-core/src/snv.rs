//! SNV records, context assignment, and transfer of contexts onto clone nodes.

use crate::basis::ContextLookup;
use crate::group::GroupKey;
use log::info;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeSet, HashMap};

/// Deserialize an optional string, treating "NA", "NaN" and empty strings as None
fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty()
                || trimmed.eq_ignore_ascii_case("na")
                || trimmed.eq_ignore_ascii_case("nan")
            {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}

/// One variant observed in one sample.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnvRecord {
    pub chrom: String,
    pub coord: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub tri_nucleotide_context: Option<String>,
    pub alt_counts: u32,
    pub patient_id: String,
    pub sample_id: String,
}

/// One variant assigned to one phylogenetic node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnvNodeRecord {
    pub patient_id: String,
    pub node: u32,
    pub chrom: String,
    pub coord: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    #[serde(rename = "alt")]
    pub alt_allele: String,
}

/// Genomic identity of a variant, independent of sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantSite {
    pub chrom: String,
    pub coord: u64,
    pub ref_allele: String,
    pub alt_allele: String,
}

impl From<&SnvRecord> for VariantSite {
    fn from(snv: &SnvRecord) -> Self {
        Self {
            chrom: snv.chrom.clone(),
            coord: snv.coord,
            ref_allele: snv.ref_allele.clone(),
            alt_allele: snv.alt_allele.clone(),
        }
    }
}

impl From<&SnvNodeRecord> for VariantSite {
    fn from(snv: &SnvNodeRecord) -> Self {
        Self {
            chrom: snv.chrom.clone(),
            coord: snv.coord,
            ref_allele: snv.ref_allele.clone(),
            alt_allele: snv.alt_allele.clone(),
        }
    }
}

/// SNV record joined to its basis context index.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSnv {
    pub snv: SnvRecord,
    pub context_index: usize,
}

impl AnnotatedSnv {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::sample(&self.snv.patient_id, &self.snv.sample_id)
    }
}

/// Node record with the context index recovered from the sample-level table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedNodeSnv {
    pub snv: SnvNodeRecord,
    pub context_index: usize,
}

impl AnnotatedNodeSnv {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::node(&self.snv.patient_id, self.snv.node)
    }
}

/// Attach context indices to SNVs.
///
/// Rows without a trinucleotide context, rows whose (ref, alt, context) is
/// absent from the lookup, and rows with zero supporting alt reads are
/// dropped. Dropping is a filter, not an error.
pub fn assign_contexts(snvs: &[SnvRecord], lookup: &ContextLookup) -> Vec<AnnotatedSnv> {
    let mut missing_context = 0usize;
    let mut unmatched = 0usize;
    let mut unsupported = 0usize;

    let annotated: Vec<AnnotatedSnv> = snvs
        .iter()
        .filter_map(|snv| {
            let context = match snv.tri_nucleotide_context.as_deref() {
                Some(c) => c,
                None => {
                    missing_context += 1;
                    return None;
                }
            };
            let context_index = match lookup.get(&snv.ref_allele, &snv.alt_allele, context) {
                Some(idx) => idx,
                None => {
                    unmatched += 1;
                    return None;
                }
            };
            if snv.alt_counts == 0 {
                unsupported += 1;
                return None;
            }
            Some(AnnotatedSnv {
                snv: snv.clone(),
                context_index,
            })
        })
        .collect();

    info!(
        "Assigned contexts to {} of {} SNVs ({} without context, {} not in lookup, {} without alt reads)",
        annotated.len(),
        snvs.len(),
        missing_context,
        unmatched,
        unsupported
    );
    annotated
}

/// Distinct (site, context index) pairs observed in the annotated table.
pub fn cohort_contexts(annotated: &[AnnotatedSnv]) -> BTreeSet<(VariantSite, usize)> {
    annotated
        .iter()
        .map(|a| (VariantSite::from(&a.snv), a.context_index))
        .collect()
}

/// Inner join of node records onto the distinct cohort contexts.
///
/// A node record whose site never appears in `annotated` is dropped; a site
/// seen with more than one context index yields one row per index.
pub fn transfer_contexts(
    nodes: &[SnvNodeRecord],
    annotated: &[AnnotatedSnv],
) -> Vec<AnnotatedNodeSnv> {
    let mut by_site: HashMap<VariantSite, Vec<usize>> = HashMap::new();
    for (site, idx) in cohort_contexts(annotated) {
        by_site.entry(site).or_default().push(idx);
    }

    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(indices) = by_site.get(&VariantSite::from(node)) {
            for &context_index in indices {
                out.push(AnnotatedNodeSnv {
                    snv: node.clone(),
                    context_index,
                });
            }
        }
    }

    info!(
        "Transferred contexts to {} of {} node SNVs",
        out.len(),
        nodes.len()
    );
    out
}
