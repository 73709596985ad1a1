//! mutsig-io: file I/O for mutational signature analysis.
//!
//! This crate reads and writes the tables the pipeline consumes and produces:
//! - COSMIC-style signature probability tables (TSV)
//! - Per-sample SNV tables and per-node SNV tables (CSV or TSV)
//! - Exposure tables and per-signature p-value tables (TSV)

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use mutsig_core::{
    BasisRow, BranchRole, ContextLookup, ExposureTable, GroupKey, SignatureBasis, SnvNodeRecord,
    SnvRecord, N_COSMIC_CONTEXTS,
};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use std::path::Path;

const TRINUCLEOTIDE_COL: &str = "Trinucleotide";
const SUBSTITUTION_COL: &str = "Substitution Type";
const SAMPLE_COL: &str = "Sample";
const BRANCH_COL: &str = "Branch";

/// Detect delimiter (tab or comma) from the header line of a file.
pub fn detect_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let mut rdr = std::io::BufReader::new(
        std::fs::File::open(&path)
            .with_context(|| format!("opening {}", path.as_ref().display()))?,
    );
    let mut first_line = String::new();
    std::io::BufRead::read_line(&mut rdr, &mut first_line)?;
    if first_line.contains('\t') {
        Ok(b'\t')
    } else {
        Ok(b',')
    }
}

/// Load the reference signature table.
///
/// Expects tab-separated columns "Trinucleotide", "Substitution Type" (X>Y)
/// and one column per signature whose name starts with "Signature". Row
/// order defines the context index.
pub fn load_signature_basis<P: AsRef<Path>>(path: P) -> Result<SignatureBasis> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("reading headers from {}", path.display()))?
        .clone();

    let tri_idx = headers
        .iter()
        .position(|h| h == TRINUCLEOTIDE_COL)
        .ok_or_else(|| anyhow!("'{}' column missing in {}", TRINUCLEOTIDE_COL, path.display()))?;
    let sub_idx = headers
        .iter()
        .position(|h| h == SUBSTITUTION_COL)
        .ok_or_else(|| anyhow!("'{}' column missing in {}", SUBSTITUTION_COL, path.display()))?;
    let sig_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with("Signature"))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let mut probabilities = Vec::with_capacity(sig_cols.len());
        for (col, name) in &sig_cols {
            let raw = record.get(*col).unwrap_or("");
            let val: f64 = raw.trim().parse().map_err(|e| {
                anyhow!(
                    "Failed to parse probability '{}' for {} on data row {}: {}",
                    raw,
                    name,
                    line + 1,
                    e
                )
            })?;
            probabilities.push(val);
        }
        rows.push(BasisRow {
            trinucleotide: record.get(tri_idx).unwrap_or("").to_string(),
            substitution_type: record.get(sub_idx).unwrap_or("").to_string(),
            probabilities,
        });
    }

    let basis = SignatureBasis::from_rows(sig_cols.into_iter().map(|(_, h)| h).collect(), rows)
        .with_context(|| format!("building signature basis from {}", path.display()))?;

    if basis.n_contexts() != N_COSMIC_CONTEXTS {
        warn!(
            "Signature table {} has {} contexts (COSMIC tables have {})",
            path.display(),
            basis.n_contexts(),
            N_COSMIC_CONTEXTS
        );
    }
    info!(
        "Loaded {} contexts x {} signatures from {}",
        basis.n_contexts(),
        basis.n_signatures(),
        path.display()
    );
    Ok(basis)
}

/// Load the signature table and derive its two-strand context lookup.
pub fn load_signature_probabilities<P: AsRef<Path>>(
    path: P,
) -> Result<(ContextLookup, SignatureBasis)> {
    let basis = load_signature_basis(path)?;
    let lookup = basis.context_lookup()?;
    Ok((lookup, basis))
}

fn load_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let delim = detect_delimiter(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delim)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record: T =
            result.with_context(|| format!("{}: data row {}", path.display(), line + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Load per-sample SNVs.
///
/// Required columns: chrom, coord, ref, alt, tri_nucleotide_context,
/// alt_counts, patient_id, sample_id. Extra columns are ignored.
pub fn load_snvs<P: AsRef<Path>>(path: P) -> Result<Vec<SnvRecord>> {
    let snvs: Vec<SnvRecord> = load_records(&path)?;
    info!("Read {} SNVs from {}", snvs.len(), path.as_ref().display());
    Ok(snvs)
}

/// Load per-node SNVs.
///
/// Required columns: patient_id, node, chrom, coord, ref, alt.
pub fn load_snv_nodes<P: AsRef<Path>>(path: P) -> Result<Vec<SnvNodeRecord>> {
    let nodes: Vec<SnvNodeRecord> = load_records(&path)?;
    info!("Read {} node SNVs from {}", nodes.len(), path.as_ref().display());
    Ok(nodes)
}

/// Write an exposure table to TSV.
///
/// A "Branch" column follows "Sample" when the keys carry a branch role.
pub fn write_exposure_tsv<P: AsRef<Path>>(path: P, table: &ExposureTable) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let with_roles = table.has_roles();
    let mut header = Vec::with_capacity(table.n_signatures() + 2);
    header.push(SAMPLE_COL.to_string());
    if with_roles {
        header.push(BRANCH_COL.to_string());
    }
    header.extend(table.signatures.iter().cloned());
    wtr.write_record(&header)?;

    for (i, key) in table.keys.iter().enumerate() {
        let mut row = Vec::with_capacity(header.len());
        row.push(key.label.clone());
        if with_roles {
            row.push(key.role.map(|r| r.as_str().to_string()).unwrap_or_default());
        }
        for j in 0..table.n_signatures() {
            row.push(table.proportions[(i, j)].to_string());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read an exposure table written by [`write_exposure_tsv`].
pub fn read_exposure_tsv<P: AsRef<Path>>(path: P) -> Result<ExposureTable> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    if headers.get(0) != Some(SAMPLE_COL) {
        bail!("{}: first column must be '{}'", path.display(), SAMPLE_COL);
    }
    let with_roles = headers.get(1) == Some(BRANCH_COL);
    let first_sig = if with_roles { 2 } else { 1 };
    let signatures: Vec<String> = headers.iter().skip(first_sig).map(|s| s.to_string()).collect();

    let mut keys = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.is_empty() {
            continue;
        }
        let label = record.get(0).unwrap_or("").to_string();
        let role = if with_roles {
            match record.get(1).map(str::trim) {
                Some("") | None => None,
                Some(raw) => Some(BranchRole::from_str(raw)?),
            }
        } else {
            None
        };
        let mut row = Vec::with_capacity(signatures.len());
        for i in first_sig..first_sig + signatures.len() {
            let raw = record
                .get(i)
                .ok_or_else(|| anyhow!("{}: row '{}' is missing column {}", path.display(), label, i))?;
            let val: f64 = raw.parse().map_err(|e| {
                anyhow!("Failed to parse proportion '{}' for {}: {}", raw, label, e)
            })?;
            row.push(val);
        }
        keys.push(GroupKey::new(label, role));
        rows.push(row);
    }

    let mut proportions = Array2::<f64>::zeros((keys.len(), signatures.len()));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, val) in row.into_iter().enumerate() {
            proportions[(i, j)] = val;
        }
    }

    Ok(ExposureTable {
        keys,
        signatures,
        proportions,
    })
}

/// Write per-signature p-values to TSV.
pub fn write_pvalues_tsv<P: AsRef<Path>>(path: P, pvalues: &[(String, f64)]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(["Signature", "p_value"])?;
    for (sig, p) in pvalues {
        wtr.write_record([sig.clone(), p.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
