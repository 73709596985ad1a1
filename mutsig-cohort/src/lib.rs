//! mutsig-cohort: cohort-wide mutational signature analysis.
//!
//! Ties the pipeline together: contexts are assigned to per-sample SNVs,
//! carried over to the clone-node SNVs, signatures are fitted per sample and
//! per node, and the node exposures are compared between ancestral and
//! descendant branches.
//!
//! ## Example
//! ```ignore
//! use mutsig_cohort::{plot_cohort_mutation_signatures, CohortConfig};
//!
//! let snvs = mutsig_io::load_snvs("snvs.csv")?;
//! let nodes = mutsig_io::load_snv_nodes("snv_nodes.csv")?;
//! let result = plot_cohort_mutation_signatures("signatures.tsv", &snvs, &nodes, &CohortConfig::default())?;
//! result.write_to_dir("out", OutputFormat::Svg)?;
//! ```

use anyhow::{bail, Context, Result};
use log::info;
use mutsig_core::{
    assign_contexts, transfer_contexts, ContextLookup, ExposureTable, SignatureBasis,
    SnvNodeRecord, SnvRecord,
};
use mutsig_fit::{fit_sample_signatures, FitConfig};
use mutsig_io::{
    load_signature_probabilities, load_snv_nodes, load_snvs, read_exposure_tsv,
    write_exposure_tsv, write_pvalues_tsv,
};
use mutsig_plotting::{
    plot_signature_boxplots, plot_signature_heatmap, BoxplotConfig, Figure, OutputFormat,
    PlotConfig,
};
use mutsig_stats::signature_pvalues;
use std::path::{Path, PathBuf};

/// Settings for a cohort run
#[derive(Debug, Clone, Default)]
pub struct CohortConfig {
    pub fit: FitConfig,
    pub heatmap: PlotConfig,
    pub boxplot: BoxplotConfig,
}

/// Everything a cohort run produces
pub struct CohortSignatures {
    /// Per-sample exposures, keyed `{patient}_{sample}`
    pub samples_table: ExposureTable,
    pub samples_heatmap: Figure,
    /// Per-node exposures, keyed `{patient}_Node{node}` with a branch role
    pub node_table: ExposureTable,
    pub node_heatmap: Figure,
    /// Ancestral vs descendant boxplots of significant signatures
    pub node_signature_boxplots: Figure,
}

impl CohortSignatures {
    /// Write both tables and all three figures into `dir`, creating it if
    /// needed. Returns the written paths.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P, format: OutputFormat) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let ext = format.extension();
        let samples_table = dir.join("samples_table.tsv");
        let samples_heatmap = dir.join(format!("samples_heatmap.{}", ext));
        let node_table = dir.join("node_table.tsv");
        let node_heatmap = dir.join(format!("node_heatmap.{}", ext));
        let boxplots = dir.join(format!("node_signature_boxplots.{}", ext));

        write_exposure_tsv(&samples_table, &self.samples_table)?;
        self.samples_heatmap.save(&samples_heatmap)?;
        write_exposure_tsv(&node_table, &self.node_table)?;
        self.node_heatmap.save(&node_heatmap)?;
        self.node_signature_boxplots.save(&boxplots)?;

        let written = vec![samples_table, samples_heatmap, node_table, node_heatmap, boxplots];
        for path in &written {
            info!("Wrote {}", path.display());
        }
        Ok(written)
    }
}

/// Full cohort analysis from a signature probability file and in-memory SNV
/// tables.
pub fn plot_cohort_mutation_signatures<P: AsRef<Path>>(
    sig_prob_path: P,
    snvs: &[SnvRecord],
    snv_nodes: &[SnvNodeRecord],
    config: &CohortConfig,
) -> Result<CohortSignatures> {
    let (lookup, basis) = load_signature_probabilities(sig_prob_path)?;
    cohort_signatures(&lookup, &basis, snvs, snv_nodes, config)
}

/// Cohort analysis against an already loaded basis.
pub fn cohort_signatures(
    lookup: &ContextLookup,
    basis: &SignatureBasis,
    snvs: &[SnvRecord],
    snv_nodes: &[SnvNodeRecord],
    config: &CohortConfig,
) -> Result<CohortSignatures> {
    let annotated = assign_contexts(snvs, lookup);

    let samples_table = fit_sample_signatures(
        annotated.iter().map(|a| (a.group_key(), a.context_index)),
        basis,
        &config.fit,
    )
    .context("fitting per-sample signatures")?;
    info!("Fitted {} samples", samples_table.n_groups());
    let samples_heatmap = plot_signature_heatmap(&samples_table, &config.heatmap)?;

    let node_snvs = transfer_contexts(snv_nodes, &annotated);
    let node_table = fit_sample_signatures(
        node_snvs.iter().map(|a| (a.group_key(), a.context_index)),
        basis,
        &config.fit,
    )
    .context("fitting per-node signatures")?;
    info!("Fitted {} nodes", node_table.n_groups());
    let node_heatmap = plot_signature_heatmap(&node_table, &config.heatmap)?;

    let node_signature_boxplots = plot_signature_boxplots(&node_table, &config.boxplot)
        .context("comparing ancestral and descendant nodes")?;

    Ok(CohortSignatures {
        samples_table,
        samples_heatmap,
        node_table,
        node_heatmap,
        node_signature_boxplots,
    })
}

/// Load all inputs from disk, run the cohort analysis, and write the
/// artifacts to `out_dir`.
pub fn run_cohort(
    sig_prob_path: &Path,
    snv_path: &Path,
    snv_node_path: &Path,
    out_dir: &Path,
    format: OutputFormat,
    config: &CohortConfig,
) -> Result<Vec<PathBuf>> {
    let snvs = load_snvs(snv_path)?;
    let snv_nodes = load_snv_nodes(snv_node_path)?;
    let result = plot_cohort_mutation_signatures(sig_prob_path, &snvs, &snv_nodes, config)?;
    result.write_to_dir(out_dir, format)
}

/// Fit per-sample exposures only and write them to `out`, optionally with a
/// clustered heatmap.
pub fn run_sample_fit(
    sig_prob_path: &Path,
    snv_path: &Path,
    out: &Path,
    heatmap_path: Option<&Path>,
    config: &CohortConfig,
) -> Result<()> {
    let (lookup, basis) = load_signature_probabilities(sig_prob_path)?;
    let snvs = load_snvs(snv_path)?;
    let annotated = assign_contexts(&snvs, &lookup);
    let table = fit_sample_signatures(
        annotated.iter().map(|a| (a.group_key(), a.context_index)),
        &basis,
        &config.fit,
    )?;
    write_exposure_tsv(out, &table)?;
    info!("Wrote {} sample exposures to {}", table.n_groups(), out.display());

    if let Some(path) = heatmap_path {
        plot_signature_heatmap(&table, &config.heatmap)?.save(path)?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

/// Test every signature of a node exposure table for an ancestral vs
/// descendant shift. Roles come from the table's Branch column.
pub fn run_branch_test(
    exposure_path: &Path,
    out: &Path,
    boxplot_path: Option<&Path>,
    config: &BoxplotConfig,
) -> Result<()> {
    let table = read_exposure_tsv(exposure_path)?;
    if !table.has_roles() {
        bail!(
            "{} has no Branch column; node exposures are required",
            exposure_path.display()
        );
    }
    let pvalues = signature_pvalues(&table)?;
    write_pvalues_tsv(out, &pvalues)?;
    info!("Wrote {} p-values to {}", pvalues.len(), out.display());

    if let Some(path) = boxplot_path {
        plot_signature_boxplots(&table, config)?.save(path)?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}
