use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use mutsig_cohort::CohortConfig;
use mutsig_plotting::{OutputFormat, Theme};
use std::path::Path;

/// mutsig: mutational signature exposures across a tumor cohort
#[derive(Parser, Debug)]
#[command(
    name = "mutsig",
    version,
    about = "mutsig: fit COSMIC signatures per sample and per clone node, and compare ancestral vs descendant branches"
)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full cohort run: sample and node exposures, heatmaps, branch boxplots
    Cohort {
        /// Signature probability table (TSV with Substitution Type, Trinucleotide, Signature N...)
        #[arg(long)]
        signatures: String,

        /// Per-sample SNV table (CSV or TSV)
        #[arg(long)]
        snvs: String,

        /// Per-node SNV table (CSV or TSV)
        #[arg(long)]
        snv_nodes: String,

        /// Output directory for tables and figures
        #[arg(long, default_value = ".")]
        out_dir: String,

        /// Figure format (svg, png)
        #[arg(long, default_value = "svg")]
        format: String,

        /// Groups need more than this many variants to be fitted
        #[arg(long, default_value_t = 100)]
        min_variants: u64,

        /// Maximum inference iterations per group
        #[arg(long, default_value_t = 1000)]
        max_iter: usize,

        /// Show signatures with p-value below this in the boxplots
        #[arg(long, default_value_t = 0.01)]
        pvalue_threshold: f64,

        /// Boxplot panels per row
        #[arg(long, default_value_t = 5)]
        col_wrap: usize,

        /// Color theme (classic, viridis, dark, high_contrast)
        #[arg(long, default_value = "classic")]
        theme: String,
    },

    /// Per-sample exposures only
    Fit {
        /// Signature probability table (TSV)
        #[arg(long)]
        signatures: String,

        /// Per-sample SNV table (CSV or TSV)
        #[arg(long)]
        snvs: String,

        /// Groups need more than this many variants to be fitted
        #[arg(long, default_value_t = 100)]
        min_variants: u64,

        /// Maximum inference iterations per group
        #[arg(long, default_value_t = 1000)]
        max_iter: usize,

        /// Optional clustered heatmap path (.svg or .png)
        #[arg(long)]
        heatmap: Option<String>,

        /// Color theme (classic, viridis, dark, high_contrast)
        #[arg(long, default_value = "classic")]
        theme: String,

        /// Output exposure TSV
        #[arg(long)]
        out: String,
    },

    /// Ancestral vs descendant Mann-Whitney test on a node exposure table
    Test {
        /// Node exposure TSV with a Branch column (as written by `cohort`)
        #[arg(long)]
        exposures: String,

        /// Optional boxplot path (.svg or .png)
        #[arg(long)]
        boxplots: Option<String>,

        /// Show signatures with p-value below this in the boxplots
        #[arg(long, default_value_t = 0.01)]
        pvalue_threshold: f64,

        /// Color theme (classic, viridis, dark, high_contrast)
        #[arg(long, default_value = "classic")]
        theme: String,

        /// Output p-value TSV
        #[arg(long)]
        out: String,
    },
}

fn init_logging(level: &str) {
    let log_level = level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!(
            "Warning: Invalid log level '{}' provided. Defaulting to Info.",
            level
        );
        log::LevelFilter::Info
    });
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

fn parse_theme(name: &str) -> Theme {
    Theme::from_name(name).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    info!("Starting mutsig with args: {:?}", cli.command);

    match cli.command {
        Commands::Cohort {
            signatures,
            snvs,
            snv_nodes,
            out_dir,
            format,
            min_variants,
            max_iter,
            pvalue_threshold,
            col_wrap,
            theme,
        } => {
            let output_format = OutputFormat::from_extension(&format).unwrap_or_else(|| {
                eprintln!("Invalid format: {}. Use 'svg' or 'png'", format);
                std::process::exit(1);
            });
            let theme = parse_theme(&theme);

            let mut config = CohortConfig::default();
            config.fit.min_variants = min_variants;
            config.fit.max_iter = max_iter;
            config.heatmap.theme = theme.clone();
            config.boxplot.pvalue_threshold = pvalue_threshold;
            config.boxplot.col_wrap = col_wrap;
            config.boxplot.theme = theme;

            let written = mutsig_cohort::run_cohort(
                Path::new(&signatures),
                Path::new(&snvs),
                Path::new(&snv_nodes),
                Path::new(&out_dir),
                output_format,
                &config,
            )?;
            info!("Wrote {} files to {}", written.len(), out_dir);
        }
        Commands::Fit {
            signatures,
            snvs,
            min_variants,
            max_iter,
            heatmap,
            theme,
            out,
        } => {
            let mut config = CohortConfig::default();
            config.fit = mutsig_fit::FitConfig {
                min_variants,
                max_iter,
                ..mutsig_fit::FitConfig::default()
            };
            config.heatmap.theme = parse_theme(&theme);

            mutsig_cohort::run_sample_fit(
                Path::new(&signatures),
                Path::new(&snvs),
                Path::new(&out),
                heatmap.as_deref().map(Path::new),
                &config,
            )?;
        }
        Commands::Test {
            exposures,
            boxplots,
            pvalue_threshold,
            theme,
            out,
        } => {
            let config = mutsig_plotting::BoxplotConfig {
                pvalue_threshold,
                theme: parse_theme(&theme),
                ..mutsig_plotting::BoxplotConfig::default()
            };
            mutsig_cohort::run_branch_test(
                Path::new(&exposures),
                Path::new(&out),
                boxplots.as_deref().map(Path::new),
                &config,
            )?;
        }
    }

    Ok(())
}
