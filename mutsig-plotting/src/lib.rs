//! mutsig-plotting: figures for mutational signature exposures
//!
//! ## Features
//! - Clustered heatmaps (average linkage on groups and signatures) with
//!   dendrograms and a colorbar
//! - Faceted ancestral vs descendant boxplots for signatures whose
//!   Mann-Whitney p-value passes a threshold
//! - Figures are built in memory; render with [`Figure::to_svg`] or write
//!   with [`Figure::save`]
//! - PNG output (optional, requires `png` feature)
//!
//! ## Example
//! ```ignore
//! use mutsig_plotting::{plot_signature_heatmap, PlotConfig};
//!
//! let fig = plot_signature_heatmap(&exposures, &PlotConfig::default())?;
//! fig.save("samples_heatmap.svg")?;
//! ```

pub mod boxplot;
pub mod cluster;
pub mod figure;
pub mod heatmap;
pub mod output;
pub mod themes;

pub use boxplot::{format_scientific, plot_signature_boxplots, BoxStats, ExposurePoint};
pub use figure::Figure;
pub use heatmap::plot_signature_heatmap;
pub use output::OutputFormat;
pub use themes::Theme;

/// Configuration for heatmap appearance
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Plot width in pixels
    pub width: u32,
    /// Plot height in pixels
    pub height: u32,
    /// Plot title
    pub title: Option<String>,
    /// Color theme
    pub theme: Theme,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            title: None,
            theme: Theme::default(),
        }
    }
}

/// Configuration for the branch boxplot grid
#[derive(Debug, Clone)]
pub struct BoxplotConfig {
    /// Signatures are shown when their p-value is strictly below this
    pub pvalue_threshold: f64,
    /// Panels per row
    pub col_wrap: usize,
    /// Panel width in pixels
    pub panel_width: u32,
    /// Panel height in pixels
    pub panel_height: u32,
    /// Horizontal jitter of strip points (classes sit one unit apart)
    pub jitter: f64,
    /// Seed for the jitter
    pub seed: u64,
    /// Color theme
    pub theme: Theme,
}

impl Default for BoxplotConfig {
    fn default() -> Self {
        Self {
            pvalue_threshold: 0.01,
            col_wrap: 5,
            panel_width: 260,
            panel_height: 300,
            jitter: 0.15,
            seed: 0,
            theme: Theme::default(),
        }
    }
}
