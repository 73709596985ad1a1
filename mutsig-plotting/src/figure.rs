//! In-memory figures that can be rendered to SVG or written to disk

use crate::boxplot::{draw_boxplots_impl, BoxplotData};
use crate::heatmap::{draw_heatmap_impl, HeatmapData};
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::RGBColor;
use std::path::Path;

pub(crate) enum FigureKind {
    Empty(RGBColor),
    Heatmap(HeatmapData),
    Boxplots(BoxplotData),
}

/// A rendered-on-demand plot
pub struct Figure {
    width: u32,
    height: u32,
    kind: FigureKind,
}

impl Figure {
    /// A blank canvas of the given size
    pub fn empty(width: u32, height: u32, background: RGBColor) -> Self {
        Self {
            width,
            height,
            kind: FigureKind::Empty(background),
        }
    }

    pub(crate) fn new(width: u32, height: u32, kind: FigureKind) -> Self {
        Self {
            width,
            height,
            kind,
        }
    }

    /// True for a blank canvas with nothing plotted
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, FigureKind::Empty(_))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of signature panels (boxplot figures only)
    pub fn n_panels(&self) -> usize {
        match &self.kind {
            FigureKind::Boxplots(data) => data.panels.len(),
            _ => 0,
        }
    }

    /// Render the figure to an SVG document
    pub fn to_svg(&self) -> Result<String> {
        let mut buf = String::new();
        {
            let root = SVGBackend::with_string(&mut buf, (self.width, self.height))
                .into_drawing_area();
            self.draw(&root).context("Failed to draw figure")?;
            root.present().context("Failed to finish SVG")?;
        }
        Ok(buf)
    }

    /// Write the figure to `path` (SVG or PNG based on extension)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match OutputFormat::from_path(path)? {
            OutputFormat::Svg => {
                let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
                self.draw(&root).context("Failed to draw figure")?;
                root.present()
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(())
            }
            #[cfg(feature = "png")]
            OutputFormat::Png => {
                let root =
                    BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
                self.draw(&root).context("Failed to draw figure")?;
                root.present()
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(())
            }
            #[cfg(not(feature = "png"))]
            OutputFormat::Png => {
                anyhow::bail!("PNG output requires the `png` feature")
            }
        }
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, plotters::coord::Shift>,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        match &self.kind {
            FigureKind::Empty(background) => root.fill(background),
            FigureKind::Heatmap(data) => draw_heatmap_impl(root, data),
            FigureKind::Boxplots(data) => draw_boxplots_impl(root, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_figure_renders() {
        let fig = Figure::empty(80, 50, RGBColor(255, 255, 255));
        assert!(fig.is_empty());
        assert_eq!(fig.dimensions(), (80, 50));
        let svg = fig.to_svg().unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn save_writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.svg");
        Figure::empty(40, 40, RGBColor(0, 0, 0)).save(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let fig = Figure::empty(40, 40, RGBColor(0, 0, 0));
        assert!(fig.save(dir.path().join("blank.pdf")).is_err());
    }
}
