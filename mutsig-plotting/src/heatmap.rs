//! Clustered heatmap of signature exposures

use crate::cluster::{average_linkage, Dendrogram};
use crate::figure::{Figure, FigureKind};
use crate::themes::Theme;
use crate::PlotConfig;
use anyhow::Result;
use log::{debug, info};
use mutsig_core::ExposureTable;
use ndarray::{Array2, Axis};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

/// Reordered exposures ready for rendering
pub(crate) struct HeatmapData {
    /// Group labels in display order (top to bottom)
    row_labels: Vec<String>,
    /// Signature labels in display order (left to right)
    col_labels: Vec<String>,
    /// shape: (rows, cols) in display order
    values: Array2<f64>,
    row_tree: Dendrogram,
    col_tree: Dendrogram,
    vmin: f64,
    vmax: f64,
    title: Option<String>,
    theme: Theme,
}

/// Cluster groups and signatures and lay the exposures out as a heatmap.
///
/// Tables with fewer than two groups cannot be clustered and give an empty
/// figure.
pub fn plot_signature_heatmap(table: &ExposureTable, config: &PlotConfig) -> Result<Figure> {
    if table.n_groups() < 2 || table.n_signatures() == 0 {
        info!(
            "Skipping heatmap: {} groups, {} signatures",
            table.n_groups(),
            table.n_signatures()
        );
        return Ok(Figure::empty(
            config.width,
            config.height,
            config.theme.background,
        ));
    }

    let row_tree = average_linkage(table.proportions.view());
    let col_tree = average_linkage(table.proportions.t());
    let row_order = row_tree.leaf_order();
    let col_order = col_tree.leaf_order();

    let values = table
        .proportions
        .select(Axis(0), &row_order)
        .select(Axis(1), &col_order);

    let (vmin, vmax) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    debug!(
        "Heatmap {}x{}, value range [{:.4}, {:.4}]",
        values.nrows(),
        values.ncols(),
        vmin,
        vmax
    );

    let data = HeatmapData {
        row_labels: row_order.iter().map(|&i| table.keys[i].label.clone()).collect(),
        col_labels: col_order.iter().map(|&j| table.signatures[j].clone()).collect(),
        values,
        row_tree,
        col_tree,
        vmin,
        vmax,
        title: config.title.clone(),
        theme: config.theme.clone(),
    };

    Ok(Figure::new(
        config.width,
        config.height,
        FigureKind::Heatmap(data),
    ))
}

impl HeatmapData {
    fn normalized(&self, v: f64) -> f64 {
        let span = self.vmax - self.vmin;
        if span > 0.0 {
            (v - self.vmin) / span
        } else {
            0.5
        }
    }
}

pub(crate) fn draw_heatmap_impl<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    data: &HeatmapData,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let theme = &data.theme;
    root.fill(&theme.background)?;

    let root = match &data.title {
        Some(title) => root.titled(title, ("sans-serif", 20).into_font().color(&theme.text))?,
        None => root.clone(),
    };

    let (w, h) = root.dim_in_pixel();
    let (w, h) = (w as i32, h as i32);
    let n_rows = data.values.nrows();
    let n_cols = data.values.ncols();

    // Fixed-size margins for dendrograms and labels
    let dendro_w = w / 7;
    let dendro_h = h / 7;
    let longest_row = data.row_labels.iter().map(|l| l.len()).max().unwrap_or(0) as i32;
    let label_w = (longest_row * 7 + 12).min(w / 3);
    let label_h = 24;

    let heat_w = (w - dendro_w - label_w).max(1);
    let heat_h = (h - dendro_h - label_h).max(1);

    let (left, rest) = root.split_horizontally(dendro_w);
    let (center, right) = rest.split_horizontally(heat_w);
    let (corner, left_rest) = left.split_vertically(dendro_h);
    let (row_dendro, _) = left_rest.split_vertically(heat_h);
    let (col_dendro, center_rest) = center.split_vertically(dendro_h);
    let (cells, col_label_area) = center_rest.split_vertically(heat_h);
    let (_, right_rest) = right.split_vertically(dendro_h);
    let (row_label_area, _) = right_rest.split_vertically(heat_h);

    // Cells: display row 0 at the top
    let mut chart = ChartBuilder::on(&cells)
        .build_cartesian_2d(0.0..n_cols as f64, 0.0..n_rows as f64)?;
    chart.draw_series(data.values.indexed_iter().map(|((r, c), &v)| {
        let top = (n_rows - r) as f64;
        Rectangle::new(
            [(c as f64, top - 1.0), (c as f64 + 1.0, top)],
            theme.colormap_at(data.normalized(v)).filled(),
        )
    }))?;

    let label_font = ("sans-serif", 12).into_font().color(&theme.text);

    // Group labels, horizontal, to the right of the cells
    let row_step = heat_h as f64 / n_rows as f64;
    for (r, label) in data.row_labels.iter().enumerate() {
        let y = ((r as f64 + 0.5) * row_step) as i32;
        row_label_area.draw(&Text::new(
            label.clone(),
            (6, y),
            label_font.clone().pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }

    // Signature labels below the cells
    let col_step = heat_w as f64 / n_cols as f64;
    for (c, label) in data.col_labels.iter().enumerate() {
        let x = ((c as f64 + 0.5) * col_step) as i32;
        col_label_area.draw(&Text::new(
            label.clone(),
            (x, 6),
            label_font.clone().pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }

    let link_style = theme.dendrogram.stroke_width(1);

    // Row dendrogram grows leftward from the cells
    let row_max = data.row_tree.max_height().max(f64::EPSILON) * 1.05;
    let mut chart = ChartBuilder::on(&row_dendro)
        .margin_left(4)
        .build_cartesian_2d(0.0..row_max, 0.0..n_rows as f64)?;
    chart.draw_series(data.row_tree.link_paths().into_iter().map(|path| {
        PathElement::new(
            path.iter()
                .map(|&(pos, height)| (row_max - height, n_rows as f64 - pos))
                .collect::<Vec<_>>(),
            link_style,
        )
    }))?;

    // Column dendrogram grows upward from the cells
    let col_max = data.col_tree.max_height().max(f64::EPSILON) * 1.05;
    let mut chart = ChartBuilder::on(&col_dendro)
        .margin_top(4)
        .build_cartesian_2d(0.0..n_cols as f64, 0.0..col_max)?;
    chart.draw_series(
        data.col_tree
            .link_paths()
            .into_iter()
            .map(|path| PathElement::new(path.to_vec(), link_style)),
    )?;

    draw_colorbar(&corner, data)?;

    Ok(())
}

fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    data: &HeatmapData,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    const STEPS: i32 = 32;
    let (_, h) = area.dim_in_pixel();
    let (x0, x1) = (8, 18);
    let (top, bottom) = (8, h as i32 - 8);
    if bottom - top < STEPS {
        return Ok(());
    }

    let step = (bottom - top) as f64 / STEPS as f64;
    for i in 0..STEPS {
        let y0 = top + (i as f64 * step) as i32;
        let y1 = top + ((i + 1) as f64 * step) as i32;
        let t = 1.0 - (i as f64 + 0.5) / STEPS as f64;
        area.draw(&Rectangle::new(
            [(x0, y0), (x1, y1)],
            data.theme.colormap_at(t).filled(),
        ))?;
    }

    let font = ("sans-serif", 10).into_font().color(&data.theme.text);
    area.draw(&Text::new(
        format!("{:.2}", data.vmax),
        (x1 + 4, top),
        font.clone().pos(Pos::new(HPos::Left, VPos::Top)),
    ))?;
    area.draw(&Text::new(
        format!("{:.2}", data.vmin),
        (x1 + 4, bottom),
        font.pos(Pos::new(HPos::Left, VPos::Bottom)),
    ))?;
    Ok(())
}
