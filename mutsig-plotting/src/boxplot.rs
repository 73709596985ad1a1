//! Faceted ancestral vs descendant boxplots for significant signatures

use crate::figure::{Figure, FigureKind};
use crate::themes::Theme;
use crate::BoxplotConfig;
use anyhow::Result;
use log::info;
use mutsig_core::{BranchRole, ExposureTable};
use mutsig_stats::signature_pvalues;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// One exposure value in long form
#[derive(Debug, Clone, PartialEq)]
pub struct ExposurePoint {
    pub group: String,
    pub signature: String,
    pub proportion: f64,
    pub is_ancestral: bool,
    pub branch: BranchRole,
}

/// Five-number summary drawn as one box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
}

impl BoxStats {
    /// Quartiles by linear interpolation; whiskers reach the most extreme
    /// values within 1.5 IQR of the box.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|&v| v >= lo_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= hi_fence)
            .unwrap_or(q3);

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// p-values in scientific notation with one decimal, e.g. `1.2e-05`
pub fn format_scientific(p: f64) -> String {
    if p == 0.0 || !p.is_finite() {
        return format!("{:.1e}", p);
    }
    let exponent = p.abs().log10().floor() as i32;
    let mut mantissa = p / 10f64.powi(exponent);
    let mut exponent = exponent;
    // rounding can carry 9.96 up to 10.0
    if (mantissa.abs() * 10.0).round() >= 100.0 {
        mantissa /= 10.0;
        exponent += 1;
    }
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{:.1}e{}{:02}", mantissa, sign, exponent.abs())
}

fn signature_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Keep signatures with p strictly below `threshold`, in numeric id order
pub fn select_signatures(pvalues: &[(String, f64)], threshold: f64) -> Vec<(String, f64)> {
    let mut kept: Vec<(String, f64)> = pvalues
        .iter()
        .filter(|(_, p)| *p < threshold)
        .cloned()
        .collect();
    kept.sort_by(|a, b| signature_order(&a.0, &b.0));
    kept
}

/// Long-form exposures of the given signatures. Groups without a branch role
/// are skipped.
pub fn to_long_form(table: &ExposureTable, signatures: &[String]) -> Vec<ExposurePoint> {
    let mut points = Vec::new();
    for sig in signatures {
        let Some(j) = table.signature_index(sig) else {
            continue;
        };
        for (key, &v) in table.keys.iter().zip(table.column(j).iter()) {
            if let Some(role) = key.role {
                points.push(ExposurePoint {
                    group: key.label.clone(),
                    signature: sig.clone(),
                    proportion: v,
                    is_ancestral: role.is_ancestral(),
                    branch: role,
                });
            }
        }
    }
    points
}

pub(crate) struct Panel {
    signature: String,
    p_value: f64,
    ancestral: Vec<f64>,
    descendant: Vec<f64>,
}

pub(crate) struct BoxplotData {
    pub(crate) panels: Vec<Panel>,
    n_ancestral: usize,
    n_descendant: usize,
    col_wrap: usize,
    panel_width: u32,
    panel_height: u32,
    jitter: f64,
    seed: u64,
    theme: Theme,
}

/// Boxplots with jittered points of ancestral vs descendant exposures, one
/// panel per signature whose test p-value is below the threshold.
///
/// An empty table or no significant signature gives an empty figure.
pub fn plot_signature_boxplots(table: &ExposureTable, config: &BoxplotConfig) -> Result<Figure> {
    let col_wrap = config.col_wrap.max(1);
    if table.is_empty() {
        info!("Skipping boxplots: no groups");
        return Ok(Figure::empty(
            config.panel_width,
            config.panel_height,
            config.theme.background,
        ));
    }

    let pvalues = signature_pvalues(table)?;
    let kept = select_signatures(&pvalues, config.pvalue_threshold);
    info!(
        "{} of {} signatures below p = {}",
        kept.len(),
        pvalues.len(),
        config.pvalue_threshold
    );
    if kept.is_empty() {
        return Ok(Figure::empty(
            config.panel_width,
            config.panel_height,
            config.theme.background,
        ));
    }

    let ids: Vec<String> = kept.iter().map(|(s, _)| s.clone()).collect();
    let long = to_long_form(table, &ids);

    let mut ancestral_groups = BTreeSet::new();
    let mut descendant_groups = BTreeSet::new();
    for point in &long {
        if point.is_ancestral {
            ancestral_groups.insert(point.group.as_str());
        } else {
            descendant_groups.insert(point.group.as_str());
        }
    }

    let panels: Vec<Panel> = kept
        .iter()
        .map(|(sig, p)| {
            let (ancestral, descendant): (Vec<&ExposurePoint>, Vec<&ExposurePoint>) = long
                .iter()
                .filter(|pt| &pt.signature == sig)
                .partition(|pt| pt.is_ancestral);
            Panel {
                signature: sig.clone(),
                p_value: *p,
                ancestral: ancestral.iter().map(|pt| pt.proportion).collect(),
                descendant: descendant.iter().map(|pt| pt.proportion).collect(),
            }
        })
        .collect();

    let n_cols = col_wrap.min(panels.len());
    let n_rows = (panels.len() + col_wrap - 1) / col_wrap;
    let width = config.panel_width * n_cols as u32;
    let height = config.panel_height * n_rows as u32;

    let data = BoxplotData {
        panels,
        n_ancestral: ancestral_groups.len(),
        n_descendant: descendant_groups.len(),
        col_wrap,
        panel_width: config.panel_width,
        panel_height: config.panel_height,
        jitter: config.jitter,
        seed: config.seed,
        theme: config.theme.clone(),
    };
    Ok(Figure::new(width, height, FigureKind::Boxplots(data)))
}

pub(crate) fn draw_boxplots_impl<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    data: &BoxplotData,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let theme = &data.theme;
    root.fill(&theme.background)?;

    let mut rng = StdRng::seed_from_u64(data.seed);
    let class_labels = [
        (BranchRole::Ancestral, data.n_ancestral),
        (BranchRole::Descendant, data.n_descendant),
    ];

    for (i, panel) in data.panels.iter().enumerate() {
        let col = (i % data.col_wrap) as i32;
        let row = (i / data.col_wrap) as i32;
        let x0 = col * data.panel_width as i32;
        let y0 = row * data.panel_height as i32;
        let area = root
            .clone()
            .shrink((x0, y0), (data.panel_width as i32, data.panel_height as i32));
        let title_font = ("sans-serif", 14).into_font().color(&theme.text);
        let area = area.titled(&format!("Signature {}", panel.signature), title_font.clone())?;
        let area = area.titled(
            &format!("(p = {})", format_scientific(panel.p_value)),
            title_font,
        )?;

        let y_max = panel
            .ancestral
            .iter()
            .chain(panel.descendant.iter())
            .copied()
            .fold(0.0_f64, f64::max);
        let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&area)
            .margin(8)
            .x_label_area_size(36)
            .y_label_area_size(44)
            .build_cartesian_2d(-0.5..1.5, 0.0..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(0)
            .y_labels(5)
            .y_desc("Proportion")
            .y_label_formatter(&|v| format!("{:.2}", v))
            .y_label_style(("sans-serif", 11).into_font().color(&theme.text))
            .axis_style(&theme.axis)
            .draw()?;

        for (cx, values) in [(0.0, &panel.ancestral), (1.0, &panel.descendant)] {
            if let Some(stats) = BoxStats::from_values(values) {
                draw_box(&mut chart, cx, &stats, theme)?;
            }
            chart.draw_series(values.iter().map(|&v| {
                let dx = if data.jitter > 0.0 {
                    rng.gen_range(-data.jitter..=data.jitter)
                } else {
                    0.0
                };
                Circle::new((cx + dx, v), 2, theme.point.filled())
            }))?;
        }

        let font = ("sans-serif", 11).into_font().color(&theme.text);
        for (cx, (role, n)) in [0.0, 1.0].into_iter().zip(class_labels.iter()) {
            let (px, py) = chart.backend_coord(&(cx, 0.0));
            root.draw(&Text::new(
                role.as_str(),
                (px, py + 6),
                font.clone().pos(Pos::new(HPos::Center, VPos::Top)),
            ))?;
            // class sizes are shared by every panel; show them once
            if i == 0 {
                root.draw(&Text::new(
                    format!("n={}", n),
                    (px, py + 19),
                    font.clone().pos(Pos::new(HPos::Center, VPos::Top)),
                ))?;
            }
        }
    }

    Ok(())
}

fn draw_box<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    cx: f64,
    stats: &BoxStats,
    theme: &Theme,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    const HALF: f64 = 0.3;
    let line = theme.box_line.stroke_width(1);

    chart.draw_series(std::iter::once(Rectangle::new(
        [(cx - HALF, stats.q1), (cx + HALF, stats.q3)],
        theme.box_fill.filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(cx - HALF, stats.q1), (cx + HALF, stats.q3)],
        line,
    )))?;

    let segments = [
        vec![(cx - HALF, stats.median), (cx + HALF, stats.median)],
        vec![(cx, stats.q3), (cx, stats.whisker_high)],
        vec![(cx, stats.q1), (cx, stats.whisker_low)],
        vec![(cx - HALF / 2.0, stats.whisker_high), (cx + HALF / 2.0, stats.whisker_high)],
        vec![(cx - HALF / 2.0, stats.whisker_low), (cx + HALF / 2.0, stats.whisker_low)],
    ];
    chart.draw_series(segments.into_iter().map(|seg| PathElement::new(seg, line)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mutsig_core::GroupKey;
    use ndarray::Array2;

    /// Signature "1" high on ancestral nodes, "2" uninformative, "10" high on
    /// descendants.
    fn node_table(n_patients: usize) -> ExposureTable {
        let mut keys = Vec::new();
        let mut rows = Vec::new();
        for p in 0..n_patients {
            let patient = format!("P{}", p);
            let wiggle = 0.01 * p as f64;
            keys.push(GroupKey::node(&patient, 0));
            rows.extend([0.8 - wiggle, 0.1, 0.1 + wiggle]);
            keys.push(GroupKey::node(&patient, 1));
            rows.extend([0.1 + wiggle, 0.1, 0.8 - wiggle]);
            keys.push(GroupKey::node(&patient, 2));
            rows.extend([0.15 - wiggle, 0.1, 0.75 + wiggle]);
        }
        let n = keys.len();
        ExposureTable {
            keys,
            signatures: vec!["10".into(), "2".into(), "1".into()],
            proportions: Array2::from_shape_vec((n, 3), rows)
                .unwrap()
                .select(ndarray::Axis(1), &[2, 1, 0]),
        }
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        let stats = BoxStats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_relative_eq!(stats.q1, 1.75);
        assert_relative_eq!(stats.median, 2.5);
        assert_relative_eq!(stats.q3, 3.25);
        assert_relative_eq!(stats.whisker_low, 1.0);
        assert_relative_eq!(stats.whisker_high, 4.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn whiskers_stop_at_fences() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_relative_eq!(stats.whisker_high, 4.0);
    }

    #[test]
    fn scientific_format() {
        assert_eq!(format_scientific(1.234e-5), "1.2e-05");
        assert_eq!(format_scientific(0.0032), "3.2e-03");
        assert_eq!(format_scientific(9.96e-4), "1.0e-03");
        assert_eq!(format_scientific(0.5), "5.0e-01");
    }

    #[test]
    fn selection_is_strict_and_numeric() {
        let pvalues = vec![
            ("10".to_string(), 0.001),
            ("2".to_string(), 0.01),
            ("1".to_string(), 0.0001),
            ("3".to_string(), 0.5),
        ];
        let kept = select_signatures(&pvalues, 0.01);
        let ids: Vec<&str> = kept.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(ids, vec!["1", "10"]);
    }

    #[test]
    fn long_form_flags_branches() {
        let table = node_table(2);
        let long = to_long_form(&table, &["1".to_string()]);
        assert_eq!(long.len(), 6);
        let ancestral: Vec<&ExposurePoint> = long.iter().filter(|p| p.is_ancestral).collect();
        assert_eq!(ancestral.len(), 2);
        assert!(ancestral.iter().all(|p| p.branch == BranchRole::Ancestral));
        assert!(ancestral.iter().all(|p| p.group.ends_with("_Node0")));
    }

    #[test]
    fn only_significant_signatures_get_panels() {
        let table = node_table(6);
        let fig = plot_signature_boxplots(&table, &BoxplotConfig::default()).unwrap();
        assert_eq!(fig.n_panels(), 2);

        let svg = fig.to_svg().unwrap();
        assert!(svg.contains("Signature 1"));
        assert!(svg.contains("Signature 10"));
        assert!(!svg.contains("Signature 2"));
        assert_eq!(svg.matches("Ancestral").count(), 2);
        assert_eq!(svg.matches("n=6").count(), 1);
        assert_eq!(svg.matches("n=12").count(), 1);
    }

    #[test]
    fn panels_wrap() {
        let table = node_table(6);
        let config = BoxplotConfig {
            col_wrap: 1,
            ..BoxplotConfig::default()
        };
        let fig = plot_signature_boxplots(&table, &config).unwrap();
        assert_eq!(
            fig.dimensions(),
            (config.panel_width, config.panel_height * 2)
        );
    }

    #[test]
    fn nothing_significant_gives_empty_figure() {
        let table = node_table(6);
        let config = BoxplotConfig {
            pvalue_threshold: 1e-12,
            ..BoxplotConfig::default()
        };
        let fig = plot_signature_boxplots(&table, &config).unwrap();
        assert!(fig.is_empty());
    }

    #[test]
    fn missing_class_is_an_error() {
        let table = ExposureTable {
            keys: vec![GroupKey::node("P1", 1), GroupKey::node("P2", 1)],
            signatures: vec!["1".into()],
            proportions: ndarray::array![[0.4], [0.6]],
        };
        assert!(plot_signature_boxplots(&table, &BoxplotConfig::default()).is_err());
    }

    #[test]
    fn empty_table_gives_empty_figure() {
        let table = ExposureTable::empty(vec!["1".into()]);
        let fig = plot_signature_boxplots(&table, &BoxplotConfig::default()).unwrap();
        assert!(fig.is_empty());
    }
}
