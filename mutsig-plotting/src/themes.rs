//! Color themes for signature plots

use anyhow::{anyhow, Result};
use plotters::style::RGBColor;

/// Color theme for plots
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub background: RGBColor,
    /// Text color
    pub text: RGBColor,
    /// Axis color
    pub axis: RGBColor,
    /// Dendrogram line color
    pub dendrogram: RGBColor,
    /// Box fill in boxplots
    pub box_fill: RGBColor,
    /// Box outline, whiskers and median
    pub box_line: RGBColor,
    /// Jittered strip points
    pub point: RGBColor,
    /// Sequential colormap stops for the heatmap, low to high
    pub colormap: Vec<RGBColor>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Light background with a dark-to-light magenta heatmap ramp
    pub fn classic() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            text: RGBColor(0, 0, 0),
            axis: RGBColor(100, 100, 100),
            dendrogram: RGBColor(60, 60, 60),
            box_fill: RGBColor(191, 191, 191), // 0.75 gray
            box_line: RGBColor(64, 64, 64),
            point: RGBColor(0, 0, 0),
            colormap: vec![
                RGBColor(3, 5, 26),
                RGBColor(76, 29, 75),
                RGBColor(161, 26, 91),
                RGBColor(232, 63, 63),
                RGBColor(246, 156, 115),
                RGBColor(250, 235, 221),
            ],
        }
    }

    /// Perceptually uniform blue-green-yellow ramp
    pub fn viridis() -> Self {
        Self {
            colormap: vec![
                RGBColor(68, 1, 84),
                RGBColor(59, 82, 139),
                RGBColor(33, 145, 140),
                RGBColor(94, 201, 98),
                RGBColor(253, 231, 37),
            ],
            ..Self::classic()
        }
    }

    /// Dark theme for presentations
    pub fn dark() -> Self {
        Self {
            background: RGBColor(30, 30, 30),
            text: RGBColor(220, 220, 220),
            axis: RGBColor(150, 150, 150),
            dendrogram: RGBColor(200, 200, 200),
            box_fill: RGBColor(90, 90, 90),
            box_line: RGBColor(200, 200, 200),
            point: RGBColor(252, 141, 98),
            colormap: vec![
                RGBColor(30, 30, 30),
                RGBColor(102, 194, 165),
                RGBColor(255, 255, 179),
            ],
        }
    }

    /// High contrast grayscale theme for accessibility
    pub fn high_contrast() -> Self {
        Self {
            background: RGBColor(255, 255, 255),
            text: RGBColor(0, 0, 0),
            axis: RGBColor(0, 0, 0),
            dendrogram: RGBColor(0, 0, 0),
            box_fill: RGBColor(220, 220, 220),
            box_line: RGBColor(0, 0, 0),
            point: RGBColor(0, 0, 0),
            colormap: vec![RGBColor(255, 255, 255), RGBColor(0, 0, 0)],
        }
    }

    /// Look a theme up by name
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "classic" => Ok(Self::classic()),
            "viridis" => Ok(Self::viridis()),
            "dark" => Ok(Self::dark()),
            "high_contrast" => Ok(Self::high_contrast()),
            other => Err(anyhow!(
                "Unknown theme: {}. Use: classic, viridis, dark, or high_contrast",
                other
            )),
        }
    }

    /// Interpolate the colormap at `t` in [0, 1]
    pub fn colormap_at(&self, t: f64) -> RGBColor {
        let stops = &self.colormap;
        match stops.len() {
            0 => self.text,
            1 => stops[0],
            n => {
                let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
                let scaled = t * (n - 1) as f64;
                let lo = (scaled.floor() as usize).min(n - 2);
                let frac = scaled - lo as f64;
                let (a, b) = (stops[lo], stops[lo + 1]);
                let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
                RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colormap_hits_endpoints() {
        let theme = Theme::high_contrast();
        assert_eq!(theme.colormap_at(0.0), RGBColor(255, 255, 255));
        assert_eq!(theme.colormap_at(1.0), RGBColor(0, 0, 0));
        assert_eq!(theme.colormap_at(0.5), RGBColor(128, 128, 128));
        assert_eq!(theme.colormap_at(7.0), RGBColor(0, 0, 0));
    }

    #[test]
    fn theme_names() {
        assert!(Theme::from_name("Viridis").is_ok());
        assert!(Theme::from_name("rainbow").is_err());
    }
}
