use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

const FALLBACK: &str = "#808080";

/// Generates `n` visually distinct `#rrggbb` colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            format!(
                "#{:02x}{:02x}{:02x}",
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Segment colours: label → hex colour
// ---------------------------------------------------------------------------

/// Maps every segment label of the full dataset to a colour, so a segment
/// keeps its colour no matter which others are filtered out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SegmentPalette {
    mapping: BTreeMap<String, String>,
}

impl SegmentPalette {
    pub fn new(labels: &BTreeSet<String>) -> Self {
        let mapping = labels
            .iter()
            .cloned()
            .zip(generate_palette(labels.len()))
            .collect();
        SegmentPalette { mapping }
    }

    /// Colour for `label`, gray for labels the palette was not built with.
    pub fn color_for(&self, label: &str) -> &str {
        self.mapping.get(label).map(String::as_str).unwrap_or(FALLBACK)
    }

    /// Legend entries (label → colour) in label order.
    pub fn legend_entries(&self) -> Vec<(&str, &str)> {
        self.mapping
            .iter()
            .map(|(l, c)| (l.as_str(), c.as_str()))
            .collect()
    }
}
