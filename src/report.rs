use std::collections::BTreeSet;
use std::fmt;

use crate::analytics::kpi::Kpis;
use crate::analytics::summary::Dashboard;
use crate::color::SegmentPalette;

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

const NOT_AVAILABLE: &str = "N/A";

/// `1234567.891` with 0 decimals → `1,234,568`.
fn thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn currency(value: f64, decimals: usize) -> String {
    format!("${}", thousands(value, decimals))
}

fn optional(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

// ---------------------------------------------------------------------------
// Text report
// ---------------------------------------------------------------------------

/// Metric tiles as (title, value) pairs.
pub fn kpi_tiles(kpis: &Kpis) -> [(&'static str, String); 4] {
    [
        ("Total Revenue", currency(kpis.total_revenue, 0)),
        ("Unique Customers", kpis.unique_customers.to_string()),
        (
            "Avg Purchase Value",
            optional(kpis.avg_purchase_value, |v| currency(v, 2)),
        ),
        (
            "Avg Satisfaction",
            optional(kpis.avg_satisfaction, |v| format!("{v:.2}")),
        ),
    ]
}

/// Plain-text rendering of a dashboard, one section per chart.
pub struct TextReport<'a> {
    pub dashboard: &'a Dashboard,
    pub rows_total: usize,
    pub palette: &'a SegmentPalette,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dash = self.dashboard;
        writeln!(
            out,
            "{} of {} transactions selected",
            dash.rows_selected, self.rows_total
        )?;
        writeln!(out)?;
        for (title, value) in kpi_tiles(&dash.kpis) {
            writeln!(out, "{title:<20} {value:>16}")?;
        }

        section(out, "Revenue by Customer Segment")?;
        for row in &dash.revenue_by_segment {
            writeln!(
                out,
                "  {:<24} {:>16}  {}",
                row.label,
                currency(row.revenue, 2),
                self.palette.color_for(&row.label)
            )?;
        }

        section(out, "Revenue Trend Over Time")?;
        for row in &dash.revenue_trend {
            writeln!(
                out,
                "  {}  {:<16} {:>16}",
                row.date.format("%Y-%m-%d %H:%M"),
                row.label,
                currency(row.revenue, 2)
            )?;
        }

        section(out, "Revenue by Product Category")?;
        for row in &dash.revenue_by_category {
            writeln!(out, "  {:<24} {:>16}", row.category, currency(row.revenue, 2))?;
        }

        section(out, "Decline Segment Revenue")?;
        if dash.decline_trend.is_empty() {
            writeln!(out, "  (no Decline transactions selected)")?;
        }
        for row in &dash.decline_trend {
            writeln!(
                out,
                "  {}  {:>16}",
                row.date.format("%Y-%m-%d %H:%M"),
                currency(row.revenue, 2)
            )?;
        }

        section(out, "Satisfaction vs Purchase")?;
        writeln!(out, "  {} points", dash.satisfaction_vs_purchase.len())?;

        section(out, "Segment Colours")?;
        for (label, color) in self.palette.legend_entries() {
            writeln!(out, "  {label:<24} {color}")?;
        }
        Ok(())
    }
}

fn section(out: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(title.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilteredView;

    #[test]
    fn groups_thousands() {
        assert_eq!(currency(1_234_567.891, 0), "$1,234,568");
        assert_eq!(currency(999.5, 2), "$999.50");
        assert_eq!(currency(0.0, 0), "$0");
        assert_eq!(thousands(-1500.0, 0), "-1,500");
        assert_eq!(thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn empty_view_renders_not_available() {
        let dash = Dashboard::compute(&FilteredView::default());
        let tiles = kpi_tiles(&dash.kpis);
        assert_eq!(tiles[0].1, "$0");
        assert_eq!(tiles[2].1, NOT_AVAILABLE);
        assert_eq!(tiles[3].1, NOT_AVAILABLE);

        let palette = SegmentPalette::new(&BTreeSet::new());
        let text = TextReport { dashboard: &dash, rows_total: 10, palette: &palette }.to_string();
        assert!(text.starts_with("0 of 10 transactions selected"));
        assert!(text.contains("(no Decline transactions selected)"));
    }

    #[test]
    fn legend_lists_every_segment() {
        let labels: BTreeSet<String> =
            ["Decline", "Growth"].iter().map(|s| s.to_string()).collect();
        let palette = SegmentPalette::new(&labels);
        let dash = Dashboard::compute(&FilteredView::default());
        let text = TextReport { dashboard: &dash, rows_total: 0, palette: &palette }.to_string();

        let legend = text.split("Segment Colours").nth(1).unwrap();
        assert!(legend.contains(&format!("Decline{}", " ".repeat(17))));
        assert!(legend.contains(palette.color_for("Growth")));
    }
}
