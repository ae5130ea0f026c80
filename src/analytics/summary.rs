use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::kpi::{Kpis, compute_kpis};
use crate::data::filter::FilteredView;
use crate::data::model::TransactionRecord;

/// Segment whose daily revenue drives the early-warning chart.
pub const DECLINE_SEGMENT: &str = "Decline";

// ---------------------------------------------------------------------------
// Output rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRevenue {
    pub label: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDateTime,
    pub label: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDateTime,
    pub revenue: f64,
}

/// One unaggregated scatter point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub satisfaction: f64,
    pub purchase_amount: f64,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Sum `PurchaseAmount` per key. Each record lands in exactly one group and
/// each group accumulates in view order.
fn revenue_by<'a, K, F>(
    records: impl Iterator<Item = &'a TransactionRecord>,
    key: F,
) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&'a TransactionRecord) -> K,
{
    let mut groups = BTreeMap::new();
    for rec in records {
        *groups.entry(key(rec)).or_insert(0.0) += rec.purchase_amount;
    }
    groups
}

/// Revenue per customer segment present in the view, sorted by label.
pub fn revenue_by_segment(view: &FilteredView<'_>) -> Vec<SegmentRevenue> {
    revenue_by(view.iter(), |r| r.label.as_str())
        .into_iter()
        .map(|(label, revenue)| SegmentRevenue {
            label: label.to_string(),
            revenue,
        })
        .collect()
}

/// Revenue per (date, segment), sorted by date then label. Each pair
/// appears once.
pub fn revenue_trend(view: &FilteredView<'_>) -> Vec<TrendPoint> {
    revenue_by(view.iter(), |r| (r.transaction_date, r.label.as_str()))
        .into_iter()
        .map(|((date, label), revenue)| TrendPoint {
            date,
            label: label.to_string(),
            revenue,
        })
        .collect()
}

/// Revenue per product category, sorted by category.
pub fn revenue_by_category(view: &FilteredView<'_>) -> Vec<CategoryRevenue> {
    revenue_by(view.iter(), |r| r.product_category.as_str())
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue {
            category: category.to_string(),
            revenue,
        })
        .collect()
}

/// Daily revenue of the [`DECLINE_SEGMENT`] only, sorted by date.
pub fn decline_trend(view: &FilteredView<'_>) -> Vec<DailyRevenue> {
    revenue_by(
        view.iter().filter(|r| r.label == DECLINE_SEGMENT),
        |r| r.transaction_date,
    )
    .into_iter()
    .map(|(date, revenue)| DailyRevenue { date, revenue })
    .collect()
}

/// One point per record, in view order.
pub fn satisfaction_vs_purchase(view: &FilteredView<'_>) -> Vec<ScatterPoint> {
    view.iter()
        .map(|r| ScatterPoint {
            satisfaction: r.customer_satisfaction,
            purchase_amount: r.purchase_amount,
            label: r.label.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard: everything the presentation layer draws for one selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub rows_selected: usize,
    pub kpis: Kpis,
    pub revenue_by_segment: Vec<SegmentRevenue>,
    pub revenue_trend: Vec<TrendPoint>,
    pub revenue_by_category: Vec<CategoryRevenue>,
    pub decline_trend: Vec<DailyRevenue>,
    pub satisfaction_vs_purchase: Vec<ScatterPoint>,
}

impl Dashboard {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        Dashboard {
            rows_selected: view.len(),
            kpis: compute_kpis(view),
            revenue_by_segment: revenue_by_segment(view),
            revenue_trend: revenue_trend(view),
            revenue_by_category: revenue_by_category(view),
            decline_trend: decline_trend(view),
            satisfaction_vs_purchase: satisfaction_vs_purchase(view),
        }
    }
}
