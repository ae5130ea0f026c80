use std::collections::HashSet;

use serde::Serialize;

use crate::data::filter::FilteredView;

/// Headline metrics for one view.
///
/// Means are `None` when the view is empty ("not available"); they are never
/// NaN or infinite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub unique_customers: usize,
    pub avg_purchase_value: Option<f64>,
    pub avg_satisfaction: Option<f64>,
}

pub fn compute_kpis(view: &FilteredView<'_>) -> Kpis {
    let total_revenue: f64 = view.iter().map(|r| r.purchase_amount).sum();
    let satisfaction: f64 = view.iter().map(|r| r.customer_satisfaction).sum();
    let unique_customers = view
        .iter()
        .map(|r| &r.customer_id)
        .collect::<HashSet<_>>()
        .len();

    Kpis {
        total_revenue,
        unique_customers,
        avg_purchase_value: mean(total_revenue, view.len()),
        avg_satisfaction: mean(satisfaction, view.len()),
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    if count == 0 {
        return None;
    }
    Some(sum / count as f64).filter(|m| m.is_finite())
}
