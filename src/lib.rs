//! Filtering and aggregation core of the NovaRetail customer dashboard.
//!
//! ```text
//!  loader → TransactionDataset ─┐
//!                               ▼
//!   FilterCriteria ──► apply_filters ──► FilteredView ──► Dashboard
//!                                                        (KPIs + summaries)
//! ```

pub mod analytics;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod state;

pub use analytics::kpi::{Kpis, compute_kpis};
pub use analytics::summary::{
    DECLINE_SEGMENT, Dashboard, decline_trend, revenue_by_category, revenue_by_segment,
    revenue_trend, satisfaction_vs_purchase,
};
pub use data::filter::{FilterCriteria, FilteredView, apply_filters};
pub use data::model::{CustomerId, Dimension, TransactionDataset, TransactionRecord};
pub use error::InvalidInputError;
