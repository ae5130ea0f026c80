/// Aggregation layer: scalar KPIs and chart-ready summaries over a
/// [`FilteredView`](crate::data::filter::FilteredView).
///
/// Every function here is a pure function of the view. Grouped outputs are
/// keyed through `BTreeMap`, so they come back sorted by key, and each
/// group's sum accumulates in view order.
pub mod kpi;
pub mod summary;
