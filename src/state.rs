use std::sync::Arc;

use chrono::NaiveDate;

use crate::analytics::summary::Dashboard;
use crate::color::SegmentPalette;
use crate::data::filter::{FilterCriteria, apply_filters};
use crate::data::model::{Dimension, TransactionDataset};

// ---------------------------------------------------------------------------
// Dashboard session
// ---------------------------------------------------------------------------

/// Selection state of one dashboard, independent of rendering.
///
/// Mirrors the sidebar controls: a multiselect per dimension plus a date
/// range. Nothing derived from the selection is cached; [`dashboard`]
/// recomputes the view and every summary on each call.
///
/// [`dashboard`]: DashboardSession::dashboard
pub struct DashboardSession {
    dataset: Arc<TransactionDataset>,

    /// Current selection.
    pub criteria: FilterCriteria,

    /// Segment colours, fixed over the full dataset.
    pub palette: SegmentPalette,
}

impl DashboardSession {
    /// Start with the default selection: everything.
    pub fn new(dataset: Arc<TransactionDataset>) -> Self {
        let criteria = FilterCriteria::for_dataset(&dataset);
        let palette = SegmentPalette::new(&criteria.labels);
        Self {
            dataset,
            criteria,
            palette,
        }
    }

    pub fn dataset(&self) -> &TransactionDataset {
        &self.dataset
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_value(&mut self, dimension: Dimension, value: &str) {
        let selected = self.criteria.allowed_mut(dimension);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        log::debug!("toggled {dimension}={value}; {} selected", selected.len());
    }

    /// Drop one value from a dimension's selection. Values that are not
    /// selected (or not in the dataset) are left alone.
    pub fn exclude_value(&mut self, dimension: Dimension, value: &str) {
        if self.criteria.allowed_mut(dimension).remove(value) {
            log::debug!("excluded {dimension}={value}");
        } else {
            log::warn!("{dimension}={value} is not selected; nothing to exclude");
        }
    }

    /// Select all values of a dimension present in the dataset.
    pub fn select_all(&mut self, dimension: Dimension) {
        if let Some(all_vals) = self.dataset.values(dimension) {
            *self.criteria.allowed_mut(dimension) = all_vals.clone();
        }
    }

    /// Deselect every value of a dimension.
    pub fn select_none(&mut self, dimension: Dimension) {
        self.criteria.allowed_mut(dimension).clear();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.criteria.set_date_range(start, end);
    }

    /// Back to the default selection.
    pub fn reset(&mut self) {
        self.criteria = FilterCriteria::for_dataset(&self.dataset);
    }

    /// Filter and aggregate for the current selection.
    pub fn dashboard(&self) -> Dashboard {
        let view = apply_filters(&self.dataset.records, &self.criteria);
        log::debug!(
            "{} of {} transactions selected",
            view.len(),
            self.dataset.len()
        );
        Dashboard::compute(&view)
    }
}
