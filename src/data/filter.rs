use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{Dimension, TransactionDataset, TransactionRecord};
use crate::error::InvalidInputError;

// ---------------------------------------------------------------------------
// FilterCriteria: allowed values per dimension plus an inclusive date window
// ---------------------------------------------------------------------------

/// One user selection. Built fresh per interaction and thrown away once the
/// view has been produced.
///
/// An empty allowed-set means nothing is selected for that dimension, so no
/// record can match.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub labels: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub channels: BTreeSet<String>,
    /// Inclusive lower bound.
    pub start: NaiveDateTime,
    /// Inclusive upper bound.
    pub end: NaiveDateTime,
}

impl FilterCriteria {
    /// Default criteria: every distinct value of every dimension and the
    /// dataset's full date span.
    pub fn for_dataset(dataset: &TransactionDataset) -> Self {
        let all = |dim: Dimension| dataset.values(dim).cloned().unwrap_or_default();
        let (start, end) = dataset
            .date_range
            .unwrap_or((NaiveDateTime::MIN, NaiveDateTime::MAX));

        FilterCriteria {
            labels: all(Dimension::Segment),
            regions: all(Dimension::Region),
            categories: all(Dimension::Category),
            channels: all(Dimension::Channel),
            start,
            end,
        }
    }

    /// Allowed values for a dimension.
    pub fn allowed(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Segment => &self.labels,
            Dimension::Region => &self.regions,
            Dimension::Category => &self.categories,
            Dimension::Channel => &self.channels,
        }
    }

    pub fn allowed_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Segment => &mut self.labels,
            Dimension::Region => &mut self.regions,
            Dimension::Category => &mut self.categories,
            Dimension::Channel => &mut self.channels,
        }
    }

    /// Replace the allowed set of a dimension.
    pub fn with_values<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.allowed_mut(dimension) = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the window from calendar dates. The end day is included in full,
    /// so a transaction at 18:30 on `end` still matches.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.set_start_date(start);
        self.set_end_date(end);
    }

    pub fn set_start_date(&mut self, start: NaiveDate) {
        self.start = start.and_time(NaiveTime::MIN);
    }

    pub fn set_end_date(&mut self, end: NaiveDate) {
        self.end = end_of_day(end);
    }

    /// Parse `YYYY-MM-DD` bounds and apply them.
    pub fn parse_date_range(&mut self, start: &str, end: &str) -> Result<(), InvalidInputError> {
        let start = parse_date("start", start)?;
        let end = parse_date("end", end)?;
        self.set_date_range(start, end);
        Ok(())
    }

    /// Whether `record` satisfies every constraint.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.labels.contains(&record.label)
            && self.regions.contains(&record.customer_region)
            && self.categories.contains(&record.product_category)
            && self.channels.contains(&record.retail_channel)
            && self.start <= record.transaction_date
            && record.transaction_date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` date coming from outside the pipeline.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, InvalidInputError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        InvalidInputError::InvalidDate {
            field,
            value: value.to_string(),
        }
    })
}

/// Last representable instant of `day`.
fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN) - Duration::nanoseconds(1))
        .unwrap_or(NaiveDateTime::MAX)
}

// ---------------------------------------------------------------------------
// FilteredView: matching records, input order preserved
// ---------------------------------------------------------------------------

/// The records of a dataset that satisfy one [`FilterCriteria`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a TransactionRecord>,
}

impl<'a> FilteredView<'a> {
    /// View over an explicit list of records, e.g. an unfiltered table.
    pub fn from_records(records: impl IntoIterator<Item = &'a TransactionRecord>) -> Self {
        FilteredView {
            records: records.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TransactionRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn records(&self) -> &[&'a TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reduce `records` to the ones matching `criteria`.
///
/// Pure and order-preserving. An empty allowed-set or an inverted date
/// window yields an empty view rather than an error.
pub fn apply_filters<'a>(
    records: &'a [TransactionRecord],
    criteria: &FilterCriteria,
) -> FilteredView<'a> {
    let nothing_selected = Dimension::ALL
        .iter()
        .any(|d| criteria.allowed(*d).is_empty());
    if nothing_selected || criteria.start > criteria.end {
        return FilteredView::default();
    }

    FilteredView {
        records: records.iter().filter(|rec| criteria.matches(rec)).collect(),
    }
}
