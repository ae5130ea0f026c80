use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

// ---------------------------------------------------------------------------
// CustomerId – identifier, not unique per record
// ---------------------------------------------------------------------------

/// Customer identifier. Source tables carry either integers or text, so the
/// value is normalised to its textual form on load.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        CustomerId(s.to_string())
    }
}

impl From<i64> for CustomerId {
    fn from(i: i64) -> Self {
        CustomerId(i.to_string())
    }
}

// ---------------------------------------------------------------------------
// Dimension – the four categorical filter axes
// ---------------------------------------------------------------------------

/// A categorical column that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Customer segment (`label`).
    Segment,
    /// `CustomerRegion`.
    Region,
    /// `ProductCategory`.
    Category,
    /// `RetailChannel`.
    Channel,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Segment,
        Dimension::Region,
        Dimension::Category,
        Dimension::Channel,
    ];

    /// Name of the source column backing this dimension.
    pub const fn column(self) -> &'static str {
        match self {
            Dimension::Segment => "label",
            Dimension::Region => "CustomerRegion",
            Dimension::Category => "ProductCategory",
            Dimension::Channel => "RetailChannel",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Segment => "segment",
            Dimension::Region => "region",
            Dimension::Category => "category",
            Dimension::Channel => "channel",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Dimension {
    type Err = InvalidInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "segment" | "label" => Ok(Dimension::Segment),
            "region" | "customerregion" => Ok(Dimension::Region),
            "category" | "productcategory" => Ok(Dimension::Category),
            "channel" | "retailchannel" => Ok(Dimension::Channel),
            _ => Err(InvalidInputError::UnknownDimension(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionRecord – one row of the source table
// ---------------------------------------------------------------------------

/// A single retail transaction. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub customer_id: CustomerId,
    pub transaction_date: NaiveDateTime,
    /// Non-negative purchase value.
    pub purchase_amount: f64,
    pub customer_satisfaction: f64,
    /// Customer segment.
    pub label: String,
    pub customer_region: String,
    pub product_category: String,
    pub retail_channel: String,
}

impl TransactionRecord {
    /// Value of a categorical dimension for this record.
    pub fn dimension_value(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Segment => &self.label,
            Dimension::Region => &self.customer_region,
            Dimension::Category => &self.product_category,
            Dimension::Channel => &self.retail_channel,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed per-dimension value sets and
/// date bounds.
#[derive(Debug, Clone, Default)]
pub struct TransactionDataset {
    /// All transactions, in source order.
    pub records: Vec<TransactionRecord>,
    /// For each dimension the sorted set of distinct values present.
    pub unique_values: BTreeMap<Dimension, BTreeSet<String>>,
    /// Earliest and latest `transaction_date`, `None` for an empty table.
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
}

impl TransactionDataset {
    /// Build the value indices from loaded records.
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let mut unique_values: BTreeMap<Dimension, BTreeSet<String>> =
            Dimension::ALL.iter().map(|d| (*d, BTreeSet::new())).collect();
        let mut date_range: Option<(NaiveDateTime, NaiveDateTime)> = None;

        for rec in &records {
            for dim in Dimension::ALL {
                unique_values
                    .entry(dim)
                    .or_default()
                    .insert(rec.dimension_value(dim).to_string());
            }
            let date = rec.transaction_date;
            date_range = Some(match date_range {
                None => (date, date),
                Some((lo, hi)) => (lo.min(date), hi.max(date)),
            });
        }

        TransactionDataset {
            records,
            unique_values,
            date_range,
        }
    }

    /// Distinct values of one dimension.
    pub fn values(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.unique_values.get(&dimension)
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
