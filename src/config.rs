use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filter::{FilterCriteria, parse_date};
use crate::data::model::Dimension;
use crate::error::InvalidInputError;

/// Filter selection read from a TOML file.
///
/// ```toml
/// segments = ["Decline", "At Risk"]
/// channels = ["Online"]
/// from = "2024-01-01"
/// to = "2024-03-31"
/// ```
///
/// Absent fields keep the dataset default (every value, full date span).
/// A present but empty list selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriteriaConfig {
    pub segments: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub channels: Option<Vec<String>>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl CriteriaConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading criteria file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Fields set in `other` replace the ones in `self`.
    pub fn merge(self, other: CriteriaConfig) -> Self {
        CriteriaConfig {
            segments: other.segments.or(self.segments),
            regions: other.regions.or(self.regions),
            categories: other.categories.or(self.categories),
            channels: other.channels.or(self.channels),
            from: other.from.or(self.from),
            to: other.to.or(self.to),
        }
    }

    fn values(&self, dimension: Dimension) -> Option<&Vec<String>> {
        match dimension {
            Dimension::Segment => self.segments.as_ref(),
            Dimension::Region => self.regions.as_ref(),
            Dimension::Category => self.categories.as_ref(),
            Dimension::Channel => self.channels.as_ref(),
        }
    }

    /// Narrow `base` (normally the dataset defaults) by the fields set here.
    pub fn apply(&self, mut base: FilterCriteria) -> Result<FilterCriteria, InvalidInputError> {
        for dim in Dimension::ALL {
            if let Some(values) = self.values(dim) {
                *base.allowed_mut(dim) = values.iter().cloned().collect();
            }
        }
        if let Some(from) = &self.from {
            base.set_start_date(parse_date("start", from)?);
        }
        if let Some(to) = &self.to {
            base.set_end_date(parse_date("end", to)?);
        }
        Ok(base)
    }
}
