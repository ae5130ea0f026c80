use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use nova_retail::analytics::summary::Dashboard;
use nova_retail::color::SegmentPalette;
use nova_retail::config::CriteriaConfig;
use nova_retail::data::model::Dimension;
use nova_retail::data::store::DatasetStore;
use nova_retail::error::InvalidInputError;
use nova_retail::report::TextReport;
use nova_retail::state::DashboardSession;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "nova-retail",
    about = "NovaRetail customer dashboard: filter transactions, print KPIs and chart series"
)]
struct Cli {
    /// Transactions file (.parquet, .json, .csv or .xlsx).
    dataset: PathBuf,

    /// TOML file with a saved selection (segments, regions, categories, channels, from, to).
    #[arg(long)]
    criteria: Option<PathBuf>,

    /// Customer segment to include (repeatable). Default: all.
    #[arg(long = "segment")]
    segments: Vec<String>,

    /// Region to include (repeatable). Default: all.
    #[arg(long = "region")]
    regions: Vec<String>,

    /// Product category to include (repeatable). Default: all.
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Retail channel to include (repeatable). Default: all.
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Drop one value after the selection is built, as DIMENSION=VALUE
    /// (repeatable), e.g. `--exclude channel=Store`.
    #[arg(long = "exclude", value_name = "DIMENSION=VALUE", value_parser = parse_exclusion)]
    exclusions: Vec<(Dimension, String)>,

    /// First day of the range (YYYY-MM-DD). Default: earliest transaction.
    #[arg(long)]
    from: Option<String>,

    /// Last day of the range, inclusive (YYYY-MM-DD). Default: latest transaction.
    #[arg(long)]
    to: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

impl Cli {
    /// Selection given on the command line; empty flag lists mean "not set".
    fn flag_criteria(&self) -> CriteriaConfig {
        let list = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());
        CriteriaConfig {
            segments: list(&self.segments),
            regions: list(&self.regions),
            categories: list(&self.categories),
            channels: list(&self.channels),
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}

/// `region=North` → `(Dimension::Region, "North")`.
fn parse_exclusion(arg: &str) -> Result<(Dimension, String), InvalidInputError> {
    let (dimension, value) = arg
        .split_once('=')
        .ok_or_else(|| InvalidInputError::UnknownDimension(arg.to_string()))?;
    Ok((dimension.parse()?, value.trim().to_string()))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a Path,
    rows_total: usize,
    #[serde(flatten)]
    dashboard: &'a Dashboard,
    segment_colors: &'a SegmentPalette,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = DatasetStore::open(&cli.dataset)?;
    let mut session = DashboardSession::new(store.dataset());

    let file_criteria = match &cli.criteria {
        Some(path) => CriteriaConfig::from_file(path)?,
        None => CriteriaConfig::default(),
    };
    let selection = file_criteria.merge(cli.flag_criteria());
    session.criteria = selection
        .apply(session.criteria.clone())
        .context("invalid filter selection")?;
    for (dimension, value) in &cli.exclusions {
        session.exclude_value(*dimension, value);
    }

    log::info!("Selection applied to {}", store.source().display());
    let dashboard = session.dashboard();
    let rows_total = session.dataset().len();

    match cli.format {
        Format::Text => {
            println!("Source: {}", store.source().display());
            print!(
                "{}",
                TextReport {
                    dashboard: &dashboard,
                    rows_total,
                    palette: &session.palette,
                }
            );
        }
        Format::Json => {
            let report = JsonReport {
                source: store.source(),
                rows_total,
                dashboard: &dashboard,
                segment_colors: &session.palette,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusions_parse_dimension_and_value() {
        assert_eq!(
            parse_exclusion("channel=Store").unwrap(),
            (Dimension::Channel, "Store".to_string())
        );
        assert_eq!(
            parse_exclusion("ProductCategory= Toys ").unwrap(),
            (Dimension::Category, "Toys".to_string())
        );
    }

    #[test]
    fn exclusions_reject_unknown_dimensions() {
        assert_eq!(
            parse_exclusion("colour=Red"),
            Err(InvalidInputError::UnknownDimension("colour".into()))
        );
        assert!(parse_exclusion("Store").is_err());
    }

    #[test]
    fn cli_collects_repeated_exclusions() {
        let cli = Cli::try_parse_from([
            "nova-retail",
            "tx.csv",
            "--exclude",
            "region=North",
            "--exclude",
            "segment=Decline",
        ])
        .unwrap();
        assert_eq!(cli.exclusions.len(), 2);
        assert_eq!(cli.exclusions[1].0, Dimension::Segment);
        assert!(Cli::try_parse_from(["nova-retail", "tx.csv", "--exclude", "x=1"]).is_err());
    }
}
