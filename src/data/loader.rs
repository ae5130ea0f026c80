use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use calamine::{RangeDeserializerBuilder, Reader, open_workbook_auto};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{CustomerId, Dimension, TransactionDataset, TransactionRecord};
use crate::error::InvalidInputError;

const CUSTOMER_ID: &str = "CustomerID";
const TRANSACTION_DATE: &str = "TransactionDate";
const PURCHASE_AMOUNT: &str = "PurchaseAmount";
const CUSTOMER_SATISFACTION: &str = "CustomerSatisfaction";
const LABEL: &str = Dimension::Segment.column();
const CUSTOMER_REGION: &str = Dimension::Region.column();
const PRODUCT_CATEGORY: &str = Dimension::Category.column();
const RETAIL_CHANNEL: &str = Dimension::Channel.column();

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transactions table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per transaction (recommended)
/// * `.json`    – `[{ "CustomerID": 17, "TransactionDate": "2024-01-05", ... }, ...]`
/// * `.csv`     – header row with the same column names
/// * `.xlsx`    – first worksheet, header row with the same column names
///
/// Columns other than the eight transaction columns are ignored. Any row
/// that does not type-check fails the whole load.
pub fn load_file(path: &Path) -> Result<TransactionDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => load_excel(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::debug!("parsed {} transactions from {}", records.len(), path.display());
    Ok(TransactionDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Row-oriented formats (CSV, JSON, Excel)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    /// Excel stores every number as a float.
    Float(f64),
    Text(String),
}

/// A `TransactionDate` cell as found in one source format.
trait DateCell {
    fn to_datetime(self) -> Option<NaiveDateTime>;
}

/// CSV cells are always text; a bare number is not a date.
impl DateCell for String {
    fn to_datetime(self) -> Option<NaiveDateTime> {
        parse_datetime(&self)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonDate {
    /// Epoch milliseconds, as written by `DataFrame.to_json()`.
    Millis(i64),
    Text(String),
}

impl DateCell for JsonDate {
    fn to_datetime(self) -> Option<NaiveDateTime> {
        match self {
            JsonDate::Millis(ms) => timestamp_ms_to_datetime(ms),
            JsonDate::Text(s) => parse_datetime(&s),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExcelDate {
    /// Date-formatted cell: days since 1899-12-30, fraction is time of day.
    Serial(f64),
    Text(String),
}

impl DateCell for ExcelDate {
    fn to_datetime(self) -> Option<NaiveDateTime> {
        match self {
            ExcelDate::Serial(days) => excel_serial_to_datetime(days),
            ExcelDate::Text(s) => parse_datetime(&s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRow<D> {
    #[serde(rename = "CustomerID")]
    customer_id: RawId,
    #[serde(rename = "TransactionDate")]
    transaction_date: D,
    #[serde(rename = "PurchaseAmount")]
    purchase_amount: f64,
    #[serde(rename = "CustomerSatisfaction")]
    customer_satisfaction: f64,
    label: String,
    #[serde(rename = "CustomerRegion")]
    customer_region: String,
    #[serde(rename = "ProductCategory")]
    product_category: String,
    #[serde(rename = "RetailChannel")]
    retail_channel: String,
}

impl<D: DateCell> RawRow<D> {
    fn into_record(self, row: usize) -> Result<TransactionRecord, InvalidInputError> {
        let customer_id = match self.customer_id {
            RawId::Int(i) => CustomerId::from(i),
            RawId::Float(f) if f.is_finite() && f.fract() == 0.0 => CustomerId::from(f as i64),
            RawId::Float(f) => CustomerId(f.to_string()),
            RawId::Text(s) => CustomerId(s),
        };
        let transaction_date = self
            .transaction_date
            .to_datetime()
            .ok_or_else(|| invalid(row, TRANSACTION_DATE, "unparseable date"))?;

        let record = TransactionRecord {
            customer_id,
            transaction_date,
            purchase_amount: self.purchase_amount,
            customer_satisfaction: self.customer_satisfaction,
            label: self.label,
            customer_region: self.customer_region,
            product_category: self.product_category,
            retail_channel: self.retail_channel,
        };
        validated(record, row)
    }
}

/// JSON layout, records-oriented (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "CustomerID": 1042,
///     "TransactionDate": "2024-01-05",
///     "PurchaseAmount": 129.9,
///     "CustomerSatisfaction": 4.0,
///     "label": "Growth",
///     "CustomerRegion": "North",
///     "ProductCategory": "Electronics",
///     "RetailChannel": "Online"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<TransactionRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let rows: Vec<RawRow<JsonDate>> =
        serde_json::from_str(&text).context("parsing JSON transactions")?;

    rows.into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_record(i).map_err(anyhow::Error::from))
        .collect()
}

/// CSV layout: header row with column names, one transaction per line.
/// Dates must be text (`2024-01-05`, `2024-01-05 14:30:00`, ...).
fn load_csv(path: &Path) -> Result<Vec<TransactionRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let mut records = Vec::new();

    for (row_no, result) in reader.deserialize::<RawRow<String>>().enumerate() {
        let raw = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(raw.into_record(row_no)?);
    }

    Ok(records)
}

/// Excel layout: first worksheet, header row with column names. Dates may be
/// date-formatted cells or text.
fn load_excel(path: &Path) -> Result<Vec<TransactionRecord>> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let rows = RangeDeserializerBuilder::with_deserialize_headers::<RawRow<ExcelDate>>()
        .from_range::<_, RawRow<ExcelDate>>(&range)
        .context("matching worksheet headers")?;

    let mut records = Vec::new();
    for (row_no, result) in rows.enumerate() {
        let raw = result.with_context(|| format!("worksheet row {row_no}"))?;
        records.push(raw.into_record(row_no)?);
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of transactions.
///
/// Column types accepted:
/// - `CustomerID`: Int32 / Int64 / UInt32 / UInt64 / Utf8
/// - `TransactionDate`: Date32 / Date64 / Timestamp(any unit) / Utf8
/// - `PurchaseAmount`, `CustomerSatisfaction`: any integer or float type
/// - categorical columns: Utf8 / LargeUtf8
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = records.len();
        let columns = BatchColumns::locate(&batch)?;

        for row in 0..batch.num_rows() {
            let row_no = offset + row;
            let record = TransactionRecord {
                customer_id: extract_customer_id(columns.customer_id, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{CUSTOMER_ID}'"))?,
                transaction_date: extract_datetime(columns.transaction_date, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{TRANSACTION_DATE}'"))?,
                purchase_amount: extract_f64(columns.purchase_amount, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{PURCHASE_AMOUNT}'"))?,
                customer_satisfaction: extract_f64(columns.customer_satisfaction, row)
                    .with_context(|| {
                        format!("Row {row_no}: failed to read '{CUSTOMER_SATISFACTION}'")
                    })?,
                label: extract_string(columns.label, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{LABEL}'"))?,
                customer_region: extract_string(columns.customer_region, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{CUSTOMER_REGION}'"))?,
                product_category: extract_string(columns.product_category, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{PRODUCT_CATEGORY}'"))?,
                retail_channel: extract_string(columns.retail_channel, row)
                    .with_context(|| format!("Row {row_no}: failed to read '{RETAIL_CHANNEL}'"))?,
            };
            records.push(validated(record, row_no)?);
        }
    }

    Ok(records)
}

/// The eight transaction columns of one record batch.
struct BatchColumns<'a> {
    customer_id: &'a Arc<dyn Array>,
    transaction_date: &'a Arc<dyn Array>,
    purchase_amount: &'a Arc<dyn Array>,
    customer_satisfaction: &'a Arc<dyn Array>,
    label: &'a Arc<dyn Array>,
    customer_region: &'a Arc<dyn Array>,
    product_category: &'a Arc<dyn Array>,
    retail_channel: &'a Arc<dyn Array>,
}

impl<'a> BatchColumns<'a> {
    fn locate(batch: &'a RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let column = move |name: &str| -> Result<&'a Arc<dyn Array>> {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            Ok(batch.column(idx))
        };

        Ok(BatchColumns {
            customer_id: column(CUSTOMER_ID)?,
            transaction_date: column(TRANSACTION_DATE)?,
            purchase_amount: column(PURCHASE_AMOUNT)?,
            customer_satisfaction: column(CUSTOMER_SATISFACTION)?,
            label: column(LABEL)?,
            customer_region: column(CUSTOMER_REGION)?,
            product_category: column(PRODUCT_CATEGORY)?,
            retail_channel: column(RETAIL_CHANNEL)?,
        })
    }
}

// -- Parquet / Arrow helpers --

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected a string column, got {other:?}"),
    }
}

fn extract_customer_id(col: &Arc<dyn Array>, row: usize) -> Result<CustomerId> {
    if col.is_null(row) {
        bail!("null value");
    }
    let id = match col.data_type() {
        DataType::Int32 => CustomerId::from(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CustomerId::from(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt32 => CustomerId(col.as_primitive::<UInt32Type>().value(row).to_string()),
        DataType::UInt64 => CustomerId(col.as_primitive::<UInt64Type>().value(row).to_string()),
        _ => CustomerId(extract_string(col, row)?),
    };
    Ok(id)
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value");
    }
    let value = match col.data_type() {
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        DataType::UInt64 => col.as_primitive::<UInt64Type>().value(row) as f64,
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(value)
}

fn extract_datetime(col: &Arc<dyn Array>, row: usize) -> Result<NaiveDateTime> {
    if col.is_null(row) {
        bail!("null value");
    }
    let parsed = match col.data_type() {
        DataType::Date32 => date32_to_datetime(col.as_primitive::<Date32Type>().value(row)),
        DataType::Date64 => date64_to_datetime(col.as_primitive::<Date64Type>().value(row)),
        DataType::Timestamp(unit, _) => {
            match unit {
                TimeUnit::Second => {
                    timestamp_s_to_datetime(col.as_primitive::<TimestampSecondType>().value(row))
                }
                TimeUnit::Millisecond => timestamp_ms_to_datetime(
                    col.as_primitive::<TimestampMillisecondType>().value(row),
                ),
                TimeUnit::Microsecond => timestamp_us_to_datetime(
                    col.as_primitive::<TimestampMicrosecondType>().value(row),
                ),
                TimeUnit::Nanosecond => timestamp_ns_to_datetime(
                    col.as_primitive::<TimestampNanosecondType>().value(row),
                ),
            }
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            parse_datetime(&extract_string(col, row)?)
        }
        other => bail!("Expected a date or timestamp column, got {other:?}"),
    };
    parsed.context("date out of range or unparseable")
}

// ---------------------------------------------------------------------------
// Shared parsing / validation
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse the textual date forms seen in exported transaction tables.
/// A bare date is taken as midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}

/// Excel serial day number to a timestamp, rounded to the millisecond.
fn excel_serial_to_datetime(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() || days < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let millis = (days * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

fn invalid(row: usize, column: &'static str, reason: impl Into<String>) -> InvalidInputError {
    InvalidInputError::InvalidValue {
        row,
        column,
        reason: reason.into(),
    }
}

/// Reject values the aggregation layer must never see.
fn validated(
    record: TransactionRecord,
    row: usize,
) -> Result<TransactionRecord, InvalidInputError> {
    let amount = record.purchase_amount;
    if !amount.is_finite() || amount < 0.0 {
        return Err(invalid(
            row,
            PURCHASE_AMOUNT,
            format!("expected a non-negative number, got {amount}"),
        ));
    }
    if !record.customer_satisfaction.is_finite() {
        return Err(invalid(row, CUSTOMER_SATISFACTION, "not a finite number"));
    }
    Ok(record)
}
