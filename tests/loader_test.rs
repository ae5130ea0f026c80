//! Integration tests for loading transaction tables from disk

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, Date32Array, Date64Array, Float64Array, Int64Array, StringArray,
    TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};
use nova_retail::data::loader::load_file;
use nova_retail::state::DashboardSession;
use nova_retail::{CustomerId, Dimension};
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{Format, Workbook};
use tempfile::NamedTempFile;

const HEADER: &str = concat!(
    "CustomerID,TransactionDate,PurchaseAmount,CustomerSatisfaction,",
    "label,CustomerRegion,ProductCategory,RetailChannel"
);

fn temp_with(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn csv_with(rows: &[&str]) -> NamedTempFile {
    temp_with(".csv", &format!("{HEADER}\n{}\n", rows.join("\n")))
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn test_load_csv() {
    let file = temp_with(
        ".csv",
        &format!(
            "{HEADER},Notes\n\
             101,2024-01-01,100,4,Decline,North,Books,Online,first\n\
             102,2024-01-01 14:30:00,50.5,5,Growth,South,Toys,Store,\n\
             101,2024-01-02,30,2,Decline,North,Books,Store,x\n"
        ),
    );

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.len(), 3);
    assert_eq!(ds.records[0].customer_id, CustomerId::from(101));
    assert_eq!(ds.records[1].transaction_date, at(2024, 1, 1, 14, 30));
    assert_eq!(ds.values(Dimension::Channel).unwrap().len(), 2);
}

#[test]
fn test_csv_three_row_dashboard() {
    let file = csv_with(&[
        "1,2024-01-01,100,4,Decline,North,Books,Online",
        "2,2024-01-01,50,5,Growth,South,Toys,Store",
        "1,2024-01-02,30,3,Decline,North,Books,Store",
    ]);
    let ds = load_file(file.path()).unwrap();
    let dash = DashboardSession::new(Arc::new(ds)).dashboard();

    assert_eq!(dash.kpis.total_revenue, 180.0);
    assert_eq!(dash.kpis.unique_customers, 2);
    assert_eq!(dash.kpis.avg_satisfaction, Some(4.0));

    let segments: Vec<_> = dash
        .revenue_by_segment
        .iter()
        .map(|s| (s.label.as_str(), s.revenue))
        .collect();
    assert_eq!(segments, vec![("Decline", 130.0), ("Growth", 50.0)]);

    // Only Decline rows count toward the decline series.
    let decline: Vec<_> = dash
        .decline_trend
        .iter()
        .map(|d| (d.date.date().to_string(), d.revenue))
        .collect();
    assert_eq!(
        decline,
        vec![("2024-01-01".to_string(), 100.0), ("2024-01-02".to_string(), 30.0)]
    );
}

#[test]
fn test_leading_zero_ids_are_read_as_numbers() {
    let file = csv_with(&[
        "007,2024-01-01,10,4,Growth,North,Toys,Online",
        "7,2024-01-02,20,4,Growth,North,Toys,Online",
        "A-007,2024-01-03,30,4,Growth,North,Toys,Online",
    ]);
    let ds = load_file(file.path()).unwrap();

    assert_eq!(ds.records[0].customer_id, CustomerId::from(7));
    assert_eq!(ds.records[0].customer_id, ds.records[1].customer_id);
    assert_eq!(ds.records[2].customer_id, CustomerId::from("A-007"));

    let dash = DashboardSession::new(Arc::new(ds)).dashboard();
    assert_eq!(dash.kpis.unique_customers, 2);
}

#[test]
fn test_load_json_records() {
    let file = temp_with(
        ".json",
        r#"[
            {"CustomerID": 7, "TransactionDate": 1704067200000, "PurchaseAmount": 12.5,
             "CustomerSatisfaction": 3, "label": "Stable", "CustomerRegion": "East",
             "ProductCategory": "Home", "RetailChannel": "Online"},
            {"CustomerID": "C-8", "TransactionDate": "2024-01-03T09:15:00",
             "PurchaseAmount": 20, "CustomerSatisfaction": 4.5, "label": "Growth",
             "CustomerRegion": "West", "ProductCategory": "Home", "RetailChannel": "Store",
             "extra": null}
        ]"#,
    );

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[0].customer_id, CustomerId::from(7));
    assert_eq!(ds.records[1].customer_id, CustomerId::from("C-8"));
    let (lo, hi) = ds.date_range.unwrap();
    assert_eq!(lo.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(hi.date(), NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Two-row transactions file whose date and amount columns are supplied by
/// the caller.
fn write_parquet(path: &Path, dates: (DataType, ArrayRef), amounts: ArrayRef) {
    let (date_type, date_values) = dates;
    let schema = Arc::new(Schema::new(vec![
        Field::new("CustomerID", DataType::Int64, false),
        Field::new("TransactionDate", date_type, false),
        Field::new("PurchaseAmount", DataType::Float64, true),
        Field::new("CustomerSatisfaction", DataType::Float64, false),
        Field::new("label", DataType::Utf8, false),
        Field::new("CustomerRegion", DataType::Utf8, false),
        Field::new("ProductCategory", DataType::Utf8, false),
        Field::new("RetailChannel", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            date_values,
            amounts,
            Arc::new(Float64Array::from(vec![4.0, 2.0])),
            Arc::new(StringArray::from(vec!["Growth", "Decline"])),
            Arc::new(StringArray::from(vec!["North", "North"])),
            Arc::new(StringArray::from(vec!["Toys", "Books"])),
            Arc::new(StringArray::from(vec!["Online", "Online"])),
        ],
    )
    .unwrap();

    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn parquet_file() -> NamedTempFile {
    tempfile::Builder::new().suffix(".parquet").tempfile().unwrap()
}

fn amounts() -> ArrayRef {
    Arc::new(Float64Array::from(vec![10.0, 15.0]))
}

#[test]
fn test_load_parquet_timestamps() {
    let file = parquet_file();
    let dates: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![
        1_704_067_200_000,
        1_704_153_600_000 + 3_600_000,
    ]));
    let date_type = DataType::Timestamp(TimeUnit::Millisecond, None);
    write_parquet(file.path(), (date_type, dates), amounts());

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[1].transaction_date, at(2024, 1, 2, 1, 0));
    assert_eq!(ds.records[1].label, "Decline");
}

#[test]
fn test_load_parquet_date32() {
    let file = parquet_file();
    // Days since 1970-01-01: 2024-01-05 and 2024-01-06.
    let dates: ArrayRef = Arc::new(Date32Array::from(vec![19_727, 19_728]));
    write_parquet(file.path(), (DataType::Date32, dates), amounts());

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.records[0].transaction_date, at(2024, 1, 5, 0, 0));
    assert_eq!(ds.date_range.unwrap().1, at(2024, 1, 6, 0, 0));
}

#[test]
fn test_load_parquet_date64() {
    let file = parquet_file();
    let dates: ArrayRef = Arc::new(Date64Array::from(vec![
        1_704_412_800_000,
        1_704_499_200_000,
    ]));
    write_parquet(file.path(), (DataType::Date64, dates), amounts());

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.records[0].transaction_date, at(2024, 1, 5, 0, 0));
    assert_eq!(ds.records[1].transaction_date, at(2024, 1, 6, 0, 0));
}

#[test]
fn test_load_parquet_text_dates() {
    let file = parquet_file();
    let dates: ArrayRef = Arc::new(StringArray::from(vec![
        "2024-01-05 08:00:00",
        "2024-01-06",
    ]));
    write_parquet(file.path(), (DataType::Utf8, dates), amounts());

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.records[0].transaction_date, at(2024, 1, 5, 8, 0));
    assert_eq!(ds.records[1].transaction_date, at(2024, 1, 6, 0, 0));

    let garbled = parquet_file();
    let dates: ArrayRef = Arc::new(StringArray::from(vec!["2024-01-05", "soon"]));
    write_parquet(garbled.path(), (DataType::Utf8, dates), amounts());
    let err = load_file(garbled.path()).unwrap_err();
    assert!(format!("{err:#}").contains("TransactionDate"), "{err:#}");
}

#[test]
fn test_parquet_null_amount_fails_the_load() {
    let file = parquet_file();
    let dates: ArrayRef = Arc::new(Date32Array::from(vec![19_727, 19_728]));
    let amounts: ArrayRef = Arc::new(Float64Array::from(vec![Some(10.0), None]));
    write_parquet(file.path(), (DataType::Date32, dates), amounts);

    let err = load_file(file.path()).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("PurchaseAmount"), "{msg}");
    assert!(msg.contains("null value"), "{msg}");
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

#[test]
fn test_load_xlsx_workbook() {
    let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in HEADER.split(',').enumerate() {
        sheet.write_string(0, col as u16, name).unwrap();
    }

    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    sheet.write_number(1, 0, 101.0).unwrap();
    // 45296.5 days after 1899-12-30 is noon on 2024-01-05.
    sheet.write_number_with_format(1, 1, 45296.5, &date_format).unwrap();
    sheet.write_number(1, 2, 129.9).unwrap();
    sheet.write_number(1, 3, 4.0).unwrap();
    for (col, value) in [(4, "Growth"), (5, "North"), (6, "Electronics"), (7, "Online")] {
        sheet.write_string(1, col, value).unwrap();
    }

    sheet.write_string(2, 0, "C-8").unwrap();
    sheet.write_string(2, 1, "2024-01-06").unwrap();
    sheet.write_number(2, 2, 20.0).unwrap();
    sheet.write_number(2, 3, 3.5).unwrap();
    for (col, value) in [(4, "Decline"), (5, "South"), (6, "Home"), (7, "Store")] {
        sheet.write_string(2, col, value).unwrap();
    }
    workbook.save(file.path()).unwrap();

    let ds = load_file(file.path()).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records[0].customer_id, CustomerId::from(101));
    assert_eq!(ds.records[0].transaction_date, at(2024, 1, 5, 12, 0));
    assert_eq!(ds.records[0].purchase_amount, 129.9);
    assert_eq!(ds.records[1].customer_id, CustomerId::from("C-8"));
    assert_eq!(ds.records[1].transaction_date, at(2024, 1, 6, 0, 0));
    assert_eq!(ds.values(Dimension::Category).unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn test_bad_rows_fail_the_load() {
    let bad_date = csv_with(&["1,yesterday,10,4,Growth,North,Toys,Online"]);
    let err = load_file(bad_date.path()).unwrap_err();
    assert!(format!("{err:#}").contains("TransactionDate"), "{err:#}");

    let bad_amount = csv_with(&["1,2024-01-01,ten,4,Growth,North,Toys,Online"]);
    assert!(load_file(bad_amount.path()).is_err());

    let negative = csv_with(&["1,2024-01-01,-10,4,Growth,North,Toys,Online"]);
    assert!(load_file(negative.path()).is_err());
}

#[test]
fn test_compact_csv_dates_are_rejected() {
    // 20240105 is not read as milliseconds since the epoch.
    let file = csv_with(&["1,20240105,10,4,Growth,North,Toys,Online"]);
    let err = load_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("TransactionDate"), "{err:#}");
}

#[test]
fn test_unsupported_extension() {
    let file = temp_with(".txt", "");
    let err = load_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Unsupported file extension"));
}
