use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;

#[derive(Parser)]
#[command(name = "generate_sample", about = "Write a synthetic NovaRetail transactions table")]
struct Args {
    /// Output path; `.parquet` or `.csv`.
    #[arg(default_value = "sample_transactions.parquet")]
    output: PathBuf,

    /// Number of transactions.
    #[arg(long, default_value_t = 2_000)]
    rows: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

/// Segment name with its typical basket size and satisfaction.
const SEGMENTS: [(&str, f64, f64); 4] = [
    ("Growth", 180.0, 4.2),
    ("Stable", 120.0, 3.8),
    ("Decline", 70.0, 2.6),
    ("Promising", 140.0, 4.0),
];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const CATEGORIES: [&str; 5] = ["Electronics", "Clothing", "Home", "Books", "Groceries"];
const CHANNELS: [&str; 3] = ["Online", "Store", "Mobile"];

struct Columns {
    customer_id: Vec<i64>,
    transaction_date: Vec<NaiveDate>,
    purchase_amount: Vec<f64>,
    customer_satisfaction: Vec<f64>,
    label: Vec<&'static str>,
    region: Vec<&'static str>,
    category: Vec<&'static str>,
    channel: Vec<&'static str>,
}

fn generate(rows: usize, seed: u64) -> Columns {
    let mut rng = SimpleRng::new(seed);
    let first_day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let customers = (rows / 4).max(1);

    let mut cols = Columns {
        customer_id: Vec::with_capacity(rows),
        transaction_date: Vec::with_capacity(rows),
        purchase_amount: Vec::with_capacity(rows),
        customer_satisfaction: Vec::with_capacity(rows),
        label: Vec::with_capacity(rows),
        region: Vec::with_capacity(rows),
        category: Vec::with_capacity(rows),
        channel: Vec::with_capacity(rows),
    };

    for _ in 0..rows {
        let customer = rng.below(customers);
        // A customer's segment and region are a function of the id.
        let (label, basket, satisfaction) = SEGMENTS[customer % SEGMENTS.len()];
        let amount = (basket * (0.3 + 1.4 * rng.next_f64()) * 100.0).round() / 100.0;
        let score = (satisfaction + rng.next_f64() - 0.5).clamp(1.0, 5.0);

        cols.customer_id.push(1000 + customer as i64);
        cols.transaction_date
            .push(first_day + Duration::days(rng.below(180) as i64));
        cols.purchase_amount.push(amount);
        cols.customer_satisfaction.push((score * 10.0).round() / 10.0);
        cols.label.push(label);
        cols.region.push(REGIONS[customer % REGIONS.len()]);
        cols.category.push(rng.pick(&CATEGORIES));
        cols.channel.push(rng.pick(&CHANNELS));
    }
    cols
}

fn write_parquet(cols: &Columns, path: &PathBuf) -> Result<()> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    let days: Vec<i32> = cols
        .transaction_date
        .iter()
        .map(|d| (*d - epoch).num_days() as i32)
        .collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("CustomerID", DataType::Int64, false),
        Field::new("TransactionDate", DataType::Date32, false),
        Field::new("PurchaseAmount", DataType::Float64, false),
        Field::new("CustomerSatisfaction", DataType::Float64, false),
        Field::new("label", DataType::Utf8, false),
        Field::new("CustomerRegion", DataType::Utf8, false),
        Field::new("ProductCategory", DataType::Utf8, false),
        Field::new("RetailChannel", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(cols.customer_id.clone())),
            Arc::new(Date32Array::from(days)),
            Arc::new(Float64Array::from(cols.purchase_amount.clone())),
            Arc::new(Float64Array::from(cols.customer_satisfaction.clone())),
            Arc::new(StringArray::from(cols.label.clone())),
            Arc::new(StringArray::from(cols.region.clone())),
            Arc::new(StringArray::from(cols.category.clone())),
            Arc::new(StringArray::from(cols.channel.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn write_csv(cols: &Columns, path: &PathBuf) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating output file")?;
    writer.write_record([
        "CustomerID",
        "TransactionDate",
        "PurchaseAmount",
        "CustomerSatisfaction",
        "label",
        "CustomerRegion",
        "ProductCategory",
        "RetailChannel",
    ])?;
    for i in 0..cols.customer_id.len() {
        writer.write_record([
            cols.customer_id[i].to_string(),
            cols.transaction_date[i].format("%Y-%m-%d").to_string(),
            format!("{:.2}", cols.purchase_amount[i]),
            format!("{:.1}", cols.customer_satisfaction[i]),
            cols.label[i].to_string(),
            cols.region[i].to_string(),
            cols.category[i].to_string(),
            cols.channel[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cols = generate(args.rows, args.seed);

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(&cols, &args.output)?,
        "csv" => write_csv(&cols, &args.output)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    log::info!("seed {} → {} rows", args.seed, args.rows);
    println!(
        "Wrote {} transactions ({} segments) to {}",
        args.rows,
        SEGMENTS.len(),
        args.output.display()
    );
    Ok(())
}
