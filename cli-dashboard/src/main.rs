use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use splitter::{AllocationPolicy, DashboardAggregate, EarningsReport, ParseError};

#[derive(Parser, Debug)]
#[command(
    name = "cli_dashboard",
    version,
    about = "Считает раздел выручки по выгрузке маркетплейса и печатает сводку в JSON.",
    long_about = None,
)]
struct Args {
    /// Входной CSV-файл выгрузки
    #[arg(long)]
    input: PathBuf,

    /// Переопределение доли владельца для статьи, вида "Trip price=80".
    /// Можно указывать несколько раз
    #[arg(long = "split", value_name = "ITEM=PCT")]
    splits: Vec<String>,

    /// Печатать также разобранные строки, а не только сводку
    #[arg(long)]
    records: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn build_policy(splits: &[String]) -> Result<AllocationPolicy, ParseError> {
    let mut policy = AllocationPolicy::default();

    for raw in splits {
        let Some((item, pct_raw)) = raw.split_once('=') else {
            eprintln!("bad --split value '{raw}', expected ITEM=PCT");
            process::exit(1);
        };
        let pct: u8 = pct_raw.trim().parse().unwrap_or_else(|_| {
            eprintln!("bad --split percentage '{pct_raw}' in '{raw}'");
            process::exit(1);
        });
        policy = policy.with_override(item.trim(), pct)?;
    }

    Ok(policy)
}

fn run() -> Result<(), ParseError> {
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("input file does not exist: {}", args.input.display());
        process::exit(1)
    }

    let policy = build_policy(&args.splits)?;

    let file = File::open(&args.input).unwrap_or_else(|err| {
        eprintln!("failed to open input file {}: {err}", args.input.display());
        process::exit(1);
    });

    let reader = io::BufReader::new(file);
    let report = EarningsReport::parse(reader, &policy)?;

    // предупреждения не мешают выводу данных
    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }

    let aggregate = DashboardAggregate::from_records(&report.records);

    let payload = if args.records {
        serde_json::json!({
            "aggregate": aggregate,
            "records": report.records,
            "warnings": report.warnings,
        })
    } else {
        serde_json::json!({ "aggregate": aggregate })
    };

    let rendered = serde_json::to_string_pretty(&payload).unwrap_or_else(|err| {
        eprintln!("failed to render JSON: {err}");
        process::exit(1);
    });
    println!("{rendered}");

    Ok(())
}
