use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use splitter::{AllocationPolicy, DashboardAggregate, EarningsReport, ParseError, TripRecord};

/// Допустимое расхождение сверки, в валюте
const GAP_TOLERANCE: f64 = 0.01;

#[derive(Parser, Debug)]
#[command(
    name = "cli_reconcile",
    version,
    about = "Сверяет посчитанные доли с заявленным заработком по выгрузке.",
    long_about = None,
)]
struct Args {
    /// Входной CSV-файл выгрузки
    #[arg(long)]
    input: PathBuf,

    /// Считать по всем строкам, включая отменённые
    #[arg(long)]
    include_cancelled: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn print_owner_rollup(aggregate: &DashboardAggregate) {
    println!("Доли по владельцам:");
    for row in &aggregate.owner_breakdown {
        println!(
            "  {:<25} поездок {:<3} заработано {:>10.2} оператору {:>10.2} владельцу {:>10.2}",
            row.owner_name, row.bookings, row.total_earnings, row.lr_share, row.owner_share,
        );
    }
}

fn run() -> Result<(), ParseError> {
    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("input file does not exist: {}", args.input.display());
        process::exit(1)
    }

    let file = File::open(&args.input).unwrap_or_else(|err| {
        eprintln!("failed to open input file {}: {err}", args.input.display());
        process::exit(1);
    });

    let reader = io::BufReader::new(file);
    let report = EarningsReport::parse(reader, &AllocationPolicy::default())?;

    for warning in &report.warnings {
        eprintln!("Warning: {warning}");
    }

    let subset: Vec<TripRecord> = report
        .records
        .into_iter()
        .filter(|rec| args.include_cancelled || !rec.is_cancelled)
        .collect();

    let aggregate = DashboardAggregate::from_records(&subset);

    println!("Строк в сверке: {}", aggregate.total_trips);
    println!("Заявленный заработок: {:.2}", aggregate.total_earnings);
    println!(
        "Посчитанные доли: оператор {:.2} + владельцы {:.2} = {:.2}",
        aggregate.lr_share,
        aggregate.owner_share,
        aggregate.lr_share + aggregate.owner_share,
    );
    println!("Расхождение сверки: {:.2}", aggregate.reconciliation_gap);
    print_owner_rollup(&aggregate);

    if aggregate.reconciliation_gap.abs() > GAP_TOLERANCE {
        println!("Сверка не сошлась: расхождение больше цента");
        process::exit(1);
    }

    println!("Сверка сошлась");
    Ok(())
}
