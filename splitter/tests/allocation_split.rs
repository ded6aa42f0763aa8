use splitter::{AllocationPolicy, DashboardAggregate, EarningsReport, LINE_ITEMS, ParseError};
use std::io::Cursor;

fn parse(csv: &str, policy: &AllocationPolicy) -> EarningsReport {
    EarningsReport::parse(Cursor::new(csv), policy).expect("csv should parse")
}

#[test]
fn trip_price_splits_70_30_by_default() {
    // $10.00 при 70% владельца: оператору 300 центов, владельцу 700
    let report = parse(
        "Trip start,Trip end,Trip price,Vehicle name\n\
         1/5/2024,1/6/2024,$10.00,Alice's Tesla Model 3\n",
        &AllocationPolicy::default(),
    );

    let rec = &report.records[0];
    assert_eq!(rec.lr_share_cents, 300);
    assert_eq!(rec.owner_share_cents, 700);
}

#[test]
fn override_changes_row_shares() {
    let policy = AllocationPolicy::default()
        .with_override("Trip price", 100)
        .expect("override should apply");

    let report = parse(
        "Trip start,Trip end,Trip price,Cleaning,Vehicle name\n\
         1/5/2024,1/6/2024,$10.00,$5.00,Alice's Tesla Model 3\n",
        &policy,
    );

    let rec = &report.records[0];
    // вся цена поездки уходит владельцу, клининг по-прежнему оператору
    assert_eq!(rec.owner_share_cents, 1_000);
    assert_eq!(rec.lr_share_cents, 500);
}

#[test]
fn unreadable_line_item_cells_contribute_zero() {
    let report = parse(
        "Trip start,Trip end,Trip price,Cleaning,Vehicle name\n\
         1/5/2024,1/6/2024,$10.00,n/a,Alice's Tesla Model 3\n",
        &AllocationPolicy::default(),
    );

    let rec = &report.records[0];
    assert_eq!(rec.lr_share_cents, 300);
    assert_eq!(rec.owner_share_cents, 700);
}

#[test]
fn bad_override_is_rejected_before_parsing() {
    let err = AllocationPolicy::default()
        .with_override("Cleaning", 150)
        .unwrap_err();
    assert!(matches!(err, ParseError::BadSplit { pct: 150, .. }));
}

#[test]
fn shares_reconcile_exactly_when_price_is_the_only_item() {
    // единственная статья - цена поездки, так что totalEarnings строки
    // равен её сумме, а точность раздела гарантирует нулевое расхождение
    let mut csv = String::from("Trip start,Trip end,Trip price,Vehicle name\n");
    for day in 1..=28 {
        let cents = 999 + day * 137; // нарочно некруглые суммы
        csv.push_str(&format!(
            "1/{day}/2024,1/{day}/2024 11:00 PM,${}.{:02},Alice's Tesla Model 3\n",
            cents / 100,
            cents % 100,
        ));
    }

    let report = parse(&csv, &AllocationPolicy::default());
    assert_eq!(report.records.len(), 28);

    let total: i64 = report
        .records
        .iter()
        .map(|r| r.total_earnings_cents())
        .sum();
    let lr: i64 = report.records.iter().map(|r| r.lr_share_cents).sum();
    let owner: i64 = report.records.iter().map(|r| r.owner_share_cents).sum();

    assert_eq!(lr + owner, total, "no rounding drift across the batch");

    let aggregate = DashboardAggregate::from_records(&report.records);
    assert!(
        aggregate.reconciliation_gap.abs() < 0.01,
        "reconciliation gap {} should be under a cent",
        aggregate.reconciliation_gap
    );
}

#[test]
fn per_item_split_has_no_rounding_leak() {
    // для каждой статьи и неудобной суммы: lr + owner == сумма, точно
    let policy = AllocationPolicy::default();
    for item in LINE_ITEMS {
        for amount in [-12_345_i64, -101, -1, 0, 1, 33, 777, 999_999] {
            let (lr, owner) = policy.split_cents(item, amount);
            assert_eq!(lr + owner, amount, "leak on '{}' at {amount}", item.name);
        }
    }
}
