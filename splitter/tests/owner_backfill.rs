use splitter::{AllocationPolicy, EarningsReport, UNKNOWN_OWNER};
use std::io::Cursor;

fn parse(csv: &str) -> EarningsReport {
    EarningsReport::parse(Cursor::new(csv), &AllocationPolicy::default())
        .expect("csv should parse")
}

const HEADER: &str = "Trip start,Trip end,Trip price,Vehicle name,Listing name\n";

#[test]
fn single_known_owner_backfills_all_rows_of_the_vehicle() {
    let csv = format!(
        "{HEADER}\
         1/5/2024,1/6/2024,$10.00,Tesla Model 3,Tesla Model 3\n\
         1/7/2024,1/8/2024,$10.00,Tesla Model 3,Alice's Tesla Model 3\n\
         1/9/2024,1/10/2024,$10.00,Tesla Model 3,Tesla Model 3\n\
         1/11/2024,1/12/2024,$10.00,Tesla Model 3,Tesla Model 3\n"
    );

    let report = parse(&csv);
    assert!(report.warnings.is_empty());
    for rec in &report.records {
        assert_eq!(rec.owner_name, "Alice");
    }
}

#[test]
fn backfill_result_is_independent_of_row_order() {
    let owner_row = "1/7/2024,1/8/2024,$10.00,Tesla Model 3,Alice's Tesla Model 3\n";
    let blank_row = "1/5/2024,1/6/2024,$10.00,Tesla Model 3,Tesla Model 3\n";

    let first = parse(&format!("{HEADER}{owner_row}{blank_row}{blank_row}"));
    let second = parse(&format!("{HEADER}{blank_row}{blank_row}{owner_row}"));

    let owners = |report: &EarningsReport| -> Vec<String> {
        report.records.iter().map(|r| r.owner_name.clone()).collect()
    };
    assert_eq!(owners(&first), vec!["Alice"; 3]);
    assert_eq!(owners(&second), vec!["Alice"; 3]);
}

#[test]
fn majority_owner_wins_backfill() {
    // у "Kia Soul" две строки с Bob и одна с Rob: сироты уходят к Bob
    let csv = format!(
        "{HEADER}\
         1/5/2024,1/6/2024,$10.00,Kia Soul,Bob's Kia Soul\n\
         1/7/2024,1/8/2024,$10.00,Kia Soul,Rob's Kia Soul\n\
         1/9/2024,1/10/2024,$10.00,Kia Soul,Bob's Kia Soul\n\
         1/11/2024,1/12/2024,$10.00,Kia Soul,Kia Soul\n"
    );

    let report = parse(&csv);
    assert_eq!(report.records[3].owner_name, "Bob");
}

#[test]
fn tied_vote_picks_lexicographically_smaller_name() {
    let bob = "1/5/2024,1/6/2024,$10.00,Kia Soul,Bob's Kia Soul\n";
    let rob = "1/7/2024,1/8/2024,$10.00,Kia Soul,Rob's Kia Soul\n";
    let blank = "1/9/2024,1/10/2024,$10.00,Kia Soul,Kia Soul\n";

    let first = parse(&format!("{HEADER}{bob}{rob}{blank}"));
    let second = parse(&format!("{HEADER}{rob}{bob}{blank}"));

    assert_eq!(first.records[2].owner_name, "Bob");
    assert_eq!(second.records[2].owner_name, "Bob");
}

#[test]
fn unresolved_vehicles_warn_per_row() {
    let csv = format!(
        "{HEADER}\
         1/5/2024,1/6/2024,$10.00,Kia Rio,Kia Rio\n\
         1/7/2024,1/8/2024,$10.00,Kia Rio,Kia Rio\n"
    );

    let report = parse(&csv);
    assert_eq!(
        report.warnings,
        vec![
            "Row 2: owner unknown for vehicle 'Kia Rio'".to_string(),
            "Row 3: owner unknown for vehicle 'Kia Rio'".to_string(),
        ]
    );
    for rec in &report.records {
        assert_eq!(rec.owner_name, UNKNOWN_OWNER);
    }
}

#[test]
fn backfill_does_not_cross_vehicles() {
    let csv = format!(
        "{HEADER}\
         1/5/2024,1/6/2024,$10.00,Tesla Model 3,Alice's Tesla Model 3\n\
         1/7/2024,1/8/2024,$10.00,Kia Rio,Kia Rio\n"
    );

    let report = parse(&csv);
    assert_eq!(report.records[0].owner_name, "Alice");
    assert_eq!(report.records[1].owner_name, UNKNOWN_OWNER);
    assert_eq!(
        report.warnings,
        vec!["Row 3: owner unknown for vehicle 'Kia Rio'".to_string()]
    );
}
