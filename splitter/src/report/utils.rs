use csv::StringRecord;

use crate::allocation::{AllocationPolicy, LINE_ITEMS};
use crate::columns::ColumnMap;
use crate::model::{TripRecord, UNKNOWN_GUEST, UNKNOWN_OWNER};
use crate::owner::{OwnerSignals, infer_owner_name};
use crate::utils::{
    parse_cancelled_flag, parse_date_time, parse_money_cents, status_is_cancelled,
};

fn opt_cell<'a>(row: &'a StringRecord, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| row.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Собирает одну валидную строку или возвращает предупреждение.
///
/// Текст предупреждения - готовая человекочитаемая строка с номером
/// исходной строки; вызывающий её не дорабатывает.
pub(crate) fn build_record(
    row: &StringRecord,
    row_number: usize,
    columns: &ColumnMap,
    policy: &AllocationPolicy,
) -> Result<TripRecord, String> {
    let start_raw = row.get(columns.trip_start).unwrap_or("").trim();
    let trip_start = parse_date_time(start_raw)
        .ok_or_else(|| format!("Row {row_number}: invalid trip start date '{start_raw}'"))?;

    let end_raw = row.get(columns.trip_end).unwrap_or("").trim();
    let trip_end = parse_date_time(end_raw)
        .ok_or_else(|| format!("Row {row_number}: invalid trip end date '{end_raw}'"))?;

    let gross_raw = row.get(columns.gross_revenue).unwrap_or("").trim();
    let gross_revenue_cents = parse_money_cents(gross_raw)
        .ok_or_else(|| format!("Row {row_number}: invalid trip price '{gross_raw}'"))?;

    // сначала чистое имя машины, потом сырой заголовок объявления
    let clean_vehicle = opt_cell(row, columns.vehicle);
    let raw_vehicle = opt_cell(row, columns.vehicle_raw);
    let vehicle_name = clean_vehicle
        .or(raw_vehicle)
        .ok_or_else(|| format!("Row {row_number}: missing vehicle name"))?
        .to_string();

    let net_earnings_cents = opt_cell(row, columns.net_earnings).and_then(parse_money_cents);
    let addons_revenue_cents = opt_cell(row, columns.addons).and_then(parse_money_cents);

    let status = opt_cell(row, columns.status).map(str::to_string);
    let is_cancelled = opt_cell(row, columns.cancelled)
        .and_then(parse_cancelled_flag)
        .unwrap_or_else(|| status.as_deref().map(status_is_cancelled).unwrap_or(false));

    let guest_name = opt_cell(row, columns.guest)
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_GUEST.to_string());

    let signals = OwnerSignals {
        owner: opt_cell(row, columns.owner),
        first_name: opt_cell(row, columns.owner_first),
        last_name: opt_cell(row, columns.owner_last),
        vehicle: clean_vehicle,
        listing: raw_vehicle,
    };
    let owner_name = infer_owner_name(&signals).unwrap_or_else(|| UNKNOWN_OWNER.to_string());

    // Распределение никогда не падает: отсутствующая или нечитаемая ячейка
    // статьи даёт нулевой вклад, частичная схема выгрузки - норма
    let mut lr_share_cents = 0;
    let mut owner_share_cents = 0;
    for (item_idx, col) in &columns.line_items {
        let Some(amount) = row.get(*col).and_then(parse_money_cents) else {
            continue;
        };
        let (lr_part, owner_part) = policy.split_cents(&LINE_ITEMS[*item_idx], amount);
        lr_share_cents += lr_part;
        owner_share_cents += owner_part;
    }

    Ok(TripRecord {
        row_number,
        trip_start,
        trip_end,
        vehicle_name,
        owner_name,
        guest_name,
        gross_revenue_cents,
        net_earnings_cents,
        addons_revenue_cents,
        lr_share_cents,
        owner_share_cents,
        is_cancelled,
        status,
    })
}
