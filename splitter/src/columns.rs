use csv::StringRecord;

use crate::allocation::LINE_ITEMS;
use crate::error::ParseError;
use crate::utils::normalize_key;

// Алиасы канонических полей, уже нормализованные.
// Порядок в списке - приоритет: выигрывает первый алиас, нашедший колонку.

const TRIP_START_ALIASES: &[&str] = &["tripstart", "tripstartdate", "startdate", "start", "pickupdate", "pickup"];
const TRIP_END_ALIASES: &[&str] = &["tripend", "tripenddate", "enddate", "end", "returndate", "dropoffdate", "dropoff"];
const GROSS_REVENUE_ALIASES: &[&str] = &["tripprice", "tripcost", "grossrevenue", "price", "triptotal"];
const NET_EARNINGS_ALIASES: &[&str] = &["totalearnings", "netearnings", "earnings", "hostearnings"];
const ADDONS_ALIASES: &[&str] = &["extras", "addons", "extrastotal", "addonsrevenue"];
const VEHICLE_ALIASES: &[&str] = &["vehiclename", "vehicle", "car"];
const VEHICLE_RAW_ALIASES: &[&str] = &["listingname", "listing", "listingtitle", "vehiclelisting", "tripvehicle"];
const OWNER_ALIASES: &[&str] = &["ownername", "owner", "hostname", "host"];
const OWNER_FIRST_ALIASES: &[&str] = &["ownerfirstname", "hostfirstname", "firstname"];
const OWNER_LAST_ALIASES: &[&str] = &["ownerlastname", "hostlastname", "lastname"];
const GUEST_ALIASES: &[&str] = &["guestname", "guest", "rentername", "renter", "primarydriver", "driver"];
const STATUS_ALIASES: &[&str] = &["tripstatus", "status", "bookingstatus"];
const CANCELLED_ALIASES: &[&str] = &["iscancelled", "iscanceled", "cancelled", "canceled", "cancelledflag"];

// Человекочитаемые метки трёх обязательных колонок для текста ошибки
const TRIP_START_LABEL: &str = "Trip start";
const TRIP_END_LABEL: &str = "Trip end";
const GROSS_REVENUE_LABEL: &str = "Gross revenue";

/// Индексы нужных колонок поимённо
///
/// Вспомогательная структура: в каких столбцах выгрузки лежат данные для
/// каждого канонического поля плюс отдельный список (статья, колонка)
/// для движка распределения.
#[derive(Debug)]
pub(crate) struct ColumnMap {
    pub(crate) trip_start: usize,
    pub(crate) trip_end: usize,
    pub(crate) gross_revenue: usize,
    pub(crate) net_earnings: Option<usize>,
    pub(crate) addons: Option<usize>,
    pub(crate) vehicle: Option<usize>,
    pub(crate) vehicle_raw: Option<usize>,
    pub(crate) owner: Option<usize>,
    pub(crate) owner_first: Option<usize>,
    pub(crate) owner_last: Option<usize>,
    pub(crate) guest: Option<usize>,
    pub(crate) status: Option<usize>,
    pub(crate) cancelled: Option<usize>,
    /// (индекс статьи в [`LINE_ITEMS`], индекс колонки)
    pub(crate) line_items: Vec<(usize, usize)>,
}

/// Ищет колонку по списку алиасов
///
/// Возвращает первый найденный, в приоритете порядка алиасов
fn find_field(normalized: &[String], aliases: &[&str]) -> Option<usize> {
    for alias in aliases {
        if let Some(pos) = normalized.iter().position(|h| h == alias) {
            return Some(pos);
        }
    }
    None
}

impl ColumnMap {
    /// Привязывает канонические поля и статьи к колонкам строки заголовка.
    ///
    /// Единственное жёсткое предусловие всего парсинга: без колонок начала,
    /// конца поездки и основной суммы файл не читается вовсе.
    pub(crate) fn from_headers(headers: &StringRecord) -> Result<Self, ParseError> {
        let normalized: Vec<String> = headers.iter().map(normalize_key).collect();

        let trip_start = find_field(&normalized, TRIP_START_ALIASES);
        let trip_end = find_field(&normalized, TRIP_END_ALIASES);
        let gross_revenue = find_field(&normalized, GROSS_REVENUE_ALIASES);

        let mut missing: Vec<&'static str> = Vec::new();
        if trip_start.is_none() {
            missing.push(TRIP_START_LABEL);
        }
        if trip_end.is_none() {
            missing.push(TRIP_END_LABEL);
        }
        if gross_revenue.is_none() {
            missing.push(GROSS_REVENUE_LABEL);
        }
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns(missing));
        }

        let line_items = LINE_ITEMS
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                find_field(&normalized, item.aliases).map(|col| (idx, col))
            })
            .collect();

        Ok(ColumnMap {
            // missing пуст, так что ошибки здесь быть не может
            trip_start: trip_start.unwrap(),
            trip_end: trip_end.unwrap(),
            gross_revenue: gross_revenue.unwrap(),
            net_earnings: find_field(&normalized, NET_EARNINGS_ALIASES),
            addons: find_field(&normalized, ADDONS_ALIASES),
            vehicle: find_field(&normalized, VEHICLE_ALIASES),
            vehicle_raw: find_field(&normalized, VEHICLE_RAW_ALIASES),
            owner: find_field(&normalized, OWNER_ALIASES),
            owner_first: find_field(&normalized, OWNER_FIRST_ALIASES),
            owner_last: find_field(&normalized, OWNER_LAST_ALIASES),
            guest: find_field(&normalized, GUEST_ALIASES),
            status: find_field(&normalized, STATUS_ALIASES),
            cancelled: find_field(&normalized, CANCELLED_ALIASES),
            line_items,
        })
    }
}
