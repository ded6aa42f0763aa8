use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{Cents, TripRecord, cents_to_currency};

// Иллюстративные константы трудозатрат для витринных коэффициентов
// по машинам: часы обслуживания на одно бронирование и ставка в час.
const LABOR_HOURS_PER_BOOKING: f64 = 1.5;
const LABOR_HOURLY_RATE: f64 = 25.0;

/// Точка месячного ряда выручки
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenuePoint {
    /// метка месяца вида "Jan 2024"
    pub label: String,
    pub gross_revenue: f64,
}

/// Точка месячного ряда загрузки парка
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyUtilizationPoint {
    pub label: String,
    /// процент занятых машино-дней, 0..=100, один знак после запятой
    pub utilization_pct: f64,
}

/// Точка месячного ряда раздела выручки
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySplitPoint {
    pub label: String,
    pub lr_share: f64,
    pub owner_share: f64,
}

/// Сводка по одной машине
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleBreakdownRow {
    pub vehicle_name: String,
    /// владелец последней по времени поездки этой машины
    pub owner_name: String,
    pub bookings: usize,
    pub total_earnings: f64,
    pub lr_share: f64,
    pub owner_share: f64,
    /// отношение оценочных трудозатрат к доле оператора
    pub labor_cost_to_lr_ratio: f64,
    pub lr_share_per_booking: f64,
    pub average_monthly_lr_share: f64,
}

/// Выработка одной машины
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehiclePerformanceRow {
    pub vehicle_name: String,
    pub gross_revenue: f64,
    pub trips: usize,
    /// загрузка в пределах активных месяцев самой машины
    pub utilization_pct: f64,
}

/// Сводка по одному владельцу
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerBreakdownRow {
    pub owner_name: String,
    /// сколько разных машин этого владельца встретилось в выгрузке
    pub vehicles: usize,
    pub bookings: usize,
    pub total_earnings: f64,
    pub lr_share: f64,
    pub owner_share: f64,
}

/// Витринная сводка по всему набору строк.
///
/// Пересчитывается с нуля на каждый вызов; не зависит от порядка строк
/// на входе - только от их состава. Все суммы здесь уже в десятичной
/// валюте с двумя знаками, проценты - с одним.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardAggregate {
    pub total_trips: usize,
    pub gross_revenue: f64,
    /// сумма заработков строк (чистый, если есть, иначе основной)
    pub total_earnings: f64,
    /// сумма чистых заработков; None, если колонка отсутствовала целиком
    pub net_earnings: Option<f64>,
    pub lr_share: f64,
    pub owner_share: f64,
    pub average_trip_value: f64,
    pub cancellation_rate_pct: f64,
    /// расхождение сверки: total_earnings - (lr_share + owner_share)
    ///
    /// При корректно замапленной политике должно быть около нуля;
    /// это рабочая метрика, а не тестовый артефакт.
    pub reconciliation_gap: f64,
    pub monthly_revenue: Vec<MonthlyRevenuePoint>,
    pub monthly_utilization: Vec<MonthlyUtilizationPoint>,
    pub monthly_split: Vec<MonthlySplitPoint>,
    pub vehicle_breakdown: Vec<VehicleBreakdownRow>,
    pub vehicle_performance: Vec<VehiclePerformanceRow>,
    pub owner_breakdown: Vec<OwnerBreakdownRow>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn month_key(dt: &NaiveDateTime) -> (i32, u32) {
    (dt.year(), dt.month())
}

fn month_label((year, month): (i32, u32)) -> String {
    // месяц валиден, он взят из существующей даты
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap()
        .format("%b %Y")
        .to_string()
}

fn days_in_month((year, month): (i32, u32)) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    };
    (next - first).num_days()
}

/// occupied / available, в процентах с потолком в 100
fn utilization_pct(booked_days: i64, available_days: i64) -> f64 {
    if available_days <= 0 {
        return 0.0;
    }
    let pct = booked_days as f64 / available_days as f64 * 100.0;
    round1(pct.min(100.0))
}

#[derive(Default)]
struct MonthAcc {
    gross_cents: Cents,
    lr_cents: Cents,
    owner_cents: Cents,
    booked_days: i64,
    vehicles: BTreeSet<String>,
}

struct VehicleAcc {
    bookings: usize,
    gross_cents: Cents,
    total_cents: Cents,
    lr_cents: Cents,
    owner_cents: Cents,
    booked_days: i64,
    months: BTreeSet<(i32, u32)>,
    /// (trip_end, row_number, owner_name) поездки с самым поздним концом
    latest: (NaiveDateTime, usize, String),
}

#[derive(Default)]
struct OwnerAcc {
    vehicles: BTreeSet<String>,
    bookings: usize,
    total_cents: Cents,
    lr_cents: Cents,
    owner_cents: Cents,
}

impl DashboardAggregate {
    /// Считает сводку по набору строк.
    ///
    /// Фильтровать ли отменённые или не-"Completed" строки - решение
    /// вызывающего: функция считает ровно по тому срезу, который ей дали.
    pub fn from_records(records: &[TripRecord]) -> Self {
        let total_trips = records.len();

        let mut gross_cents: Cents = 0;
        let mut total_cents: Cents = 0;
        let mut net_cents: Cents = 0;
        let mut has_net = false;
        let mut lr_cents: Cents = 0;
        let mut owner_cents: Cents = 0;
        let mut cancelled = 0usize;

        let mut months: BTreeMap<(i32, u32), MonthAcc> = BTreeMap::new();
        let mut vehicles: BTreeMap<String, VehicleAcc> = BTreeMap::new();
        let mut owners: BTreeMap<String, OwnerAcc> = BTreeMap::new();

        for rec in records {
            gross_cents += rec.gross_revenue_cents;
            total_cents += rec.total_earnings_cents();
            if let Some(net) = rec.net_earnings_cents {
                net_cents += net;
                has_net = true;
            }
            lr_cents += rec.lr_share_cents;
            owner_cents += rec.owner_share_cents;
            if rec.is_cancelled {
                cancelled += 1;
            }

            // месячные ряды группируются по месяцу КОНЦА поездки
            let key = month_key(&rec.trip_end);
            let month = months.entry(key).or_default();
            month.gross_cents += rec.gross_revenue_cents;
            month.lr_cents += rec.lr_share_cents;
            month.owner_cents += rec.owner_share_cents;
            month.booked_days += rec.day_span();
            month.vehicles.insert(rec.vehicle_name.clone());

            let vehicle = vehicles
                .entry(rec.vehicle_name.clone())
                .or_insert_with(|| VehicleAcc {
                    bookings: 0,
                    gross_cents: 0,
                    total_cents: 0,
                    lr_cents: 0,
                    owner_cents: 0,
                    booked_days: 0,
                    months: BTreeSet::new(),
                    latest: (rec.trip_end, rec.row_number, rec.owner_name.clone()),
                });
            vehicle.bookings += 1;
            vehicle.gross_cents += rec.gross_revenue_cents;
            vehicle.total_cents += rec.total_earnings_cents();
            vehicle.lr_cents += rec.lr_share_cents;
            vehicle.owner_cents += rec.owner_share_cents;
            vehicle.booked_days += rec.day_span();
            vehicle.months.insert(key);
            // владельцем машины считается владелец последней поездки;
            // при равном времени решает номер строки, порядок входа не важен
            if (rec.trip_end, rec.row_number) > (vehicle.latest.0, vehicle.latest.1) {
                vehicle.latest = (rec.trip_end, rec.row_number, rec.owner_name.clone());
            }

            let owner = owners.entry(rec.owner_name.clone()).or_default();
            owner.vehicles.insert(rec.vehicle_name.clone());
            owner.bookings += 1;
            owner.total_cents += rec.total_earnings_cents();
            owner.lr_cents += rec.lr_share_cents;
            owner.owner_cents += rec.owner_share_cents;
        }

        let monthly_revenue = months
            .iter()
            .map(|(key, acc)| MonthlyRevenuePoint {
                label: month_label(*key),
                gross_revenue: round2(cents_to_currency(acc.gross_cents)),
            })
            .collect();

        let monthly_utilization = months
            .iter()
            .map(|(key, acc)| MonthlyUtilizationPoint {
                label: month_label(*key),
                utilization_pct: utilization_pct(
                    acc.booked_days,
                    days_in_month(*key) * acc.vehicles.len() as i64,
                ),
            })
            .collect();

        let monthly_split = months
            .iter()
            .map(|(key, acc)| MonthlySplitPoint {
                label: month_label(*key),
                lr_share: round2(cents_to_currency(acc.lr_cents)),
                owner_share: round2(cents_to_currency(acc.owner_cents)),
            })
            .collect();

        let vehicle_breakdown = vehicles
            .iter()
            .map(|(name, acc)| {
                let lr_share = cents_to_currency(acc.lr_cents);
                let labor_cost = acc.bookings as f64 * LABOR_HOURS_PER_BOOKING * LABOR_HOURLY_RATE;
                VehicleBreakdownRow {
                    vehicle_name: name.clone(),
                    owner_name: acc.latest.2.clone(),
                    bookings: acc.bookings,
                    total_earnings: round2(cents_to_currency(acc.total_cents)),
                    lr_share: round2(lr_share),
                    owner_share: round2(cents_to_currency(acc.owner_cents)),
                    labor_cost_to_lr_ratio: if lr_share > 0.0 {
                        round2(labor_cost / lr_share)
                    } else {
                        0.0
                    },
                    lr_share_per_booking: round2(lr_share / acc.bookings as f64),
                    average_monthly_lr_share: round2(lr_share / acc.months.len() as f64),
                }
            })
            .collect();

        let vehicle_performance = vehicles
            .iter()
            .map(|(name, acc)| {
                let available: i64 = acc.months.iter().map(|m| days_in_month(*m)).sum();
                VehiclePerformanceRow {
                    vehicle_name: name.clone(),
                    gross_revenue: round2(cents_to_currency(acc.gross_cents)),
                    trips: acc.bookings,
                    utilization_pct: utilization_pct(acc.booked_days, available),
                }
            })
            .collect();

        let owner_breakdown = owners
            .iter()
            .map(|(name, acc)| OwnerBreakdownRow {
                owner_name: name.clone(),
                vehicles: acc.vehicles.len(),
                bookings: acc.bookings,
                total_earnings: round2(cents_to_currency(acc.total_cents)),
                lr_share: round2(cents_to_currency(acc.lr_cents)),
                owner_share: round2(cents_to_currency(acc.owner_cents)),
            })
            .collect();

        DashboardAggregate {
            total_trips,
            gross_revenue: round2(cents_to_currency(gross_cents)),
            total_earnings: round2(cents_to_currency(total_cents)),
            net_earnings: has_net.then(|| round2(cents_to_currency(net_cents))),
            lr_share: round2(cents_to_currency(lr_cents)),
            owner_share: round2(cents_to_currency(owner_cents)),
            average_trip_value: if total_trips > 0 {
                round2(cents_to_currency(gross_cents) / total_trips as f64)
            } else {
                0.0
            },
            cancellation_rate_pct: if total_trips > 0 {
                round1(cancelled as f64 * 100.0 / total_trips as f64)
            } else {
                0.0
            },
            reconciliation_gap: round2(cents_to_currency(
                total_cents - lr_cents - owner_cents,
            )),
            monthly_revenue,
            monthly_utilization,
            monthly_split,
            vehicle_breakdown,
            vehicle_performance,
            owner_breakdown,
        }
    }
}
