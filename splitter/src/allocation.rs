use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::model::Cents;
use crate::utils::normalize_key;

const BPS_SCALE: i64 = 10_000;

/// Одна именованная статья выгрузки, участвующая в разделе выручки
///
/// `aliases` хранятся уже нормализованными (нижний регистр, только
/// буквы и цифры) и сверяются с заголовками колонок в объявленном порядке.
#[derive(Debug)]
pub struct LineItemSpec {
    /// каноническое отображаемое имя статьи
    pub name: &'static str,
    pub(crate) aliases: &'static [&'static str],
    /// доля владельца по умолчанию, в процентах
    pub default_owner_pct: u8,
}

/// Таблица статей с долями владельца по умолчанию.
///
/// Версионируемая конфигурация, а не бизнес-правило: проценты подобраны под
/// конкретный маркетплейс и целиком переопределяются политикой.
///
/// Базовая цена и скидки делятся 70/30 в пользу владельца; операционные
/// сборы-транзиты целиком остаются оператору; перепробег и штрафы,
/// оплаченные оператором за владельца, целиком уходят владельцу.
pub const LINE_ITEMS: &[LineItemSpec] = &[
    LineItemSpec { name: "Trip price", aliases: &["tripprice", "tripcost", "price"], default_owner_pct: 70 },
    LineItemSpec { name: "Discount", aliases: &["discount", "discounts", "tripdiscount"], default_owner_pct: 70 },
    LineItemSpec { name: "Weekly discount", aliases: &["weeklydiscount"], default_owner_pct: 70 },
    LineItemSpec { name: "Monthly discount", aliases: &["monthlydiscount"], default_owner_pct: 70 },
    LineItemSpec { name: "Cleaning", aliases: &["cleaning", "cleaningfee"], default_owner_pct: 0 },
    LineItemSpec { name: "Late fee", aliases: &["latefee", "latereturnfee"], default_owner_pct: 0 },
    LineItemSpec { name: "Tolls", aliases: &["tolls", "toll", "tollsandtickets"], default_owner_pct: 0 },
    LineItemSpec { name: "Extras", aliases: &["extras", "extrastotal"], default_owner_pct: 0 },
    LineItemSpec { name: "Gas", aliases: &["gas", "fuel", "gasreimbursement", "evrecharge"], default_owner_pct: 0 },
    LineItemSpec { name: "Sales tax", aliases: &["salestax", "tax"], default_owner_pct: 0 },
    LineItemSpec { name: "Airport fee", aliases: &["airportfee", "airportfees"], default_owner_pct: 0 },
    LineItemSpec { name: "Distance overage", aliases: &["distanceoverage", "additionaldistance", "extramiles"], default_owner_pct: 100 },
    LineItemSpec { name: "Host-paid fines", aliases: &["hostpaidfines", "fines", "tickets"], default_owner_pct: 100 },
    LineItemSpec { name: "Smoking fee", aliases: &["smokingfee", "smokingviolationfee"], default_owner_pct: 10 },
    LineItemSpec { name: "Delivery fee", aliases: &["deliveryfee", "delivery"], default_owner_pct: 10 },
];

/// Деление с округлением half away from zero, d > 0
fn round_div(n: i64, d: i64) -> i64 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}

fn find_spec(key: &str) -> Option<&'static LineItemSpec> {
    LINE_ITEMS.iter().find(|spec| {
        normalize_key(spec.name) == key || spec.aliases.contains(&key)
    })
}

/// Политика раздела выручки: таблица по умолчанию + переопределения.
///
/// Переопределение - целый процент владельца 0..=100 на статью; доля
/// оператора всегда дополнение до 100. Таблица по умолчанию никогда
/// не мутируется.
#[derive(Debug, Clone, Default)]
pub struct AllocationPolicy {
    overrides: BTreeMap<String, u8>,
}

impl AllocationPolicy {
    /// Переопределяет долю владельца для одной статьи
    ///
    /// Статья ищется по каноническому имени или любому её алиасу.
    pub fn with_override(mut self, item: &str, owner_pct: u8) -> Result<Self, ParseError> {
        if owner_pct > 100 {
            return Err(ParseError::BadSplit {
                item: item.to_string(),
                pct: owner_pct,
            });
        }

        let key = normalize_key(item);
        let spec = find_spec(&key)
            .ok_or_else(|| ParseError::UnknownLineItem(item.to_string()))?;

        self.overrides.insert(normalize_key(spec.name), owner_pct);
        Ok(self)
    }

    /// Действующая доля владельца для статьи, в процентах
    pub fn owner_pct(&self, item: &LineItemSpec) -> u8 {
        self.overrides
            .get(&normalize_key(item.name))
            .copied()
            .unwrap_or(item.default_owner_pct)
    }

    /// Действующая доля владельца в базисных пунктах (10 000 = 100%)
    pub fn owner_bps(&self, item: &LineItemSpec) -> i64 {
        self.owner_pct(item) as i64 * 100
    }

    /// Делит сумму статьи на (доля оператора, доля владельца), в центах.
    ///
    /// Округляется только доля оператора; доля владельца получается
    /// вычитанием, поэтому `lr + owner == amount` выполняется точно
    /// для любой суммы, без потери цента на независимых округлениях.
    pub fn split_cents(&self, item: &LineItemSpec, amount_cents: Cents) -> (Cents, Cents) {
        let lr_bps = BPS_SCALE - self.owner_bps(item);
        let lr_part = round_div(amount_cents * lr_bps, BPS_SCALE);
        let owner_part = amount_cents - lr_part;
        (lr_part, owner_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> &'static LineItemSpec {
        LINE_ITEMS
            .iter()
            .find(|s| s.name == name)
            .expect("line item should exist")
    }

    #[test]
    fn default_trip_price_split_is_70_30() {
        let policy = AllocationPolicy::default();
        // $10.00 при 70% владельца: оператору round(1000*3000/10000) = 300
        let (lr, owner) = policy.split_cents(spec("Trip price"), 1_000);
        assert_eq!(lr, 300);
        assert_eq!(owner, 700);
    }

    #[test]
    fn passthrough_fees_go_entirely_to_lr() {
        let policy = AllocationPolicy::default();
        let (lr, owner) = policy.split_cents(spec("Cleaning"), 2_599);
        assert_eq!(lr, 2_599);
        assert_eq!(owner, 0);
    }

    #[test]
    fn overage_goes_entirely_to_owner() {
        let policy = AllocationPolicy::default();
        let (lr, owner) = policy.split_cents(spec("Distance overage"), 1_234);
        assert_eq!(lr, 0);
        assert_eq!(owner, 1_234);
    }

    #[test]
    fn split_parts_always_sum_exactly() {
        let policy = AllocationPolicy::default();
        let amounts: &[Cents] = &[0, 1, -1, 99, -99, 333, 1_000, -4_500, 123_457, -123_457];

        for item in LINE_ITEMS {
            for &amount in amounts {
                let (lr, owner) = policy.split_cents(item, amount);
                assert_eq!(
                    lr + owner,
                    amount,
                    "split must be exact for '{}' at {} cents",
                    item.name,
                    amount
                );
            }
        }
    }

    #[test]
    fn override_replaces_default() {
        let policy = AllocationPolicy::default()
            .with_override("Trip price", 80)
            .expect("override should apply");

        let (lr, owner) = policy.split_cents(spec("Trip price"), 1_000);
        assert_eq!(lr, 200);
        assert_eq!(owner, 800);

        // остальные статьи не трогаем
        let (lr, owner) = policy.split_cents(spec("Cleaning"), 1_000);
        assert_eq!(lr, 1_000);
        assert_eq!(owner, 0);
    }

    #[test]
    fn override_accepts_alias_and_any_case() {
        let policy = AllocationPolicy::default()
            .with_override("GAS Reimbursement", 50)
            .expect("alias should resolve");
        assert_eq!(policy.owner_pct(spec("Gas")), 50);
    }

    #[test]
    fn override_above_100_is_rejected() {
        let err = AllocationPolicy::default()
            .with_override("Trip price", 101)
            .unwrap_err();
        assert!(matches!(err, ParseError::BadSplit { pct: 101, .. }));
    }

    #[test]
    fn override_for_unknown_item_is_rejected() {
        let err = AllocationPolicy::default()
            .with_override("Parking mystery", 10)
            .unwrap_err();
        assert!(matches!(err, ParseError::UnknownLineItem(_)));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_div(5, 10), 1);
        assert_eq!(round_div(-5, 10), -1);
        assert_eq!(round_div(4, 10), 0);
        assert_eq!(round_div(-4, 10), 0);
        // 150 центов при 25% оператора: 37.5 -> 38
        assert_eq!(round_div(150 * 2_500, BPS_SCALE), 38);
    }
}
