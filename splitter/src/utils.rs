use chrono::{NaiveDate, NaiveDateTime};
use crate::model::Cents;

/// Нормализует заголовок колонки или имя статьи для сравнения с алиасами:
/// нижний регистр, остаются только буквы и цифры
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Форматы дат, которые встречаются в реальных выгрузках маркетплейса.
///
/// Первым идёт локализованный US-формат — именно в нём выгружает экспорт,
/// остальные на случай ручной правки файла в таблицах.
const DATE_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M",
];

const DATE_ONLY_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%m/%d/%y",
];

/// Пробует распарсить дату-время перебором известных форматов
///
/// Дата без времени трактуется как полночь. Нераспознанное значение - None.
pub(crate) fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_ONLY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Парсит денежную ячейку в центы
///
/// Понимает знак доллара, разделители тысяч и бухгалтерские скобки:
/// `"(45.00)"` читается как `-4500`. Пустая строка и одиночный `-` - None,
/// как и всё, что не похоже на десятичное число со знаком.
///
/// Количество центов считается строковой арифметикой, без float:
/// лишние дробные разряды округляются по третьему (half away from zero).
pub(crate) fn parse_money_cents(raw: &str) -> Option<Cents> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let mut negative = false;

    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = s[1..s.len() - 1].trim();
    }

    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    let mut cleaned = cleaned.as_str();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    if let Some(rest) = cleaned.strip_prefix('-') {
        negative = !negative;
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest;
    }

    let mut split = cleaned.split('.');
    // cleaned точно не пусто, так что ошибки здесь быть не может
    let int_part = split.next().unwrap();
    let frac_part = split.next().unwrap_or("");
    if split.next().is_some() {
        // больше одной точки — странный формат
        return None;
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: Cents = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let digits: Vec<u32> = frac_part
        .chars()
        .map(|c| c.to_digit(10).unwrap_or(0))
        .collect();

    let frac_cents: Cents = match digits.len() {
        0 => 0,
        1 => (digits[0] * 10) as Cents,
        _ => {
            let mut v = (digits[0] * 10 + digits[1]) as Cents;
            if digits[2..].first().is_some_and(|d| *d >= 5) {
                v += 1;
            }
            v
        }
    };

    let cents = whole.checked_mul(100)?.checked_add(frac_cents)?;

    Some(if negative { -cents } else { cents })
}

/// Парсит явный флаг отмены
///
/// Нераспознанное значение - None, чтобы вызывающий мог откатиться
/// на эвристику по статусу.
pub(crate) fn parse_cancelled_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Эвристика отмены по строке статуса
pub(crate) fn status_is_cancelled(status: &str) -> bool {
    status.to_lowercase().contains("cancel")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn money_formatted_with_symbol_and_thousands() {
        assert_eq!(parse_money_cents("$1,234.56"), Some(123_456));
        assert_eq!(parse_money_cents("  $9.99 "), Some(999));
        assert_eq!(parse_money_cents("1234"), Some(123_400));
    }

    #[test]
    fn money_parentheses_mean_negative() {
        assert_eq!(parse_money_cents("(100.00)"), Some(-10_000));
        assert_eq!(parse_money_cents("($45.00)"), Some(-4_500));
        assert_eq!(parse_money_cents("-45.00"), Some(-4_500));
    }

    #[test]
    fn money_empty_and_dash_are_null() {
        assert_eq!(parse_money_cents(""), None);
        assert_eq!(parse_money_cents("   "), None);
        assert_eq!(parse_money_cents("-"), None);
        assert_eq!(parse_money_cents("$-"), None);
    }

    #[test]
    fn money_garbage_is_rejected() {
        assert_eq!(parse_money_cents("abc"), None);
        assert_eq!(parse_money_cents("12.34.56"), None);
        assert_eq!(parse_money_cents("12a"), None);
        assert_eq!(parse_money_cents("."), None);
    }

    #[test]
    fn money_fractional_digits_round_half_away() {
        assert_eq!(parse_money_cents("0"), Some(0));
        assert_eq!(parse_money_cents("0.4"), Some(40));
        assert_eq!(parse_money_cents("0.455"), Some(46));
        assert_eq!(parse_money_cents("0.4549"), Some(45));
        assert_eq!(parse_money_cents("(0.455)"), Some(-46));
        assert_eq!(parse_money_cents(".5"), Some(50));
    }

    #[test]
    fn date_us_locale_with_am_pm() {
        let dt = parse_date_time("1/15/2024 10:30 AM").expect("should parse");
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 30);

        let pm = parse_date_time("01/15/2024 03:05 PM").expect("should parse");
        assert_eq!(pm.hour(), 15);
    }

    #[test]
    fn date_iso_and_date_only() {
        assert!(parse_date_time("2024-02-29 12:00:00").is_some());
        let midnight = parse_date_time("2024-03-01").expect("should parse");
        assert_eq!(midnight.hour(), 0);
        assert!(parse_date_time("not a date").is_none());
        assert!(parse_date_time("").is_none());
    }

    #[test]
    fn cancelled_flag_variants() {
        assert_eq!(parse_cancelled_flag("TRUE"), Some(true));
        assert_eq!(parse_cancelled_flag("yes"), Some(true));
        assert_eq!(parse_cancelled_flag("1"), Some(true));
        assert_eq!(parse_cancelled_flag("False"), Some(false));
        assert_eq!(parse_cancelled_flag("no"), Some(false));
        assert_eq!(parse_cancelled_flag("0"), Some(false));
        assert_eq!(parse_cancelled_flag("maybe"), None);
    }

    #[test]
    fn cancel_substring_in_status() {
        assert!(status_is_cancelled("Cancelled by guest"));
        assert!(status_is_cancelled("CANCELED"));
        assert!(!status_is_cancelled("Completed"));
    }
}
