use std::collections::BTreeMap;

use lazy_regex::regex;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{TripRecord, UNKNOWN_OWNER};
use crate::utils::normalize_key;

/// Марки машин для отсечения имени владельца от названия машины.
///
/// Списки подобраны под один конкретный экспорт и заменяемы как конфигурация;
/// на других выгрузках эвристика может промахиваться, такие строки честно
/// уходят в "Unknown owner" вместо усложнения правил.
///
/// Последовательности токенов уже нормализованы; составные марки идут
/// раньше своих частей.
const VEHICLE_MAKES: &[&[&str]] = &[
    &["land", "rover"],
    &["range", "rover"],
    &["landrover"],
    &["rangerover"],
    &["mercedes", "benz"],
    &["mercedesbenz"],
    &["alfa", "romeo"],
    &["alfaromeo"],
    &["aston", "martin"],
    &["astonmartin"],
    &["mercedes"],
    &["tesla"],
    &["toyota"],
    &["honda"],
    &["bmw"],
    &["ford"],
    &["chevrolet"],
    &["chevy"],
    &["jeep"],
    &["nissan"],
    &["hyundai"],
    &["kia"],
    &["audi"],
    &["volkswagen"],
    &["subaru"],
    &["mazda"],
    &["lexus"],
    &["dodge"],
    &["ram"],
    &["gmc"],
    &["porsche"],
    &["volvo"],
    &["cadillac"],
    &["buick"],
    &["chrysler"],
    &["jaguar"],
    &["mini"],
    &["infiniti"],
    &["acura"],
    &["lincoln"],
    &["mitsubishi"],
    &["genesis"],
    &["polestar"],
    &["rivian"],
    &["lucid"],
    &["fiat"],
    &["maserati"],
];

static INITIALS_RE: Lazy<Regex> = Lazy::new(|| {
    // ^(?:\p{Lu}[\w'’-]*\s+){1,3} - одно-три слова имени с заглавной
    // \p{Lu}\. - инициал с точкой
    // дальше обязан идти хотя бы один непробельный символ (сама машина)
    Regex::new(r"^((?:\p{Lu}[\w'’-]*\s+){1,3}\p{Lu}\.)\s+\S").unwrap()
});

/// Сырьё для определения владельца одной строки
#[derive(Debug, Default)]
pub(crate) struct OwnerSignals<'a> {
    /// явная колонка владельца
    pub(crate) owner: Option<&'a str>,
    pub(crate) first_name: Option<&'a str>,
    pub(crate) last_name: Option<&'a str>,
    /// чистое имя машины
    pub(crate) vehicle: Option<&'a str>,
    /// сырой заголовок объявления, обычно с именем владельца в префиксе
    pub(crate) listing: Option<&'a str>,
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Эвристики по одной строке с названием машины, в порядке приоритета.
///
/// Порядок перечислен литералом, а не спрятан в ветвлениях: каждая
/// стратегия - чистая функция, тестируемая отдельно.
pub(crate) const NAME_STRATEGIES: &[fn(&str) -> Option<String>] = &[
    split_possessive,
    split_leading_initials,
    split_before_make_keyword,
];

/// Определяет имя владельца по всем сигналам строки, в порядке приоритета:
/// явная колонка, имя+фамилия, структурный дифф "чистое имя против
/// заголовка объявления", эвристики по одной строке.
///
/// None - не удалось ничем; плейсхолдер подставляет вызывающий.
pub(crate) fn infer_owner_name(signals: &OwnerSignals) -> Option<String> {
    if let Some(owner) = non_empty(signals.owner) {
        return Some(owner.to_string());
    }

    if let (Some(first), Some(last)) = (
        non_empty(signals.first_name),
        non_empty(signals.last_name),
    ) {
        return Some(format!("{first} {last}"));
    }

    if let (Some(clean), Some(raw)) = (non_empty(signals.vehicle), non_empty(signals.listing)) {
        if let Some(name) = owner_from_listing_diff(clean, raw) {
            return Some(name);
        }
    }

    let label = non_empty(signals.vehicle).or(non_empty(signals.listing))?;
    for strategy in NAME_STRATEGIES {
        if let Some(name) = strategy(label) {
            return Some(name);
        }
    }

    None
}

/// Чистит кандидата в владельцы: хвостовые разделители и притяжательное 's
fn tidy_owner(raw: &str) -> Option<String> {
    let mut s = raw.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | ',' | '.' | ';')
    });

    for suffix in ["'s", "’s", "'S", "’S"] {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped;
            break;
        }
    }

    let s = s
        .trim_end_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | ',' | '.' | ';')
        })
        .trim_start();

    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Префикс заголовка объявления перед чистым именем машины.
///
/// Сначала точное вхождение подстроки; если не вышло - нестрогое
/// пословное сравнение, терпимое к разнице пунктуации
/// ("GLB-Class" против "GLB Class").
fn owner_from_listing_diff(clean: &str, raw: &str) -> Option<String> {
    let clean = clean.trim();
    let raw = raw.trim();
    if clean.is_empty() || raw.is_empty() {
        return None;
    }

    if let Some(pos) = raw.find(clean) {
        if pos == 0 {
            // заголовок начинается с имени машины: префикса нет
            return None;
        }
        return tidy_owner(&raw[..pos]);
    }

    fuzzy_listing_prefix(clean, raw)
}

/// Режет строку на слова по любым небуквенным символам,
/// запоминая байтовое смещение каждого слова
fn tokenize_words(s: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0;

    for (idx, ch) in s.char_indices() {
        if ch.is_alphanumeric() {
            if current.is_empty() {
                start = idx;
            }
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push((start, std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        tokens.push((start, current));
    }

    tokens
}

/// Пословное сравнение хвоста заголовка с чистым именем машины.
///
/// Обе строки режутся на слова по небуквенным символам, так что
/// "GLB-Class" и "GLB Class" дают одинаковые токены. Слова сравниваются
/// по префиксу в обе стороны; хвост заголовка должен совпасть целиком
/// и не короче двух слов (либо всех, если чистое имя короче).
fn fuzzy_listing_prefix(clean: &str, raw: &str) -> Option<String> {
    let clean_tokens = tokenize_words(clean);
    if clean_tokens.is_empty() {
        return None;
    }

    let raw_tokens = tokenize_words(raw);
    let required = clean_tokens.len().min(2);

    for start in 1..raw_tokens.len() {
        let mut matched = 0;
        let limit = (raw_tokens.len() - start).min(clean_tokens.len());

        for j in 0..limit {
            let r = &raw_tokens[start + j].1;
            let c = &clean_tokens[j].1;
            if r.starts_with(c.as_str()) || c.starts_with(r.as_str()) {
                matched += 1;
            } else {
                break;
            }
        }

        if matched >= required && start + matched == raw_tokens.len() {
            let prefix_end = raw_tokens[start].0;
            return tidy_owner(&raw[..prefix_end]);
        }
    }

    None
}

/// "Alice's Tesla Model 3" -> "Alice"
fn split_possessive(label: &str) -> Option<String> {
    let m = regex!(r"['’][sS]\s").find(label)?;
    tidy_owner(&label[..m.start()])
}

/// "John S. Tesla Model 3" -> "John S."
fn split_leading_initials(label: &str) -> Option<String> {
    let caps = INITIALS_RE.captures(label.trim_start())?;
    let name = caps.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// "Ivan Petrov Tesla Model 3" -> "Ivan Petrov"
///
/// Берётся первая марка из списка с непустым префиксом перед ней
fn split_before_make_keyword(label: &str) -> Option<String> {
    let tokens: Vec<&str> = label.split_whitespace().collect();
    let norm: Vec<String> = tokens.iter().map(|t| normalize_key(t)).collect();

    for i in 0..tokens.len() {
        for make in VEHICLE_MAKES {
            if make.len() <= tokens.len() - i
                && make.iter().enumerate().all(|(j, part)| norm[i + j] == *part)
            {
                if i == 0 {
                    // марка в самом начале: префикса нет, ищем дальше
                    break;
                }
                return tidy_owner(&tokens[..i].join(" "));
            }
        }
    }

    None
}

/// Батч-дозаполнение владельцев после разбора всех строк.
///
/// Для каждой машины, у которой хоть одна строка знает владельца, берётся
/// самый частый владелец (при равенстве - лексикографически меньший, чтобы
/// результат не зависел от порядка строк) и вписывается в строки-сироты.
///
/// Возвращает по одному предупреждению на строку, оставшуюся с плейсхолдером.
pub(crate) fn backfill_owners(records: &mut [TripRecord]) -> Vec<(usize, String)> {
    let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for rec in records.iter() {
        if rec.owner_name != UNKNOWN_OWNER {
            *counts
                .entry(rec.vehicle_name.clone())
                .or_default()
                .entry(rec.owner_name.clone())
                .or_insert(0) += 1;
        }
    }

    let majority: BTreeMap<String, String> = counts
        .into_iter()
        .map(|(vehicle, owners)| {
            let best = owners
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
                .map(|(name, _)| name)
                .expect("counts entry is never empty");
            (vehicle, best)
        })
        .collect();

    let mut warnings = Vec::new();
    for rec in records.iter_mut() {
        if rec.owner_name == UNKNOWN_OWNER {
            if let Some(name) = majority.get(&rec.vehicle_name) {
                rec.owner_name = name.clone();
            } else {
                warnings.push((
                    rec.row_number,
                    format!(
                        "Row {}: owner unknown for vehicle '{}'",
                        rec.row_number, rec.vehicle_name
                    ),
                ));
            }
        }
    }

    warnings
}
