use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Тип для хранения денежных сумм в центах, signed
///
/// Все суммы, участвующие в расчёте долей, живут в этом типе.
/// Перевод в десятичную валюту происходит только на границе чтения
/// (аксессоры ниже и поля [`crate::DashboardAggregate`]).
pub type Cents = i64;

/// Плейсхолдер владельца, если его не удалось определить ни одной эвристикой
pub const UNKNOWN_OWNER: &str = "Unknown owner";

/// Плейсхолдер арендатора при отсутствии колонки или пустой ячейке
pub const UNKNOWN_GUEST: &str = "Unknown guest";

const SECONDS_PER_DAY: i64 = 86_400;

/// Перевод центов в десятичную валюту
///
/// Единственное место, где целочисленные суммы становятся f64.
pub fn cents_to_currency(cents: Cents) -> f64 {
    cents as f64 / 100.0
}

/// Центральная структура библиотеки: одна распознанная строка бронирования.
///
/// Создаётся один раз при парсинге строки; после валидации не меняется,
/// за единственным исключением: батч-проход может переписать `owner_name`
/// с плейсхолдера на имя, найденное у других строк той же машины.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    /// номер строки в исходном файле, 1-based (строка заголовка = 1)
    pub row_number: usize,
    /// начало поездки
    pub trip_start: NaiveDateTime,
    /// конец поездки
    ///
    /// `trip_end >= trip_start` не гарантируется: в реальных выгрузках
    /// встречается обратный порядок, длительность при этом считается как 1 день.
    pub trip_end: NaiveDateTime,
    /// отображаемое имя машины, непустое
    pub vehicle_name: String,
    /// имя владельца машины (или [`UNKNOWN_OWNER`])
    pub owner_name: String,
    /// имя арендатора (или [`UNKNOWN_GUEST`])
    pub guest_name: String,
    /// основная выставленная сумма (в центах)
    pub gross_revenue_cents: Cents,
    /// чистый заработок по данным маркетплейса (в центах)
    pub net_earnings_cents: Option<Cents>,
    /// выручка по допам (в центах)
    pub addons_revenue_cents: Option<Cents>,
    /// доля оператора парка (в центах)
    pub lr_share_cents: Cents,
    /// доля владельца машины (в центах)
    pub owner_share_cents: Cents,
    /// отменено ли бронирование
    pub is_cancelled: bool,
    /// статус поездки как есть, например "Completed" или "Cancelled"
    pub status: Option<String>,
}

impl TripRecord {
    /// Заработок строки для сверки: чистый, если он есть, иначе основной
    pub fn total_earnings_cents(&self) -> Cents {
        self.net_earnings_cents.unwrap_or(self.gross_revenue_cents)
    }

    /// Длительность поездки в днях: ceil по суткам, минимум 1
    pub fn day_span(&self) -> i64 {
        let seconds = (self.trip_end - self.trip_start).num_seconds();
        ((seconds + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY)).max(1)
    }

    pub fn gross_revenue(&self) -> f64 {
        cents_to_currency(self.gross_revenue_cents)
    }

    pub fn net_earnings(&self) -> Option<f64> {
        self.net_earnings_cents.map(cents_to_currency)
    }

    pub fn lr_share(&self) -> f64 {
        cents_to_currency(self.lr_share_cents)
    }

    pub fn owner_share(&self) -> f64 {
        cents_to_currency(self.owner_share_cents)
    }
}

impl fmt::Display for TripRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<5} {} .. {} {:<30} {:>10.2} lr {:>9.2} owner {:>9.2} {}",
            self.row_number,
            self.trip_start.format("%Y-%m-%d"),
            self.trip_end.format("%Y-%m-%d"),
            self.vehicle_name,
            self.gross_revenue(),
            self.lr_share(),
            self.owner_share(),
            self.status.as_deref().unwrap_or("-"),
        )
    }
}

/// Результат разбора одной выгрузки: валидные строки + предупреждения.
///
/// Предупреждения отсортированы по номеру исходной строки; каждая начинается
/// с префикса `Row N:`.
#[derive(Debug, Serialize)]
pub struct EarningsReport {
    /// валидные, распределённые и дозаполненные строки
    pub records: Vec<TripRecord>,
    /// диагностика по отброшенным строкам и неопознанным владельцам
    pub warnings: Vec<String>,
}
