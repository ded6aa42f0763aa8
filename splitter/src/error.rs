use std::{error::Error, io::Error as IoError, fmt};

/// Ошибки при парсинге выгрузки
///
/// Построчные проблемы (кривая дата, нечитаемая сумма, пустое имя машины)
/// сюда не попадают: они копятся как предупреждения в [`crate::EarningsReport`].
#[derive(Debug)]
pub enum ParseError {
    // обёртки

    /// обёртка csv::Error
    Csv(csv::Error),
    /// обёртка std::io::Error
    Io(IoError),

    // логические ошибки

    /// не нашлась хотя бы одна из обязательных колонок
    ///
    /// Содержит человекочитаемые названия недостающих колонок
    MissingColumns(Vec<&'static str>),
    /// после валидации не осталось ни одной строки
    NoValidRows,
    /// доля владельца вне диапазона 0..=100
    BadSplit {
        item: String,
        pct: u8,
    },
    /// переопределение для неизвестной статьи
    UnknownLineItem(String),
    /// ошибка разбора строки заголовка (csv)
    Header(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Csv(e) => write!(f, "CSV error: {e}"),
            ParseError::Io(e) => write!(f, "io error: {e}"),
            ParseError::MissingColumns(labels) => {
                write!(f, "Missing required columns: {}", labels.join(", "))
            }
            ParseError::NoValidRows => write!(f, "No valid rows found after parsing."),
            ParseError::BadSplit { item, pct } => {
                write!(f, "owner split for '{item}' must be 0..=100, got {pct}")
            }
            ParseError::UnknownLineItem(name) => write!(f, "unknown line item: '{name}'"),
            ParseError::Header(msg) => write!(f, "invalid header: {msg}"),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Csv(e) => Some(e),
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for ParseError {
    fn from(e: csv::Error) -> Self {
        ParseError::Csv(e)
    }
}

impl From<IoError> for ParseError {
    fn from(e: IoError) -> Self {
        ParseError::Io(e)
    }
}
