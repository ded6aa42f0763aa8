mod utils;

use std::io::Read;

use csv::ReaderBuilder;

use crate::allocation::AllocationPolicy;
use crate::columns::ColumnMap;
use crate::error::ParseError;
use crate::model::EarningsReport;
use crate::owner::backfill_owners;
use utils::build_record;

impl EarningsReport {
    /// Разбирает выгрузку маркетплейса в валидные строки с посчитанными долями.
    ///
    /// Первая строка файла - заголовок; она же строка номер 1, так что первая
    /// строка данных получает номер 2 в диагностике.
    ///
    /// Ошибки уровня файла (нет обязательных колонок, ни одной валидной
    /// строки) фатальны; проблемы отдельных строк копятся в `warnings`
    /// и не прерывают разбор.
    pub fn parse<R: Read>(reader: R, policy: &AllocationPolicy) -> Result<Self, ParseError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records_iter = rdr.records();

        let header_row = match records_iter.next() {
            Some(result) => result?,
            None => return Err(ParseError::Header("empty file: header row not found".into())),
        };

        let columns = ColumnMap::from_headers(&header_row)?;

        let mut records = Vec::new();
        let mut warnings: Vec<(usize, String)> = Vec::new();
        let mut row_number = 1;

        for result in records_iter {
            let row = result?;
            row_number += 1;

            if row.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            match build_record(&row, row_number, &columns, policy) {
                Ok(rec) => records.push(rec),
                Err(warning) => warnings.push((row_number, warning)),
            }
        }

        if records.is_empty() {
            return Err(ParseError::NoValidRows);
        }

        // дозаполнение владельцев идёт строго после разбора всех строк
        warnings.extend(backfill_owners(&mut records));

        warnings.sort_by_key(|(row, _)| *row);

        Ok(EarningsReport {
            records,
            warnings: warnings.into_iter().map(|(_, msg)| msg).collect(),
        })
    }
}
