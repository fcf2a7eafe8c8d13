use calamine::{open_workbook, DataType, Reader, Xlsx};

use survey_aggregates::{SurveyRecord, SurveyValue};

use crate::survey::{
    io_common::{builder_for_header, normalize_header, simplify_file_name},
    *,
};

pub fn read_excel_survey(path: String, cfs: &FileSource) -> BSurveyResult<Vec<SurveyRecord>> {
    let wrange = get_range(&path, cfs)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu { path: path.clone() })?;
    let header: Vec<String> = header_row.iter().map(header_name).collect();
    debug!("read_excel_survey: header: {:?}", header);
    let mut builder = builder_for_header(&path, &header)?;
    let columns: Vec<String> = normalize_header(&header);

    for (idx, row) in iter.enumerate() {
        debug!("read_excel_survey: idx: {:?} row: {:?}", idx, &row);
        let record = record_from_cells(&columns, row);
        if record.is_blank() {
            continue;
        }
        builder
            .add_record(&record)
            .context(InvalidHeaderSnafu { path: path.clone() })?;
    }
    let records = builder.into_records();
    info!(
        "read_excel_survey: {}: {} records",
        simplify_file_name(&path),
        records.len()
    );
    Ok(records)
}

fn header_name(cell: &DataType) -> String {
    cell_value(cell).map(|v| v.label()).unwrap_or_default()
}

fn record_from_cells(columns: &[String], row: &[DataType]) -> SurveyRecord {
    let mut record = SurveyRecord::new();
    for (name, cell) in columns.iter().zip(row.iter()) {
        if let Some(v) = cell_value(cell) {
            record.insert(name, v);
        }
    }
    record
}

fn cell_value(cell: &DataType) -> Option<SurveyValue> {
    match cell {
        DataType::Int(i) => Some(SurveyValue::Number(*i as f64)),
        DataType::Float(f) => Some(SurveyValue::Number(*f)),
        DataType::String(s) => Some(SurveyValue::parse_dynamic(s)),
        DataType::Bool(b) => Some(SurveyValue::Bool(*b)),
        DataType::Empty => Some(SurveyValue::Null),
        other => {
            warn!("read_excel_survey: unsupported cell {:?}, skipping", other);
            None
        }
    }
}

fn get_range(path: &str, cfs: &FileSource) -> BSurveyResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "read_excel_survey: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyExcelSnafu { path }.fail().map_err(Box::new),
            [(worksheet_name, wrange)] => {
                debug!(
                    "read_excel_survey: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => AmbiguousWorksheetSnafu { path }.fail().map_err(Box::new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_typed() {
        let columns = vec![
            "age_group".to_string(),
            "cups_per_day".to_string(),
            "add_milk".to_string(),
            "rank_home".to_string(),
        ];
        let row = vec![
            DataType::String("25-34".to_string()),
            DataType::String("2".to_string()),
            DataType::Int(1),
            DataType::Empty,
        ];
        let r = record_from_cells(&columns, &row);
        assert_eq!(
            r.get("age_group"),
            Some(&SurveyValue::Text("25-34".to_string()))
        );
        assert_eq!(r.get("cups_per_day"), Some(&SurveyValue::Number(2.0)));
        assert_eq!(r.get("add_milk"), Some(&SurveyValue::Number(1.0)));
        assert!(!r.is_present("rank_home"));
        assert!(r.is_defined("rank_home"));
    }

    #[test]
    fn header_names() {
        assert_eq!(header_name(&DataType::String("country".to_string())), "country");
        assert_eq!(header_name(&DataType::Float(2022.0)), "2022");
        assert_eq!(header_name(&DataType::Empty), "");
    }

    #[test]
    fn missing_workbook() {
        let cfs = FileSource {
            provider: "xlsx".to_string(),
            file_path: "does_not_exist.xlsx".to_string(),
            excel_worksheet_name: None,
        };
        let res = read_excel_survey("does_not_exist.xlsx".to_string(), &cfs);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SurveyError::OpeningExcel { .. })
        ));
    }
}
