// Primitives for reading CSV files.

use survey_aggregates::SurveyRecord;

use crate::survey::{
    io_common::{builder_for_header, simplify_file_name},
    *,
};

pub fn read_csv_survey(path: String, _cfs: &FileSource) -> BSurveyResult<Vec<SurveyRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)
        .context(OpeningCsvSnafu { path: path.clone() })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvHeaderSnafu { path: path.clone() })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_survey: header: {:?}", header);
    let mut builder = builder_for_header(&path, &header)?;

    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        if is_empty_line(&line) {
            debug!("read_csv_survey: lineno: {:?}: skipping empty line", lineno);
            continue;
        }
        if line.len() != header.len() {
            debug!(
                "read_csv_survey: lineno: {:?}: {} fields, expected {}",
                lineno,
                line.len(),
                header.len()
            );
        }
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        builder
            .add_row(&cells)
            .context(InvalidHeaderSnafu { path: path.clone() })?;
    }
    let records = builder.into_records();
    info!(
        "read_csv_survey: {}: {} records",
        simplify_file_name(&path),
        records.len()
    );
    Ok(records)
}

fn is_empty_line(line: &csv::StringRecord) -> bool {
    line.len() == 1 && line.get(0).map(|s| s.is_empty()).unwrap_or(true)
}
