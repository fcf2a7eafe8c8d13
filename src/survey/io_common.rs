use std::path::Path;

use survey_aggregates::builder::Builder;
use survey_aggregates::descriptors::all_field_keys;

use crate::survey::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Names the unnamed header cells after their position (`column_3`).
pub fn normalize_header(header: &[String]) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Prepares a record builder for the given header.
pub fn builder_for_header(path: &str, header: &[String]) -> BSurveyResult<Builder> {
    let columns = normalize_header(header);
    debug!("builder_for_header: {}: columns: {:?}", path, columns);
    let unused: Vec<&str> = all_field_keys()
        .into_iter()
        .filter(|k| !columns.iter().any(|c| c.as_str() == *k))
        .collect();
    if !unused.is_empty() {
        debug!(
            "builder_for_header: {}: {} known columns are not in the file: {:?}",
            path,
            unused.len(),
            unused
        );
    }
    let builder = Builder::new(DomainPolicy::default())
        .and_then(|b| b.columns(&columns))
        .context(InvalidHeaderSnafu { path })?;
    Ok(builder)
}
