use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use survey_aggregates::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

use crate::survey::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening CSV file {path}: {source}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading the header of {path}: {source}"))]
    CsvHeader { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening Excel file {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet or no header row in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Several worksheets in {path}, a worksheet name must be provided"))]
    AmbiguousWorksheet { path: String },
    #[snafu(display("Cannot find worksheet {name} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Invalid header in {path}: {source}"))]
    InvalidHeader {
        source: AggregateErrors,
        path: String,
    },
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing output to {path}: {source}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Input type not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown cross-tab policy {policy:?} (expected strict or open)"))]
    UnknownDomainPolicy { policy: String },
    #[snafu(display("No survey data: provide an input file or a configuration with data sources"))]
    MissingInput {},
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;
pub type BSurveyResult<T> = Result<T, Box<SurveyError>>;

/// The options of one run, as collected from the command line.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<String>,
    pub reference: Option<String>,
    pub out: Option<String>,
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub excel_worksheet_name: Option<String>,
    pub domain_policy: Option<String>,
    pub summary: bool,
}

/// The outcome of loading the survey. A failed load is final: there is no
/// retry and no partial data.
#[derive(Debug)]
pub enum DashboardState {
    Loaded {
        respondents: usize,
        bundle: SurveyBundle,
        summary: SummaryView,
    },
    Failed(Box<SurveyError>),
}

fn metric_to_json(m: &Metric) -> JSValue {
    match m {
        Metric::Count(c) => json!(c),
        Metric::Average(AverageValue::Empty) => json!(0),
        Metric::Average(a) => json!(a.to_string()),
    }
}

fn table_to_json(t: &AggregateTable, label_key: &str, metric_key: &str) -> Vec<JSValue> {
    t.entries
        .iter()
        .map(|e| {
            let mut obj: JSMap<String, JSValue> = JSMap::new();
            obj.insert(label_key.to_string(), json!(e.label));
            obj.insert(metric_key.to_string(), metric_to_json(&e.metric));
            JSValue::Object(obj)
        })
        .collect()
}

fn timing_to_json(timing: &[TimingEntry]) -> Vec<JSValue> {
    timing
        .iter()
        .map(|e| {
            json!({
                "time": e.time_slot,
                "average": metric_to_json(&Metric::Average(e.average))
            })
        })
        .collect()
}

fn cross_tab_to_json(ct: &CrossTab, row_key: &str) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for (row_name, cells) in ct.rows.iter().zip(ct.cells.iter()) {
        let mut obj: JSMap<String, JSValue> = JSMap::new();
        obj.insert(row_key.to_string(), json!(row_name));
        for (col_name, count) in ct.cols.iter().zip(cells.iter()) {
            obj.insert(col_name.clone(), json!(count));
        }
        l.push(JSValue::Object(obj));
    }
    l
}

fn shares_to_json(shares: &[ShareEntry]) -> Vec<JSValue> {
    shares
        .iter()
        .map(|s| json!({"name": s.label, "value": s.percent}))
        .collect()
}

pub fn bundle_to_json(b: &SurveyBundle) -> JSValue {
    json!({
        "demographics": {
            "ageGroups": table_to_json(&b.demographics.age_groups, "name", "value"),
            "countries": table_to_json(&b.demographics.countries, "name", "value"),
            "wellnessInterest": table_to_json(&b.demographics.wellness_interest, "name", "value"),
        },
        "consumption": {
            "cupsPerDay": table_to_json(&b.consumption.cups_per_day, "name", "value"),
            "brewingMethods": table_to_json(&b.consumption.brewing_methods, "name", "value"),
            "roastPreferences": table_to_json(&b.consumption.roast_preferences, "name", "value"),
            "timingData": timing_to_json(&b.consumption.timing),
        },
        "preferences": {
            "factors": table_to_json(&b.preferences.factors, "factor", "average"),
            "additives": table_to_json(&b.preferences.additives, "name", "value"),
            "locations": table_to_json(&b.preferences.locations, "location", "average"),
        },
        "insights": {
            "awareness": table_to_json(&b.insights.awareness, "name", "value"),
            "tryFactors": table_to_json(&b.insights.try_factors, "name", "value"),
            "wowFactors": table_to_json(&b.insights.wow_factors, "name", "value"),
            "ageVsRoast": cross_tab_to_json(&b.insights.age_vs_roast, "age"),
        }
    })
}

fn summary_to_json(s: &SummaryView) -> JSValue {
    json!({
        "respondents": s.respondents,
        "countries": shares_to_json(&s.countries),
        "wellnessInterest": shares_to_json(&s.wellness_interest),
        "roast": shares_to_json(&s.roast),
        "brewing": shares_to_json(&s.brewing),
    })
}

fn build_summary_js(
    settings: &OutputSettings,
    respondents: usize,
    bundle: &SurveyBundle,
    summary: Option<&SummaryView>,
) -> JSValue {
    let c = OutputConfig {
        name: settings.survey_name.clone(),
        date: settings.survey_date.clone(),
        respondents: respondents.to_string(),
    };
    let mut js = json!({
        "survey": c,
        "results": bundle_to_json(bundle) });
    if let Some(s) = summary {
        js["summary"] = summary_to_json(s);
    }
    js
}

fn read_survey_data(cfs: &FileSource) -> BSurveyResult<Vec<SurveyRecord>> {
    let p = cfs.file_path.clone();
    info!("Attempting to read survey file {:?}", p);
    match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_survey(p, cfs),
        "xlsx" | "excel" => io_excel::read_excel_survey(p, cfs),
        x => UnknownProviderSnafu { provider: x }.fail().map_err(Box::new),
    }
}

/// Reads every source, in order. Any failure aborts the whole load.
fn load_records(sources: &[FileSource]) -> BSurveyResult<Vec<SurveyRecord>> {
    if sources.is_empty() {
        return MissingInputSnafu {}.fail().map_err(Box::new);
    }
    let mut data: Vec<SurveyRecord> = Vec::new();
    for cfs in sources.iter() {
        let mut file_data = read_survey_data(cfs)?;
        data.append(&mut file_data);
    }
    info!("Loaded {} survey records", data.len());
    Ok(data)
}

/// Loads the survey data and computes all the tables, once.
pub fn load_dashboard(sources: &[FileSource], policy: DomainPolicy) -> DashboardState {
    let records = match load_records(sources) {
        Ok(x) => x,
        Err(e) => {
            warn!("Error fetching or processing survey data: {}", e);
            return DashboardState::Failed(e);
        }
    };
    let bundle = aggregate_survey(&records, policy);
    let summary = summarize(&records, &bundle);
    DashboardState::Loaded {
        respondents: records.len(),
        bundle,
        summary,
    }
}

/// Resolves the configuration and the directory its relative paths refer to.
fn resolve_config(opts: &RunOptions) -> BSurveyResult<(SurveyConfig, PathBuf)> {
    let (mut config, root) = match &opts.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => {
            let input = opts.input.clone().context(MissingInputSnafu {})?;
            let provider = opts.input_type.clone().unwrap_or_else(|| "csv".to_string());
            let config =
                SurveyConfig::for_input(&input, &provider, opts.excel_worksheet_name.clone());
            return Ok((config, PathBuf::new()));
        }
    };
    config.data_sources = config
        .data_sources
        .iter()
        .map(|cfs| FileSource {
            file_path: root.join(&cfs.file_path).display().to_string(),
            ..cfs.clone()
        })
        .collect();
    // The command line input replaces the sources of the configuration.
    if let Some(input) = &opts.input {
        let provider = opts.input_type.clone().unwrap_or_else(|| "csv".to_string());
        config.data_sources = vec![FileSource {
            provider,
            file_path: input.clone(),
            excel_worksheet_name: opts.excel_worksheet_name.clone(),
        }];
    }
    Ok((config, root))
}

fn write_output(target: Option<String>, contents: &str) -> BSurveyResult<()> {
    match target.as_deref() {
        None | Some("stdout") => {
            println!("{}", contents);
        }
        Some(path) => {
            info!("Writing survey results to {:?}", path);
            fs::write(path, contents).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

fn check_reference(summary_p: String, pretty_js_stats: &str) -> BSurveyResult<()> {
    let summary_ref = read_summary(summary_p)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return ReferenceMismatchSnafu {}.fail().map_err(Box::new);
    }
    Ok(())
}

pub fn run_survey(opts: &RunOptions) -> BSurveyResult<()> {
    let (config, root) = resolve_config(opts)?;
    info!("config: {:?}", config);

    let policy = match &opts.domain_policy {
        Some(p) => parse_domain_policy(p)?,
        None => config.domain_policy()?,
    };

    let (respondents, bundle, summary) = match load_dashboard(&config.data_sources, policy) {
        DashboardState::Loaded {
            respondents,
            bundle,
            summary,
        } => (respondents, bundle, summary),
        DashboardState::Failed(e) => return Err(e),
    };

    let include_summary = opts.summary || config.output_settings.include_summary.unwrap_or(false);
    let result_js = build_summary_js(
        &config.output_settings,
        respondents,
        &bundle,
        if include_summary { Some(&summary) } else { None },
    );
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    // The command line takes precedence over the configuration.
    let out = opts.out.clone().or_else(|| {
        config
            .output_settings
            .output_path
            .as_ref()
            .map(|p| root.join(p).display().to_string())
    });
    write_output(out, &pretty_js_stats)?;

    if let Some(summary_p) = opts.reference.clone() {
        check_reference(summary_p, &pretty_js_stats)?;
    }
    Ok(())
}

#[cfg(test)]
fn run_survey_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> BSurveyResult<()> {
    let test_dir = option_env!("SURVEY_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests"));
    info!("Running test {}", test_name);
    let opts = RunOptions {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        out: Some("stdout".to_string()),
        ..RunOptions::default()
    };
    run_survey(&opts)
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let res = run_survey_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    );
    if let Err(e) = res {
        panic!("An error occured in {}: {}", test_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn fixture_source(test_name: &str, file_name: &str) -> FileSource {
        FileSource {
            provider: "csv".to_string(),
            file_path: format!(
                "{}/tests/{}/{}",
                env!("CARGO_MANIFEST_DIR"),
                test_name,
                file_name
            ),
            excel_worksheet_name: None,
        }
    }

    #[test]
    fn small_survey() {
        init();
        test_wrapper("small_survey");
    }

    #[test]
    fn small_survey_open_cross_tab() {
        init();
        let sources = vec![fixture_source("small_survey", "small_survey.csv")];
        match load_dashboard(&sources, DomainPolicy::Open) {
            DashboardState::Loaded {
                respondents,
                bundle,
                ..
            } => {
                assert_eq!(respondents, 5);
                let ct = &bundle.insights.age_vs_roast;
                assert_eq!(ct.rows.len(), 6);
                assert_eq!(ct.cols.last().map(|s| s.as_str()), Some("espresso"));
                assert_eq!(ct.get("65+", "espresso"), Some(1));
                assert_eq!(ct.total(), 5);
            }
            DashboardState::Failed(e) => panic!("load failed: {}", e),
        }
    }

    #[test]
    fn missing_file_is_a_terminal_failure() {
        init();
        let sources = vec![fixture_source("small_survey", "no_such_file.csv")];
        match load_dashboard(&sources, DomainPolicy::Strict) {
            DashboardState::Failed(e) => {
                assert!(matches!(*e, SurveyError::OpeningCsv { .. }))
            }
            DashboardState::Loaded { .. } => panic!("expected a failed load"),
        }
    }

    #[test]
    fn unknown_provider() {
        init();
        let mut cfs = fixture_source("small_survey", "small_survey.csv");
        cfs.provider = "ess".to_string();
        let res = load_records(&[cfs]);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SurveyError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn no_input() {
        let res = run_survey(&RunOptions::default());
        assert!(matches!(
            res.map_err(|e| *e),
            Err(SurveyError::MissingInput {})
        ));
    }

    #[test]
    fn averages_render_as_strings() {
        let mut b = survey_aggregates::builder::Builder::new(DomainPolicy::Strict).unwrap();
        b.add_record_simple(&[("factor_taste", "4")]).unwrap();
        b.add_record_simple(&[("factor_taste", "3"), ("rank_cafe", "2")])
            .unwrap();
        let js = bundle_to_json(&b.aggregate());
        assert_eq!(
            js["preferences"]["factors"][0],
            json!({"factor": "Taste", "average": "3.50"})
        );
        assert_eq!(
            js["preferences"]["factors"][1],
            json!({"factor": "Price", "average": 0})
        );
        assert_eq!(
            js["preferences"]["locations"][2],
            json!({"location": "Cafe", "average": "2.00"})
        );
        assert_eq!(
            js["insights"]["ageVsRoast"][0],
            json!({"age": "18-24", "light": 0, "medium": 0, "dark": 0, "not sure": 0, "no preference": 0})
        );
        assert_eq!(js["consumption"]["timingData"][0]["average"], json!(0));
    }

    #[test]
    fn cross_tab_rows_keep_column_order() {
        let mut b = survey_aggregates::builder::Builder::new(DomainPolicy::Open).unwrap();
        b.add_record_simple(&[("age_group", "25-34"), ("roast_preference", "espresso")])
            .unwrap();
        let js = bundle_to_json(&b.aggregate());
        let keys: Vec<&str> = js["insights"]["ageVsRoast"][1]
            .as_object()
            .map(|o| o.keys().map(|k| k.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(
            keys,
            vec!["age", "light", "medium", "dark", "not sure", "no preference", "espresso"]
        );
        assert_eq!(js["insights"]["ageVsRoast"][1]["espresso"], json!(1));
    }
}
