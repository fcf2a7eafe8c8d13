use crate::survey::io_common::simplify_file_name;
use crate::survey::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    #[serde(rename = "surveyDate")]
    pub survey_date: Option<String>,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "includeSummary")]
    pub include_summary: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub name: String,
    pub date: Option<String>,
    pub respondents: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSources")]
    pub data_sources: Vec<FileSource>,
    #[serde(rename = "crossTabPolicy")]
    pub cross_tab_policy: Option<String>,
}

impl SurveyConfig {
    /// A configuration for a single data file given on the command line.
    pub fn for_input(path: &str, provider: &str, worksheet: Option<String>) -> SurveyConfig {
        SurveyConfig {
            output_settings: OutputSettings {
                survey_name: simplify_file_name(path),
                survey_date: None,
                output_path: None,
                include_summary: None,
            },
            data_sources: vec![FileSource {
                provider: provider.to_string(),
                file_path: path.to_string(),
                excel_worksheet_name: worksheet,
            }],
            cross_tab_policy: None,
        }
    }

    pub fn domain_policy(&self) -> SurveyResult<DomainPolicy> {
        match self.cross_tab_policy.as_deref() {
            None => Ok(DomainPolicy::default()),
            Some(p) => parse_domain_policy(p),
        }
    }
}

pub fn parse_domain_policy(s: &str) -> SurveyResult<DomainPolicy> {
    match s {
        "strict" => Ok(DomainPolicy::Strict),
        "open" => Ok(DomainPolicy::Open),
        x => UnknownDomainPolicySnafu { policy: x }.fail(),
    }
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path: path.clone() })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    if !js.is_object() {
        whatever!("Reference summary {} is not a JSON object", path)
    }
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let js = r#"{
            "outputSettings": { "surveyName": "Nordic coffee" },
            "dataSources": [ { "provider": "csv", "filePath": "survey_results.csv" } ]
        }"#;
        let config: SurveyConfig = serde_json::from_str(js).unwrap();
        assert_eq!(config.output_settings.survey_name, "Nordic coffee");
        assert_eq!(config.output_settings.include_summary, None);
        assert_eq!(config.data_sources[0].excel_worksheet_name, None);
        assert_eq!(config.domain_policy().unwrap(), DomainPolicy::Strict);
    }

    #[test]
    fn domain_policies() {
        assert_eq!(parse_domain_policy("open").unwrap(), DomainPolicy::Open);
        assert!(matches!(
            parse_domain_policy("closed"),
            Err(SurveyError::UnknownDomainPolicy { .. })
        ));
    }

    #[test]
    fn input_config_uses_file_name() {
        let config = SurveyConfig::for_input("data/survey_results.csv", "csv", None);
        assert_eq!(config.output_settings.survey_name, "survey_results.csv");
        assert_eq!(config.data_sources.len(), 1);
    }
}
