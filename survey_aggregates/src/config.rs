// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A single answer in a survey row, after dynamic typing.
///
/// A blank cell is kept as [SurveyValue::Null]. A column missing from a short
/// row is not stored at all in the [SurveyRecord].
#[derive(PartialEq, Debug, Clone)]
pub enum SurveyValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
}

// Numbers outside of this range stay text, like integers that do not fit a double.
const MAX_FLOAT: f64 = 9007199254740992.0;

impl SurveyValue {
    /// Types a raw cell the way spreadsheet exports are usually read:
    /// numeric-looking cells become numbers, `true`/`false` (or `TRUE`/`FALSE`)
    /// become booleans, blank cells become `Null` and everything else stays text.
    pub fn parse_dynamic(raw: &str) -> SurveyValue {
        match raw {
            "" => SurveyValue::Null,
            "true" | "TRUE" => SurveyValue::Bool(true),
            "false" | "FALSE" => SurveyValue::Bool(false),
            s if looks_numeric(s.trim()) => match s.trim().parse::<f64>() {
                Ok(x) if x.abs() < MAX_FLOAT => SurveyValue::Number(x),
                _ => SurveyValue::Text(raw.to_string()),
            },
            _ => SurveyValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SurveyValue::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SurveyValue::Null)
    }

    /// The category label of this value, used as the grouping key.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl Display for SurveyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyValue::Null => Ok(()),
            SurveyValue::Text(s) => write!(f, "{}", s),
            SurveyValue::Bool(b) => write!(f, "{}", b),
            SurveyValue::Number(x) if x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            SurveyValue::Number(x) => write!(f, "{}", x),
        }
    }
}

// -?(\d+\.?|\.\d+|\d+\.\d+)([eE][-+]?\d+)?
fn looks_numeric(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let (mantissa, exponent) = match body.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mut digits = 0;
    let mut dots = 0;
    for c in mantissa.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(e);
            !e.is_empty() && e.chars().all(|c| c.is_ascii_digit())
        }
    }
}

/// One respondent's answers, in column order.
///
/// A field is *defined* when the row has the column, even if the cell is blank,
/// and *present* when the cell holds a non-null value.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct SurveyRecord {
    fields: Vec<(String, SurveyValue)>,
}

impl SurveyRecord {
    pub fn new() -> SurveyRecord {
        SurveyRecord { fields: Vec::new() }
    }

    /// Sets a field. A later value for the same key replaces the earlier one.
    pub fn insert(&mut self, key: &str, value: SurveyValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k.as_str() == key) {
            slot.1 = value;
        } else {
            self.fields.push((key.to_string(), value));
        }
    }

    /// Sets a field from a raw cell, applying dynamic typing.
    pub fn insert_raw(&mut self, key: &str, raw: &str) {
        self.insert(key, SurveyValue::parse_dynamic(raw));
    }

    /// The non-null value of a field.
    pub fn get(&self, key: &str) -> Option<&SurveyValue> {
        self.fields
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
            .filter(|v| !v.is_null())
    }

    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// True when the row has this column, blank or not.
    pub fn is_defined(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k.as_str() == key)
    }

    /// True when no field holds a value.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_null())
    }
}

/// A static (key, label) pair driving table-driven aggregation.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
}

impl FieldDescriptor {
    pub const fn new(key: &'static str, label: &'static str) -> FieldDescriptor {
        FieldDescriptor { key, label }
    }

    pub fn value<'a>(&self, record: &'a SurveyRecord) -> Option<&'a SurveyValue> {
        record.get(self.key)
    }

    /// The numeric value of the field, if present and numeric.
    pub fn number(&self, record: &SurveyRecord) -> Option<f64> {
        self.value(record).and_then(|v| v.as_number())
    }

    /// True only when the field holds exactly the number 1.
    pub fn is_flag_set(&self, record: &SurveyRecord) -> bool {
        self.number(record) == Some(1.0)
    }

    /// True when the row has the column, even with a blank cell.
    pub fn is_defined(&self, record: &SurveyRecord) -> bool {
        record.is_defined(self.key)
    }
}

// ******** Output data structures *********

/// The mean of a field over the records where it is present.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum AverageValue {
    /// No record had the field. Reported as 0.
    Empty,
    /// Already rounded to 2 decimals.
    Mean(f64),
}

impl AverageValue {
    pub fn from_sum(total: f64, count: u64) -> AverageValue {
        if count == 0 {
            AverageValue::Empty
        } else {
            AverageValue::Mean(round_to(total / count as f64, 2))
        }
    }
}

impl Display for AverageValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AverageValue::Empty => write!(f, "0"),
            AverageValue::Mean(x) => write!(f, "{:.2}", x),
        }
    }
}

/// Rounds half away from zero.
pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Metric {
    Count(u64),
    Average(AverageValue),
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Count(c) => write!(f, "{}", c),
            Metric::Average(a) => write!(f, "{}", a),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TableEntry {
    pub label: String,
    pub metric: Metric,
}

/// An ordered list of (label, metric) entries, one per chart.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct AggregateTable {
    pub entries: Vec<TableEntry>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&Metric> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| &e.metric)
    }

    /// Sum of all the count entries. Average entries are ignored.
    pub fn total_count(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| match e.metric {
                Metric::Count(c) => c,
                Metric::Average(_) => 0,
            })
            .sum()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TimingEntry {
    pub time_slot: String,
    pub average: AverageValue,
}

/// What to do with a record whose value is not part of a cross-tab domain.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub enum DomainPolicy {
    /// Drop the record.
    #[default]
    Strict,
    /// Add the value as a new row or column, after the declared ones.
    Open,
}

/// A dense count matrix over two categorical domains.
///
/// Invariant: `cells.len() == rows.len()` and every row has `cols.len()` cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub cells: Vec<Vec<u64>>,
}

impl CrossTab {
    pub fn zeros(rows: &[String], cols: &[String]) -> CrossTab {
        CrossTab {
            rows: rows.to_vec(),
            cols: cols.to_vec(),
            cells: vec![vec![0; cols.len()]; rows.len()],
        }
    }

    pub fn get(&self, row: &str, col: &str) -> Option<u64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.cols.iter().position(|x| x == col)?;
        Some(self.cells[r][c])
    }

    pub fn num_cells(&self) -> usize {
        self.cells.iter().map(|r| r.len()).sum()
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Demographics {
    pub age_groups: AggregateTable,
    pub countries: AggregateTable,
    pub wellness_interest: AggregateTable,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Consumption {
    pub cups_per_day: AggregateTable,
    pub brewing_methods: AggregateTable,
    pub roast_preferences: AggregateTable,
    pub timing: Vec<TimingEntry>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Preferences {
    pub factors: AggregateTable,
    pub additives: AggregateTable,
    pub locations: AggregateTable,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Insights {
    pub awareness: AggregateTable,
    pub try_factors: AggregateTable,
    pub wow_factors: AggregateTable,
    pub age_vs_roast: CrossTab,
}

/// All the tables derived from one load of the survey.
#[derive(PartialEq, Debug, Clone)]
pub struct SurveyBundle {
    pub demographics: Demographics,
    pub consumption: Consumption,
    pub preferences: Preferences,
    pub insights: Insights,
}

/// A category's share of its table, in percent with one decimal.
#[derive(PartialEq, Debug, Clone)]
pub struct ShareEntry {
    pub label: String,
    pub percent: f64,
}

/// The headline figures of the one-page summary.
#[derive(PartialEq, Debug, Clone)]
pub struct SummaryView {
    pub respondents: usize,
    pub countries: Vec<ShareEntry>,
    pub wellness_interest: Vec<ShareEntry>,
    pub roast: Vec<ShareEntry>,
    pub brewing: Vec<ShareEntry>,
}

/// Errors raised when assembling records by hand.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregateErrors {
    EmptyFieldKey,
    DuplicateFieldKey(String),
    /// A positional row was added before the column names were declared.
    MissingColumns,
}

impl Error for AggregateErrors {}

impl Display for AggregateErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateErrors::EmptyFieldKey => write!(f, "empty field key in survey record"),
            AggregateErrors::DuplicateFieldKey(k) => {
                write!(f, "field key {} appears twice in survey record", k)
            }
            AggregateErrors::MissingColumns => write!(f, "no column names declared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_typing() {
        assert_eq!(SurveyValue::parse_dynamic(""), SurveyValue::Null);
        assert_eq!(SurveyValue::parse_dynamic("3"), SurveyValue::Number(3.0));
        assert_eq!(SurveyValue::parse_dynamic("-0.5"), SurveyValue::Number(-0.5));
        assert_eq!(SurveyValue::parse_dynamic("1e3"), SurveyValue::Number(1000.0));
        assert_eq!(SurveyValue::parse_dynamic(" 4 "), SurveyValue::Number(4.0));
        assert_eq!(SurveyValue::parse_dynamic("true"), SurveyValue::Bool(true));
        assert_eq!(SurveyValue::parse_dynamic("FALSE"), SurveyValue::Bool(false));
        assert_eq!(
            SurveyValue::parse_dynamic("True"),
            SurveyValue::Text("True".to_string())
        );
        assert_eq!(
            SurveyValue::parse_dynamic(" true"),
            SurveyValue::Text(" true".to_string())
        );
        assert_eq!(
            SurveyValue::parse_dynamic("25-34"),
            SurveyValue::Text("25-34".to_string())
        );
        assert_eq!(
            SurveyValue::parse_dynamic("inf"),
            SurveyValue::Text("inf".to_string())
        );
        assert_eq!(SurveyValue::parse_dynamic("1."), SurveyValue::Number(1.0));
        assert_eq!(
            SurveyValue::parse_dynamic("."),
            SurveyValue::Text(".".to_string())
        );
        assert_eq!(
            SurveyValue::parse_dynamic("12345678901234567890"),
            SurveyValue::Text("12345678901234567890".to_string())
        );
        assert_eq!(
            SurveyValue::parse_dynamic("  "),
            SurveyValue::Text("  ".to_string())
        );
    }

    #[test]
    fn blank_cells_are_defined_but_not_present() {
        let mut r = SurveyRecord::new();
        r.insert_raw("morning_before_8", "");
        r.insert_raw("country", "Sweden");
        assert!(r.is_defined("morning_before_8"));
        assert!(!r.is_present("morning_before_8"));
        assert_eq!(r.get("morning_before_8"), None);
        assert!(!r.is_defined("morning_8_11"));
        assert!(r.is_present("country"));
        assert!(!r.is_blank());

        let mut blank = SurveyRecord::new();
        blank.insert_raw("country", "");
        assert!(blank.is_blank());
    }

    #[test]
    fn labels() {
        assert_eq!(SurveyValue::Number(2.0).label(), "2");
        assert_eq!(SurveyValue::Number(2.5).label(), "2.5");
        assert_eq!(SurveyValue::Text("Espresso".to_string()).label(), "Espresso");
        assert_eq!(SurveyValue::Bool(false).label(), "false");
        assert_eq!(SurveyValue::Null.label(), "");
    }

    #[test]
    fn flags_match_exactly_one() {
        let d = FieldDescriptor::new("add_milk", "Milk");
        let mut r = SurveyRecord::new();
        assert!(!d.is_flag_set(&r));
        r.insert("add_milk", SurveyValue::Number(2.0));
        assert!(!d.is_flag_set(&r));
        r.insert("add_milk", SurveyValue::Bool(true));
        assert!(!d.is_flag_set(&r));
        r.insert("add_milk", SurveyValue::Text("1".to_string()));
        assert!(!d.is_flag_set(&r));
        r.insert("add_milk", SurveyValue::Number(1.0));
        assert!(d.is_flag_set(&r));
    }

    #[test]
    fn average_display() {
        assert_eq!(AverageValue::from_sum(12.0, 3).to_string(), "4.00");
        assert_eq!(AverageValue::from_sum(0.0, 0).to_string(), "0");
        assert_eq!(AverageValue::from_sum(10.0, 3).to_string(), "3.33");
        // Ties round up.
        assert_eq!(AverageValue::from_sum(4.125, 1).to_string(), "4.13");
    }

    #[test]
    fn cross_tab_zeros_is_dense() {
        let rows: Vec<String> = vec!["a".to_string(), "b".to_string()];
        let cols: Vec<String> = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let ct = CrossTab::zeros(&rows, &cols);
        assert_eq!(ct.num_cells(), 6);
        assert_eq!(ct.total(), 0);
        assert_eq!(ct.get("b", "z"), Some(0));
        assert_eq!(ct.get("c", "z"), None);
    }
}
