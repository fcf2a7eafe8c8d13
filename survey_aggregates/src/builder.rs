pub use crate::config::*;

/// A builder for collecting survey records.
///
/// Readers declare the column names once, then push rows of raw cells.
/// Dynamic typing is applied to every cell. Blank cells are kept as nulls,
/// the columns missing from a short row are not stored.
///
/// ```
/// pub use survey_aggregates::builder::Builder;
/// pub use survey_aggregates::DomainPolicy;
/// # use survey_aggregates::AggregateErrors;
///
/// let mut builder = Builder::new(DomainPolicy::Strict)?
///     .columns(&["age_group".to_string(), "add_milk".to_string()])?;
///
/// builder.add_row(&["25-34".to_string(), "1".to_string()])?;
/// builder.add_record_simple(&[("age_group", "35-44"), ("add_milk", "0")])?;
///
/// let bundle = builder.aggregate();
/// assert_eq!(bundle.preferences.additives.get("Milk"), Some(&survey_aggregates::Metric::Count(1)));
/// # Ok::<(), AggregateErrors>(())
/// ```
pub struct Builder {
    pub(crate) _policy: DomainPolicy,
    pub(crate) _columns: Option<Vec<String>>,
    pub(crate) _records: Vec<SurveyRecord>,
}

impl Builder {
    pub fn new(policy: DomainPolicy) -> Result<Builder, AggregateErrors> {
        Ok(Builder {
            _policy: policy,
            _columns: None,
            _records: Vec::new(),
        })
    }

    /// Declares the column names used by [Builder::add_row].
    ///
    /// Column names must be non-empty and distinct.
    pub fn columns(self, cols: &[String]) -> Result<Builder, AggregateErrors> {
        let mut seen: Vec<&String> = Vec::new();
        for c in cols.iter() {
            if c.is_empty() {
                return Err(AggregateErrors::EmptyFieldKey);
            }
            if seen.contains(&c) {
                return Err(AggregateErrors::DuplicateFieldKey(c.clone()));
            }
            seen.push(c);
        }
        Ok(Builder {
            _policy: self._policy,
            _columns: Some(cols.to_vec()),
            _records: self._records,
        })
    }

    /// Adds a row of raw cells, matched to the declared columns by position.
    ///
    /// Short rows leave the trailing fields absent. Extra cells are ignored.
    pub fn add_row(&mut self, cells: &[String]) -> Result<(), AggregateErrors> {
        let cols = self
            ._columns
            .as_deref()
            .ok_or(AggregateErrors::MissingColumns)?;
        let mut record = SurveyRecord::new();
        for (col, cell) in cols.iter().zip(cells.iter()) {
            record.insert_raw(col, cell);
        }
        self._records.push(record);
        Ok(())
    }

    /// Adds a record from (key, raw cell) pairs.
    pub fn add_record_simple(&mut self, cells: &[(&str, &str)]) -> Result<(), AggregateErrors> {
        let mut record = SurveyRecord::new();
        for (key, cell) in cells.iter() {
            if key.is_empty() {
                return Err(AggregateErrors::EmptyFieldKey);
            }
            record.insert_raw(key, cell);
        }
        self._records.push(record);
        Ok(())
    }

    /// Adds a record whose values are already typed.
    pub fn add_record(&mut self, record: &SurveyRecord) -> Result<(), AggregateErrors> {
        self._records.push(record.clone());
        Ok(())
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self._records
    }

    pub fn into_records(self) -> Vec<SurveyRecord> {
        self._records
    }

    pub fn aggregate(&self) -> SurveyBundle {
        crate::aggregate_survey(&self._records, self._policy)
    }
}
