use clap::Parser;

/// This is a tabulation program for coffee consumption surveys.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the survey: its name, its data files and the
    /// cross-tabulation policy. For more information about the file format, read the documentation
    /// of the survey_aggregates::manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the expected output in JSON format. If provided,
    /// coffeesurvey will check that the computed output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the tables will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the survey data file to read. Setting this option overrides
    /// the data sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. It may be omitted
    /// if the workbook has a single worksheet.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (strict or open, default strict) What the age/roast cross-tabulation does with values outside
    /// of its fixed rows and columns: strict drops the record, open adds a row or a column.
    #[clap(long, value_parser)]
    pub domain_policy: Option<String>,

    /// If passed as an argument, the output also contains the summary view (shares and top categories).
    #[clap(long, takes_value = false)]
    pub summary: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
