/*!

This is the long-form manual for `survey_aggregates` and `coffeesurvey`.

## Input formats

The following formats are supported:
* `csv` Comma Separated Values with a header row
* `xlsx` Excel workbook, first row is the header

### `csv`

One respondent per row. The first row names the columns. Empty lines are skipped and
rows may be shorter than the header: the missing trailing columns are not part of the
record at all, while a blank cell is kept as a null. Cells are typed dynamically:

| cell                                   | value           |
|----------------------------------------|-----------------|
| (blank)                                | null            |
| `3`, `-0.5`, `1e3`, ` 4 `              | number          |
| `true`, `TRUE`, `false`, `FALSE`       | boolean         |
| anything else, including `True`        | text, verbatim  |

Numbers may be surrounded by spaces. Integers beyond 2^53 in magnitude stay text.

### `xlsx`

The worksheet is selected with `--excel-worksheet-name` (or `excelWorksheetName` in
the configuration). If the workbook has a single worksheet, the name may be omitted.
Numeric cells are numbers, text cells go through the same dynamic typing as CSV cells.

## Columns

| column                | use                                        |
|-----------------------|--------------------------------------------|
| `age_group`           | category, also the rows of the cross-tab   |
| `country`             | category                                   |
| `interest_wellness`   | category                                   |
| `cups_per_day`        | category                                   |
| `brewing_method`      | category                                   |
| `roast_preference`    | category, also the columns of the cross-tab|
| `morning_before_8` .. `evening_after_5` | timing scale (5 columns)   |
| `factor_*`            | purchase factor scale (9 columns)          |
| `add_*`               | additive flag (7 columns)                  |
| `rank_*`              | location ranking (5 columns)               |
| `aware_*`             | awareness flag (6 columns)                 |
| `try_*`               | trial incentive flag (7 columns)           |
| `wow_*`               | "wow" factor flag (7 columns)              |

The full list is in [crate::descriptors].

## Aggregation rules

- **Category counts** only count the records where the column is answered (not blank). The
  categories are listed in the order they first appear in the file.
- **Flags** are counted when the cell is exactly the number `1`. Every flag of a set is
  reported, including the ones nobody ticked.
- **Averages** are computed over the answered cells only and are reported with two
  decimals. A column that nobody answered is reported as `0`.
- **Timing** is read as a block: a row that does not reach the `morning_before_8` column
  is left out of every timing average. A row that has the column counts in the
  denominator of every slot, even when that cell or a later slot is blank; blank slots
  add nothing to the sums.
- **Age vs roast** is a full 6 x 5 grid, zeros included. Answers outside the declared age
  groups or roast types are dropped by default (`strict`). With the `open` policy they
  are added as extra rows or columns after the declared ones.

## Configuration

```json
{
  "outputSettings": {
    "surveyName": "Coffee Consumption Survey",
    "outputPath": "results.json",
    "includeSummary": true
  },
  "dataSources": [
    { "provider": "csv", "filePath": "survey_results.csv" }
  ],
  "crossTabPolicy": "strict"
}
```

File paths are relative to the directory of the configuration file. Several sources are
concatenated in order before aggregation.

## Output

```json
{
  "survey": { "name": "..." },
  "results": {
    "demographics": { "ageGroups": [], "countries": [], "wellnessInterest": [] },
    "consumption": { "cupsPerDay": [], "brewingMethods": [], "roastPreferences": [], "timingData": [] },
    "preferences": { "factors": [], "additives": [], "locations": [] },
    "insights": { "awareness": [], "tryFactors": [], "wowFactors": [], "ageVsRoast": [] }
  }
}
```

Counts are `{"name": .., "value": ..}`. Averages are strings with two decimals, under
`{"factor": .., "average": ..}`, `{"location": .., "average": ..}` or
`{"time": .., "average": ..}`. Each cross-tab row is `{"age": .., "light": .., ...}`.

*/
