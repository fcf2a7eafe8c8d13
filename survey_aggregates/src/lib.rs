mod config;
use log::{debug, info};

use std::collections::HashMap;

pub use crate::config::*;
use crate::descriptors::*;

pub mod builder;
pub mod descriptors;
pub mod manual;

/// Counts the records by the value of a categorical field.
///
/// Records without the field are skipped. Categories appear in the order in
/// which they are first seen, and only categories that actually occur are
/// reported: no entry has a count of zero.
pub fn group_count(records: &[SurveyRecord], key: &str) -> AggregateTable {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<TableEntry> = Vec::new();
    for r in records.iter() {
        let label = match r.get(key) {
            Some(v) => v.label(),
            None => continue,
        };
        match positions.get(&label) {
            Some(idx) => {
                if let Metric::Count(c) = &mut entries[*idx].metric {
                    *c += 1;
                }
            }
            None => {
                positions.insert(label.clone(), entries.len());
                entries.push(TableEntry {
                    label,
                    metric: Metric::Count(1),
                });
            }
        }
    }
    debug!(
        "group_count: key: {:?} categories: {:?}",
        key,
        entries.len()
    );
    AggregateTable { entries }
}

/// For each descriptor, counts the records accepted by the predicate.
///
/// One entry per descriptor, in descriptor order, including the zero counts.
pub fn count_matching<P>(
    records: &[SurveyRecord],
    descriptors: &[FieldDescriptor],
    predicate: P,
) -> AggregateTable
where
    P: Fn(&FieldDescriptor, &SurveyRecord) -> bool,
{
    let entries = descriptors
        .iter()
        .map(|d| {
            let count = records.iter().filter(|r| predicate(d, *r)).count() as u64;
            TableEntry {
                label: d.label.to_string(),
                metric: Metric::Count(count),
            }
        })
        .collect();
    AggregateTable { entries }
}

/// For each descriptor, averages the values produced by `extract`.
///
/// Records for which `extract` returns nothing are left out of both the sum
/// and the denominator. A descriptor with no value at all averages to 0.
pub fn mean_of<E>(
    records: &[SurveyRecord],
    descriptors: &[FieldDescriptor],
    extract: E,
) -> AggregateTable
where
    E: Fn(&FieldDescriptor, &SurveyRecord) -> Option<f64>,
{
    let entries = descriptors
        .iter()
        .map(|d| {
            let mut total = 0.0;
            let mut count: u64 = 0;
            for r in records.iter() {
                if let Some(x) = extract(d, r) {
                    total += x;
                    count += 1;
                }
            }
            TableEntry {
                label: d.label.to_string(),
                metric: Metric::Average(AverageValue::from_sum(total, count)),
            }
        })
        .collect();
    AggregateTable { entries }
}

/// Counts, for each flag, the records where it is exactly 1.
pub fn flag_count(records: &[SurveyRecord], descriptors: &[FieldDescriptor]) -> AggregateTable {
    count_matching(records, descriptors, |d, r| d.is_flag_set(r))
}

/// Averages each numeric field over the records where it is present.
pub fn average(records: &[SurveyRecord], descriptors: &[FieldDescriptor]) -> AggregateTable {
    mean_of(records, descriptors, |d, r| {
        let x = d.number(r);
        if x.is_none() && d.value(r).is_some() {
            debug!("average: field {} is not numeric, skipping", d.key);
        }
        x
    })
}

/// Averages the time-of-day slots.
///
/// Unlike [average], the slots are read as a group: a record takes part only
/// if its row has the first slot column, even when that cell is blank, and
/// then it counts towards every slot. A blank or missing slot adds nothing to
/// its sum but the record is still part of the shared denominator.
pub fn timing_average(records: &[SurveyRecord]) -> Vec<TimingEntry> {
    timing_average_over(records, &TIMING_SLOTS)
}

fn timing_average_over(records: &[SurveyRecord], slots: &[FieldDescriptor]) -> Vec<TimingEntry> {
    let gate = match slots.first() {
        Some(d) => d,
        None => return Vec::new(),
    };
    let mut totals: Vec<f64> = vec![0.0; slots.len()];
    let mut count: u64 = 0;
    for r in records.iter().filter(|r| gate.is_defined(r)) {
        for (total, slot) in totals.iter_mut().zip(slots.iter()) {
            *total += slot.number(r).unwrap_or(0.0);
        }
        count += 1;
    }
    debug!("timing_average: {} of {} records", count, records.len());
    slots
        .iter()
        .zip(totals.iter())
        .map(|(slot, total)| TimingEntry {
            time_slot: slot.label.to_string(),
            average: AverageValue::from_sum(*total, count),
        })
        .collect()
}

/// Cross-tabulates two categorical fields over fixed domains.
///
/// The table starts as a dense matrix of zeros over `rows` x `cols`. Each
/// record with both fields present increments one cell. Values outside the
/// declared domains are handled according to `policy`.
pub fn cross_tab(
    records: &[SurveyRecord],
    rows: &[&str],
    cols: &[&str],
    row_key: &str,
    col_key: &str,
    policy: DomainPolicy,
) -> CrossTab {
    let row_names: Vec<String> = rows.iter().map(|s| s.to_string()).collect();
    let col_names: Vec<String> = cols.iter().map(|s| s.to_string()).collect();
    let mut ct = CrossTab::zeros(&row_names, &col_names);
    let mut dropped: u64 = 0;

    for r in records.iter() {
        let (row_label, col_label) = match (r.get(row_key), r.get(col_key)) {
            (Some(rv), Some(cv)) => (rv.label(), cv.label()),
            _ => continue,
        };
        let row_idx = ct.rows.iter().position(|x| *x == row_label);
        let col_idx = ct.cols.iter().position(|x| *x == col_label);
        let (ri, ci) = match (row_idx, col_idx, policy) {
            (Some(ri), Some(ci), _) => (ri, ci),
            (_, _, DomainPolicy::Strict) => {
                debug!(
                    "cross_tab: dropping record outside of the domain: {:?} x {:?}",
                    row_label, col_label
                );
                dropped += 1;
                continue;
            }
            (ri, ci, DomainPolicy::Open) => {
                let ri = ri.unwrap_or_else(|| {
                    ct.rows.push(row_label.clone());
                    ct.cells.push(vec![0; ct.cols.len()]);
                    ct.rows.len() - 1
                });
                let ci = ci.unwrap_or_else(|| {
                    ct.cols.push(col_label.clone());
                    for row in ct.cells.iter_mut() {
                        row.push(0);
                    }
                    ct.cols.len() - 1
                });
                (ri, ci)
            }
        };
        ct.cells[ri][ci] += 1;
    }
    if dropped > 0 {
        info!(
            "cross_tab: {} records outside of {} x {} were dropped",
            dropped, row_key, col_key
        );
    }
    ct
}

/// The share of each category of a count table, in percent.
pub fn shares(table: &AggregateTable) -> Vec<ShareEntry> {
    let total = table.total_count();
    table
        .entries
        .iter()
        .map(|e| ShareEntry {
            label: e.label.clone(),
            percent: percent_of(count_of(&e.metric), total),
        })
        .collect()
}

/// The `n` largest categories followed by the remainder under `other_label`.
///
/// Ties keep the order of the table. The remainder is omitted when empty.
pub fn top_shares(table: &AggregateTable, n: usize, other_label: &str) -> Vec<ShareEntry> {
    let total = table.total_count();
    let mut sorted: Vec<&TableEntry> = table.entries.iter().collect();
    sorted.sort_by(|a, b| count_of(&b.metric).cmp(&count_of(&a.metric)));
    sorted.truncate(n);

    let mut res: Vec<ShareEntry> = sorted
        .iter()
        .map(|e| ShareEntry {
            label: e.label.clone(),
            percent: percent_of(count_of(&e.metric), total),
        })
        .collect();
    let top_total: u64 = sorted.iter().map(|e| count_of(&e.metric)).sum();
    let remainder = total - top_total;
    if remainder > 0 {
        res.push(ShareEntry {
            label: other_label.to_string(),
            percent: percent_of(remainder, total),
        });
    }
    res
}

fn count_of(m: &Metric) -> u64 {
    match m {
        Metric::Count(c) => *c,
        Metric::Average(_) => 0,
    }
}

fn percent_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        config::round_to(count as f64 * 100.0 / total as f64, 1)
    }
}

/// Builds the headline figures of the one-page summary from a computed bundle.
pub fn summarize(records: &[SurveyRecord], bundle: &SurveyBundle) -> SummaryView {
    SummaryView {
        respondents: records.len(),
        countries: shares(&bundle.demographics.countries),
        wellness_interest: shares(&bundle.demographics.wellness_interest),
        roast: top_shares(&bundle.consumption.roast_preferences, 2, "Other"),
        brewing: top_shares(&bundle.consumption.brewing_methods, 2, "Other"),
    }
}

/// Computes every table of the dashboard from the survey records.
///
/// Arguments:
/// * `records` all the rows of one load, in file order
/// * `policy` how the age/roast cross-tab treats values outside its domains
pub fn aggregate_survey(records: &[SurveyRecord], policy: DomainPolicy) -> SurveyBundle {
    info!("Processing {:?} survey records", records.len());

    let demographics = Demographics {
        age_groups: group_count(records, AGE_GROUP),
        countries: group_count(records, COUNTRY),
        wellness_interest: group_count(records, INTEREST_WELLNESS),
    };
    let consumption = Consumption {
        cups_per_day: group_count(records, CUPS_PER_DAY),
        brewing_methods: group_count(records, BREWING_METHOD),
        roast_preferences: group_count(records, ROAST_PREFERENCE),
        timing: timing_average(records),
    };
    let preferences = Preferences {
        factors: average(records, &PURCHASE_FACTORS),
        additives: flag_count(records, &ADDITIVES),
        locations: average(records, &LOCATIONS),
    };
    let insights = Insights {
        awareness: flag_count(records, &AWARENESS),
        try_factors: flag_count(records, &TRY_FACTORS),
        wow_factors: flag_count(records, &WOW_FACTORS),
        age_vs_roast: cross_tab(
            records,
            &AGE_GROUPS,
            &ROAST_TYPES,
            AGE_GROUP,
            ROAST_PREFERENCE,
            policy,
        ),
    };

    info!(
        "Aggregated {} age groups, {} countries, {} brewing methods, {} roast preferences",
        demographics.age_groups.len(),
        demographics.countries.len(),
        consumption.brewing_methods.len(),
        consumption.roast_preferences.len()
    );

    SurveyBundle {
        demographics,
        consumption,
        preferences,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(fields: &[(&str, &str)]) -> SurveyRecord {
        let mut r = SurveyRecord::new();
        for (k, v) in fields {
            r.insert_raw(k, v);
        }
        r
    }

    #[test]
    fn group_count_first_seen_order() {
        let records = vec![
            rec(&[("country", "Sweden")]),
            rec(&[("country", "Norway")]),
            rec(&[]),
            rec(&[("country", "Sweden")]),
        ];
        let t = group_count(&records, "country");
        let labels: Vec<&str> = t.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Sweden", "Norway"]);
        assert_eq!(t.get("Sweden"), Some(&Metric::Count(2)));
        assert_eq!(t.total_count(), 3);
    }

    #[test]
    fn group_count_merges_numbers_and_text() {
        let mut a = SurveyRecord::new();
        a.insert("cups_per_day", SurveyValue::Number(2.0));
        let mut b = SurveyRecord::new();
        b.insert("cups_per_day", SurveyValue::Text("2".to_string()));
        let t = group_count(&[a, b], "cups_per_day");
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("2"), Some(&Metric::Count(2)));
    }

    #[test]
    fn average_skips_text() {
        let records = vec![
            rec(&[("factor_taste", "5")]),
            rec(&[("factor_taste", "n/a")]),
            rec(&[("factor_taste", "4")]),
        ];
        let t = average(&records, &[FieldDescriptor::new("factor_taste", "Taste")]);
        assert_eq!(t.entries[0].metric.to_string(), "4.50");
    }

    #[test]
    fn timing_gate_accepts_blank_first_slot() {
        let records = vec![
            rec(&[("morning_before_8", "2"), ("morning_8_11", "4")]),
            rec(&[("morning_before_8", ""), ("morning_8_11", "2")]),
            rec(&[("morning_8_11", "9")]),
        ];
        let t = timing_average(&records);
        assert_eq!(t[0].average, AverageValue::Mean(1.0));
        assert_eq!(t[1].average, AverageValue::Mean(3.0));
        assert_eq!(t[2].average, AverageValue::Mean(0.0));
    }

    #[test]
    fn timing_without_gate_is_empty() {
        let records = vec![rec(&[("morning_8_11", "4")])];
        let t = timing_average(&records);
        assert_eq!(t.len(), 5);
        assert!(t.iter().all(|e| e.average == AverageValue::Empty));
    }

    #[test]
    fn top_shares_collapses_the_rest() {
        let records: Vec<SurveyRecord> = ["medium", "medium", "dark", "light", "medium"]
            .iter()
            .map(|s| rec(&[("roast_preference", *s)]))
            .collect();
        let t = group_count(&records, "roast_preference");
        let s = top_shares(&t, 2, "Other");
        assert_eq!(
            s,
            vec![
                ShareEntry {
                    label: "medium".to_string(),
                    percent: 60.0
                },
                ShareEntry {
                    label: "dark".to_string(),
                    percent: 20.0
                },
                ShareEntry {
                    label: "Other".to_string(),
                    percent: 20.0
                },
            ]
        );
        assert_eq!(top_shares(&t, 3, "Other").len(), 3);
    }

    #[test]
    fn shares_of_empty_table() {
        assert!(shares(&AggregateTable::default()).is_empty());
        let t = count_matching(&[], &ADDITIVES, |d, r| d.is_flag_set(r));
        assert!(shares(&t).iter().all(|s| s.percent == 0.0));
    }
}
