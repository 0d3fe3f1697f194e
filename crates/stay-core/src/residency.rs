//! Residency evaluation.
//!
//! Intersects reconstructed stays with each rule's observation window, sums
//! the days, and classifies the total against the rule's threshold.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::entry::TravelEntry;
use crate::rules::{CountryRule, RuleSet};
use crate::stay::{ClosingPolicy, merge_overlapping, presence_intervals};
use crate::types::{CountryCode, Status, ValidationError, WindowPolicy};

/// Fraction of the threshold at which a count becomes a warning.
const WARNING_RATIO: f64 = 0.8;

/// Knobs for evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Which entry closes a stay.
    pub closing: ClosingPolicy,
    /// Merge overlapping stays before counting instead of summing them.
    pub merge_overlaps: bool,
}

/// An inclusive observation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// January 1 through December 31 of `year`.
    pub fn calendar_year(year: i32) -> Result<Self, ValidationError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = NaiveDate::from_ymd_opt(year, 12, 31);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(ValidationError::YearOutOfRange { year }),
        }
    }

    /// The year ending at `reference`, starting on the same month and day one
    /// year earlier. February 29 maps back to February 28.
    pub fn rolling_12_month(reference: NaiveDate) -> Self {
        let start = reference
            .checked_sub_months(Months::new(12))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end: reference,
        }
    }
}

/// The point in time an evaluation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Calendar-year rules use this date's year; rolling rules end here.
    anchor: NaiveDate,
    /// Where open-ended stays stop.
    open_until: NaiveDate,
}

impl Reference {
    /// Live status as of `today`.
    pub const fn today(today: NaiveDate) -> Self {
        Self {
            anchor: today,
            open_until: today,
        }
    }

    /// Historical status as of December 31 of `year`.
    ///
    /// Open stays run to year end, or to `today` if the year is not over yet.
    pub fn year_end(year: i32, today: NaiveDate) -> Result<Self, ValidationError> {
        let anchor =
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or(ValidationError::YearOutOfRange { year })?;
        Ok(Self {
            anchor,
            open_until: anchor.min(today),
        })
    }

    pub const fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub const fn open_until(&self) -> NaiveDate {
        self.open_until
    }

    /// The observation window `policy` implies at this reference.
    pub fn window(&self, policy: WindowPolicy) -> Window {
        match policy {
            // The anchor is a valid date, so its year always has a Jan 1 and Dec 31.
            WindowPolicy::CalendarYear => Window::calendar_year(self.anchor.year())
                .unwrap_or_else(|_| Window::rolling_12_month(self.anchor)),
            WindowPolicy::Rolling12Month => Window::rolling_12_month(self.anchor),
        }
    }
}

/// A per-country evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaySummary {
    /// Display name of the country.
    pub country: String,
    pub country_code: CountryCode,
    pub days: i64,
    pub status: Status,
    pub threshold: i64,
    #[serde(rename = "calendarType")]
    pub window: WindowPolicy,
}

/// Days present in `country` within `window`, both boundary days included.
///
/// Open-ended stays end at `open_until`. Never negative.
pub fn days_present(
    entries: &[TravelEntry],
    country: &CountryCode,
    window: Window,
    open_until: NaiveDate,
    options: EvaluationOptions,
) -> i64 {
    let mut intervals = presence_intervals(entries, country, open_until, options.closing);
    if options.merge_overlaps {
        intervals = merge_overlapping(&intervals);
    }

    intervals
        .iter()
        .filter_map(|interval| interval.clip(window.start, window.end))
        .map(|period| period.days())
        .sum()
}

/// Classifies a day count against `threshold`.
///
/// The warning boundary is compared as a real number, never rounded.
#[allow(clippy::cast_precision_loss)]
pub fn classify(days: i64, threshold: i64) -> Status {
    if days >= threshold {
        Status::Danger
    } else if days as f64 >= threshold as f64 * WARNING_RATIO {
        Status::Warning
    } else {
        Status::Safe
    }
}

/// Evaluates a single rule.
pub fn evaluate_rule(
    entries: &[TravelEntry],
    rule: &CountryRule,
    reference: Reference,
    options: EvaluationOptions,
) -> StaySummary {
    let window = reference.window(rule.window);
    let days = days_present(
        entries,
        &rule.code,
        window,
        reference.open_until(),
        options,
    );
    let status = classify(days, rule.threshold);
    tracing::debug!(
        country = %rule.code,
        window_start = %window.start,
        window_end = %window.end,
        days,
        %status,
        "evaluated rule"
    );

    StaySummary {
        country: rule.name.clone(),
        country_code: rule.code.clone(),
        days,
        status,
        threshold: rule.threshold,
        window: rule.window,
    }
}

/// Evaluates every rule, most days first.
///
/// Rules are evaluated independently; ties keep rule order.
pub fn evaluate(
    entries: &[TravelEntry],
    rules: &RuleSet,
    reference: Reference,
    options: EvaluationOptions,
) -> Vec<StaySummary> {
    let mut summaries: Vec<StaySummary> = rules
        .iter()
        .map(|rule| evaluate_rule(entries, rule, reference, options))
        .collect();
    summaries.sort_by_key(|s| std::cmp::Reverse(s.days));
    summaries
}

/// Summaries worth showing: every non-zero count, or the first five when
/// nothing has been counted yet.
pub fn displayed(summaries: &[StaySummary]) -> Vec<&StaySummary> {
    let nonzero: Vec<&StaySummary> = summaries.iter().filter(|s| s.days > 0).collect();
    if nonzero.is_empty() {
        summaries.iter().take(5).collect()
    } else {
        nonzero
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stay::test_support::{code, date, entry};

    use insta::assert_json_snapshot;

    fn rule(c: &str, threshold: i64, window: WindowPolicy) -> CountryRule {
        CountryRule::custom(code(c), c, threshold, window)
    }

    #[test]
    fn same_day_stay_counts_one_day() {
        let entries = [
            entry("1", "US", "AU", "2024-03-01", "2024-03-05"),
            entry("2", "AU", "NZ", "2024-03-05", "2024-03-05"),
        ];
        let window = Window::calendar_year(2024).unwrap();
        let days = days_present(
            &entries,
            &code("AU"),
            window,
            date("2024-12-31"),
            EvaluationOptions::default(),
        );
        assert_eq!(days, 1);
    }

    #[test]
    fn stays_outside_window_count_zero() {
        let entries = [
            entry("1", "US", "AU", "2023-03-01", "2023-03-02"),
            entry("2", "AU", "NZ", "2023-04-01", "2023-04-01"),
        ];
        let days = days_present(
            &entries,
            &code("AU"),
            Window::calendar_year(2024).unwrap(),
            date("2024-12-31"),
            EvaluationOptions::default(),
        );
        assert_eq!(days, 0);
    }

    #[test]
    fn open_stay_counts_through_reference_only() {
        let entries = [entry("1", "US", "AU", "2024-06-01", "2024-06-01")];
        let reference = Reference::today(date("2024-06-10"));
        let summary = evaluate_rule(
            &entries,
            &rule("AU", 183, WindowPolicy::CalendarYear),
            reference,
            EvaluationOptions::default(),
        );
        assert_eq!(summary.days, 10);
    }

    #[test]
    fn inverted_interval_contributes_nothing() {
        // The next departure predates the arrival.
        let entries = [
            entry("1", "US", "AU", "2024-03-01", "2024-03-20"),
            entry("2", "AU", "NZ", "2024-03-10", "2024-03-10"),
        ];
        let days = days_present(
            &entries,
            &code("AU"),
            Window::calendar_year(2024).unwrap(),
            date("2024-12-31"),
            EvaluationOptions::default(),
        );
        assert_eq!(days, 0);
    }

    #[test]
    fn classify_threshold_boundaries() {
        assert_eq!(classify(183, 183), Status::Danger);
        assert_eq!(classify(200, 183), Status::Danger);
        // 0.8 * 183 = 146.4
        assert_eq!(classify(147, 183), Status::Warning);
        assert_eq!(classify(146, 183), Status::Safe);
        // 0.8 * 180 = 144 exactly
        assert_eq!(classify(144, 180), Status::Warning);
        assert_eq!(classify(143, 180), Status::Safe);
        assert_eq!(classify(0, 183), Status::Safe);
    }

    #[test]
    fn non_positive_threshold_is_always_danger() {
        assert_eq!(classify(0, 0), Status::Danger);
        assert_eq!(classify(0, -5), Status::Danger);
    }

    #[test]
    fn rolling_window_goes_back_one_year() {
        let window = Window::rolling_12_month(date("2024-03-01"));
        assert_eq!(window.start, date("2023-03-01"));
        assert_eq!(window.end, date("2024-03-01"));

        let leap = Window::rolling_12_month(date("2024-02-29"));
        assert_eq!(leap.start, date("2023-02-28"));
    }

    #[test]
    fn year_end_reference_caps_open_stays_at_today() {
        let past = Reference::year_end(2023, date("2024-05-01")).unwrap();
        assert_eq!(past.anchor(), date("2023-12-31"));
        assert_eq!(past.open_until(), date("2023-12-31"));

        let current = Reference::year_end(2024, date("2024-05-01")).unwrap();
        assert_eq!(current.anchor(), date("2024-12-31"));
        assert_eq!(current.open_until(), date("2024-05-01"));

        assert!(Reference::year_end(i32::MAX, date("2024-05-01")).is_err());
    }

    #[test]
    fn scenario_open_stay_over_calendar_year() {
        let entries = [entry("1", "USA", "AU", "2024-01-01", "2024-01-10")];
        let rules = RuleSet::from_rules([rule("AU", 183, WindowPolicy::CalendarYear)]);
        let summaries = evaluate(
            &entries,
            &rules,
            Reference::today(date("2024-12-31")),
            EvaluationOptions::default(),
        );

        // Jan 10 through Dec 31 of a leap year, both ends inclusive.
        assert_eq!(summaries[0].days, 357);
        assert_eq!(summaries[0].status, Status::Danger);
    }

    #[test]
    fn scenario_rolling_stay_closed_by_next_entry() {
        let entries = [
            entry("1", "AU", "NZ", "2024-02-01", "2024-02-01"),
            entry("2", "NZ", "AU", "2024-03-01", "2024-03-01"),
        ];
        let rules = RuleSet::from_rules([rule("NZ", 183, WindowPolicy::Rolling12Month)]);
        let summaries = evaluate(
            &entries,
            &rules,
            Reference::today(date("2024-03-01")),
            EvaluationOptions::default(),
        );

        assert_eq!(summaries[0].days, 30);
        assert_eq!(summaries[0].status, Status::Safe);
    }

    #[test]
    fn scenario_domestic_move_counts_nothing() {
        let entries = [entry("1", "AU", "AU", "2024-01-01", "2024-01-01")];
        let summaries = evaluate(
            &entries,
            &RuleSet::builtin(),
            Reference::today(date("2024-12-31")),
            EvaluationOptions::default(),
        );
        assert!(summaries.iter().all(|s| s.days == 0));
    }

    #[test]
    fn scenario_empty_log_is_safe_everywhere() {
        let summaries = evaluate(
            &[],
            &RuleSet::builtin(),
            Reference::today(date("2024-12-31")),
            EvaluationOptions::default(),
        );
        assert_eq!(summaries.len(), 10);
        assert!(
            summaries
                .iter()
                .all(|s| s.days == 0 && s.status == Status::Safe)
        );
        // Ties keep rule order.
        let codes: Vec<_> = summaries.iter().map(|s| s.country_code.as_str()).collect();
        assert_eq!(
            codes,
            ["AU", "NZ", "US", "KR", "HK", "IT", "AE", "MC", "GB", "JP"]
        );
    }

    #[test]
    fn unknown_countries_are_silently_excluded() {
        let entries = [entry("1", "AU", "FR", "2024-01-01", "2024-01-02")];
        let summaries = evaluate(
            &entries,
            &RuleSet::builtin(),
            Reference::today(date("2024-12-31")),
            EvaluationOptions::default(),
        );
        assert!(summaries.iter().all(|s| s.days == 0));
        assert!(summaries.iter().all(|s| s.country_code.as_str() != "FR"));
    }

    #[test]
    fn evaluation_is_independent_of_input_order() {
        let mut entries = vec![
            entry("1", "US", "AU", "2024-01-01", "2024-01-02"),
            entry("2", "AU", "NZ", "2024-03-01", "2024-03-02"),
            entry("3", "NZ", "JP", "2024-05-15", "2024-05-16"),
        ];
        let reference = Reference::today(date("2024-08-01"));
        let first = evaluate(
            &entries,
            &RuleSet::builtin(),
            reference,
            EvaluationOptions::default(),
        );
        entries.reverse();
        let second = evaluate(
            &entries,
            &RuleSet::builtin(),
            reference,
            EvaluationOptions::default(),
        );
        assert_eq!(first, second);

        let top: Vec<_> = first
            .iter()
            .take(3)
            .map(|s| (s.country_code.as_str(), s.days))
            .collect();
        assert_eq!(top, [("JP", 78), ("NZ", 75), ("AU", 60)]);
    }

    #[test]
    fn overlapping_stays_sum_unless_merged() {
        // Back-to-back arrivals into AU share Jan 5.
        let entries = [
            entry("1", "US", "AU", "2024-01-01", "2024-01-01"),
            entry("2", "NZ", "AU", "2024-01-05", "2024-01-05"),
        ];
        let window = Window::calendar_year(2024).unwrap();
        let summed = days_present(
            &entries,
            &code("AU"),
            window,
            date("2024-01-10"),
            EvaluationOptions::default(),
        );
        // [Jan 1, Jan 5] + [Jan 5, Jan 10]
        assert_eq!(summed, 11);

        let merged = days_present(
            &entries,
            &code("AU"),
            window,
            date("2024-01-10"),
            EvaluationOptions {
                merge_overlaps: true,
                ..EvaluationOptions::default()
            },
        );
        assert_eq!(merged, 10);
    }

    #[test]
    fn historical_rolling_window_ends_at_year_end() {
        let entries = [
            entry("1", "US", "NZ", "2023-06-01", "2023-06-01"),
            entry("2", "NZ", "AU", "2024-02-01", "2024-02-01"),
        ];
        let rules = RuleSet::from_rules([rule("NZ", 183, WindowPolicy::Rolling12Month)]);
        let summaries = evaluate(
            &entries,
            &rules,
            Reference::year_end(2023, date("2026-01-01")).unwrap(),
            EvaluationOptions::default(),
        );
        // Jun 1 through Dec 31 2023.
        assert_eq!(summaries[0].days, 214);
        assert_eq!(summaries[0].status, Status::Danger);
    }

    #[test]
    fn displayed_prefers_nonzero_then_top_five() {
        let empty = evaluate(
            &[],
            &RuleSet::builtin(),
            Reference::today(date("2024-12-31")),
            EvaluationOptions::default(),
        );
        assert_eq!(displayed(&empty).len(), 5);

        let entries = [entry("1", "US", "AU", "2024-12-01", "2024-12-01")];
        let some = evaluate(
            &entries,
            &RuleSet::builtin(),
            Reference::today(date("2024-12-31")),
            EvaluationOptions::default(),
        );
        let shown = displayed(&some);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].country, "Australia");
    }

    #[test]
    fn summary_serializes_for_front_ends() {
        let entries = [entry("1", "US", "HK", "2024-01-01", "2024-01-01")];
        let rules = RuleSet::builtin();
        let hk = rules.get(&code("HK")).unwrap();
        let summary = evaluate_rule(
            &entries,
            hk,
            Reference::today(date("2024-05-24")),
            EvaluationOptions::default(),
        );
        assert_json_snapshot!(summary, @r#"
        {
          "country": "Hong Kong",
          "countryCode": "HK",
          "days": 145,
          "status": "warning",
          "threshold": 180,
          "calendarType": "calendar-year"
        }
        "#);
    }
}
