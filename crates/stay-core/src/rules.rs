//! Country residency rules and the immutable rule set.
//!
//! A [`RuleSet`] is an ordered mapping keyed by country code. Mutations never
//! touch the receiver; they return a new set, so an evaluation can hold a
//! snapshot while the caller keeps editing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CountryCode, WindowPolicy};

/// One jurisdiction's residency test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRule {
    pub code: CountryCode,
    pub name: String,
    /// Day count at which the traveler becomes resident.
    pub threshold: i64,
    #[serde(rename = "calendarType")]
    pub window: WindowPolicy,
    #[serde(default)]
    pub description: String,
    /// Built-in rules are not deletable.
    #[serde(default)]
    pub is_custom: bool,
}

impl CountryRule {
    /// Builds a caller-defined rule with the default description.
    pub fn custom(
        code: CountryCode,
        name: impl Into<String>,
        threshold: i64,
        window: WindowPolicy,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            threshold,
            window,
            description: format!("Custom: Tax resident if present for {threshold}+ days"),
            is_custom: true,
        }
    }
}

/// Errors from rule set mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule with this code already exists.
    #[error("country already exists: {0}")]
    Duplicate(CountryCode),

    /// No rule with this code exists.
    #[error("country not found: {0}")]
    NotFound(CountryCode),

    /// Built-in rules cannot be deleted.
    #[error("cannot delete built-in country: {0}")]
    BuiltIn(CountryCode),
}

/// A partial rule update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub threshold: Option<i64>,
    pub window: Option<WindowPolicy>,
    pub description: Option<String>,
}

/// Ordered rule mapping keyed by country code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    rules: Vec<CountryRule>,
}

impl RuleSet {
    /// The rules seeded at startup.
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN_RULES
                .iter()
                .filter_map(|(code, name, threshold, window, description)| {
                    Some(CountryRule {
                        code: CountryCode::new(*code).ok()?,
                        name: (*name).to_string(),
                        threshold: *threshold,
                        window: *window,
                        description: (*description).to_string(),
                        is_custom: false,
                    })
                })
                .collect(),
        }
    }

    /// Builds a set from rules in order. A later rule replaces an earlier
    /// one with the same code, keeping the earlier position.
    pub fn from_rules(rules: impl IntoIterator<Item = CountryRule>) -> Self {
        let mut set = Self::default();
        for rule in rules {
            set.upsert(rule);
        }
        set
    }

    /// Built-ins overlaid with stored rules.
    ///
    /// Stored rules with a built-in code override it in place; the rest are
    /// appended in their stored order.
    pub fn with_overrides(overrides: impl IntoIterator<Item = CountryRule>) -> Self {
        let mut set = Self::builtin();
        for rule in overrides {
            set.upsert(rule);
        }
        set
    }

    fn upsert(&mut self, rule: CountryRule) {
        match self.rules.iter_mut().find(|r| r.code == rule.code) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    pub fn get(&self, code: &CountryCode) -> Option<&CountryRule> {
        self.rules.iter().find(|r| &r.code == code)
    }

    pub fn contains(&self, code: &CountryCode) -> bool {
        self.get(code).is_some()
    }

    /// Rules in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &CountryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns a new set with `rule` appended.
    pub fn with_added(&self, rule: CountryRule) -> Result<Self, RuleError> {
        if self.contains(&rule.code) {
            return Err(RuleError::Duplicate(rule.code));
        }
        let mut next = self.clone();
        next.rules.push(rule);
        Ok(next)
    }

    /// Returns a new set with the fields of `update` applied to `code`.
    pub fn with_updated(&self, code: &CountryCode, update: RuleUpdate) -> Result<Self, RuleError> {
        let mut next = self.clone();
        let rule = next
            .rules
            .iter_mut()
            .find(|r| &r.code == code)
            .ok_or_else(|| RuleError::NotFound(code.clone()))?;

        if let Some(name) = update.name {
            rule.name = name;
        }
        if let Some(threshold) = update.threshold {
            rule.threshold = threshold;
        }
        if let Some(window) = update.window {
            rule.window = window;
        }
        if let Some(description) = update.description {
            rule.description = description;
        }
        Ok(next)
    }

    /// Returns a new set without the custom rule `code`.
    pub fn without(&self, code: &CountryCode) -> Result<Self, RuleError> {
        let rule = self
            .get(code)
            .ok_or_else(|| RuleError::NotFound(code.clone()))?;
        if !rule.is_custom {
            return Err(RuleError::BuiltIn(code.clone()));
        }
        let mut next = self.clone();
        next.rules.retain(|r| &r.code != code);
        Ok(next)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a CountryRule;
    type IntoIter = std::slice::Iter<'a, CountryRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

type BuiltinRule = (&'static str, &'static str, i64, WindowPolicy, &'static str);

const BUILTIN_RULES: &[BuiltinRule] = &[
    (
        "AU",
        "Australia",
        183,
        WindowPolicy::CalendarYear,
        "Tax resident if physically present for more than 183 days in a calendar year",
    ),
    (
        "NZ",
        "New Zealand",
        183,
        WindowPolicy::Rolling12Month,
        "Tax resident if present for more than 183 days in any 12-month period",
    ),
    (
        "US",
        "United States",
        183,
        WindowPolicy::CalendarYear,
        "Substantial presence test: 183 days in calendar year (weighted calculation applies)",
    ),
    (
        "KR",
        "South Korea",
        183,
        WindowPolicy::CalendarYear,
        "Tax resident if staying for 183 days or more in a calendar year",
    ),
    (
        "HK",
        "Hong Kong",
        180,
        WindowPolicy::CalendarYear,
        "Tax resident if ordinarily residing or present for 180+ days in a year",
    ),
    (
        "IT",
        "Italy",
        183,
        WindowPolicy::CalendarYear,
        "Tax resident if present for more than 183 days in a calendar year",
    ),
    (
        "AE",
        "UAE",
        183,
        WindowPolicy::Rolling12Month,
        "Tax resident if present for 183+ days in a 12-month period (no personal income tax)",
    ),
    (
        "MC",
        "Monaco",
        183,
        WindowPolicy::CalendarYear,
        "Tax residency based on primary residence (no personal income tax for residents)",
    ),
    (
        "GB",
        "United Kingdom",
        183,
        WindowPolicy::CalendarYear,
        "Automatic UK resident if present for 183+ days in a tax year (April 6 - April 5)",
    ),
    (
        "JP",
        "Japan",
        183,
        WindowPolicy::Rolling12Month,
        "Tax resident if having domicile or residence in Japan for 1 year or more",
    ),
];
