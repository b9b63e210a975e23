//! Validated search criteria built from the search form.
//!
//! The form delivers raw text for budget, city and postal code. Parsing
//! happens once at submit time; the resulting [`SearchCriteria`] is immutable
//! for the rest of the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation failures raised while building [`SearchCriteria`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    /// Budget was blank, non-numeric, non-finite or not strictly positive.
    #[error("budget must be a positive number, got {raw:?}")]
    InvalidBudget { raw: String },
    /// City was blank once trimmed.
    #[error("city must not be empty")]
    EmptyCity,
}

/// Per-person spending limit.
///
/// ## Invariants
/// - finite and strictly greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Budget(f64);

impl Budget {
    /// Construct a budget from a numeric amount.
    pub fn new(amount: f64) -> Result<Self, CriteriaError> {
        if amount.is_finite() && amount > 0.0 {
            Ok(Self(amount))
        } else {
            Err(CriteriaError::InvalidBudget {
                raw: amount.to_string(),
            })
        }
    }

    /// Parse a budget from raw form input.
    ///
    /// # Examples
    /// ```
    /// use welp_backend::domain::Budget;
    ///
    /// let budget = Budget::parse(" 15 ").expect("valid budget");
    /// assert_eq!(budget.amount(), 15.0);
    /// assert!(Budget::parse("0").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CriteriaError> {
        let trimmed = raw.trim();
        let invalid = || CriteriaError::InvalidBudget {
            raw: trimmed.to_owned(),
        };
        let amount = trimmed.parse::<f64>().map_err(|_| invalid())?;
        Self::new(amount).map_err(|_| invalid())
    }

    /// Amount in the provider's currency units.
    pub fn amount(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Budget {
    type Error = CriteriaError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Budget> for f64 {
    fn from(value: Budget) -> Self {
        value.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalised city name used for lookups and history records.
///
/// Normalisation trims surrounding whitespace, upper-cases the first
/// character and lower-cases everything after it. Multi-word names are not
/// capitalised per word: `"new york"` becomes `"New york"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CityName(String);

impl CityName {
    /// Normalise raw city input.
    ///
    /// # Examples
    /// ```
    /// use welp_backend::domain::CityName;
    ///
    /// let city = CityName::normalize("  aUSTIN ").expect("valid city");
    /// assert_eq!(city.as_ref(), "Austin");
    /// ```
    pub fn normalize(raw: &str) -> Result<Self, CriteriaError> {
        let trimmed = raw.trim();
        let mut chars = trimmed.chars();
        let Some(first) = chars.next() else {
            return Err(CriteriaError::EmptyCity);
        };
        let mut normalized: String = first.to_uppercase().collect();
        normalized.push_str(&chars.as_str().to_lowercase());
        Ok(Self(normalized))
    }
}

impl AsRef<str> for CityName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CityName {
    type Error = CriteriaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<CityName> for String {
    fn from(value: CityName) -> Self {
        value.0
    }
}

/// Criteria for one search, fixed once the pipeline starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Maximum acceptable cost per person.
    pub budget_per_person: Budget,
    /// Normalised city name.
    pub city: CityName,
    /// Optional postal code, carried into history records only.
    pub postal_code: Option<String>,
}

impl SearchCriteria {
    /// Build criteria from the three raw form fields.
    ///
    /// A blank postal code is treated as absent.
    pub fn from_form(budget: &str, city: &str, postal_code: &str) -> Result<Self, CriteriaError> {
        let budget_per_person = Budget::parse(budget)?;
        let city = CityName::normalize(city)?;
        let postal_code = Some(postal_code.trim())
            .filter(|zip| !zip.is_empty())
            .map(str::to_owned);
        Ok(Self {
            budget_per_person,
            city,
            postal_code,
        })
    }
}
