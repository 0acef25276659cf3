//! Common types and data structures

use crate::constants::ALL_CATEGORIES;
use crate::error::FetchError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Which category the user is looking at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategorySelector {
    All,
    Id(String),
}

impl CategorySelector {
    /// Blank input or `all` (any case) selects every category.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_CATEGORIES) {
            CategorySelector::All
        } else {
            CategorySelector::Id(trimmed.to_string())
        }
    }

    /// Value for the `category_id` query parameter
    pub fn query_value(&self) -> &str {
        match self {
            CategorySelector::All => ALL_CATEGORIES,
            CategorySelector::Id(id) => id,
        }
    }
}

impl From<&str> for CategorySelector {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

/// Category chip attached to an investment
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryTag {
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
}

/// Investment opportunity as returned by the listing endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Investment {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub country_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub minimum_investment: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub maximum_investment: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub expected_roi: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub investment_timeline: Option<String>,
    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<CategoryTag>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_premium: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,
}

/// Response envelope from the listing endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestmentsResponse {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default)]
    pub investments: Option<Vec<Investment>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InvestmentsResponse {
    /// Validate the envelope and hand back the items in server order.
    pub fn into_items(self) -> Result<Vec<Investment>, FetchError> {
        if !self.success {
            let reason = self
                .message
                .unwrap_or_else(|| "response did not report success".to_string());
            return Err(FetchError::InvalidResponse(reason));
        }
        Ok(self.investments.unwrap_or_default())
    }
}

/// Phase of a single fetch-and-render cycle
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    /// A request is in flight. `attempt` is the number of automatic retries already used.
    Loading { attempt: u32, max_attempts: u32 },
    /// Waiting out the retry delay before attempt `attempt` of `max_attempts`.
    Retrying { attempt: u32, max_attempts: u32 },
    Success(Vec<Investment>),
    /// Terminal until the user retries manually.
    Error {
        attempt: u32,
        max_attempts: u32,
        failure: FetchError,
    },
}

impl LoadState {
    /// No work is pending in this state.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            LoadState::Idle | LoadState::Success(_) | LoadState::Error { .. }
        )
    }
}

// ============================================================================
// LENIENT FIELD DECODING
// ============================================================================

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Display text that renders as blank when null or missing
fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

fn lenient_categories<'de, D>(deserializer: D) -> Result<Vec<CategoryTag>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CategoryTag>>::deserialize(deserializer)?.unwrap_or_default())
}
