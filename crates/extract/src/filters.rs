use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lower and upper bound for an extracted result count.
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 100;

/// Structured constraints pulled out of a free-text request.
///
/// A field is `None` whenever the text did not state it explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFilters {
    /// Price ceiling; always positive when present.
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<u32>,
    /// Title-cased and trimmed; never blank when present.
    pub neighborhood: Option<String>,
    /// Requested number of results, within `[MIN_LIMIT, MAX_LIMIT]`.
    pub limit: Option<u32>,
}

impl ExtractedFilters {
    pub fn is_empty(&self) -> bool {
        self.max_price.is_none()
            && self.min_bedrooms.is_none()
            && self.neighborhood.is_none()
            && self.limit.is_none()
    }

    /// Build filters from tool-call arguments, ignoring anything of the
    /// wrong type or out of range instead of failing.
    pub fn from_arguments(args: &Value) -> Self {
        let max_price = args
            .get("max_price")
            .and_then(number)
            .filter(|p| p.is_finite() && *p > 0.0);

        let min_bedrooms = args
            .get("min_bedrooms")
            .and_then(integer)
            .and_then(|n| u32::try_from(n).ok());

        let neighborhood = args
            .get("neighborhood")
            .and_then(Value::as_str)
            .and_then(normalize_neighborhood);

        let limit = args
            .get("limit")
            .and_then(integer)
            .map(|n| n.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as u32);

        Self {
            max_price,
            min_bedrooms,
            neighborhood,
            limit,
        }
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Trim, collapse inner whitespace and title-case every word.
///
/// Returns `None` for blank input.
pub fn normalize_neighborhood(raw: &str) -> Option<String> {
    let words: Vec<String> = raw
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}
