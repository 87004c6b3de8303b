//! Typed field values and the parser that produces them from chat text.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{FieldKind, FieldSpec};

/// A collected answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Why a raw answer was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidValue {
    #[error("no value given")]
    Empty,
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("`{0}` is not one of the allowed options")]
    NotAnOption(String),
}

/// Parse `raw` according to the field's kind.
///
/// Numbers may carry `,` or `_` digit separators and must be finite.
/// Categorical answers must match one of the options, ignoring case; the
/// canonical option spelling is returned.
pub fn parse(spec: &FieldSpec, raw: &str) -> Result<FieldValue, InvalidValue> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(InvalidValue::Empty);
    }

    match spec.kind {
        FieldKind::Numeric { .. } => {
            let cleaned: String = text.chars().filter(|c| !matches!(c, ',' | '_')).collect();
            match cleaned.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(FieldValue::Number(n)),
                _ => Err(InvalidValue::NotANumber(text.to_string())),
            }
        }
        FieldKind::Categorical { options } => options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(text))
            .map(|option| FieldValue::Text((*option).to_string()))
            .ok_or_else(|| InvalidValue::NotAnOption(text.to_string())),
    }
}

/// Answers gathered for the active domain, keyed by field key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectedData(BTreeMap<String, FieldValue>);

impl CollectedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous value if the key was already set
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_number)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<(String, FieldValue)> for CollectedData {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Domain, optional_fields, required_fields};

    fn field(key: &str) -> &'static FieldSpec {
        Domain::Delay.schema().field(key).unwrap()
    }

    #[test]
    fn test_numeric_parsing() {
        let cost = field("final_project_cost");
        assert_eq!(parse(cost, " 50000000 "), Ok(FieldValue::Number(50_000_000.0)));
        assert_eq!(parse(cost, "50,000,000"), Ok(FieldValue::Number(50_000_000.0)));
        assert_eq!(parse(cost, "1.5e3"), Ok(FieldValue::Number(1500.0)));
        assert_eq!(
            parse(cost, "fifty"),
            Err(InvalidValue::NotANumber("fifty".to_string()))
        );
        assert!(parse(cost, "inf").is_err());
        assert!(parse(cost, "NaN").is_err());
    }

    #[test]
    fn test_blank_is_always_invalid() {
        assert_eq!(parse(field("totalunits"), "   "), Err(InvalidValue::Empty));
        assert_eq!(parse(field("districttype"), "\t"), Err(InvalidValue::Empty));
    }

    #[test]
    fn test_categorical_matches_options_case_insensitively() {
        let promoter = field("promotertype");
        assert_eq!(
            parse(promoter, "partnership firm"),
            Ok(FieldValue::Text("PARTNERSHIP FIRM".to_string()))
        );
        assert_eq!(
            parse(field("districttype"), "  surat "),
            Ok(FieldValue::Text("Surat".to_string()))
        );
    }

    // Membership is enforced; free text that is not an option is refused.
    #[test]
    fn test_categorical_rejects_non_members() {
        assert_eq!(
            parse(field("districttype"), "Mumbai"),
            Err(InvalidValue::NotAnOption("Mumbai".to_string()))
        );
    }

    #[test]
    fn test_every_registered_field_accepts_its_placeholder_or_first_option() {
        for domain in Domain::ALL {
            for spec in required_fields(domain).iter().chain(optional_fields(domain)) {
                let sample = match spec.options().first() {
                    Some(option) => option.to_string(),
                    None => spec.placeholder.trim_start_matches("e.g., ").to_string(),
                };
                assert!(parse(spec, &sample).is_ok(), "{} rejected {sample}", spec.key);
            }
        }
    }

    #[test]
    fn test_collected_data_serializes_as_flat_object() {
        let mut data = CollectedData::new();
        data.insert("totalunits", FieldValue::Number(100.0));
        data.insert("districttype", FieldValue::Text("Surat".to_string()));
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({"totalunits": 100.0, "districttype": "Surat"}));
    }
}
