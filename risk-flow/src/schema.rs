//! Field registry for the two prediction domains.
//!
//! The tables are fixed at compile time. Required fields are listed in the
//! order they are asked; optional fields are looked up by key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// Prediction target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Delay,
    CostOverrun,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Delay, Domain::CostOverrun];

    /// Stable identifier used in URLs and configuration files
    pub fn slug(self) -> &'static str {
        match self {
            Domain::Delay => "delay",
            Domain::CostOverrun => "cost-overrun",
        }
    }

    /// Phrase used in assistant messages
    pub fn subject(self) -> &'static str {
        match self {
            Domain::Delay => "project delay",
            Domain::CostOverrun => "cost overrun",
        }
    }

    pub fn schema(self) -> DomainSchema {
        DomainSchema {
            domain: self,
            required: required_fields(self),
            optional: optional_fields(self),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Domain {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delay" => Ok(Domain::Delay),
            "cost-overrun" | "cost_overrun" | "costoverrun" => Ok(Domain::CostOverrun),
            other => Err(FlowError::Config(format!("unknown domain `{other}`"))),
        }
    }
}

/// How a field's raw text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Numeric {
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    Categorical {
        options: &'static [&'static str],
    },
}

/// One entry of a domain schema
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn numeric(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            placeholder,
            kind: FieldKind::Numeric { step: None },
        }
    }

    const fn ratio(key: &'static str, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            key,
            label,
            placeholder,
            kind: FieldKind::Numeric { step: Some(0.01) },
        }
    }

    const fn categorical(
        key: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            label,
            placeholder: "",
            kind: FieldKind::Categorical { options },
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, FieldKind::Numeric { .. })
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::Categorical { options } => options,
            FieldKind::Numeric { .. } => &[],
        }
    }
}

/// Required and optional fields of one domain
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DomainSchema {
    pub domain: Domain,
    pub required: &'static [FieldSpec],
    pub optional: &'static [FieldSpec],
}

impl DomainSchema {
    /// Case-insensitive lookup in the optional set
    pub fn optional_field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.optional
            .iter()
            .find(|field| field.key.eq_ignore_ascii_case(key))
    }

    /// Exact lookup across required and optional fields
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|field| field.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.field(key).is_some()
    }
}

const PROJECT_TYPES: &[&str] = &[
    "Residential/Group Housing",
    "Commercial",
    "Mixed Development",
    "Plotted Development",
];

const PROMOTER_TYPES: &[&str] = &[
    "COMPANY",
    "PARTNERSHIP FIRM",
    "LIMITED LIABILITY PARTNERSHIP FIRM",
    "COMPETENT AUTHORITY/ GOVERNMENT",
];

const DISTRICTS: &[&str] = &[
    "Ahmedabad",
    "Surat",
    "Vadodara",
    "Rajkot",
    "Gandhinagar",
    "Bhavnagar",
    "Jamnagar",
];

// Both models are trained on the same project descriptors.
const PROJECT_REQUIRED_FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("final_project_cost", "Final Project Cost (₹)", "e.g., 50000000"),
    FieldSpec::numeric("totalunits", "Total Units", "e.g., 100"),
    FieldSpec::numeric("planned_duration_days", "Planned Duration (days)", "e.g., 365"),
    FieldSpec::categorical("final_project_type", "Project Type", PROJECT_TYPES),
    FieldSpec::categorical("promotertype", "Promoter Type", PROMOTER_TYPES),
    FieldSpec::categorical("districttype", "District", DISTRICTS),
];

const DELAY_OPTIONAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("totalincurredcost", "Total Incurred Cost (₹)", "e.g., 30000000"),
    FieldSpec::numeric("totallandcost", "Total Land Cost (₹)", "e.g., 10000000"),
    FieldSpec::numeric("budget_overrun_percent", "Budget Overrun (%)", "e.g., 10"),
    FieldSpec::ratio("progress_ratio", "Progress Ratio (0-1)", "e.g., 0.6"),
    FieldSpec::numeric("bookedunits", "Booked Units", "e.g., 50"),
    FieldSpec::ratio("land_utilization", "Land Utilization (0-1)", "e.g., 0.8"),
    FieldSpec::numeric("actual_duration_days", "Actual Duration (days)", "e.g., 365"),
    FieldSpec::numeric("avg_temp", "Average Temperature (°C)", "e.g., 28"),
    FieldSpec::numeric("total_rain", "Total Rainfall (mm)", "e.g., 50"),
    FieldSpec::numeric("totalsquarefootbuild", "Total Square Foot Build", "e.g., 50000"),
];

const COST_OVERRUN_OPTIONAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::numeric("totalincurredcost", "Total Incurred Cost (₹)", "e.g., 30000000"),
    FieldSpec::numeric("totallandcost", "Total Land Cost (₹)", "e.g., 10000000"),
    FieldSpec::numeric("totalsellingamount", "Total Selling Amount (₹)", "e.g., 60000000"),
    FieldSpec::numeric("totalpayableamountgovernment", "Government Payables (₹)", "e.g., 2500000"),
    FieldSpec::numeric("totaldevelopcost", "Development Cost (₹)", "e.g., 20000000"),
    FieldSpec::numeric("totalreceivedamount", "Collections Received (₹)", "e.g., 12000000"),
    FieldSpec::numeric("bookedsellingamount", "Booked Revenue (₹)", "e.g., 18000000"),
    FieldSpec::numeric("bookedunits", "Booked Units", "e.g., 60"),
    FieldSpec::ratio("progress_ratio", "Progress Ratio (0-1)", "e.g., 0.5"),
    FieldSpec::ratio("land_utilization", "Land Utilization (0-1)", "e.g., 0.8"),
    FieldSpec::numeric("avg_temp", "Average Temperature (°C)", "e.g., 28"),
    FieldSpec::numeric("total_rain", "Total Rainfall (mm)", "e.g., 50"),
    FieldSpec::numeric("totalsquarefootbuild", "Total Square Foot Build", "e.g., 450000"),
];

/// Required fields of `domain`, in question order
pub fn required_fields(domain: Domain) -> &'static [FieldSpec] {
    match domain {
        Domain::Delay | Domain::CostOverrun => PROJECT_REQUIRED_FIELDS,
    }
}

pub fn optional_fields(domain: Domain) -> &'static [FieldSpec] {
    match domain {
        Domain::Delay => DELAY_OPTIONAL_FIELDS,
        Domain::CostOverrun => COST_OVERRUN_OPTIONAL_FIELDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique_per_domain() {
        for domain in Domain::ALL {
            let schema = domain.schema();
            let keys: Vec<_> = schema
                .required
                .iter()
                .chain(schema.optional.iter())
                .map(|f| f.key)
                .collect();
            let unique: HashSet<_> = keys.iter().collect();
            assert_eq!(keys.len(), unique.len(), "duplicate key in {domain}");
        }
    }

    #[test]
    fn test_required_order_starts_with_cost() {
        let keys: Vec<_> = required_fields(Domain::Delay).iter().map(|f| f.key).collect();
        assert_eq!(
            keys,
            vec![
                "final_project_cost",
                "totalunits",
                "planned_duration_days",
                "final_project_type",
                "promotertype",
                "districttype"
            ]
        );
    }

    #[test]
    fn test_optional_lookup_ignores_case() {
        let schema = Domain::Delay.schema();
        assert_eq!(schema.optional_field("AVG_TEMP").map(|f| f.key), Some("avg_temp"));
        assert!(schema.optional_field("totalsellingamount").is_none());
        assert!(
            Domain::CostOverrun
                .schema()
                .optional_field("totalsellingamount")
                .is_some()
        );
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!("delay".parse::<Domain>().unwrap(), Domain::Delay);
        assert_eq!("Cost-Overrun".parse::<Domain>().unwrap(), Domain::CostOverrun);
        assert!("weather".parse::<Domain>().is_err());
    }

    #[test]
    fn test_field_spec_serializes_kind_inline() {
        let json = serde_json::to_value(required_fields(Domain::Delay)[3]).unwrap();
        assert_eq!(json["kind"], "categorical");
        assert_eq!(json["options"][0], "Residential/Group Housing");

        let json = serde_json::to_value(optional_fields(Domain::Delay)[3]).unwrap();
        assert_eq!(json["kind"], "numeric");
        assert_eq!(json["step"], 0.01);
    }
}
