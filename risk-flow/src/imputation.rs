//! Derived defaults for optional fields the user did not supply.
//!
//! The ratios are business rules, so they live in an [`ImputationTable`]
//! that can be replaced from YAML without touching the dialogue code.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, Result};
use crate::schema::Domain;
use crate::value::{CollectedData, FieldValue};

/// How a missing optional value is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Derivation {
    /// `factor × of`, skipped while `of` is unknown
    Ratio {
        of: String,
        factor: f64,
        #[serde(default)]
        round_down: bool,
    },
    Constant {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRule {
    pub field: String,
    pub default: Derivation,
}

impl ImputationRule {
    fn ratio(field: &str, of: &str, factor: f64) -> Self {
        Self {
            field: field.to_string(),
            default: Derivation::Ratio {
                of: of.to_string(),
                factor,
                round_down: false,
            },
        }
    }

    fn whole_ratio(field: &str, of: &str, factor: f64) -> Self {
        Self {
            field: field.to_string(),
            default: Derivation::Ratio {
                of: of.to_string(),
                factor,
                round_down: true,
            },
        }
    }

    fn constant(field: &str, value: f64) -> Self {
        Self {
            field: field.to_string(),
            default: Derivation::Constant { value },
        }
    }

    fn derive(&self, known: &CollectedData) -> Option<f64> {
        match &self.default {
            Derivation::Ratio {
                of,
                factor,
                round_down,
            } => {
                let value = known.number(of)? * factor;
                Some(if *round_down { value.floor() } else { value })
            }
            Derivation::Constant { value } => Some(*value),
        }
    }
}

/// Ordered default rules per domain. Later rules may read values that
/// earlier rules imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationTable {
    pub delay: Vec<ImputationRule>,
    pub cost_overrun: Vec<ImputationRule>,
}

impl Default for ImputationTable {
    fn default() -> Self {
        Self {
            delay: vec![
                ImputationRule::ratio("totalincurredcost", "final_project_cost", 0.6),
                ImputationRule::ratio("totallandcost", "final_project_cost", 0.2),
                ImputationRule::constant("budget_overrun_percent", 0.0),
                ImputationRule::constant("progress_ratio", 0.5),
                ImputationRule::whole_ratio("bookedunits", "totalunits", 0.5),
                ImputationRule::constant("land_utilization", 0.5),
                ImputationRule::ratio("actual_duration_days", "planned_duration_days", 1.0),
                ImputationRule::constant("avg_temp", 28.0),
                ImputationRule::constant("total_rain", 50.0),
                ImputationRule::ratio("totalsquarefootbuild", "totalunits", 1000.0),
            ],
            cost_overrun: vec![
                ImputationRule::ratio("totalincurredcost", "final_project_cost", 0.65),
                ImputationRule::ratio("totallandcost", "final_project_cost", 0.2),
                ImputationRule::ratio("totalsellingamount", "final_project_cost", 1.2),
                ImputationRule::ratio("totalpayableamountgovernment", "final_project_cost", 0.05),
                ImputationRule::ratio("totaldevelopcost", "final_project_cost", 0.4),
                ImputationRule::ratio("totalreceivedamount", "totalsellingamount", 0.45),
                ImputationRule::ratio("bookedsellingamount", "totalsellingamount", 0.7),
                ImputationRule::whole_ratio("bookedunits", "totalunits", 0.6),
                ImputationRule::constant("progress_ratio", 0.5),
                ImputationRule::constant("land_utilization", 0.8),
                ImputationRule::constant("avg_temp", 28.0),
                ImputationRule::constant("total_rain", 50.0),
                ImputationRule::ratio("totalsquarefootbuild", "totalunits", 1000.0),
            ],
        }
    }
}

impl ImputationTable {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let table: Self = serde_yaml::from_str(yaml)
            .map_err(|e| FlowError::Config(format!("invalid imputation table: {e}")))?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            FlowError::Config(format!("cannot read imputation table {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn rules(&self, domain: Domain) -> &[ImputationRule] {
        match domain {
            Domain::Delay => &self.delay,
            Domain::CostOverrun => &self.cost_overrun,
        }
    }

    /// Every rule must fill a distinct optional field of its domain and
    /// ratios must read a numeric field of the same domain.
    pub fn validate(&self) -> Result<()> {
        for domain in Domain::ALL {
            let schema = domain.schema();
            let mut seen = HashSet::new();

            for rule in self.rules(domain) {
                if !schema.optional.iter().any(|f| f.key == rule.field) {
                    return Err(FlowError::UnknownField {
                        domain,
                        key: rule.field.clone(),
                    });
                }
                if !seen.insert(rule.field.as_str()) {
                    return Err(FlowError::Config(format!(
                        "{domain} table has more than one rule for `{}`",
                        rule.field
                    )));
                }
                match &rule.default {
                    Derivation::Ratio { of, factor, .. } => {
                        let numeric = schema.field(of).is_some_and(|f| f.is_numeric());
                        if !numeric {
                            return Err(FlowError::UnknownField {
                                domain,
                                key: of.clone(),
                            });
                        }
                        if !factor.is_finite() {
                            return Err(FlowError::Config(format!(
                                "ratio for `{}` is not finite",
                                rule.field
                            )));
                        }
                    }
                    Derivation::Constant { value } if !value.is_finite() => {
                        return Err(FlowError::Config(format!(
                            "constant for `{}` is not finite",
                            rule.field
                        )));
                    }
                    Derivation::Constant { .. } => {}
                }
            }
        }
        Ok(())
    }

    /// Fill unset optional fields. Present values are never overwritten,
    /// so applying the result again changes nothing.
    pub fn impute(&self, domain: Domain, collected: &CollectedData) -> CollectedData {
        let mut completed = collected.clone();
        let mut filled = 0usize;

        for rule in self.rules(domain) {
            if completed.contains(&rule.field) {
                continue;
            }
            if let Some(value) = rule.derive(&completed) {
                completed.insert(rule.field.clone(), FieldValue::Number(value));
                filled += 1;
            }
        }

        debug!(domain = %domain, imputed = filled, "Applied default rules");
        completed
    }
}
