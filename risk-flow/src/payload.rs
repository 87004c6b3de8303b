use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};
use crate::imputation::ImputationTable;
use crate::schema::{Domain, required_fields};
use crate::value::CollectedData;

/// Outbound request for one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub domain: Domain,
    pub body: CollectedData,
}

/// Merge the user's answers with imputed defaults.
///
/// Fails if a required field is missing or a key does not belong to the
/// domain; the dialogue only calls this after collecting every required
/// answer, so either error indicates a caller bug.
pub fn build_payload(
    domain: Domain,
    collected: &CollectedData,
    defaults: &ImputationTable,
) -> Result<PredictionRequest> {
    let schema = domain.schema();

    if let Some(key) = collected.keys().find(|key| !schema.contains(key)) {
        return Err(FlowError::UnknownField {
            domain,
            key: key.to_string(),
        });
    }

    if let Some(field) = required_fields(domain)
        .iter()
        .find(|field| !collected.contains(field.key))
    {
        return Err(FlowError::MissingRequired {
            domain,
            key: field.key.to_string(),
        });
    }

    Ok(PredictionRequest {
        domain,
        body: defaults.impute(domain, collected),
    })
}
