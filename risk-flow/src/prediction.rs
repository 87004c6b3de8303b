//! Boundary to the external prediction service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PredictionApiConfig;
use crate::error::{DispatchError, FlowError};
use crate::payload::PredictionRequest;
use crate::schema::Domain;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayPrediction {
    pub is_delayed: bool,
    pub delay_probability: f64,
    pub predicted_delay_days: u32,
    pub risk_level: String,
    pub confidence: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrunIntervals {
    pub p10: f64,
    pub expected: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostIntervals {
    pub p10: Option<f64>,
    pub expected: Option<f64>,
    pub p90: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOverrunPrediction {
    pub expected_overrun_percent: f64,
    pub predicted_final_cost: f64,
    pub risk_level: String,
    #[serde(default)]
    pub intervals: Option<OverrunIntervals>,
    #[serde(default)]
    pub cost_intervals: Option<CostIntervals>,
    #[serde(default)]
    pub alerts: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub model_version: Option<String>,
}

/// Typed service answer. Values are kept exactly as received; display
/// formatting happens in [`crate::report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", rename_all = "kebab-case")]
pub enum PredictionResult {
    Delay(DelayPrediction),
    CostOverrun(CostOverrunPrediction),
}

impl PredictionResult {
    pub fn domain(&self) -> Domain {
        match self {
            PredictionResult::Delay(_) => Domain::Delay,
            PredictionResult::CostOverrun(_) => Domain::CostOverrun,
        }
    }
}

/// `{ success, error?, prediction?, recommendations? }`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prediction: Option<Value>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
}

/// Decode a response body for `domain`.
///
/// The delay service places `recommendations` beside `prediction`; when
/// present there it takes precedence over any list inside `prediction`.
pub fn decode_response(
    domain: Domain,
    status: Option<u16>,
    body: &str,
) -> Result<PredictionResult, DispatchError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| {
        if status.is_some_and(|s| !(200..300).contains(&s)) {
            DispatchError::Rejected {
                status,
                message: format!("HTTP {}", status.unwrap_or_default()),
            }
        } else {
            DispatchError::Malformed(e.to_string())
        }
    })?;

    if !envelope.success {
        return Err(DispatchError::Rejected {
            status,
            message: envelope
                .error
                .unwrap_or_else(|| "Prediction failed".to_string()),
        });
    }

    let prediction = envelope
        .prediction
        .ok_or_else(|| DispatchError::Malformed("missing `prediction`".to_string()))?;

    match domain {
        Domain::Delay => {
            let mut delay: DelayPrediction = serde_json::from_value(prediction)
                .map_err(|e| DispatchError::Malformed(e.to_string()))?;
            if let Some(recommendations) = envelope.recommendations {
                delay.recommendations = recommendations;
            }
            Ok(PredictionResult::Delay(delay))
        }
        Domain::CostOverrun => serde_json::from_value(prediction)
            .map(PredictionResult::CostOverrun)
            .map_err(|e| DispatchError::Malformed(e.to_string())),
    }
}

/// Sends one payload and returns the typed result
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, request: &PredictionRequest)
    -> Result<PredictionResult, DispatchError>;
}

/// JSON-over-HTTP client for the `/predict/*` endpoints
pub struct HttpPredictionClient {
    client: reqwest::Client,
    config: PredictionApiConfig,
}

impl HttpPredictionClient {
    pub fn new(config: PredictionApiConfig) -> Result<Self, FlowError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FlowError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, DispatchError> {
        let url = self.config.endpoint(request.domain);
        info!(domain = %request.domain, url = %url, fields = request.body.len(), "Dispatching prediction");

        let response = self
            .client
            .post(&url)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout(self.timeout())
                } else {
                    DispatchError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout(self.timeout())
            } else {
                DispatchError::Network(e.to_string())
            }
        })?;

        let result = decode_response(request.domain, Some(status), &body);
        if let Err(e) = &result {
            warn!(domain = %request.domain, status, error = %e, "Prediction request failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_envelope_with_top_level_recommendations() {
        let body = r#"{
            "success": true,
            "prediction": {
                "is_delayed": true,
                "delay_probability": 0.82,
                "predicted_delay_days": 95,
                "risk_level": "High",
                "confidence": "High"
            },
            "recommendations": ["Review critical path activities."]
        }"#;
        let PredictionResult::Delay(delay) = decode_response(Domain::Delay, Some(200), body).unwrap()
        else {
            panic!("expected delay result");
        };
        assert_eq!(delay.predicted_delay_days, 95);
        assert_eq!(delay.recommendations, vec!["Review critical path activities."]);
    }

    #[test]
    fn test_cost_envelope_with_partial_intervals() {
        let body = r#"{
            "success": true,
            "prediction": {
                "model_version": "v3",
                "expected_overrun_percent": -1.5,
                "predicted_final_cost": 49250000,
                "risk_level": "Low",
                "intervals": {"p10": -4.0, "expected": -1.5, "p90": 2.25},
                "cost_intervals": {"p10": 48000000, "p90": 51125000},
                "alerts": [],
                "recommendations": ["Keep monitoring."],
                "top_contributors": []
            }
        }"#;
        let result = decode_response(Domain::CostOverrun, Some(200), body).unwrap();
        let PredictionResult::CostOverrun(cost) = result else {
            panic!("expected cost result");
        };
        assert_eq!(cost.cost_intervals.unwrap().expected, None);
        assert_eq!(cost.intervals.unwrap().p90, 2.25);
    }

    #[test]
    fn test_failure_envelope_is_rejected_with_message() {
        let body = r#"{"success": false, "error": "Missing required fields: totalunits"}"#;
        assert_eq!(
            decode_response(Domain::Delay, Some(400), body),
            Err(DispatchError::Rejected {
                status: Some(400),
                message: "Missing required fields: totalunits".to_string()
            })
        );
    }

    #[test]
    fn test_error_without_success_flag() {
        let body = r#"{"error": "Models not loaded"}"#;
        let err = decode_response(Domain::Delay, Some(500), body).unwrap_err();
        assert!(matches!(err, DispatchError::Rejected { message, .. } if message == "Models not loaded"));
    }

    #[test]
    fn test_success_without_prediction_is_malformed() {
        let err = decode_response(Domain::Delay, Some(200), r#"{"success": true}"#).unwrap_err();
        assert!(matches!(err, DispatchError::Malformed(_)));

        let body = r#"{"success": true, "prediction": {"is_delayed": "maybe"}}"#;
        let err = decode_response(Domain::Delay, Some(200), body).unwrap_err();
        assert!(matches!(err, DispatchError::Malformed(_)));
    }

    #[test]
    fn test_non_json_bodies() {
        let err = decode_response(Domain::CostOverrun, Some(502), "<html>bad gateway</html>")
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected {
                status: Some(502),
                message: "HTTP 502".to_string()
            }
        );
        let err = decode_response(Domain::CostOverrun, Some(200), "not json").unwrap_err();
        assert!(matches!(err, DispatchError::Malformed(_)));
    }

    #[test]
    fn test_result_serializes_with_domain_tag() {
        let result = PredictionResult::Delay(DelayPrediction {
            is_delayed: false,
            delay_probability: 0.1,
            predicted_delay_days: 0,
            risk_level: "Low".into(),
            confidence: "High".into(),
            recommendations: vec![],
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["domain"], "delay");
        assert_eq!(serde_json::from_value::<PredictionResult>(json).unwrap(), result);
    }
}
