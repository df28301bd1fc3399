//! Flag Client
//!
//! Reports non-completed interviews to the interview backend's `/flag`
//! endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::sink::DispositionSink;
use super::ReportError;
use crate::logic::session::Disposition;

#[derive(Debug, Clone)]
pub struct FlagConfig {
    pub backend_url: String,
    pub timeout_seconds: u64,
}

impl Default for FlagConfig {
    fn default() -> Self {
        use crate::constants;

        Self {
            backend_url: constants::get_backend_url(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagRequest {
    pub interview_id: String,
    /// One `"{TIER}: {description}"` per line
    pub violations: String,
}

impl FlagRequest {
    pub fn from_disposition(disposition: &Disposition) -> Self {
        Self {
            interview_id: disposition.interview_id.clone(),
            violations: disposition.flag_report(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FlagResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct FlagClient {
    config: FlagConfig,
    http_client: reqwest::Client,
}

impl FlagClient {
    pub fn new(config: FlagConfig) -> Result<Self, ReportError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ReportError::Network(e.to_string()))?;

        Ok(Self { config, http_client })
    }

    pub fn flag_url(&self) -> String {
        format!("{}/flag", self.config.backend_url.trim_end_matches('/'))
    }

    pub async fn flag(&self, request: &FlagRequest) -> Result<(), ReportError> {
        let response = self
            .http_client
            .post(self.flag_url())
            .json(request)
            .send()
            .await
            .map_err(|e| ReportError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ReportError::Server(response.status().as_u16()));
        }

        let body: FlagResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Parse(e.to_string()))?;

        if body.success {
            log::info!("Interview '{}' flagged", request.interview_id);
            Ok(())
        } else {
            Err(ReportError::Rejected(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl DispositionSink for FlagClient {
    fn name(&self) -> &'static str {
        "flag"
    }

    async fn deliver(&self, disposition: &Disposition) -> Result<(), ReportError> {
        if disposition.completed {
            log::debug!("Interview '{}' completed cleanly; nothing to flag", disposition.interview_id);
            return Ok(());
        }
        self.flag(&FlagRequest::from_disposition(disposition)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::session::{EndReason, SessionState};
    use crate::logic::violation::{Violation, ViolationClass};
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn flagged() -> Disposition {
        let violations = vec![
            Violation::new(ViolationClass::CopyPaste, 0.5),
            Violation::new(ViolationClass::FaceAbsent, 0.5),
        ];
        Disposition {
            session_id: Uuid::new_v4(),
            interview_id: "iv-42".into(),
            state: SessionState::Flagged,
            total_weight: 1.0,
            violations,
            counts: BTreeMap::new(),
            completed: false,
            monitoring_degraded: false,
            ended_at: Utc::now(),
            end_reason: EndReason::ThresholdReached,
            actions: Vec::new(),
        }
    }

    #[test]
    fn test_request_body() {
        let request = FlagRequest::from_disposition(&flagged());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["interview_id"], "iv-42");
        assert_eq!(
            json["violations"],
            "MINOR: Copy-paste attempt detected!\nMINOR: Face not detected for an extended period."
        );
    }

    #[test]
    fn test_flag_url() {
        let client = FlagClient::new(FlagConfig {
            backend_url: "http://backend:8000/".into(),
            timeout_seconds: 5,
        })
        .unwrap();
        assert_eq!(client.flag_url(), "http://backend:8000/flag");
    }

    #[tokio::test]
    async fn test_completed_not_reported() {
        // unroutable backend; a completed disposition never touches it
        let client = FlagClient::new(FlagConfig {
            backend_url: "http://127.0.0.1:9".into(),
            timeout_seconds: 1,
        })
        .unwrap();
        let mut disposition = flagged();
        disposition.completed = true;
        assert!(client.deliver(&disposition).await.is_ok());
    }

    #[test]
    fn test_response_parse() {
        let body: FlagResponse = serde_json::from_str(r#"{"success": false, "error": "not found"}"#).unwrap();
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("not found"));
    }
}
