//! Gateway HTTP API types (chat, leads, health) and request validation.
//!
//! Bodies are parsed leniently from raw JSON so that a missing or mistyped field
//! maps to a 400 with a descriptive error instead of an extractor rejection, and
//! no provider is ever invoked for an invalid request.

use crate::alerts::LeadInfo;
use serde::{Deserialize, Serialize};

pub const ERR_MESSAGE_REQUIRED: &str = "El campo \"message\" es obligatorio.";
pub const ERR_LEAD_FIELDS_REQUIRED: &str = "Email y mensaje son obligatorios.";

/// One incoming chat turn from the widget.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    /// Arbitrary page context forwarded into the prompt and the alert. JSON null
    /// when the widget sent none.
    pub context: serde_json::Value,
    pub lead_info: Option<LeadInfo>,
}

/// One captured lead from the contact form.
#[derive(Debug, Clone)]
pub struct LeadRequest {
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub interest: Option<String>,
    pub message: String,
}

impl LeadRequest {
    /// Lead fields in the shape the alert dispatcher renders.
    pub fn lead_info(&self) -> LeadInfo {
        LeadInfo {
            name: self.name.clone(),
            email: Some(self.email.clone()),
            phone: self.phone.clone(),
            company: self.company.clone(),
            interest: self.interest.clone(),
        }
    }
}

/// Response for POST /api/chat. `sid` is always present, null when no alert went out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    pub sent_alert: bool,
    pub sid: Option<String>,
    pub timestamp: String,
}

/// Response for POST /api/leads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
    pub sent_alert: bool,
    pub sid: Option<String>,
}

/// Error body for 400/500 responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response for GET /health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub timestamp: String,
}

/// Non-empty string field, or None when absent, empty, or not a string.
fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Parse and validate a chat request body. The message must be a non-empty string;
/// a malformed leadInfo is tolerated as absent.
pub fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ERR_MESSAGE_REQUIRED.to_string())?;
    let message = non_empty_str(value.get("message")).ok_or(ERR_MESSAGE_REQUIRED)?;
    let context = value
        .get("context")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    let lead_info = value
        .get("leadInfo")
        .and_then(|v| serde_json::from_value::<LeadInfo>(v.clone()).ok());
    Ok(ChatRequest {
        message,
        context,
        lead_info,
    })
}

/// Parse and validate a lead request body. Email and message are required; the
/// remaining fields are optional strings.
pub fn parse_lead_request(body: &[u8]) -> Result<LeadRequest, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ERR_LEAD_FIELDS_REQUIRED.to_string())?;
    let email = non_empty_str(value.get("email")).ok_or(ERR_LEAD_FIELDS_REQUIRED)?;
    let message = non_empty_str(value.get("message")).ok_or(ERR_LEAD_FIELDS_REQUIRED)?;
    Ok(LeadRequest {
        name: non_empty_str(value.get("name")),
        email,
        phone: non_empty_str(value.get("phone")),
        company: non_empty_str(value.get("company")),
        interest: non_empty_str(value.get("interest")),
        message,
    })
}
