//! Alert dispatch: compose the WhatsApp alert text and send it through the
//! configured channel. Without a channel, dispatch reports "not sent" instead of
//! failing — the relay still answers the visitor.

use crate::channels::AlertChannel;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MISSING_FIELD: &str = "No proporcionado";

/// Structured contact data captured from the widget or the lead form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub interest: Option<String>,
}

/// One alert to dispatch: the visitor message, the resolved reply, the request
/// context, and any lead data present.
pub struct AlertRequest<'a> {
    pub message: &'a str,
    pub reply: &'a str,
    pub context: &'a serde_json::Value,
    pub lead_info: Option<&'a LeadInfo>,
}

/// Outcome reported to the caller: whether the alert went out and the provider sid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertOutcome {
    pub sent: bool,
    pub sid: Option<String>,
}

impl AlertOutcome {
    fn skipped() -> Self {
        Self {
            sent: false,
            sid: None,
        }
    }
}

/// Sends formatted alerts through an optional channel. A missing channel is the
/// designed degrade path when messaging credentials are incomplete.
pub struct AlertDispatcher {
    channel: Option<Arc<dyn AlertChannel>>,
}

impl AlertDispatcher {
    pub fn new(channel: Option<Arc<dyn AlertChannel>>) -> Self {
        Self { channel }
    }

    /// True when an alert channel is configured.
    pub fn is_configured(&self) -> bool {
        self.channel.is_some()
    }

    /// Compose and send one alert. Returns sent:false without a configured channel.
    /// Channel errors propagate to the caller, which decides whether to tolerate them.
    pub async fn send_alert(&self, req: &AlertRequest<'_>) -> Result<AlertOutcome, String> {
        let channel = match &self.channel {
            Some(c) => c,
            None => return Ok(AlertOutcome::skipped()),
        };
        let text = compose_alert_text(req, Local::now());
        let sid = channel.send_text(&text).await?;
        log::debug!("alert dispatched via {} (sid {})", channel.id(), sid);
        Ok(AlertOutcome {
            sent: true,
            sid: Some(sid),
        })
    }
}

/// Fixed alert layout: header, visitor message, AI reply, optional lead block,
/// local timestamp, serialized context.
fn compose_alert_text(req: &AlertRequest<'_>, now: DateTime<Local>) -> String {
    let mut text = String::from("🤖 *NUEVO LEAD - Chat ITAI*\n\n");
    text.push_str(&format!("💬 *Mensaje del cliente:*\n{}\n\n", req.message));
    text.push_str(&format!("🧠 *Respuesta IA:*\n{}\n\n", req.reply));

    if let Some(lead) = req.lead_info {
        text.push_str("👤 *Datos del lead:*\n");
        text.push_str(&format!("Nombre: {}\n", field(&lead.name)));
        text.push_str(&format!("Email: {}\n", field(&lead.email)));
        text.push_str(&format!("Teléfono: {}\n", field(&lead.phone)));
        text.push_str(&format!("Empresa: {}\n\n", field(&lead.company)));
    }

    let context_json =
        serde_json::to_string(req.context).unwrap_or_else(|_| "null".to_string());
    text.push_str(&format!("🕐 *Fecha:* {}\n", now.format("%d/%m/%Y %H:%M:%S")));
    text.push_str(&format!("📊 *Contexto:* {}", context_json));
    text
}

fn field(value: &Option<String>) -> &str {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(MISSING_FIELD)
}
