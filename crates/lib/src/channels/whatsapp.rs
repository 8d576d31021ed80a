//! WhatsApp channel: send messages through the Twilio Messages API.

use crate::channels::AlertChannel;
use crate::config::WhatsAppCredentials;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const TWILIO_API_BASE: &str = "https://api.twilio.com";

const SEND_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

/// WhatsApp connector: posts to the account's Messages endpoint with basic auth.
/// Sender and recipient are fixed at construction, not per message.
pub struct WhatsAppChannel {
    id: String,
    credentials: WhatsAppCredentials,
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(credentials: WhatsAppCredentials, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| TWILIO_API_BASE.to_string());
        Self {
            id: "whatsapp".to_string(),
            credentials,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }

    /// POST Messages.json with From/To/Body form fields. Returns the message sid.
    pub async fn send_message(&self, body: &str) -> Result<String, String> {
        let url = self.messages_url();
        let params = [
            ("From", self.credentials.from.as_str()),
            ("To", self.credentials.to.as_str()),
            ("Body", body),
        ];
        let res = self
            .client
            .post(&url)
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .timeout(SEND_TIMEOUT)
            .form(&params)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("message create failed: {} {}", status, body));
        }
        let data: MessageResponse = res.json().await.map_err(|e| e.to_string())?;
        Ok(data.sid)
    }
}

#[async_trait]
impl AlertChannel for WhatsAppChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_text(&self, text: &str) -> Result<String, String> {
        WhatsAppChannel::send_message(self, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> WhatsAppCredentials {
        WhatsAppCredentials {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from: "whatsapp:+14155238886".to_string(),
            to: "whatsapp:+5215512345678".to_string(),
        }
    }

    #[test]
    fn messages_url_embeds_account_sid() {
        let channel = WhatsAppChannel::new(credentials(), None);
        assert_eq!(
            channel.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn base_url_override_strips_trailing_slash() {
        let channel =
            WhatsAppChannel::new(credentials(), Some("http://127.0.0.1:9/".to_string()));
        assert_eq!(
            channel.messages_url(),
            "http://127.0.0.1:9/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
