//! Outbound alert channels (e.g. WhatsApp via the Twilio Messages API).
//!
//! Channel trait so the dispatcher can send alerts without knowing the provider;
//! tests substitute a fake channel.

mod whatsapp;

use async_trait::async_trait;

pub use whatsapp::WhatsAppChannel;

/// Handle to an outbound alert channel with a fixed sender and recipient.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel id (e.g. "whatsapp").
    fn id(&self) -> &str;
    /// Send a text message to the fixed recipient. Returns the provider message id.
    async fn send_text(&self, text: &str) -> Result<String, String>;
}
