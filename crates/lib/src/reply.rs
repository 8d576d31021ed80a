//! Reply generation: build the assistant prompt, call the completion API, fall back
//! to canned replies when the provider is absent or returns nothing.

use crate::llm::{ChatMessage, OpenAiClient, OpenAiError};

/// Canned reply when no completion provider is configured. Sent without any network call.
pub const PLACEHOLDER_REPLY: &str =
    "Gracias por tu mensaje. Un asesor se comunicará contigo pronto.";

/// Fallback when the provider returns an empty or malformed completion.
pub const EMPTY_COMPLETION_FALLBACK: &str =
    "Gracias por escribirnos. Un especialista de ITAI te contactará pronto para brindarte la mejor solución para tu negocio.";

const MAX_REPLY_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.7;

const SYSTEM_PROMPT: &str = "\
Eres el asistente virtual de ITAI, una empresa especializada en desarrollo web y chatbots con IA.

INFORMACIÓN DE ITAI:
- Especialistas en páginas web modernas con chat IA integrado
- Desarrollamos chatbots que entienden productos específicos de cada negocio
- Ofrecemos respuesta inmediata 24/7 con tono humano y natural
- Entrenamos la IA con catálogos, FAQ y promociones del cliente
- Sistema de captura de leads y alertas automáticas a WhatsApp
- Soluciones personalizadas para cada tipo de negocio

SERVICIOS PRINCIPALES:
1. Páginas web con chatbot IA integrado
2. Chatbots personalizados para WhatsApp/Facebook
3. Sistemas de automatización de ventas
4. Integración con CRM y bases de datos
5. Asesoría y capacitación en herramientas digitales

TONO: Conversacional, humano, cercano y profesional. Como si fueras parte del equipo de ITAI.
OBJETIVO: Entender la necesidad del cliente y guiarlo hacia una asesoría personalizada.

Responde de manera natural, pregunta detalles sobre su negocio si es necesario, y siempre ofrece una asesoría personalizada como próximo paso.";

/// Generates one reply per incoming chat message. Holds the completion client only
/// when a key was configured; without it every message gets the placeholder reply.
pub struct ReplyGenerator {
    client: Option<OpenAiClient>,
    model: String,
}

impl ReplyGenerator {
    pub fn new(client: Option<OpenAiClient>, model: String) -> Self {
        Self { client, model }
    }

    /// True when a completion provider is configured.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Generate a reply for one user message. Without a configured client this returns
    /// the placeholder reply immediately. Provider errors propagate to the caller; an
    /// empty completion maps to the fallback string instead of an empty reply.
    pub async fn generate_reply(
        &self,
        message: &str,
        context: &serde_json::Value,
    ) -> Result<String, OpenAiError> {
        let client = match &self.client {
            Some(c) => c,
            None => return Ok(PLACEHOLDER_REPLY.to_string()),
        };

        let messages = vec![
            ChatMessage::system(system_prompt(context)),
            ChatMessage::user(message),
        ];
        let res = client
            .chat(&self.model, messages, MAX_REPLY_TOKENS, TEMPERATURE)
            .await?;
        let content = res.content().trim();
        if content.is_empty() {
            Ok(EMPTY_COMPLETION_FALLBACK.to_string())
        } else {
            Ok(content.to_string())
        }
    }
}

/// Fixed persona instruction with the caller-supplied context serialized at the end.
fn system_prompt(context: &serde_json::Value) -> String {
    let context_json =
        serde_json::to_string(context).unwrap_or_else(|_| "null".to_string());
    format!("{}\n\nContexto adicional: {}", SYSTEM_PROMPT, context_json)
}
