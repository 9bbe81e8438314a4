//! Agent persona responses.
//!
//! A thin call-through to an OpenAI-compatible chat completion endpoint. When
//! no key is configured or the call fails, a fixed template answers instead,
//! so [`PersonaGenerator::generate`] always produces text.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::PersonaConfig;
use crate::error::PersonaError;
use crate::network::NetworkDescriptor;

const EMPTY_COMPLETION_REPLY: &str = "I apologize, but I could not generate a response.";

/// Produces an in-character reply for a named agent.
#[async_trait]
pub trait PersonaGenerator: Send + Sync {
    async fn generate(&self, agent_name: &str, bio_lines: &[String], user_message: &str) -> String;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Persona generator backed by a chat completion API.
pub struct CompletionPersona {
    config: PersonaConfig,
    network: Arc<NetworkDescriptor>,
    client: Client,
}

impl CompletionPersona {
    pub fn new(config: PersonaConfig, network: Arc<NetworkDescriptor>) -> Self {
        if !config.has_api_key() {
            tracing::warn!("completion API key is not set; persona replies use fallback templates");
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            config,
            network,
            client,
        }
    }

    pub fn system_prompt(&self, agent_name: &str, bio_lines: &[String]) -> String {
        let bio = bio_lines.join(" ");
        let currency = self.network.native_currency();
        format!(
            "You are {agent_name}, a DeFi assistant. {bio}\n\
             You specialize in helping users with cryptocurrency and decentralized finance tasks.\n\
             You are knowledgeable about the {} blockchain (chainID: {}, Currency: {}).\n\
             Always be helpful, concise, and stay in character.",
            self.network.name(),
            self.network.numeric_id(),
            currency.symbol,
        )
    }

    /// One completion call. `Ok(None)` when the first choice carries no text;
    /// a response without any choice is an error.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<Option<String>, PersonaError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or(PersonaError::MissingApiKey)?;

        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PersonaError::Status {
                status: status.as_u16(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| PersonaError::InvalidResponse(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PersonaError::InvalidResponse("no choices returned".to_string()))?;
        Ok(choice.message.content.filter(|content| !content.is_empty()))
    }
}

#[async_trait]
impl PersonaGenerator for CompletionPersona {
    async fn generate(&self, agent_name: &str, bio_lines: &[String], user_message: &str) -> String {
        if !self.config.has_api_key() {
            return fallback_response(agent_name, user_message, &self.network);
        }

        let system_prompt = self.system_prompt(agent_name, bio_lines);
        match self.complete(&system_prompt, user_message).await {
            Ok(Some(content)) => content,
            Ok(None) => EMPTY_COMPLETION_REPLY.to_string(),
            Err(e) => {
                tracing::error!(agent = agent_name, "completion request failed: {e}");
                fallback_response(agent_name, user_message, &self.network)
            }
        }
    }
}

/// Canned reply used when the completion API is unavailable.
pub fn fallback_response(
    agent_name: &str,
    user_message: &str,
    network: &NetworkDescriptor,
) -> String {
    let lowered = user_message.to_lowercase();
    let symbol = &network.native_currency().symbol;
    let greets = lowered.contains("hello")
        || lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == "hi");

    if greets {
        format!(
            "Hello! I'm {agent_name}, a DeFi assistant specialized in the {} blockchain. \
             I can help you with tasks like checking balances, transferring tokens, and providing \
             information about the {symbol} currency. How can I assist you today?",
            network.name()
        )
    } else if lowered.contains("what can you do") {
        format!(
            "As {agent_name}, I can help you with various DeFi operations on the {} blockchain \
             (chainID: {}), including:\n\n\
             1. Providing information about {symbol} tokens and their current market status\n\
             2. Explaining how to transfer tokens between wallets\n\
             3. Guiding you through swapping tokens on decentralized exchanges\n\
             4. Helping you understand yield farming and staking opportunities\n\
             5. Explaining blockchain concepts in simple terms\n\n\
             What specific DeFi task would you like help with today?",
            network.name(),
            network.numeric_id()
        )
    } else {
        format!(
            "I understand you're asking about \"{user_message}\". As a DeFi assistant for the {} \
             blockchain, I'd be happy to help with this. Could you provide more details about \
             what you're trying to accomplish so I can give you the most relevant information?",
            network.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{Value, json};

    fn codex() -> Arc<NetworkDescriptor> {
        Arc::new(NetworkDescriptor::open_campus_codex().clone())
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn config_for(base_url: String) -> PersonaConfig {
        PersonaConfig {
            api_key: Some(SecretString::from("sk-test".to_string())),
            base_url,
            ..PersonaConfig::default()
        }
    }

    #[test]
    fn fallback_picks_template_by_message() {
        let network = codex();
        let greeting = fallback_response("Ada", "Hi there", &network);
        assert!(greeting.starts_with("Hello! I'm Ada"));
        assert!(greeting.contains("EDU"));

        let capabilities = fallback_response("Ada", "So, what can you do?", &network);
        assert!(capabilities.contains("chainID: 656476"));

        let echo = fallback_response("Ada", "Bridge my tokens", &network);
        assert!(echo.contains("\"Bridge my tokens\""));

        // "this" contains "hi" but is not a greeting.
        let not_greeting = fallback_response("Ada", "Explain this pool", &network);
        assert!(not_greeting.starts_with("I understand"));
    }

    #[test]
    fn system_prompt_names_the_target_network() {
        let persona = CompletionPersona::new(PersonaConfig::default(), codex());
        let prompt = persona.system_prompt(
            "Ada",
            &["Calm.".to_string(), "Precise.".to_string()],
        );
        assert!(prompt.starts_with("You are Ada, a DeFi assistant. Calm. Precise."));
        assert!(prompt.contains("Open Campus Codex blockchain (chainID: 656476, Currency: EDU)"));
    }

    #[tokio::test]
    async fn missing_key_uses_fallback_without_network() {
        let persona = CompletionPersona::new(PersonaConfig::default(), codex());
        let reply = persona.generate("Ada", &[], "hello").await;
        assert!(reply.starts_with("Hello! I'm Ada"));
        assert!(matches!(
            persona.complete("system", "hello").await,
            Err(PersonaError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn completion_content_is_returned() {
        let router = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], json!("gpt-3.5-turbo"));
                assert_eq!(body["messages"][1]["content"], json!("gm"));
                assert_eq!(body["max_tokens"], json!(500));
                Json(json!({"choices": [{"message": {"role": "assistant", "content": "gm from Ada"}}]}))
            }),
        );
        let base_url = serve(router).await;
        let persona = CompletionPersona::new(config_for(base_url), codex());

        assert_eq!(persona.generate("Ada", &[], "gm").await, "gm from Ada");
    }

    #[tokio::test]
    async fn empty_completion_gets_apology() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": [{"message": {"content": null}}]})) }),
        );
        let base_url = serve(router).await;
        let persona = CompletionPersona::new(config_for(base_url), codex());

        assert_eq!(
            persona.generate("Ada", &[], "gm").await,
            EMPTY_COMPLETION_REPLY
        );
    }

    #[tokio::test]
    async fn missing_choices_fall_back_to_template() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let base_url = serve(router).await;
        let persona = CompletionPersona::new(config_for(base_url), codex());

        assert!(matches!(
            persona.complete("system", "hello").await,
            Err(PersonaError::InvalidResponse(_))
        ));
        let reply = persona.generate("Ada", &[], "hello").await;
        assert!(reply.starts_with("Hello! I'm Ada"));
    }

    #[tokio::test]
    async fn api_failure_falls_back_to_template() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        );
        let base_url = serve(router).await;
        let persona = CompletionPersona::new(config_for(base_url), codex());

        let reply = persona.generate("Ada", &[], "what can you do").await;
        assert!(reply.starts_with("As Ada"));
    }
}
