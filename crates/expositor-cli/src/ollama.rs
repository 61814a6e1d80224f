//! [`LanguageModel`] backed by an Ollama server.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use ureq::Agent;

use expositor::model::{GenerationOptions, LanguageModel, ModelError};

/// Requests may take minutes on large inputs and slow hardware.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    error: Option<String>,
}

/// Talks to `POST /api/generate` without streaming.
pub struct OllamaModel {
    agent: Agent,
    endpoint: String,
    model: String,
    label: String,
}

impl OllamaModel {
    pub fn new(host: &str, model: impl Into<String>) -> Self {
        let model = model.into();
        let agent = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Self {
            agent,
            endpoint: format!("{}/api/generate", host.trim_end_matches('/')),
            label: format!("ollama/{model}"),
            model,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(
        &'a self,
        prompt: &'a str,
        options: &GenerationOptions,
    ) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: Options {
                temperature: options.temperature(),
                num_ctx: options.context_window(),
            },
        }
    }
}

impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        &self.label
    }

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ModelError> {
        debug!(
            endpoint = self.endpoint.as_str(),
            temperature = options.temperature(),
            prompt_len = prompt.len();
            "Sending generate request"
        );

        let mut response = self
            .agent
            .post(&self.endpoint)
            .send_json(self.request_body(prompt, options))
            .map_err(|err| match err {
                ureq::Error::StatusCode(code) => {
                    ModelError::Service(format!("{} returned HTTP {code}", self.endpoint))
                }
                other => ModelError::Transport(format!("{}: {other}", self.endpoint)),
            })?;

        let body: GenerateResponse = response
            .body_mut()
            .read_json()
            .map_err(|err| ModelError::Decode(err.to_string()))?;

        match body.error {
            Some(error) => Err(ModelError::Service(error)),
            None => Ok(body.response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_and_name() {
        let model = OllamaModel::new("http://localhost:11434/", "llama3");

        assert_eq!(model.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(model.name(), "ollama/llama3");
    }

    #[test]
    fn test_request_body() {
        let model = OllamaModel::new("http://localhost:11434", "llama3");
        let options = GenerationOptions::new(0.1).with_context_window(8192);

        let body = serde_json::to_value(model.request_body("hi", &options)).unwrap();

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_ctx"], 8192);
        assert!(body["options"]["temperature"].as_f64().unwrap() > 0.09);

        let defaults = GenerationOptions::default();
        let body = serde_json::to_value(model.request_body("hi", &defaults)).unwrap();
        assert!(body["options"].get("num_ctx").is_none());
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let model = OllamaModel::new("http://127.0.0.1:1", "llama3");

        let err = model.generate("hi", &GenerationOptions::default()).unwrap_err();

        assert!(matches!(err, ModelError::Transport(_)));
    }
}
