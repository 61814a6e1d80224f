//! The language-model seam.
//!
//! Renderers never talk to a model service directly. They receive a
//! [`LanguageModel`] and call [`LanguageModel::generate`] with a prompt and
//! sampling options. The CLI supplies an HTTP-backed implementation; tests
//! supply scripted ones.

use thiserror::Error;

/// Sampling options for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    temperature: f32,
    context_window: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            context_window: None,
        }
    }
}

impl GenerationOptions {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            context_window: None,
        }
    }

    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = Some(tokens);
        self
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn context_window(&self) -> Option<u32> {
        self.context_window
    }
}

/// Errors reported by a [`LanguageModel`].
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request to model service failed: {0}")]
    Transport(String),

    #[error("model service returned an error: {0}")]
    Service(String),

    #[error("model response could not be decoded: {0}")]
    Decode(String),
}

/// A text generator.
pub trait LanguageModel: Send + Sync {
    /// Identifier shown in logs, such as `ollama/llama3`.
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ModelError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses and records every prompt it receives.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedModel {
        responses: Mutex<Vec<Result<String, String>>>,
        pub(crate) prompts: Mutex<Vec<(String, GenerationOptions)>>,
    }

    impl ScriptedModel {
        pub(crate) fn replying(response: impl Into<String>) -> Self {
            Self {
                responses: Mutex::new(vec![Ok(response.into())]),
                ..Self::default()
            }
        }

        pub(crate) fn failing(message: impl Into<String>) -> Self {
            Self {
                responses: Mutex::new(vec![Err(message.into())]),
                ..Self::default()
            }
        }

        pub(crate) fn last_prompt(&self) -> Option<(String, GenerationOptions)> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ModelError> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), *options));
            let mut responses = self.responses.lock().unwrap();
            let next = if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses.first().cloned().unwrap_or(Ok(String::new()))
            };
            next.map_err(ModelError::Service)
        }
    }
}
