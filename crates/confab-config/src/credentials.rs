// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of the two settings every command needs: model and API key.

use crate::diagnostic::ConfigError;
use crate::model::OpenAiConfig;

/// Environment variable holding the model identifier.
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL_NAME";

/// Environment variable holding the API credential.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Model identifier and credential, both non-empty.
#[derive(Clone)]
pub struct Credentials {
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Resolve credentials from the config, falling back to the process
/// environment.
pub fn resolve_credentials(config: &OpenAiConfig) -> Result<Credentials, Vec<ConfigError>> {
    resolve_credentials_with(config, |name| std::env::var(name).ok())
}

/// Resolve credentials using `lookup` for environment fallback.
///
/// Config values win over the environment. Blank values count as missing.
/// Both settings are checked so a single run reports everything absent.
pub fn resolve_credentials_with(
    config: &OpenAiConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credentials, Vec<ConfigError>> {
    let pick = |configured: &Option<String>, env_var: &str| {
        configured
            .clone()
            .or_else(|| lookup(env_var))
            .filter(|v| !v.trim().is_empty())
    };

    let model = pick(&config.model, MODEL_ENV_VAR);
    let api_key = pick(&config.api_key, API_KEY_ENV_VAR);

    match (model, api_key) {
        (Some(model), Some(api_key)) => Ok(Credentials { model, api_key }),
        (model, api_key) => {
            let mut errors = Vec::new();
            if model.is_none() {
                errors.push(ConfigError::missing("openai.model", MODEL_ENV_VAR));
            }
            if api_key.is_none() {
                errors.push(ConfigError::missing("openai.api_key", API_KEY_ENV_VAR));
            }
            Err(errors)
        }
    }
}
