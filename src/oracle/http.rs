// SPDX-License-Identifier: MIT

//! HTTP oracle - OpenAI-compatible chat-completions backend
//!
//! Works against any endpoint speaking the `/chat/completions` dialect
//! (hosted APIs or a local server). Structured calls constrain the model
//! with a `json_schema` response format; if the payload still fails to
//! deserialize, [`judge`](HttpOracle::judge) falls back to the labeled
//! free-text parser rather than erroring.

use super::parser::parse_judgment;
use super::{Classification, Judgment, Oracle};
use crate::error::OracleError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::env;

// --- Static schemas ---

static JUDGMENT_SCHEMA: Lazy<Value> =
    Lazy::new(|| serde_json::to_value(schema_for!(Judgment)).unwrap_or_default());

static CLASSIFICATION_SCHEMA: Lazy<Value> =
    Lazy::new(|| serde_json::to_value(schema_for!(Classification)).unwrap_or_default());

/// OpenAI-compatible oracle implementation
pub struct HttpOracle {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl HttpOracle {
    /// Create a new HttpOracle from the environment.
    ///
    /// Requires `ORACLE_API_KEY`; `ORACLE_BASE_URL` and `ORACLE_MODEL`
    /// are optional overrides.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = env::var("ORACLE_API_KEY")
            .map_err(|_| OracleError::ApiKeyMissing("ORACLE_API_KEY".to_string()))?;
        let base_url =
            env::var("ORACLE_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model_name = env::var("ORACLE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    /// Send one chat request and return the first choice's text content
    async fn chat(
        &self,
        messages: Vec<Value>,
        response_format: Option<Value>,
    ) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.model_name,
            "messages": messages,
        });
        if let Some(format) = response_format {
            body["response_format"] = format;
        }

        log::debug!(
            "Oracle request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(OracleError::api("oracle", text));
        }

        let resp_json: Value = resp.json().await?;
        Self::extract_content(&resp_json)
    }

    /// Pull the assistant text out of a chat-completions response
    fn extract_content(response: &Value) -> Result<String, OracleError> {
        response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| OracleError::InvalidResponse("no choices in response".to_string()))
    }

    /// Structured call: schema-constrained response, deserialized into T
    async fn structured<T: DeserializeOwned>(
        &self,
        name: &str,
        schema: &Value,
        system: &str,
        user: &str,
    ) -> Result<T, OracleError> {
        let format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": name,
                "schema": schema,
            }
        });
        let messages = vec![
            json!({"role": "system", "content": system}),
            json!({"role": "user", "content": user}),
        ];
        let content = self.chat(messages, Some(format)).await?;
        serde_json::from_str(&content)
            .map_err(|e| OracleError::InvalidResponse(format!("schema mismatch: {}", e)))
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn judge(&self, system: &str, user: &str) -> Result<Judgment, OracleError> {
        match self
            .structured::<Judgment>("judgment", &JUDGMENT_SCHEMA, system, user)
            .await
        {
            Ok(judgment) => Ok(judgment.clamped()),
            Err(OracleError::InvalidResponse(reason)) => {
                // Model ignored the schema; retry once in labeled free text
                log::warn!(
                    "Structured judgment failed ({}), falling back to text parse",
                    reason
                );
                let prompt = format!(
                    "{}\n\n{}\n\nAnswer in this exact format:\nVERDICT: [LEGITIMATE/BS]\nCONFIDENCE: [0-100]\nREASONING: [your analysis]",
                    system, user
                );
                let content = self.complete(&prompt).await?;
                Ok(parse_judgment(&content))
            }
            Err(e) => Err(e),
        }
    }

    async fn classify(&self, system: &str, user: &str) -> Result<Classification, OracleError> {
        self.structured::<Classification>("classification", &CLASSIFICATION_SCHEMA, system, user)
            .await
    }

    async fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let messages = vec![json!({"role": "user", "content": prompt})];
        self.chat(messages, None).await
    }
}
