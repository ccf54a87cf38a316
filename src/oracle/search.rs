// SPDX-License-Identifier: MIT

//! Brave web-search implementation of [`SearchOracle`]
//!
//! One query per call; the result descriptions become the record's fact
//! snippets. Failures are folded into the returned [`SearchRecord`] so a
//! dead query never aborts an evidence batch.

use super::{SearchOracle, SearchRecord};
use crate::error::OracleError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::env;

#[derive(Debug, Deserialize)]
struct BraveResult {
    title: String,
    description: String,
}

/// Brave Search API client
pub struct BraveSearch {
    client: Client,
    api_key: String,
    max_results: usize,
}

impl BraveSearch {
    /// Requires `BRAVE_API_KEY` to be set.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key =
            env::var("BRAVE_API_KEY").map_err(|_| OracleError::ApiKeyMissing("BRAVE_API_KEY".to_string()))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            max_results: 3,
        })
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    async fn query_api(&self, query: &str) -> Result<Vec<String>, OracleError> {
        let mut url = reqwest::Url::parse("https://api.search.brave.com/res/v1/web/search")
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("count", &self.max_results.to_string())
            .append_pair("freshness", "py");

        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(OracleError::api("brave", text));
        }

        let body: Value = resp.json().await?;

        let results_json = body
            .get("web")
            .and_then(|w| w.get("results"))
            .cloned()
            .ok_or_else(|| {
                OracleError::InvalidResponse("missing web.results in search response".to_string())
            })?;

        let results: Vec<BraveResult> = serde_json::from_value(results_json)?;

        Ok(results
            .into_iter()
            .map(|r| format!("{}: {}", r.title, r.description))
            .collect())
    }
}

#[async_trait]
impl SearchOracle for BraveSearch {
    async fn search(&self, query: &str) -> SearchRecord {
        match self.query_api(query).await {
            Ok(facts) => SearchRecord::ok(query, facts),
            Err(e) => {
                log::warn!("Search for '{}' failed: {}", query, e);
                SearchRecord::failed(query, e.to_string())
            }
        }
    }
}
