//! Chat provider model catalogue (OpenAI-compatible `GET /models`).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::config::LlmSettings;

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Fetch the ids of all models the provider exposes.
pub fn list_models(settings: &LlmSettings) -> Result<Vec<String>> {
    settings.validate()?;
    let url = models_url(&settings.base_url);
    let response = ureq::get(&url)
        .set("Authorization", &format!("Bearer {}", settings.api_key))
        .call()
        .map_err(|e| match e {
            ureq::Error::Status(code, _) => anyhow!("{} returned HTTP {}", url, code),
            other => anyhow!("request to {} failed: {}", url, other),
        })?;
    let body = response
        .into_string()
        .with_context(|| format!("failed to read response from {}", url))?;
    parse_model_ids(&body)
}

pub fn models_url(base_url: &str) -> String {
    format!("{}/models", base_url.trim_end_matches('/'))
}

fn parse_model_ids(body: &str) -> Result<Vec<String>> {
    let list: ModelList = serde_json::from_str(body).context("invalid model list response")?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_ids_in_order() -> Result<()> {
        let body = r#"{
            "object": "list",
            "data": [
                {"id": "llama3-8b-8192", "object": "model", "owned_by": "Meta"},
                {"id": "mixtral-8x7b-32768", "object": "model"}
            ]
        }"#;
        assert_eq!(
            parse_model_ids(body)?,
            vec!["llama3-8b-8192", "mixtral-8x7b-32768"]
        );
        assert!(parse_model_ids(r#"{"object": "list"}"#)?.is_empty());
        assert!(parse_model_ids("not json").is_err());
        Ok(())
    }

    #[test]
    fn models_url_tolerates_trailing_slash() {
        assert_eq!(
            models_url("https://api.groq.com/openai/v1/"),
            "https://api.groq.com/openai/v1/models"
        );
    }

    #[test]
    fn listing_requires_api_key() {
        let settings = LlmSettings::default();
        assert!(list_models(&settings).is_err());
    }
}
