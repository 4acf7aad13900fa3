/// Text-to-workflow generation (Google Gemini)
///
/// Converts raw text (emails, policies, documents) into a structured
/// workflow via the Gemini REST API. The generator is treated as slow and
/// unreliable: every failure surfaces as a structured `Generation` error,
/// never a crash in the caller.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const CONVERT_PROMPT: &str = "\
You are an enterprise workflow and SOP assistant. Convert the raw text \
(emails, policies, documents) into one clear, structured workflow.

Rules:
1. Extract the key steps and order them logically
2. Assign roles or departments where the text mentions them
3. Each step needs a short title and a detailed description; role may be null
4. Respond with valid JSON only - no markdown, no commentary

JSON shape:
{\"title\": \"Workflow name\", \"description\": \"Brief description\", \
\"steps\": [{\"title\": \"Step title\", \"description\": \"What to do\", \"role\": null}]}";

/// Structured output of the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedWorkflow {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<GeneratedStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedStep {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topP", skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Clone)]
pub struct SopGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl SopGenerator {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Convert raw text into a structured workflow
    pub async fn generate(&self, raw_text: &str) -> Result<GeneratedWorkflow, AppError> {
        let prompt = format!("{CONVERT_PROMPT}\n\nConvert this to a workflow:\n\n{raw_text}");
        let text = self
            .generate_text(
                prompt,
                GenerationConfig {
                    temperature: 0.2,
                    max_output_tokens: 2000,
                    top_p: Some(0.9),
                },
            )
            .await?;

        parse_generated(&text)
    }

    /// Rewrite a step description in the requested tone
    pub async fn rewrite(&self, step_text: &str, tone: &str) -> Result<String, AppError> {
        let instruction = match tone {
            "technical" => "Rewrite with technical detail and precision",
            "simple" => "Rewrite in simple, non-technical language",
            _ => "Rewrite to be professional, clear, and actionable",
        };

        let prompt = format!("{instruction}. Keep it concise (1-2 sentences).\n\n{step_text}");
        let text = self
            .generate_text(
                prompt,
                GenerationConfig {
                    temperature: 0.3,
                    max_output_tokens: 500,
                    top_p: None,
                },
            )
            .await?;

        Ok(text.trim().to_string())
    }

    async fn generate_text(
        &self,
        prompt: String,
        config: GenerationConfig,
    ) -> Result<String, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Generation("no Gemini API key configured".to_string()));
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: config,
        };

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("generator unreachable: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AppError::Generation(format!("generator unreachable: {e}")))?;

        if !status.is_success() {
            tracing::error!("generator returned {}: {}", status, body);
            return Err(AppError::Generation(format!("generator returned {status}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::Generation(format!("unexpected generator response: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| AppError::Generation("generator returned no candidates".to_string()))
    }
}

/// Parse generator output, tolerating markdown code fences around the JSON
fn parse_generated(text: &str) -> Result<GeneratedWorkflow, AppError> {
    let cleaned = strip_fences(text);
    serde_json::from_str(cleaned)
        .map_err(|e| AppError::Generation(format!("generator returned invalid JSON: {e}")))
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
