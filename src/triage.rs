//! Symptom triage via a hosted LLM.
//!
//! The server never reasons about diseases itself: it formats the intake
//! Q&A into a prompt, sends it to an OpenAI-compatible chat-completions
//! endpoint (Groq by default) and extracts the JSON object from the
//! reply. Any upstream failure or unparsable reply degrades to a fixed
//! fallback prediction instead of an error, so the intake flow never
//! hard-fails on the model.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
const REQUEST_TIMEOUT_SECS: u64 = 60;

const SYSTEM_PROMPT: &str = "You are an intelligent medical assistant. \
You will be given questions and their answers about a patient's symptoms. \
Based on these Q&As, return a predicted disease, symptoms, precautions, \
confidence score and severity.";

const FORMAT_INSTRUCTION: &str = r#"Format your response as JSON with the following structure:
{
    "disease": "disease name",
    "confidence": numeric score (0-100, vary based on symptom specificity, do NOT default to 80),
    "severity": "Mild" or "Moderate" or "High",
    "description": "brief description",
    "symptoms": "list of key symptoms",
    "precautions": "list of precautions",
    "recommendations": ["recommendation 1", "recommendation 2", ...],
    "nextSteps": "immediate next steps to take"
}

Do not include any preamble or explanation. Return ONLY the JSON object."#;

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("LLM request failed: {0}")]
    Http(String),

    #[error("LLM returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Cannot parse LLM response: {0}")]
    ResponseParsing(String),
}

/// Seam for the completion backend, so triage logic is testable without
/// network access.
pub trait LlmClient: Send + Sync {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, TriageError>;
}

/// Chat-completions client for the Groq API.
pub struct GroqClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl GroqClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self, TriageError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TriageError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Build from GROQ_API_KEY (required), GROQ_BASE_URL and GROQ_MODEL.
    pub fn from_env() -> Result<Self, TriageError> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| TriageError::MissingApiKey)?;
        let base_url =
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(&base_url, &api_key, &model)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient for GroqClient {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, TriageError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| TriageError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TriageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| TriageError::ResponseParsing(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| TriageError::ResponseParsing("empty choices".into()))
    }
}

/// Predict a disease from intake question/answer pairs.
///
/// The result is passed through to clients as-is, so the shape stays
/// whatever the model returned. Unparsable or failed replies degrade to
/// fixed fallback objects, never an error.
pub fn predict_disease_from_qa(client: &dyn LlmClient, qna: &[(String, String)]) -> Value {
    let mut qna_text = String::new();
    for (question, answer) in qna {
        qna_text.push_str(&format!("Q: {question}\nA: {answer}\n\n"));
    }
    let prompt = format!(
        "### USER INPUT:\n{qna_text}\n### INSTRUCTION:\n{FORMAT_INSTRUCTION}\n\n### OUTPUT (JSON ONLY):"
    );

    let content = match client.complete(SYSTEM_PROMPT, &prompt) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, "Triage LLM call failed");
            return error_fallback(&e.to_string());
        }
    };

    match extract_json_object(&content) {
        Some(value) => value,
        None => {
            tracing::warn!("Triage LLM reply was not JSON, using structured fallback");
            non_json_fallback(&content)
        }
    }
}

/// Pull the JSON object out of a model reply that may carry stray text
/// around it: everything between the first `{` and the last `}`.
fn extract_json_object(content: &str) -> Option<Value> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&content[start..=end]).ok()
}

fn non_json_fallback(content: &str) -> Value {
    let description: String = content.trim().chars().take(200).collect();
    json!({
        "disease": "Need further evaluation",
        "confidence": 50,
        "severity": "Moderate",
        "description": description,
        "symptoms": "Based on symptoms provided",
        "precautions": "Consult with healthcare provider",
        "recommendations": [
            "Seek medical attention if symptoms worsen",
            "Monitor symptoms closely"
        ],
        "nextSteps": "Schedule appointment with healthcare provider"
    })
}

pub(crate) fn error_fallback(error: &str) -> Value {
    json!({
        "error": error,
        "disease": "Unable to predict",
        "confidence": 0,
        "severity": "Unknown",
        "description": "An error occurred during prediction",
        "symptoms": "",
        "precautions": "",
        "recommendations": [],
        "nextSteps": "Please try again or consult directly with a healthcare provider"
    })
}
