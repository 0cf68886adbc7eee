use super::{RefineError, RefineRequest, Refiner};
use crate::language::Language;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Name of the env var the key is expected in; only used in messages.
    pub api_key_env: String,
    pub timeout: Option<Duration>,
}

impl Default for GeminiOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    options: GeminiOptions,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(options: GeminiOptions) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            options,
            agent: builder.build(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.options.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.options.model)
        )
    }

    fn api_key(&self) -> Result<&str, RefineError> {
        self.options
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RefineError::MissingCredentials {
                env_var: self.options.api_key_env.clone(),
            })
    }
}

impl Refiner for GeminiClient {
    fn refine(&self, input: &str, language: Language) -> Result<String, RefineError> {
        let api_key = self.api_key()?;
        let request = RefineRequest::new(input, language);
        let url = self.endpoint();

        let response = self
            .agent
            .post(&url)
            .set("x-goog-api-key", api_key)
            .set(
                "user-agent",
                concat!("perfecter/", env!("CARGO_PKG_VERSION")),
            )
            .send_json(request_body(&request));

        match response {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|e| RefineError::Network(format!("failed to read response: {e}")))?;
                extract_text(&body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(classify_status(status, &body))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(RefineError::Network(transport.to_string()))
            }
        }
    }
}

pub(crate) fn request_body(request: &RefineRequest) -> Value {
    json!({
        "systemInstruction": {
            "parts": [{ "text": request.system_instruction }]
        },
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.user_text }]
        }]
    })
}

/// Joins the text parts of the first candidate and trims the result.
pub(crate) fn extract_text(body: &str) -> Result<String, RefineError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| RefineError::MalformedResponse(e.to_string()))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("prompt blocked: {reason}"))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(RefineError::EmptyResponse(reason));
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .map(|reason| format!("finish reason {reason}"))
            .unwrap_or_else(|| "no text".to_string());
        return Err(RefineError::EmptyResponse(reason));
    }
    Ok(text.to_string())
}

pub(crate) fn classify_status(status: u16, body: &str) -> RefineError {
    let (message, provider_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), None),
    };
    let message = if message.is_empty() {
        format!("status {status}")
    } else {
        message
    };

    let key_rejected = matches!(
        provider_status.as_deref(),
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED")
    ) || message.contains("API key");

    match status {
        401 | 403 => RefineError::Unauthorized { status, message },
        400 if key_rejected => RefineError::Unauthorized { status, message },
        429 => RefineError::RateLimited { message },
        _ => RefineError::Provider { status, message },
    }
}
