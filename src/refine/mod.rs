use crate::language::Language;

pub mod gemini;
pub mod request;

pub use gemini::{GeminiClient, GeminiOptions};
pub use request::{system_instruction, RefineRequest};

/// Leading marker of every failure rendered as text.
pub const ERROR_PREFIX: &str = "Error:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefineError {
    #[error("No API key is configured. Set {env_var} and try again.")]
    MissingCredentials { env_var: String },
    #[error("The API key was rejected by the provider (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("The provider rate limit was reached. Wait a moment and try again: {message}")]
    RateLimited { message: String },
    #[error("The provider reported an error (HTTP {status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Could not reach the provider: {0}")]
    Network(String),
    #[error("The provider returned an empty response ({0}).")]
    EmptyResponse(String),
    #[error("The provider returned an unexpected response: {0}")]
    MalformedResponse(String),
}

impl RefineError {
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingCredentials { .. } => "credentials",
            Self::Unauthorized { .. } => "auth",
            Self::RateLimited { .. } => "rate_limit",
            Self::Provider { .. } => "provider",
            Self::Network(_) => "network",
            Self::EmptyResponse(_) => "empty_response",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// User-facing message carrying [`ERROR_PREFIX`].
    pub fn banner(&self) -> String {
        format!("{ERROR_PREFIX} {self}")
    }
}

/// Turns a rough idea into a refined prompt for `language`.
pub trait Refiner {
    fn refine(&self, input: &str, language: Language) -> Result<String, RefineError>;
}

impl<R: Refiner + ?Sized> Refiner for &R {
    fn refine(&self, input: &str, language: Language) -> Result<String, RefineError> {
        (**self).refine(input, language)
    }
}

impl<R: Refiner + ?Sized> Refiner for Box<R> {
    fn refine(&self, input: &str, language: Language) -> Result<String, RefineError> {
        (**self).refine(input, language)
    }
}

/// Text form of a refinement: the trimmed result on success, otherwise a
/// banner starting with [`ERROR_PREFIX`].
pub fn refine_to_text<R: Refiner + ?Sized>(refiner: &R, input: &str, language: Language) -> String {
    match refiner.refine(input, language) {
        Ok(text) => text.trim().to_string(),
        Err(err) => err.banner(),
    }
}

pub fn is_error_text(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX)
}
