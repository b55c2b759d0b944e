//! Configuration types for article annotation.
//!
//! Everything the pipeline needs lives in one [`AnnotationConfig`] that the
//! caller builds and owns. Nothing is read from globals once the config
//! exists.

use crate::error::AnnotateError;
use crate::progress::ProgressCallback;
use crate::prompts::TEXT_PLACEHOLDER;
use std::fmt;

/// Default completion endpoint (OpenRouter chat completions).
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default backing model.
pub const DEFAULT_MODEL: &str = "google/gemma-2-9b-it:free";

/// Default `HTTP-Referer` header value.
pub const DEFAULT_REFERER: &str = "https://your-site-url.com";

/// Default `X-Title` header value.
pub const DEFAULT_TITLE: &str = "Scientific_Annotation_App";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Configuration for one annotation run.
///
/// Built via [`AnnotationConfig::builder()`] or using
/// [`AnnotationConfig::default()`].
///
/// # Example
/// ```rust
/// use paper2abstract::AnnotationConfig;
///
/// let config = AnnotationConfig::builder()
///     .api_key("sk-or-...")
///     .temperature(0.2)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "google/gemma-2-9b-it:free");
/// ```
#[derive(Clone)]
pub struct AnnotationConfig {
    /// Bearer token for the completion endpoint. Never logged.
    pub api_key: Option<String>,

    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,

    /// Model identifier sent in the request body.
    pub model: String,

    /// `HTTP-Referer` header; OpenRouter uses it to attribute traffic.
    pub referer: String,

    /// `X-Title` header; shown as the app name on the OpenRouter dashboard.
    pub title: String,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Kept as `f64` so the request body carries exactly `0.3`, not the
    /// widened `0.30000001192092896` an `f32` would serialise to.
    pub temperature: f64,

    /// Nucleus-sampling top-p. Default: 0.9.
    pub top_p: f64,

    /// Custom prompt template. Must contain `{text}`. If None, uses
    /// [`crate::prompts::PROMPT_TEMPLATE`].
    pub prompt_template: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Timeout for the completion call in seconds. Default: None (wait
    /// indefinitely).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives stage events while the pipeline runs.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            temperature: 0.3,
            top_p: 0.9,
            prompt_template: None,
            password: None,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnnotationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("prompt_template", &self.prompt_template.as_ref().map(|t| t.len()))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnnotationProgressCallback>"),
            )
            .finish()
    }
}

impl AnnotationConfig {
    /// Create a new builder for `AnnotationConfig`.
    pub fn builder() -> AnnotationConfigBuilder {
        AnnotationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The API key, or [`AnnotateError::MissingApiKey`] when unset or blank.
    pub fn require_api_key(&self) -> Result<&str, AnnotateError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(AnnotateError::MissingApiKey),
        }
    }
}

/// Builder for [`AnnotationConfig`].
#[derive(Debug)]
pub struct AnnotationConfigBuilder {
    config: AnnotationConfig,
}

impl AnnotationConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Read the API key from `OPENROUTER_API_KEY`, if set.
    pub fn api_key_from_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.config.api_key = Some(key);
            }
        }
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.config.referer = referer.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn temperature(mut self, t: f64) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_p(mut self, p: f64) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnnotationConfig, AnnotateError> {
        let c = &self.config;
        if reqwest::Url::parse(&c.endpoint).is_err() {
            return Err(AnnotateError::InvalidConfig(format!(
                "endpoint is not a valid URL: '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(AnnotateError::InvalidConfig("model must not be empty".into()));
        }
        if !c.temperature.is_finite() {
            return Err(AnnotateError::InvalidConfig(format!(
                "temperature must be a number in [0, 2], got {}",
                c.temperature
            )));
        }
        if !c.top_p.is_finite() || c.top_p <= 0.0 {
            return Err(AnnotateError::InvalidConfig(format!(
                "top_p must be in (0, 1], got {}",
                c.top_p
            )));
        }
        if let Some(ref template) = c.prompt_template {
            if !template.contains(TEXT_PLACEHOLDER) {
                return Err(AnnotateError::InvalidConfig(format!(
                    "prompt template must contain the {TEXT_PLACEHOLDER} placeholder"
                )));
            }
        }
        if c.api_timeout_secs == Some(0) {
            return Err(AnnotateError::InvalidConfig(
                "api timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_openrouter_contract() {
        let c = AnnotationConfig::default();
        assert_eq!(c.endpoint, "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(c.temperature, 0.3);
        assert_eq!(c.top_p, 0.9);
        assert!(c.api_timeout_secs.is_none());
        assert!(c.api_key.is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = AnnotationConfig::builder()
            .api_key("sk-or-secret")
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-or-secret"));
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn require_api_key_rejects_blank() {
        let c = AnnotationConfig::builder().api_key("   ").build().unwrap();
        assert!(matches!(c.require_api_key(), Err(AnnotateError::MissingApiKey)));

        let c = AnnotationConfig::default();
        assert!(matches!(c.require_api_key(), Err(AnnotateError::MissingApiKey)));

        let c = AnnotationConfig::builder().api_key("k").build().unwrap();
        assert_eq!(c.require_api_key().unwrap(), "k");
    }

    #[test]
    fn build_rejects_bad_endpoint() {
        let err = AnnotationConfig::builder()
            .endpoint("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a valid URL"));
    }

    #[test]
    fn build_rejects_template_without_placeholder() {
        let err = AnnotationConfig::builder()
            .prompt_template("Summarise this article.")
            .build()
            .unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidConfig(_)));
    }

    #[test]
    fn setters_clamp_sampling_parameters() {
        let c = AnnotationConfig::builder()
            .temperature(5.0)
            .top_p(3.0)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.top_p, 1.0);
    }

    #[test]
    fn build_rejects_zero_top_p_and_timeout() {
        assert!(AnnotationConfig::builder().top_p(0.0).build().is_err());
        assert!(AnnotationConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn build_rejects_nan_sampling_parameters() {
        let err = AnnotationConfig::builder()
            .temperature(f64::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidConfig(_)));
        assert!(AnnotationConfig::builder().top_p(f64::NAN).build().is_err());
    }
}
