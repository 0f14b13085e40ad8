//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bleu: BleuSettings,
    pub vocab: VocabSettings,
    pub decoder: DecoderSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BleuSettings {
    pub smoothing: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabSettings {
    pub sentence_start: String,
    pub sentence_end: String,
}

/// Bleu weights used for the three searches of a hope/fear decode.
#[derive(Debug, Clone, Deserialize)]
pub struct DecoderSettings {
    pub hope_bleu_weight: f64,
    pub fear_bleu_weight: f64,
    pub model_bleu_weight: f64,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_finite {
        ($section:ident . $field:ident) => {
            if !s.$section.$field.is_finite() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        };
    }
    macro_rules! check_token {
        ($section:ident . $field:ident) => {
            let token = &s.$section.$field;
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must be a single non-empty token".to_string(),
                });
            }
        };
    }

    check_finite!(bleu.smoothing);
    if s.bleu.smoothing <= 0.0 {
        return Err(SettingsError::InvalidValue {
            field: "bleu.smoothing".to_string(),
            reason: "must be positive".to_string(),
        });
    }

    check_token!(vocab.sentence_start);
    check_token!(vocab.sentence_end);
    if s.vocab.sentence_start == s.vocab.sentence_end {
        return Err(SettingsError::InvalidValue {
            field: "vocab.sentence_end".to_string(),
            reason: "must differ from vocab.sentence_start".to_string(),
        });
    }

    check_finite!(decoder.hope_bleu_weight);
    check_finite!(decoder.fear_bleu_weight);
    check_finite!(decoder.model_bleu_weight);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let s = parse_settings_toml(DEFAULT_SETTINGS_TOML).unwrap();
        assert!((s.bleu.smoothing - 0.01).abs() < f64::EPSILON);
        assert_eq!(s.vocab.sentence_start, "<s>");
        assert_eq!(s.vocab.sentence_end, "</s>");
        assert!((s.decoder.hope_bleu_weight - 1.0).abs() < f64::EPSILON);
        assert!((s.decoder.fear_bleu_weight + 1.0).abs() < f64::EPSILON);
        assert_eq!(s.decoder.model_bleu_weight, 0.0);
    }

    #[test]
    fn parse_valid_custom_toml() {
        let toml = r#"
[bleu]
smoothing = 0.5

[vocab]
sentence_start = "BOS"
sentence_end = "EOS"

[decoder]
hope_bleu_weight = 2.0
fear_bleu_weight = -2.0
model_bleu_weight = 0.0
"#;
        let s = parse_settings_toml(toml).unwrap();
        assert!((s.bleu.smoothing - 0.5).abs() < f64::EPSILON);
        assert_eq!(s.vocab.sentence_start, "BOS");
        assert!((s.decoder.fear_bleu_weight + 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn error_zero_smoothing() {
        let toml = r#"
[bleu]
smoothing = 0.0

[vocab]
sentence_start = "<s>"
sentence_end = "</s>"

[decoder]
hope_bleu_weight = 1.0
fear_bleu_weight = -1.0
model_bleu_weight = 0.0
"#;
        let err = parse_settings_toml(toml).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { .. }));
        assert!(err.to_string().contains("bleu.smoothing"));
    }

    #[test]
    fn error_identical_sentinels() {
        let toml = r#"
[bleu]
smoothing = 0.01

[vocab]
sentence_start = "<s>"
sentence_end = "<s>"

[decoder]
hope_bleu_weight = 1.0
fear_bleu_weight = -1.0
model_bleu_weight = 0.0
"#;
        let err = parse_settings_toml(toml).unwrap_err();
        assert!(err.to_string().contains("vocab.sentence_end"));
    }

    #[test]
    fn error_sentinel_with_space() {
        let toml = r#"
[bleu]
smoothing = 0.01

[vocab]
sentence_start = "< s>"
sentence_end = "</s>"

[decoder]
hope_bleu_weight = 1.0
fear_bleu_weight = -1.0
model_bleu_weight = 0.0
"#;
        let err = parse_settings_toml(toml).unwrap_err();
        assert!(err.to_string().contains("vocab.sentence_start"));
    }

    #[test]
    fn error_invalid_toml() {
        let err = parse_settings_toml("not valid toml {{{").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn error_missing_section() {
        let toml = r#"
[bleu]
smoothing = 0.01
"#;
        let err = parse_settings_toml(toml).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
