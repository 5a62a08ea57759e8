//! `KEY=VALUE` overrides applied on top of a loaded configuration.

use std::str::FromStr;

use model::{EmbeddingsConfig, ModelError, Result};
use serde_json::{Number, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOverride {
    /// Dot-separated field path, e.g. `special_tokens.unk`.
    pub path: String,
    pub value: String,
}

impl FromStr for ConfigOverride {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| "override must be in the form key=value".to_string())?;
        if path.trim().is_empty() {
            return Err("override key must not be empty".into());
        }
        Ok(Self {
            path: path.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

/// Applies `overrides` in order and re-validates the result.
pub fn apply_overrides(
    config: EmbeddingsConfig,
    overrides: &[ConfigOverride],
) -> Result<EmbeddingsConfig> {
    let mut value = serde_json::to_value(config)?;
    for override_arg in overrides {
        set_value_at_path(&mut value, &override_arg.path, parse_value(&override_arg.value))?;
    }
    let config: EmbeddingsConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(int_val));
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(trimmed.to_string())
}

/// Only existing keys can be overridden, so typos fail instead of being
/// silently ignored.
fn set_value_at_path(target: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(invalid(format!("malformed override path '{path}'")));
    }

    let mut current = target;
    for (idx, segment) in segments.iter().enumerate() {
        let map = current.as_object_mut().ok_or_else(|| {
            invalid(format!(
                "override path '{path}' descends into non-object value at '{segment}'"
            ))
        })?;
        let entry = map
            .get_mut(*segment)
            .ok_or_else(|| invalid(format!("unknown configuration key '{path}'")))?;
        if idx + 1 == segments.len() {
            *entry = new_value;
            return Ok(());
        }
        current = entry;
    }
    Ok(())
}

fn invalid(message: String) -> ModelError {
    ModelError::InvalidConfig(vec![message])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ConfigOverride {
        raw.parse().unwrap()
    }

    #[test]
    fn parses_key_value_pairs() {
        assert_eq!(
            parse(" batch_size = 8 "),
            ConfigOverride {
                path: "batch_size".into(),
                value: "8".into()
            }
        );
        assert!("batch_size".parse::<ConfigOverride>().is_err());
        assert!("=3".parse::<ConfigOverride>().is_err());
    }

    #[test]
    fn overrides_top_level_and_nested_fields() {
        let config = apply_overrides(
            EmbeddingsConfig::default(),
            &[
                parse("batch_size=8"),
                parse("lowercase=false"),
                parse("special_tokens.unk=<unk>"),
                parse("special_tokens.pad=null"),
            ],
        )
        .unwrap();
        assert_eq!(config.batch_size, 8);
        assert!(!config.lowercase);
        assert_eq!(config.special_tokens.unk, "<unk>");
        assert_eq!(config.special_tokens.pad, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = apply_overrides(EmbeddingsConfig::default(), &[parse("batchsize=8")]).unwrap_err();
        assert!(err.to_string().contains("batchsize"));

        assert!(apply_overrides(EmbeddingsConfig::default(), &[parse("dim.width=3")]).is_err());
    }

    #[test]
    fn overridden_config_is_validated() {
        assert!(matches!(
            apply_overrides(EmbeddingsConfig::default(), &[parse("max_sentence_length=2")]),
            Err(ModelError::InvalidConfig(_))
        ));
    }
}
