use crate::config::Config;
use crate::errors::{Error, Result};
use crate::types::SpecialIds;
use crate::vocab::Vocabulary;
use std::collections::HashSet;

pub fn validate_config(cfg: &Config) -> Result<()> {
    let special = &cfg.special_tokens;

    if special.continuation_prefix.is_empty() {
        return Err(Error::InvalidConfig(
            "special_tokens.continuation_prefix must not be empty",
        ));
    }

    let mut seen = HashSet::new();
    let names = special
        .required()
        .into_iter()
        .chain(special.pad.as_deref());
    for token in names {
        if token.trim().is_empty() {
            return Err(Error::Validation(
                "special token names must not be empty".into(),
            ));
        }
        if !seen.insert(token) {
            return Err(Error::Validation(format!(
                "special token '{token}' appears multiple times"
            )));
        }
    }

    Ok(())
}

pub fn validate_vocab(vocab: &Vocabulary, cfg: &Config) -> Result<SpecialIds> {
    if vocab.is_empty() {
        return Err(Error::Validation("vocabulary is empty".into()));
    }
    vocab.special_ids(&cfg.special_tokens)
}
