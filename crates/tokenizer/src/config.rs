use serde::{Deserialize, Serialize};

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const UNK_TOKEN: &str = "[UNK]";
pub const PAD_TOKEN: &str = "[PAD]";
pub const CONTINUATION_PREFIX: &str = "##";

/// Settings for the basic + wordpiece tokenization pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    #[serde(default)]
    pub special_tokens: SpecialTokensCfg,
}

/// Names of the reserved vocabulary entries.
///
/// `pad` is optional: vocabularies without a padding entry pad with id 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokensCfg {
    pub cls: String,
    pub sep: String,
    pub unk: String,
    #[serde(default)]
    pub pad: Option<String>,
    #[serde(default = "default_continuation_prefix")]
    pub continuation_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lowercase: default_lowercase(),
            special_tokens: SpecialTokensCfg::default(),
        }
    }
}

impl Default for SpecialTokensCfg {
    fn default() -> Self {
        Self {
            cls: CLS_TOKEN.to_owned(),
            sep: SEP_TOKEN.to_owned(),
            unk: UNK_TOKEN.to_owned(),
            pad: Some(PAD_TOKEN.to_owned()),
            continuation_prefix: default_continuation_prefix(),
        }
    }
}

impl SpecialTokensCfg {
    /// Tokens that must be present in the vocabulary.
    pub fn required(&self) -> [&str; 3] {
        [self.cls.as_str(), self.sep.as_str(), self.unk.as_str()]
    }
}

fn default_lowercase() -> bool {
    true
}

fn default_continuation_prefix() -> String {
    CONTINUATION_PREFIX.to_owned()
}
