use candle_transformers::models::distilbert::Config as DistilBertConfig;
use serde::Deserialize;
use std::collections::HashMap;

/// `config.json` of a DistilBERT sequence-classification checkpoint.
///
/// The encoder fields are owned by candle and kept private there, so the
/// same document is read a second time for the fields the classification
/// head and the tokenizer need.
pub struct Config {
    pub distilbert_config: DistilBertConfig,
    pub classifier_config: ClassifierConfig,
}

impl Config {
    pub fn from_value(value: &serde_json::Value) -> serde_json::Result<Self> {
        Ok(Self {
            distilbert_config: DistilBertConfig::deserialize(value)?,
            classifier_config: ClassifierConfig::deserialize(value)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassifierConfig {
    pub dim: usize,
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub pad_token_id: u32,
    #[serde(default)]
    pub id2label: HashMap<String, String>,
}

/// Logit index of each output class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelOrder {
    pub non_toxic: usize,
    pub toxic: usize,
}

impl Default for LabelOrder {
    fn default() -> Self {
        Self {
            non_toxic: 0,
            toxic: 1,
        }
    }
}

impl LabelOrder {
    /// Resolves the class order from `id2label`.
    ///
    /// Returns `None` when the checkpoint is not a two-class classifier.
    /// Checkpoints with generic names (`LABEL_0`, `LABEL_1`) or no labels at
    /// all fall back to the default order.
    pub fn from_id2label(id2label: &HashMap<String, String>) -> Option<Self> {
        if id2label.is_empty() {
            return Some(Self::default());
        }
        if id2label.len() != 2 {
            return None;
        }

        let mut indices = Vec::with_capacity(2);
        for (id, label) in id2label {
            let index: usize = id.parse().ok()?;
            indices.push((index, normalize(label)));
        }
        indices.sort_by_key(|(index, _)| *index);
        if indices[0].0 != 0 || indices[1].0 != 1 {
            return None;
        }

        match indices.iter().find(|(_, label)| label == "toxic") {
            Some(&(toxic, _)) => Some(Self {
                non_toxic: 1 - toxic,
                toxic,
            }),
            None => Some(Self::default()),
        }
    }
}

fn normalize(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}
