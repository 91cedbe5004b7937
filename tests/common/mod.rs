#![allow(dead_code)]

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use toxic_classifier::model::{Config, DistilBertForSequenceClassification};

const VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "i", "hate", "you", "have", "a", "nice", "day",
    "hello", "world", "stupid", "idiot", "thanks",
];

/// A randomly initialised DistilBERT classifier written to a temporary
/// directory in the Hugging Face artifact layout.
pub struct ModelFixture {
    pub dir: PathBuf,
    config: Value,
}

impl ModelFixture {
    pub fn new() -> Self {
        Self::with_max_positions(512)
    }

    pub fn with_max_positions(max_position_embeddings: usize) -> Self {
        let dir = std::env::temp_dir().join(format!("toxic-classifier-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let config = json!({
            "activation": "gelu",
            "architectures": ["DistilBertForSequenceClassification"],
            "dim": 16,
            "hidden_dim": 32,
            "id2label": {"0": "non_toxic", "1": "toxic"},
            "label2id": {"non_toxic": 0, "toxic": 1},
            "initializer_range": 0.02,
            "max_position_embeddings": max_position_embeddings,
            "model_type": "distilbert",
            "n_heads": 2,
            "n_layers": 2,
            "pad_token_id": 0,
            "position_embedding_type": "absolute",
            "use_cache": true,
            "vocab_size": VOCAB.len()
        });
        fs::write(dir.join("config.json"), config.to_string()).unwrap();
        fs::write(dir.join("tokenizer.json"), tokenizer_json().to_string()).unwrap();

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model_config = Config::from_value(&config).unwrap();
        DistilBertForSequenceClassification::load(vb, &model_config).unwrap();
        varmap.save(dir.join("model.safetensors")).unwrap();

        Self { dir, config }
    }

    /// Rewrites `id2label` in `config.json`, keeping the weights.
    pub fn set_labels(&mut self, id2label: Value) {
        self.config["id2label"] = id2label;
        fs::write(self.dir.join("config.json"), self.config.to_string()).unwrap();
    }

    pub fn remove(&self, file: &str) {
        fs::remove_file(self.dir.join(file)).unwrap();
    }
}

impl Drop for ModelFixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn tokenizer_json() -> Value {
    let vocab: serde_json::Map<String, Value> = VOCAB
        .iter()
        .enumerate()
        .map(|(id, token)| (token.to_string(), json!(id)))
        .collect();
    json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": {"type": "Lowercase"},
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": {
            "type": "BertProcessing",
            "sep": ["[SEP]", 3],
            "cls": ["[CLS]", 2]
        },
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": "[UNK]"
        }
    })
}
