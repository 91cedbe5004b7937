pub use candle_core::Device;
use crate::model::{Config, DistilBertForSequenceClassification, LabelOrder};
use candle_core::{DType, Tensor, D};
use candle_nn::ops::softmax;
use candle_nn::VarBuilder;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_LENGTH: usize = 128;
pub const DEFAULT_TOXIC_THRESHOLD: f32 = 0.5;

#[derive(Debug)]
pub enum Error {
    InputError,
    ArtifactLoadError(String),
    EncodingError(String),
    TokenizerError(tokenizers::Error),
    CandleError(candle_core::Error),
    SerializationError(serde_json::Error),
    IOError(std::io::Error),
}

impl From<tokenizers::Error> for Error {
    fn from(err: tokenizers::Error) -> Self {
        Self::TokenizerError(err)
    }
}

impl From<candle_core::Error> for Error {
    fn from(err: candle_core::Error) -> Self {
        Self::CandleError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self {
            Self::InputError => write!(f, "No input text provided"),
            Self::ArtifactLoadError(e) => write!(f, "artifact load error: {}", e),
            Self::EncodingError(e) => write!(f, "encoding error: {}", e),
            Self::TokenizerError(e) => write!(f, "tokenizer error: {}", e),
            Self::CandleError(e) => write!(f, "candle error: {}", e),
            Self::SerializationError(e) => write!(f, "serialization error: {}", e),
            Self::IOError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

fn artifact_error(path: &Path, err: impl Display) -> Error {
    Error::ArtifactLoadError(format!("{}: {}", path.display(), err))
}

#[derive(Debug, Clone)]
pub struct ClassifierOptions {
    /// Token positions kept after truncation, special tokens included.
    pub max_length: usize,
    pub device: Device,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            device: Device::Cpu,
        }
    }
}

/// A loaded toxicity model together with its tokenizer and device.
///
/// Weights are memory-mapped constants rather than trainable variables, so
/// no gradient graph is ever recorded. Device memory is released when the
/// value is dropped.
pub struct ToxicityClassifier {
    model: DistilBertForSequenceClassification,
    labels: LabelOrder,
    tokenizer: Tokenizer,
    max_length: usize,
    device: Device,
}

impl ToxicityClassifier {
    /// Loads `config.json`, `tokenizer.json` and `model.safetensors` from `path`.
    pub fn load<P: AsRef<Path>>(path: P, options: ClassifierOptions) -> Result<Self> {
        let mut dir = PathBuf::from(path.as_ref());
        if !dir.is_dir() {
            return Err(artifact_error(&dir, "model directory not found"));
        }
        info!(model_dir = %dir.display(), "loading toxicity model");

        dir.push("config.json");
        let config_reader = File::open(&dir).map_err(|e| artifact_error(&dir, e))?;
        let config_value: serde_json::Value =
            serde_json::from_reader(config_reader).map_err(|e| artifact_error(&dir, e))?;
        let config = Config::from_value(&config_value).map_err(|e| artifact_error(&dir, e))?;
        let labels = LabelOrder::from_id2label(&config.classifier_config.id2label)
            .ok_or_else(|| artifact_error(&dir, "expected a two-class classifier"))?;
        dir.pop();

        let max_position_embeddings = config.classifier_config.max_position_embeddings;
        let max_length = if options.max_length > max_position_embeddings {
            warn!(
                requested = options.max_length,
                max_position_embeddings, "max length exceeds model positions, clamping"
            );
            max_position_embeddings
        } else {
            options.max_length
        };

        dir.push("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&dir).map_err(|e| artifact_error(&dir, e))?;
        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: tokenizers::PaddingStrategy::BatchLongest,
                pad_id: config.classifier_config.pad_token_id,
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))?;
        dir.pop();

        dir.push("model.safetensors");
        let model_builder =
            unsafe { VarBuilder::from_mmaped_safetensors(&[&dir], DType::F32, &options.device) }
                .map_err(|e| artifact_error(&dir, e))?;
        let model = DistilBertForSequenceClassification::load(model_builder, &config)
            .map_err(|e| artifact_error(&dir, e))?;
        dir.pop();

        debug!(?labels, max_length, device = ?options.device, "toxicity model ready");
        Ok(Self {
            model,
            labels,
            tokenizer,
            max_length,
            device: options.device,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        // one text in, one row out
        Ok(self.predict_batch(vec![text.to_string()])?[0])
    }

    pub fn predict_batch(&self, texts: Vec<String>) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer.encode_batch(texts, true)?;
        let mut inputs_ids = Vec::with_capacity(encodings.len());
        let mut padding_masks = Vec::with_capacity(encodings.len());
        for encoding in encodings {
            if encoding.get_ids().is_empty() {
                return Err(Error::EncodingError(
                    "tokenizer produced no tokens".to_string(),
                ));
            }
            let padding_mask: Vec<u8> = encoding
                .get_attention_mask()
                .iter()
                .map(|&attend| u8::from(attend == 0))
                .collect();
            inputs_ids.push(Tensor::new(encoding.get_ids(), &self.device)?);
            padding_masks.push(Tensor::new(padding_mask.as_slice(), &self.device)?);
        }

        let inputs_ids = Tensor::stack(inputs_ids.as_slice(), 0)?;
        let (batch_size, seq_len) = inputs_ids.dims2()?;
        let padding_mask =
            Tensor::stack(padding_masks.as_slice(), 0)?.reshape((batch_size, 1, 1, seq_len))?;
        debug!(batch_size, seq_len, "running forward pass");

        let logits = self.model.forward(&inputs_ids, &padding_mask)?;
        let probabilities = to_probabilities(&logits)?;
        Ok(probabilities
            .iter()
            .map(|row| Prediction::from_probabilities(row, self.labels))
            .collect())
    }
}

/// Softmax over the class dimension of `(batch, classes)` logits.
pub fn to_probabilities(logits: &Tensor) -> Result<Vec<Vec<f32>>> {
    let probabilities = softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?;
    Ok(probabilities.to_vec2()?)
}

#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct Prediction {
    #[serde(serialize_with = "widen")]
    pub non_toxic: f32,
    #[serde(serialize_with = "widen")]
    pub toxic: f32,
}

impl Prediction {
    /// `row` must hold one probability per class.
    pub fn from_probabilities(row: &[f32], labels: LabelOrder) -> Self {
        Self {
            non_toxic: row[labels.non_toxic],
            toxic: row[labels.toxic],
        }
    }

    pub fn is_toxic(&self, threshold: f32) -> bool {
        self.toxic >= threshold
    }
}

fn widen<S: Serializer>(value: &f32, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(f64::from(*value))
}
