use super::config::Config;
use candle_core::{IndexOp, Module, Result, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use candle_transformers::models::distilbert::DistilBertModel;

pub const NUM_LABELS: usize = 2;

/// DistilBERT encoder with the sequence-classification head of
/// `DistilBertForSequenceClassification` checkpoints.
///
/// Dropout only exists at training time and is not part of the graph.
pub struct DistilBertForSequenceClassification {
    distilbert: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
}

impl DistilBertForSequenceClassification {
    pub fn load(vb: VarBuilder, config: &Config) -> Result<Self> {
        let dim = config.classifier_config.dim;
        let distilbert = DistilBertModel::load(vb.pp("distilbert"), &config.distilbert_config)?;
        let pre_classifier = linear(dim, dim, vb.pp("pre_classifier"))?;
        let classifier = linear(dim, NUM_LABELS, vb.pp("classifier"))?;
        Ok(Self {
            distilbert,
            pre_classifier,
            classifier,
        })
    }

    /// `input_ids` is `(batch, seq_len)`; `padding_mask` is `(batch, 1, 1, seq_len)`
    /// and holds 1 at padded positions. Returns `(batch, NUM_LABELS)` logits.
    pub fn forward(&self, input_ids: &Tensor, padding_mask: &Tensor) -> Result<Tensor> {
        let hidden_states = self.distilbert.forward(input_ids, padding_mask)?;
        let pooled = hidden_states.i((.., 0))?;
        let pooled = self.pre_classifier.forward(&pooled)?.relu()?;
        self.classifier.forward(&pooled)
    }
}
