pub mod config;
pub mod distilbert;

pub use config::{ClassifierConfig, Config, LabelOrder};
pub use distilbert::{DistilBertForSequenceClassification, NUM_LABELS};
