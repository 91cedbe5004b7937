pub mod classifier;
pub mod cli;
pub mod device;
pub mod model;
pub mod output;

pub use classifier::{
    ClassifierOptions, Device, Error, Prediction, Result, ToxicityClassifier, DEFAULT_MAX_LENGTH,
    DEFAULT_TOXIC_THRESHOLD,
};
