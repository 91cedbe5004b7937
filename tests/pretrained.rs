//! Checks against real fine-tuned weights. Set `TOXIC_MODEL_PATH` to a
//! DistilBERT toxicity checkpoint directory to run them.

use toxic_classifier::{ClassifierOptions, ToxicityClassifier, DEFAULT_TOXIC_THRESHOLD};

fn pretrained() -> Option<ToxicityClassifier> {
    let dir = std::env::var("TOXIC_MODEL_PATH").ok()?;
    Some(ToxicityClassifier::load(dir, ClassifierOptions::default()).unwrap())
}

#[test]
fn insult_scores_as_toxic() {
    let Some(classifier) = pretrained() else {
        eprintln!("TOXIC_MODEL_PATH not set, skipping");
        return;
    };

    let prediction = classifier.predict("I hate you").unwrap();
    assert!(prediction.toxic > prediction.non_toxic, "{:?}", prediction);
    assert!(prediction.is_toxic(DEFAULT_TOXIC_THRESHOLD));
}

#[test]
fn greeting_scores_as_non_toxic() {
    let Some(classifier) = pretrained() else {
        eprintln!("TOXIC_MODEL_PATH not set, skipping");
        return;
    };

    let prediction = classifier.predict("Have a nice day").unwrap();
    assert!(prediction.non_toxic > prediction.toxic, "{:?}", prediction);
    assert!(!prediction.is_toxic(DEFAULT_TOXIC_THRESHOLD));
}
