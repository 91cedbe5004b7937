use crate::classifier::{
    ClassifierOptions, Error, Result, ToxicityClassifier, DEFAULT_MAX_LENGTH,
};
use crate::device::select_device;
use crate::output;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{error, info, warn};

pub const DEFAULT_MODEL_DIR: &str = "models/toxic-bert-model";

/// Scores a text for toxicity and prints `{"non_toxic": p, "toxic": p}`.
#[derive(Debug, Parser)]
#[command(name = "toxic-classifier", version)]
pub struct Cli {
    /// Text to classify; arguments after the first are ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
    pub text: Vec<String>,

    /// Directory holding config.json, tokenizer.json and model.safetensors
    #[arg(long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Maximum number of token positions fed to the model
    #[arg(
        long,
        env = "TOXIC_MAX_LENGTH",
        default_value_t = DEFAULT_MAX_LENGTH,
        value_parser = parse_max_length
    )]
    pub max_length: usize,

    /// Run on the CPU even when an accelerator is available
    #[arg(long)]
    pub cpu: bool,

    /// Load the model once and classify every line read from stdin
    #[arg(long, conflicts_with = "text")]
    pub stdin: bool,
}

fn parse_max_length(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    /// The first positional argument, as `argv[1]` of the one-shot contract.
    pub fn text(&self) -> Option<&str> {
        self.text.first().map(String::as_str)
    }

    fn load_classifier(&self) -> Result<ToxicityClassifier> {
        let options = ClassifierOptions {
            max_length: self.max_length,
            device: select_device(self.cpu),
        };
        ToxicityClassifier::load(&self.model_dir, options)
    }
}

/// Runs one invocation. On success the result line has been written to `out`;
/// errors are left to the caller to report.
pub fn run<R: BufRead, W: Write>(cli: &Cli, input: R, out: &mut W) -> Result<()> {
    if cli.stdin {
        return serve_lines(cli, input, out);
    }

    let text = cli.text().ok_or(Error::InputError)?;
    let classifier = cli.load_classifier()?;
    let prediction = classifier.predict(text)?;
    output::write_line(out, &prediction)
}

fn serve_lines<R: BufRead, W: Write>(cli: &Cli, input: R, out: &mut W) -> Result<()> {
    let classifier = cli.load_classifier()?;
    let mut served = 0usize;
    for line in input.split(b'\n') {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let result = match String::from_utf8(line) {
            Ok(text) => classifier.predict(&text),
            Err(_) => Err(Error::EncodingError("line is not valid UTF-8".to_string())),
        };
        match result {
            Ok(prediction) => output::write_line(out, &prediction)?,
            Err(err) => {
                warn!(%err, line = served, "classification failed");
                output::write_error(out, &err.to_string())?;
            }
        }
        served += 1;
    }
    info!(served, "stdin closed");
    Ok(())
}

/// Writes `err` as the structured error line.
pub fn report_error<W: Write>(out: &mut W, err: &Error) {
    if let Err(write_err) = output::write_error(out, &err.to_string()) {
        error!(%write_err, "failed to write error response");
    }
}

/// Message for the structured error line when argument parsing fails.
///
/// Built from the error kind and the offending argument rather than from
/// clap's rendered help text.
pub fn argument_error_message(err: &clap::Error) -> String {
    let kind = err.kind().as_str().unwrap_or("invalid arguments");
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => format!("{}: {}", kind, arg),
        _ => kind.to_string(),
    }
}

/// Help and version requests keep clap's own output.
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}
