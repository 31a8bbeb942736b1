//! Command-line front end of `convert-model`.
//!
//! ```text
//! convert-model                      # train the sample model, write the default output
//! convert-model <input>              # convert <input>, write the default output
//! convert-model <input> <output>     # convert <input> to <output>
//! ```
//!
//! The default output is `model.json` in the parent of the executable's
//! directory.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::convert::{ConvertError, convert_model_to_json, output_size_kb};
use crate::io::{LoadError, load_model};
use crate::sample::{SampleError, create_sample_model};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to create sample model: {0}")]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("cannot locate the executable: {0}")]
    CurrentExe(std::io::Error),
}

/// Where the model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Train the sample model.
    Sample,
    /// Load a model file.
    Convert { input: PathBuf },
}

/// Resolved arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub output: PathBuf,
}

impl Invocation {
    /// Resolve positional arguments (program name excluded).
    ///
    /// Arguments past the second are ignored.
    pub fn from_args<I>(args: I, default_output: PathBuf) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let input = args.next();
        let output = args.next();
        let extra: Vec<String> = args.collect();
        if !extra.is_empty() {
            tracing::warn!(?extra, "ignoring extra arguments");
        }

        match input {
            None => Self {
                mode: Mode::Sample,
                output: default_output,
            },
            Some(input) => Self {
                mode: Mode::Convert {
                    input: PathBuf::from(input),
                },
                output: output.map_or(default_output, PathBuf::from),
            },
        }
    }
}

/// `<dir of exe>/../model.json`
pub fn default_output_path_for(exe: &Path) -> PathBuf {
    exe.parent()
        .unwrap_or_else(|| Path::new("."))
        .join("..")
        .join("model.json")
}

/// Default output next to the running executable.
pub fn default_output_path() -> Result<PathBuf, CliError> {
    let exe = std::env::current_exe().map_err(CliError::CurrentExe)?;
    Ok(default_output_path_for(&exe))
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub output: PathBuf,
    pub size_kb: f64,
}

/// Obtain the model, convert it and report on stdout.
pub fn run(invocation: &Invocation) -> Result<Report, CliError> {
    let model = match &invocation.mode {
        Mode::Sample => {
            println!("No input file provided. Creating sample model...");
            create_sample_model()?.model
        }
        Mode::Convert { input } => {
            if !input.exists() {
                return Err(LoadError::NotFound(input.clone()).into());
            }
            println!("Loading model from: {}", input.display());
            load_model(input)?
        }
    };

    println!("Converting model to JSON format...");
    convert_model_to_json(&model, &invocation.output)?;
    println!("Model saved to: {}", invocation.output.display());

    let size_kb = output_size_kb(&invocation.output)?;
    println!("Output file size: {size_kb:.2} KB");
    println!("Conversion complete!");

    Ok(Report {
        output: invocation.output.clone(),
        size_kb,
    })
}
