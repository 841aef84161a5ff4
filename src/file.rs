//! Plaintext file input and output.
//!
//! The [`InputFile`] and [`OutputFile`] abstractions wrap the buffered
//! readers and writers used by both the map builder and the population
//! filter, so that open failures always report the offending path.
//!
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    IOError(#[from] io::Error),
    #[error("could not open '{path}': {source}")]
    OpenError { path: String, source: io::Error },
    #[error("could not create '{path}': {source}")]
    CreateError { path: String, source: io::Error },
    #[error("{0} has no header line")]
    MissingHeader(String),
}

/// Represents an input file.
pub struct InputFile {
    pub filepath: String,
}

impl InputFile {
    /// Constructs a new `InputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - A string slice that holds the path to the file.
    pub fn new(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
        }
    }

    /// Opens the file and returns a buffered reader.
    ///
    /// # Returns
    ///
    /// A result containing a `BufReader<File>` on success, or a `FileError` naming
    /// the path on failure.
    pub fn reader(&self) -> Result<BufReader<File>, FileError> {
        let file = File::open(&self.filepath).map_err(|source| FileError::OpenError {
            path: self.filepath.clone(),
            source,
        })?;
        Ok(BufReader::new(file))
    }
}

/// Represents an output file.
///
/// The file is created (or truncated) when the writer is opened. Nothing is
/// removed if a run fails part way through.
pub struct OutputFile {
    pub filepath: String,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    pub fn new(filepath: &str) -> Self {
        Self {
            filepath: filepath.to_string(),
        }
    }

    /// Creates the file and returns a buffered writer.
    pub fn writer(&self) -> Result<BufWriter<File>, FileError> {
        let file = File::create(&self.filepath).map_err(|source| FileError::CreateError {
            path: self.filepath.clone(),
            source,
        })?;
        Ok(BufWriter::new(file))
    }
}

/// Consume exactly one header line from `lines`.
///
/// # Arguments
///  * `lines`: the line iterator of an open reader.
///  * `what`: a short description of the input, used in the error.
pub fn skip_header<I>(lines: &mut I, what: &str) -> Result<(), FileError>
where
    I: Iterator<Item = io::Result<String>>,
{
    match lines.next() {
        Some(line) => {
            line?;
            Ok(())
        }
        None => Err(FileError::MissingHeader(what.to_string())),
    }
}
