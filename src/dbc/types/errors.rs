use std::io;
use thiserror::Error;

/// Errors produced while reading a `.dbc` file.
///
/// Only file-level failures end up here; malformed records become
/// [`Diagnostic`](crate::dbc::types::diagnostics::Diagnostic)s.
#[derive(Debug, Error)]
pub enum DbcParseError {
    #[error("Not a valid .dbc file: {path}")]
    InvalidExtension { path: String },
    #[error("Failed to open '{path}'. \nError: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed while reading '{path}'. \nError: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Grammar failure inside one record. Turned into a diagnostic by the dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected {expected} at column {column}")]
    Expected {
        expected: &'static str,
        column: usize,
    },
    #[error("invalid number '{text}' at column {column}")]
    InvalidNumber { text: String, column: usize },
    #[error("unterminated string starting at column {column}")]
    UnterminatedString { column: usize },
    #[error("{0}")]
    Invalid(String),
}

/// Errors produced while generating or saving a C header.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("'{name}' is not a valid C identifier")]
    InvalidIdentifier { name: String },
    #[error("Failed to create '{path}'. \nError: {source}")]
    CreateFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create directories for '{path}'. \nError: {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed while writing '{path}'. \nError: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to format header content")]
    Format,
}

/// Errors produced while encoding physical values into a payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("message '{message}' has no signal '{signal}'")]
    UnknownSignal { message: String, signal: String },
    #[error("signal factor is zero, physical value cannot be inverted")]
    ZeroFactor,
    #[error("physical value {value} is not a finite number")]
    NonFinite { value: f64 },
    #[error("signal '{signal}' needs multiplexor value {wanted}, but {selected} is already selected")]
    MultiplexConflict {
        signal: String,
        wanted: u32,
        selected: u64,
    },
    #[error("label '{label}' is not in the value table of '{signal}'")]
    UnknownLabel { signal: String, label: String },
}

/// Errors produced while parsing the `ID#DATA` frame notation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameParseError {
    #[error("missing '#' separator in '{0}'")]
    MissingSeparator(String),
    #[error("invalid identifier '{0}'")]
    InvalidId(String),
    #[error("invalid payload '{0}'")]
    InvalidData(String),
    #[error("payload longer than 8 bytes: {0} bytes")]
    TooLong(usize),
}
