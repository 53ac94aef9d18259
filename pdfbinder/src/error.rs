//! Error types for pdfbinder.
//!
//! This module defines every error the assembly core can surface. Errors are
//! grouped by when they happen:
//!
//! # Error Categories
//!
//! - **Input validation**: nothing usable was supplied (`NoValidInput`,
//!   `EmptyInput`, `NotEnoughInputs`). These are raised before any state
//!   mutation and before the PDF backend is touched.
//! - **Pipeline**: the backend rejected a document or failed while building
//!   the output (`Parse`, `Collaborator`, `InputRead`). These abort the whole
//!   run; no partial output is ever exposed.
//! - **Session**: the request is not legal in the current view state
//!   (`InvalidTransition`, `InvalidState`, `Busy`, `IndexOutOfRange`).
//! - **Output / configuration**: saving the result or reading settings.

use std::io;
use std::path::PathBuf;

use crate::state::{Transition, ViewState};

/// Result type alias for pdfbinder operations.
pub type Result<T> = std::result::Result<T, PdfBinderError>;

/// Main error type for pdfbinder operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfBinderError {
    /// None of the candidates matched the kind the store accepts.
    #[error("No valid input: please select {expected} files only")]
    NoValidInput {
        /// Human readable description of the accepted kind.
        expected: &'static str,
    },

    /// A maker was invoked with nothing to process.
    #[error("Nothing to process: {what}")]
    EmptyInput {
        /// What was missing.
        what: &'static str,
    },

    /// A merge was requested with too few documents.
    #[error("At least {required} PDF files are required to merge, got {actual}")]
    NotEnoughInputs {
        /// Minimum number of inputs.
        required: usize,
        /// Number of inputs present.
        actual: usize,
    },

    /// The backend could not parse an input document.
    #[error("Failed to parse PDF: {name}\n  Reason: {reason}")]
    Parse {
        /// Name of the offending input.
        name: String,
        /// Backend message.
        reason: String,
    },

    /// Any other failure reported by the PDF backend.
    #[error("PDF backend error: {reason}")]
    Collaborator {
        /// Backend message.
        reason: String,
    },

    /// Reading the bytes of a file-backed input failed.
    #[error("Failed to read input: {name}\n  Reason: {source}")]
    InputRead {
        /// Name of the input.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An index does not address an item in the store.
    #[error("Index {index} is out of range for {len} item(s)")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Store length at the time of the request.
        len: usize,
    },

    /// The view state machine refused a transition.
    #[error("Cannot apply {transition:?} while in {from:?}")]
    InvalidTransition {
        /// State the machine was in.
        from: ViewState,
        /// Rejected transition.
        transition: Transition,
    },

    /// The session is not in a state that allows the request.
    #[error("Invalid session state: {message}")]
    InvalidState {
        /// What was expected.
        message: String,
    },

    /// An assembly run is in flight; mutations are disabled.
    #[error("An assembly is already running; wait for it to finish or reset")]
    Busy,

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to write the output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<lopdf::Error> for PdfBinderError {
    fn from(err: lopdf::Error) -> Self {
        Self::collaborator(err.to_string())
    }
}

impl From<image::ImageError> for PdfBinderError {
    fn from(err: image::ImageError) -> Self {
        Self::collaborator(err.to_string())
    }
}

impl PdfBinderError {
    /// Create a Parse error.
    pub fn parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a Collaborator error.
    pub fn collaborator(reason: impl Into<String>) -> Self {
        Self::Collaborator {
            reason: reason.into(),
        }
    }

    /// Create an InvalidState error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// True for errors raised before the session or backend was touched.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::NoValidInput { .. } | Self::EmptyInput { .. } | Self::NotEnoughInputs { .. }
        )
    }

    /// True for errors that aborted an assembly run.
    pub fn is_pipeline_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Collaborator { .. } | Self::InputRead { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoValidInput { .. } => 1,
            Self::EmptyInput { .. } => 1,
            Self::NotEnoughInputs { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::InputRead { .. } => 2,
            Self::Parse { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToWrite { .. } => 5,
            Self::Io(_) => 5,
            Self::Collaborator { .. } => 6,
            Self::IndexOutOfRange { .. } => 7,
            Self::InvalidTransition { .. } => 7,
            Self::InvalidState { .. } => 7,
            Self::Busy => 7,
            Self::Cancelled => 130, // Standard exit code for SIGINT
        }
    }
}
