//! pdfbinder - Merge PDFs and make PDFs from text or images.
//!
//! This library holds the whole client-side assembly core:
//!
//! - Ordered, deduplicating stores of pending inputs
//! - A view state machine for the merge and maker lanes
//! - A mutation API with an explicit in-flight guard
//! - An async assembly pipeline over a pluggable PDF backend
//! - Output delivery with atomic saves
//!
//! # Examples
//!
//! ## Merge
//!
//! ```no_run
//! use pdfbinder::{Config, LopdfBackend, RawInput, Session};
//! use pdfbinder::output::PdfWriter;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let backend = LopdfBackend::from_config(&config);
//! let mut session = Session::new(&config);
//!
//! session.add_files([
//!     RawInput::from_path(Path::new("a.pdf")).await?,
//!     RawInput::from_path(Path::new("b.pdf")).await?,
//! ])?;
//! let result = session.merge(&backend).await?;
//! println!("Merged {} pages", result.page_count());
//!
//! PdfWriter::new()
//!     .save_in(&session.download()?, Path::new("."))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Text page
//!
//! ```no_run
//! use pdfbinder::{LopdfBackend, Mode, Session};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::default();
//! session.switch_mode(Mode::Maker)?;
//! let result = session
//!     .create_text_pdf(&LopdfBackend::default(), "Hello, world")
//!     .await?;
//! assert_eq!(result.page_count(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembly;
pub mod backend;
pub mod config;
pub mod error;
pub mod item;
pub mod output;
pub mod session;
pub mod state;
pub mod store;
pub mod view;

// Re-export commonly used types
pub use assembly::{AssemblyJob, AssemblyKind, AssemblyResult, RunTicket};
pub use backend::{LopdfBackend, PdfBackend};
pub use config::{Config, MakerOptions, PageSize};
pub use error::{PdfBinderError, Result};
pub use item::{InputItem, RawInput};
pub use output::Download;
pub use session::Session;
pub use state::{MakerTab, Mode, Transition, ViewMachine, ViewState};
pub use store::{SortKey, Store};
pub use view::ViewModel;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
