//! Render step.
//!
//! [`render`] maps the machine and the stores to a [`ViewModel`] that a
//! presentation layer can draw without consulting anything else.

use crate::assembly::{AssemblyKind, AssemblyResult};
use crate::output::format_file_size;
use crate::state::{MakerTab, Mode, ViewMachine, ViewState};
use crate::store::Store;

/// Which panel is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// Drop zone.
    Upload,
    /// Queued files.
    Files,
    /// Spinner.
    Progress,
    /// Result offer.
    Download,
    /// Text maker form.
    TextMaker,
    /// Image maker grid.
    ImageMaker,
}

/// One queued item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Position in the store.
    pub index: usize,
    /// File name.
    pub name: String,
    /// Human readable size.
    pub size: String,
}

/// The download being offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOffer {
    /// Suggested filename.
    pub filename: &'static str,
    /// Human readable size.
    pub size: String,
    /// Pages in the document.
    pub page_count: usize,
    /// Run kind.
    pub kind: AssemblyKind,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    /// Visible state.
    pub state: ViewState,
    /// Active mode.
    pub mode: Mode,
    /// Selected maker tab.
    pub tab: MakerTab,
    /// Panel to show.
    pub panel: Panel,
    /// Heading.
    pub title: &'static str,
    /// Line under the heading.
    pub subtitle: &'static str,
    /// Files queued for merging.
    pub files: Vec<Card>,
    /// Images queued for the image maker.
    pub images: Vec<Card>,
    /// False while a run is in flight.
    pub controls_enabled: bool,
    /// Merge trigger.
    pub merge_enabled: bool,
    /// Image maker trigger.
    pub create_images_enabled: bool,
    /// Present when the visible lane is `Ready`.
    pub download: Option<DownloadOffer>,
}

/// Build the view model. Pure.
pub fn render(
    machine: &ViewMachine,
    files: &Store,
    images: &Store,
    result: Option<&AssemblyResult>,
) -> ViewModel {
    let state = machine.current();
    let mode = machine.mode();
    let controls_enabled = state != ViewState::Assembling;

    let panel = match state {
        ViewState::Upload => Panel::Upload,
        ViewState::Reviewing => Panel::Files,
        ViewState::Assembling => Panel::Progress,
        ViewState::Ready => Panel::Download,
        ViewState::MakerText => Panel::TextMaker,
        ViewState::MakerImage => Panel::ImageMaker,
    };

    let (title, subtitle) = match mode {
        Mode::Merge => (
            "Merge your PDF Files",
            "Combine multiple PDFs into a single document. It's fast, simple, and secure.",
        ),
        Mode::Maker => (
            "Create PDF Files",
            "Generate PDFs from text or images. Simple and fast.",
        ),
    };

    let download = match (state, result) {
        (ViewState::Ready, Some(result)) => Some(DownloadOffer {
            filename: result.kind().suggested_filename(),
            size: format_file_size(result.size() as u64),
            page_count: result.page_count(),
            kind: result.kind(),
        }),
        _ => None,
    };

    ViewModel {
        state,
        mode,
        tab: machine.tab(),
        panel,
        title,
        subtitle,
        files: cards(files),
        images: cards(images),
        controls_enabled,
        merge_enabled: controls_enabled && files.len() >= 2,
        create_images_enabled: controls_enabled && !images.is_empty(),
        download,
    }
}

fn cards(store: &Store) -> Vec<Card> {
    store
        .iter()
        .enumerate()
        .map(|(index, item)| Card {
            index,
            name: item.name().to_string(),
            size: format_file_size(item.size()),
        })
        .collect()
}
