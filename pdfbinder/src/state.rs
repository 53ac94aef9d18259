//! View state machine.
//!
//! Two lanes share one machine: the merge lane (`Upload → Reviewing →
//! Assembling → Ready`) and the maker lane (`MakerText`/`MakerImage →
//! Assembling → Ready`). [`Mode`] selects which lane is visible, and
//! [`ViewMachine::current`] is always exactly one state. Every
//! [`Transition`] either yields the next state or is rejected, leaving the
//! machine untouched.

use crate::error::{PdfBinderError, Result};

/// Mutually exclusive views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing queued for merging.
    Upload,
    /// Merge queue has at least one item and can be edited.
    Reviewing,
    /// An assembly run is in flight; all mutation controls are disabled.
    Assembling,
    /// Output produced and ready to download.
    Ready,
    /// Text maker is shown.
    MakerText,
    /// Image maker is shown.
    MakerImage,
}

/// Top-level switch between merging and making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Merge uploaded PDFs.
    #[default]
    Merge,
    /// Create a PDF from text or images.
    Maker,
}

/// Which maker is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MakerTab {
    /// Text to PDF.
    #[default]
    Text,
    /// Images to PDF.
    Image,
}

impl MakerTab {
    /// View state that shows this tab.
    pub fn view(self) -> ViewState {
        match self {
            Self::Text => ViewState::MakerText,
            Self::Image => ViewState::MakerImage,
        }
    }
}

/// Events that move the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The merge store went from empty to non-empty (or more was added).
    AddFirstItem,
    /// The merge store became empty.
    RemoveLastItem,
    /// An assembly run started.
    StartAssembly,
    /// The run produced a result.
    AssemblySucceeded,
    /// The run failed.
    AssemblyFailed,
    /// Back to the initial view.
    Reset,
    /// Flip the top-level mode.
    SwitchMode(Mode),
    /// Pick a maker.
    SelectMakerTab(MakerTab),
}

/// The state machine itself. Pure data, no rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewMachine {
    mode: Mode,
    merge: ViewState,
    maker: ViewState,
    tab: MakerTab,
}

impl Default for ViewMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewMachine {
    /// Initial machine: merge mode, `Upload`.
    pub fn new() -> Self {
        Self {
            mode: Mode::Merge,
            merge: ViewState::Upload,
            maker: MakerTab::Text.view(),
            tab: MakerTab::Text,
        }
    }

    /// The one visible state.
    pub fn current(&self) -> ViewState {
        match self.mode {
            Mode::Merge => self.merge,
            Mode::Maker => self.maker,
        }
    }

    /// Active mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Selected maker tab.
    pub fn tab(&self) -> MakerTab {
        self.tab
    }

    /// State of the merge lane, visible or not.
    pub fn merge_state(&self) -> ViewState {
        self.merge
    }

    /// State of the maker lane, visible or not.
    pub fn maker_state(&self) -> ViewState {
        self.maker
    }

    /// True while the visible lane is running an assembly.
    pub fn is_assembling(&self) -> bool {
        self.current() == ViewState::Assembling
    }

    /// Back to merge mode and `Upload`. Allowed from every state; the maker
    /// lane falls back to the selected tab's view.
    pub fn reset(&mut self) -> ViewState {
        self.mode = Mode::Merge;
        self.merge = ViewState::Upload;
        self.maker = self.tab.view();
        self.current()
    }

    /// Apply a transition and return the new visible state.
    pub fn apply(&mut self, transition: Transition) -> Result<ViewState> {
        let from = self.current();
        let reject = || PdfBinderError::InvalidTransition { from, transition };

        match transition {
            Transition::Reset => return Ok(self.reset()),
            Transition::SwitchMode(mode) => {
                if from == ViewState::Assembling {
                    return Err(reject());
                }
                self.mode = mode;
            }
            _ => match self.mode {
                Mode::Merge => {
                    self.merge = Self::next_merge(self.merge, transition).ok_or_else(reject)?;
                }
                Mode::Maker => {
                    let next =
                        Self::next_maker(self.maker, self.tab, transition).ok_or_else(reject)?;
                    if let Transition::SelectMakerTab(tab) = transition {
                        self.tab = tab;
                    }
                    self.maker = next;
                }
            },
        }

        Ok(self.current())
    }

    fn next_merge(state: ViewState, transition: Transition) -> Option<ViewState> {
        use ViewState::*;

        match (state, transition) {
            (Upload | Reviewing, Transition::AddFirstItem) => Some(Reviewing),
            (Upload | Reviewing, Transition::RemoveLastItem) => Some(Upload),
            (Reviewing, Transition::StartAssembly) => Some(Assembling),
            (Assembling, Transition::AssemblySucceeded) => Some(Ready),
            (Assembling, Transition::AssemblyFailed) => Some(Reviewing),
            _ => None,
        }
    }

    fn next_maker(state: ViewState, tab: MakerTab, transition: Transition) -> Option<ViewState> {
        use ViewState::*;

        match (state, transition) {
            (Assembling, Transition::SelectMakerTab(_)) => None,
            (_, Transition::SelectMakerTab(next)) => Some(next.view()),
            (MakerText | MakerImage | Ready, Transition::StartAssembly) => Some(Assembling),
            (Assembling, Transition::AssemblySucceeded) => Some(Ready),
            (Assembling, Transition::AssemblyFailed) => Some(tab.view()),
            (state, Transition::AddFirstItem | Transition::RemoveLastItem) => Some(state),
            _ => None,
        }
    }
}
