//! The mutation API.
//!
//! A [`Session`] owns both stores, the view machine and the latest result of
//! each lane. Every mutation checks the in-flight guard first, then the lane
//! the request belongs to, then touches the store and moves the machine.
//!
//! Assembly runs are split so that nothing borrows the session while the
//! pipeline is suspended:
//!
//! ```no_run
//! use pdfbinder::{LopdfBackend, Session};
//!
//! # async fn example(session: &mut Session) -> pdfbinder::Result<()> {
//! let backend = LopdfBackend::default();
//! let job = session.begin_merge()?;
//! let ticket = job.ticket();
//! let outcome = job.run(&backend).await;
//! session.complete(ticket, outcome)?;
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info, warn};

use crate::assembly::{AssemblyJob, AssemblyResult, RunTicket};
use crate::assembly::merge::MIN_MERGE_INPUTS;
use crate::backend::PdfBackend;
use crate::config::{Config, MakerOptions};
use crate::error::{PdfBinderError, Result};
use crate::item::{InputItem, InputKind, RawInput};
use crate::output::Download;
use crate::state::{MakerTab, Mode, Transition, ViewMachine, ViewState};
use crate::store::{AddOutcome, SortKey, Store};
use crate::view::{self, ViewModel};

/// One user session: stores, view state and results.
#[derive(Debug, Default)]
pub struct Session {
    maker: MakerOptions,
    machine: ViewMachine,
    files: Store,
    images: Store,
    merge_result: Option<AssemblyResult>,
    maker_result: Option<AssemblyResult>,
    in_flight: Option<RunTicket>,
    generation: u64,
    runs: u64,
}

impl Session {
    /// Fresh session in merge mode.
    pub fn new(config: &Config) -> Self {
        Self {
            maker: config.maker.clone(),
            ..Self::default()
        }
    }

    /// Queue PDFs for merging.
    ///
    /// # Errors
    ///
    /// - `Busy` while a run is in flight.
    /// - `InvalidState` outside merge mode or once a merge result is shown.
    /// - `NoValidInput` when none of the candidates is a PDF.
    pub fn add_files<I>(&mut self, candidates: I) -> Result<AddOutcome>
    where
        I: IntoIterator<Item = RawInput>,
    {
        self.ensure_idle()?;
        self.ensure_merge_lane(&[ViewState::Upload, ViewState::Reviewing])?;

        let outcome = self.files.add(candidates, InputKind::Pdf)?;
        debug!(
            added = outcome.added,
            duplicates = outcome.duplicates,
            rejected = outcome.rejected,
            "Added files"
        );

        if !self.files.is_empty() {
            self.machine.apply(Transition::AddFirstItem)?;
        }
        Ok(outcome)
    }

    /// Drop the file at `index`. Removing the last file returns to the
    /// upload view.
    pub fn remove_file(&mut self, index: usize) -> Result<InputItem> {
        self.ensure_idle()?;
        self.ensure_merge_lane(&[ViewState::Reviewing])?;

        let removed = self.files.remove_at(index)?;
        if self.files.is_empty() {
            self.machine.apply(Transition::RemoveLastItem)?;
            self.merge_result = None;
        }
        Ok(removed)
    }

    /// Move a file; the others keep their relative order.
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<()> {
        self.ensure_idle()?;
        self.ensure_merge_lane(&[ViewState::Reviewing])?;
        self.files.move_item(from, to)
    }

    /// Reorder all files.
    pub fn sort_files(&mut self, key: SortKey) -> Result<()> {
        self.ensure_idle()?;
        self.ensure_merge_lane(&[ViewState::Reviewing])?;
        self.files.sort(key);
        Ok(())
    }

    /// Queue images. Non-image candidates are counted as rejected.
    pub fn add_images<I>(&mut self, candidates: I) -> Result<AddOutcome>
    where
        I: IntoIterator<Item = RawInput>,
    {
        self.ensure_idle()?;
        self.ensure_maker_not_assembling()?;
        self.images.add(candidates, InputKind::Image)
    }

    /// Drop the image at `index`.
    pub fn remove_image(&mut self, index: usize) -> Result<InputItem> {
        self.ensure_idle()?;
        self.ensure_maker_not_assembling()?;
        self.images.remove_at(index)
    }

    /// Move an image.
    pub fn move_image(&mut self, from: usize, to: usize) -> Result<()> {
        self.ensure_idle()?;
        self.ensure_maker_not_assembling()?;
        self.images.move_item(from, to)
    }

    /// Show the merge or the maker lane.
    pub fn switch_mode(&mut self, mode: Mode) -> Result<ViewState> {
        self.ensure_idle()?;
        self.machine.apply(Transition::SwitchMode(mode))
    }

    /// Pick the text or image maker. Only valid in maker mode.
    pub fn select_maker_tab(&mut self, tab: MakerTab) -> Result<ViewState> {
        self.ensure_idle()?;
        self.machine.apply(Transition::SelectMakerTab(tab))
    }

    /// Back to the initial view with empty stores and no results.
    ///
    /// Allowed at any time. A run still in flight is orphaned: its outcome
    /// is discarded when it completes.
    pub fn reset(&mut self) -> ViewState {
        if self.in_flight.take().is_some() {
            warn!("Reset while an assembly was running; its result will be discarded");
        }
        self.generation += 1;
        self.files.clear();
        self.images.clear();
        self.merge_result = None;
        self.maker_result = None;

        self.machine.reset()
    }

    /// Prepare a merge of every queued file.
    ///
    /// # Errors
    ///
    /// - `NotEnoughInputs` with fewer than two files; nothing changes.
    /// - `Busy`, `InvalidState` or `InvalidTransition` when no merge can
    ///   start from the current view.
    pub fn begin_merge(&mut self) -> Result<AssemblyJob> {
        self.ensure_idle()?;
        self.ensure_mode(Mode::Merge)?;

        if self.files.len() < MIN_MERGE_INPUTS {
            return Err(PdfBinderError::NotEnoughInputs {
                required: MIN_MERGE_INPUTS,
                actual: self.files.len(),
            });
        }

        let ticket = self.start()?;
        info!(files = self.files.len(), "Merge queued");
        Ok(AssemblyJob::merge(ticket, self.files.snapshot()))
    }

    /// Prepare a text page.
    ///
    /// # Errors
    ///
    /// `EmptyInput` when `text` is blank; nothing changes.
    pub fn begin_text(&mut self, text: &str) -> Result<AssemblyJob> {
        self.ensure_idle()?;
        self.ensure_maker_tab(MakerTab::Text)?;

        if text.trim().is_empty() {
            return Err(PdfBinderError::EmptyInput { what: "text" });
        }

        let ticket = self.start()?;
        info!(chars = text.chars().count(), "Text page queued");
        Ok(AssemblyJob::text(ticket, text.to_string(), self.maker.clone()))
    }

    /// Prepare one page per queued image.
    ///
    /// # Errors
    ///
    /// `EmptyInput` when no image is queued; nothing changes.
    pub fn begin_images(&mut self) -> Result<AssemblyJob> {
        self.ensure_idle()?;
        self.ensure_maker_tab(MakerTab::Image)?;

        if self.images.is_empty() {
            return Err(PdfBinderError::EmptyInput { what: "images" });
        }

        let ticket = self.start()?;
        info!(images = self.images.len(), "Image pages queued");
        Ok(AssemblyJob::images(
            ticket,
            self.images.snapshot(),
            self.maker.clone(),
        ))
    }

    /// Hand back the outcome of a run.
    ///
    /// Returns `Ok(true)` when a result was stored, `Ok(false)` when the
    /// ticket was made stale by [`reset`](Self::reset) and the outcome was
    /// dropped. A failed run returns its error after moving the lane back to
    /// where the run started.
    pub fn complete(
        &mut self,
        ticket: RunTicket,
        outcome: Result<AssemblyResult>,
    ) -> Result<bool> {
        if self.in_flight != Some(ticket) {
            warn!(?ticket, "Discarding outcome of a stale assembly run");
            return Ok(false);
        }
        self.in_flight = None;

        match outcome {
            Ok(result) => {
                match self.machine.mode() {
                    Mode::Merge => self.merge_result = Some(result),
                    Mode::Maker => self.maker_result = Some(result),
                }
                self.machine.apply(Transition::AssemblySucceeded)?;
                Ok(true)
            }
            Err(err) => {
                self.machine.apply(Transition::AssemblyFailed)?;
                Err(err)
            }
        }
    }

    /// Merge every queued file.
    pub async fn merge<B: PdfBackend>(&mut self, backend: &B) -> Result<AssemblyResult> {
        let job = self.begin_merge()?;
        self.finish(job, backend).await
    }

    /// Build a one-page PDF from `text`.
    pub async fn create_text_pdf<B: PdfBackend>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Result<AssemblyResult> {
        let job = self.begin_text(text)?;
        self.finish(job, backend).await
    }

    /// Build a PDF with one page per queued image.
    pub async fn create_image_pdf<B: PdfBackend>(&mut self, backend: &B) -> Result<AssemblyResult> {
        let job = self.begin_images()?;
        self.finish(job, backend).await
    }

    async fn finish<B: PdfBackend>(
        &mut self,
        job: AssemblyJob,
        backend: &B,
    ) -> Result<AssemblyResult> {
        let ticket = job.ticket();
        let outcome = job.run(backend).await;
        self.complete(ticket, outcome)?;
        self.result()
            .cloned()
            .ok_or_else(|| PdfBinderError::invalid_state("assembly produced no result"))
    }

    /// The visible lane's result, offered for saving.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the visible lane is `Ready`.
    pub fn download(&self) -> Result<Download> {
        match (self.machine.current(), self.result()) {
            (ViewState::Ready, Some(result)) => Ok(Download::from_result(result)),
            (state, _) => Err(PdfBinderError::invalid_state(format!(
                "nothing to download while in {state:?}"
            ))),
        }
    }

    /// Files queued for merging.
    pub fn files(&self) -> &Store {
        &self.files
    }

    /// Images queued for the image maker.
    pub fn images(&self) -> &Store {
        &self.images
    }

    /// Visible view state.
    pub fn state(&self) -> ViewState {
        self.machine.current()
    }

    /// Active mode.
    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    /// Selected maker tab.
    pub fn tab(&self) -> MakerTab {
        self.machine.tab()
    }

    /// The view machine.
    pub fn machine(&self) -> &ViewMachine {
        &self.machine
    }

    /// Latest result of the visible lane.
    pub fn result(&self) -> Option<&AssemblyResult> {
        match self.machine.mode() {
            Mode::Merge => self.merge_result.as_ref(),
            Mode::Maker => self.maker_result.as_ref(),
        }
    }

    /// True while a run is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Render the current state.
    pub fn view(&self) -> ViewModel {
        view::render(&self.machine, &self.files, &self.images, self.result())
    }

    fn start(&mut self) -> Result<RunTicket> {
        self.machine.apply(Transition::StartAssembly)?;
        self.runs += 1;
        let ticket = RunTicket {
            generation: self.generation,
            run: self.runs,
        };
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.in_flight.is_some() {
            return Err(PdfBinderError::Busy);
        }
        Ok(())
    }

    fn ensure_mode(&self, mode: Mode) -> Result<()> {
        if self.machine.mode() != mode {
            return Err(PdfBinderError::invalid_state(format!(
                "switch to {mode:?} mode first"
            )));
        }
        Ok(())
    }

    fn ensure_merge_lane(&self, allowed: &[ViewState]) -> Result<()> {
        self.ensure_mode(Mode::Merge)?;
        let state = self.machine.merge_state();
        if !allowed.contains(&state) {
            return Err(PdfBinderError::invalid_state(format!(
                "files cannot be changed while in {state:?}"
            )));
        }
        Ok(())
    }

    fn ensure_maker_tab(&self, tab: MakerTab) -> Result<()> {
        self.ensure_mode(Mode::Maker)?;
        if self.machine.tab() != tab {
            return Err(PdfBinderError::invalid_state(format!(
                "select the {tab:?} maker first"
            )));
        }
        Ok(())
    }

    fn ensure_maker_not_assembling(&self) -> Result<()> {
        if self.machine.maker_state() == ViewState::Assembling {
            return Err(PdfBinderError::Busy);
        }
        Ok(())
    }
}
