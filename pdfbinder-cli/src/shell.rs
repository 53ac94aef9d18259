//! Interactive session.
//!
//! Each line is one command against a single [`Session`]; the current frame
//! is printed after every change. Errors are reported and the loop goes on.

use clap::{Parser, Subcommand, ValueEnum};
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::parse_position;
use crate::formatter::OutputFormatter;
use crate::render::print_frame;
use crate::{read_inputs, report, save_download};
use pdfbinder::error::Result;
use pdfbinder::{Config, LopdfBackend, MakerTab, Mode, Session, SortKey};

/// One shell line.
#[derive(Parser, Debug)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
    /// Queue PDFs for merging
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Queue images for the image maker
    AddImages {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Drop a queued PDF
    Rm {
        #[arg(value_parser = parse_position)]
        position: usize,
    },
    /// Drop a queued image
    RmImage {
        #[arg(value_parser = parse_position)]
        position: usize,
    },
    /// Move a queued PDF
    Mv {
        #[arg(value_parser = parse_position)]
        from: usize,
        #[arg(value_parser = parse_position)]
        to: usize,
    },
    /// Move a queued image
    MvImage {
        #[arg(value_parser = parse_position)]
        from: usize,
        #[arg(value_parser = parse_position)]
        to: usize,
    },
    /// Sort queued PDFs: name-asc, name-desc or date
    Sort { key: String },
    /// Switch between merging and making
    Mode { mode: ModeArg },
    /// Pick the text or image maker
    Tab { tab: TabArg },
    /// Merge the queued PDFs
    Merge,
    /// Write text onto a page
    Text {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        words: Vec<String>,
    },
    /// Put each queued image on its own page
    Images,
    /// Save the result
    Save { path: Option<PathBuf> },
    /// Start over
    Reset,
    /// Show the current view
    Status,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ModeArg {
    Merge,
    Maker,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum TabArg {
    Text,
    Image,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Merge => Mode::Merge,
            ModeArg::Maker => Mode::Maker,
        }
    }
}

impl From<TabArg> for MakerTab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Text => MakerTab::Text,
            TabArg::Image => MakerTab::Image,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

struct Shell<'a> {
    session: Session,
    backend: LopdfBackend,
    config: &'a Config,
    formatter: &'a OutputFormatter,
}

/// Run the read-eval-print loop until `quit` or end of input.
pub async fn run(
    session: Session,
    backend: LopdfBackend,
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut shell = Shell {
        session,
        backend,
        config,
        formatter,
    };

    formatter.info(&format!(
        "{} v{} (type `help` for commands)",
        pdfbinder::NAME,
        pdfbinder::VERSION
    ));
    print_frame(formatter, &shell.session.view());

    loop {
        let Some(input) = read_line(formatter, "pdfbinder> ")? else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        if shell.handle_line(&input).await == Flow::Quit {
            break;
        }
    }

    Ok(())
}

fn read_line(formatter: &OutputFormatter, prompt: &str) -> Result<Option<String>> {
    formatter.prompt(prompt)?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

impl Shell<'_> {
    async fn handle_line(&mut self, input: &str) -> Flow {
        let words = match split_words(input) {
            Ok(words) => words,
            Err(message) => {
                self.formatter.error(&message);
                return Flow::Continue;
            }
        };

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(err) => {
                // Help and usage errors both land here
                let _ = err.print();
                return Flow::Continue;
            }
        };

        match self.execute(command, input).await {
            Ok(flow) => flow,
            Err(err) => {
                debug!(%err, input, "Shell command failed");
                self.formatter.error(&err.to_string());
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, command: ShellCommand, input: &str) -> Result<Flow> {
        let session = &mut self.session;
        match command {
            ShellCommand::Add { files } => {
                let outcome = session.add_files(read_inputs(&files).await?)?;
                if outcome.duplicates > 0 {
                    self.formatter
                        .warning(&format!("Skipped {} duplicate file(s)", outcome.duplicates));
                }
                if outcome.rejected > 0 {
                    self.formatter
                        .warning(&format!("Skipped {} non-PDF file(s)", outcome.rejected));
                }
            }
            ShellCommand::AddImages { files } => {
                let outcome = session.add_images(read_inputs(&files).await?)?;
                if outcome.rejected > 0 {
                    self.formatter
                        .warning(&format!("Skipped {} non-image file(s)", outcome.rejected));
                }
            }
            ShellCommand::Rm { position } => {
                session.remove_file(position)?;
            }
            ShellCommand::RmImage { position } => {
                session.remove_image(position)?;
            }
            ShellCommand::Mv { from, to } => session.move_file(from, to)?,
            ShellCommand::MvImage { from, to } => session.move_image(from, to)?,
            ShellCommand::Sort { key } => session.sort_files(key.parse::<SortKey>()?)?,
            ShellCommand::Mode { mode } => {
                session.switch_mode(mode.into())?;
            }
            ShellCommand::Tab { tab } => {
                session.select_maker_tab(tab.into())?;
            }
            ShellCommand::Merge => {
                let result = session.merge(&self.backend).await?;
                report(self.formatter, &result);
            }
            ShellCommand::Text { words } => {
                let text = text_argument(input, &words);
                let result = session.create_text_pdf(&self.backend, &text).await?;
                report(self.formatter, &result);
            }
            ShellCommand::Images => {
                let result = session.create_image_pdf(&self.backend).await?;
                report(self.formatter, &result);
            }
            ShellCommand::Save { path } => {
                let output = path.or_else(|| self.config.output.clone());
                save_download(session, self.config, output.as_deref(), self.formatter).await?;
                return Ok(Flow::Continue);
            }
            ShellCommand::Reset => {
                session.reset();
            }
            ShellCommand::Status => {}
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        print_frame(self.formatter, &self.session.view());
        Ok(Flow::Continue)
    }
}

/// The text of a `text` line. Unquoted text is taken as typed so runs of
/// spaces and tabs survive; a quoted argument goes through word splitting.
fn text_argument(input: &str, words: &[String]) -> String {
    let raw = input
        .trim_start()
        .strip_prefix("text")
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim_start);

    match raw {
        Some(raw) if !raw.starts_with('"') => raw.to_string(),
        _ => words.join(" "),
    }
}

/// Split a line on whitespace; double quotes group words.
fn split_words(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    words.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if pending {
        words.push(current);
    }
    Ok(words)
}
