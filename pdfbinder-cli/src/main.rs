//! pdfbinder - Merge PDFs, or make a PDF from text or images.

mod cli;
mod formatter;
mod render;
mod shell;

use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ImagesArgs, MergeArgs, TextArgs};
use crate::formatter::OutputFormatter;
use pdfbinder::config::OverwriteMode;
use pdfbinder::error::{PdfBinderError, Result};
use pdfbinder::output::PdfWriter;
use pdfbinder::{
    AssemblyResult, Config, LopdfBackend, MakerTab, Mode, RawInput, Session, SortKey,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let config = cli.to_config()?;
    init_tracing(&config);

    let formatter = OutputFormatter::from_config(&config);
    let backend = LopdfBackend::from_config(&config);
    let mut session = Session::new(&config);

    let result = match cli.command {
        Command::Merge(args) => merge(&mut session, &backend, args, &formatter).await?,
        Command::Text(args) => text(&mut session, &backend, args).await?,
        Command::Images(args) => images(&mut session, &backend, args, &formatter).await?,
        Command::Shell => {
            return shell::run(session, backend, &config, &formatter).await;
        }
    };

    report(&formatter, &result);
    save_download(&session, &config, config.output.as_deref(), &formatter).await?;
    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flags.
fn init_tracing(config: &Config) {
    let filter = if config.verbose {
        "debug"
    } else if config.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

async fn merge(
    session: &mut Session,
    backend: &LopdfBackend,
    args: MergeArgs,
    formatter: &OutputFormatter,
) -> Result<AssemblyResult> {
    let outcome = session.add_files(read_inputs(&args.files).await?)?;
    if outcome.duplicates > 0 {
        formatter.warning(&format!("Skipped {} duplicate file(s)", outcome.duplicates));
    }
    if outcome.rejected > 0 {
        formatter.warning(&format!("Skipped {} non-PDF file(s)", outcome.rejected));
    }

    if let Some(ref key) = args.sort {
        session.sort_files(key.parse::<SortKey>()?)?;
    }
    for &(from, to) in &args.moves {
        session.move_file(from, to)?;
    }

    let mut removals = args.remove.clone();
    removals.sort_unstable();
    removals.dedup();
    for &index in removals.iter().rev() {
        let removed = session.remove_file(index)?;
        formatter.debug(&format!("Removed {}", removed.name()));
    }

    for (index, name) in session.files().names().iter().enumerate() {
        formatter.list_item(index + 1, name);
    }
    formatter.info("Merging documents...");

    session.merge(backend).await
}

async fn text(
    session: &mut Session,
    backend: &LopdfBackend,
    args: TextArgs,
) -> Result<AssemblyResult> {
    let text = match (args.text, args.from_file) {
        (Some(text), _) => text,
        (None, Some(path)) if path == Path::new("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
        (None, Some(path)) => {
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| PdfBinderError::InputRead {
                    name: path.display().to_string(),
                    source,
                })?
        }
        (None, None) => String::new(),
    };

    session.switch_mode(Mode::Maker)?;
    session.select_maker_tab(MakerTab::Text)?;
    session.create_text_pdf(backend, &text).await
}

async fn images(
    session: &mut Session,
    backend: &LopdfBackend,
    args: ImagesArgs,
    formatter: &OutputFormatter,
) -> Result<AssemblyResult> {
    session.switch_mode(Mode::Maker)?;
    session.select_maker_tab(MakerTab::Image)?;

    let outcome = session.add_images(read_inputs(&args.files).await?)?;
    if outcome.rejected > 0 {
        formatter.warning(&format!("Skipped {} non-image file(s)", outcome.rejected));
    }

    session.create_image_pdf(backend).await
}

/// Describe files on disk as session inputs.
pub(crate) async fn read_inputs(paths: &[PathBuf]) -> Result<Vec<RawInput>> {
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        inputs.push(RawInput::from_path(path).await?);
    }
    Ok(inputs)
}

pub(crate) fn report(formatter: &OutputFormatter, result: &AssemblyResult) {
    formatter.success(&format!(
        "Built {} page(s) from {} input(s) in {:.2}s",
        result.page_count(),
        result.inputs(),
        result.duration().as_secs_f64()
    ));
}

/// Write the session's download to `output`, or to its suggested filename.
pub(crate) async fn save_download(
    session: &Session,
    config: &Config,
    output: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<PathBuf> {
    let download = session.download()?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(download.filename()));

    handle_output_overwrite(&path, config.overwrite_mode, formatter)?;

    let stats = PdfWriter::new().save(&download, &path).await?;
    formatter.success(&format!(
        "Saved {} ({})",
        stats.output_path.display(),
        stats.format_file_size()
    ));

    if formatter.is_verbose() {
        formatter.section("Statistics");
        formatter.detail("Write time", &format!("{:.2}s", stats.write_time.as_secs_f64()));
        formatter.detail("Compression", &format!("{:?}", config.compression));
        if !config.metadata.is_empty() {
            formatter.detail("Metadata", "Set");
        }
    }

    Ok(stats.output_path)
}

/// Handle output file overwrite scenarios.
fn handle_output_overwrite(
    path: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfBinderError::output_exists(path.to_path_buf())),
        OverwriteMode::Prompt => {
            // No one to ask in quiet mode
            if formatter.is_quiet() {
                return Err(PdfBinderError::output_exists(path.to_path_buf()));
            }

            formatter.warning(&format!("Output file already exists: {}", path.display()));
            formatter.prompt("Overwrite? [y/N]: ")?;

            let mut response = String::new();
            io::stdin().read_line(&mut response)?;

            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(PdfBinderError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_handle_output_overwrite_force() {
        let temp = NamedTempFile::new().unwrap();
        let formatter = OutputFormatter::quiet();

        let result = handle_output_overwrite(temp.path(), OverwriteMode::Force, &formatter);
        assert!(result.is_ok());
    }

    #[test]
    fn test_handle_output_overwrite_no_clobber() {
        let temp = NamedTempFile::new().unwrap();
        let formatter = OutputFormatter::quiet();

        let result = handle_output_overwrite(temp.path(), OverwriteMode::NoClobber, &formatter);
        assert!(matches!(result, Err(PdfBinderError::OutputExists { .. })));
    }

    #[test]
    fn test_handle_output_overwrite_prompt_quiet() {
        let temp = NamedTempFile::new().unwrap();
        let formatter = OutputFormatter::quiet();

        let result = handle_output_overwrite(temp.path(), OverwriteMode::Prompt, &formatter);
        assert!(matches!(result, Err(PdfBinderError::OutputExists { .. })));
    }

    #[test]
    fn test_handle_output_overwrite_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let formatter = OutputFormatter::default();

        let result = handle_output_overwrite(
            &temp_dir.path().join("fresh.pdf"),
            OverwriteMode::NoClobber,
            &formatter,
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_text_command_saves_pdf() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("note.pdf");
        let cli = Cli::try_parse_from([
            "pdfbinder",
            "-q",
            "text",
            "Meeting moved to 3pm",
            "-o",
            output.to_str().unwrap(),
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        let formatter = OutputFormatter::from_config(&config);
        let backend = LopdfBackend::from_config(&config);
        let mut session = Session::new(&config);

        let Command::Text(args) = cli.command else {
            panic!("expected text");
        };
        let result = text(&mut session, &backend, args).await.unwrap();
        assert_eq!(result.page_count(), 1);

        let saved = save_download(&session, &config, config.output.as_deref(), &formatter)
            .await
            .unwrap();
        assert_eq!(saved, output);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_merge_rejects_single_file_after_removal() {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["a.pdf", "b.pdf"] {
            let path = temp_dir.path().join(name);
            std::fs::write(&path, format!("%PDF-1.7 {name}")).unwrap();
            paths.push(path);
        }

        let args = MergeArgs {
            files: paths,
            sort: None,
            moves: vec![],
            remove: vec![1],
            output: None,
        };
        let mut session = Session::default();
        let err = merge(
            &mut session,
            &LopdfBackend::default(),
            args,
            &OutputFormatter::quiet(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PdfBinderError::NotEnoughInputs { actual: 1, .. }));
        assert_eq!(session.files().names(), vec!["a.pdf"]);
    }
}
