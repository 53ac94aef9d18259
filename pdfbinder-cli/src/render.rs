//! Text rendering of a [`ViewModel`].

use pdfbinder::view::{Card, Panel, ViewModel};

use crate::formatter::OutputFormatter;

/// Lines describing the current frame.
pub fn frame_lines(view: &ViewModel) -> Vec<String> {
    let mut lines = vec![view.title.to_string(), view.subtitle.to_string(), String::new()];

    match view.panel {
        Panel::Upload => lines.push("No files yet. Use `add FILE...` to queue PDFs.".to_string()),
        Panel::Files => {
            lines.push(format!("{} file(s) queued:", view.files.len()));
            lines.extend(view.files.iter().map(card_line));
            if !view.merge_enabled {
                lines.push("Add at least one more PDF to merge.".to_string());
            }
        }
        Panel::Progress => lines.push("Working...".to_string()),
        Panel::Download => {
            if let Some(offer) = &view.download {
                lines.push(format!(
                    "{} ready: {} page(s), {}. Use `save [PATH]`.",
                    offer.filename, offer.page_count, offer.size
                ));
            }
        }
        Panel::TextMaker => lines.push("Text maker. Use `text ...` to build a page.".to_string()),
        Panel::ImageMaker => {
            if view.images.is_empty() {
                lines.push("No images yet. Use `add-images FILE...`.".to_string());
            } else {
                lines.push(format!("{} image(s) queued:", view.images.len()));
                lines.extend(view.images.iter().map(card_line));
            }
        }
    }

    lines
}

/// Print the frame.
pub fn print_frame(formatter: &OutputFormatter, view: &ViewModel) {
    for line in frame_lines(view) {
        formatter.info(&line);
    }
}

fn card_line(card: &Card) -> String {
    format!("  {}. {} ({})", card.index + 1, card.name, card.size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfbinder::{RawInput, Session};

    fn pdf(name: &str, byte: u8) -> RawInput {
        RawInput::from_bytes(name, "application/pdf", 0, vec![byte; 4])
    }

    #[test]
    fn test_upload_frame() {
        let lines = frame_lines(&Session::default().view());
        assert_eq!(lines[0], "Merge your PDF Files");
        assert!(lines[3].starts_with("No files yet"));
    }

    #[test]
    fn test_files_frame_numbers_from_one() {
        let mut session = Session::default();
        session.add_files([pdf("a.pdf", 1)]).unwrap();

        let lines = frame_lines(&session.view());
        assert!(lines.contains(&"  1. a.pdf (4 bytes)".to_string()));
        assert_eq!(lines.last().unwrap(), "Add at least one more PDF to merge.");
    }
}
