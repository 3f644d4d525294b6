//! Absolute-positioned region painter.
//!
//! Invariant: every paint leaves here as exactly one `Terminal::write`,
//! bracketed by synchronized-update markers, and no path performs a
//! full-screen clear.

use std::io;

use unicode_width::UnicodeWidthChar;

use crate::core::autocomplete::{visible_matches, CommandMatch};
use crate::core::terminal::Terminal;
use crate::core::transcript::Sender;
use crate::logging::DebugLog;
use crate::render::{Layout, RenderState};

const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const CLEAR_LINE: &str = "\x1b[2K";
const SAVE_CURSOR: &str = "\x1b[s";
const RESTORE_CURSOR: &str = "\x1b[u";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// Prompt shown on the input row.
pub const PROMPT: &str = "You: ";

/// Command cell width inside the overlay.
const OVERLAY_COMMAND_WIDTH: usize = 15;

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

fn dim(text: &str) -> String {
    ansi_wrap(text, "\x1b[2m", "\x1b[22m")
}

fn yellow(text: &str) -> String {
    ansi_wrap(text, "\x1b[33m", "\x1b[39m")
}

fn status_bar(text: &str) -> String {
    ansi_wrap(text, "\x1b[46m", "\x1b[0m")
}

fn overlay_cell(text: &str) -> String {
    ansi_wrap(text, "\x1b[42m", "\x1b[0m")
}

/// Strips CSI escape sequences, leaving the printable text.
pub fn strip_ansi(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == 0x1b && index + 1 < bytes.len() && bytes[index + 1] == b'[' {
            index += 2;
            while index < bytes.len() {
                let byte = bytes[index];
                index += 1;
                if (b'@'..=b'~').contains(&byte) {
                    break;
                }
            }
            continue;
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8(output).unwrap_or_default()
}

/// Display width of the printable portion of `text`.
pub fn visible_width(text: &str) -> usize {
    strip_ansi(text)
        .chars()
        .map(|ch| ch.width().unwrap_or(0))
        .sum()
}

/// Clips `text` to `max_width` display columns, keeping escape sequences
/// intact and terminating any open styling.
fn clip_to_width(text: &str, max_width: usize) -> String {
    if visible_width(text) <= max_width {
        return text.to_string();
    }

    let bytes = text.as_bytes();
    let mut output = String::new();
    let mut width = 0;
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == 0x1b && index + 1 < bytes.len() && bytes[index + 1] == b'[' {
            let start = index;
            index += 2;
            while index < bytes.len() {
                let byte = bytes[index];
                index += 1;
                if (b'@'..=b'~').contains(&byte) {
                    break;
                }
            }
            output.push_str(std::str::from_utf8(&bytes[start..index]).unwrap_or_default());
            continue;
        }

        let Some(ch) = std::str::from_utf8(&bytes[index..])
            .ok()
            .and_then(|rest| rest.chars().next())
        else {
            break;
        };
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        output.push(ch);
        width += ch_width;
        index += ch.len_utf8();
    }

    output.push_str("\x1b[0m");
    output
}

fn move_to(buffer: &mut String, row: usize, col: usize) {
    buffer.push_str(&format!("\x1b[{row};{col}H"));
}

fn clear_row(buffer: &mut String, row: usize) {
    move_to(buffer, row, 1);
    buffer.push_str(CLEAR_LINE);
}

/// Visible slice of the input buffer plus the cursor offset inside it.
///
/// The buffer holds printable ASCII only (the key decoder admits nothing
/// else), so byte offsets are column offsets.
fn input_window(input: &str, cursor: usize, available: usize) -> (&str, usize) {
    debug_assert!(input.is_ascii());
    if input.len() <= available {
        return (input, cursor.min(input.len()));
    }

    let start = cursor.saturating_add(10).saturating_sub(available).min(
        input.len().saturating_sub(available),
    );
    let end = (start + available).min(input.len());
    (&input[start..end], cursor.saturating_sub(start).min(available))
}

/// Paints the four regions with absolute cursor addressing.
pub struct Painter {
    layout: Layout,
    debug: DebugLog,
}

impl Painter {
    pub fn new(layout: Layout, debug: DebugLog) -> Self {
        Self { layout, debug }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Full repaint of conversation, overlay, input, and status regions.
    ///
    /// Each region clears only its own rows; the buffer is flushed as one
    /// write and the cursor ends parked at the logical edit position.
    pub fn paint<T: Terminal>(&mut self, term: &mut T, state: &RenderState) -> io::Result<()> {
        let mut buffer = String::from(SYNC_START);
        buffer.push_str(HIDE_CURSOR);

        self.paint_conversation(&mut buffer, state);
        self.paint_overlay(&mut buffer, state);
        self.paint_input(&mut buffer, state);
        self.paint_status(&mut buffer, state.status);

        self.park_cursor_into(&mut buffer, state.input, state.cursor);
        buffer.push_str(SHOW_CURSOR);
        buffer.push_str(SYNC_END);

        if self.debug.is_enabled() {
            self.debug.log(&format!(
                "paint input_len={} cursor={} overlay={} window={}",
                state.input.len(),
                state.cursor,
                state.overlay.map(<[CommandMatch]>::len).unwrap_or(0),
                state.conversation.len(),
            ));
        }

        term.write(&buffer)
    }

    /// Repaints only the status row, saving and restoring the cursor so the
    /// caret never leaves the edit position. No other region is touched.
    pub fn paint_status_only<T: Terminal>(&mut self, term: &mut T, status: &str) -> io::Result<()> {
        let mut buffer = String::from(SYNC_START);
        buffer.push_str(SAVE_CURSOR);
        self.paint_status(&mut buffer, status);
        buffer.push_str(RESTORE_CURSOR);
        buffer.push_str(SYNC_END);

        if self.debug.is_enabled() {
            self.debug.log("paint status-only");
        }

        term.write(&buffer)
    }

    /// Moves the caret to track `cursor` without repainting anything.
    pub fn park_cursor<T: Terminal>(
        &mut self,
        term: &mut T,
        input: &str,
        cursor: usize,
    ) -> io::Result<()> {
        let mut buffer = String::new();
        self.park_cursor_into(&mut buffer, input, cursor);
        term.write(&buffer)
    }

    fn park_cursor_into(&self, buffer: &mut String, input: &str, cursor: usize) {
        let available = self.input_columns();
        let (_, visible_cursor) = input_window(input, cursor, available);
        move_to(
            buffer,
            self.layout.input_row(),
            PROMPT.len() + visible_cursor + 1,
        );
    }

    fn input_columns(&self) -> usize {
        self.layout
            .columns()
            .saturating_sub(PROMPT.len() + 2)
            .max(1)
    }

    fn paint_conversation(&self, buffer: &mut String, state: &RenderState) {
        let bottom = self.layout.conversation_bottom();
        let window = &state.conversation;
        let skip = window.len().saturating_sub(bottom);

        for row in 1..=bottom {
            clear_row(buffer, row);
            if let Some(line) = window.get(skip + row - 1) {
                let styled = match line.sender {
                    Sender::User => yellow(&line.text),
                    Sender::Assistant => line.text.clone(),
                    Sender::System => dim(&line.text),
                };
                buffer.push_str(&clip_to_width(&styled, self.layout.columns()));
            }
        }
    }

    fn paint_overlay(&self, buffer: &mut String, state: &RenderState) {
        let Some(matches) = state.overlay else {
            return;
        };
        if matches.is_empty() {
            return;
        }

        let (visible, extra) = visible_matches(matches);
        let rows_needed = visible.len() + usize::from(extra > 0);
        let bottom = self.layout.conversation_bottom();
        let top = bottom.saturating_sub(rows_needed.saturating_sub(1)).max(1);

        let mut row = top;
        for entry in visible {
            if row > bottom {
                break;
            }
            clear_row(buffer, row);
            buffer.push_str(&clip_to_width(
                &overlay_row(entry, self.layout.columns()),
                self.layout.columns(),
            ));
            row += 1;
        }

        if extra > 0 && row <= bottom {
            clear_row(buffer, row);
            buffer.push_str(&dim(&format!("+{extra} more")));
        }
    }

    fn paint_input(&self, buffer: &mut String, state: &RenderState) {
        let input_row = self.layout.input_row();
        // The spacing row between input and status stays blank.
        clear_row(buffer, input_row + 1);

        clear_row(buffer, input_row);
        let (visible, _) = input_window(state.input, state.cursor, self.input_columns());
        buffer.push_str(&yellow(PROMPT));
        buffer.push_str(visible);
    }

    fn paint_status(&self, buffer: &mut String, status: &str) {
        let columns = self.layout.columns();
        let row = self.layout.status_row();
        clear_row(buffer, row);

        let mut text = status.to_string();
        let max = columns.saturating_sub(4);
        if text.chars().count() > max {
            text = text.chars().take(max.saturating_sub(3)).collect();
            text.push_str("...");
        }

        let pad = columns.saturating_sub(2).saturating_sub(text.chars().count());
        buffer.push_str(&status_bar(&format!(" {text}{} ", " ".repeat(pad))));
    }
}

fn overlay_row(entry: &CommandMatch, columns: usize) -> String {
    let mut command = format!("/{}", entry.command);
    if command.chars().count() > OVERLAY_COMMAND_WIDTH {
        command = command.chars().take(OVERLAY_COMMAND_WIDTH - 3).collect();
        command.push_str("...");
    }

    let description_width = columns.saturating_sub(OVERLAY_COMMAND_WIDTH + 3);
    let mut description = entry.description.clone();
    if description.chars().count() > description_width {
        description = description
            .chars()
            .take(description_width.saturating_sub(3))
            .collect();
        description.push_str("...");
    }

    format!(
        "{} {}",
        overlay_cell(&format!(" {:<width$} ", command, width = OVERLAY_COMMAND_WIDTH)),
        description
    )
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{clip_to_width, input_window, strip_ansi, visible_width, Painter, PROMPT};
    use crate::core::autocomplete::CommandMatch;
    use crate::core::terminal::Terminal;
    use crate::core::transcript::{Sender, TranscriptLine};
    use crate::logging::DebugLog;
    use crate::render::{Layout, RenderState};

    struct RecordingTerminal {
        written: String,
        writes: usize,
    }

    impl RecordingTerminal {
        fn new() -> Self {
            Self {
                written: String::new(),
                writes: 0,
            }
        }
    }

    impl Terminal for RecordingTerminal {
        fn enter_raw(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn leave_raw(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn read_byte(&mut self, _timeout_ms: i32) -> io::Result<Option<u8>> {
            Ok(None)
        }

        fn write(&mut self, data: &str) -> io::Result<()> {
            self.written.push_str(data);
            self.writes += 1;
            Ok(())
        }

        fn columns(&self) -> u16 {
            80
        }

        fn rows(&self) -> u16 {
            24
        }
    }

    fn painter() -> Painter {
        Painter::new(Layout::new(80, 24), DebugLog::disabled())
    }

    fn state<'a>(
        input: &'a str,
        cursor: usize,
        overlay: Option<&'a [CommandMatch]>,
        status: &'a str,
        conversation: Vec<&'a TranscriptLine>,
    ) -> RenderState<'a> {
        RenderState {
            input,
            cursor,
            overlay,
            status,
            conversation,
        }
    }

    #[test]
    fn paint_never_clears_the_whole_screen() {
        let mut term = RecordingTerminal::new();
        let line = TranscriptLine {
            sender: Sender::System,
            text: "ready".to_string(),
        };
        painter()
            .paint(&mut term, &state("", 0, None, "TIME", vec![&line]))
            .expect("paint");

        assert!(!term.written.contains("\x1b[2J"));
        assert!(!term.written.contains("\x1b[3J"));
        assert_eq!(term.writes, 1, "paint must flush as one write");
    }

    #[test]
    fn paint_parks_cursor_at_edit_position() {
        let mut term = RecordingTerminal::new();
        painter()
            .paint(&mut term, &state("hi", 1, None, "", Vec::new()))
            .expect("paint");

        let layout = Layout::new(80, 24);
        let expected = format!("\x1b[{};{}H", layout.input_row(), PROMPT.len() + 2);
        assert!(
            term.written.contains(&expected),
            "missing cursor park {expected:?} in {:?}",
            term.written
        );
    }

    #[test]
    fn status_only_paint_touches_only_the_status_row() {
        let mut term = RecordingTerminal::new();
        painter()
            .paint_status_only(&mut term, "TIME 01:02:03 PM")
            .expect("paint");

        let layout = Layout::new(80, 24);
        assert!(term.written.starts_with("\x1b[?2026h\x1b[s"));
        assert!(term.written.ends_with("\x1b[u\x1b[?2026l"));
        let row_moves: Vec<&str> = term
            .written
            .matches(&format!("\x1b[{};1H", layout.status_row()))
            .collect();
        assert_eq!(row_moves.len(), 1);
        // No other absolute row addressed.
        assert_eq!(term.written.matches(";1H").count(), 1);
    }

    #[test]
    fn overlay_rows_sit_directly_above_the_input_gap() {
        let matches = vec![
            CommandMatch {
                command: "model".to_string(),
                description: "Model management".to_string(),
            },
            CommandMatch {
                command: "memory".to_string(),
                description: "Memory management".to_string(),
            },
        ];
        let mut term = RecordingTerminal::new();
        painter()
            .paint(
                &mut term,
                &state("/m", 2, Some(matches.as_slice()), "", Vec::new()),
            )
            .expect("paint");

        let layout = Layout::new(80, 24);
        let bottom = layout.conversation_bottom();
        assert!(term.written.contains(&format!("\x1b[{};1H", bottom)));
        assert!(term.written.contains("/model"));
        assert!(term.written.contains("/memory"));
    }

    #[test]
    fn overflowing_matches_render_a_more_indicator() {
        let matches: Vec<CommandMatch> = (0..13)
            .map(|i| CommandMatch {
                command: format!("cmd{i:02}"),
                description: "desc".to_string(),
            })
            .collect();
        let mut term = RecordingTerminal::new();
        painter()
            .paint(
                &mut term,
                &state("/c", 2, Some(matches.as_slice()), "", Vec::new()),
            )
            .expect("paint");

        assert!(term.written.contains("+3 more"));
        assert!(!term.written.contains("cmd11"));
    }

    #[test]
    fn conversation_window_fills_from_the_top() {
        let lines: Vec<TranscriptLine> = (0..3)
            .map(|i| TranscriptLine {
                sender: Sender::Assistant,
                text: format!("reply-{i}"),
            })
            .collect();
        let refs: Vec<&TranscriptLine> = lines.iter().collect();
        let mut term = RecordingTerminal::new();
        painter()
            .paint(&mut term, &state("", 0, None, "", refs))
            .expect("paint");

        let first = term.written.find("reply-0").expect("first line painted");
        let last = term.written.find("reply-2").expect("last line painted");
        assert!(first < last);
    }

    #[test]
    fn long_input_scrolls_horizontally_keeping_cursor_visible() {
        let input: String = std::iter::repeat('a').take(200).collect();
        let (visible, cursor) = input_window(&input, 200, 40);
        assert_eq!(visible.len(), 40);
        assert!(cursor <= 40);

        let (visible, cursor) = input_window(&input, 0, 40);
        assert_eq!(visible.len(), 40);
        assert_eq!(cursor, 0);
    }

    #[test]
    fn status_text_is_truncated_with_ellipsis() {
        let mut term = RecordingTerminal::new();
        let long: String = std::iter::repeat('s').take(200).collect();
        painter()
            .paint_status_only(&mut term, &long)
            .expect("paint");
        assert!(term.written.contains("..."));
    }

    #[test]
    fn strip_and_width_ignore_escape_sequences() {
        let styled = "\x1b[33mYou: \x1b[39mhi";
        assert_eq!(strip_ansi(styled), "You: hi");
        assert_eq!(visible_width(styled), 7);
    }

    #[test]
    fn clip_preserves_escape_sequences_and_resets() {
        let styled = "\x1b[33mabcdef\x1b[39m";
        let clipped = clip_to_width(styled, 3);
        assert!(clipped.starts_with("\x1b[33mabc"));
        assert!(clipped.ends_with("\x1b[0m"));
        assert_eq!(visible_width(&clipped), 3);
    }
}
