//! One-way exports of notes: JSON, Markdown, printable HTML and iCalendar.
use chrono::{DateTime, Utc};
use pulldown_cmark::{html, Options, Parser};

use crate::{Note, Result};

/// JSON array of notes, pretty printed, in the persisted document shape.
pub fn notes_to_json(notes: &[Note]) -> Result<String> {
    Ok(serde_json::to_string_pretty(notes)?)
}

/// `# title`, a blank line, then the content.
pub fn note_to_markdown(note: &Note) -> String {
    format!("# {}\n\n{}\n", note.title, note.content)
}

/// All notes as Markdown, separated by horizontal rules.
pub fn notes_to_markdown(notes: &[Note]) -> String {
    notes
        .iter()
        .map(note_to_markdown)
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

/// Standalone HTML page with the note's Markdown rendered, for printing.
pub fn note_to_html(note: &Note) -> String {
    let mut body = String::new();
    html::push_html(
        &mut body,
        Parser::new_ext(&note.content, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH),
    );

    let title = escape_html(&note.title);
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\nbody {{ background: #fff; color: #18181b; margin: 0; font-family: Inter, Arial, sans-serif; }}\n\
         main {{ padding: 32px 24px; }}\nh1 {{ margin-bottom: 16px; }}\n</style>\n</head>\n\
         <body>\n<main>\n<h1>{title}</h1>\n<div>\n{body}</div>\n</main>\n</body>\n</html>\n"
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Calendar with one VEVENT at the note's reminder, or `None` without a reminder.
pub fn reminder_to_ics(note: &Note) -> Option<String> {
    let at = note.reminder?;
    let stamp = format_ics_datetime(at);

    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//Notebook//EN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@notebook", note.id),
        format!("DTSTAMP:{}", stamp),
        format!("DTSTART:{}", stamp),
        fold_line(&format!("SUMMARY:{}", escape_text(&note.title))),
        fold_line(&format!("DESCRIPTION:{}", escape_text(&note.content))),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];
    Some(lines.join("\r\n") + "\r\n")
}

/// UTC timestamp at minute precision, e.g. `20260224T143000Z`.
fn format_ics_datetime(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M00Z").to_string()
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

/// Folds a content line at 75 octets without splitting UTF-8 sequences.
fn fold_line(s: &str) -> String {
    if s.len() <= 75 {
        return s.to_string();
    }
    let mut result = String::new();
    let mut pos = 0;
    while pos < s.len() {
        // Continuation lines start with a space, which counts toward the limit.
        let width = if pos == 0 { 75 } else { 74 };
        let mut end = (pos + width).min(s.len());
        while end < s.len() && !s.is_char_boundary(end) {
            end -= 1;
        }
        if pos > 0 {
            result.push_str("\r\n ");
        }
        result.push_str(&s[pos..end]);
        pos = end;
    }
    result
}

/// Character and word counts of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    pub chars: usize,
    pub words: usize,
}

pub fn text_stats(text: &str) -> TextStats {
    TextStats {
        chars: text.chars().count(),
        words: text.split_whitespace().count(),
    }
}

/// File name for an exported note, `fallback` when the title has no usable characters.
pub fn export_file_name(title: &str, fallback: &str, extension: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = if cleaned.trim_matches('_').is_empty() {
        fallback
    } else {
        cleaned.as_str()
    };
    format!("{}.{}", stem, extension)
}
