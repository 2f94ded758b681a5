use std::{fs, path::Path};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, error, trace};

use crate::{persistence, Note, NotebookError, Result};

/// Helper method to load an exported notes array from a file
pub fn load_notes_from_file(path: &Path) -> Result<Vec<Note>> {
    debug!("Loading notes from file: {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| {
        error!("Failed to open notes file {}: {}", path.display(), e);
        NotebookError::Io(e)
    })?;

    let notes = persistence::parse_notes(&content).ok_or_else(|| {
        let error_msg = format!("{} does not contain a notes array", path.display());
        error!("{}", error_msg);
        NotebookError::ApplicationError { message: error_msg }
    })?;

    trace!("Loaded {} notes from {}", notes.len(), path.display());
    Ok(notes)
}

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Parses a reminder time given as RFC 3339 or `YYYY-MM-DD HH:MM` (UTC).
pub fn parse_reminder_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(NotebookError::ApplicationError {
        message: format!("Unrecognized reminder time: {}", input),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(
            parse_tags(Some(" work, ,home ,".to_string())),
            vec!["work".to_string(), "home".to_string()]
        );
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn reminder_times_in_supported_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(parse_reminder_time("2026-03-01 09:30").unwrap(), expected);
        assert_eq!(parse_reminder_time("2026-03-01T09:30").unwrap(), expected);
        assert_eq!(
            parse_reminder_time("2026-03-01T11:30:00+02:00").unwrap(),
            expected
        );
        assert!(parse_reminder_time("next tuesday").is_err());
    }

    #[test]
    fn notes_file_must_hold_an_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        fs::write(&path, "{}").unwrap();
        assert!(load_notes_from_file(&path).is_err());

        let notes = vec![Note::new("a", "")];
        fs::write(&path, serde_json::to_string(&notes).unwrap()).unwrap();
        assert_eq!(load_notes_from_file(&path).unwrap(), notes);
    }
}
