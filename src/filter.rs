//! Filtering and ordering of the visible note list.
use std::cmp::Ordering;

use crate::{Note, SortKey};

/// Derives the visible, ordered notes for a query, tag filter and sort key.
///
/// The tag filter keeps notes carrying a tag of exactly that name; an empty
/// filter keeps every note. A
/// non-blank query then keeps notes whose title, content or any tag name
/// contains it, ignoring case. Pinned notes come first; each group is
/// ordered by `sort_key`. Ties keep their original relative order.
pub fn visible_notes(
    notes: &[Note],
    query: &str,
    tag_filter: Option<&str>,
    sort_key: SortKey,
) -> Vec<Note> {
    let query = query.trim().to_lowercase();

    let mut visible: Vec<Note> = notes
        .iter()
        .filter(|note| {
            tag_filter
                .filter(|tag| !tag.is_empty())
                .map_or(true, |tag| note.has_tag(tag))
        })
        .filter(|note| query.is_empty() || matches_query(note, &query))
        .cloned()
        .collect();

    visible.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| compare_by_key(a, b, sort_key))
    });
    visible
}

/// `query` must already be lowercased.
fn matches_query(note: &Note, query: &str) -> bool {
    note.title.to_lowercase().contains(query)
        || note.content.to_lowercase().contains(query)
        || note
            .tags
            .iter()
            .any(|t| t.name.to_lowercase().contains(query))
}

fn compare_by_key(a: &Note, b: &Note, sort_key: SortKey) -> Ordering {
    match sort_key {
        SortKey::Updated => b.updated_at.cmp(&a.updated_at),
        SortKey::Created => b.created_at.cmp(&a.created_at),
        SortKey::Title => locale_compare(&a.title, &b.title),
        SortKey::Tag => locale_compare(a.first_tag_name(), b.first_tag_name()),
    }
}

/// Human-oriented string order: case-insensitive first, exact order on ties.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::Tag;

    fn note(title: &str, tags: &[&str]) -> Note {
        let mut note = Note::new(title, "");
        note.tags = tags.iter().map(|t| Tag::named(*t)).collect();
        note
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    fn sample() -> Vec<Note> {
        let mut react = note("React", &["frontend"]);
        react.content = "Hooks and state".into();
        let mut node = note("Node", &["backend"]);
        node.content = "Express server".into();
        let mut css = note("CSS", &["frontend"]);
        css.content = "Flexbox".into();

        // Equal timestamps so ordering falls back to input order.
        let at = Utc::now();
        let mut notes = vec![react, node, css];
        for n in &mut notes {
            n.created_at = at;
            n.updated_at = at;
        }
        notes
    }

    #[test]
    fn filters_by_tag_keeping_relative_order() {
        let notes = sample();
        for key in [SortKey::Updated, SortKey::Created, SortKey::Tag] {
            let visible = visible_notes(&notes, "", Some("frontend"), key);
            assert_eq!(titles(&visible), vec!["React", "CSS"]);
        }
    }

    #[test]
    fn filters_by_query_case_insensitively() {
        let visible = visible_notes(&sample(), "node", None, SortKey::Updated);
        assert_eq!(titles(&visible), vec!["Node"]);

        let visible = visible_notes(&sample(), "  FLEX ", None, SortKey::Updated);
        assert_eq!(titles(&visible), vec!["CSS"]);

        let visible = visible_notes(&sample(), "backend", None, SortKey::Updated);
        assert_eq!(titles(&visible), vec!["Node"]);
    }

    #[test]
    fn filters_by_tag_and_query() {
        let visible = visible_notes(&sample(), "css", Some("frontend"), SortKey::Title);
        assert_eq!(titles(&visible), vec!["CSS"]);
    }

    #[test]
    fn tag_filter_is_exact() {
        assert!(visible_notes(&sample(), "", Some("Frontend"), SortKey::Updated).is_empty());
        assert!(visible_notes(&sample(), "", Some("front"), SortKey::Updated).is_empty());
    }

    #[test]
    fn empty_tag_filter_keeps_everything() {
        let all = visible_notes(&sample(), "", None, SortKey::Title);
        let unfiltered = visible_notes(&sample(), "", Some(""), SortKey::Title);
        assert_eq!(titles(&unfiltered), titles(&all));
        assert_eq!(unfiltered.len(), sample().len());
    }

    #[test]
    fn empty_input_or_no_match_is_empty() {
        assert!(visible_notes(&[], "", None, SortKey::Updated).is_empty());
        assert!(visible_notes(&sample(), "rust", None, SortKey::Updated).is_empty());
    }

    #[test]
    fn pinned_first_then_most_recently_updated() {
        let base = Utc::now();
        let mut notes = Vec::new();
        let rows = [
            ("old", 1, false),
            ("pin-old", 2, true),
            ("new", 3, false),
            ("pin-new", 4, true),
        ];
        for (title, minutes, pinned) in rows {
            let mut n = note(title, &[]);
            n.updated_at = base + Duration::minutes(minutes);
            n.pinned = pinned;
            notes.push(n);
        }

        let visible = visible_notes(&notes, "", None, SortKey::Updated);
        assert_eq!(titles(&visible), vec!["pin-new", "pin-old", "new", "old"]);
    }

    #[test]
    fn created_sort_is_descending() {
        let base = Utc::now();
        let mut a = note("a", &[]);
        let mut b = note("b", &[]);
        a.created_at = base;
        b.created_at = base + Duration::seconds(5);
        let visible = visible_notes(&[a, b], "", None, SortKey::Created);
        assert_eq!(titles(&visible), vec!["b", "a"]);
    }

    #[test]
    fn title_sort_ignores_case() {
        let notes = vec![note("banana", &[]), note("Cherry", &[]), note("apple", &[])];
        let visible = visible_notes(&notes, "", None, SortKey::Title);
        assert_eq!(titles(&visible), vec!["apple", "banana", "Cherry"]);
    }

    #[test]
    fn tag_sort_puts_untagged_first() {
        let notes = vec![note("z", &["work"]), note("y", &[]), note("x", &["Home", "zzz"])];
        let visible = visible_notes(&notes, "", None, SortKey::Tag);
        assert_eq!(titles(&visible), vec!["y", "x", "z"]);
    }
}
