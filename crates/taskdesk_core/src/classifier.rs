//! Keyword-based category inference for task titles.
//!
//! Rules are checked in order and the first group with a keyword contained in
//! the lowercased title wins. Substring matching is intentional: "bookshelf"
//! counts as `book`.

use crate::model::task::Category;

const KEYWORD_RULES: &[(Category, &[&str])] = &[
    (
        Category::Reading,
        &["read", "reading", "book", "novel", "story"],
    ),
    (
        Category::Writing,
        &["write", "writing", "notes", "essay", "article"],
    ),
    (
        Category::Hobbies,
        &["play", "game", "music", "dance", "hobby"],
    ),
];

/// Infers a category from a task title. Never fails; falls back to
/// `Category::Daily`.
pub fn classify(title: &str) -> Category {
    let title = title.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| title.contains(keyword)))
        .map_or(Category::Daily, |(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::model::task::Category;

    #[test]
    fn book_titles_are_reading_in_any_case() {
        for title in ["book club", "BOOK a table", "Return the Book", "notebook"] {
            assert_eq!(classify(title), Category::Reading, "{title}");
        }
    }

    #[test]
    fn each_group_matches_its_keywords() {
        assert_eq!(classify("Finish the novel"), Category::Reading);
        assert_eq!(classify("Draft essay outline"), Category::Writing);
        assert_eq!(classify("Team meeting notes"), Category::Writing);
        assert_eq!(classify("Play guitar"), Category::Hobbies);
        assert_eq!(classify("Salsa DANCE class"), Category::Hobbies);
    }

    #[test]
    fn titles_without_keywords_are_daily() {
        for title in ["Buy groceries", "Call the bank", "", "   "] {
            assert_eq!(classify(title), Category::Daily, "{title:?}");
        }
    }

    #[test]
    fn earlier_group_wins_on_overlap() {
        assert_eq!(classify("write a book review"), Category::Reading);
        assert_eq!(classify("write music"), Category::Writing);
    }

    #[test]
    fn classifier_never_produces_other() {
        for title in ["other", "misc", "anything else"] {
            assert_ne!(classify(title), Category::Other);
        }
    }
}
