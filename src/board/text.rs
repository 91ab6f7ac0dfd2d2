use snafu::ensure;

use crate::board::*;

pub const DESCRIPTION_MIN: usize = 10;
pub const SUMMARY_MIN: usize = 5;
pub const SUMMARY_MAX: usize = 100;
pub const AUTHOR_MIN: usize = 3;

pub fn validate_topic(description: &str, summary: &str, author: &str) -> BoardResult<()> {
    ensure!(
        description.chars().count() >= DESCRIPTION_MIN,
        InvalidFieldSnafu {
            field: "description",
            message: format!("must be at least {} characters long", DESCRIPTION_MIN),
        }
    );
    let summary_len = summary.chars().count();
    ensure!(
        summary_len >= SUMMARY_MIN,
        InvalidFieldSnafu {
            field: "summary",
            message: format!("must be at least {} characters long", SUMMARY_MIN),
        }
    );
    ensure!(
        summary_len <= SUMMARY_MAX,
        InvalidFieldSnafu {
            field: "summary",
            message: format!("must be at most {} characters long", SUMMARY_MAX),
        }
    );
    ensure!(
        author.trim().chars().count() >= AUTHOR_MIN,
        InvalidFieldSnafu {
            field: "author",
            message: format!("must be at least {} characters long", AUTHOR_MIN),
        }
    );
    Ok(())
}

/// Generates a display summary from a description: the whole text when it
/// fits, otherwise a cut at the last space before the limit, plus an
/// ellipsis.
pub fn generate_summary(description: &str) -> String {
    let description = description.trim();
    if description.chars().count() <= SUMMARY_MAX {
        return description.to_string();
    }
    let head: String = description.chars().take(SUMMARY_MAX - 3).collect();
    match head.rfind(' ') {
        Some(idx) => format!("{}...", head[..idx].trim_end()),
        None => format!("{}...", head),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_descriptions_pass_through() {
        let d = "A compact tour of the borrow checker";
        assert_eq!(generate_summary(d), d);
    }

    #[test]
    fn long_descriptions_are_cut_at_a_word_boundary() {
        let d = "word ".repeat(50);
        let s = generate_summary(&d);
        assert!(s.ends_with("..."));
        assert!(s.chars().count() <= SUMMARY_MAX);
        // No clipped word right before the ellipsis.
        assert!(s.trim_end_matches("...").ends_with("word"));
    }

    #[test]
    fn unbroken_text_is_cut_hard() {
        let d = "x".repeat(300);
        let s = generate_summary(&d);
        assert_eq!(s.chars().count(), SUMMARY_MAX);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn validation_bounds() {
        assert!(validate_topic("long enough description", "Summary", "Ann").is_ok());
        assert!(matches!(
            validate_topic("short", "Summary", "Ann"),
            Err(BoardError::InvalidField {
                field: "description",
                ..
            })
        ));
        assert!(matches!(
            validate_topic("long enough description", "abc", "Ann"),
            Err(BoardError::InvalidField { field: "summary", .. })
        ));
        let oversized = "s".repeat(SUMMARY_MAX + 1);
        assert!(matches!(
            validate_topic("long enough description", &oversized, "Ann"),
            Err(BoardError::InvalidField { field: "summary", .. })
        ));
        assert!(matches!(
            validate_topic("long enough description", "Summary", "Al"),
            Err(BoardError::InvalidField { field: "author", .. })
        ));
    }
}
