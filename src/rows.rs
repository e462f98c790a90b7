//! Row assembly from word tokens.
//!
//! Tesseract numbers every word with the block, paragraph and line it belongs
//! to. Words that share all three indices are one table row; within a row
//! they are laid out left to right by horizontal center.

use std::collections::BTreeMap;

use crate::types::WordToken;

/// Group tokens by `(block, paragraph, line)`, rows ascending by that key,
/// words ascending by `x_center`. Ties keep engine order.
pub fn group_by_line(words: &[WordToken]) -> Vec<Vec<WordToken>> {
    let mut grouped: BTreeMap<(u32, u32, u32), Vec<WordToken>> = BTreeMap::new();
    for w in words {
        grouped.entry(w.line_key()).or_default().push(w.clone());
    }
    grouped
        .into_values()
        .map(|mut row| {
            row.sort_by_key(|w| w.x_center);
            row
        })
        .collect()
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Row text as fed to field extraction.
pub fn row_text(row: &[WordToken]) -> String {
    let joined = row
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn token(text: &str, left: i32, key: (u32, u32, u32)) -> WordToken {
        WordToken {
            text: text.to_string(),
            confidence: 90.0,
            left,
            top: 10,
            width: 20,
            height: 12,
            x_center: left + 10,
            y_center: 16,
            block_id: key.0,
            paragraph_id: key.1,
            line_id: key.2,
            word_index: 1,
        }
    }

    #[test]
    fn groups_by_line_and_orders_rows_by_key() {
        let words = vec![
            token("b", 0, (2, 1, 1)),
            token("a2", 50, (1, 1, 2)),
            token("a1", 0, (1, 1, 1)),
        ];
        let rows = group_by_line(&words);
        let texts: Vec<Vec<&str>> = rows
            .iter()
            .map(|r| r.iter().map(|w| w.text.as_str()).collect())
            .collect();
        assert_eq!(texts, vec![vec!["a1"], vec!["a2"], vec!["b"]]);
    }

    #[test]
    fn sorts_words_left_to_right() {
        let words = vec![
            token("right", 200, (1, 1, 1)),
            token("left", 0, (1, 1, 1)),
            token("middle", 100, (1, 1, 1)),
        ];
        let rows = group_by_line(&words);
        assert_eq!(rows.len(), 1);
        assert_eq!(row_text(&rows[0]), "left middle right");
    }

    #[test]
    fn equal_centers_keep_engine_order() {
        let words = vec![token("first", 5, (1, 1, 1)), token("second", 5, (1, 1, 1))];
        let rows = group_by_line(&words);
        assert_eq!(row_text(&rows[0]), "first second");
    }

    #[test]
    fn empty_input_gives_no_rows() {
        assert!(group_by_line(&[]).is_empty());
    }

    #[test]
    fn normalize_collapses_and_trims() {
        assert_eq!(normalize_text("  слой \t 042\n\nверсия  "), "слой 042 версия");
        assert_eq!(normalize_text("   "), "");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once.clone());
            prop_assert!(!once.starts_with(' ') && !once.ends_with(' '));
            prop_assert!(!once.contains("  "));
        }

        #[test]
        fn grouping_is_deterministic(
            specs in proptest::collection::vec((0u32..3, 0u32..2, 0u32..3, -50i32..500), 0..40)
        ) {
            let words: Vec<WordToken> = specs
                .iter()
                .enumerate()
                .map(|(i, &(b, p, l, left))| token(&format!("w{i}"), left, (b, p, l)))
                .collect();
            let first = group_by_line(&words);
            let second = group_by_line(&words);
            prop_assert_eq!(&first, &second);
            let total: usize = first.iter().map(|r| r.len()).sum();
            prop_assert_eq!(total, words.len());
            for row in &first {
                prop_assert!(row.windows(2).all(|p| p[0].x_center <= p[1].x_center));
                prop_assert!(row.iter().all(|w| w.line_key() == row[0].line_key()));
            }
            prop_assert!(first.windows(2).all(|p| p[0][0].line_key() < p[1][0].line_key()));
        }
    }
}
