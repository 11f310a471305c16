//! Text canonicalization applied before any target-vs-spoken comparison.
//!
//! The comparison service aligns words positionally, so both sides of a
//! comparison must be canonical: same case, no stray punctuation, single
//! spaces. [`normalize`] is applied to the target text, the transcript,
//! and every word inside the timestamp list — the comparator never sees
//! un-normalized input.

use crate::api::WordTimestamp;

/// Punctuation stripped during normalization.
///
/// Matches the set the scoring flow has always removed; notably it keeps
/// apostrophes so contractions ("don't") survive as single words.
const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')',
];

/// Canonicalize `text` for comparison.
///
/// Lower-cases, strips the fixed punctuation set, collapses whitespace
/// runs to a single space, and trims. Idempotent:
/// `normalize(&normalize(x)) == normalize(x)` for all `x`.
///
/// # Example
///
/// ```
/// use lexiscreen::normalize::normalize;
///
/// assert_eq!(normalize("The  cat, sat!"), "the cat sat");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered.chars().filter(|c| !PUNCTUATION.contains(c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize the `word` field of every timestamp in place.
///
/// Timing values pass through untouched — they come from the
/// transcription service and are never computed locally.
pub fn normalize_timestamps(timestamps: &mut [WordTimestamp]) {
    for ts in timestamps {
        ts.word = normalize(&ts.word);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases() {
        assert_eq!(normalize("The Cat SAT"), "the cat sat");
    }

    #[test]
    fn strips_punctuation_set() {
        assert_eq!(normalize("cat, hat. (sun)!"), "cat hat sun");
        assert_eq!(normalize("a-b_c;d:e#f"), "abcdef");
    }

    #[test]
    fn keeps_apostrophes() {
        assert_eq!(normalize("Don't stop"), "don't stop");
    }

    #[test]
    fn collapses_space_runs() {
        assert_eq!(normalize("the   cat    sat"), "the cat sat");
    }

    #[test]
    fn trims_ends() {
        assert_eq!(normalize("  the cat sat  "), "the cat sat");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize(".,!"), "");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "The quick, brown fox!",
            "  spaced   out  ",
            "already clean",
            "MIXED-case_input (yes)",
            "",
        ];
        for x in inputs {
            let once = normalize(x);
            assert_eq!(normalize(&once), once, "not idempotent for {x:?}");
        }
    }

    #[test]
    fn timestamps_words_are_normalized_in_place() {
        let mut ts = vec![
            WordTimestamp {
                word: "The".into(),
                start: 0.5,
                end: 0.8,
            },
            WordTimestamp {
                word: "cat,".into(),
                start: 1.0,
                end: 1.3,
            },
        ];
        normalize_timestamps(&mut ts);
        assert_eq!(ts[0].word, "the");
        assert_eq!(ts[1].word, "cat");
        // Timing untouched
        assert!((ts[0].start - 0.5).abs() < f64::EPSILON);
        assert!((ts[1].end - 1.3).abs() < f64::EPSILON);
    }
}
