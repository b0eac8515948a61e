//! Acronym extraction from raw venue strings.
//!
//! A candidate comes either from parenthesized text (`... (ICML) 2020`) or
//! from a run of capitals after a hyphen (`Workshop on Data - XYZ`). It is
//! accepted only if it can be read off the initials of the cleaned phrase,
//! with a small tolerance for letters taken from inside words.

use regex::Regex;

use crate::patterns::patterns;

/// Candidates and phrases shorter than this are rejected.
pub const MIN_ABBREVIATION_LEN: usize = 3;

/// Try to extract an abbreviation for `cleaned` from the original string.
///
/// Returns `None` for "no abbreviation found"; that is a normal outcome and
/// the caller falls back to the cleaned phrase.
pub fn extract_abbreviation(original: &str, cleaned: &str) -> Option<String> {
    let p = patterns();

    let has_parens = original.contains('(') && original.contains(')');
    if !has_parens && !p.hyphen_capitals.is_match(original) {
        return None;
    }

    let mut phrase = cleaned.to_string();
    let candidate = match p.paren_content.captures(original) {
        Some(caps) => {
            let inner = caps.get(1).map_or("", |m| m.as_str());
            phrase = remove_word(&phrase, inner)?;
            if phrase.is_empty() || phrase.chars().count() < MIN_ABBREVIATION_LEN {
                // The parenthesized text was the full name, not an acronym.
                return None;
            }
            inner.to_string()
        }
        // `jem ) chem (`: both characters present but never as a pair.
        None => p.hyphen_capitals.captures(original)?.get(1)?.as_str().to_string(),
    };

    if candidate.chars().count() < MIN_ABBREVIATION_LEN {
        return None;
    }

    let candidate = normalize_candidate(&candidate);
    if candidate.chars().count() < MIN_ABBREVIATION_LEN {
        return None;
    }

    matches_initials(&candidate, &phrase).then_some(candidate)
}

/// Remove every whole-word, case-insensitive occurrence of `word` and
/// collapse the remaining whitespace.
fn remove_word(phrase: &str, word: &str) -> Option<String> {
    let p = patterns();
    let re = Regex::new(&format!(r"\b{}\b", regex::escape(&word.to_lowercase()))).ok()?;
    let removed = re.replace_all(phrase, "");
    Some(p.spaces.replace_all(&removed, " ").trim().to_string())
}

fn normalize_candidate(candidate: &str) -> String {
    let p = patterns();
    let lowered = candidate.to_lowercase();
    let letters = p.non_letter.replace_all(&lowered, "");
    p.spaces.replace_all(letters.trim(), " ").into_owned()
}

/// Initials scan.
///
/// Walks `candidate` letter by letter against the first letters of the words
/// of `phrase`:
/// - a letter found in the pool of first letters consumes that entry;
/// - otherwise, if the previous letter followed by this one occurs literally
///   in `phrase`, the letter is accepted as coming from inside a word;
/// - otherwise it is a mismatch, and the second mismatch rejects.
///
/// Accepting an in-word letter does not refund an earlier mismatch.
pub fn matches_initials(candidate: &str, phrase: &str) -> bool {
    let mut pool: Vec<char> = phrase.split(' ').filter_map(|w| w.chars().next()).collect();
    let mut prev: Option<char> = None;
    let mut mismatches = 0u8;

    for letter in candidate.chars() {
        if let Some(pos) = pool.iter().position(|&c| c == letter) {
            pool.remove(pos);
        } else if !prev.is_some_and(|p| contains_pair(phrase, p, letter)) {
            if mismatches == 1 {
                return false;
            }
            mismatches += 1;
        }
        prev = Some(letter);
    }
    true
}

fn contains_pair(haystack: &str, first: char, second: char) -> bool {
    let mut pair = String::with_capacity(8);
    pair.push(first);
    pair.push(second);
    haystack.contains(&pair)
}
