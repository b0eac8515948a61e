//! Compiled regexes for venue-string cleaning.
//!
//! Every pattern runs against text that has already been lowercased and had
//! non-whitelisted symbols (`-`, `/`, `~`, `'`, `:` ...) turned into spaces,
//! so the date patterns are written in lowercase. The `regex` crate has no
//! lookaround; the "not part of a decimal number" guards of the date
//! patterns are applied after matching by [`strip_dates`].

use regex::{Match, Regex};
use std::sync::OnceLock;

const MONTHS: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

const MONTHS_DOTTED: &str = r"jan\.?(?:uary)?|feb\.?(?:ruary)?|mar\.?(?:ch)?|apr\.?(?:il)?|may|jun\.?(?:e)?|jul\.?(?:y)?|aug\.?(?:ust)?|sept\.??(?:ember)?|oct\.?(?:ober)?|nov\.?(?:ember)?|dec\.?(?:ember)?";

/// Separator class of the short date forms. It literally contains `1`, `2`,
/// `,` and braces; keep it that way, tokens like `20 2` depend on it.
const DATE_SEP: &str = r"[.\-/\s\(\)\{\},12]";

const WORD_ORDINALS: &str = r"(?i)first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh|twelfth|thirteenth|fourteenth|fifteenth|sixteenth|seventeenth|eighteenth|nineteenth|twentieth";

const FILLER_WORDS: &str = r"(?i)day|invited talks|oral session|speech given|posters|volume|issue";

pub(crate) struct VenuePatterns {
    pub parenthesized: Regex,
    pub non_whitelisted: Regex,
    pub date: Regex,
    pub date_fallback: Regex,
    pub ordinal_day: Regex,
    pub non_letter: Regex,
    pub month_words: Regex,
    pub word_ordinals: Regex,
    pub filler_words: Regex,
    pub spaces: Regex,
    pub paren_content: Regex,
    pub hyphen_capitals: Regex,
    pub roman_numeral: Regex,
}

pub(crate) fn patterns() -> &'static VenuePatterns {
    static PATTERNS: OnceLock<VenuePatterns> = OnceLock::new();
    PATTERNS.get_or_init(VenuePatterns::compile)
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static venue pattern")
}

impl VenuePatterns {
    fn compile() -> Self {
        Self {
            parenthesized: compile(r"\([^)]*\)"),
            non_whitelisted: compile(r"[^\w\s\\.,]|_"),
            date: compile(&primary_date_pattern()),
            date_fallback: compile(&fallback_date_pattern()),
            ordinal_day: compile(r"\b\d{1,4}(?:st|nd|rd|n?th)\b"),
            non_letter: compile(r"[^a-z ]+"),
            month_words: compile(&format!(r"\b(?:{MONTHS})\b")),
            word_ordinals: compile(WORD_ORDINALS),
            filler_words: compile(FILLER_WORDS),
            spaces: compile(r" +"),
            paren_content: compile(r"\((.*?)\)"),
            hyphen_capitals: compile(r"-\s+([A-Z]+)\b"),
            roman_numeral: compile(r"\b(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})\b"),
        }
    }
}

/// Long forms (`5 may 2019`, `may 5, 2019`, `march 2020`) or short numeric
/// forms (`12.05.2020`, `3 12 jun 2021`).
fn primary_date_pattern() -> String {
    let prefix = r"(?:\b\d{1,4},? ?)";
    let month = format!(r"\b(?:{MONTHS})\b");
    let suffix = r"(?:(?:,? ?)?\d{1,4}(?:st|nd|rd|n?th)?\b(?:,? ?\d{2,4}[a-z]*)?(?: ?- ?\d{2,4}[a-z]*)?\b)";

    let long_optional_prefix = format!("(?:{prefix}?{month}{suffix})");
    let long_optional_suffix = format!("(?:{prefix}{month}{suffix}?)");

    let short = format!(
        r"(?:\b(?:(?:[0123]?[0-9](?:[.\-/~][0123]?[0-9])?{DATE_SEP})(?:[0123]?[0-9][.\-/][12][0-9]{{3}}|\b(?:{MONTHS})\b(?:{DATE_SEP}[12][0-9]{{3}})?)|[0123]?[0-9][.\-/][0123]?[0-9][.\-/][12]?[0-9]{{2,3}})\b)"
    );

    format!("(?:(?:{long_optional_prefix}|{long_optional_suffix})|{short})")
}

/// Day ranges the primary pattern misses: `12 th. - 14 th june 2019`,
/// `12 jun. . 14 jul`, `june 12 . 14`.
fn fallback_date_pattern() -> String {
    let ordinal = "(?:st|nd|rd|n?th)";
    format!(
        r"(?:\b[0123]?[0-9](?:{ordinal}?\s?(?:\b(?:{MONTHS_DOTTED}))?\s?[.\-/~]\s?)[0123]?[0-9]{ordinal}?{DATE_SEP}\s?(?:\b(?:{MONTHS_DOTTED})\s?(?:[1-3][0-9]{{3}})?\b)\b)|(?:\b(?:{MONTHS})\b\s[0123]?[0-9]\s?[.\-/~]\s?[0123]?[0-9])"
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DateGuard {
    /// Reject matches glued to a decimal (`1.` before or `.5` after).
    Primary,
    /// As `Primary`, and additionally reject matches starting with `d.`.
    Fallback,
}

/// Remove every match of `re` from `text`, except matches that sit inside a
/// decimal number according to `guard`.
pub(crate) fn strip_dates(re: &Regex, text: &str, guard: DateGuard) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in re.find_iter(text) {
        if touches_decimal(text, &m, guard) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

fn touches_decimal(text: &str, m: &Match<'_>, guard: DateGuard) -> bool {
    let mut before = text[..m.start()].chars().rev();
    let preceded = matches!(
        (before.next(), before.next()),
        (Some('.'), Some(d)) if d.is_ascii_digit()
    );

    let mut after = text[m.end()..].chars();
    let followed = matches!(
        (after.next(), after.next()),
        (Some('.'), Some(d)) if d.is_ascii_digit()
    );

    let opens = guard == DateGuard::Fallback && {
        let mut head = m.as_str().chars();
        matches!((head.next(), head.next()), (Some(d), Some('.')) if d.is_ascii_digit())
    };

    preceded || followed || opens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        let p = patterns();
        assert!(p.spaces.is_match("a  b"));
        assert!(p.date.is_match("may 5, 2019"));
    }

    #[test]
    fn long_dates_are_removed() {
        let p = patterns();
        let out = strip_dates(&p.date, "meeting 5 june 2019 in rome", DateGuard::Primary);
        assert!(!out.contains("june"), "got {out:?}");
        assert!(out.contains("meeting"));
        assert!(out.contains("rome"));
    }

    #[test]
    fn short_numeric_dates_are_removed() {
        let p = patterns();
        let out = strip_dates(&p.date, "workshop 12.05.2020", DateGuard::Primary);
        assert_eq!(out.trim(), "workshop");
    }

    #[test]
    fn decimal_neighbours_are_kept() {
        let p = patterns();
        let out = strip_dates(&p.date, "v1.12.05.2020", DateGuard::Primary);
        assert!(out.contains("12.05"), "got {out:?}");
    }

    #[test]
    fn fallback_removes_day_ranges_with_month_names() {
        let p = patterns();
        let out = strip_dates(
            &p.date_fallback,
            "summit june 12 . 14 berlin",
            DateGuard::Fallback,
        );
        assert!(!out.contains("june"), "got {out:?}");
        assert!(out.contains("berlin"));
    }

    #[test]
    fn roman_numerals_only_match_whole_tokens() {
        let p = patterns();
        assert_eq!(p.roman_numeral.replace_all("Part XIV of VLDB", ""), "Part  of VLDB");
    }
}
