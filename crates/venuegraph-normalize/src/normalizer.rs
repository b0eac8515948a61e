//! Venue normalizer: raw venue string → canonical graph identifier.

use std::borrow::Cow;

use crate::abbreviation::{extract_abbreviation, MIN_ABBREVIATION_LEN};
use crate::cache::AbbreviationCache;
use crate::patterns::{patterns, strip_dates, DateGuard};

/// Cleaned phrases equal to one of these are not usable tokens.
pub const WEEKDAY_ABBREVIATIONS: &[&str] = &["mon", "tue", "thu", "wed", "fri", "sat", "sun"];

/// Placeholder venues produced by upstream metadata, compared case-insensitively.
pub const SENTINEL_VENUES: &[&str] = &[
    "n/a", "na", "none", "", "null", "otherdata", "nodata", "unknown", "author", "crossref", "arxiv",
];

/// Result of normalizing one venue string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VenueToken {
    /// Nothing usable survived cleaning.
    Unusable,
    /// The cleaned lowercase phrase.
    Phrase(String),
    /// A cached or freshly validated abbreviation.
    Abbreviation(String),
}

impl VenueToken {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VenueToken::Unusable => None,
            VenueToken::Phrase(s) | VenueToken::Abbreviation(s) => Some(s),
        }
    }

    pub fn is_abbreviation(&self) -> bool {
        matches!(self, VenueToken::Abbreviation(_))
    }

    /// `(token, is_abbreviation)`.
    pub fn into_parts(self) -> (Option<String>, bool) {
        match self {
            VenueToken::Unusable => (None, false),
            VenueToken::Phrase(s) => (Some(s), false),
            VenueToken::Abbreviation(s) => (Some(s), true),
        }
    }
}

/// Clean a raw venue string down to lowercase words.
///
/// Strips parenthesized content, symbols, dates, ordinals, month names and
/// filler words. Returns `None` when the result is empty, shorter than three
/// characters, or a weekday abbreviation.
pub fn clean_phrase(raw: &str) -> Option<String> {
    let p = patterns();

    let s = p.parenthesized.replace_all(raw, "");
    let lowered = p.non_whitelisted.replace_all(&s, " ").to_lowercase();

    let s = strip_dates(&p.date, lowered.trim(), DateGuard::Primary);
    let s = strip_dates(&p.date_fallback, &s, DateGuard::Fallback);

    let s = p.ordinal_day.replace_all(&s, "");
    let s = p.non_letter.replace_all(&s, "");

    let s = p.month_words.replace_all(s.trim(), "");
    let s = p.word_ordinals.replace_all(&s, "");
    let s = p.filler_words.replace_all(&s, "");

    let s = p.spaces.replace_all(&s, " ");
    let cleaned = s.trim();

    if cleaned.chars().count() < MIN_ABBREVIATION_LEN || WEEKDAY_ABBREVIATIONS.contains(&cleaned)
    {
        return None;
    }
    Some(cleaned.to_string())
}

/// Normalizes venue strings, learning abbreviations as it goes.
///
/// Takes `&self` everywhere: the cache is a concurrent map, so a normalizer
/// can be shared by reference between threads.
#[derive(Debug, Default)]
pub struct VenueNormalizer {
    cache: AbbreviationCache,
}

impl VenueNormalizer {
    pub fn new(cache: AbbreviationCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &AbbreviationCache {
        &self.cache
    }

    pub fn into_cache(self) -> AbbreviationCache {
        self.cache
    }

    /// Normalize a venue string.
    ///
    /// With `get_abbrv = false` the cleaned phrase is returned as is. Otherwise
    /// a cached abbreviation wins; on a miss an abbreviation is extracted from
    /// `raw`, cached and returned, falling back to the cleaned phrase.
    pub fn preprocess(&self, raw: &str, get_abbrv: bool) -> VenueToken {
        let Some(cleaned) = clean_phrase(raw) else {
            return VenueToken::Unusable;
        };

        if !get_abbrv {
            return VenueToken::Phrase(cleaned);
        }

        if let Some(abbreviation) = self.cache.get(&cleaned) {
            return VenueToken::Abbreviation(abbreviation);
        }

        match extract_abbreviation(raw, &cleaned) {
            Some(abbreviation) => {
                tracing::debug!(phrase = %cleaned, abbreviation = %abbreviation, "learned abbreviation");
                VenueToken::Abbreviation(self.cache.insert_if_absent(cleaned, abbreviation))
            }
            None => VenueToken::Phrase(cleaned),
        }
    }

    /// [`preprocess`](Self::preprocess) for venue fields of bibliographic
    /// records: drops Roman numerals (a lone `IV` is kept) and rejects
    /// placeholder values such as `N/A` or `arXiv`.
    pub fn preprocess_venue(&self, venue: &str, get_abbrv: bool) -> VenueToken {
        let venue: Cow<'_, str> = if venue == "IV" {
            Cow::Borrowed(venue)
        } else {
            patterns().roman_numeral.replace_all(venue, "")
        };

        let key = venue.trim().to_lowercase();
        if SENTINEL_VENUES.contains(&key.as_str()) {
            return VenueToken::Unusable;
        }

        self.preprocess(&venue, get_abbrv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_and_year_are_removed() {
        assert_eq!(
            clean_phrase("3rd International Conference on Machine Learning (ICML) 2020").as_deref(),
            Some("international conference on machine learning")
        );
    }

    #[test]
    fn dates_volumes_and_ordinals_are_removed() {
        assert_eq!(
            clean_phrase("Proceedings of the 21st Annual Meeting, May 5-7, 2019, Volume 2")
                .as_deref(),
            Some("proceedings of the annual meeting")
        );
        assert_eq!(
            clean_phrase("Twelfth Workshop on Parsing").as_deref(),
            Some("workshop on parsing")
        );
    }

    #[test]
    fn weekday_and_short_leftovers_are_unusable() {
        // "day" is filler, leaving the weekday abbreviation.
        assert_eq!(clean_phrase("Monday"), None);
        assert_eq!(clean_phrase("AI"), None);
        assert_eq!(clean_phrase("(ICML)"), None);
        assert_eq!(clean_phrase("   "), None);
    }

    #[test]
    fn token_parts() {
        assert_eq!(VenueToken::Unusable.into_parts(), (None, false));
        assert_eq!(
            VenueToken::Abbreviation("icml".into()).into_parts(),
            (Some("icml".into()), true)
        );
        assert_eq!(VenueToken::Phrase("a b c".into()).as_str(), Some("a b c"));
    }
}
