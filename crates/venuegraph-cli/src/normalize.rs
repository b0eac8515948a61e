//! `venuegraph normalize`: one venue string per line in, one JSON object per
//! line out.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{BufRead, Write};

use venuegraph_normalize::VenueNormalizer;

#[derive(Debug, Serialize)]
struct NormalizedLine<'a> {
    input: &'a str,
    token: Option<String>,
    is_abbreviation: bool,
}

/// Normalize every line of `input`, writing JSON lines to `out`. Returns the
/// number of lines processed.
pub fn normalize_lines<R: BufRead, W: Write>(
    normalizer: &VenueNormalizer,
    input: R,
    mut out: W,
    get_abbrv: bool,
) -> Result<usize> {
    let mut processed = 0;
    for line in input.lines() {
        let line = line.context("failed to read venue line")?;
        let (token, is_abbreviation) = normalizer.preprocess_venue(&line, get_abbrv).into_parts();
        let record = NormalizedLine {
            input: &line,
            token,
            is_abbreviation,
        };
        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
        processed += 1;
    }
    out.flush()?;
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_json_object_per_line() {
        let normalizer = VenueNormalizer::default();
        let input = "Neural Information Processing Systems (NeurIPS)\nN/A\nJournal of Things\n";
        let mut out = Vec::new();

        let n = normalize_lines(&normalizer, input.as_bytes(), &mut out, true).unwrap();
        assert_eq!(n, 3);

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["token"], serde_json::json!("neurips"));
        assert_eq!(lines[0]["is_abbreviation"], serde_json::json!(true));
        assert_eq!(lines[1]["token"], serde_json::Value::Null);
        assert_eq!(lines[2]["token"], serde_json::json!("journal of things"));
        assert_eq!(lines[2]["input"], serde_json::json!("Journal of Things"));
    }
}
