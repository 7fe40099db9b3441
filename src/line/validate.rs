//! Syntactic smoke test for line-protocol records.
//!
//! This is not a grammar check. It catches lines missing a measurement or a
//! field set, and accepts everything the record builder can produce.

use crate::error::InvalidLine;

/// Check one line for the `measurement[,tags] fields [timestamp]` shape.
pub fn is_valid(line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return false;
    }

    let measurement = parts[0]
        .split_once(',')
        .map_or(parts[0], |(measurement, _)| measurement);
    if measurement.is_empty() {
        return false;
    }

    let last = parts[parts.len() - 1];
    let field_part = if parts.len() > 2 && is_timestamp(last) {
        parts[1..parts.len() - 1].join(" ")
    } else {
        parts[1].to_string()
    };

    field_part.contains('=')
}

fn is_timestamp(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Every line of a batch that fails [`is_valid`], with 1-based positions.
pub fn invalid_lines<S: AsRef<str>>(lines: &[S]) -> Vec<InvalidLine> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let line: &str = line.as_ref();
            (!is_valid(line)).then(|| InvalidLine {
                position: i + 1,
                line: line.to_string(),
            })
        })
        .collect()
}
