use std::{collections::BTreeMap, time::Duration};

use whakaaro_core::{OracleError, OracleEstimate};

fn malformed(line: usize, reason: impl Into<String>) -> OracleError {
    OracleError::MalformedOutput {
        line,
        reason: reason.into(),
    }
}

/// Parses the oracle's standard output.
///
/// Blank lines are ignored. A vertex listed twice keeps its last opinion.
///
/// # Errors
/// Returns [`OracleError::MalformedOutput`] when the elapsed time is missing
/// or not a non-negative number, or when an opinion line is not a
/// `vertex opinion` pair.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use whakaaro_providers_walk::parse_oracle_output;
///
/// let estimate = parse_oracle_output("0.5\n3 0.25\n7 0.75\n")?;
/// assert_eq!(estimate.elapsed, Duration::from_millis(500));
/// assert_eq!(estimate.opinions.get(&7), Some(&0.75));
/// # Ok::<(), whakaaro_core::OracleError>(())
/// ```
pub fn parse_oracle_output(stdout: &str) -> Result<OracleEstimate, OracleError> {
    let mut lines = stdout
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty());

    let Some((line, seconds)) = lines.next() else {
        return Err(malformed(1, "missing elapsed time"));
    };
    let elapsed = seconds
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| malformed(line, format!("expected elapsed seconds, found `{seconds}`")))?;

    let mut opinions = BTreeMap::new();
    for (line, text) in lines {
        let mut parts = text.split_whitespace();
        let (Some(vertex), Some(opinion), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed(line, format!("expected `vertex opinion`, found `{text}`")));
        };
        let vertex = vertex
            .parse::<usize>()
            .map_err(|_| malformed(line, format!("invalid vertex `{vertex}`")))?;
        let opinion = opinion
            .parse::<f64>()
            .map_err(|_| malformed(line, format!("invalid opinion `{opinion}`")))?;
        opinions.insert(vertex, opinion);
    }
    Ok(OracleEstimate { opinions, elapsed })
}
