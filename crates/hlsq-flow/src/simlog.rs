//! Simulation log parsing
//!
//! C-simulation and RTL-cosimulation runs write one line per sample holding
//! that sample's per-class scores, separated by whitespace. Lines that do not
//! hold exactly one numeric score per class are reported and excluded; the
//! scan always covers the whole log.

use crate::error::Result;
use hlsq_models::argmax;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Log line that could not be turned into a prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line: usize,
    /// What was wrong with it
    pub reason: String,
}

impl fmt::Display for MalformedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

/// Parsed simulation log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimLog {
    /// One slot per line; `None` where the line was malformed
    predictions: Vec<Option<usize>>,
    malformed: Vec<MalformedLine>,
}

impl SimLog {
    /// Parse log text against the expected class count
    pub fn parse(text: &str, num_classes: usize) -> Self {
        let mut log = Self::default();
        for (index, line) in text.lines().enumerate() {
            match parse_line(line, num_classes) {
                Ok(class) => log.predictions.push(Some(class)),
                Err(reason) => {
                    let malformed = MalformedLine {
                        line: index + 1,
                        reason,
                    };
                    warn!("Ignoring simulation log {malformed}");
                    log.predictions.push(None);
                    log.malformed.push(malformed);
                }
            }
        }
        log
    }

    /// Read and parse a log file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read.
    pub fn from_file(path: &Path, num_classes: usize) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text, num_classes))
    }

    /// Predicted classes of the well-formed lines, in order
    pub fn predictions(&self) -> Vec<usize> {
        self.predictions.iter().flatten().copied().collect()
    }

    /// Prediction per line, `None` for malformed lines
    pub fn by_line(&self) -> &[Option<usize>] {
        &self.predictions
    }

    /// Lines that were excluded
    pub fn malformed(&self) -> &[MalformedLine] {
        &self.malformed
    }

    /// Number of lines scanned
    pub fn line_count(&self) -> usize {
        self.predictions.len()
    }
}

fn parse_line(line: &str, num_classes: usize) -> std::result::Result<usize, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != num_classes {
        return Err(format!(
            "found {} output numbers but expected {num_classes}",
            tokens.len()
        ));
    }
    let scores = tokens
        .iter()
        .map(|t| {
            t.parse::<f32>()
                .map_err(|_| format!("'{t}' is not a number"))
        })
        .collect::<std::result::Result<Vec<f32>, String>>()?;
    argmax(&scores).ok_or_else(|| "no comparable score".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let log = SimLog::parse("0.1 0.7 0.2\n0.9 0.05 0.05\n0.2 0.2 0.6\n", 3);
        assert_eq!(log.predictions(), [1, 0, 2]);
        assert!(log.malformed().is_empty());
    }

    #[test]
    fn test_malformed_line_is_reported_and_scan_continues() {
        let log = SimLog::parse("0.1 0.7 0.2\n0.9 0.1\n0.2 0.2 0.6\n", 3);
        assert_eq!(log.predictions(), [1, 2]);
        assert_eq!(log.by_line(), [Some(1), None, Some(2)]);
        assert_eq!(log.malformed().len(), 1);
        assert_eq!(log.malformed()[0].line, 2);
        assert!(log.malformed()[0].reason.contains("found 2"));
    }

    #[test]
    fn test_non_numeric_and_blank_lines() {
        let log = SimLog::parse("0.1 abc 0.2\n\n1 0 0\n", 3);
        assert_eq!(log.predictions(), [0]);
        assert_eq!(log.line_count(), 3);
        let lines: Vec<usize> = log.malformed().iter().map(|m| m.line).collect();
        assert_eq!(lines, [1, 2]);
    }

    #[test]
    fn test_extra_whitespace_is_tolerated() {
        let log = SimLog::parse("  0.1\t0.2   0.9  \n", 3);
        assert_eq!(log.predictions(), [2]);
    }
}
