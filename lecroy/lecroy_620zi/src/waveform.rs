//! Waveform data and parsing of the `INSPECT?` replies.

use benchrs::{InstrumentError, InstrumentInterface};

/// A waveform as read from one channel of the oscilloscope.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Time of each sample in seconds, relative to the trigger.
    pub time: Vec<f64>,
    /// Voltage of each sample in volts.
    pub voltage: Vec<f64>,
}

impl Waveform {
    /// Build the time axis from the sample interval and the time of the first sample.
    pub(crate) fn from_samples(voltage: Vec<f64>, interval: f64, offset: f64) -> Self {
        let time = (0..voltage.len())
            .map(|i| offset + i as f64 * interval)
            .collect();
        Waveform { time, voltage }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.voltage.len()
    }

    /// Check if the waveform has no samples.
    pub fn is_empty(&self) -> bool {
        self.voltage.is_empty()
    }
}

/// Read a quoted, possibly multi-line `INSPECT?` reply.
///
/// The first line is the reply to the query. Further lines are read until the closing quote.
pub(crate) fn read_quoted_block<T: InstrumentInterface>(
    intf: &mut T,
    first: String,
) -> Result<String, InstrumentError> {
    let mut block = first;
    while block.matches('"').count() < 2 {
        let line = intf.read_until_terminator()?;
        block.push('\n');
        block.push_str(&line);
    }
    Ok(block)
}

/// Parse the samples of an `INSPECT? SIMPLE` block.
pub(crate) fn parse_simple(block: &str) -> Result<Vec<f64>, InstrumentError> {
    block
        .trim_matches(|c: char| c == '"' || c.is_whitespace())
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| InstrumentError::ResponseParseError(v.to_string()))
        })
        .collect()
}

/// Parse the value of a single `INSPECT?` variable, e.g. `"HORIZ_INTERVAL : 1.0e-10 "`.
pub(crate) fn parse_variable(resp: &str) -> Result<f64, InstrumentError> {
    resp.trim_matches(|c: char| c == '"' || c.is_whitespace())
        .split_once(':')
        .and_then(|(_, v)| v.trim().parse::<f64>().ok())
        .ok_or_else(|| InstrumentError::ResponseParseError(resp.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let block = "\"  1.0e-3 -2.5e-3\n  4.0e-3 \n\"";
        assert_eq!(parse_simple(block).unwrap(), vec![1.0e-3, -2.5e-3, 4.0e-3]);
        assert!(parse_simple("\" 1.0 abc \"").is_err());
    }

    #[test]
    fn test_parse_variable() {
        let resp = "\"HORIZ_INTERVAL     : 2.0000e-10          \"";
        assert_eq!(parse_variable(resp).unwrap(), 2.0e-10);
        assert!(parse_variable("\"HORIZ_INTERVAL\"").is_err());
    }

    #[test]
    fn test_from_samples() {
        let wf = Waveform::from_samples(vec![0.1, 0.2, 0.3], 0.5, -1.0);
        assert_eq!(wf.time, vec![-1.0, -0.5, 0.0]);
        assert_eq!(wf.len(), 3);
        assert!(!wf.is_empty());
    }
}
