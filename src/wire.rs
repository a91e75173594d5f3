//! Wire formats for both links
//!
//! Serial side: newline-delimited UTF-8 text. A line starting with `#`
//! carries a fixed-arity vector of decimal floats; anything else is target
//! log output and passes through to the operator untouched. Frames written
//! back to the target are `\r`-terminated.
//!
//! UDP side: headerless datagrams of little-endian IEEE-754 doubles. Size is
//! the only framing and validation mechanism, so a wrong-sized datagram
//! means the channel has desynced.

use crate::error::{Error, Result};
use crate::exchange::Sample;

/// Reassembles newline-delimited lines from raw serial chunks.
///
/// Bytes accumulate until a `\n` closes a line; a single chunk may close
/// several lines and they are all drained in order. Decoding is best-effort
/// UTF-8, so malformed byte sequences are replaced rather than rejected.
pub struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        LineAssembler { buffer: Vec::new() }
    }

    /// Append a chunk and pull out every complete line it closes.
    ///
    /// Returned lines exclude the `\n` terminator but are otherwise verbatim.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line[..pos]).into_owned());
        }
        lines
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// One classified line from the target
#[derive(Debug)]
pub enum TargetLine {
    /// `#`-prefixed data frame, decoded
    Data(Sample),
    /// Anything else: passthrough log output for the operator
    Log(String),
}

/// Classify a target line and decode data frames.
///
/// A `#` line must carry exactly `arity` parseable floats; a count mismatch
/// or an unparsable token is a protocol violation, reported with the
/// offending line so the desync can be diagnosed.
pub fn classify_line(line: &str, arity: usize) -> Result<TargetLine> {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('#') else {
        return Ok(TargetLine::Log(line.to_string()));
    };

    let mut values: Sample = Vec::with_capacity(arity);
    for token in rest.split_whitespace() {
        let value: f64 = token.parse().map_err(|_| {
            Error::Protocol(format!(
                "could not parse HIL frame from target: {:?}",
                trimmed
            ))
        })?;
        values.push(value);
    }

    if values.len() != arity {
        return Err(Error::Protocol(format!(
            "size mismatch in HIL frame from target: {:?}, expected {}, actual was {}",
            trimmed,
            arity,
            values.len()
        )));
    }

    Ok(TargetLine::Data(values))
}

/// Format a downlink sample as a `#`-framed, `\r`-terminated line.
///
/// Values use Rust's shortest round-trip rendering, which always carries
/// enough digits to reconstruct the exact `f64` from the text.
pub fn format_data_frame(sample: &Sample) -> String {
    let mut frame = String::from("#");
    for (i, value) in sample.iter().enumerate() {
        if i > 0 {
            frame.push(' ');
        }
        frame.push_str(&value.to_string());
    }
    frame.push('\r');
    frame
}

/// Format an operator command for the target, or `None` if it lacks the
/// forwarding sigil.
///
/// Only lines starting with `>` reach the target; the sigil is part of the
/// target's shell syntax and is kept. Everything else is dropped by the
/// caller.
pub fn format_command_frame(command: &str) -> Option<String> {
    let trimmed = command.trim();
    if trimmed.starts_with('>') {
        Some(format!("{}\r", trimmed))
    } else {
        None
    }
}

/// Decode a host datagram into a sample of `arity` doubles.
///
/// The datagram must be exactly `8 * arity` bytes; any other size is a
/// protocol violation under the strict policy (the channel cannot recover a
/// synchronized view once arity desyncs).
pub fn decode_datagram(data: &[u8], arity: usize) -> Result<Sample> {
    if data.len() != 8 * arity {
        return Err(Error::Protocol(format!(
            "wrong data size from host: {} bytes, expected {}",
            data.len(),
            8 * arity
        )));
    }

    Ok(data
        .chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect())
}

/// Encode a sample as a headerless little-endian datagram payload.
pub fn encode_datagram(sample: &Sample) -> Vec<u8> {
    let mut payload = Vec::with_capacity(8 * sample.len());
    for value in sample {
        payload.extend_from_slice(&value.to_le_bytes());
    }
    payload
}
