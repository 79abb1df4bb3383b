use crate::types::{EulerAngles, Orientation, Sample};
use glam::Quat;
use teapot_config::SampleMode;
use thiserror::Error;

/// Quaternion tags, in (w, x, y, z) order.
const QUAT_TAGS: [char; 4] = ['w', 'a', 'b', 'c'];

/// Euler tags. The sender puts roll after `y` and yaw after `r`; this is not a
/// typo and must stay as-is to talk to existing firmware.
const ROLL_TAG: char = 'y';
const PITCH_TAG: char = 'p';
const YAW_TAG: char = 'r';

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("tag '{0}' not present in line")]
    MissingTag(char),
    #[error("no number after tag '{tag}' (found {token:?})")]
    InvalidNumber { tag: char, token: String },
}

/// Parse one line in the given mode.
///
/// Never fails: a malformed line yields `Sample::Fallback` with the identity
/// quaternion (or zero angles) so a single bad record cannot stall rendering.
pub fn parse_sample(line: &str, mode: SampleMode) -> Sample {
    let parsed = match mode {
        SampleMode::Quaternion => parse_quaternion(line).map(Orientation::Quaternion),
        SampleMode::Euler => parse_euler(line).map(Orientation::Euler),
    };

    match parsed {
        Ok(orientation) => Sample::Parsed(orientation),
        Err(e) => {
            tracing::debug!(%e, line, "Malformed sample, using fallback");
            Sample::Fallback(fallback(mode))
        }
    }
}

/// Neutral value substituted for a malformed line.
pub fn fallback(mode: SampleMode) -> Orientation {
    match mode {
        SampleMode::Quaternion => Orientation::Quaternion(Quat::IDENTITY),
        SampleMode::Euler => Orientation::Euler(EulerAngles::ZERO),
    }
}

/// Extract `w`, `a`, `b`, `c` as (w, x, y, z).
pub fn parse_quaternion(line: &str) -> Result<Quat, ProtocolError> {
    let [w, x, y, z] = QUAT_TAGS.map(|tag| tagged_value(line, tag));
    Ok(Quat::from_xyzw(x?, y?, z?, w?))
}

/// Extract `y` → roll, `p` → pitch, `r` → yaw.
pub fn parse_euler(line: &str) -> Result<EulerAngles, ProtocolError> {
    let roll = tagged_value(line, ROLL_TAG)?;
    let pitch = tagged_value(line, PITCH_TAG)?;
    let yaw = tagged_value(line, YAW_TAG)?;
    Ok(EulerAngles { yaw, pitch, roll })
}

/// Finite number immediately following the first occurrence of `tag`.
fn tagged_value(line: &str, tag: char) -> Result<f32, ProtocolError> {
    let (_, rest) = line.split_once(tag).ok_or(ProtocolError::MissingTag(tag))?;
    // Out-of-range exponents parse as infinity.
    leading_float(rest)
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProtocolError::InvalidNumber {
            tag,
            token: rest.chars().take(16).collect(),
        })
}

/// Longest prefix of `text` that parses as a float.
fn leading_float(text: &str) -> Option<f32> {
    let run = text
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
        .map_or(text.len(), |(i, _)| i);

    // The run is ASCII, so every index is a char boundary.
    (1..=run)
        .rev()
        .find_map(|end| text[..end].parse::<f32>().ok())
}
