//! Host command parsing.
//!
//! Two forms are accepted on one line:
//!
//! - JSON: `{"keepalive": ...}` or `{"actuator": "MIST_MAKER", "state": "ON"}`.
//!   A `keepalive` key wins over any other field.
//! - Legacy text: `MIST_MAKER_ON`, `MIST_MAKER_OFF`, `ALL_OFF`.
//!
//! Actuator names are exact and case-sensitive; the state is matched
//! ASCII case-insensitively.

use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::app::commands::{Actuator, HostCommand};
use crate::error::CommandError;

#[derive(Deserialize)]
struct WireCommand<'a> {
    #[serde(default)]
    keepalive: Option<IgnoredAny>,
    #[serde(default, borrow)]
    actuator: Option<&'a str>,
    #[serde(default, borrow)]
    state: Option<&'a str>,
}

/// Parse one framed line into a command.
pub fn parse_line(line: &str) -> Result<HostCommand, CommandError> {
    let line = line.trim();
    if line.starts_with('{') {
        parse_json(line)
    } else {
        parse_legacy(line)
    }
}

fn parse_json(line: &str) -> Result<HostCommand, CommandError> {
    let wire: WireCommand<'_> = serde_json::from_str(line).map_err(|_| CommandError::Malformed)?;

    if wire.keepalive.is_some() {
        return Ok(HostCommand::Keepalive);
    }
    let (Some(name), Some(state)) = (wire.actuator, wire.state) else {
        return Err(CommandError::MissingField);
    };
    let actuator = Actuator::from_name(name).ok_or(CommandError::UnknownActuator)?;
    Ok(HostCommand::SetActuator {
        actuator,
        on: parse_state(state)?,
    })
}

fn parse_legacy(line: &str) -> Result<HostCommand, CommandError> {
    if line == "ALL_OFF" {
        return Ok(HostCommand::AllOff);
    }
    let (name, on) = if let Some(name) = line.strip_suffix("_ON") {
        (name, true)
    } else if let Some(name) = line.strip_suffix("_OFF") {
        (name, false)
    } else {
        return Err(CommandError::Malformed);
    };
    let actuator = Actuator::from_name(name).ok_or(CommandError::UnknownActuator)?;
    Ok(HostCommand::SetActuator { actuator, on })
}

fn parse_state(state: &str) -> Result<bool, CommandError> {
    if state.eq_ignore_ascii_case("ON") {
        Ok(true)
    } else if state.eq_ignore_ascii_case("OFF") {
        Ok(false)
    } else {
        Err(CommandError::InvalidState)
    }
}
