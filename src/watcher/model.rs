use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A log line as shipped onto the queue.
///
/// `message` is kept as raw JSON text: the escaped string literal that wraps
/// the snapshot, quotes included.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub message: Box<RawValue>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One row of `docker ps --format json` for the server container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerSnapshot {
    pub command: String,
    pub created_at: String,
    #[serde(rename = "ID")]
    pub id: String,
    pub image: String,
    pub labels: String,
    pub local_volumes: String,
    pub mounts: String,
    pub names: String,
    pub networks: String,
    pub ports: String,
    pub running_for: String,
    pub size: String,
    pub state: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameStateEnvelope {
    pub data: Option<GameStateData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GameStateData {
    #[serde(alias = "serverGameState")]
    pub server_game_state: Option<GameStateSnapshot>,
}

/// Session state reported by the dedicated server's query API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameStateSnapshot {
    #[serde(alias = "activeSessionName")]
    pub active_session_name: String,
    #[serde(alias = "techTier")]
    pub tech_tier: i64,
    #[serde(alias = "totalGameDuration", with = "duration_text")]
    pub total_game_duration: Duration,
    #[serde(alias = "numConnectedPlayers")]
    pub num_connected_players: i64,
    #[serde(alias = "playerLimit")]
    pub player_limit: i64,
    #[serde(alias = "isGameRunning")]
    pub is_game_running: bool,
    #[serde(alias = "isGamePaused")]
    pub is_game_paused: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid duration {0:?}")]
pub struct ParseDurationError(String);

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Renders a duration the way Go's `time.Duration` prints itself
/// (`0s`, `250ms`, `1.5s`, `1m5s`, `2h0m0s`).
///
/// Downstream readers parse the stored value with `time.ParseDuration`, so the
/// shape must stay compatible with it.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", fraction(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", fraction(nanos, NANOS_PER_MILLI));
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = fraction(nanos % NANOS_PER_MIN, NANOS_PER_SEC);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, m) => format!("{m}m{seconds}s"),
        (h, m) => format!("{h}h{m}m{seconds}s"),
    }
}

/// `value / unit` in decimal, without trailing zeros in the fraction.
fn fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rest = value % unit;
    if rest == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{rest:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Parses the duration text accepted by Go's `time.ParseDuration`, negative
/// values excepted.
pub fn parse_duration(text: &str) -> Result<Duration, ParseDurationError> {
    let err = || ParseDurationError(text.to_string());
    let mut rest = text.strip_prefix('+').unwrap_or(text);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(err());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(err)?;
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let unit_nanos = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            _ => return Err(err()),
        };

        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let mut component = whole.checked_mul(unit_nanos).ok_or_else(err)?;
        let mut scale = unit_nanos;
        for digit in frac.chars() {
            scale /= 10;
            let digit = u128::from(digit.to_digit(10).ok_or_else(err)?);
            component = component
                .checked_add(digit * scale)
                .ok_or_else(err)?;
        }

        total = total.checked_add(component).ok_or_else(err)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| err())?;
    // Always below one billion
    let subsec = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, subsec))
}

/// Serde adapter: durations are written as text and read from either text or
/// a plain number of seconds, which is what the server API reports.
mod duration_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Seconds(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Seconds(seconds) => {
                Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
            }
            Repr::Text(text) => super::parse_duration(&text).map_err(D::Error::custom),
        }
    }
}
