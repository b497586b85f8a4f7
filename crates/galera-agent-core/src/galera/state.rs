//! `grastate.dat` codec
//!
//! The engine persists its cluster state as `key: value` lines:
//!
//! ```text
//! # GALERA saved state
//! version: 2.1
//! uuid:    9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a
//! seqno:   -1
//! safe_to_bootstrap: 0
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const HEADER: &str = "# GALERA saved state";

const KEY_VERSION: &str = "version";
const KEY_UUID: &str = "uuid";
const KEY_SEQNO: &str = "seqno";
const KEY_SAFE_TO_BOOTSTRAP: &str = "safe_to_bootstrap";

/// Persisted cluster state of this node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStateRecord {
    #[serde(rename = "formatVersion")]
    pub format_version: String,
    #[serde(rename = "clusterUUID")]
    pub cluster_uuid: String,
    /// Last applied position; `-1` while the engine runs or after an unclean stop
    #[serde(rename = "sequenceNumber")]
    pub sequence_number: i64,
    #[serde(rename = "safeToBootstrap")]
    pub safe_to_bootstrap: bool,
}

impl ClusterStateRecord {
    /// Render the record in `grastate.dat` format.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if a text field would not survive a
    /// [`decode`](Self::decode): control characters such as line breaks, or
    /// leading/trailing whitespace.
    pub fn encode(&self) -> Result<Vec<u8>> {
        check_text(KEY_VERSION, &self.format_version)?;
        check_text(KEY_UUID, &self.cluster_uuid)?;
        Ok(format!(
            "{HEADER}\n\
             {KEY_VERSION}: {}\n\
             {KEY_UUID}: {}\n\
             {KEY_SEQNO}: {}\n\
             {KEY_SAFE_TO_BOOTSTRAP}: {}\n",
            self.format_version,
            self.cluster_uuid,
            self.sequence_number,
            u8::from(self.safe_to_bootstrap),
        )
        .into_bytes())
    }

    /// Parse a `grastate.dat` file.
    ///
    /// Blank lines and `#` comments are skipped and unknown keys are ignored,
    /// but all four known fields must be present.
    ///
    /// # Errors
    /// Returns [`Error::Format`] on a malformed line, an unparsable value or
    /// a missing field.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::format(format!("galera state is not valid UTF-8: {e}")))?;

        let mut version = None;
        let mut uuid = None;
        let mut seqno = None;
        let mut safe_to_bootstrap = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = trimmed
                .split_once(':')
                .ok_or_else(|| Error::format(format!("invalid galera state line: '{line}'")))?;
            let value = value.trim();

            match key.trim() {
                KEY_VERSION => {
                    check_text(KEY_VERSION, value)?;
                    version = Some(value.to_string());
                }
                KEY_UUID => {
                    check_text(KEY_UUID, value)?;
                    uuid = Some(value.to_string());
                }
                KEY_SEQNO => {
                    let parsed = value
                        .parse::<i64>()
                        .map_err(|e| Error::format(format!("error parsing seqno '{value}': {e}")))?;
                    seqno = Some(parsed);
                }
                KEY_SAFE_TO_BOOTSTRAP => {
                    let parsed = parse_int_bool(value).map_err(|e| {
                        Error::format(format!("error parsing safe_to_bootstrap: {e}"))
                    })?;
                    safe_to_bootstrap = Some(parsed);
                }
                _ => {}
            }
        }

        Ok(Self {
            format_version: version.ok_or_else(|| missing(KEY_VERSION))?,
            cluster_uuid: uuid.ok_or_else(|| missing(KEY_UUID))?,
            sequence_number: seqno.ok_or_else(|| missing(KEY_SEQNO))?,
            safe_to_bootstrap: safe_to_bootstrap.ok_or_else(|| missing(KEY_SAFE_TO_BOOTSTRAP))?,
        })
    }
}

fn check_text(key: &str, value: &str) -> Result<()> {
    if value.chars().any(char::is_control) {
        return Err(Error::format(format!(
            "galera state '{key}' contains control characters: {value:?}"
        )));
    }
    if value.trim() != value {
        return Err(Error::format(format!(
            "galera state '{key}' has surrounding whitespace: {value:?}"
        )));
    }
    Ok(())
}

fn missing(key: &str) -> Error {
    Error::format(format!("galera state is missing '{key}'"))
}

fn parse_int_bool(value: &str) -> std::result::Result<bool, String> {
    match value.parse::<i64>() {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        Ok(other) => Err(format!("invalid integer bool: {other}")),
        Err(e) => Err(format!("error parsing integer bool '{value}': {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE_GRASTATE: &str = "# GALERA saved state
version: 2.1
uuid:    9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a
seqno:   -1
safe_to_bootstrap: 0
";

    fn record() -> ClusterStateRecord {
        ClusterStateRecord {
            format_version: "2.1".into(),
            cluster_uuid: "9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a".into(),
            sequence_number: 42,
            safe_to_bootstrap: true,
        }
    }

    #[test]
    fn test_decode_engine_file() {
        let state = ClusterStateRecord::decode(ENGINE_GRASTATE.as_bytes()).unwrap();
        assert_eq!(state.format_version, "2.1");
        assert_eq!(state.cluster_uuid, "9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a");
        assert_eq!(state.sequence_number, -1);
        assert!(!state.safe_to_bootstrap);
    }

    #[test]
    fn test_encode_format() {
        let text = String::from_utf8(record().encode().unwrap()).unwrap();
        assert_eq!(
            text,
            "# GALERA saved state
version: 2.1
uuid: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a
seqno: 42
safe_to_bootstrap: 1
"
        );
    }

    #[test]
    fn test_round_trip() {
        for (seqno, safe) in [(0, false), (42, true), (-1, false), (i64::MAX, true)] {
            let state = ClusterStateRecord {
                sequence_number: seqno,
                safe_to_bootstrap: safe,
                ..record()
            };
            assert_eq!(ClusterStateRecord::decode(&state.encode().unwrap()).unwrap(), state);
        }
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let text = "version: 2.1\nuuid: abc\nseqno: 1\nsafe_to_bootstrap: 1\nfuture_key: value\n";
        let state = ClusterStateRecord::decode(text.as_bytes()).unwrap();
        assert_eq!(state.cluster_uuid, "abc");
    }

    #[test]
    fn test_decode_missing_fields() {
        let full = [
            "version: 2.1",
            "uuid: abc",
            "seqno: 1",
            "safe_to_bootstrap: 0",
        ];
        for skip in 0..full.len() {
            let text: Vec<&str> = full
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, line)| *line)
                .collect();
            let err = ClusterStateRecord::decode(text.join("\n").as_bytes()).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "skip {skip}: {err}");
        }
    }

    #[test]
    fn test_decode_invalid_values() {
        let cases = [
            ("non numeric seqno", "version: 2.1\nuuid: abc\nseqno: foo\nsafe_to_bootstrap: 0"),
            ("non numeric bool", "version: 2.1\nuuid: abc\nseqno: 1\nsafe_to_bootstrap: yes"),
            ("out of range bool", "version: 2.1\nuuid: abc\nseqno: 1\nsafe_to_bootstrap: 2"),
            ("line without colon", "version: 2.1\nuuid abc\nseqno: 1\nsafe_to_bootstrap: 0"),
        ];
        for (name, text) in cases {
            let err = ClusterStateRecord::decode(text.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "{name}: {err}");
        }
    }

    #[test]
    fn test_encode_rejects_unsafe_text() {
        for uuid in ["abc\ngarbage", "abc\r", " abc", "abc ", "a\tb"] {
            let state = ClusterStateRecord {
                cluster_uuid: uuid.into(),
                ..record()
            };
            assert!(matches!(state.encode(), Err(Error::Format(_))), "{uuid:?}");
        }
        let state = ClusterStateRecord {
            format_version: "2.1\nseqno: 7".into(),
            ..record()
        };
        assert!(matches!(state.encode(), Err(Error::Format(_))));
    }

    #[test]
    fn test_decode_rejects_control_characters() {
        let text = "version: 2.1\nuuid: abc\rdef\nseqno: 1\nsafe_to_bootstrap: 0\n";
        let err = ClusterStateRecord::decode(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Format(_)), "{err}");
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["formatVersion"], "2.1");
        assert_eq!(json["clusterUUID"], "9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a");
        assert_eq!(json["sequenceNumber"], 42);
        assert_eq!(json["safeToBootstrap"], true);
    }
}
