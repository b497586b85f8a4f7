//! Replication positions: the seed a caller bootstraps from and the position
//! the engine reports when started in recovery mode.

use super::gtid::Gtid;
use crate::error::{Error, Result};
#[cfg(feature = "agent")]
use regex::Regex;
use serde::{Deserialize, Serialize};
#[cfg(feature = "agent")]
use std::sync::LazyLock;

/// Position a node is told to bootstrap a cluster from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapSeed {
    #[serde(rename = "clusterUUID")]
    pub cluster_uuid: String,
    #[serde(rename = "sequenceNumber")]
    pub sequence_number: i64,
}

impl BootstrapSeed {
    /// Create a new seed
    #[must_use]
    pub fn new(cluster_uuid: impl Into<String>, sequence_number: i64) -> Self {
        Self {
            cluster_uuid: cluster_uuid.into(),
            sequence_number,
        }
    }

    /// Check the seed before anything is locked or written.
    ///
    /// The UUID ends up as a `grastate.dat` value, so it must be a single
    /// bare token: no whitespace, control characters or `:`.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for an empty or malformed UUID or a
    /// negative sequence number.
    pub fn validate(&self) -> Result<()> {
        let uuid = &self.cluster_uuid;
        if uuid.is_empty() {
            return Err(Error::validation("clusterUUID must not be empty"));
        }
        if uuid
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == ':')
        {
            return Err(Error::validation(format!(
                "clusterUUID must not contain whitespace, control characters or ':', got {uuid:?}"
            )));
        }
        if self.sequence_number < 0 {
            return Err(Error::validation(format!(
                "sequenceNumber must not be negative, got {}",
                self.sequence_number
            )));
        }
        Ok(())
    }
}

/// Last durable position reported by the engine in recovery mode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredPosition {
    #[serde(rename = "clusterUUID")]
    pub cluster_uuid: String,
    #[serde(rename = "sequenceNumber")]
    pub sequence_number: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gtid: Option<Gtid>,
}

impl From<RecoveredPosition> for BootstrapSeed {
    fn from(position: RecoveredPosition) -> Self {
        Self {
            cluster_uuid: position.cluster_uuid,
            sequence_number: position.sequence_number,
        }
    }
}

/// Extracts a recovered position from the engine's recovery log.
///
/// The log format depends on the engine version, so the orchestrator takes
/// the parser as a capability.
pub trait PositionParser: Send + Sync {
    /// Parse the log contents.
    ///
    /// Returns `Ok(None)` while the log holds no position yet, so the caller
    /// keeps polling.
    ///
    /// # Errors
    /// Returns [`Error::Format`] if a position is present but malformed.
    fn parse(&self, log: &[u8]) -> Result<Option<RecoveredPosition>>;
}

/// Parser for the `WSREP: Recovered position:` line written by MariaDB.
///
/// ```text
/// 2024-05-02 10:41:07 0 [Note] WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:17
/// 2024-05-02 10:41:07 0 [Note] WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:17,0-1-16
/// ```
///
/// The engine appends to the log on every run; the last position wins.
#[cfg(feature = "agent")]
#[derive(Clone, Copy, Debug, Default)]
pub struct WsrepPositionParser;

#[cfg(feature = "agent")]
static RECOVERED_POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"WSREP: Recovered position:\s*(\S*)").expect("recovered position pattern")
});

#[cfg(feature = "agent")]
impl WsrepPositionParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn parse_position(raw: &str) -> Result<RecoveredPosition> {
        let (uuid, rest) = raw
            .split_once(':')
            .ok_or_else(|| Error::format(format!("invalid recovered position: '{raw}'")))?;
        if uuid.is_empty() {
            return Err(Error::format(format!(
                "recovered position has no cluster uuid: '{raw}'"
            )));
        }

        let (seqno, gtid) = match rest.split_once(',') {
            Some((seqno, gtid)) => (seqno, Some(gtid.parse::<Gtid>()?)),
            None => (rest, None),
        };
        let sequence_number = seqno.parse::<i64>().map_err(|e| {
            Error::format(format!("invalid seqno in recovered position '{raw}': {e}"))
        })?;

        Ok(RecoveredPosition {
            cluster_uuid: uuid.to_string(),
            sequence_number,
            gtid,
        })
    }
}

#[cfg(feature = "agent")]
impl PositionParser for WsrepPositionParser {
    fn parse(&self, log: &[u8]) -> Result<Option<RecoveredPosition>> {
        let text = String::from_utf8_lossy(log);
        let captures = text
            .lines()
            .rev()
            .find_map(|l| RECOVERED_POSITION.captures(l));
        let Some(captures) = captures else {
            return Ok(None);
        };
        let raw = captures.get(1).map_or("", |m| m.as_str());
        Self::parse_position(raw).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "agent")]
    // Captured from MariaDB 10.11 started with wsrep_recover=ON
    const RECOVERY_LOG: &str = "\
2024-05-02 10:41:06 0 [Note] Starting MariaDB 10.11.7-MariaDB-1:10.11.7+maria~ubu2204 source revision 87e13722a95af5d9378d990caf48cb6874439347 as process 1
2024-05-02 10:41:06 0 [Note] InnoDB: Compressed tables use zlib 1.2.11
2024-05-02 10:41:06 0 [Note] InnoDB: Number of transaction pools: 1
2024-05-02 10:41:07 0 [Note] InnoDB: Completed initialization of buffer pool
2024-05-02 10:41:07 0 [Note] InnoDB: 128 rollback segments are active.
2024-05-02 10:41:07 0 [Note] InnoDB: log sequence number 46981; transaction id 14
2024-05-02 10:41:07 0 [Note] Plugin 'FEEDBACK' is disabled.
2024-05-02 10:41:07 0 [Note] Server socket created on IP: '0.0.0.0'.
2024-05-02 10:41:07 0 [Note] WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:17
";

    #[cfg(feature = "agent")]
    // MariaDB 11.x appends the last GTID
    const RECOVERY_LOG_GTID: &str = "\
2024-06-11 08:02:13 0 [Note] InnoDB: Buffer pool(s) load completed at 240611  8:02:13
2024-06-11 08:02:13 0 [Note] WSREP: Recovered position: 4c0f4a49-27d9-11ef-8c0e-5f3f1c0bd2aa:5,0-10-4
";

    #[cfg(feature = "agent")]
    fn parse(log: &str) -> Result<Option<RecoveredPosition>> {
        WsrepPositionParser::new().parse(log.as_bytes())
    }

    #[test]
    #[cfg(feature = "agent")]
    fn test_parse_recovered_position() {
        let position = parse(RECOVERY_LOG).unwrap().unwrap();
        assert_eq!(position.cluster_uuid, "9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a");
        assert_eq!(position.sequence_number, 17);
        assert_eq!(position.gtid, None);
    }

    #[test]
    #[cfg(feature = "agent")]
    fn test_parse_recovered_position_with_gtid() {
        let position = parse(RECOVERY_LOG_GTID).unwrap().unwrap();
        assert_eq!(position.cluster_uuid, "4c0f4a49-27d9-11ef-8c0e-5f3f1c0bd2aa");
        assert_eq!(position.sequence_number, 5);
        assert_eq!(position.gtid, Some("0-10-4".parse().unwrap()));
    }

    #[test]
    #[cfg(feature = "agent")]
    fn test_last_position_wins() {
        let log = format!(
            "{RECOVERY_LOG}2024-05-02 10:52:30 0 [Note] WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:23\n"
        );
        let position = parse(&log).unwrap().unwrap();
        assert_eq!(position.sequence_number, 23);
    }

    #[test]
    #[cfg(feature = "agent")]
    fn test_undefined_position() {
        let log = "2024-05-02 10:41:07 0 [Note] WSREP: Recovered position: 00000000-0000-0000-0000-000000000000:-1\n";
        let position = parse(log).unwrap().unwrap();
        assert_eq!(position.sequence_number, -1);
    }

    #[test]
    #[cfg(feature = "agent")]
    fn test_no_position_yet() {
        let log = RECOVERY_LOG.lines().take(4).collect::<Vec<_>>().join("\n");
        assert_eq!(parse(&log).unwrap(), None);
        assert_eq!(parse("").unwrap(), None);
    }

    #[test]
    #[cfg(feature = "agent")]
    fn test_malformed_position() {
        let cases = [
            "WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a",
            "WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:abc",
            "WSREP: Recovered position: :17",
            "WSREP: Recovered position: 9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a:17,0-1",
            "WSREP: Recovered position:",
        ];
        for log in cases {
            assert!(matches!(parse(log), Err(Error::Format(_))), "{log}");
        }
    }

    #[test]
    fn test_seed_validation() {
        assert!(BootstrapSeed::new("abc", 5).validate().is_ok());
        assert!(BootstrapSeed::new("abc", 0).validate().is_ok());
        assert!(matches!(
            BootstrapSeed::new("", 5).validate(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            BootstrapSeed::new("abc", -1).validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_seed_uuid_must_be_one_token() {
        assert!(
            BootstrapSeed::new("9a1b0b2c-14f9-11ee-9ec7-c7d2b1a11f8a", 42)
                .validate()
                .is_ok()
        );
        let cases = [
            "abc\ngarbage",
            "abc\r\nseqno: 9",
            "  abc  ",
            "abc ",
            "\tabc",
            "a bc",
            "abc:5",
            "abc\u{0}",
            " ",
        ];
        for uuid in cases {
            assert!(
                matches!(BootstrapSeed::new(uuid, 5).validate(), Err(Error::Validation(_))),
                "{uuid:?}"
            );
        }
    }

    #[test]
    fn test_seed_json() {
        let seed: BootstrapSeed =
            serde_json::from_str(r#"{"clusterUUID":"abc","sequenceNumber":5}"#).unwrap();
        assert_eq!(seed, BootstrapSeed::new("abc", 5));

        let position = RecoveredPosition {
            cluster_uuid: "abc".into(),
            sequence_number: 5,
            gtid: None,
        };
        let json = serde_json::to_value(&position).unwrap();
        assert_eq!(json, serde_json::json!({"clusterUUID": "abc", "sequenceNumber": 5}));
        assert_eq!(BootstrapSeed::from(position), seed);
    }
}
