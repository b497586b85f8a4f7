//! MariaDB global transaction identifier.
//!
//! See <https://mariadb.com/kb/en/gtid/>

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `domain-server-seqno`, serialized as its text form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gtid {
    pub domain_id: u32,
    pub server_id: u32,
    pub sequence_number: u64,
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.domain_id, self.server_id, self.sequence_number
        )
    }
}

impl FromStr for Gtid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        let [domain, server, seqno] = parts.as_slice() else {
            return Err(Error::format(format!("invalid gtid: {s}")));
        };
        Ok(Self {
            domain_id: domain
                .parse()
                .map_err(|e| Error::format(format!("invalid domain id in gtid '{s}': {e}")))?,
            server_id: server
                .parse()
                .map_err(|e| Error::format(format!("invalid server id in gtid '{s}': {e}")))?,
            sequence_number: seqno
                .parse()
                .map_err(|e| Error::format(format!("invalid seqno in gtid '{s}': {e}")))?,
        })
    }
}

impl TryFrom<String> for Gtid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Gtid> for String {
    fn from(gtid: Gtid) -> Self {
        gtid.to_string()
    }
}
