use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// National market. Each market is an independent pipeline instance;
/// results are never pooled across markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Us,
    Kr,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Us => "us",
            Market::Kr => "kr",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Market::Us),
            "kr" => Ok(Market::Kr),
            other => Err(format!("unknown market '{other}' (expected 'us' or 'kr')")),
        }
    }
}
