// src/models/source.rs

//! Registry of upstream notice sites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// An upstream site that publishes notices.
///
/// The display strings are the on-disk identifiers; renaming one is a data
/// migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    /// Dean's office (dean.xjtu.edu.cn)
    #[serde(rename = "教务处")]
    Jwc,

    /// Graduate school (gs.xjtu.edu.cn)
    #[serde(rename = "研究生院")]
    Gs,

    /// School of software engineering (se.xjtu.edu.cn)
    #[serde(rename = "软件学院")]
    Se,
}

impl Source {
    /// Every registered source, in display order.
    pub const ALL: [Source; 3] = [Source::Jwc, Source::Gs, Source::Se];

    /// The stable display string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Jwc => "教务处",
            Source::Gs => "研究生院",
            Source::Se => "软件学院",
        }
    }

    /// Landing page the UI opens in a browser.
    pub fn landing_url(&self) -> &'static str {
        match self {
            Source::Jwc => "https://dean.xjtu.edu.cn/jxxx/jxtz2.htm",
            Source::Gs => "https://gs.xjtu.edu.cn/tzgg.htm",
            Source::Se => "https://se.xjtu.edu.cn/xwgg/tzgg.htm",
        }
    }

    /// Look up a source by its display string.
    pub fn from_display(value: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| AppError::UnknownSource(value.to_string()))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_display(s)
    }
}
