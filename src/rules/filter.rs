// src/rules/filter.rs

//! Single-predicate notification filters.
//!
//! The `class` discriminator and operand keys are the persisted format:
//!
//! ```json
//! { "class": "TitleIncludeFilter", "title": "选课" }
//! { "class": "TagExcludeFilter", "tag": "讲座" }
//! ```
//!
//! Title checks are literal substring tests (no case folding). An empty title
//! operand is contained in every title. Tag checks are exact set membership,
//! so an empty tag operand matches no real tag.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::Notification;

/// A boolean predicate over one notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Filter {
    /// Title contains the operand
    #[serde(rename = "TitleIncludeFilter")]
    TitleContains { title: String },

    /// Title does not contain the operand
    #[serde(rename = "TitleExcludeFilter")]
    TitleExcludes { title: String },

    /// Tags include the operand
    #[serde(rename = "TagIncludeFilter")]
    TagContains { tag: String },

    /// Tags do not include the operand
    #[serde(rename = "TagExcludeFilter")]
    TagExcludes { tag: String },
}

impl Filter {
    pub fn title_contains(title: impl Into<String>) -> Self {
        Self::TitleContains {
            title: title.into(),
        }
    }

    pub fn title_excludes(title: impl Into<String>) -> Self {
        Self::TitleExcludes {
            title: title.into(),
        }
    }

    pub fn tag_contains(tag: impl Into<String>) -> Self {
        Self::TagContains { tag: tag.into() }
    }

    pub fn tag_excludes(tag: impl Into<String>) -> Self {
        Self::TagExcludes { tag: tag.into() }
    }

    /// Evaluate the predicate.
    pub fn eval(&self, notification: &Notification) -> bool {
        match self {
            Filter::TitleContains { title } => notification.title.contains(title.as_str()),
            Filter::TitleExcludes { title } => !notification.title.contains(title.as_str()),
            Filter::TagContains { tag } => notification.has_tag(tag),
            Filter::TagExcludes { tag } => !notification.has_tag(tag),
        }
    }

    /// The persisted class name.
    pub fn class_name(&self) -> &'static str {
        match self {
            Filter::TitleContains { .. } => "TitleIncludeFilter",
            Filter::TitleExcludes { .. } => "TitleExcludeFilter",
            Filter::TagContains { .. } => "TagIncludeFilter",
            Filter::TagExcludes { .. } => "TagExcludeFilter",
        }
    }

    pub fn operand(&self) -> &str {
        match self {
            Filter::TitleContains { title } | Filter::TitleExcludes { title } => title,
            Filter::TagContains { tag } | Filter::TagExcludes { tag } => tag,
        }
    }

    pub fn dump(&self) -> Value {
        match self {
            Filter::TitleContains { title } | Filter::TitleExcludes { title } => {
                serde_json::json!({ "class": self.class_name(), "title": title })
            }
            Filter::TagContains { tag } | Filter::TagExcludes { tag } => {
                serde_json::json!({ "class": self.class_name(), "tag": tag })
            }
        }
    }

    /// Decode a filter blob; unknown classes or missing operands fail.
    pub fn load(value: &Value) -> Result<Self> {
        Ok(Filter::deserialize(value)?)
    }

    /// One-line description for display, e.g. `标题包含 选课`.
    pub fn describe(&self) -> String {
        match self {
            Filter::TitleContains { title } => format!("标题包含 {title}"),
            Filter::TitleExcludes { title } => format!("标题不包含 {title}"),
            Filter::TagContains { tag } => format!("标签包含 {tag}"),
            Filter::TagExcludes { tag } => format!("标签不包含 {tag}"),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
