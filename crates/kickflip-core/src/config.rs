//! Tunables for the comment subsystem.

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::pagination::MAX_LIMIT;

/// What happens to the replies of a reply when that reply is deleted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrphanPolicy {
    /// Only the targeted reply is removed. Its children stay in storage with a
    /// dangling `parent_id` and are hidden by the thread orderer.
    #[default]
    Keep,
    /// The targeted reply and every transitive descendant are removed.
    Cascade,
}

/// Comment subsystem configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CommentConfig {
    /// Page size used when a request does not specify one.
    #[cfg_attr(
        feature = "config",
        arg(long = "comments-page-size", env = "COMMENTS_PAGE_SIZE", default_value = "20")
    )]
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Maximum accepted comment length in characters.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "comments-max-length",
            env = "COMMENTS_MAX_LENGTH",
            default_value = "1000"
        )
    )]
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Deepest reply chain rendered by the thread orderer.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "comments-max-depth",
            env = "COMMENTS_MAX_DEPTH",
            default_value = "256"
        )
    )]
    #[serde(default = "default_max_depth")]
    pub max_thread_depth: usize,

    /// Deletion semantics for replies that have replies of their own.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "comments-orphan-policy",
            env = "COMMENTS_ORPHAN_POLICY",
            value_enum,
            default_value = "keep"
        )
    )]
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

fn default_page_size() -> i64 {
    20
}

fn default_max_content_length() -> usize {
    1000
}

fn default_max_depth() -> usize {
    256
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_content_length: default_max_content_length(),
            max_thread_depth: default_max_depth(),
            orphan_policy: OrphanPolicy::default(),
        }
    }
}

impl CommentConfig {
    /// Sets the orphan policy.
    pub fn with_orphan_policy(mut self, orphan_policy: OrphanPolicy) -> Self {
        self.orphan_policy = orphan_policy;
        self
    }

    /// Sets the maximum thread depth.
    pub fn with_max_thread_depth(mut self, depth: usize) -> Self {
        self.max_thread_depth = depth;
        self
    }

    /// Resolves a requested page size against the configured default and the
    /// global upper bound.
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        let config = CommentConfig::default();
        assert_eq!(config.page_size(None), 20);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(5000)), MAX_LIMIT);
    }

    #[test]
    fn orphan_policy_parses_snake_case() {
        assert_eq!("cascade".parse::<OrphanPolicy>().ok(), Some(OrphanPolicy::Cascade));
        assert_eq!(OrphanPolicy::Keep.to_string(), "keep");
    }
}
