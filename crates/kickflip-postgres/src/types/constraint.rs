//! Comments table constraint violations.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Named constraints of the `comments` table.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(into = "String", try_from = "String")]
pub enum CommentConstraints {
    #[strum(serialize = "comments_content_not_empty")]
    ContentNotEmpty,
    #[strum(serialize = "comments_base_is_self")]
    BaseIsSelf,
    #[strum(serialize = "comments_reply_not_self")]
    ReplyNotSelf,
    #[strum(serialize = "comments_post_id_fkey")]
    PostExists,
}

impl CommentConstraints {
    /// Creates a new [`CommentConstraints`] from the constraint name.
    pub fn new(constraint: &str) -> Option<Self> {
        constraint.parse().ok()
    }

    /// Returns a message suitable for an API client.
    pub fn describe(self) -> &'static str {
        match self {
            Self::ContentNotEmpty => "comment content must not be empty",
            Self::BaseIsSelf => "a base comment must be the root of its own thread",
            Self::ReplyNotSelf => "a reply cannot be the root of its thread",
            Self::PostExists => "the post does not exist",
        }
    }
}

impl From<CommentConstraints> for String {
    #[inline]
    fn from(val: CommentConstraints) -> Self {
        val.to_string()
    }
}

impl TryFrom<String> for CommentConstraints {
    type Error = strum::ParseError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn constraint_names_round_trip() {
        for constraint in CommentConstraints::iter() {
            let name = constraint.to_string();
            assert_eq!(CommentConstraints::new(&name), Some(constraint));
        }

        assert_eq!(CommentConstraints::new("users_username_not_empty"), None);
    }
}
