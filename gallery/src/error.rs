use alloc::string::String;

use crate::ItemKey;

/// Why a content source could not provide the children of a group.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The source has nothing for this group (yet).
    #[error("content for group {group} is unavailable")]
    Unavailable { group: ItemKey },
    #[error("fetching group {group} failed: {message}")]
    Failed { group: ItemKey, message: String },
}

impl FetchError {
    pub fn failed(group: ItemKey, message: impl Into<String>) -> Self {
        Self::Failed {
            group,
            message: message.into(),
        }
    }

    /// Key of the group the fetch was for.
    pub fn group(&self) -> ItemKey {
        match self {
            Self::Unavailable { group } | Self::Failed { group, .. } => *group,
        }
    }
}
