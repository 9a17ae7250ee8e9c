use crate::items::ItemId;

/// Failures produced while tokenizing or validating a query.
///
/// `position` is the zero-based index of the offending whitespace-delimited
/// word, so a UI can underline it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown token '{word}' at position {position}")]
    UnknownToken { word: String, position: usize },

    #[error("invalid tag name '{name}' at position {position}")]
    InvalidTagName { name: String, position: usize },

    #[error("malformed query at position {position}: {message}")]
    MalformedQuery { message: String, position: usize },
}

impl QueryError {
    pub fn malformed(message: impl Into<String>, position: usize) -> Self {
        Self::MalformedQuery {
            message: message.into(),
            position,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::UnknownToken { position, .. }
            | Self::InvalidTagName { position, .. }
            | Self::MalformedQuery { position, .. } => *position,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("tag name can only contain letters, numbers, underscores, and hyphens: '{0}'")]
    Invalid(String),

    #[error("tag name is reserved for view membership: '{0}'")]
    Reserved(String),

    #[error(transparent)]
    Items(#[from] ItemError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("duplicate item id: {0}")]
    Duplicate(ItemId),

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ViewError {
    #[error("view name must be non-empty and at most {0} characters")]
    InvalidName(usize),

    #[error("duplicate view name: {0}")]
    DuplicateName(String),

    #[error("view not found: {0}")]
    NotFound(String),

    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// Two views (or a new view and existing item data) share one membership
    /// tag. Never expected with generated ids; treated as fatal.
    #[error("membership tag {tag} is already in use (view {view})")]
    MembershipTagCollision { tag: String, view: String },

    #[error(transparent)]
    Items(#[from] ItemError),

    #[error("storage error: {0}")]
    Storage(String),
}
