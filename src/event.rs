use serde::{Deserialize, Serialize};

use crate::types::{PostId, UserId};

/// Fact published by this service about the lifecycle of its posts.
///
/// Serialized as a flat JSON object tagged by `event`, e.g.
/// `{"event":"PostLiked","post_id":1,"user_id":2}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PostFact {
    PostCreated {
        post_id: PostId,
        author_id: UserId,
        title: String,
    },
    PostUpdated {
        post_id: PostId,
        author_id: UserId,
    },
    PostDeleted {
        post_id: PostId,
        author_id: UserId,
    },
    PostLiked {
        post_id: PostId,
        user_id: UserId,
    },
    PostUnliked {
        post_id: PostId,
        user_id: UserId,
    },
}

impl PostFact {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PostCreated { .. } => "PostCreated",
            Self::PostUpdated { .. } => "PostUpdated",
            Self::PostDeleted { .. } => "PostDeleted",
            Self::PostLiked { .. } => "PostLiked",
            Self::PostUnliked { .. } => "PostUnliked",
        }
    }

    pub fn post_id(&self) -> PostId {
        match self {
            Self::PostCreated { post_id, .. }
            | Self::PostUpdated { post_id, .. }
            | Self::PostDeleted { post_id, .. }
            | Self::PostLiked { post_id, .. }
            | Self::PostUnliked { post_id, .. } => *post_id,
        }
    }
}

/// Fact produced by another service and applied by the relay consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IncomingFact {
    CommentCreated {
        post_id: PostId,
    },
    CommentDeleted {
        post_id: PostId,
    },
    ProfileUpdated {
        user_id: UserId,
        username: String,
        avatar_url: String,
    },
}

impl IncomingFact {
    /// Decodes a raw message body.
    ///
    /// # Errors
    ///
    /// Will return an `Err` if the payload is not a fact envelope, names an unknown kind, or lacks
    /// the identifier its kind requires.
    pub fn decode(payload: &[u8]) -> Result<Self, FactError> {
        serde_json::from_slice::<FactEnvelope>(payload)?.try_into()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommentCreated { .. } => "CommentCreated",
            Self::CommentDeleted { .. } => "CommentDeleted",
            Self::ProfileUpdated { .. } => "ProfileUpdated",
        }
    }
}

/// Wire shape shared by every incoming fact. Fields a kind does not use are absent or zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactEnvelope {
    pub event: String,
    #[serde(default)]
    pub post_id: PostId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl TryFrom<FactEnvelope> for IncomingFact {
    type Error = FactError;

    fn try_from(envelope: FactEnvelope) -> Result<Self, Self::Error> {
        match envelope.event.as_str() {
            "CommentCreated" if envelope.post_id != 0 => Ok(Self::CommentCreated {
                post_id: envelope.post_id,
            }),
            "CommentDeleted" if envelope.post_id != 0 => Ok(Self::CommentDeleted {
                post_id: envelope.post_id,
            }),
            "ProfileUpdated" if envelope.user_id != 0 => Ok(Self::ProfileUpdated {
                user_id: envelope.user_id,
                username: envelope.username,
                avatar_url: envelope.avatar_url,
            }),
            "CommentCreated" | "CommentDeleted" => Err(FactError::MissingField {
                event: envelope.event,
                field: "post_id",
            }),
            "ProfileUpdated" => Err(FactError::MissingField {
                event: envelope.event,
                field: "user_id",
            }),
            _ => Err(FactError::UnknownKind(envelope.event)),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FactError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unknown fact kind `{0}`")]
    UnknownKind(String),
    #[error("`{event}` fact without `{field}`")]
    MissingField { event: String, field: &'static str },
}
