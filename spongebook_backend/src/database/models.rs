use serde::{Deserialize, Serialize};

/// A directed "follower follows followee" row. `mutual` marks an accepted
/// friendship and must be mirrored by the reverse row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecord {
    pub id: i64,
    pub follower: String,
    pub followee: String,
    pub mutual: bool,
    pub not_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFriendRecord {
    pub follower: String,
    pub followee: String,
    pub mutual: bool,
    pub not_read: bool,
    pub created_at: String,
}

impl NewFriendRecord {
    /// A fresh one-way follow awaiting the followee's answer.
    pub fn request(follower: &str, followee: &str) -> Self {
        Self {
            follower: follower.to_string(),
            followee: followee.to_string(),
            mutual: false,
            not_read: true,
            created_at: crate::utils::now_utc_iso(),
        }
    }

    /// The reverse row written when a request is accepted.
    pub fn accepted(follower: &str, followee: &str) -> Self {
        Self {
            mutual: true,
            not_read: false,
            ..Self::request(follower, followee)
        }
    }
}

/// Partial update of a friend row; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct FriendUpdate {
    pub mutual: Option<bool>,
    pub not_read: Option<bool>,
}

/// Conjunctive filter over friend rows. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct FriendFilter {
    pub follower: Option<String>,
    pub followee: Option<String>,
    pub mutual: Option<bool>,
    pub not_read: Option<bool>,
}

impl FriendFilter {
    /// Accepted friends of `user`, seen from the followee side.
    pub fn friends_of(user: &str) -> Self {
        Self {
            followee: Some(user.to_string()),
            mutual: Some(true),
            ..Self::default()
        }
    }

    pub fn followers_of(user: &str) -> Self {
        Self {
            followee: Some(user.to_string()),
            mutual: Some(false),
            ..Self::default()
        }
    }

    pub fn pending_for(user: &str) -> Self {
        Self {
            followee: Some(user.to_string()),
            not_read: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    /// Stored verbatim; unknown values resolve to private on read.
    pub visibility: String,
    pub unlisted: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author: Option<String>,
    pub visibility: Option<String>,
    pub unlisted: Option<bool>,
}
