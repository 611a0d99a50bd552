use crate::database::models::{FriendFilter, FriendRecord, FriendUpdate, NewFriendRecord};
use crate::database::repositories::FriendRepository;
use crate::database::Database;
use crate::error::{ServiceError, ServiceResult};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Owns the follow/friend rows and keeps the reciprocity of `mutual` intact.
/// Every mutation runs as one write transaction.
#[derive(Clone)]
pub struct FriendService {
    database: Database,
}

impl FriendService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Records `follower` following `followee` as a pending one-way request.
    pub fn follow(&self, follower: &str, followee: &str) -> ServiceResult<FriendView> {
        let follower = follower.trim();
        let followee = followee.trim();
        if follower.is_empty() || followee.is_empty() {
            return Err(ServiceError::Validation(
                "follower and followee are required".into(),
            ));
        }
        if follower == followee {
            return Err(ServiceError::Validation("self-follow not allowed".into()));
        }

        let record = self.database.with_write_transaction(|repos| {
            let friends = repos.friends();
            if friends.find(follower, followee)?.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "{follower} already follows {followee}"
                )));
            }
            Ok(friends.create(&NewFriendRecord::request(follower, followee))?)
        })?;

        tracing::info!(edge_id = record.id, %follower, %followee, "follow request created");
        Ok(FriendView::from_record(record))
    }

    /// Deletes the edge. A mutual edge first demotes its reverse edge to a
    /// one-way follow; both writes commit together or not at all.
    pub fn unfollow(&self, id: i64) -> ServiceResult<()> {
        let target = self
            .database
            .with_write_transaction(|repos| remove_edge(&repos.friends(), id))?;

        tracing::info!(
            edge_id = id,
            follower = %target.follower,
            followee = %target.followee,
            was_mutual = target.mutual,
            "follow removed"
        );
        Ok(())
    }

    /// The followee accepts the request stored as edge `id`: writes the
    /// reverse edge as mutual and marks the original mutual and read.
    pub fn accept(&self, id: i64) -> ServiceResult<FriendView> {
        let updated = self.database.with_write_transaction(|repos| {
            let friends = repos.friends();
            let target = friends.get(id)?.ok_or_else(|| edge_not_found(id))?;

            if friends.find(&target.followee, &target.follower)?.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "{} already follows {}; one side must unfollow before the request can be accepted",
                    target.followee, target.follower
                )));
            }
            friends.create(&NewFriendRecord::accepted(&target.followee, &target.follower))?;

            friends
                .update(
                    id,
                    &FriendUpdate {
                        mutual: Some(true),
                        not_read: Some(false),
                    },
                )?
                .ok_or_else(|| edge_not_found(id))
        })?;

        tracing::info!(
            edge_id = id,
            follower = %updated.follower,
            followee = %updated.followee,
            "friend request accepted"
        );
        Ok(FriendView::from_record(updated))
    }

    /// Marks the request read without establishing a friendship.
    pub fn reject(&self, id: i64) -> ServiceResult<FriendView> {
        let updated = self.database.with_write_transaction(|repos| {
            repos
                .friends()
                .update(
                    id,
                    &FriendUpdate {
                        not_read: Some(false),
                        ..Default::default()
                    },
                )?
                .ok_or_else(|| edge_not_found(id))
        })?;

        tracing::info!(edge_id = id, "friend request rejected");
        Ok(FriendView::from_record(updated))
    }

    pub fn get(&self, id: i64) -> ServiceResult<FriendView> {
        let record = self
            .database
            .with_repositories(|repos| repos.friends().get(id))?;
        record
            .map(FriendView::from_record)
            .ok_or_else(|| edge_not_found(id))
    }

    pub fn list_all(&self) -> ServiceResult<Vec<FriendView>> {
        self.list(FriendFilter::default())
    }

    pub fn friends_of(&self, user: &str) -> ServiceResult<Vec<FriendView>> {
        self.list(FriendFilter::friends_of(user))
    }

    pub fn followers_of(&self, user: &str) -> ServiceResult<Vec<FriendView>> {
        self.list(FriendFilter::followers_of(user))
    }

    pub fn pending_requests_of(&self, user: &str) -> ServiceResult<Vec<FriendView>> {
        self.list(FriendFilter::pending_for(user))
    }

    pub fn is_friend(&self, author: &str, viewer: &str) -> ServiceResult<bool> {
        Ok(self
            .database
            .with_repositories(|repos| is_friend(&repos.friends(), author, viewer))?)
    }

    fn list(&self, filter: FriendFilter) -> ServiceResult<Vec<FriendView>> {
        let records = self
            .database
            .with_repositories(|repos| repos.friends().query(&filter))?;
        Ok(records.into_iter().map(FriendView::from_record).collect())
    }
}

/// True iff `viewer` holds an accepted friendship edge towards `author`.
pub fn is_friend<R>(friends: &R, author: &str, viewer: &str) -> Result<bool>
where
    R: FriendRepository + ?Sized,
{
    Ok(friends
        .find(viewer, author)?
        .map(|edge| edge.mutual)
        .unwrap_or(false))
}

/// Demotes the reverse of a mutual edge, then deletes the edge. Callers run
/// this inside one write transaction.
fn remove_edge<R>(friends: &R, id: i64) -> ServiceResult<FriendRecord>
where
    R: FriendRepository + ?Sized,
{
    let target = friends.get(id)?.ok_or_else(|| edge_not_found(id))?;

    if target.mutual {
        match friends.find(&target.followee, &target.follower)? {
            Some(reverse) => {
                friends.update(
                    reverse.id,
                    &FriendUpdate {
                        mutual: Some(false),
                        ..Default::default()
                    },
                )?;
            }
            None => tracing::warn!(
                edge_id = id,
                follower = %target.follower,
                followee = %target.followee,
                "mutual edge has no reverse edge"
            ),
        }
    }

    if !friends.delete(id)? {
        return Err(edge_not_found(id));
    }
    Ok(target)
}

fn edge_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("friend request {id} not found"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendView {
    pub id: i64,
    pub follower: String,
    pub followee: String,
    pub mutual: bool,
    pub not_read: bool,
    pub created_at: String,
}

impl FriendView {
    fn from_record(record: FriendRecord) -> Self {
        Self {
            id: record.id,
            follower: record.follower,
            followee: record.followee,
            mutual: record.mutual,
            not_read: record.not_read,
            created_at: record.created_at,
        }
    }
}
