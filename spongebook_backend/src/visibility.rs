//! Decides which posts a viewer may see.
//!
//! Authors always see their own posts. Everyone else is judged by the post's
//! declared visibility against the author's accepted friendships:
//!
//! * `PUBLIC` is visible to any signed-in viewer,
//! * `FRIENDS` needs an accepted friendship with the author,
//! * `FOAF` needs a shared accepted friend while *not* being a direct friend,
//! * `PRIVATE` and anything unrecognised is hidden.
//!
//! Anonymous viewers only ever see listed public posts.

use crate::database::models::{FriendFilter, PostRecord};
use crate::database::repositories::FriendRepository;
use crate::friends::is_friend;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Friends,
    Foaf,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Friends => "FRIENDS",
            Visibility::Foaf => "FOAF",
            Visibility::Private => "PRIVATE",
        }
    }

    /// Reads a stored value, treating anything unrecognised as private.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse().unwrap_or(Visibility::Private)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "PUBLIC" => Ok(Visibility::Public),
            "FRIENDS" => Ok(Visibility::Friends),
            "FOAF" => Ok(Visibility::Foaf),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility {other:?}")),
        }
    }
}

/// Identity of whoever is asking, as handed over by the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(String),
}

impl Viewer {
    pub fn from_optional(user: Option<String>) -> Self {
        match user {
            Some(id) if !id.trim().is_empty() => Viewer::User(id.trim().to_string()),
            _ => Viewer::Anonymous,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(id),
        }
    }
}

/// True iff `author` and `viewer` share an accepted friend but are not
/// friends themselves.
pub fn is_foaf<R>(friends: &R, author: &str, viewer: &str) -> Result<bool>
where
    R: FriendRepository + ?Sized,
{
    if is_friend(friends, author, viewer)? {
        return Ok(false);
    }

    let author_friends: HashSet<String> = friends
        .query(&FriendFilter::friends_of(author))?
        .into_iter()
        .map(|edge| edge.follower)
        .collect();
    if author_friends.is_empty() {
        return Ok(false);
    }

    Ok(friends
        .query(&FriendFilter::friends_of(viewer))?
        .iter()
        .any(|edge| author_friends.contains(&edge.follower)))
}

/// Read-only view over the friend graph used to filter posts. Construct it
/// from a repository bound to a read snapshot so one call sees one graph.
pub struct VisibilityResolver<'r, R: ?Sized> {
    friends: &'r R,
}

impl<'r, R> VisibilityResolver<'r, R>
where
    R: FriendRepository + ?Sized,
{
    pub fn new(friends: &'r R) -> Self {
        Self { friends }
    }

    pub fn is_visible(&self, post: &PostRecord, viewer: &Viewer) -> Result<bool> {
        self.is_visible_cached(post, viewer, &mut HashMap::new())
    }

    /// Keeps the posts `viewer` may see, in their original order. Listing
    /// exclusion of unlisted posts is the caller's job for signed-in viewers.
    pub fn filter_visible(&self, posts: Vec<PostRecord>, viewer: &Viewer) -> Result<Vec<PostRecord>> {
        let mut verdicts = HashMap::new();
        let mut visible = Vec::with_capacity(posts.len());
        for post in posts {
            if self.is_visible_cached(&post, viewer, &mut verdicts)? {
                visible.push(post);
            }
        }
        Ok(visible)
    }

    fn is_visible_cached(
        &self,
        post: &PostRecord,
        viewer: &Viewer,
        verdicts: &mut HashMap<(String, Visibility), bool>,
    ) -> Result<bool> {
        let visibility = Visibility::from_stored(&post.visibility);
        let Some(viewer_id) = viewer.user_id() else {
            return Ok(visibility == Visibility::Public && !post.unlisted);
        };
        if post.author == viewer_id {
            return Ok(true);
        }

        match visibility {
            Visibility::Public => Ok(true),
            Visibility::Private => Ok(false),
            Visibility::Friends | Visibility::Foaf => {
                let key = (post.author.clone(), visibility);
                if let Some(verdict) = verdicts.get(&key) {
                    return Ok(*verdict);
                }
                let verdict = if visibility == Visibility::Friends {
                    is_friend(self.friends, &post.author, viewer_id)?
                } else {
                    is_foaf(self.friends, &post.author, viewer_id)?
                };
                verdicts.insert(key, verdict);
                Ok(verdict)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewFriendRecord;
    use crate::database::{open_in_memory, Database};

    fn befriend(db: &Database, a: &str, b: &str) {
        db.with_repositories(|repos| {
            let friends = repos.friends();
            friends.create(&NewFriendRecord::accepted(a, b))?;
            friends.create(&NewFriendRecord::accepted(b, a))?;
            Ok(())
        })
        .unwrap();
    }

    fn follow(db: &Database, follower: &str, followee: &str) {
        db.with_repositories(|repos| {
            repos
                .friends()
                .create(&NewFriendRecord::request(follower, followee))?;
            Ok(())
        })
        .unwrap();
    }

    fn post(id: &str, author: &str, visibility: &str, unlisted: bool) -> PostRecord {
        PostRecord {
            id: id.into(),
            author: author.into(),
            title: id.into(),
            content: String::new(),
            visibility: visibility.into(),
            unlisted,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        }
    }

    fn visible_ids(db: &Database, posts: Vec<PostRecord>, viewer: &Viewer) -> Vec<String> {
        db.with_repositories(|repos| {
            let friends = repos.friends();
            let resolver = VisibilityResolver::new(&friends);
            Ok(resolver
                .filter_visible(posts, viewer)?
                .into_iter()
                .map(|post| post.id)
                .collect())
        })
        .unwrap()
    }

    fn check_foaf(db: &Database, author: &str, viewer: &str) -> bool {
        db.with_repositories(|repos| is_foaf(&repos.friends(), author, viewer))
            .unwrap()
    }

    fn check_friend(db: &Database, author: &str, viewer: &str) -> bool {
        db.with_repositories(|repos| is_friend(&repos.friends(), author, viewer))
            .unwrap()
    }

    #[test]
    fn unknown_visibility_reads_as_private() {
        assert_eq!(Visibility::from_stored("FOAF"), Visibility::Foaf);
        assert_eq!(Visibility::from_stored("friends"), Visibility::Private);
        assert_eq!(Visibility::from_stored(""), Visibility::Private);
    }

    #[test]
    fn anonymous_sees_listed_public_posts_only() {
        let db = open_in_memory();
        let posts = vec![
            post("public", "alice", "PUBLIC", false),
            post("private", "alice", "PRIVATE", false),
            post("hidden", "alice", "PUBLIC", true),
            post("friends", "alice", "FRIENDS", false),
        ];
        assert_eq!(visible_ids(&db, posts, &Viewer::Anonymous), vec!["public"]);
    }

    #[test]
    fn author_sees_everything_they_wrote() {
        let db = open_in_memory();
        let posts = vec![
            post("a", "alice", "PRIVATE", true),
            post("b", "alice", "FOAF", false),
            post("c", "alice", "bogus", false),
        ];
        let viewer = Viewer::User("alice".into());
        assert_eq!(visible_ids(&db, posts, &viewer), vec!["a", "b", "c"]);
    }

    #[test]
    fn friends_posts_need_accepted_friendship() {
        let db = open_in_memory();
        befriend(&db, "alice", "bob");
        follow(&db, "carol", "alice");

        let posts = vec![post("f", "alice", "FRIENDS", false)];
        assert_eq!(
            visible_ids(&db, posts.clone(), &Viewer::User("bob".into())),
            vec!["f"]
        );
        assert!(visible_ids(&db, posts, &Viewer::User("carol".into())).is_empty());
    }

    #[test]
    fn shared_friend_grants_foaf() {
        let db = open_in_memory();
        befriend(&db, "xavier", "ursula");
        befriend(&db, "yvonne", "ursula");

        assert!(check_foaf(&db, "xavier", "yvonne"));
        assert!(check_foaf(&db, "yvonne", "xavier"));
        assert!(!check_foaf(&db, "xavier", "zack"));

        let posts = vec![
            post("foaf", "xavier", "FOAF", false),
            post("friends", "xavier", "FRIENDS", false),
        ];
        assert_eq!(
            visible_ids(&db, posts, &Viewer::User("yvonne".into())),
            vec!["foaf"]
        );
    }

    #[test]
    fn one_way_follow_does_not_count_as_shared_friend() {
        let db = open_in_memory();
        befriend(&db, "xavier", "ursula");
        follow(&db, "ursula", "yvonne");
        assert!(!check_foaf(&db, "xavier", "yvonne"));
    }

    #[test]
    fn direct_friends_are_never_foaf() {
        let db = open_in_memory();
        befriend(&db, "xavier", "yvonne");
        befriend(&db, "xavier", "ursula");
        befriend(&db, "yvonne", "ursula");

        assert!(check_friend(&db, "xavier", "yvonne"));
        assert!(!check_foaf(&db, "xavier", "yvonne"));

        let posts = vec![post("foaf", "xavier", "FOAF", false)];
        assert!(visible_ids(&db, posts, &Viewer::User("yvonne".into())).is_empty());

        for (a, b) in [("xavier", "yvonne"), ("xavier", "ursula"), ("ursula", "yvonne"), ("zack", "xavier")] {
            assert!(!(check_friend(&db, a, b) && check_foaf(&db, a, b)));
        }
    }

    #[test]
    fn filtering_is_idempotent_and_keeps_order() {
        let db = open_in_memory();
        befriend(&db, "alice", "bob");
        befriend(&db, "carol", "bob");
        let viewer = Viewer::User("bob".into());
        let posts = vec![
            post("1", "alice", "FRIENDS", false),
            post("2", "carol", "PRIVATE", false),
            post("3", "dave", "PUBLIC", false),
            post("4", "carol", "FRIENDS", false),
            post("5", "dave", "FOAF", false),
        ];

        let once = db
            .with_repositories(|repos| {
                let friends = repos.friends();
                let resolver = VisibilityResolver::new(&friends);
                resolver.filter_visible(posts, &viewer)
            })
            .unwrap();
        let ids: Vec<_> = once.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);

        let twice = visible_ids(&db, once, &viewer);
        assert_eq!(twice, ids);
    }
}
