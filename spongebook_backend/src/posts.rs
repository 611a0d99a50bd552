use crate::database::models::{PostFilter, PostRecord};
use crate::database::repositories::PostRepository;
use crate::database::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::utils::now_utc_iso;
use crate::visibility::{Viewer, Visibility, VisibilityResolver};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone)]
pub struct PostService {
    database: Database,
}

impl PostService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, author: &str, input: CreatePostInput) -> ServiceResult<PostView> {
        if author.trim().is_empty() {
            return Err(ServiceError::Validation("post author is required".into()));
        }
        if input.title.trim().is_empty() {
            return Err(ServiceError::Validation("post title may not be empty".into()));
        }
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            author: author.trim().to_string(),
            title: input.title,
            content: input.content.unwrap_or_default(),
            visibility: input.visibility.unwrap_or(Visibility::Public).to_string(),
            unlisted: input.unlisted.unwrap_or(false),
            created_at: now_utc_iso(),
            updated_at: None,
        };

        self.database
            .with_write_transaction(|repos| Ok(repos.posts().create(&record)?))?;
        tracing::info!(post_id = %record.id, author = %record.author, visibility = %record.visibility, "post created");
        Ok(PostView::from_record(record))
    }

    /// Posts the viewer may not see are reported as missing.
    pub fn get_post(&self, viewer: &Viewer, id: &str) -> ServiceResult<PostView> {
        let record = self.database.with_read_snapshot(|repos| {
            let Some(record) = repos.posts().get(id)? else {
                return Err(post_not_found(id));
            };
            let friends = repos.friends();
            let resolver = VisibilityResolver::new(&friends);
            if resolver.is_visible(&record, viewer)? {
                Ok(record)
            } else {
                Err(post_not_found(id))
            }
        })?;
        Ok(PostView::from_record(record))
    }

    pub fn update_post(
        &self,
        actor: &str,
        id: &str,
        input: UpdatePostInput,
    ) -> ServiceResult<PostView> {
        if matches!(&input.title, Some(title) if title.trim().is_empty()) {
            return Err(ServiceError::Validation("post title may not be empty".into()));
        }
        let record = self.database.with_write_transaction(|repos| {
            let posts = repos.posts();
            let mut record = posts.get(id)?.ok_or_else(|| post_not_found(id))?;
            ensure_author(&record, actor)?;

            if let Some(title) = input.title {
                record.title = title;
            }
            if let Some(content) = input.content {
                record.content = content;
            }
            if let Some(visibility) = input.visibility {
                record.visibility = visibility.to_string();
            }
            if let Some(unlisted) = input.unlisted {
                record.unlisted = unlisted;
            }
            record.updated_at = Some(now_utc_iso());
            posts.update(&record)?;
            Ok(record)
        })?;
        tracing::info!(post_id = %record.id, "post updated");
        Ok(PostView::from_record(record))
    }

    pub fn delete_post(&self, actor: &str, id: &str) -> ServiceResult<()> {
        self.database.with_write_transaction(|repos| {
            let posts = repos.posts();
            let record = posts.get(id)?.ok_or_else(|| post_not_found(id))?;
            ensure_author(&record, actor)?;
            posts.delete(id)?;
            Ok(())
        })?;
        tracing::info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Listed public posts, the same for every viewer.
    pub fn list_public(&self) -> ServiceResult<Vec<PostView>> {
        let records = self.database.with_repositories(|repos| {
            repos.posts().query(&PostFilter {
                visibility: Some(Visibility::Public.to_string()),
                unlisted: Some(false),
                ..Default::default()
            })
        })?;
        Ok(records.into_iter().map(PostView::from_record).collect())
    }

    /// Every listed post the viewer may see.
    pub fn list_visible(&self, viewer: &Viewer) -> ServiceResult<Vec<PostView>> {
        self.list_visible_matching(viewer, None)
    }

    /// Listed posts by `author` that the viewer may see.
    pub fn list_visible_by_author(
        &self,
        viewer: &Viewer,
        author: &str,
    ) -> ServiceResult<Vec<PostView>> {
        self.list_visible_matching(viewer, Some(author.to_string()))
    }

    fn list_visible_matching(
        &self,
        viewer: &Viewer,
        author: Option<String>,
    ) -> ServiceResult<Vec<PostView>> {
        let mut filter = PostFilter {
            author,
            unlisted: Some(false),
            ..Default::default()
        };
        if *viewer == Viewer::Anonymous {
            filter.visibility = Some(Visibility::Public.to_string());
        }

        let records = self.database.with_read_snapshot(|repos| {
            let candidates = repos.posts().query(&filter)?;
            let friends = repos.friends();
            let resolver = VisibilityResolver::new(&friends);
            Ok(resolver.filter_visible(candidates, viewer)?)
        })?;
        tracing::debug!(viewer = ?viewer, count = records.len(), "resolved visible posts");
        Ok(records.into_iter().map(PostView::from_record).collect())
    }
}

fn ensure_author(record: &PostRecord, actor: &str) -> ServiceResult<()> {
    if record.author == actor {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "only the author may modify post {}",
            record.id
        )))
    }
}

fn post_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("post {id} not found"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub unlisted: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl PostView {
    fn from_record(record: PostRecord) -> Self {
        Self {
            visibility: Visibility::from_stored(&record.visibility),
            id: record.id,
            author: record.author,
            title: record.title,
            content: record.content,
            unlisted: record.unlisted,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub unlisted: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub unlisted: Option<bool>,
}
