//! Post repository
//!
//! Database operations for posts: filtered/paginated listings, creation,
//! field updates, soft archiving, bulk importance flags, and the URL-keyed
//! view counters.
//!
//! All listings are ordered by `(created_at DESC, id DESC)` so pagination
//! stays deterministic when several posts share a timestamp. Optional id-set
//! filters treat an absent or empty set as "no constraint".

use crate::db::DbPool;
use crate::models::{CreatePostInput, Post, PostStatus, PostSummary, UpdatePostInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post attributed to the given author
    async fn create(&self, author_id: i64, input: &CreatePostInput) -> Result<Post>;

    /// Get post by ID with its direction/tag/origin links
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// List posts with the given status
    async fn list_by_status(&self, status: PostStatus, offset: i64, limit: i64)
        -> Result<Vec<Post>>;

    /// Count posts with the given status
    async fn count_by_status(&self, status: PostStatus) -> Result<i64>;

    /// List published posts flagged as important
    async fn list_important(&self, offset: i64, limit: i64) -> Result<Vec<Post>>;

    /// Count published posts flagged as important
    async fn count_important(&self) -> Result<i64>;

    /// List posts in one direction, optionally narrowed by type and tag sets
    async fn list_by_direction(
        &self,
        direction_id: i64,
        type_ids: Option<&[i64]>,
        tag_ids: Option<&[i64]>,
        status: PostStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Count posts matching [`list_by_direction`](Self::list_by_direction)
    async fn count_by_direction(
        &self,
        direction_id: i64,
        type_ids: Option<&[i64]>,
        tag_ids: Option<&[i64]>,
        status: PostStatus,
    ) -> Result<i64>;

    /// List posts by author, optionally narrowed by type/direction sets and status
    async fn list_by_author(
        &self,
        author_id: i64,
        type_ids: Option<&[i64]>,
        direction_ids: Option<&[i64]>,
        status: Option<PostStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Count posts matching [`list_by_author`](Self::list_by_author)
    async fn count_by_author(
        &self,
        author_id: i64,
        type_ids: Option<&[i64]>,
        direction_ids: Option<&[i64]>,
        status: Option<PostStatus>,
    ) -> Result<i64>;

    /// List posts matching the three-way direction/type/origin set filter
    async fn list_by_sets(
        &self,
        direction_ids: Option<&[i64]>,
        type_ids: Option<&[i64]>,
        origin_ids: Option<&[i64]>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Count posts matching [`list_by_sets`](Self::list_by_sets)
    async fn count_by_sets(
        &self,
        direction_ids: Option<&[i64]>,
        type_ids: Option<&[i64]>,
        origin_ids: Option<&[i64]>,
    ) -> Result<i64>;

    /// List summarized published posts (with post type names) for the main feed
    async fn list_latest_summaries(&self, offset: i64, limit: i64) -> Result<Vec<PostSummary>>;

    /// Update an existing post; `None` fields keep their current value,
    /// `Some` link sets replace the stored ones
    async fn update(&self, input: &UpdatePostInput) -> Result<Post>;

    /// Archive a post (soft delete); returns false when the id does not exist
    async fn archive(&self, id: i64) -> Result<bool>;

    /// Bulk-set the importance flag; errors when the id set is empty or any
    /// id does not match a row
    async fn set_important(&self, ids: &[i64], important: bool) -> Result<u64>;

    /// Increment the per-post view counter
    async fn increment_view_count(&self, id: i64) -> Result<()>;

    /// Get the view counter for a normalized URL path (0 when unknown)
    async fn view_count_by_url(&self, url: &str) -> Result<i64>;

    /// Increment (upsert) the view counter for a normalized URL path
    async fn record_view(&self, url: &str) -> Result<()>;
}

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.preview, p.preview_image_url, \
     p.video_url, p.status, p.important, p.author_id, p.type_id, p.view_count, \
     p.created_at, p.updated_at";

const POST_ORDER: &str = " ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?";

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DbPool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn shared(pool: DbPool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_posts(&self, sql: &str, binder: Binder<'_>) -> Result<Vec<Post>> {
        let mut query = sqlx::query(sql);
        for bind in &binder.binds {
            match bind {
                Bind::Text(value) => query = query.bind(*value),
                Bind::Int(value) => query = query.bind(*value),
                Bind::Ids(ids) => {
                    for id in *ids {
                        query = query.bind(*id);
                    }
                }
            }
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row_to_post(&row)?);
        }
        load_links(&self.pool, &mut posts).await?;
        Ok(posts)
    }

    async fn fetch_count(&self, sql: &str, binder: Binder<'_>) -> Result<i64> {
        let mut query = sqlx::query(sql);
        for bind in &binder.binds {
            match bind {
                Bind::Text(value) => query = query.bind(*value),
                Bind::Int(value) => query = query.bind(*value),
                Bind::Ids(ids) => {
                    for id in *ids {
                        query = query.bind(*id);
                    }
                }
            }
        }
        let row = query
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;
        Ok(row.get("count"))
    }
}

/// Bind values for a dynamically built query, in clause order.
enum Bind<'a> {
    Text(&'a str),
    Int(i64),
    Ids(&'a [i64]),
}

struct Binder<'a> {
    binds: Vec<Bind<'a>>,
}

impl<'a> Binder<'a> {
    fn new() -> Self {
        Self { binds: Vec::new() }
    }

    fn text(mut self, value: &'a str) -> Self {
        self.binds.push(Bind::Text(value));
        self
    }

    fn int(mut self, value: i64) -> Self {
        self.binds.push(Bind::Int(value));
        self
    }

    fn ids(mut self, ids: Option<&'a [i64]>) -> Self {
        if let Some(ids) = ids {
            self.binds.push(Bind::Ids(ids));
        }
        self
    }

    fn page(self, limit: i64, offset: i64) -> Self {
        self.int(limit).int(offset)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Drop empty filter sets so they read as "no constraint"
fn nonempty(ids: Option<&[i64]>) -> Option<&[i64]> {
    ids.filter(|ids| !ids.is_empty())
}

fn type_clause(type_ids: Option<&[i64]>) -> Option<String> {
    type_ids.map(|ids| format!("p.type_id IN ({})", placeholders(ids.len())))
}

fn direction_set_clause(direction_ids: Option<&[i64]>) -> Option<String> {
    direction_ids.map(|ids| {
        format!(
            "EXISTS (SELECT 1 FROM post_directions pd WHERE pd.post_id = p.id \
             AND pd.direction_id IN ({}))",
            placeholders(ids.len())
        )
    })
}

fn tag_set_clause(tag_ids: Option<&[i64]>) -> Option<String> {
    tag_ids.map(|ids| {
        format!(
            "EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id \
             AND pt.tag_id IN ({}))",
            placeholders(ids.len())
        )
    })
}

fn origin_set_clause(origin_ids: Option<&[i64]>) -> Option<String> {
    origin_ids.map(|ids| {
        format!(
            "EXISTS (SELECT 1 FROM post_origins po WHERE po.post_id = p.id \
             AND po.origin_id IN ({}))",
            placeholders(ids.len())
        )
    })
}

fn where_sql(clauses: &[Option<String>]) -> String {
    let present: Vec<&str> = clauses
        .iter()
        .filter_map(|c| c.as_deref())
        .collect();
    if present.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", present.join(" AND "))
    }
}

fn dedup_sorted(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, author_id: i64, input: &CreatePostInput) -> Result<Post> {
        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        let direction_ids = dedup_sorted(&input.direction_ids);
        let tag_ids = dedup_sorted(&input.tag_ids);
        let origin_ids = dedup_sorted(&input.origin_ids);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, preview, preview_image_url, video_url,
                               status, important, author_id, type_id, view_count,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.preview)
        .bind(&input.preview_image_url)
        .bind(&input.video_url)
        .bind(status.as_str())
        .bind(author_id)
        .bind(input.type_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?;

        let id = result.last_insert_rowid();

        insert_links(&mut tx, "post_directions", "direction_id", id, &direction_ids).await?;
        insert_links(&mut tx, "post_tags", "tag_id", id, &tag_ids).await?;
        insert_links(&mut tx, "post_origins", "origin_id", id, &origin_ids).await?;

        tx.commit().await.context("Failed to commit post creation")?;

        Ok(Post {
            id,
            title: input.title.clone(),
            content: input.content.clone(),
            preview: input.preview.clone(),
            preview_image_url: input.preview_image_url.clone(),
            video_url: input.video_url.clone(),
            status,
            important: false,
            author_id,
            type_id: input.type_id,
            view_count: 0,
            created_at: now,
            updated_at: now,
            direction_ids,
            tag_ids,
            origin_ids,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get post by ID")?;

        match row {
            Some(row) => {
                let mut posts = vec![row_to_post(&row)?];
                load_links(&self.pool, &mut posts).await?;
                Ok(posts.pop())
            }
            None => Ok(None),
        }
    }

    async fn list_by_status(
        &self,
        status: PostStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p WHERE p.status = ?{}",
            POST_COLUMNS, POST_ORDER
        );
        self.fetch_posts(&sql, Binder::new().text(status.as_str()).page(limit, offset))
            .await
    }

    async fn count_by_status(&self, status: PostStatus) -> Result<i64> {
        self.fetch_count(
            "SELECT COUNT(*) as count FROM posts p WHERE p.status = ?",
            Binder::new().text(status.as_str()),
        )
        .await
    }

    async fn list_important(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p WHERE p.status = 'published' AND p.important = 1{}",
            POST_COLUMNS, POST_ORDER
        );
        self.fetch_posts(&sql, Binder::new().page(limit, offset)).await
    }

    async fn count_important(&self) -> Result<i64> {
        self.fetch_count(
            "SELECT COUNT(*) as count FROM posts p \
             WHERE p.status = 'published' AND p.important = 1",
            Binder::new(),
        )
        .await
    }

    async fn list_by_direction(
        &self,
        direction_id: i64,
        type_ids: Option<&[i64]>,
        tag_ids: Option<&[i64]>,
        status: PostStatus,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let type_ids = nonempty(type_ids);
        let tag_ids = nonempty(tag_ids);
        let clauses = [
            Some("p.status = ?".to_string()),
            Some(
                "EXISTS (SELECT 1 FROM post_directions pd \
                 WHERE pd.post_id = p.id AND pd.direction_id = ?)"
                    .to_string(),
            ),
            type_clause(type_ids),
            tag_set_clause(tag_ids),
        ];
        let sql = format!(
            "SELECT {} FROM posts p{}{}",
            POST_COLUMNS,
            where_sql(&clauses),
            POST_ORDER
        );
        self.fetch_posts(
            &sql,
            Binder::new()
                .text(status.as_str())
                .int(direction_id)
                .ids(type_ids)
                .ids(tag_ids)
                .page(limit, offset),
        )
        .await
    }

    async fn count_by_direction(
        &self,
        direction_id: i64,
        type_ids: Option<&[i64]>,
        tag_ids: Option<&[i64]>,
        status: PostStatus,
    ) -> Result<i64> {
        let type_ids = nonempty(type_ids);
        let tag_ids = nonempty(tag_ids);
        let clauses = [
            Some("p.status = ?".to_string()),
            Some(
                "EXISTS (SELECT 1 FROM post_directions pd \
                 WHERE pd.post_id = p.id AND pd.direction_id = ?)"
                    .to_string(),
            ),
            type_clause(type_ids),
            tag_set_clause(tag_ids),
        ];
        let sql = format!("SELECT COUNT(*) as count FROM posts p{}", where_sql(&clauses));
        self.fetch_count(
            &sql,
            Binder::new()
                .text(status.as_str())
                .int(direction_id)
                .ids(type_ids)
                .ids(tag_ids),
        )
        .await
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        type_ids: Option<&[i64]>,
        direction_ids: Option<&[i64]>,
        status: Option<PostStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let type_ids = nonempty(type_ids);
        let direction_ids = nonempty(direction_ids);
        let clauses = [
            Some("p.author_id = ?".to_string()),
            status.map(|_| "p.status = ?".to_string()),
            type_clause(type_ids),
            direction_set_clause(direction_ids),
        ];
        let sql = format!(
            "SELECT {} FROM posts p{}{}",
            POST_COLUMNS,
            where_sql(&clauses),
            POST_ORDER
        );
        let mut binder = Binder::new().int(author_id);
        if let Some(status) = status {
            binder = binder.text(status.as_str());
        }
        self.fetch_posts(
            &sql,
            binder.ids(type_ids).ids(direction_ids).page(limit, offset),
        )
        .await
    }

    async fn count_by_author(
        &self,
        author_id: i64,
        type_ids: Option<&[i64]>,
        direction_ids: Option<&[i64]>,
        status: Option<PostStatus>,
    ) -> Result<i64> {
        let type_ids = nonempty(type_ids);
        let direction_ids = nonempty(direction_ids);
        let clauses = [
            Some("p.author_id = ?".to_string()),
            status.map(|_| "p.status = ?".to_string()),
            type_clause(type_ids),
            direction_set_clause(direction_ids),
        ];
        let sql = format!("SELECT COUNT(*) as count FROM posts p{}", where_sql(&clauses));
        let mut binder = Binder::new().int(author_id);
        if let Some(status) = status {
            binder = binder.text(status.as_str());
        }
        self.fetch_count(&sql, binder.ids(type_ids).ids(direction_ids))
            .await
    }

    async fn list_by_sets(
        &self,
        direction_ids: Option<&[i64]>,
        type_ids: Option<&[i64]>,
        origin_ids: Option<&[i64]>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let direction_ids = nonempty(direction_ids);
        let type_ids = nonempty(type_ids);
        let origin_ids = nonempty(origin_ids);
        let clauses = [
            direction_set_clause(direction_ids),
            type_clause(type_ids),
            origin_set_clause(origin_ids),
        ];
        let sql = format!(
            "SELECT {} FROM posts p{}{}",
            POST_COLUMNS,
            where_sql(&clauses),
            POST_ORDER
        );
        self.fetch_posts(
            &sql,
            Binder::new()
                .ids(direction_ids)
                .ids(type_ids)
                .ids(origin_ids)
                .page(limit, offset),
        )
        .await
    }

    async fn count_by_sets(
        &self,
        direction_ids: Option<&[i64]>,
        type_ids: Option<&[i64]>,
        origin_ids: Option<&[i64]>,
    ) -> Result<i64> {
        let direction_ids = nonempty(direction_ids);
        let type_ids = nonempty(type_ids);
        let origin_ids = nonempty(origin_ids);
        let clauses = [
            direction_set_clause(direction_ids),
            type_clause(type_ids),
            origin_set_clause(origin_ids),
        ];
        let sql = format!("SELECT COUNT(*) as count FROM posts p{}", where_sql(&clauses));
        self.fetch_count(
            &sql,
            Binder::new().ids(direction_ids).ids(type_ids).ids(origin_ids),
        )
        .await
    }

    async fn list_latest_summaries(&self, offset: i64, limit: i64) -> Result<Vec<PostSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.title, p.preview, p.type_id, t.name AS type_name, p.created_at
            FROM posts p
            INNER JOIN post_types t ON t.id = p.type_id
            WHERE p.status = 'published'
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list post summaries")?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(PostSummary {
                id: row.get("id"),
                title: row.get("title"),
                preview: row.get("preview"),
                type_id: row.get("type_id"),
                type_name: row.get("type_name"),
                created_at: row.get("created_at"),
            });
        }

        Ok(summaries)
    }

    async fn update(&self, input: &UpdatePostInput) -> Result<Post> {
        let existing = self
            .get_by_id(input.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post with {} not found", input.id))?;

        let now = Utc::now();
        let new_title = input.title.as_ref().unwrap_or(&existing.title);
        let new_content = input.content.as_ref().unwrap_or(&existing.content);
        let new_preview = input.preview.as_ref().unwrap_or(&existing.preview);
        let new_preview_image_url = input
            .preview_image_url
            .clone()
            .or(existing.preview_image_url.clone());
        let new_video_url = input.video_url.clone().or(existing.video_url.clone());
        let new_type_id = input.type_id.unwrap_or(existing.type_id);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, content = ?, preview = ?, preview_image_url = ?,
                video_url = ?, type_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(new_title)
        .bind(new_content)
        .bind(new_preview)
        .bind(&new_preview_image_url)
        .bind(&new_video_url)
        .bind(new_type_id)
        .bind(now)
        .bind(input.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?;

        if let Some(ids) = &input.direction_ids {
            replace_links(&mut tx, "post_directions", "direction_id", input.id, ids).await?;
        }
        if let Some(ids) = &input.tag_ids {
            replace_links(&mut tx, "post_tags", "tag_id", input.id, ids).await?;
        }
        if let Some(ids) = &input.origin_ids {
            replace_links(&mut tx, "post_origins", "origin_id", input.id, ids).await?;
        }

        tx.commit().await.context("Failed to commit post update")?;

        self.get_by_id(input.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post with {} not found after update", input.id))
    }

    async fn archive(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE posts SET status = 'archived', updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to archive post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_important(&self, ids: &[i64], important: bool) -> Result<u64> {
        if ids.is_empty() {
            anyhow::bail!("post id set must not be empty");
        }

        let ids = dedup_sorted(ids);
        let sql = format!(
            "UPDATE posts SET important = ? WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql).bind(important);
        for id in &ids {
            query = query.bind(*id);
        }
        let result = query
            .execute(&self.pool)
            .await
            .context("Failed to update post importance")?;

        let affected = result.rows_affected();
        if affected != ids.len() as u64 {
            anyhow::bail!(
                "importance update matched {} of {} posts",
                affected,
                ids.len()
            );
        }

        Ok(affected)
    }

    async fn increment_view_count(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to increment post view count")?;
        Ok(())
    }

    async fn view_count_by_url(&self, url: &str) -> Result<i64> {
        let row = sqlx::query("SELECT count FROM post_views WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get view count")?;

        Ok(row.map(|r| r.get("count")).unwrap_or(0))
    }

    async fn record_view(&self, url: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO post_views (url, count) VALUES (?, 1) \
             ON CONFLICT(url) DO UPDATE SET count = count + 1",
        )
        .bind(url)
        .execute(&self.pool)
        .await
        .context("Failed to record view")?;
        Ok(())
    }
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let status = PostStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid post status: {}", status_str))?;

    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        preview: row.get("preview"),
        preview_image_url: row.get("preview_image_url"),
        video_url: row.get("video_url"),
        status,
        important: row.get("important"),
        author_id: row.get("author_id"),
        type_id: row.get("type_id"),
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        direction_ids: Vec::new(),
        tag_ids: Vec::new(),
        origin_ids: Vec::new(),
    })
}

async fn insert_links(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    column: &str,
    post_id: i64,
    ids: &[i64],
) -> Result<()> {
    for id in ids {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (post_id, {}) VALUES (?, ?)",
            table, column
        ))
        .bind(post_id)
        .bind(id)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to link {}", table))?;
    }
    Ok(())
}

async fn replace_links(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    column: &str,
    post_id: i64,
    ids: &[i64],
) -> Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE post_id = ?", table))
        .bind(post_id)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to clear {}", table))?;

    insert_links(tx, table, column, post_id, &dedup_sorted(ids)).await
}

/// Fill the direction/tag/origin id sets of the given posts in three queries
async fn load_links(pool: &DbPool, posts: &mut [Post]) -> Result<()> {
    if posts.is_empty() {
        return Ok(());
    }

    let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let directions = link_map(pool, "post_directions", "direction_id", &post_ids).await?;
    let tags = link_map(pool, "post_tags", "tag_id", &post_ids).await?;
    let origins = link_map(pool, "post_origins", "origin_id", &post_ids).await?;

    for post in posts {
        post.direction_ids = directions.get(&post.id).cloned().unwrap_or_default();
        post.tag_ids = tags.get(&post.id).cloned().unwrap_or_default();
        post.origin_ids = origins.get(&post.id).cloned().unwrap_or_default();
    }

    Ok(())
}

async fn link_map(
    pool: &DbPool,
    table: &str,
    column: &str,
    post_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let sql = format!(
        "SELECT post_id, {col} FROM {table} WHERE post_id IN ({}) ORDER BY {col}",
        placeholders(post_ids.len()),
        col = column,
        table = table,
    );
    let mut query = sqlx::query(&sql);
    for id in post_ids {
        query = query.bind(*id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to load {} links", table))?;

    let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        let post_id: i64 = row.get("post_id");
        let linked_id: i64 = row.get(column);
        map.entry(post_id).or_default().push(linked_id);
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::ListParams;

    async fn setup_test_repo() -> (DbPool, SqlxPostRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxPostRepository::new(pool.clone());
        (pool, repo)
    }

    async fn seed_user(pool: &DbPool, email: &str) -> i64 {
        let result = sqlx::query("INSERT INTO users (email, name, role, status) VALUES (?, ?, ?, ?)")
            .bind(email)
            .bind("Test Doctor")
            .bind("doctor")
            .bind("active")
            .execute(pool)
            .await
            .expect("Failed to create test user");
        result.last_insert_rowid()
    }

    async fn seed_named(pool: &DbPool, table: &str, name: &str) -> i64 {
        let result = sqlx::query(&format!("INSERT INTO {} (name) VALUES (?)", table))
            .bind(name)
            .execute(pool)
            .await
            .expect("Failed to seed row");
        result.last_insert_rowid()
    }

    fn test_input(title: &str, type_id: i64, direction_ids: Vec<i64>) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            content: format!("Content for {}", title),
            preview: format!("Preview for {}", title),
            preview_image_url: None,
            video_url: None,
            type_id,
            direction_ids,
            tag_ids: Vec::new(),
            origin_ids: Vec::new(),
            status: Some(PostStatus::Published),
        }
    }

    struct Fixture {
        author: i64,
        article: i64,
        video: i64,
        cardiology: i64,
        pediatrics: i64,
    }

    async fn seed_fixture(pool: &DbPool) -> Fixture {
        Fixture {
            author: seed_user(pool, "doc@example.com").await,
            article: seed_named(pool, "post_types", "Article").await,
            video: seed_named(pool, "post_types", "Video").await,
            cardiology: seed_named(pool, "directions", "Cardiology").await,
            pediatrics: seed_named(pool, "directions", "Pediatrics").await,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;
        let tag = seed_named(&pool, "tags", "covid").await;
        let origin = seed_named(&pool, "origins", "who").await;

        let mut input = test_input("First", fx.article, vec![fx.cardiology, fx.pediatrics]);
        input.tag_ids = vec![tag, tag]; // duplicates collapse
        input.origin_ids = vec![origin];

        let created = repo.create(fx.author, &input).await.expect("create failed");
        assert!(created.id > 0);
        assert_eq!(created.status, PostStatus::Published);
        assert!(!created.important);
        assert_eq!(created.tag_ids, vec![tag]);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("get failed")
            .expect("post missing");
        assert_eq!(found.title, "First");
        assert_eq!(found.author_id, fx.author);
        let mut expected = vec![fx.cardiology, fx.pediatrics];
        expected.sort_unstable();
        assert_eq!(found.direction_ids, expected);
        assert_eq!(found.origin_ids, vec![origin]);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;
        let found = repo.get_by_id(99999).await.expect("get failed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_by_status_orders_by_created_then_id_desc() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        // Same-instant inserts rely on the id tie-break
        for title in ["a", "b", "c"] {
            repo.create(fx.author, &test_input(title, fx.article, vec![fx.cardiology]))
                .await
                .expect("create failed");
        }
        let mut draft = test_input("d", fx.article, vec![fx.cardiology]);
        draft.status = Some(PostStatus::Draft);
        repo.create(fx.author, &draft).await.expect("create failed");

        let posts = repo
            .list_by_status(PostStatus::Published, 0, 10)
            .await
            .expect("list failed");
        assert_eq!(posts.len(), 3);
        for pair in posts.windows(2) {
            assert!(
                (pair[0].created_at, pair[0].id) >= (pair[1].created_at, pair[1].id),
                "posts must be ordered by (created_at, id) descending"
            );
        }
        assert!(posts.iter().all(|p| p.status == PostStatus::Published));

        let count = repo
            .count_by_status(PostStatus::Published)
            .await
            .expect("count failed");
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_list_important_only_flagged_published() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        let a = repo
            .create(fx.author, &test_input("a", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");
        repo.create(fx.author, &test_input("b", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        repo.set_important(&[a.id], true).await.expect("flag failed");

        let important = repo.list_important(0, 10).await.expect("list failed");
        assert_eq!(important.len(), 1);
        assert_eq!(important[0].id, a.id);
        assert_eq!(repo.count_important().await.expect("count failed"), 1);
    }

    #[tokio::test]
    async fn test_list_by_direction_with_filters() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;
        let tag = seed_named(&pool, "tags", "prevention").await;

        let mut tagged = test_input("tagged", fx.article, vec![fx.cardiology]);
        tagged.tag_ids = vec![tag];
        let tagged = repo.create(fx.author, &tagged).await.expect("create failed");
        repo.create(fx.author, &test_input("untagged", fx.video, vec![fx.cardiology]))
            .await
            .expect("create failed");
        repo.create(fx.author, &test_input("other", fx.article, vec![fx.pediatrics]))
            .await
            .expect("create failed");

        // Direction only
        let posts = repo
            .list_by_direction(fx.cardiology, None, None, PostStatus::Published, 0, 10)
            .await
            .expect("list failed");
        assert_eq!(posts.len(), 2);

        // Empty set behaves as no constraint
        let unfiltered = repo
            .list_by_direction(fx.cardiology, Some(&[]), Some(&[]), PostStatus::Published, 0, 10)
            .await
            .expect("list failed");
        assert_eq!(unfiltered.len(), 2);

        // Type narrows
        let articles = repo
            .list_by_direction(
                fx.cardiology,
                Some(&[fx.article]),
                None,
                PostStatus::Published,
                0,
                10,
            )
            .await
            .expect("list failed");
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, tagged.id);

        // Tag narrows
        let by_tag = repo
            .list_by_direction(
                fx.cardiology,
                None,
                Some(&[tag]),
                PostStatus::Published,
                0,
                10,
            )
            .await
            .expect("list failed");
        assert_eq!(by_tag.len(), 1);

        let count = repo
            .count_by_direction(fx.cardiology, Some(&[fx.article]), None, PostStatus::Published)
            .await
            .expect("count failed");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_by_author_with_filters() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;
        let other = seed_user(&pool, "other@example.com").await;

        repo.create(fx.author, &test_input("mine-1", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");
        repo.create(fx.author, &test_input("mine-2", fx.video, vec![fx.pediatrics]))
            .await
            .expect("create failed");
        repo.create(other, &test_input("theirs", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        let mine = repo
            .list_by_author(fx.author, None, None, None, 0, 10)
            .await
            .expect("list failed");
        assert_eq!(mine.len(), 2);

        let narrowed = repo
            .list_by_author(
                fx.author,
                Some(&[fx.video]),
                Some(&[fx.pediatrics]),
                Some(PostStatus::Published),
                0,
                10,
            )
            .await
            .expect("list failed");
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].title, "mine-2");

        let count = repo
            .count_by_author(fx.author, None, Some(&[fx.cardiology]), None)
            .await
            .expect("count failed");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_list_by_sets_intersection() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;
        let origin = seed_named(&pool, "origins", "internal").await;

        let mut matching = test_input("match", fx.article, vec![fx.cardiology]);
        matching.origin_ids = vec![origin];
        let matching = repo.create(fx.author, &matching).await.expect("create failed");
        repo.create(fx.author, &test_input("wrong-type", fx.video, vec![fx.cardiology]))
            .await
            .expect("create failed");
        repo.create(fx.author, &test_input("no-origin", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        let posts = repo
            .list_by_sets(
                Some(&[fx.cardiology]),
                Some(&[fx.article]),
                Some(&[origin]),
                0,
                10,
            )
            .await
            .expect("list failed");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, matching.id);

        // No filters returns everything
        let all = repo
            .list_by_sets(None, None, None, 0, 10)
            .await
            .expect("list failed");
        assert_eq!(all.len(), 3);

        // Disjoint combination matches nothing
        let none = repo
            .count_by_sets(Some(&[fx.pediatrics]), Some(&[fx.video]), Some(&[origin]))
            .await
            .expect("count failed");
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn test_unconstrained_equals_full_value_set() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        repo.create(fx.author, &test_input("a", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");
        repo.create(fx.author, &test_input("b", fx.video, vec![fx.pediatrics]))
            .await
            .expect("create failed");

        let unconstrained = repo
            .list_by_sets(None, None, None, 0, 10)
            .await
            .expect("list failed");
        let full_sets = repo
            .list_by_sets(
                Some(&[fx.cardiology, fx.pediatrics]),
                Some(&[fx.article, fx.video]),
                None,
                0,
                10,
            )
            .await
            .expect("list failed");

        let ids = |posts: &[Post]| posts.iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(ids(&unconstrained), ids(&full_sets));
    }

    #[tokio::test]
    async fn test_list_latest_summaries() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        repo.create(fx.author, &test_input("watch", fx.video, vec![fx.cardiology]))
            .await
            .expect("create failed");
        let mut draft = test_input("hidden", fx.article, vec![fx.cardiology]);
        draft.status = Some(PostStatus::Draft);
        repo.create(fx.author, &draft).await.expect("create failed");

        let summaries = repo.list_latest_summaries(0, 10).await.expect("list failed");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "watch");
        assert_eq!(summaries[0].type_name, "Video");
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_links() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        let created = repo
            .create(fx.author, &test_input("before", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        let input = UpdatePostInput {
            id: created.id,
            title: Some("after".to_string()),
            direction_ids: Some(vec![fx.pediatrics]),
            type_id: Some(fx.video),
            ..Default::default()
        };
        let updated = repo.update(&input).await.expect("update failed");

        assert_eq!(updated.title, "after");
        assert_eq!(updated.content, created.content); // unchanged
        assert_eq!(updated.type_id, fx.video);
        assert_eq!(updated.direction_ids, vec![fx.pediatrics]);
    }

    #[tokio::test]
    async fn test_update_missing_post_fails() {
        let (_pool, repo) = setup_test_repo().await;

        let input = UpdatePostInput {
            id: 4242,
            title: Some("nope".to_string()),
            ..Default::default()
        };
        let err = repo.update(&input).await.expect_err("update must fail");
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_archive() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        let created = repo
            .create(fx.author, &test_input("gone", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        assert!(repo.archive(created.id).await.expect("archive failed"));
        let archived = repo
            .get_by_id(created.id)
            .await
            .expect("get failed")
            .expect("post missing");
        assert_eq!(archived.status, PostStatus::Archived);

        // Missing id reports false, not an error
        assert!(!repo.archive(99999).await.expect("archive failed"));
    }

    #[tokio::test]
    async fn test_set_important_empty_set_fails() {
        let (_pool, repo) = setup_test_repo().await;
        let err = repo
            .set_important(&[], true)
            .await
            .expect_err("empty set must fail");
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_set_important_missing_rows_fails() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        let created = repo
            .create(fx.author, &test_input("real", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        let err = repo
            .set_important(&[created.id, 99999], true)
            .await
            .expect_err("missing row must fail");
        assert!(err.to_string().contains("matched 1 of 2"));
    }

    #[tokio::test]
    async fn test_set_important_and_unset() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        let a = repo
            .create(fx.author, &test_input("a", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");
        let b = repo
            .create(fx.author, &test_input("b", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        let affected = repo
            .set_important(&[a.id, b.id], true)
            .await
            .expect("flag failed");
        assert_eq!(affected, 2);
        assert_eq!(repo.count_important().await.expect("count failed"), 2);

        repo.set_important(&[a.id], false).await.expect("unflag failed");
        assert_eq!(repo.count_important().await.expect("count failed"), 1);
    }

    #[tokio::test]
    async fn test_view_counter_by_url() {
        let (_pool, repo) = setup_test_repo().await;

        assert_eq!(
            repo.view_count_by_url("/experts").await.expect("count failed"),
            0
        );

        repo.record_view("/experts").await.expect("record failed");
        repo.record_view("/experts").await.expect("record failed");
        repo.record_view("/news").await.expect("record failed");

        assert_eq!(
            repo.view_count_by_url("/experts").await.expect("count failed"),
            2
        );
        assert_eq!(
            repo.view_count_by_url("/news").await.expect("count failed"),
            1
        );
    }

    #[tokio::test]
    async fn test_increment_view_count() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        let created = repo
            .create(fx.author, &test_input("seen", fx.article, vec![fx.cardiology]))
            .await
            .expect("create failed");

        repo.increment_view_count(created.id).await.expect("bump failed");
        repo.increment_view_count(created.id).await.expect("bump failed");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("get failed")
            .expect("post missing");
        assert_eq!(found.view_count, 2);
    }

    #[tokio::test]
    async fn test_pagination_window() {
        let (pool, repo) = setup_test_repo().await;
        let fx = seed_fixture(&pool).await;

        for i in 0..5 {
            repo.create(
                fx.author,
                &test_input(&format!("post-{}", i), fx.article, vec![fx.cardiology]),
            )
            .await
            .expect("create failed");
        }

        let params = ListParams::new(1, 2);
        let page = repo
            .list_by_status(PostStatus::Published, params.offset(), params.limit())
            .await
            .expect("list failed");
        assert_eq!(page.len(), 2);

        let last = repo
            .list_by_status(PostStatus::Published, 4, 2)
            .await
            .expect("list failed");
        assert_eq!(last.len(), 1);
    }
}
