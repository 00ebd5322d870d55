use crate::models::{BlogPost, ImageUpload, PostState, UpsertOutcome, UpsertPost, User};
use crate::services::resources::ResourceStore;
use crate::services::slug::generate_slug;
use crate::services::{ServiceError, ServiceResult};
use crate::Database;
use chrono::SecondsFormat;
use rusqlite::{Connection, OptionalExtension};

pub const MIN_TITLE_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 1000;

pub(crate) const POST_COLUMNS: &str =
    "id, title, slug, content, feature_image, state, tags, user_id, created_at, updated_at, published_at";

pub(crate) fn row_to_post(row: &rusqlite::Row) -> rusqlite::Result<BlogPost> {
    let tags: Vec<String> = serde_json::from_str(&row.get::<_, String>(6)?).unwrap_or_default();

    Ok(BlogPost {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        feature_image: row.get(4)?,
        state: row.get::<_, String>(5)?.parse().unwrap_or_default(),
        tags,
        user_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        published_at: row.get(10)?,
    })
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<BlogPost>> {
    conn.query_row(
        &format!("SELECT {} FROM blog_posts WHERE id = ?", POST_COLUMNS),
        [id],
        row_to_post,
    )
    .optional()
}

fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<BlogPost>> {
    conn.query_row(
        &format!("SELECT {} FROM blog_posts WHERE slug = ?", POST_COLUMNS),
        [slug],
        row_to_post,
    )
    .optional()
}

/// Whether `slug` is held by any post other than `exclude_id`.
fn slug_taken(conn: &Connection, slug: &str, exclude_id: Option<i64>) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM blog_posts WHERE slug = ?1 AND (?2 IS NULL OR id != ?2))",
        (slug, exclude_id),
        |row| row.get(0),
    )
}

/// Base slug for `title`, or a salted one when the base is empty or already
/// used by another post.
fn unique_slug(conn: &Connection, title: &str, exclude_id: Option<i64>) -> rusqlite::Result<String> {
    let candidate = generate_slug(title, false);
    if candidate.is_empty() || slug_taken(conn, &candidate, exclude_id)? {
        Ok(generate_slug(title, true))
    } else {
        Ok(candidate)
    }
}

fn validate_title(title: &str) -> ServiceResult<()> {
    let len = title.chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&len) {
        return Err(ServiceError::BadRequest(format!(
            "Title must be between {} and {} characters",
            MIN_TITLE_LENGTH, MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_content(content: &str, max_length: usize) -> ServiceResult<()> {
    if content.chars().count() > max_length {
        return Err(ServiceError::BadRequest(format!(
            "Content must be {} characters or less",
            max_length
        )));
    }
    Ok(())
}

fn parse_state(raw: &str) -> ServiceResult<PostState> {
    raw.parse()
        .map_err(|_| ServiceError::BadRequest(format!("Invalid state: {}", raw)))
}

/// An explicit `userId` must name an existing user.
fn ensure_user_exists(conn: &Connection, user_id: i64) -> ServiceResult<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)",
        [user_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(ServiceError::BadRequest("Invalid userId".to_string()));
    }
    Ok(())
}

fn validate_image(store: &ResourceStore, image: &ImageUpload) -> ServiceResult<()> {
    store
        .validate_image(&image.data)
        .map(|_| ())
        .map_err(|e| ServiceError::BadRequest(e.to_string()))
}

/// Looks a post up by numeric id or, failing that shape, by slug.
pub fn get_post(db: &Database, id_or_slug: &str) -> ServiceResult<BlogPost> {
    let conn = db.get()?;
    let key = id_or_slug.trim();

    let post = if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        match key.parse::<i64>() {
            Ok(id) => find_by_id(&conn, id)?,
            Err(_) => None,
        }
    } else {
        find_by_slug(&conn, key)?
    };

    post.ok_or_else(|| ServiceError::NotFound("Blog not found".to_string()))
}

/// Deletes a post together with its stored image. Returns the deleted row.
pub fn delete_post(db: &Database, store: &ResourceStore, id: i64) -> ServiceResult<BlogPost> {
    let conn = db.get()?;
    let post = find_by_id(&conn, id)?
        .ok_or_else(|| ServiceError::NotFound("Blog not found or already deleted".to_string()))?;

    let affected = conn.execute("DELETE FROM blog_posts WHERE id = ?", [id])?;
    if affected == 0 {
        return Err(ServiceError::NotFound(
            "Blog not found or already deleted".to_string(),
        ));
    }

    if !post.feature_image.is_empty() {
        if let Err(e) = store.remove(&post.feature_image) {
            tracing::warn!(id, path = %post.feature_image, "Failed to remove image of deleted post: {}", e);
        }
        if let Err(e) = store.remove_empty_parent(&post.feature_image) {
            tracing::warn!(id, "Failed to remove image directory of deleted post: {}", e);
        }
    }
    if let Err(e) = store.remove_post_dir(post.user_id, post.id) {
        tracing::warn!(id, "Failed to remove directory of deleted post: {}", e);
    }

    tracing::info!(id, slug = %post.slug, "Blog post deleted");
    Ok(post)
}

/// Creates a post when `input.id` is absent, otherwise updates the existing
/// one. `actor` is the session user; it becomes the owner of new posts that
/// carry no explicit user id.
pub fn upsert_post(
    db: &Database,
    store: &ResourceStore,
    actor: &User,
    input: UpsertPost,
    max_content_length: usize,
) -> ServiceResult<UpsertOutcome> {
    let input = input.normalized();
    match input.id {
        Some(id) => update_post(db, store, id, input, max_content_length).map(UpsertOutcome::Updated),
        None => create_post(db, store, actor, input, max_content_length).map(UpsertOutcome::Created),
    }
}

fn update_post(
    db: &Database,
    store: &ResourceStore,
    id: i64,
    input: UpsertPost,
    max_content_length: usize,
) -> ServiceResult<BlogPost> {
    let conn = db.get()?;
    let existing =
        find_by_id(&conn, id)?.ok_or_else(|| ServiceError::NotFound("Blog not found".to_string()))?;

    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    if let Some(content) = &input.content {
        validate_content(content, max_content_length)?;
    }
    let state = match &input.state {
        Some(raw) => parse_state(raw)?,
        None => existing.state,
    };
    if let Some(image) = &input.feature_image {
        validate_image(store, image)?;
    }
    if let Some(user_id) = input.user_id {
        ensure_user_exists(&conn, user_id)?;
    }

    let slug = match &input.title {
        Some(title) if *title != existing.title => unique_slug(&conn, title, Some(id))?,
        _ => existing.slug.clone(),
    };

    let user_id = input.user_id.unwrap_or(existing.user_id);
    let new_image = match &input.feature_image {
        Some(image) => Some(store.save(user_id, id, &image.file_name, &image.data)?),
        None => None,
    };

    let title = input.title.unwrap_or_else(|| existing.title.clone());
    let content = input.content.unwrap_or_else(|| existing.content.clone());
    let tags = input.tags.unwrap_or_else(|| existing.tags.clone());
    let feature_image = new_image
        .clone()
        .unwrap_or_else(|| existing.feature_image.clone());
    let timestamp = now();
    let published_at = (state == PostState::Published).then(|| timestamp.clone());

    let result = conn.execute(
        r#"
        UPDATE blog_posts SET title = ?, slug = ?, content = ?, feature_image = ?, state = ?, tags = ?, user_id = ?, updated_at = ?, published_at = ?
        WHERE id = ?
        "#,
        (
            &title,
            &slug,
            &content,
            &feature_image,
            state.to_string(),
            serde_json::to_string(&tags)?,
            user_id,
            &timestamp,
            &published_at,
            id,
        ),
    );

    let affected = match result {
        Ok(n) => n,
        Err(e) => {
            discard_upload(store, new_image.as_deref());
            return Err(e.into());
        }
    };
    if affected == 0 {
        discard_upload(store, new_image.as_deref());
        return Err(ServiceError::NotFound("Blog not found".to_string()));
    }

    if new_image.is_some() && !existing.feature_image.is_empty() {
        if let Err(e) = store.remove(&existing.feature_image) {
            tracing::warn!(id, path = %existing.feature_image, "Failed to remove replaced image: {}", e);
        }
        if let Err(e) = store.remove_empty_parent(&existing.feature_image) {
            tracing::warn!(id, "Failed to remove directory of replaced image: {}", e);
        }
    }

    tracing::info!(id, slug = %slug, state = %state, "Blog post updated");

    find_by_id(&conn, id)?.ok_or_else(|| ServiceError::NotFound("Blog not found".to_string()))
}

fn create_post(
    db: &Database,
    store: &ResourceStore,
    actor: &User,
    input: UpsertPost,
    max_content_length: usize,
) -> ServiceResult<BlogPost> {
    let (Some(title), Some(content), Some(image), Some(tags)) =
        (input.title, input.content, input.feature_image, input.tags)
    else {
        return Err(ServiceError::BadRequest("Missing required fields".to_string()));
    };

    validate_title(&title)?;
    validate_content(&content, max_content_length)?;
    validate_image(store, &image)?;

    let mut conn = db.get()?;
    if let Some(user_id) = input.user_id {
        ensure_user_exists(&conn, user_id)?;
    }
    let user_id = input.user_id.unwrap_or(actor.id);

    let tx = conn.transaction()?;

    let slug = unique_slug(&tx, &title, None)?;
    let timestamp = now();

    // New posts always start as drafts, whatever state was requested.
    tx.execute(
        r#"
        INSERT INTO blog_posts (title, slug, content, feature_image, state, tags, user_id, created_at, updated_at, published_at)
        VALUES (?, ?, ?, '', ?, ?, ?, ?, ?, NULL)
        "#,
        (
            &title,
            &slug,
            &content,
            PostState::Draft.to_string(),
            serde_json::to_string(&tags)?,
            user_id,
            &timestamp,
            &timestamp,
        ),
    )?;
    let id = tx.last_insert_rowid();

    // The directory embeds the assigned id, so the file can only be written
    // once the row exists. Both writes commit together.
    let relative = match store.save(user_id, id, &image.file_name, &image.data) {
        Ok(relative) => relative,
        Err(e) => {
            discard_post_dir(store, user_id, id);
            return Err(e.into());
        }
    };

    let finished = tx
        .execute(
            "UPDATE blog_posts SET feature_image = ? WHERE id = ?",
            (&relative, id),
        )
        .and_then(|_| tx.commit());
    if let Err(e) = finished {
        discard_upload(store, Some(&relative));
        discard_post_dir(store, user_id, id);
        return Err(e.into());
    }

    tracing::info!(id, slug = %slug, user_id, "Blog post created");

    find_by_id(&conn, id)?.ok_or_else(|| ServiceError::NotFound("Blog not found".to_string()))
}

fn discard_upload(store: &ResourceStore, relative: Option<&str>) {
    if let Some(path) = relative {
        if let Err(e) = store.remove(path) {
            tracing::warn!(path, "Failed to discard uploaded image: {}", e);
        }
    }
}

fn discard_post_dir(store: &ResourceStore, user_id: i64, post_id: i64) {
    if let Err(e) = store.remove_post_dir(user_id, post_id) {
        tracing::warn!(user_id, post_id, "Failed to discard post directory: {}", e);
    }
}
