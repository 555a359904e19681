use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Image, ImageFlag, NewImage};

/// Row storage for image metadata
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Every image with `published = true`
    async fn list_published(&self) -> Result<Vec<Image>>;

    /// Images owned by `user_id`, newest first
    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Image>>;

    async fn insert(&self, image: NewImage) -> Result<Image>;

    /// Set one flag on an image the user owns; unknown ids are not an error
    async fn update_flag(&self, user_id: &str, id: &str, flag: ImageFlag, value: bool) -> Result<()>;

    /// Delete an image row the user owns; unknown ids are not an error
    async fn delete(&self, user_id: &str, id: &str) -> Result<()>;
}

/// `ImageStore` backed by the `images` table
#[derive(Clone)]
pub struct SqliteImageStore {
    db: Database,
}

impl SqliteImageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImageStore for SqliteImageStore {
    async fn list_published(&self) -> Result<Vec<Image>> {
        let images: Vec<Image> = sqlx::query_as("SELECT * FROM images WHERE published = 1")
            .fetch_all(self.db.pool())
            .await?;
        Ok(images)
    }

    async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Image>> {
        let images: Vec<Image> =
            sqlx::query_as("SELECT * FROM images WHERE user_id = ? ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(self.db.pool())
                .await?;
        Ok(images)
    }

    async fn insert(&self, image: NewImage) -> Result<Image> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        sqlx::query(
            r#"
            INSERT INTO images (id, user_id, filename, storage_path, published, dark, created_at)
            VALUES (?, ?, ?, ?, 0, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(&image.user_id)
        .bind(&image.filename)
        .bind(&image.storage_path)
        .bind(&now)
        .execute(self.db.pool())
        .await?;

        Ok(Image {
            id,
            user_id: image.user_id,
            filename: image.filename,
            storage_path: image.storage_path,
            published: false,
            dark: false,
            created_at: now,
        })
    }

    async fn update_flag(&self, user_id: &str, id: &str, flag: ImageFlag, value: bool) -> Result<()> {
        let sql = format!(
            "UPDATE images SET {} = ? WHERE id = ? AND user_id = ?",
            flag.column()
        );
        sqlx::query(&sql)
            .bind(value)
            .bind(id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM images WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_image(user_id: &str, path: &str) -> NewImage {
        NewImage {
            user_id: user_id.to_string(),
            filename: "photo.jpg".to_string(),
            storage_path: path.to_string(),
        }
    }

    async fn store() -> SqliteImageStore {
        SqliteImageStore::new(Database::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_defaults_private() {
        let store = store().await;
        let image = store.insert(new_image("u1", "u1/1-a.jpg")).await.unwrap();
        assert!(!image.published);
        assert!(!image.dark);

        let listed = store.list_by_owner("u1").await.unwrap();
        assert_eq!(listed, vec![image]);
        assert!(store.list_published().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first() {
        let store = store().await;
        let first = store.insert(new_image("u1", "u1/1-a.jpg")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.insert(new_image("u1", "u1/2-b.jpg")).await.unwrap();
        store.insert(new_image("u2", "u2/3-c.jpg")).await.unwrap();

        let ids: Vec<String> = store
            .list_by_owner("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_flag_scoped_to_owner() {
        let store = store().await;
        let image = store.insert(new_image("u1", "u1/1-a.jpg")).await.unwrap();

        store
            .update_flag("u2", &image.id, ImageFlag::Published, true)
            .await
            .unwrap();
        assert!(store.list_published().await.unwrap().is_empty());

        store
            .update_flag("u1", &image.id, ImageFlag::Published, true)
            .await
            .unwrap();
        store
            .update_flag("u1", &image.id, ImageFlag::Dark, true)
            .await
            .unwrap();
        let published = store.list_published().await.unwrap();
        assert_eq!(published.len(), 1);
        assert!(published[0].dark);
    }

    #[tokio::test]
    async fn test_storage_path_is_unique() {
        let store = store().await;
        store.insert(new_image("u1", "u1/1-a.jpg")).await.unwrap();
        assert!(store.insert(new_image("u1", "u1/1-a.jpg")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_ok() {
        let store = store().await;
        let image = store.insert(new_image("u1", "u1/1-a.jpg")).await.unwrap();
        store.delete("u1", "missing").await.unwrap();
        store.delete("u2", &image.id).await.unwrap();
        assert_eq!(store.list_by_owner("u1").await.unwrap().len(), 1);

        store.delete("u1", &image.id).await.unwrap();
        assert!(store.list_by_owner("u1").await.unwrap().is_empty());
    }
}
