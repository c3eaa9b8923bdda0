//! JSON-file persistence for articles and their analysis columns.
//!
//! The whole store is one JSON array of [`StoredArticle`]s. Writes go to a
//! sibling temp file that is then renamed over the original, so readers
//! never observe a half-written document.

use crate::error::StoreError;
use crate::models::StoredArticle;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored article, ordered by id. A missing file is an empty store.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<StoredArticle>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut articles: Vec<StoredArticle> = serde_json::from_str(&raw)?;
        articles.sort_by_key(|a| a.id);
        debug!(count = articles.len(), "Loaded store");
        Ok(articles)
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(path = %self.path.display(), count = articles.len())
    )]
    pub async fn save(&self, articles: &[StoredArticle]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(articles)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!("Saved store");
        Ok(())
    }

    /// Append one record with the id following the current maximum.
    pub async fn insert<T, F>(&self, item: T, build: F) -> Result<u64, StoreError>
    where
        F: FnOnce(u64, T) -> Result<StoredArticle, StoreError>,
    {
        let mut stored = self.load().await?;
        let id = next_id(&stored);
        stored.push(build(id, item)?);
        self.save(&stored).await?;
        debug!(id, total = stored.len(), "Inserted article");
        Ok(id)
    }

    /// Append new records with ids following the current maximum.
    ///
    /// `build` turns each item into a record for the id it was given; ids
    /// are assigned in input order.
    pub async fn insert_all<T, F>(
        &self,
        items: Vec<T>,
        mut build: F,
    ) -> Result<Vec<u64>, StoreError>
    where
        F: FnMut(u64, T) -> Result<StoredArticle, StoreError>,
    {
        let mut stored = self.load().await?;
        let mut id = next_id(&stored);
        let mut ids = Vec::with_capacity(items.len());

        for item in items {
            stored.push(build(id, item)?);
            ids.push(id);
            id += 1;
        }

        self.save(&stored).await?;
        info!(inserted = ids.len(), total = stored.len(), "Inserted articles");
        Ok(ids)
    }

    /// Re-read the store, change the record with `id` and write it back.
    ///
    /// Records written by other processes since the last read are kept.
    pub async fn update<F>(&self, id: u64, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StoredArticle) -> Result<(), StoreError>,
    {
        let mut stored = self.load().await?;
        let record = stored
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { id })?;
        change(record)?;
        self.save(&stored).await?;
        debug!(id, "Updated article");
        Ok(())
    }

    pub async fn find(&self, id: u64) -> Result<StoredArticle, StoreError> {
        self.load()
            .await?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound { id })
    }
}

fn next_id(stored: &[StoredArticle]) -> u64 {
    stored.iter().map(|a| a.id).max().unwrap_or(0) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidArticle;
    use chrono::NaiveDate;

    fn article(title: &str) -> ValidArticle {
        ValidArticle {
            title: title.to_string(),
            description: "Health officials report".to_string(),
            image_url: "https://example.com/a.png".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            time: "09:00:00".to_string(),
            read_more: "https://example.com/a".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("news.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("data/news.json"));

        let first = store
            .insert_all(vec![article("one"), article("two")], |id, a| {
                Ok(StoredArticle::new(id, a))
            })
            .await
            .unwrap();
        assert_eq!(first, vec![1, 2]);

        let second = store
            .insert_all(vec![article("three")], |id, a| Ok(StoredArticle::new(id, a)))
            .await
            .unwrap();
        assert_eq!(second, vec![3]);

        let all = store.load().await.unwrap();
        let titles: Vec<&str> = all.iter().map(|a| a.article.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
        assert!(!tmp.path().join("data/news.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_insert_keeps_built_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("news.json"));
        store
            .insert_all(vec![article("one")], |id, a| {
                let mut record = StoredArticle::new(id, a);
                record.sentiment_classification = Some("neutral".to_string());
                Ok(record)
            })
            .await
            .unwrap();

        let id = store
            .insert(article("two"), |id, a| Ok(StoredArticle::new(id, a)))
            .await
            .unwrap();
        assert_eq!(id, 2);

        let found = store.find(1).await.unwrap();
        assert_eq!(found.sentiment_classification.as_deref(), Some("neutral"));
    }

    #[tokio::test]
    async fn test_update_changes_one_record_and_keeps_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("news.json"));
        store
            .insert_all(vec![article("one"), article("two")], |id, a| {
                Ok(StoredArticle::new(id, a))
            })
            .await
            .unwrap();

        store
            .update(2, |record| {
                record.sentiment_classification = Some("mixed".to_string());
                Ok(())
            })
            .await
            .unwrap();

        let all = store.load().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sentiment_classification, None);
        assert_eq!(all[1].sentiment_classification.as_deref(), Some("mixed"));

        let err = store.update(9, |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 9 }));
    }

    #[tokio::test]
    async fn test_find_unknown_id_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("news.json"));
        let err = store.find(42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 42 }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("news.json");
        tokio::fs::write(&path, "[{not json").await.unwrap();
        let err = ArticleStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
