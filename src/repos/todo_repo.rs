/*
 * Responsibility
 * - todo items の保存と検索 (in-memory)
 * - slug の採番、owner ごとの名前の一意性 (大文字小文字は区別しない)
 */
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, Clone)]
pub struct TodoItemRow {
    pub slug: String,
    pub owner_id: String,
    pub name: String,
    pub normalized_name: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for list queries. `owner_id: None` lists every owner (admin / worker).
#[derive(Debug, Clone, Default)]
pub struct TodoFilter<'a> {
    pub owner_id: Option<&'a str>,
    pub search: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<TodoItemRow>,
    pub total: usize,
}

#[derive(Clone, Debug, Default)]
pub struct TodoRepo {
    rows: Arc<RwLock<Vec<TodoItemRow>>>,
}

impl TodoRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first. `page` starts at 1.
    pub async fn list(&self, filter: &TodoFilter<'_>, page: usize, page_size: usize) -> Page {
        let rows = self.rows.read().await;
        let search = filter.search.map(|s| s.to_uppercase());

        let mut matched = rows
            .iter()
            .filter(|r| filter.owner_id.is_none_or(|owner| r.owner_id == owner))
            .filter(|r| {
                search
                    .as_deref()
                    .is_none_or(|s| r.normalized_name.contains(s))
            })
            .cloned()
            .collect::<Vec<_>>();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matched.len();
        let items = matched
            .into_iter()
            .skip(page.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Page { items, total }
    }

    pub async fn create(&self, owner_id: &str, name: &str) -> Result<TodoItemRow, RepoError> {
        let mut rows = self.rows.write().await;
        let normalized_name = name.to_uppercase();

        if rows
            .iter()
            .any(|r| r.owner_id == owner_id && r.normalized_name == normalized_name)
        {
            return Err(RepoError::Conflict);
        }

        let slug = unique_slug(&rows, name);
        let now = Utc::now();
        let row = TodoItemRow {
            slug,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            normalized_name,
            is_completed: false,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());

        Ok(row)
    }

    /// `owner_id: None` finds the item regardless of owner.
    pub async fn get(&self, owner_id: Option<&str>, slug: &str) -> Option<TodoItemRow> {
        self.rows
            .read()
            .await
            .iter()
            .find(|r| r.slug == slug && owner_id.is_none_or(|owner| r.owner_id == owner))
            .cloned()
    }

    /// Renames an item. The slug stays. `Ok(None)`: no such item for this owner.
    pub async fn update_name(
        &self,
        owner_id: &str,
        slug: &str,
        name: &str,
    ) -> Result<Option<TodoItemRow>, RepoError> {
        let mut rows = self.rows.write().await;
        let normalized_name = name.to_uppercase();

        if rows.iter().any(|r| {
            r.owner_id == owner_id && r.slug != slug && r.normalized_name == normalized_name
        }) {
            return Err(RepoError::Conflict);
        }

        Ok(owned_mut(&mut rows, owner_id, slug).map(|row| {
            row.name = name.to_string();
            row.normalized_name = normalized_name;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    pub async fn set_completed(
        &self,
        owner_id: &str,
        slug: &str,
        is_completed: bool,
    ) -> Option<TodoItemRow> {
        let mut rows = self.rows.write().await;

        owned_mut(&mut rows, owner_id, slug).map(|row| {
            row.is_completed = is_completed;
            row.updated_at = Utc::now();
            row.clone()
        })
    }

    pub async fn delete(&self, owner_id: &str, slug: &str) -> bool {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| !(r.slug == slug && r.owner_id == owner_id));
        rows.len() != before
    }
}

fn owned_mut<'a>(
    rows: &'a mut [TodoItemRow],
    owner_id: &str,
    slug: &str,
) -> Option<&'a mut TodoItemRow> {
    rows.iter_mut()
        .find(|r| r.slug == slug && r.owner_id == owner_id)
}

// "Buy Milk" -> "buy-milk-3f9a2c1"; numeric suffix on collision
fn unique_slug(rows: &[TodoItemRow], name: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let base = format!("{}-{}", slugify(name), &random[..7]);

    let taken = |slug: &str| rows.iter().any(|r| r.slug == slug);

    if !taken(&base) {
        return base;
    }

    let mut suffix = 2;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_joins_words() {
        assert_eq!(slugify("  Buy  Milk 2day "), "buy-milk-2day");
    }

    #[tokio::test]
    async fn create_assigns_a_slug_and_rejects_duplicate_names_per_owner() {
        let repo = TodoRepo::new();

        let row = repo.create("alice", "Buy Milk").await.unwrap();
        assert!(row.slug.starts_with("buy-milk-"));
        assert!(!row.is_completed);

        assert!(matches!(
            repo.create("alice", "buy milk").await,
            Err(RepoError::Conflict)
        ));
        assert!(repo.create("bob", "Buy Milk").await.is_ok());
    }

    #[tokio::test]
    async fn get_and_delete_respect_the_owner() {
        let repo = TodoRepo::new();
        let row = repo.create("alice", "Walk dog").await.unwrap();

        assert!(repo.get(Some("bob"), &row.slug).await.is_none());
        assert!(repo.get(None, &row.slug).await.is_some());

        assert!(!repo.delete("bob", &row.slug).await);
        assert!(repo.delete("alice", &row.slug).await);
        assert!(repo.get(Some("alice"), &row.slug).await.is_none());
    }

    #[tokio::test]
    async fn list_filters_searches_and_pages() {
        let repo = TodoRepo::new();
        for name in ["Buy milk", "Buy bread", "Call mom"] {
            repo.create("alice", name).await.unwrap();
        }
        repo.create("bob", "Buy eggs").await.unwrap();

        let alice = TodoFilter {
            owner_id: Some("alice"),
            search: None,
        };
        let page = repo.list(&alice, 1, 2).await;
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(repo.list(&alice, 2, 2).await.items.len(), 1);

        let buying = TodoFilter {
            owner_id: None,
            search: Some("buy"),
        };
        assert_eq!(repo.list(&buying, 1, 15).await.total, 3);
    }

    #[tokio::test]
    async fn list_past_the_last_page_is_empty() {
        let repo = TodoRepo::new();
        repo.create("alice", "Buy milk").await.unwrap();

        let page = repo.list(&TodoFilter::default(), usize::MAX, 100).await;
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn update_name_keeps_the_slug_and_checks_uniqueness() {
        let repo = TodoRepo::new();
        let milk = repo.create("alice", "Buy milk").await.unwrap();
        repo.create("alice", "Buy bread").await.unwrap();

        assert!(matches!(
            repo.update_name("alice", &milk.slug, "BUY BREAD").await,
            Err(RepoError::Conflict)
        ));

        // same item, different case
        let renamed = repo
            .update_name("alice", &milk.slug, "Buy Milk")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.slug, milk.slug);
        assert_eq!(renamed.name, "Buy Milk");
        assert!(renamed.updated_at >= milk.updated_at);

        assert!(
            repo.update_name("bob", &milk.slug, "Steal milk")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn set_completed_toggles_only_the_owners_item() {
        let repo = TodoRepo::new();
        let row = repo.create("alice", "Walk dog").await.unwrap();

        assert!(repo.set_completed("bob", &row.slug, true).await.is_none());
        assert!(repo.set_completed("alice", &row.slug, true).await.unwrap().is_completed);
        assert!(!repo.set_completed("alice", &row.slug, false).await.unwrap().is_completed);
    }
}
