/*
 * Responsibility
 * - todo items の request/response DTO
 * - validation (形式チェック) 用の validate()
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::todo_repo::{Page, TodoItemRow};

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 250;
const PAGE_SIZE_DEFAULT: usize = 15;
const PAGE_SIZE_MAX: usize = 100;
const PAGE_MAX: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct CreateTodoItemRequest {
    pub name: String,
}

/// PUT body; same rules as create.
pub type UpdateTodoItemRequest = CreateTodoItemRequest;

impl CreateTodoItemRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.name.trim();
        let chars = name.chars().count();
        if chars < NAME_MIN_CHARS || chars > NAME_MAX_CHARS {
            return Err("name must be 3 to 250 characters");
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        {
            return Err("name may only contain letters, digits and spaces");
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListQuery {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(page) = self.page
            && !(1..=PAGE_MAX).contains(&page)
        {
            return Err("page must be 1 to 10000");
        }
        if let Some(size) = self.page_size
            && !(1..=PAGE_SIZE_MAX).contains(&size)
        {
            return Err("page_size must be 1 to 100");
        }
        Ok(())
    }

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(PAGE_SIZE_DEFAULT)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct TodoItemResponse {
    pub slug: String,
    pub name: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TodoItemRow> for TodoItemResponse {
    fn from(row: TodoItemRow) -> Self {
        Self {
            slug: row.slug,
            name: row.name,
            is_completed: row.is_completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<TodoItemResponse>,
    pub meta: ListMeta,
}

impl ListResponse {
    pub fn from_page(page: Page, query: &ListQuery) -> Self {
        let per_page = query.page_size();
        let current = query.page();
        let total_pages = page.total.div_ceil(per_page);

        Self {
            data: page.items.into_iter().map(TodoItemResponse::from).collect(),
            meta: ListMeta {
                page: current,
                per_page,
                total: page.total,
                total_pages,
                has_next: current < total_pages,
                has_previous: current > 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str) -> CreateTodoItemRequest {
        CreateTodoItemRequest {
            name: name.to_string(),
        }
    }

    #[test]
    fn name_rules() {
        assert!(request("Buy milk").validate().is_ok());
        assert!(request("ab").validate().is_err());
        assert!(request(&"a".repeat(251)).validate().is_err());
        assert!(request("Buy milk!").validate().is_err());
    }

    #[test]
    fn list_query_defaults_and_bounds() {
        let query = ListQuery::default();
        assert_eq!((query.page(), query.page_size()), (1, 15));
        assert!(query.validate().is_ok());

        let zero_page = ListQuery {
            page: Some(0),
            ..ListQuery::default()
        };
        assert!(zero_page.validate().is_err());

        let huge = ListQuery {
            page_size: Some(500),
            ..ListQuery::default()
        };
        assert!(huge.validate().is_err());

        let far = ListQuery {
            page: Some(usize::MAX),
            ..ListQuery::default()
        };
        assert!(far.validate().is_err());
    }
}
