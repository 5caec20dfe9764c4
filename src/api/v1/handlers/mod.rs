pub mod health;
pub mod identity;
pub mod todo_items;
