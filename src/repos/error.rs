/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    // Same owner already has an item with this (case-insensitive) name
    #[error("conflict")]
    Conflict,
}
