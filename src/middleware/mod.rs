/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: 認証 (cookie session / bearer) と endpoint 単位の認可
 * - cors / http / security_headers: Router 全体に掛ける横断的な layer
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
