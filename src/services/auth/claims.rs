//! Claims carried by an authenticated principal, a decoded token or a user-info response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim types this API consumes.
pub mod claim_types {
    pub const PERMISSION: &str = "permission";
    pub const SCOPE: &str = "scope";
    pub const SUBJECT: &str = "sub";
    pub const LOCAL_USER_ID: &str = "local_user_id";

    pub const FAMILY_NAME: &str = "family_name";
    pub const GIVEN_NAME: &str = "given_name";
    pub const MIDDLE_NAME: &str = "middle_name";
    pub const NAME: &str = "name";
    pub const NICKNAME: &str = "nickname";
    pub const PREFERRED_USERNAME: &str = "preferred_username";
}

/// A single `(type, value)` assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of claims. Several claims may share a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Vec<Claim>);

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a JSON object (JWT payload, user-info body) into claims.
    ///
    /// - strings become one claim; a `scope` string is split on whitespace
    /// - arrays become one claim per element
    /// - numbers, booleans and objects keep their JSON text
    /// - `null` is dropped
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut set = Self::new();
        for (kind, value) in object {
            set.push_json(kind, value);
        }
        set
    }

    fn push_json(&mut self, kind: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::String(s) if kind == claim_types::SCOPE => {
                for scope in s.split_whitespace() {
                    self.push(Claim::new(kind, scope));
                }
            }
            Value::String(s) => self.push(Claim::new(kind, s.as_str())),
            Value::Array(items) => {
                for item in items {
                    self.push_json(kind, item);
                }
            }
            Value::Bool(_) | Value::Number(_) | Value::Object(_) => {
                self.push(Claim::new(kind, value.to_string()))
            }
        }
    }

    pub fn push(&mut self, claim: Claim) {
        self.0.push(claim);
    }

    /// Exact, case-sensitive match on both type and value.
    pub fn contains(&self, kind: &str, value: &str) -> bool {
        self.0.iter().any(|c| c.kind == kind && c.value == value)
    }

    pub fn first(&self, kind: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Claim> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ClaimSet {
    type Item = Claim;
    type IntoIter = std::vec::IntoIter<Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClaimSet {
    type Item = &'a Claim;
    type IntoIter = std::slice::Iter<'a, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn scope_string_is_split_on_whitespace() {
        let set = ClaimSet::from_json_object(&object(json!({
            "scope": "read.todoitem  write.todoitem"
        })));

        let scopes: Vec<&str> = set
            .iter()
            .filter(|c| c.kind == claim_types::SCOPE)
            .map(|c| c.value.as_str())
            .collect();
        assert_eq!(scopes, vec!["read.todoitem", "write.todoitem"]);
    }

    #[test]
    fn other_strings_are_kept_verbatim() {
        let set = ClaimSet::from_json_object(&object(json!({
            "permission": "View TodoItem"
        })));

        assert!(set.contains(claim_types::PERMISSION, "View TodoItem"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn arrays_expand_and_scalars_keep_json_text() {
        let set = ClaimSet::from_json_object(&object(json!({
            "permission": ["View TodoItem", "Edit TodoItem"],
            "exp": 1700000000,
            "email_verified": true,
            "nickname": null
        })));

        assert!(set.contains("permission", "View TodoItem"));
        assert!(set.contains("permission", "Edit TodoItem"));
        assert_eq!(set.first("exp"), Some("1700000000"));
        assert_eq!(set.first("email_verified"), Some("true"));
        assert_eq!(set.first("nickname"), None);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let set: ClaimSet = [Claim::new("permission", "View TodoItem")]
            .into_iter()
            .collect();

        assert!(!set.contains("permission", "view todoitem"));
        assert!(!set.contains("Permission", "View TodoItem"));
    }

    #[test]
    fn serializes_as_type_value_pairs() {
        let set: ClaimSet = [Claim::new("sub", "alice")].into_iter().collect();
        let json = serde_json::to_value(&set).unwrap();

        assert_eq!(json, json!([{ "type": "sub", "value": "alice" }]));
    }
}
