//! Position (role) model and permission sets

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::collections::BTreeSet;
use validator::Validate;

use super::enums::Permission;
use super::reference::EntityRef;

/// Set of permission tokens, kept in catalog order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self(permissions.into_iter().collect())
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn grant(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    pub fn revoke(&mut self, permission: Permission) {
        self.0.remove(&permission);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Parse raw tokens, dropping those outside the catalog
    pub fn from_tokens<S: AsRef<str>>(tokens: impl IntoIterator<Item = S>) -> Self {
        let mut set = BTreeSet::new();
        for token in tokens {
            match Permission::from_token(token.as_ref()) {
                Some(p) => {
                    set.insert(p);
                }
                None => tracing::warn!("Ignoring unknown permission token: {}", token.as_ref()),
            }
        }
        Self(set)
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(Permission::token))
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(PermissionSet::from_tokens(tokens))
    }
}

/// Position record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    /// Display priority, lower first
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub department: Option<EntityRef>,
    #[serde(default)]
    pub permissions: PermissionSet,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create position request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePosition {
    #[validate(length(min = 1, message = "Tên chức vụ là bắt buộc"))]
    pub name: String,
    #[validate(range(max = 1000, message = "Thứ tự không hợp lệ"))]
    pub order: u32,
    #[validate(length(min = 1, message = "Phòng ban là bắt buộc"))]
    pub department: String,
    pub permissions: PermissionSet,
    pub description: Option<String>,
}

/// Update position request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePosition {
    pub name: Option<String>,
    pub order: Option<u32>,
    pub department: Option<String>,
    pub permissions: Option<PermissionSet>,
    pub description: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFilter {
    pub department: Option<String>,
    pub search: Option<String>,
}
