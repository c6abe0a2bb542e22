//! Role lookup for the room controls.
//!
//! The role comes from the first source that has one: an explicit value,
//! the auth session, session storage, then the persisted auth snapshot in
//! local storage. Anything unreadable along the way means "no privileges".

use serde_json::Value;
use tracing::warn;

use crate::error::FrontDeskError;
use crate::storage::{KeyValueStorage, AUTH_STORAGE_KEY, SESSION_USER_KEY};
use crate::structs::{RoleCode, RoleId, Session};

pub const NO_ROLE: RoleId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Receptionist,
    Staff,
    Manager,
    Unknown,
}

impl From<RoleId> for Role {
    fn from(id: RoleId) -> Self {
        match id {
            1 => Role::Admin,
            2 => Role::Receptionist,
            3 => Role::Staff,
            4 => Role::Manager,
            _ => Role::Unknown,
        }
    }
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Receptionist => "Receptionist",
            Role::Staff => "General staff",
            Role::Manager => "Manager",
            Role::Unknown => "Unknown",
        }
    }

    pub fn permissions(self) -> Permissions {
        Permissions {
            can_edit: matches!(self, Role::Admin | Role::Manager),
            can_delete: self == Role::Manager,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Everything a role may be read from, already pulled out of storage.
#[derive(Debug, Clone, Default)]
pub struct RoleSources<'a> {
    pub explicit: Option<RoleId>,
    pub session: Option<&'a Session>,
    pub session_storage: Option<String>,
    pub auth_storage: Option<String>,
}

impl<'a> RoleSources<'a> {
    pub fn gather(
        explicit: Option<RoleId>,
        session: Option<&'a Session>,
        session_storage: &dyn KeyValueStorage,
        local_storage: &dyn KeyValueStorage,
    ) -> Self {
        RoleSources {
            explicit,
            session,
            session_storage: session_storage.get_item(SESSION_USER_KEY),
            auth_storage: local_storage.get_item(AUTH_STORAGE_KEY),
        }
    }
}

type RoleResolver = fn(&RoleSources<'_>) -> Result<Option<RoleId>, FrontDeskError>;

const RESOLVERS: [(&str, RoleResolver); 4] = [
    ("explicit", from_explicit as RoleResolver),
    ("session", from_session as RoleResolver),
    ("session storage", from_session_storage as RoleResolver),
    ("auth storage", from_auth_storage as RoleResolver),
];

pub fn resolve_role(sources: &RoleSources<'_>) -> RoleId {
    for (name, resolver) in RESOLVERS {
        match resolver(sources) {
            Ok(Some(role)) => return role,
            Ok(None) => continue,
            Err(e) => {
                warn!("cannot read role from {}: {}", name, e);
                return NO_ROLE;
            }
        }
    }
    NO_ROLE
}

pub fn from_explicit(sources: &RoleSources<'_>) -> Result<Option<RoleId>, FrontDeskError> {
    Ok(sources.explicit.filter(|role| *role > 0))
}

pub fn from_session(sources: &RoleSources<'_>) -> Result<Option<RoleId>, FrontDeskError> {
    let code = sources
        .session
        .and_then(|s| s.user.as_ref())
        .and_then(|u| u.role_id.as_ref());
    match code {
        Some(RoleCode::Number(0)) | None => Ok(None),
        Some(RoleCode::Number(role)) => Ok(Some(*role)),
        Some(RoleCode::Text(text)) if text.is_empty() => Ok(None),
        Some(RoleCode::Text(text)) => text
            .trim()
            .parse::<RoleId>()
            .map(Some)
            .map_err(|_| FrontDeskError::InvalidRole(text.clone())),
    }
}

/// Session storage `user` entry; only a numeric `roleId` counts.
pub fn from_session_storage(sources: &RoleSources<'_>) -> Result<Option<RoleId>, FrontDeskError> {
    let raw = match sources.session_storage.as_deref() {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    let user: Value = serde_json::from_str(raw)?;
    Ok(user
        .get("roleId")
        .and_then(Value::as_i64)
        .filter(|role| *role != 0))
}

/// Persisted auth snapshot, `{"state": {"user": {"roleId": ..}}}`.
pub fn from_auth_storage(sources: &RoleSources<'_>) -> Result<Option<RoleId>, FrontDeskError> {
    let raw = match sources.auth_storage.as_deref() {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    let snapshot: Value = serde_json::from_str(raw)?;
    Ok(snapshot
        .pointer("/state/user/roleId")
        .and_then(Value::as_i64)
        .filter(|role| *role != 0))
}

/// Auth snapshot in the shape `from_auth_storage` reads.
pub fn auth_snapshot(role: RoleId) -> String {
    serde_json::json!({ "state": { "user": { "roleId": role } } }).to_string()
}
