use axum::http::{header, HeaderMap};
use subtle::ConstantTimeEq;

use crate::config::Config;

/// Constant-time string comparison to prevent timing attacks
/// Use this for comparing API keys and other sensitive values
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Access level of an admin API key. Admins can do everything editors can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Editor,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No key, or a key that matches nothing
    Unauthenticated,
    /// Valid key, but its role is too low
    Forbidden,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Role granted by the request's `Authorization: Bearer <key>` header.
pub fn authenticate(config: &Config, headers: &HeaderMap) -> Option<Role> {
    let token = bearer_token(headers)?;

    if constant_time_compare(token, &config.admin_api_key) {
        return Some(Role::Admin);
    }
    match &config.editor_api_key {
        Some(key) if constant_time_compare(token, key) => Some(Role::Editor),
        _ => None,
    }
}

/// Check that the request carries a key with at least `required`.
pub fn require_role(config: &Config, headers: &HeaderMap, required: Role) -> Result<Role, AuthError> {
    let role = authenticate(config, headers).ok_or(AuthError::Unauthenticated)?;
    if role < required {
        return Err(AuthError::Forbidden);
    }
    Ok(role)
}
