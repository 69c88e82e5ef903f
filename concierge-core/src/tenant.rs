//! Tenant identification and context
//!
//! Tenants are top-level organizations (hotel chains); users belong to at
//! most one, carried as a claim in the bearer token. System admins and
//! anonymous guests are tenant-less and operate in a system-wide context.
//!
//! Tenant resolution never performs a network call: it is a pure function of
//! the token's tenant claim plus a lookup against a locally configured
//! tenant directory. Token inspection here is deliberately lenient (a
//! malformed token means "no tenant claim", not an error) and performs no
//! signature verification, since the token is opaque to the client.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{error::ValidationError, session::SessionToken};

/// Strongly-typed tenant identifier.
///
/// Validation rules: non-empty, ASCII alphanumeric plus hyphens and
/// underscores, at most 64 characters, case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(TenantId(id))
    }

    /// Bypasses validation; only for values from trusted storage.
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        TenantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), ValidationError> {
        if id.is_empty() {
            return Err(ValidationError::InvalidTenantId {
                id: id.to_string(),
                reason: "Tenant ID cannot be empty".to_string(),
            });
        }

        if id.len() > 64 {
            return Err(ValidationError::InvalidTenantId {
                id: id.to_string(),
                reason: "Tenant ID cannot exceed 64 characters".to_string(),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidTenantId {
                id: id.to_string(),
                reason:
                    "Tenant ID can only contain ASCII alphanumeric characters, hyphens, and underscores"
                        .to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TenantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A tenant directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub id: TenantId,
    pub name: String,
    pub subdomain: String,
}

/// A locally configured directory of known tenants.
///
/// Lookup by id only; no network access.
#[derive(Debug, Clone, Default)]
pub struct TenantDirectory {
    tenants: Vec<TenantInfo>,
}

impl TenantDirectory {
    pub fn new(tenants: Vec<TenantInfo>) -> Self {
        TenantDirectory { tenants }
    }

    pub fn find(&self, id: &TenantId) -> Option<&TenantInfo> {
        self.tenants.iter().find(|t| &t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

/// The resolved tenant context derived from the active session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TenantContext {
    pub tenant_id: Option<TenantId>,

    /// Directory metadata for the tenant, when the directory knows it.
    pub tenant: Option<TenantInfo>,
}

impl TenantContext {
    /// Derived, never stored independently: system-wide means no tenant.
    pub fn is_system_wide_context(&self) -> bool {
        self.tenant_id.is_none()
    }
}

#[derive(Deserialize)]
struct TenantClaims {
    #[serde(rename = "tenantId")]
    tenant_id: Option<String>,
}

/// Extract the tenant claim from a bearer token without verifying it.
///
/// Returns `None` for tokens that are not JWTs, have an undecodable payload,
/// carry no tenant claim, or carry one that fails [`TenantId`] validation.
/// All of these mean "system-wide user" to the caller.
pub fn tenant_claim_from_token(token: &SessionToken) -> Option<TenantId> {
    let mut parts = token.as_str().split('.');
    let (_header, payload) = (parts.next()?, parts.next()?);
    if parts.next().is_none() {
        // Two segments only: not a JWT.
        return None;
    }

    let decoded = BASE64_URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TenantClaims = serde_json::from_slice(&decoded).ok()?;
    let raw = claims.tenant_id?;

    match TenantId::new(raw) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring invalid tenant claim in token");
            None
        }
    }
}
