//! Tenant resolution for the active session
//!
//! Derives the active tenant from the bearer token's tenant claim plus a
//! locally configured tenant directory. Never performs a network call, and
//! never stores the system-wide flag as independent state: it is always
//! derived from the presence of a tenant id.

use concierge_core::{
    SessionToken, TenantContext, TenantDirectory, TenantId,
    tenant::tenant_claim_from_token,
};

pub struct TenantResolver {
    directory: TenantDirectory,
    context: TenantContext,
}

impl TenantResolver {
    pub fn new(directory: TenantDirectory) -> Self {
        Self {
            directory,
            context: TenantContext::default(),
        }
    }

    /// Re-derive the tenant from a token. A missing or undecodable claim is
    /// a valid outcome meaning "system-wide user", never an error.
    pub fn update_from_token(&mut self, token: &SessionToken) {
        let claim = tenant_claim_from_token(token);
        if claim.is_none() {
            tracing::debug!("No tenant claim in token; system-wide context");
        }
        self.set_tenant_id(claim);
    }

    /// Set the tenant by id, resolving directory metadata when known. `None`
    /// clears the tenant without a lookup.
    pub fn set_tenant_id(&mut self, tenant_id: Option<TenantId>) {
        match tenant_id {
            Some(id) => {
                let tenant = self.directory.find(&id).cloned();
                if tenant.is_none() {
                    tracing::debug!(tenant_id = %id, "Tenant not in local directory");
                }
                self.context = TenantContext {
                    tenant_id: Some(id),
                    tenant,
                };
            }
            None => {
                self.context = TenantContext::default();
            }
        }
    }

    /// Called on logout.
    pub fn clear(&mut self) {
        self.set_tenant_id(None);
    }

    pub fn context(&self) -> &TenantContext {
        &self.context
    }

    pub fn is_system_wide_context(&self) -> bool {
        self.context.is_system_wide_context()
    }
}
