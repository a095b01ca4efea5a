//! Tenant and user storage.
//!
//! Owns the tenant records, the users belonging to each tenant, and the two
//! uniqueness indexes the system enforces: tenant names system-wide and
//! email addresses within a tenant. Tenant creation with a bundled batch of
//! initial users is atomic: every field of the batch is validated before the
//! first map insertion, so a failed call leaves no tenant and no users.

use dashmap::DashMap;

use crate::core::error::{Error, Result};
use crate::core::ids::{TenantId, UserId};
use crate::core::model::{Tenant, TenantKind, User, UserKind};

/// Fields required to create a user, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Email address, unique within the tenant
    pub email: String,
    /// User classification
    pub kind: UserKind,
}

/// Concurrent store for tenants and their users.
#[derive(Debug, Default)]
pub struct TenantStore {
    /// Tenant records by id
    tenants: DashMap<TenantId, Tenant>,
    /// Tenant name uniqueness index (lowercased name -> id)
    names: DashMap<String, TenantId>,
    /// User records by id
    users: DashMap<UserId, User>,
    /// Email uniqueness index, scoped per tenant (lowercased)
    emails: DashMap<(TenantId, String), UserId>,
    /// User ids per tenant, for enumeration
    tenant_users: DashMap<TenantId, Vec<UserId>>,
}

impl TenantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tenants.
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    /// Number of users across all tenants.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Whether a tenant exists.
    pub fn tenant_exists(&self, id: &TenantId) -> bool {
        self.tenants.contains_key(id)
    }

    /// Create a tenant, optionally with an initial batch of users.
    ///
    /// All validation happens before any state is touched. The tenant name
    /// reservation is a single atomic index insertion, so two concurrent
    /// calls with the same name cannot both succeed.
    pub fn create_tenant(
        &self,
        name: &str,
        kind: TenantKind,
        initial_users: &[NewUser],
    ) -> Result<(Tenant, Vec<User>)> {
        validate_tenant_name(name)?;
        for user in initial_users {
            validate_user_name(&user.name)?;
            validate_email(&user.email)?;
        }

        // Duplicate emails inside the batch would violate the per-tenant
        // uniqueness the moment they land.
        let mut seen = std::collections::HashSet::new();
        for user in initial_users {
            if !seen.insert(user.email.to_lowercase()) {
                return Err(Error::conflict(format!(
                    "duplicate email in initial users: {}",
                    user.email
                )));
            }
        }

        let id = TenantId::generate();

        // Reserve the name; the entry guard makes the check-and-insert atomic.
        match self.names.entry(name.to_lowercase()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(Error::conflict(format!("tenant {:?} already exists", name)));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let tenant = Tenant {
            id,
            name: name.to_string(),
            kind,
        };
        self.tenants.insert(id, tenant.clone());

        // The tenant id is fresh, so the batch cannot collide with existing
        // emails; intra-batch duplicates were rejected above.
        let mut created = Vec::with_capacity(initial_users.len());
        for user in initial_users {
            created.push(self.insert_user(id, user));
        }

        tracing::info!(tenant = %id, name, users = created.len(), "tenant created");
        Ok((tenant, created))
    }

    /// Look up a tenant by id.
    pub fn get_tenant(&self, id: &TenantId) -> Result<Tenant> {
        self.tenants
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(format!("tenant {}", id)))
    }

    /// Snapshot of all tenants.
    pub fn list_tenants(&self) -> Vec<Tenant> {
        self.tenants
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Create a user under an existing tenant.
    pub fn create_user(
        &self,
        tenant: &TenantId,
        name: &str,
        email: &str,
        kind: UserKind,
    ) -> Result<User> {
        if !self.tenant_exists(tenant) {
            return Err(Error::not_found(format!("tenant {}", tenant)));
        }
        validate_user_name(name)?;
        validate_email(email)?;

        // Reserve the tenant-scoped email before the record lands.
        let key = (*tenant, email.to_lowercase());
        let id = UserId::generate();
        match self.emails.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(Error::conflict(format!(
                    "email {:?} already in use within tenant {}",
                    email, tenant
                )));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        let user = User {
            id,
            tenant: *tenant,
            name: name.to_string(),
            email: email.to_string(),
            kind,
        };
        self.users.insert(id, user.clone());
        self.tenant_users.entry(*tenant).or_default().push(id);

        tracing::debug!(tenant = %tenant, user = %id, "user created");
        Ok(user)
    }

    /// Look up a user by id.
    pub fn get_user(&self, id: &UserId) -> Result<User> {
        self.users
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(format!("user {}", id)))
    }

    /// Snapshot of all users of a tenant.
    pub fn list_users(&self, tenant: &TenantId) -> Result<Vec<User>> {
        if !self.tenant_exists(tenant) {
            return Err(Error::not_found(format!("tenant {}", tenant)));
        }
        let ids = self
            .tenant_users
            .get(tenant)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    /// Insert a pre-validated user for a tenant whose name/email reservations
    /// are already guaranteed.
    fn insert_user(&self, tenant: TenantId, new: &NewUser) -> User {
        let id = UserId::generate();
        let user = User {
            id,
            tenant,
            name: new.name.clone(),
            email: new.email.clone(),
            kind: new.kind,
        };
        self.emails.insert((tenant, new.email.to_lowercase()), id);
        self.users.insert(id, user.clone());
        self.tenant_users.entry(tenant).or_default().push(id);
        user
    }
}

fn validate_tenant_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("tenant name must not be empty"));
    }
    Ok(())
}

fn validate_user_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("user name must not be empty"));
    }
    Ok(())
}

/// Minimal well-formedness check: one `@`, non-empty local part, and a
/// domain containing a dot. Full RFC 5322 parsing is out of scope.
fn validate_email(email: &str) -> Result<()> {
    let malformed = || Error::validation(format!("malformed email address: {:?}", email));

    let (local, domain) = email.split_once('@').ok_or_else(malformed)?;
    if local.is_empty() || domain.is_empty() {
        return Err(malformed());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(malformed());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(malformed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            kind: UserKind::Regular,
        }
    }

    #[test]
    fn test_create_and_get_tenant() {
        let store = TenantStore::new();
        let (tenant, users) = store
            .create_tenant("dogs", TenantKind::Regular, &[])
            .unwrap();
        assert!(users.is_empty());
        assert_eq!(store.get_tenant(&tenant.id).unwrap().name, "dogs");
    }

    #[test]
    fn test_tenant_name_conflict() {
        let store = TenantStore::new();
        store
            .create_tenant("cats", TenantKind::Regular, &[])
            .unwrap();
        let err = store
            .create_tenant("Cats", TenantKind::Regular, &[])
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.tenant_count(), 1);
    }

    #[test]
    fn test_bundled_users_created_atomically() {
        let store = TenantStore::new();
        let (tenant, users) = store
            .create_tenant(
                "cats",
                TenantKind::Regular,
                &[user("kitty", "kitty@example.com")],
            )
            .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].tenant, tenant.id);
        assert_eq!(store.get_user(&users[0].id).unwrap().email, "kitty@example.com");
    }

    #[test]
    fn test_invalid_bundled_user_leaves_nothing_behind() {
        let store = TenantStore::new();
        let err = store
            .create_tenant(
                "birds",
                TenantKind::Regular,
                &[user("ok", "ok@example.com"), user("bad", "not-an-email")],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.tenant_count(), 0);
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_duplicate_email_in_batch_leaves_nothing_behind() {
        let store = TenantStore::new();
        let err = store
            .create_tenant(
                "birds",
                TenantKind::Regular,
                &[user("a", "same@example.com"), user("b", "SAME@example.com")],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.tenant_count(), 0);
        assert_eq!(store.user_count(), 0);
    }

    #[test]
    fn test_email_unique_per_tenant_not_globally() {
        let store = TenantStore::new();
        let (a, _) = store.create_tenant("a", TenantKind::Regular, &[]).unwrap();
        let (b, _) = store.create_tenant("b", TenantKind::Regular, &[]).unwrap();

        store
            .create_user(&a.id, "kitty", "kitty@example.com", UserKind::Regular)
            .unwrap();
        // Same address under another tenant is fine
        store
            .create_user(&b.id, "kitty", "kitty@example.com", UserKind::Regular)
            .unwrap();
        // Within the same tenant it conflicts, case-insensitively
        let err = store
            .create_user(&a.id, "copycat", "KITTY@example.com", UserKind::Regular)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_create_user_unknown_tenant() {
        let store = TenantStore::new();
        let err = store
            .create_user(
                &TenantId::generate(),
                "ghost",
                "ghost@example.com",
                UserKind::Regular,
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_email_validation() {
        for bad in ["", "plain", "@example.com", "a@", "a@nodot", "a b@x.com", "a@.com"] {
            assert!(validate_email(bad).is_err(), "accepted {:?}", bad);
        }
        for good in ["kitty@example.com", "a.b+c@sub.example.org"] {
            assert!(validate_email(good).is_ok(), "rejected {:?}", good);
        }
    }

    #[test]
    fn test_list_users_scoped_to_tenant() {
        let store = TenantStore::new();
        let (a, _) = store.create_tenant("a", TenantKind::Regular, &[]).unwrap();
        let (b, _) = store.create_tenant("b", TenantKind::Regular, &[]).unwrap();
        store
            .create_user(&a.id, "one", "one@example.com", UserKind::Regular)
            .unwrap();
        store
            .create_user(&b.id, "two", "two@example.com", UserKind::Admin)
            .unwrap();

        let users = store.list_users(&a.id).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "one");
    }
}
