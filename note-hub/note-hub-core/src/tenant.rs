//! Tenant resolution.

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::model::UserSpace;
use crate::store::EntityStore;

/// Resolves the caller's stable identity to its user space, creating
/// the space lazily on first content access.
///
/// There is no uniqueness token in the store, so two racing first
/// requests can each create a space; the accepted concurrency model
/// tolerates that the same way it tolerates read/write races inside a
/// mutation.
pub async fn resolve_tenant(store: &dyn EntityStore, tenant_key: &str) -> Result<UserSpace> {
    if let Some(space) = store.user_space_by_key(tenant_key).await? {
        return Ok(space);
    }
    let space = UserSpace {
        id: Uuid::new_v4(),
        tenant_key: tenant_key.to_string(),
    };
    store.insert_user_space(space.clone()).await?;
    debug!(space = %space.id, "created user space on first access");
    Ok(space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn resolves_to_the_same_space_on_repeat_access() {
        let store = MemoryStore::new();
        let first = resolve_tenant(&store, "auth0|alice").await.unwrap();
        let again = resolve_tenant(&store, "auth0|alice").await.unwrap();
        assert_eq!(first, again);

        let other = resolve_tenant(&store, "auth0|bob").await.unwrap();
        assert_ne!(first.id, other.id);
    }
}
