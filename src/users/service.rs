//! Linking provider identities to local users.

use crate::auth::provider::ExternalIdentity;
use crate::store::{StoreError, StoreResult, UserStore};
use crate::users::types::{NewUser, User, UserUpdate};

/// Create the user for `identity`, or refresh name and picture if the email
/// is already known.
///
/// Two first logins racing on the same email both end up with the stored row:
/// the loser of the insert sees `Conflict` and re-reads.
pub async fn upsert_identity(store: &dyn UserStore, identity: &ExternalIdentity) -> StoreResult<User> {
    if let Some(existing) = store.find_by_email(&identity.email).await? {
        return refresh(store, existing, identity).await;
    }

    let new_user = NewUser {
        name: identity.name.clone(),
        email: identity.email.clone(),
        picture_url: identity.picture_url.clone(),
        phone_number: None,
        location: None,
    };

    match store.create(new_user).await {
        Ok(user) => Ok(user),
        Err(StoreError::Conflict(_)) => match store.find_by_email(&identity.email).await? {
            Some(existing) => refresh(store, existing, identity).await,
            None => Err(StoreError::Query(format!(
                "user {} vanished after conflicting insert",
                identity.email
            ))),
        },
        Err(e) => Err(e),
    }
}

async fn refresh(store: &dyn UserStore, existing: User, identity: &ExternalIdentity) -> StoreResult<User> {
    let mut update = UserUpdate::default();
    if existing.name != identity.name {
        update.name = Some(identity.name.clone());
    }
    if identity.picture_url.is_some() && existing.picture_url != identity.picture_url {
        update.picture_url = identity.picture_url.clone();
    }
    if update.is_empty() {
        return Ok(existing);
    }

    let user_id = existing.user_id.clone();
    Ok(store.update(&user_id, update).await?.unwrap_or(existing))
}
