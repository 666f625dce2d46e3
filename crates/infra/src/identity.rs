//! Identity resolution: verified token claims to a request identity.

use tracing::instrument;

use innkeep_auth::{AccessClaims, AuthError, IdentityContext};

use crate::store::UserStore;

/// Load the token subject and derive its identity for this request.
///
/// Missing users and inactive accounts are distinct failures. Store errors are
/// logged here and reported as [`AuthError::Internal`] without detail.
#[instrument(skip(store, claims), fields(user_id = %claims.sub))]
pub async fn resolve_identity(
    store: &dyn UserStore,
    claims: &AccessClaims,
) -> Result<IdentityContext, AuthError> {
    let record = store
        .get(claims.sub)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "user lookup failed during authentication");
            AuthError::Internal
        })?
        .ok_or(AuthError::UserNotFound)?;

    IdentityContext::from_record(&record)
}
