//! Account lifecycle against the backend.

use tracing::{info, warn};

use crate::backend::rows::{to_row, OperatingCodeRow, UserProfileRow};
use crate::backend::{tables, AuthSession, Backend};
use crate::error::Result;

/// Sign in with email and password.
///
/// # Errors
///
/// Returns the backend's auth error on bad credentials.
pub fn sign_in(backend: &dyn Backend, email: &str, password: &str) -> Result<AuthSession> {
    backend.sign_in(email.trim(), password)
}

/// Create an account and provision its profile and operating code rows.
///
/// Provisioning failures are logged and do not fail the sign-up: the
/// account exists and the rows are created on first save.
///
/// # Errors
///
/// Returns the backend's auth error if the account cannot be created.
pub fn sign_up(backend: &dyn Backend, email: &str, password: &str) -> Result<AuthSession> {
    let session = backend.sign_up(email.trim(), password)?;
    provision(backend, &session);
    Ok(session)
}

/// Insert the new account's rows. Returns how many were created.
fn provision(backend: &dyn Backend, session: &AuthSession) -> usize {
    let rows = [
        (tables::USER_PROFILES, to_row(&UserProfileRow::provisioned(&session.user_id))),
        (tables::OPERATING_CODE, to_row(&OperatingCodeRow::provisioned(&session.user_id))),
    ];
    let expected = rows.len();
    let mut created = 0;
    for (table, row) in rows {
        match row.and_then(|row| backend.insert(session, table, row)) {
            Ok(_) => created += 1,
            Err(e) => warn!(table, error = %e, "Failed to provision row for new account"),
        }
    }
    if created == expected {
        info!(user_id = %session.user_id, "Provisioned new account");
    }
    created
}

/// End a session on the backend.
///
/// # Errors
///
/// Returns an error if the backend rejects the call.
pub fn sign_out(backend: &dyn Backend, session: &AuthSession) -> Result<()> {
    backend.sign_out(session)?;
    info!(user_id = %session.user_id, "Signed out");
    Ok(())
}
