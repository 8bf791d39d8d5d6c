use actix_session::Session;
use rand::Rng;

use crate::errors::AppError;
use crate::models::user::{Role, User};

const USER_ID: &str = "user_id";
const ROLE: &str = "role";
const PONDOK_ID: &str = "pondok_id";
const SID: &str = "sid";

/// The authenticated caller, as stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub role: Role,
    pub pondok_id: Option<i64>,
}

impl SessionUser {
    pub fn is_pusat(&self) -> bool {
        self.role == Role::AdminPusat
    }

    /// Whether this caller may read data belonging to `pondok_id`.
    pub fn can_access_pondok(&self, pondok_id: i64) -> bool {
        self.is_pusat() || self.pondok_id == Some(pondok_id)
    }
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>(USER_ID).unwrap_or(None)
}

/// Opaque id of this login, keying its notification poller.
pub fn session_id(session: &Session) -> Option<String> {
    session.get::<String>(SID).unwrap_or(None)
}

pub fn current_user(session: &Session) -> Result<SessionUser, AppError> {
    let user_id = session
        .get::<i64>(USER_ID)
        .map_err(|e| AppError::Session(format!("Failed to read user id: {}", e)))?
        .ok_or(AppError::Unauthorized)?;
    let role = session
        .get::<String>(ROLE)
        .map_err(|e| AppError::Session(format!("Failed to read role: {}", e)))?
        .ok_or(AppError::Unauthorized)?
        .parse::<Role>()
        .map_err(AppError::Session)?;
    let pondok_id = session
        .get::<i64>(PONDOK_ID)
        .map_err(|e| AppError::Session(format!("Failed to read pondok id: {}", e)))?;

    Ok(SessionUser { user_id, role, pondok_id })
}

/// Check role; returns Err(AppError) if the caller is not logged in or holds another role.
pub fn require_role(session: &Session, role: Role) -> Result<SessionUser, AppError> {
    let user = current_user(session)?;
    if user.role == role {
        Ok(user)
    } else {
        Err(AppError::PermissionDenied(format!("requires role {}", role)))
    }
}

pub fn require_pusat(session: &Session) -> Result<SessionUser, AppError> {
    require_role(session, Role::AdminPusat)
}

/// A branch admin and the branch they belong to.
pub fn require_pondok(session: &Session) -> Result<(SessionUser, i64), AppError> {
    let user = require_role(session, Role::AdminPondok)?;
    let pondok_id = user
        .pondok_id
        .ok_or_else(|| AppError::PermissionDenied("account is not linked to a pondok".to_string()))?;
    Ok((user, pondok_id))
}

/// Establish a fresh session for `user` and return its session id.
pub fn start(session: &Session, user: &User, role: Role) -> Result<String, AppError> {
    session.clear();
    session.renew();
    let sid = generate_token();
    let insert_err = |e: actix_session::SessionInsertError| AppError::Session(e.to_string());
    session.insert(USER_ID, user.id).map_err(insert_err)?;
    session.insert(ROLE, role.as_str()).map_err(insert_err)?;
    if let Some(pondok_id) = user.pondok_id {
        session.insert(PONDOK_ID, pondok_id).map_err(insert_err)?;
    }
    session.insert(SID, &sid).map_err(insert_err)?;
    Ok(sid)
}

/// Generate a random 32-byte hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}
