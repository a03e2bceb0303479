use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::Principal,
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::AppError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Missing and blank values are both "missing".
fn required(value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::validation("Missing fields")),
    }
}

fn issue(keys: &JwtKeys, user: User) -> Result<AuthResponse, AppError> {
    let user = PublicUser::from(user);
    let token = keys.sign(&Principal::from(user.clone()))?;
    Ok(AuthResponse { user, token })
}

pub async fn register(
    db: &SqlitePool,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let (name, email, password) = (
        required(req.name)?,
        required(req.email)?,
        required(req.password)?,
    );
    let name = name.trim().to_string();
    let email = email.trim().to_lowercase();

    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    if User::find_by_email(db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&password)?;

    let user = User::create(db, &name, &email, &hash).await.map_err(|e| {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Email already registered".into())
            }
            _ => AppError::Store(e),
        }
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    issue(keys, user)
}

pub async fn login(
    db: &SqlitePool,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<AuthResponse, AppError> {
    let (email, password) = (required(req.email)?, required(req.password)?);
    let email = email.trim().to_lowercase();

    let Some(user) = User::find_by_email(db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::not_found("User not found"));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::auth("Invalid credentials"));
    }

    info!(user_id = %user.id, "user logged in");
    issue(keys, user)
}

/// Resolve an `Authorization` header value into the principal it names.
pub fn verify_token(keys: &JwtKeys, header: Option<&str>) -> Result<Principal, AppError> {
    let header = header.ok_or_else(|| AppError::auth("Missing Authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::auth("Invalid Authorization header"))?;

    match keys.verify(token) {
        Ok(claims) => Ok(Principal::from(claims)),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            Err(AppError::auth("Invalid or expired token"))
        }
    }
}

pub async fn me(db: &SqlitePool, principal: &Principal) -> Result<PublicUser, AppError> {
    User::find_by_id(db, principal.id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| AppError::auth("User not found"))
}
