use std::ops::RangeInclusive;
use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rand_core::OsRng;
use tracing::{debug, error, info};
use uuid::Uuid;

use chirper_core::events::EventBus;
use chirper_core::{ChirpService, PolicyTable};
use chirper_db::Database;
use chirper_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

const USERNAME_LEN: RangeInclusive<usize> = 3..=32;
const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_TTL_DAYS: i64 = 30;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub chirps: ChirpService,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, events: EventBus, jwt_secret: String) -> AppState {
        let chirps = ChirpService::new(db.clone(), PolicyTable::chirps(), events);
        Arc::new(Self {
            db,
            chirps,
            jwt_secret,
        })
    }
}

/// POST /auth/register: create an account and sign the caller in.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if !USERNAME_LEN.contains(&req.username.len()) || req.password.len() < MIN_PASSWORD_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db = state.db.clone();
    let username = req.username.clone();
    let user_id = run_blocking(move || {
        if db.get_user_by_username(&username)?.is_some() {
            return Ok(None);
        }
        let user_id = Uuid::new_v4();
        db.create_user(&user_id.to_string(), &username, &hash_password(&req.password)?)?;
        Ok(Some(user_id))
    })
    .await?
    .ok_or(StatusCode::CONFLICT)?;

    info!("Registered user {} ({})", req.username, user_id);
    let token = issue_token(&state, user_id, &req.username)?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

/// POST /auth/login: unknown users and wrong passwords look the same.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.db.clone();
    let username = req.username.clone();
    let user = run_blocking(move || {
        let Some(user) = db.get_user_by_username(&username)? else {
            return Ok(None);
        };
        Ok(password_matches(&user.password, &req.password).then_some(user))
    })
    .await?
    .ok_or_else(|| {
        debug!("Failed login for {}", req.username);
        StatusCode::UNAUTHORIZED
    })?;

    let user_id: Uuid = user.id.parse().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let token = issue_token(&state, user_id, &user.username)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        token,
    }))
}

/// Sign an HS256 token that `require_auth` accepts for `TOKEN_TTL_DAYS`.
pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let expires = Utc::now() + TimeDelta::days(TOKEN_TTL_DAYS);
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: expires.timestamp() as usize,
    };
    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))?)
}

fn issue_token(state: &AppState, user_id: Uuid, username: &str) -> Result<String, StatusCode> {
    create_token(&state.jwt_secret, user_id, username).map_err(|e| {
        error!("Token signing failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Argon2id with a fresh random salt, PHC string encoded.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

fn password_matches(stored_hash: &str, password: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            error!("Unreadable password hash in users table: {}", e);
            false
        }
    }
}

/// Storage lookups and Argon2 both block, so keep them off the async workers.
async fn run_blocking<F, T>(f: F) -> Result<T, StatusCode>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Auth storage error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
