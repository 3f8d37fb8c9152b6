use actix_web::dev::Payload;
use actix_web::{http, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::core::config::SessionConfig;
use crate::core::AppError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Not authenticated")]
    Missing,
    #[error("Session expired")]
    Expired,
    #[error("Invalid session")]
    Invalid,
    #[error("Server misconfigured")]
    Misconfigured,
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Misconfigured => AppError::internal_error(error),
            _ => AppError::unauthorized(error),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user: SessionUser,
    pub exp: usize, // unix seconds
}

impl SessionClaims {
    pub fn new(user: SessionUser, lifetime: Duration) -> Self {
        Self {
            user,
            exp: (Utc::now() + lifetime).timestamp().max(0) as usize,
        }
    }
}

/// Signs a session. Sessions are normally minted by the sign-in flow.
pub fn issue_session_token(claims: &SessionClaims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::internal_error("Failed to generate session token"))
}

pub fn decode_session_token(token: &str, secret: &str) -> Result<SessionClaims, SessionError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        _ => SessionError::Invalid,
    })
}

fn token_from_request(req: &HttpRequest, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = req.cookie(cookie_name) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

pub fn read_session(req: &HttpRequest) -> Result<SessionClaims, SessionError> {
    let config = req
        .app_data::<web::Data<SessionConfig>>()
        .ok_or(SessionError::Misconfigured)?;

    let token = token_from_request(req, &config.cookie_name).ok_or(SessionError::Missing)?;
    let secret = config.secret.as_ref().ok_or(SessionError::Misconfigured)?;

    decode_session_token(&token, secret.expose_secret())
}

/// A request that must carry a valid session.
#[derive(Debug)]
pub struct Session(pub SessionClaims);

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(read_session(req).map(Session).map_err(AppError::from))
    }
}

/// Gate in front of submissions; only enforced when `session.required` is set.
#[derive(Debug)]
pub struct SubmissionGate(pub Option<SessionClaims>);

impl FromRequest for SubmissionGate {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let required = req
            .app_data::<web::Data<SessionConfig>>()
            .map(|config| config.required)
            .unwrap_or(false);

        let outcome = if required {
            read_session(req).map(|claims| SubmissionGate(Some(claims)))
        } else {
            Ok(SubmissionGate(read_session(req).ok()))
        };

        ready(outcome.map_err(AppError::from))
    }
}
