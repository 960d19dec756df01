//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - Any employee or customer holding a valid JWT
//! - `EmployeeAuth` - Tellers and administrators
//! - `ServiceAuth` - Service-to-service authentication via API key
//!
//! Tokens are HS256 JWTs signed with the configured secret. The `sub` claim
//! carries the numeric employee or customer id and `role` says which.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use ledger_core::{Account, Actor, CustomerId, EmployeeId};

use crate::error::ApiError;
use crate::state::AppState;

/// Who a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Teller or administrator.
    Employee,
    /// Account holder.
    Customer,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (employee or customer id).
    pub sub: String,
    /// Role of the subject.
    pub role: Role,
    /// Expiration time.
    pub exp: i64,
}

impl JwtClaims {
    fn actor(&self) -> Result<Actor, ApiError> {
        match self.role {
            Role::Employee => self
                .sub
                .parse::<EmployeeId>()
                .map(Actor::Employee)
                .map_err(|_| ApiError::Unauthorized),
            Role::Customer => self
                .sub
                .parse::<CustomerId>()
                .map(Actor::Customer)
                .map_err(|_| ApiError::Unauthorized),
        }
    }
}

/// Sign a token for `claims` with `secret`.
///
/// # Errors
///
/// Returns `ApiError::Internal` if encoding fails.
pub fn issue_token(claims: &JwtClaims, secret: &str) -> Result<String, ApiError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// Validate a token and return its claims.
fn validate_jwt(token: &str, secret: &str) -> Result<JwtClaims, ApiError> {
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    Ok(token_data.claims)
}

fn bearer_actor(parts: &Parts, state: &AppState) -> Result<Actor, ApiError> {
    // Extract the Authorization header
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Extract the Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    validate_jwt(token, &state.config.jwt_secret)?.actor()
}

/// An authenticated employee or customer.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The caller, as passed into ledger operations.
    pub actor: Actor,
}

impl AuthUser {
    /// Allow employees on any account and customers on their own accounts only.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` when a customer asks about someone else's account.
    pub fn ensure_can_view(&self, account: &Account) -> Result<(), ApiError> {
        match self.actor {
            Actor::Customer(id) if id != account.customer_id => Err(ApiError::Forbidden(
                format!("account {} belongs to another customer", account.account_number),
            )),
            _ => Ok(()),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let actor = bearer_actor(parts, state)?;
            Ok(AuthUser { actor })
        })
    }
}

/// An authenticated employee.
#[derive(Debug, Clone, Copy)]
pub struct EmployeeAuth {
    /// The employee id, stamped on ledger rows.
    pub employee_id: EmployeeId,
}

impl EmployeeAuth {
    /// The employee as a ledger actor.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::Employee(self.employee_id)
    }
}

impl FromRequestParts<Arc<AppState>> for EmployeeAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            match bearer_actor(parts, state)? {
                Actor::Employee(employee_id) => Ok(EmployeeAuth { employee_id }),
                _ => Err(ApiError::Forbidden("employee access required".into())),
            }
        })
    }
}

/// Service authentication via API key.
///
/// Used by schedulers that trigger batch jobs over HTTP.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The service name or identifier.
    pub service_name: String,
}

impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Check for X-API-Key header
            let api_key = parts
                .headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::Unauthorized)?;

            // Validate against configured service API key
            let expected_key = state
                .config
                .service_api_key
                .as_ref()
                .ok_or(ApiError::Unauthorized)?;

            if api_key != expected_key {
                return Err(ApiError::Unauthorized);
            }

            // Extract service name from header if provided
            let service_name = parts
                .headers
                .get("x-service-name")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();

            Ok(ServiceAuth { service_name })
        })
    }
}
