//! Registration, login and bearer-token resolution.

use std::sync::Arc;

use library_core::{AppError, BearerExt, ValidateExt, canonical_email, validation};
use library_db::{NewSession, NewUser, User};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::core::{ServiceContext, password};
use crate::middleware::{ClientIp, RequestLogger};

/// Email and password pair used by registration and login.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl ValidateExt for Credentials {
    fn validate(&self) -> Result<(), AppError> {
        validation::validate_email(&self.email)?;
        validation::validate_password(&self.password)
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: i64,
    /// Opaque session token the caller presents as `Bearer <token>`.
    pub token: String,
}

/// Session-token authentication over the user and session stores.
pub struct SessionService {
    ctx: Arc<ServiceContext>,
}

impl SessionService {
    #[must_use]
    pub const fn new(ctx: Arc<ServiceContext>) -> Self {
        Self { ctx }
    }

    /// Create an account. The email is stored in canonical form.
    #[instrument(parent = log.span(), skip_all)]
    pub async fn register(
        &self,
        log: &RequestLogger,
        credentials: &Credentials,
    ) -> Result<User, AppError> {
        credentials.validate()?;
        let email = canonical_email(&credentials.email);
        let password_hash = password::hash(&credentials.password)?;

        let user = self
            .ctx
            .bounded(
                "save_user",
                self.ctx.repo().save_user(NewUser {
                    email: &email,
                    password_hash: &password_hash,
                }),
            )
            .await?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and open a session recorded against `origin`.
    ///
    /// Unknown email and wrong password fail identically.
    #[instrument(parent = log.span(), skip_all)]
    pub async fn login(
        &self,
        log: &RequestLogger,
        credentials: &Credentials,
        origin: ClientIp,
    ) -> Result<LoginOutcome, AppError> {
        let email = canonical_email(&credentials.email);
        let user = match self
            .ctx
            .bounded("get_user_by_email", self.ctx.repo().get_user_by_email(&email))
            .await
        {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                debug!("Login for unknown email");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !password::verify(&credentials.password, &user.password) {
            debug!(user_id = user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        let ip = origin.ip().map(|ip| ip.to_string()).unwrap_or_default();

        self.ctx
            .bounded(
                "save_session",
                self.ctx.repo().save_session(NewSession {
                    user_id: user.id,
                    token: &token,
                    ip: &ip,
                    user_agent: "",
                }),
            )
            .await?;

        info!(user_id = user.id, ip = %ip, "Session created");
        Ok(LoginOutcome {
            user_id: user.id,
            token,
        })
    }

    /// Map a session token to its user id.
    pub async fn resolve_token(&self, token: &str) -> Result<i64, AppError> {
        self.ctx
            .bounded(
                "get_user_id_by_token",
                self.ctx.repo().get_user_id_by_token(token),
            )
            .await
    }

    /// Resolve the bearer credential carried by a request.
    pub async fn authenticate(&self, source: &impl BearerExt) -> Result<i64, AppError> {
        let token = source.bearer_token()?;
        self.resolve_token(token).await
    }
}
