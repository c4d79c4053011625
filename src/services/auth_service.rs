use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::{ServiceError, Validator};
use crate::auth::password::{spawn_hash_password, spawn_verify_password};
use crate::auth::TokenIssuer;
use crate::database::models::User;
use crate::database::UserRepository;
use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

/// Account registration and sign-in
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    issuer: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, issuer: Arc<TokenIssuer>) -> Self {
        Self { users, issuer }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, ServiceError> {
        Validator::new()
            .name("name", &request.name)
            .email("email", &request.email)
            .password("password", &request.password)
            .finish()?;

        let password_hash = spawn_hash_password(&request.password).await?;
        let mut user = User::new(Uuid::new_v4(), request.name.trim(), request.email, password_hash);
        self.users.create(&mut user).await?;

        info!(user_id = %user.id, "user registered");
        Ok(UserResponse::from(&user))
    }

    /// Check credentials and issue an access token.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        Validator::new()
            .email("email", &request.email)
            .password("password", &request.password)
            .finish()?;

        let user = match self.users.get_by_email(&request.email).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                debug!("sign-in for unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !spawn_verify_password(&request.password, &user.password).await? {
            debug!(user_id = %user.id, "sign-in with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let issued = self.issuer.issue(user.id, &user.email)?;
        info!(user_id = %user.id, "user signed in");

        Ok(AuthResponse {
            user: UserResponse::from(&user),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}
