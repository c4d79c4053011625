use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::{ServiceError, Validator};
use crate::auth::password::{spawn_hash_password, spawn_verify_password};
use crate::database::models::User;
use crate::database::UserRepository;
use crate::dto::{ChangeEmailRequest, ChangeNameRequest, ChangePasswordRequest, UserResponse};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse, ServiceError> {
        let user = self.users.get_by_id(user_id).await?;
        Ok(UserResponse::from(&user))
    }

    pub async fn get_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = self.users.get_all_users().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    pub async fn change_name(&self, user_id: Uuid, request: ChangeNameRequest) -> Result<(), ServiceError> {
        Validator::new()
            .name("name", &request.name)
            .password("password", &request.password)
            .finish()?;

        self.confirm_password(user_id, &request.password).await?;
        self.users.change_name(request.name.trim(), user_id).await?;
        info!(%user_id, "user name changed");
        Ok(())
    }

    pub async fn change_email(&self, user_id: Uuid, request: ChangeEmailRequest) -> Result<(), ServiceError> {
        Validator::new()
            .email("email", &request.email)
            .password("password", &request.password)
            .finish()?;

        self.confirm_password(user_id, &request.password).await?;
        self.users.change_email(&request.email, user_id).await?;
        info!(%user_id, "user email changed");
        Ok(())
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<(), ServiceError> {
        Validator::new()
            .password("oldPassword", &request.old_password)
            .password("newPassword", &request.new_password)
            .finish()?;

        self.confirm_password(user_id, &request.old_password).await?;
        let password_hash = spawn_hash_password(&request.new_password).await?;
        self.users.change_password(&password_hash, user_id).await?;
        info!(%user_id, "user password changed");
        Ok(())
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        self.users.delete(user_id).await?;
        info!(%user_id, "user deleted");
        Ok(())
    }

    /// Re-check the caller's password before a sensitive change
    async fn confirm_password(&self, user_id: Uuid, password: &str) -> Result<User, ServiceError> {
        let user = self.users.get_by_id(user_id).await?;
        if !spawn_verify_password(password, &user.password).await? {
            debug!(%user_id, "password confirmation failed");
            return Err(ServiceError::InvalidCredentials);
        }
        Ok(user)
    }
}
