use thiserror::Error;

use crate::auth::password::HashError;
use crate::auth::AuthError;
use crate::database::DatabaseError;

pub mod auth_service;
pub mod todo_service;
pub mod user_service;
pub mod validation;

pub use auth_service::AuthService;
pub use todo_service::TodoService;
pub use user_service::UserService;
pub use validation::{ValidationError, Validator};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Unknown email or a password that does not match the stored hash
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Hash(#[from] HashError),
}
