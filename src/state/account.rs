use super::AppState;
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::types::*;

impl AppState {
    /// Create a regular (non-admin) account
    pub async fn register_user(&self, username: &str, password: &str) -> ApiResult<User> {
        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                password_hash: hash_password(password, self.auth_config.bcrypt_cost).await?,
                is_admin: false,
            })
            .await?;
        Ok(user)
    }

    /// Check credentials. Unknown usernames are registered on the spot
    /// when `auto_register` is on.
    pub async fn authenticate(&self, username: &str, password: &str) -> ApiResult<User> {
        match self.store.get_user_by_username(username).await? {
            Some(user) => {
                if verify_password(password, &user.password_hash).await {
                    Ok(user)
                } else {
                    Err(ApiError::Unauthorized("Invalid credentials".to_string()))
                }
            }
            None if self.auth_config.auto_register => {
                tracing::info!("Auto-registering unknown user on login");
                self.register_user(username, password).await
            }
            None => Err(ApiError::Unauthorized("Invalid credentials".to_string())),
        }
    }

    /// Make sure the configured admin account exists
    pub async fn ensure_admin(&self) -> ApiResult<User> {
        let username = &self.auth_config.admin_username;
        if let Some(existing) = self.store.get_user_by_username(username).await? {
            if !existing.is_admin {
                tracing::warn!(
                    "User '{}' exists but is not an admin; admin routes stay locked",
                    username
                );
            }
            return Ok(existing);
        }
        let admin = self
            .store
            .create_user(NewUser {
                username: username.clone(),
                password_hash: hash_password(
                    &self.auth_config.admin_password,
                    self.auth_config.bcrypt_cost,
                )
                .await?,
                is_admin: true,
            })
            .await?;
        tracing::info!(user_id = admin.id, "Admin user '{}' created", admin.username);
        Ok(admin)
    }
}
