//! ============================================================================
//! User endpoints - profile fetch, authentication, registration
//! ============================================================================

use reqwest::Method;
use tracing::info;

use super::ApiClient;
use crate::types::{LoginRequest, ProfileUpdate, RegisterRequest, Result, User};

impl ApiClient {
    /// `GET /users/{id}`
    pub async fn fetch_user(&self, user_id: i64) -> Result<User> {
        let request = self.request(Method::GET, &format!("/users/{}", user_id));
        self.send_json(request, "fetch user").await
    }

    /// `POST /users/auth`
    pub async fn authenticate(&self, credentials: &LoginRequest) -> Result<User> {
        info!("Authenticating {}", credentials.email);
        let request = self.request(Method::POST, "/users/auth").json(credentials);
        self.send_json(request, "authenticate").await
    }

    /// `POST /users/register`
    pub async fn register_user(&self, registration: &RegisterRequest) -> Result<User> {
        info!("Registering {}", registration.email);
        let request = self.request(Method::POST, "/users/register").json(registration);
        self.send_json(request, "register").await
    }

    /// `PUT /users/{id}`
    pub async fn update_user(&self, user_id: i64, changes: &ProfileUpdate) -> Result<User> {
        let request = self
            .request(Method::PUT, &format!("/users/{}", user_id))
            .json(changes);
        self.send_json(request, "update user").await
    }
}
