use crate::client::AuthClient;
use crate::error::ClientError;
use crate::http::client::{HttpClient, RequestOptions};
use crate::models::auth::{
    AuthResponse, CallbackRequest, ForceLoginRequest, HeartbeatResponse, LogoutResponse, OAuthUrl,
};
use crate::models::identity::Identity;
use async_trait::async_trait;
use reqwest::Method;

const OAUTH_URL_PATH: &str = "v1/auth/oauth/url";
const OAUTH_CALLBACK_PATH: &str = "v1/auth/oauth/callback";
const FORCE_LOGIN_PATH: &str = "v1/auth/force-login";
const LOGOUT_PATH: &str = "v1/auth/logout";
const HEARTBEAT_PATH: &str = "v1/auth/session/heartbeat";
const ME_PATH: &str = "v1/auth/me";

#[async_trait]
impl AuthClient for HttpClient {
    async fn oauth_url(&self) -> Result<OAuthUrl, ClientError> {
        oauth_url(self).await
    }

    async fn exchange_code(&self, code: &str) -> Result<AuthResponse, ClientError> {
        exchange_code(self, code).await
    }

    async fn force_login(&self, user_id: &str) -> Result<AuthResponse, ClientError> {
        force_login(self, user_id).await
    }

    async fn logout(&self) -> Result<LogoutResponse, ClientError> {
        logout(self).await
    }

    async fn heartbeat(&self) -> Result<HeartbeatResponse, ClientError> {
        heartbeat(self).await
    }

    async fn current_user(&self) -> Result<Identity, ClientError> {
        current_user(self).await
    }
}

async fn oauth_url(transport: &HttpClient) -> Result<OAuthUrl, ClientError> {
    let response = transport.get(OAUTH_URL_PATH).await?;
    Ok(response.json().await?)
}

async fn exchange_code(transport: &HttpClient, code: &str) -> Result<AuthResponse, ClientError> {
    let response = transport
        .post(
            OAUTH_CALLBACK_PATH,
            &CallbackRequest {
                code: code.to_string(),
            },
        )
        .await?;
    Ok(response.json().await?)
}

async fn force_login(transport: &HttpClient, user_id: &str) -> Result<AuthResponse, ClientError> {
    let response = transport
        .post(
            FORCE_LOGIN_PATH,
            &ForceLoginRequest {
                user_id: user_id.to_string(),
            },
        )
        .await?;
    Ok(response.json().await?)
}

async fn logout(transport: &HttpClient) -> Result<LogoutResponse, ClientError> {
    let response = transport
        .send::<()>(Method::POST, LOGOUT_PATH, None, RequestOptions::default())
        .await?;
    Ok(response.json().await?)
}

/// Heartbeats run in the background; they never toggle the busy indicator.
async fn heartbeat(transport: &HttpClient) -> Result<HeartbeatResponse, ClientError> {
    let response = transport
        .send::<()>(
            Method::POST,
            HEARTBEAT_PATH,
            None,
            RequestOptions::background(),
        )
        .await?;
    Ok(response.json().await?)
}

async fn current_user(transport: &HttpClient) -> Result<Identity, ClientError> {
    let response = transport.get(ME_PATH).await?;
    Ok(response.json().await?)
}
