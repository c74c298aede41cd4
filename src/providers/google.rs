//! Google access-token exchange: the userinfo endpoint is queried with the
//! client-supplied access token as a bearer credential.

use reqwest::StatusCode;
use serde::Deserialize;

use super::{Provider, ProviderError, ProviderIdentity};
use crate::config::GoogleConfig;

pub struct GoogleAuth {
    http: reqwest::Client,
    config: GoogleConfig,
}

#[derive(Deserialize)]
struct UserInfo {
    email: String,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    verified_email: bool,
}

impl GoogleAuth {
    pub fn new(http: reqwest::Client, config: GoogleConfig) -> Self {
        Self { http, config }
    }

    pub async fn exchange(&self, access_token: &str) -> Result<ProviderIdentity, ProviderError> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::exchange(Provider::Google, e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized(
                "Invalid Google access token".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(ProviderError::exchange(
                Provider::Google,
                format!("userinfo endpoint returned {}", response.status()),
            ));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::exchange(Provider::Google, e))?;

        Ok(ProviderIdentity {
            email: info.email,
            first_name: info.given_name,
            last_name: info.family_name,
            picture: info.picture,
            email_verified: info.verified_email,
        })
    }
}
