//! Identity-provider bridges. Each provider exchanges a client-supplied
//! credential for verified identity claims; account reconciliation happens
//! in the auth handlers on top of the shared [`ProviderIdentity`] shape.

pub mod apple;
pub mod google;

pub use apple::AppleAuth;
pub use google::GoogleAuth;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Apple,
    Google,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Apple => "Apple",
            Provider::Google => "Google",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Verified identity claims returned by a provider exchange.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub picture: Option<String>,
    pub email_verified: bool,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider explicitly rejected the credential.
    #[error("{0}")]
    Unauthorized(String),

    /// Any other exchange failure: network, malformed response, provider
    /// error payload.
    #[error("{provider} exchange failed: {source}")]
    Exchange {
        provider: &'static str,
        source: String,
    },
}

impl ProviderError {
    pub fn exchange(provider: Provider, source: impl std::fmt::Display) -> Self {
        ProviderError::Exchange {
            provider: provider.name(),
            source: source.to_string(),
        }
    }
}
