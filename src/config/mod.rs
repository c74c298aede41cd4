use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
    pub apple: AppleConfig,
    pub google: GoogleConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Credentials for the Apple token exchange. The private key is the ES256
/// signing key registered for the service, PEM-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppleConfig {
    pub team_id: String,
    pub key_id: String,
    pub client_id: String,
    pub bundle_id: String,
    pub private_key: String,
    pub token_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub userinfo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Base URL under which uploaded objects are publicly reachable.
    /// Object keys are appended directly to this.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub image_quality: u8,
    pub full_image_quality: u8,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = v.parse().unwrap_or(self.pagination.default_limit);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().unwrap_or(self.pagination.max_limit);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("APPLE_TEAM_ID") {
            self.apple.team_id = v;
        }
        if let Ok(v) = env::var("APPLE_KEY_ID") {
            self.apple.key_id = v;
        }
        if let Ok(v) = env::var("APPLE_CLIENT_ID") {
            self.apple.client_id = v;
        }
        if let Ok(v) = env::var("APPLE_BUNDLE_ID") {
            self.apple.bundle_id = v;
        }
        if let Ok(v) = env::var("APPLE_PRIVATE_KEY") {
            self.apple.private_key = v;
        }
        if let Ok(v) = env::var("APPLE_TOKEN_URL") {
            self.apple.token_url = v;
        }
        if let Ok(v) = env::var("GOOGLE_USERINFO_URL") {
            self.google.userinfo_url = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            self.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_REGION") {
            self.storage.region = v;
        }
        if let Ok(v) = env::var("STORAGE_PUBLIC_BASE_URL") {
            self.storage.public_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("MEDIA_IMAGE_QUALITY") {
            self.media.image_quality = v.parse().unwrap_or(self.media.image_quality);
        }
        self
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            pagination: PaginationConfig {
                default_limit: 20,
                max_limit: 100,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
            },
            apple: AppleConfig {
                team_id: String::new(),
                key_id: String::new(),
                client_id: String::new(),
                bundle_id: String::new(),
                private_key: String::new(),
                token_url: "https://appleid.apple.com/auth/token".to_string(),
            },
            google: GoogleConfig {
                userinfo_url: "https://www.googleapis.com/oauth2/v1/userinfo".to_string(),
            },
            storage: StorageConfig {
                bucket: String::new(),
                region: "us-east-1".to_string(),
                public_base_url: String::new(),
            },
            media: MediaConfig {
                image_quality: 80,
                full_image_quality: 100,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
