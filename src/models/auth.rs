//! Authentication material.
//!
//! Two distinct bundles: [`AuthContext`] authorizes the HTTP submit/status
//! calls, [`Credentials`] drives the interactive browser sign-in. Neither is
//! refreshed here; obtaining them is the auth step's job.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Resource key inside the auth file holding the admin session entry.
const AUTH_RESOURCE: &str = "https://graph.microsoft.com/.default";

/// Session material for the admin HTTP endpoints, consumed read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthContext {
    /// Value of the `.AspNet.Cookies` session cookie
    #[serde(rename = ".AspNet.Cookies")]
    pub session_cookie: String,

    /// Anti-forgery token sent as the `validationkey` header
    #[serde(rename = "validationkey")]
    pub validation_key: String,
}

impl AuthContext {
    /// Load the session bundle from an auth file written by the auth step.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&raw)
    }

    /// Extract the admin session entry from the auth file's JSON structure.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let entry = value
            .get("mfa")
            .and_then(|mfa| mfa.get(AUTH_RESOURCE))
            .ok_or_else(|| {
                AppError::auth(format!("auth file has no mfa entry for {AUTH_RESOURCE}"))
            })?;
        Ok(serde_json::from_value(entry.clone())?)
    }
}

/// Username/password pair, used only for the browser sign-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Account username (email address)
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,
}
