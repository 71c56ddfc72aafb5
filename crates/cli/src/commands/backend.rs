//! Commands that call the backend.
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Backend base URL
//! - `TMC_PASSWORD` - Password for `login`
//! - `TMC_TOKEN` - Bearer token for `orders list`

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use tmc_admin::backend::{ApiError, BackendClient, OrderApi};
use tmc_admin::config::{BackendConfig, ConfigError};
use tmc_core::{CredentialError, Identity};

use super::token::describe;

/// Errors from backend commands.
#[derive(Debug, Error)]
pub enum BackendCommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Unusable token: {0}")]
    Credential(#[from] CredentialError),
}

fn client() -> Result<BackendClient, BackendCommandError> {
    dotenvy::dotenv().ok();
    let config = BackendConfig::from_env()?;
    Ok(BackendClient::new(&config)?)
}

fn secret_env(key: &'static str) -> Result<SecretString, BackendCommandError> {
    std::env::var(key)
        .map(SecretString::from)
        .map_err(|_| BackendCommandError::MissingEnvVar(key))
}

/// Sign in as `email` and describe the issued token.
///
/// # Errors
///
/// Returns an error if configuration is missing, login is refused, or the
/// issued token cannot be decoded.
pub async fn login(email: &str) -> Result<(), BackendCommandError> {
    let backend = client()?;
    let password = secret_env("TMC_PASSWORD")?;

    tracing::info!(email = %email, backend = %backend.base_url(), "Signing in");
    let token = backend.login(email, &password).await?;

    let identity = Identity::from_token(token.expose_secret(), Utc::now())?;
    describe(&identity);
    Ok(())
}

/// List every order visible to `TMC_TOKEN`.
///
/// # Errors
///
/// Returns an error if configuration is missing or the backend call fails.
pub async fn list_orders() -> Result<(), BackendCommandError> {
    let backend = client()?;
    let token = secret_env("TMC_TOKEN")?;

    let orders = backend.authorized(token).list_orders().await?;
    tracing::info!(count = orders.len(), "Orders");
    for order in &orders {
        tracing::info!(
            order_id = %order.id,
            customer = %order.customer.name,
            total = %order.total_price,
            status = %order.order_status,
            payment = %order.payment_status,
            "Order"
        );
    }
    Ok(())
}
