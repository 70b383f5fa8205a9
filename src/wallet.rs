use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// 1. Provider Contract

/// ProviderKind
///
/// The two ways the console can reach a signer: a wallet injected into the browser, or a
/// remote signer paired by scanning a QR code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Injected,
    RemoteSigning,
}

/// WalletSession
///
/// The account a provider handed back after a successful connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSession {
    pub account: String,
    pub chain_id: u64,
    pub provider: ProviderKind,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
pub enum WalletError {
    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),
    #[error("connection rejected: {0}")]
    Rejected(String),
    #[error("no wallet connected")]
    NotConnected,
}

/// WalletProvider
///
/// Abstract contract over a wallet client library. Implementations wrap the real injected or
/// remote-signing client; tests substitute mocks.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Prompts the user and returns the connected account.
    async fn request_accounts(&self) -> Result<WalletSession, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;
}

/// RemoteSigningConfig
///
/// Settings needed to construct the QR-based remote-signing provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSigningConfig {
    pub project_id: String,
    pub chains: Vec<u64>,
    pub show_qr_modal: bool,
}

/// ProviderSource
///
/// Where providers come from: detection of an injected wallet, and construction of the
/// remote-signing one.
pub trait ProviderSource: Send + Sync {
    fn injected(&self) -> Option<Arc<dyn WalletProvider>>;

    fn create_remote_signing(
        &self,
        config: &RemoteSigningConfig,
    ) -> Result<Arc<dyn WalletProvider>, WalletError>;
}

// 2. Connection Manager

struct ActiveConnection {
    provider: Arc<dyn WalletProvider>,
    session: WalletSession,
}

/// ConnectionManager
///
/// Owns the wallet connection explicitly. The remote-signing provider is created on first use
/// and cached here (never in a global), and is released on `disconnect`.
pub struct ConnectionManager {
    source: Arc<dyn ProviderSource>,
    config: RemoteSigningConfig,
    remote: Option<Arc<dyn WalletProvider>>,
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    pub fn new(source: Arc<dyn ProviderSource>, config: RemoteSigningConfig) -> Self {
        Self {
            source,
            config,
            remote: None,
            active: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&WalletSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Whether a remote-signing provider is currently held by the manager.
    pub fn has_cached_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// select_provider
    ///
    /// Injected wallet first; otherwise the cached remote-signing provider, creating it once.
    fn select_provider(&mut self) -> Result<Arc<dyn WalletProvider>, WalletError> {
        if let Some(injected) = self.source.injected() {
            return Ok(injected);
        }

        if let Some(remote) = &self.remote {
            return Ok(Arc::clone(remote));
        }

        let remote = self.source.create_remote_signing(&self.config)?;
        tracing::debug!(chains = ?self.config.chains, "created remote-signing provider");
        self.remote = Some(Arc::clone(&remote));
        Ok(remote)
    }

    /// connect
    ///
    /// Returns the current session when already connected; otherwise selects a provider and
    /// requests accounts from it.
    pub async fn connect(&mut self) -> Result<&WalletSession, WalletError> {
        if self.active.is_none() {
            let provider = self.select_provider()?;
            tracing::debug!(kind = ?provider.kind(), "requesting wallet accounts");
            let session = provider.request_accounts().await?;
            tracing::info!(
                account = %session.account,
                provider = ?session.provider,
                "wallet connected"
            );
            self.active = Some(ActiveConnection { provider, session });
        }

        self.session().ok_or(WalletError::NotConnected)
    }

    /// disconnect
    ///
    /// Tears the connection down and drops the cached remote-signing provider. A no-op when
    /// nothing is connected. The manager is disconnected even if the provider fails to release
    /// its session; that failure is only logged.
    pub async fn disconnect(&mut self) {
        let active = self.active.take();
        self.remote = None;

        let Some(active) = active else {
            return;
        };
        match active.provider.disconnect().await {
            Ok(()) => tracing::info!(account = %active.session.account, "wallet disconnected"),
            Err(e) => tracing::warn!(
                account = %active.session.account,
                error = %e,
                "provider failed to release wallet session"
            ),
        }
    }
}
