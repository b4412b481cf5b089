//! Coordinator server

use crate::common::{CoordinatorConfig, Result};
use crate::coordinator::http::{create_router, CoordState};
use crate::coordinator::store::{DeleteFilter, MessageStore};
use std::net::SocketAddr;

/// What to do with the database before serving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupMode {
    /// Create the table if needed, then drop leftover test entries when configured
    Normal,
    /// Drop and recreate the table
    Reset,
}

pub struct Coordinator {
    config: CoordinatorConfig,
    store: MessageStore,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let store = MessageStore::new(config.database_path());
        Self { config, store }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Bring the database into a servable state.
    pub async fn prepare(&self, mode: StartupMode) -> Result<()> {
        match mode {
            StartupMode::Reset => {
                self.store.reset().await?;
                tracing::warn!("Database has been reset");
            }
            StartupMode::Normal => {
                self.store.initialize().await?;
                if self.config.clean_test_entries {
                    let removed = self
                        .store
                        .delete_matching(&DeleteFilter::test_entries())
                        .await?;
                    if removed > 0 {
                        tracing::info!("Cleaned {} test entries from database", removed);
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn serve(self, mode: StartupMode) -> Result<()> {
        tracing::info!("Starting coordinator");
        tracing::info!("  HTTP: {}", self.config.bind_addr());
        tracing::info!("  DB path: {}", self.store.path().display());
        tracing::debug!("  Profile: {:?}", self.config.profile);

        self.prepare(mode).await?;
        tracing::info!("  Messages: {}", self.store.count().await?);

        let router = create_router(CoordState {
            store: self.store.clone(),
        });

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr()).await?;
        tracing::info!("✓ Coordinator ready");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Coordinator stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
