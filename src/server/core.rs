use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::error::handlers::handle_error;
use crate::middleware::{Pipeline, PublicFiles, RawFsGateway, StaticFiles};
use crate::protocol::UrlClassifier;
use crate::safe_paths::{SafeModulePaths, SafePathRegistry};
use crate::server::connection::handle_connection;
use crate::storage::AccessGuard;
use crate::transfer::DirectoryTransfer;
use crate::utils::WarnOnce;

/// Assemble the serving middlewares for `config`: public directory (when it
/// exists), project-root static files, then raw filesystem access.
pub fn build_pipeline(
    config: &ServerConfig,
    safe_paths: Arc<dyn SafeModulePaths>,
    warnings: Arc<WarnOnce>,
) -> Result<Pipeline, ServerError> {
    let root = config.root_path()?;
    let routing = &config.routing;

    let classifier = Arc::new(
        UrlClassifier::new(&routing.import_marker, routing.internal_prefixes.clone())
            .map_err(|e| config::ConfigError::Message(format!("invalid import marker: {e}")))?,
    );
    let aliases = Arc::new(config.alias_table(&root)?);
    debug!("Loaded {} alias rules", aliases.rules().len());
    let policy = Arc::new(config.serving_policy(&root));
    let guard = AccessGuard::new(policy, safe_paths, warnings);

    let mut pipeline = Pipeline::new();

    if let Some(public_dir) = config.public_dir_path(&root).filter(|dir| dir.is_dir()) {
        info!("Serving public directory {}", public_dir.display());
        pipeline.push(PublicFiles::new(
            Arc::clone(&classifier),
            Box::new(DirectoryTransfer::new(public_dir)),
        ));
    }

    pipeline.push(StaticFiles::new(
        root.clone(),
        classifier,
        aliases,
        guard.clone(),
        Box::new(DirectoryTransfer::new(&root)),
    ));

    pipeline.push(RawFsGateway::new(
        routing.fs_prefix.clone(),
        routing.drive_letter_paths,
        guard,
        Box::new(DirectoryTransfer::new(Path::new("/"))),
    ));

    debug!("Middleware chain: {:?}", pipeline.names());
    Ok(pipeline)
}

pub struct Server {
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    config: Arc<ServerConfig>,
    safe_paths: SafePathRegistry,
    warnings: Arc<WarnOnce>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let safe_paths = SafePathRegistry::new();
        let warnings = Arc::new(WarnOnce::new());
        let pipeline = build_pipeline(
            &config,
            Arc::new(safe_paths.clone()),
            Arc::clone(&warnings),
        )?;

        let addr = config.control_socket();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Server bound to {}", addr);

        match config.root_path() {
            Ok(root) if root.is_dir() => info!("Serving root directory: {}", root.display()),
            Ok(root) => warn!("Serving root {} is not a directory", root.display()),
            Err(e) => warn!("Failed to resolve serving root: {}", e),
        }

        Ok(Self {
            listener,
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            safe_paths,
            warnings,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle for the module graph to record files it resolved.
    pub fn safe_paths(&self) -> SafePathRegistry {
        self.safe_paths.clone()
    }

    pub fn warnings(&self) -> Arc<WarnOnce> {
        Arc::clone(&self.warnings)
    }

    /// Accept connections until Ctrl-C.
    pub async fn start(&self) {
        info!(
            "Starting RAX static server on {}",
            self.local_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| self.config.control_socket())
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let pipeline = Arc::clone(&self.pipeline);
                        let max_request_bytes = self.config.startup.max_request_bytes;

                        // Spawn a task per connection so the accept loop doesn't block
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(stream, addr, pipeline, max_request_bytes).await
                            {
                                handle_error(&e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    self.shutdown();
                    break;
                }
            }
        }
    }

    /// Reset per-session state. Warnings logged once will be logged again
    /// after a restart.
    pub fn shutdown(&self) {
        info!("Shutting down RAX static server");
        self.warnings.clear();
    }
}
