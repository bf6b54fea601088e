//! The bot server.
//!
//! [`BotServer`] ties a [`Transport`] to a [`Dispatcher`]: it owns the
//! router and middleware stack, registers the built-in `/help` route,
//! forwards outbound sends, and runs the serve loop with graceful shutdown.
//!
//! ```rust,ignore
//! let server = BotServer::builder().build(ConsoleTransport::new())?;
//!
//! server.handle_func("/echo", echo)?.describe("repeat the arguments");
//! server.set_alias("/echo", ["/e"])?;
//! server.add_middleware(middleware::from_fn(log_commands));
//!
//! server.serve().await?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tbot_core::{ApiResult, BoxedTransport, ChatId, OutboundMessage, Transport};
use tbot_framework::{
    BoxedHandler, Dispatcher, Handler, Middleware, RouteBuilder, RouteResult, Router,
    StatsSnapshot,
};
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::config::{BotConfig, ConfigLoader};
use crate::error::RuntimeResult;
use crate::logging;

const HELP_DESCRIPTION: &str = "list available commands";

/// A configured bot, ready to register handlers and serve.
pub struct BotServer {
    config: BotConfig,
    transport: BoxedTransport,
    dispatcher: Dispatcher,
}

impl BotServer {
    /// Creates a builder that loads configuration from files and the
    /// environment.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Creates a server from an already loaded configuration.
    pub fn from_config<T: Transport>(config: BotConfig, transport: T) -> RuntimeResult<Self> {
        Self::with_transport(config, Arc::new(transport))
    }

    /// Like [`from_config`](Self::from_config), for a transport that is
    /// already shared.
    pub fn with_transport(config: BotConfig, transport: BoxedTransport) -> RuntimeResult<Self> {
        let config = config.validate()?;

        let mut router = Router::new();
        if let Some(username) = &config.bot.username {
            router = router.with_username(username);
        }

        let dispatcher = Dispatcher::new(router, Arc::clone(&transport))
            .with_max_concurrency(config.dispatch.max_concurrency);

        if config.bot.help {
            let router = dispatcher.router();
            router
                .handle_boxed(&config.bot.help_path, router.help_handler())?
                .describe(HELP_DESCRIPTION);
        }

        debug!(
            transport = transport.name(),
            username = ?config.bot.username,
            help = config.bot.help,
            "Server created"
        );

        Ok(Self {
            config,
            transport,
            dispatcher,
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        self.dispatcher.router()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// See [`Router::handle_func`].
    pub fn handle_func<H, T>(
        &self,
        path: impl AsRef<str>,
        handler: H,
    ) -> RouteResult<RouteBuilder<'_>>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.router().handle_func(path, handler)
    }

    /// See [`Router::handle`].
    pub fn handle(
        &self,
        path: impl AsRef<str>,
        reply: impl Into<String>,
    ) -> RouteResult<RouteBuilder<'_>> {
        self.router().handle(path, reply)
    }

    pub fn handle_boxed(
        &self,
        path: impl AsRef<str>,
        handler: BoxedHandler,
    ) -> RouteResult<RouteBuilder<'_>> {
        self.router().handle_boxed(path, handler)
    }

    pub fn handle_file<H, T>(&self, handler: H) -> RouteBuilder<'_>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.router().handle_file(handler)
    }

    pub fn handle_default<H, T>(&self, handler: H) -> RouteBuilder<'_>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.router().handle_default(handler)
    }

    /// See [`Router::set_alias`].
    pub fn set_alias<I, S>(&self, route: impl AsRef<str>, aliases: I) -> RouteResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.router().set_alias(route, aliases)
    }

    pub fn remove(&self, path: &str) -> bool {
        self.router().remove(path)
    }

    /// Appends a middleware. The first one added is the outermost.
    pub fn add_middleware(&self, middleware: Middleware) {
        self.dispatcher.add_middleware(middleware);
    }

    /// Clears the conversation state of `chat_id`.
    pub fn reset(&self, chat_id: ChatId) -> bool {
        self.router().reset(chat_id)
    }

    // ─── Outbound ─────────────────────────────────────────────────────────────

    /// Sends a plain text message.
    pub async fn send(&self, chat_id: ChatId, text: impl Into<String>) -> ApiResult<()> {
        self.send_message(OutboundMessage::text(chat_id, text)).await
    }

    pub async fn send_message(&self, message: OutboundMessage) -> ApiResult<()> {
        self.transport.send(message).await
    }

    /// Calls a transport endpoint the message model does not cover.
    pub async fn send_raw(
        &self,
        endpoint: &str,
        params: HashMap<String, String>,
    ) -> ApiResult<Value> {
        self.transport.send_raw(endpoint, params).await
    }

    // ─── Serving ──────────────────────────────────────────────────────────────

    pub fn stats(&self) -> StatsSnapshot {
        self.dispatcher.stats()
    }

    /// Serves until the update stream ends or Ctrl+C / SIGTERM arrives.
    pub async fn serve(&self) -> RuntimeResult<()> {
        self.serve_until(wait_for_shutdown()).await
    }

    /// Serves until the update stream ends or `shutdown` completes.
    ///
    /// Either way, in-flight handlers get up to `dispatch.drain_timeout_ms`
    /// to finish before the transport is shut down. Handlers still running
    /// after that are left alone.
    pub async fn serve_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let updates = self.transport.updates().await?;
        info!(
            transport = self.transport.name(),
            routes = self.router().routes().len(),
            max_concurrency = ?self.config.dispatch.max_concurrency,
            "Server started"
        );

        tokio::select! {
            () = self.dispatcher.run(updates) => {}
            () = shutdown => info!("Shutdown requested, no longer accepting updates"),
        }

        let drained = self
            .dispatcher
            .drain(self.config.dispatch.drain_timeout())
            .await;
        self.transport.shutdown().await;

        let stats = self.stats();
        info!(
            received = stats.received,
            handled = stats.handled,
            unhandled = stats.unhandled,
            failed = stats.failed,
            panicked = stats.panicked,
            drained,
            "Server stopped"
        );
        Ok(())
    }
}

impl std::fmt::Debug for BotServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotServer")
            .field("transport", &self.transport.name())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(err) => warn!(error = %err, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => {
            error!(error = %err, "Failed to listen for Ctrl+C, serving until the stream ends");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// ServerBuilder
// =============================================================================

/// Loads configuration, installs logging and creates a [`BotServer`].
///
/// ```rust,ignore
/// let server = BotServer::builder()
///     .config_file("deploy/tbot.toml")
///     .profile("production")
///     .build(transport)?;
/// ```
pub struct ServerBuilder {
    config_loader: ConfigLoader,
    init_logging: bool,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            init_logging: true,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges configuration set in code under files and the environment.
    pub fn merge(mut self, config: BotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Skips installing the global subscriber, for callers that set up
    /// `tracing` themselves.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> RuntimeResult<BotServer> {
        let config = self.config_loader.load()?;
        if self.init_logging && !logging::init_from_config(&config.logging) {
            debug!("A tracing subscriber is already installed, keeping it");
        }
        BotServer::from_config(config, transport)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbot_core::{MemoryTransport, Update};
    use tbot_framework::{MatchKind, RouteError};

    fn server(config: BotConfig) -> (BotServer, tbot_core::MemoryHandle) {
        let (transport, handle) = MemoryTransport::new(8);
        (BotServer::from_config(config, transport).unwrap(), handle)
    }

    #[test]
    fn test_help_route_registered() {
        let (server, _handle) = server(BotConfig::default());
        let routes = server.router().routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/help");
        assert_eq!(routes[0].description.as_deref(), Some(HELP_DESCRIPTION));
    }

    #[test]
    fn test_help_disabled() {
        let mut config = BotConfig::default();
        config.bot.help = false;
        let (server, _handle) = server(config);
        assert!(server.router().routes().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = BotConfig::default();
        config.dispatch.max_concurrency = Some(0);
        let (transport, _handle) = MemoryTransport::new(1);
        assert!(matches!(
            BotServer::from_config(config, transport),
            Err(crate::RuntimeError::Config(_))
        ));
    }

    #[test]
    fn test_registration_errors_surface() {
        let (server, _handle) = server(BotConfig::default());
        server.handle("/go", "went").unwrap();
        server.set_alias("/go", ["/g"]).unwrap();
        assert_eq!(
            server.set_alias("/g", ["/gg"]),
            Err(RouteError::AliasOfAlias {
                route: "/g".into(),
                target: "/go".into()
            })
        );
    }

    #[test]
    fn test_username_from_config() {
        let mut config = BotConfig::default();
        config.bot.username = Some("@my_bot".into());
        let (server, _handle) = server(config);
        server.handle("/ping", "pong").unwrap();

        let resolution = server.router().resolve(&Update::text(1, "/ping@my_bot"));
        assert_eq!(resolution.kind, MatchKind::Route);
    }

    #[tokio::test]
    async fn test_send_goes_to_transport() {
        let (server, handle) = server(BotConfig::default());
        server.send(7, "hello").await.unwrap();
        assert_eq!(handle.sent_texts(), vec!["hello"]);
    }
}
