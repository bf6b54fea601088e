//! Command router.
//!
//! The [`Router`] owns everything needed to turn an [`Update`] into a handler:
//! the route table, the alias table, the optional file and default handlers,
//! and the per-chat [`ConversationStore`].
//!
//! # Matching rules
//!
//! 1. A file upload goes to the file handler. Its caption is never routed.
//! 2. The command token is looked up in the route table.
//! 3. Failing that, it is looked up in the alias table, and the alias target
//!    in the route table.
//! 4. Anything else (including empty text and aliases whose route has been
//!    removed) goes to the default handler.
//! 5. With no default handler the update is [`MatchKind::Unhandled`].
//!
//! Matching is exact and case-sensitive: `/Start` does not match `/start`,
//! and `/startx` does not match either.
//!
//! ```rust,ignore
//! let router = Router::new();
//! router.handle_func("/start", greet)?.describe("say hello");
//! router.set_alias("/start", ["/go"])?;
//! router.handle_default(|| async { "unknown command" });
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, warn};

use tbot_core::{ChatId, Update, strip_mention};

use crate::context::Context;
use crate::conversation::ConversationStore;
use crate::error::{RouteError, RouteResult};
use crate::handler::{BoxedHandler, Handler, into_handler, static_reply};

/// Which rule resolved an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchKind {
    /// The command equals a registered route path.
    Route,
    /// The command is an alias of a registered route.
    Alias,
    /// The update is a file upload.
    File,
    /// Nothing matched and the default handler was used.
    #[default]
    Default,
    /// Nothing matched and there is no default handler.
    Unhandled,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Alias => "alias",
            Self::File => "file",
            Self::Default => "default",
            Self::Unhandled => "unhandled",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of [`Router::resolve`].
#[derive(Clone)]
pub struct Resolution {
    /// The rule that matched.
    pub kind: MatchKind,
    /// The command token, with a mention of this bot removed. Empty for files.
    pub command: String,
    /// The canonical route path, for route and alias matches.
    pub route: Option<String>,
    /// The handler to run. `None` only for [`MatchKind::Unhandled`].
    pub handler: Option<BoxedHandler>,
}

impl Resolution {
    /// Returns `true` if a handler was found.
    pub fn is_handled(&self) -> bool {
        self.handler.is_some()
    }
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("kind", &self.kind)
            .field("command", &self.command)
            .field("route", &self.route)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// A registered route, as reported by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub path: String,
    pub description: Option<String>,
    /// Aliases pointing at this path, sorted.
    pub aliases: Vec<String>,
}

struct Slot {
    handler: BoxedHandler,
    description: Option<String>,
}

impl Slot {
    fn new(handler: BoxedHandler) -> Self {
        Self {
            handler,
            description: None,
        }
    }
}

#[derive(Default)]
struct RouterInner {
    routes: HashMap<String, Slot>,
    aliases: HashMap<String, String>,
    file: Option<Slot>,
    default: Option<Slot>,
}

/// What a [`RouteBuilder`] points at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Path(String),
    File,
    Default,
}

/// Returned by the registration methods to attach a description.
pub struct RouteBuilder<'a> {
    router: &'a Router,
    target: Target,
}

impl RouteBuilder<'_> {
    /// Sets the human-readable description shown by `/help`.
    pub fn describe(self, description: impl Into<String>) -> Self {
        let description = Some(description.into());
        let mut inner = self.router.inner.write();
        let slot = match &self.target {
            Target::Path(path) => inner.routes.get_mut(path),
            Target::File => inner.file.as_mut(),
            Target::Default => inner.default.as_mut(),
        };
        if let Some(slot) = slot {
            slot.description = description;
        }
        drop(inner);
        self
    }

    /// The registered path, for path routes.
    pub fn path(&self) -> Option<&str> {
        match &self.target {
            Target::Path(path) => Some(path),
            Target::File | Target::Default => None,
        }
    }
}

/// The command router.
///
/// Cloning is cheap and clones share the same tables, so a router can be
/// handed to the dispatcher and still receive registrations.
#[derive(Clone, Default)]
pub struct Router {
    inner: Arc<RwLock<RouterInner>>,
    conversations: Arc<ConversationStore>,
    username: Option<Arc<str>>,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bot's username so `/cmd@username` routes like `/cmd`.
    ///
    /// A leading `@` is ignored.
    pub fn with_username(mut self, username: impl AsRef<str>) -> Self {
        let username = username.as_ref().trim().trim_start_matches('@');
        self.username = (!username.is_empty()).then(|| Arc::from(username));
        self
    }

    /// The configured bot username, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Registers `handler` at `path`, replacing any previous handler there.
    pub fn handle_func<H, T>(&self, path: impl AsRef<str>, handler: H) -> RouteResult<RouteBuilder<'_>>
    where
        H: Handler<T>,
        T: 'static,
    {
        self.handle_boxed(path, into_handler(handler))
    }

    /// Registers a handler that always replies with `reply`.
    pub fn handle(&self, path: impl AsRef<str>, reply: impl Into<String>) -> RouteResult<RouteBuilder<'_>> {
        self.handle_boxed(path, static_reply(reply))
    }

    /// Registers an already type-erased handler.
    pub fn handle_boxed(
        &self,
        path: impl AsRef<str>,
        handler: BoxedHandler,
    ) -> RouteResult<RouteBuilder<'_>> {
        let path = validate_path(path.as_ref())?;
        let mut inner = self.inner.write();
        if let Some(target) = inner.aliases.get(&path) {
            debug!(path = %path, alias_of = %target, "Route shadows an existing alias");
        }
        if inner.routes.insert(path.clone(), Slot::new(handler)).is_some() {
            debug!(path = %path, "Replaced route handler");
        } else {
            debug!(path = %path, "Registered route");
        }
        drop(inner);
        Ok(RouteBuilder {
            router: self,
            target: Target::Path(path),
        })
    }

    /// Sets the file-upload handler, replacing any previous one.
    pub fn handle_file<H, T>(&self, handler: H) -> RouteBuilder<'_>
    where
        H: Handler<T>,
        T: 'static,
    {
        let mut inner = self.inner.write();
        if inner.file.replace(Slot::new(into_handler(handler))).is_some() {
            debug!("Replaced file handler");
        }
        drop(inner);
        RouteBuilder {
            router: self,
            target: Target::File,
        }
    }

    /// Sets the fallback handler, replacing any previous one.
    pub fn handle_default<H, T>(&self, handler: H) -> RouteBuilder<'_>
    where
        H: Handler<T>,
        T: 'static,
    {
        let mut inner = self.inner.write();
        if inner.default.replace(Slot::new(into_handler(handler))).is_some() {
            debug!("Replaced default handler");
        }
        drop(inner);
        RouteBuilder {
            router: self,
            target: Target::Default,
        }
    }

    /// Points each of `aliases` at `route`.
    ///
    /// `route` does not have to be registered yet: an alias whose route is
    /// missing at dispatch time falls through to the default handler. The
    /// call is rejected as a whole if `route` is itself an alias, if an alias
    /// equals `route`, if an alias is already a route path, or if another
    /// alias already points at one of the new aliases. An alias that
    /// already points elsewhere is overwritten with a warning.
    pub fn set_alias<I, S>(&self, route: impl AsRef<str>, aliases: I) -> RouteResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let route = validate_path(route.as_ref())?;
        let aliases = aliases
            .into_iter()
            .map(|alias| validate_path(alias.as_ref()))
            .collect::<RouteResult<Vec<_>>>()?;

        let mut inner = self.inner.write();
        if let Some(target) = inner.aliases.get(&route) {
            return Err(RouteError::AliasOfAlias {
                route,
                target: target.clone(),
            });
        }
        for alias in &aliases {
            if *alias == route {
                return Err(RouteError::SelfAlias(alias.clone()));
            }
            if inner.routes.contains_key(alias) {
                return Err(RouteError::AliasShadowsRoute(alias.clone()));
            }
            if let Some((by, _)) = inner.aliases.iter().find(|(_, target)| *target == alias) {
                return Err(RouteError::AliasIsTarget {
                    alias: alias.clone(),
                    by: by.clone(),
                });
            }
        }

        for alias in aliases {
            match inner.aliases.insert(alias.clone(), route.clone()) {
                Some(previous) if previous != route => {
                    warn!(alias = %alias, from = %previous, to = %route, "Alias overwritten");
                }
                _ => debug!(alias = %alias, route = %route, "Registered alias"),
            }
        }
        Ok(())
    }

    /// Removes the route at `path`. Aliases pointing at it are kept.
    pub fn remove(&self, path: &str) -> bool {
        let removed = self.inner.write().routes.remove(path.trim()).is_some();
        if removed {
            debug!(path, "Removed route");
        }
        removed
    }

    /// Removes an alias.
    pub fn remove_alias(&self, alias: &str) -> bool {
        self.inner.write().aliases.remove(alias.trim()).is_some()
    }

    /// Clears conversation state for `chat_id`. Idempotent.
    pub fn reset(&self, chat_id: ChatId) -> bool {
        self.conversations.reset(chat_id)
    }

    /// The shared conversation store.
    pub fn conversations(&self) -> &Arc<ConversationStore> {
        &self.conversations
    }

    // ─── Resolution ───────────────────────────────────────────────────────────

    /// Picks the handler for `update`.
    pub fn resolve(&self, update: &Update) -> Resolution {
        let inner = self.inner.read();

        if update.is_file() {
            if let Some(slot) = &inner.file {
                return Resolution {
                    kind: MatchKind::File,
                    command: String::new(),
                    route: None,
                    handler: Some(Arc::clone(&slot.handler)),
                };
            }
            return Self::fallback(&inner, String::new());
        }

        let raw = update.command().unwrap_or_default();
        let command = match self.username.as_deref() {
            Some(username) => strip_mention(raw, username),
            None => raw,
        };

        if let Some(slot) = inner.routes.get(command) {
            return Resolution {
                kind: MatchKind::Route,
                command: command.to_string(),
                route: Some(command.to_string()),
                handler: Some(Arc::clone(&slot.handler)),
            };
        }

        if let Some(target) = inner.aliases.get(command) {
            if let Some(slot) = inner.routes.get(target) {
                return Resolution {
                    kind: MatchKind::Alias,
                    command: command.to_string(),
                    route: Some(target.clone()),
                    handler: Some(Arc::clone(&slot.handler)),
                };
            }
            debug!(alias = command, route = %target, "Alias points at a missing route");
        }

        Self::fallback(&inner, command.to_string())
    }

    fn fallback(inner: &RouterInner, command: String) -> Resolution {
        match &inner.default {
            Some(slot) => Resolution {
                kind: MatchKind::Default,
                command,
                route: None,
                handler: Some(Arc::clone(&slot.handler)),
            },
            None => Resolution {
                kind: MatchKind::Unhandled,
                command,
                route: None,
                handler: None,
            },
        }
    }

    // ─── Introspection ────────────────────────────────────────────────────────

    /// All registered routes, sorted by path.
    pub fn routes(&self) -> Vec<RouteInfo> {
        route_infos(&self.inner.read())
    }

    /// Returns `true` if `path` is a registered route.
    pub fn contains(&self, path: &str) -> bool {
        self.inner.read().routes.contains_key(path)
    }

    /// Returns `true` if a file handler is set.
    pub fn has_file_handler(&self) -> bool {
        self.inner.read().file.is_some()
    }

    /// Returns `true` if a default handler is set.
    pub fn has_default_handler(&self) -> bool {
        self.inner.read().default.is_some()
    }

    /// Renders the route list, one route per line.
    ///
    /// ```text
    /// /help - list commands
    /// /start (/go, /s) - say hello
    /// files - store an upload
    /// other - anything else
    /// ```
    pub fn help_text(&self) -> String {
        render_help(&self.inner.read())
    }

    /// A handler replying with the current [`help_text`](Self::help_text).
    ///
    /// The handler only holds a weak reference, so registering it on this
    /// same router does not keep the tables alive.
    pub fn help_handler(&self) -> BoxedHandler {
        let inner = Arc::downgrade(&self.inner);
        Arc::new(move |ctx: Arc<Context>| {
            let text = inner.upgrade().map(|inner| render_help(&inner.read()));
            async move {
                if let Some(text) = text.filter(|text| !text.is_empty()) {
                    ctx.reply(text).await?;
                }
                Ok(())
            }
            .boxed()
        })
    }
}

fn route_infos(inner: &RouterInner) -> Vec<RouteInfo> {
    let mut routes: Vec<RouteInfo> = inner
        .routes
        .iter()
        .map(|(path, slot)| {
            let mut aliases: Vec<String> = inner
                .aliases
                .iter()
                .filter(|(_, target)| *target == path)
                .map(|(alias, _)| alias.clone())
                .collect();
            aliases.sort();
            RouteInfo {
                path: path.clone(),
                description: slot.description.clone(),
                aliases,
            }
        })
        .collect();
    routes.sort_by(|a, b| a.path.cmp(&b.path));
    routes
}

fn render_help(inner: &RouterInner) -> String {
    let mut lines: Vec<String> = route_infos(inner)
        .into_iter()
        .map(|route| {
            let mut line = route.path;
            if !route.aliases.is_empty() {
                line.push_str(&format!(" ({})", route.aliases.join(", ")));
            }
            if let Some(description) = route.description {
                line.push_str(" - ");
                line.push_str(&description);
            }
            line
        })
        .collect();

    if let Some(description) = inner.file.as_ref().and_then(|slot| slot.description.as_ref()) {
        lines.push(format!("files - {description}"));
    }
    if let Some(description) = inner.default.as_ref().and_then(|slot| slot.description.as_ref()) {
        lines.push(format!("other - {description}"));
    }
    lines.join("\n")
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Router")
            .field("routes", &inner.routes.len())
            .field("aliases", &inner.aliases.len())
            .field("file", &inner.file.is_some())
            .field("default", &inner.default.is_some())
            .field("username", &self.username)
            .finish()
    }
}

fn validate_path(path: &str) -> RouteResult<String> {
    let path = path.trim();
    if path.is_empty() {
        return Err(RouteError::EmptyPath);
    }
    if path.chars().any(char::is_whitespace) {
        return Err(RouteError::InvalidPath(path.to_string()));
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Args;
    use tbot_core::{FileUpload, MemoryHandle, MemoryTransport};

    /// Resolves `update` and runs the handler, returning what it replied.
    async fn run(router: &Router, update: Update) -> (MatchKind, Vec<String>) {
        let (transport, handle): (MemoryTransport, MemoryHandle) = MemoryTransport::new(1);
        let resolution = router.resolve(&update);
        if let Some(handler) = resolution.handler {
            let ctx = Context::new(update, Arc::new(transport), Arc::clone(router.conversations()));
            handler(Arc::new(ctx)).await.unwrap();
        }
        (resolution.kind, handle.sent_texts())
    }

    #[tokio::test]
    async fn test_exact_match() {
        let router = Router::new();
        router.handle("/start", "greet").unwrap();
        router.handle("/help", "help").unwrap();

        assert_eq!(
            run(&router, Update::text(1, "/start")).await,
            (MatchKind::Route, vec!["greet".to_string()])
        );
        assert_eq!(
            run(&router, Update::text(1, "/help me")).await,
            (MatchKind::Route, vec!["help".to_string()])
        );
    }

    #[tokio::test]
    async fn test_alias_scenario() {
        let router = Router::new();
        router.handle("/start", "greet").unwrap();
        router.set_alias("/start", ["/go"]).unwrap();
        router.handle_default(|| async { "default" });

        let resolution = router.resolve(&Update::text(42, "/go"));
        assert_eq!(resolution.kind, MatchKind::Alias);
        assert_eq!(resolution.route.as_deref(), Some("/start"));

        assert_eq!(
            run(&router, Update::text(42, "/go")).await.1,
            vec!["greet"]
        );
        assert_eq!(
            run(&router, Update::text(42, "/unknown")).await,
            (MatchKind::Default, vec!["default".to_string()])
        );
    }

    #[tokio::test]
    async fn test_reregistration_replaces() {
        let router = Router::new();
        router.handle("/start", "first").unwrap();
        router.handle("/start", "second").unwrap();

        assert_eq!(router.routes().len(), 1);
        assert_eq!(
            run(&router, Update::text(1, "/start")).await.1,
            vec!["second"]
        );
    }

    #[tokio::test]
    async fn test_removed_route_alias_falls_to_default() {
        let router = Router::new();
        router.handle("/start", "greet").unwrap();
        router.set_alias("/start", ["/go"]).unwrap();
        router.handle_default(|| async { "default" });

        assert!(router.remove("/start"));
        assert!(!router.remove("/start"));
        assert_eq!(
            run(&router, Update::text(1, "/go")).await,
            (MatchKind::Default, vec!["default".to_string()])
        );
    }

    #[test]
    fn test_alias_to_unregistered_route_is_lazy() {
        let router = Router::new();
        router.set_alias("/later", ["/l"]).unwrap();
        assert_eq!(router.resolve(&Update::text(1, "/l")).kind, MatchKind::Unhandled);

        router.handle("/later", "now").unwrap();
        assert_eq!(router.resolve(&Update::text(1, "/l")).kind, MatchKind::Alias);
    }

    #[tokio::test]
    async fn test_file_ignores_caption() {
        let router = Router::new();
        router.handle("/start", "greet").unwrap();
        router.handle_file(|| async { "got file" });

        let upload = FileUpload::new("f1").with_caption("/start");
        assert_eq!(
            run(&router, Update::file(1, upload)).await,
            (MatchKind::File, vec!["got file".to_string()])
        );
    }

    #[test]
    fn test_file_without_file_handler_uses_default() {
        let router = Router::new();
        assert_eq!(
            router.resolve(&Update::file(1, FileUpload::new("f"))).kind,
            MatchKind::Unhandled
        );

        router.handle_default(|| async {});
        assert_eq!(
            router.resolve(&Update::file(1, FileUpload::new("f"))).kind,
            MatchKind::Default
        );
    }

    #[test]
    fn test_empty_and_malformed_text_go_to_default() {
        let router = Router::new();
        router.handle_default(|| async {});
        for text in ["", "   ", "\n\t"] {
            assert_eq!(router.resolve(&Update::text(1, text)).kind, MatchKind::Default);
        }
    }

    #[test]
    fn test_matching_is_exact_and_case_sensitive() {
        let router = Router::new();
        router.handle("/start", "greet").unwrap();

        for text in ["/Start", "/star", "/startx", "start"] {
            assert_eq!(
                router.resolve(&Update::text(1, text)).kind,
                MatchKind::Unhandled,
                "{text}"
            );
        }
    }

    #[test]
    fn test_exact_match_beats_alias() {
        let router = Router::new();
        router.set_alias("/start", ["/go"]).unwrap();
        router.handle("/start", "greet").unwrap();
        router.handle("/go", "go").unwrap();

        let resolution = router.resolve(&Update::text(1, "/go"));
        assert_eq!(resolution.kind, MatchKind::Route);
        assert_eq!(resolution.route.as_deref(), Some("/go"));
    }

    #[test]
    fn test_registration_errors() {
        let router = Router::new();
        router.handle("/start", "greet").unwrap();
        router.set_alias("/start", ["/go"]).unwrap();

        assert_eq!(router.handle("  ", "x").err(), Some(RouteError::EmptyPath));
        assert_eq!(
            router.handle("/a b", "x").err(),
            Some(RouteError::InvalidPath("/a b".into()))
        );
        assert_eq!(
            router.set_alias("/go", ["/g"]),
            Err(RouteError::AliasOfAlias {
                route: "/go".into(),
                target: "/start".into()
            })
        );
        assert_eq!(
            router.set_alias("/start", ["/start"]),
            Err(RouteError::SelfAlias("/start".into()))
        );

        router.handle("/help", "help").unwrap();
        assert_eq!(
            router.set_alias("/start", ["/s", "/help"]),
            Err(RouteError::AliasShadowsRoute("/help".into()))
        );
        // Rejected calls register nothing.
        assert_eq!(router.resolve(&Update::text(1, "/s")).kind, MatchKind::Unhandled);
    }

    #[test]
    fn test_alias_target_cannot_become_alias() {
        let router = Router::new();
        router.handle("/c", "c").unwrap();
        router.set_alias("/b", ["/x"]).unwrap();

        assert_eq!(
            router.set_alias("/c", ["/b"]),
            Err(RouteError::AliasIsTarget {
                alias: "/b".into(),
                by: "/x".into()
            })
        );
        assert_eq!(router.resolve(&Update::text(1, "/b")).kind, MatchKind::Unhandled);
        assert!(router.routes()[0].aliases.is_empty());

        // Once the target is registered, the pending alias resolves to it.
        router.handle("/b", "b").unwrap();
        assert_eq!(router.resolve(&Update::text(1, "/x")).kind, MatchKind::Alias);
    }

    #[test]
    fn test_alias_overwrite_last_wins() {
        let router = Router::new();
        router.handle("/a", "a").unwrap();
        router.handle("/b", "b").unwrap();
        router.set_alias("/a", ["/x"]).unwrap();
        router.set_alias("/b", ["/x"]).unwrap();

        assert_eq!(
            router.resolve(&Update::text(1, "/x")).route.as_deref(),
            Some("/b")
        );
    }

    #[test]
    fn test_username_mention() {
        let router = Router::new().with_username("@my_bot");
        router.handle("/start", "greet").unwrap();

        let resolution = router.resolve(&Update::text(1, "/start@my_bot now"));
        assert_eq!(resolution.kind, MatchKind::Route);
        assert_eq!(resolution.command, "/start");
        assert_eq!(
            router.resolve(&Update::text(1, "/start@other_bot")).kind,
            MatchKind::Unhandled
        );
        assert_eq!(
            Router::new().resolve(&Update::text(1, "/start@my_bot")).command,
            "/start@my_bot"
        );
    }

    #[tokio::test]
    async fn test_handler_sees_args() {
        let router = Router::new();
        router
            .handle_func("/echo", |Args(args): Args| async move { args })
            .unwrap();

        assert_eq!(
            run(&router, Update::text(1, "/echo  hello  world ")).await.1,
            vec!["hello  world"]
        );
    }

    #[test]
    fn test_routes_and_help_text() {
        let router = Router::new();
        router.handle("/start", "hi").unwrap().describe("say hello");
        router.handle("/help", "").unwrap().describe("list commands");
        router.handle("/ping", "pong").unwrap();
        router.set_alias("/start", ["/s", "/go"]).unwrap();
        router.handle_file(|| async {}).describe("store an upload");

        let routes = router.routes();
        assert_eq!(
            routes.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
            vec!["/help", "/ping", "/start"]
        );
        assert_eq!(routes[2].aliases, vec!["/go", "/s"]);

        assert_eq!(
            router.help_text(),
            "/help - list commands\n/ping\n/start (/go, /s) - say hello\nfiles - store an upload"
        );

        router.handle_default(|| async {}).describe("anything else");
        assert!(router.help_text().ends_with("\nfiles - store an upload\nother - anything else"));
    }

    #[tokio::test]
    async fn test_help_handler_reflects_later_routes() {
        let router = Router::new();
        router
            .handle_boxed("/help", router.help_handler())
            .unwrap()
            .describe("list commands");
        router.handle("/ping", "pong").unwrap();

        assert_eq!(
            run(&router, Update::text(1, "/help")).await.1,
            vec!["/help - list commands\n/ping"]
        );
    }

    #[test]
    fn test_reset_is_idempotent() {
        #[derive(Clone)]
        struct Draft;

        let router = Router::new();
        router.conversations().set(42, Draft);

        assert!(router.reset(42));
        assert!(!router.reset(42));
    }
}
