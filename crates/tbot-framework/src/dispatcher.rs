//! Update dispatcher.
//!
//! The [`Dispatcher`] ties the pieces together. For every update it:
//!
//! 1. Resolves a handler with the [`Router`]
//! 2. Snapshots the [`MiddlewareStack`] and composes it around the handler
//! 3. Runs the composed service in its own task
//!
//! Dispatch is fire-and-forget. Updates are not ordered relative to each
//! other, not even two updates from the same chat; callers that need per-chat
//! ordering must serialize upstream. No timeout is imposed on handlers.
//!
//! A failing or panicking handler only affects its own update: the error is
//! logged, counted in [`DispatchStats`], and reported as a
//! [`DispatchOutcome`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;
use tracing::{Instrument, debug, debug_span, error, info, warn};

use tbot_core::{BoxedTransport, Update, UpdateStream};

use crate::context::Context;
use crate::error::ExtractError;
use crate::middleware::{Middleware, MiddlewareStack, compose, terminal};
use crate::router::{MatchKind, Resolution, Router};

/// What happened to one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and returned `Ok` (or a middleware short-circuited).
    Handled { rule: MatchKind },
    /// Nothing matched and there is no default handler.
    Unhandled,
    /// The chain returned an error.
    Failed { rule: MatchKind, error: String },
    /// The handler or a middleware panicked.
    Panicked { rule: MatchKind, message: String },
}

impl DispatchOutcome {
    /// Returns `true` for [`DispatchOutcome::Handled`].
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }

    /// The rule that picked the handler, if one was found.
    pub fn rule(&self) -> Option<MatchKind> {
        match self {
            Self::Handled { rule } | Self::Failed { rule, .. } | Self::Panicked { rule, .. } => {
                Some(*rule)
            }
            Self::Unhandled => None,
        }
    }
}

/// Dispatch counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    received: AtomicU64,
    handled: AtomicU64,
    unhandled: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

/// A point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub handled: u64,
    pub unhandled: u64,
    pub failed: u64,
    pub panicked: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Handled { .. } => &self.handled,
            DispatchOutcome::Unhandled => &self.unhandled,
            DispatchOutcome::Failed { .. } => &self.failed,
            DispatchOutcome::Panicked { .. } => &self.panicked,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Routes updates to handlers, one task per update.
///
/// Cloning is cheap; clones share the router, middlewares, task tracker and
/// counters.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
    middlewares: MiddlewareStack,
    transport: BoxedTransport,
    tracker: TaskTracker,
    limiter: Option<Arc<Semaphore>>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    /// Creates a dispatcher that replies through `transport`.
    pub fn new(router: Router, transport: BoxedTransport) -> Self {
        Self {
            router,
            middlewares: MiddlewareStack::new(),
            transport,
            tracker: TaskTracker::new(),
            limiter: None,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// Shares an existing middleware stack.
    pub fn with_middlewares(mut self, middlewares: MiddlewareStack) -> Self {
        self.middlewares = middlewares;
        self
    }

    /// Caps the number of handlers running at once.
    ///
    /// When the cap is reached [`spawn`](Self::spawn) waits for a free slot,
    /// which in turn stops [`run`](Self::run) from pulling more updates.
    /// `None` (the default) means unbounded.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn middlewares(&self) -> &MiddlewareStack {
        &self.middlewares
    }

    /// Appends a middleware. Only updates dispatched afterwards see it.
    pub fn add_middleware(&self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of dispatch tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Dispatches one update on the current task and reports the outcome.
    pub async fn dispatch(&self, update: Update) -> DispatchOutcome {
        self.stats.received.fetch_add(1, Ordering::Relaxed);
        let resolution = self.router.resolve(&update);
        let span = debug_span!(
            "dispatch",
            chat_id = update.chat_id,
            command = %resolution.command,
            rule = %resolution.kind,
        );

        let outcome = self.invoke(update, resolution).instrument(span).await;
        self.stats.record(&outcome);
        outcome
    }

    async fn invoke(&self, update: Update, resolution: Resolution) -> DispatchOutcome {
        let Resolution {
            kind: rule,
            route,
            handler,
            ..
        } = resolution;
        let Some(handler) = handler else {
            warn!("No route, alias or default handler matched; update dropped");
            return DispatchOutcome::Unhandled;
        };

        let ctx = Context::new(
            update,
            Arc::clone(&self.transport),
            Arc::clone(self.router.conversations()),
        )
        .with_match(rule, route)
        .with_username(self.router.username());

        let service = compose(&self.middlewares.snapshot(), terminal(handler));
        match AssertUnwindSafe(service.oneshot(Arc::new(ctx)))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {
                debug!("Update handled");
                DispatchOutcome::Handled { rule }
            }
            Ok(Err(err)) => {
                if let Some(extract) = err.downcast_ref::<ExtractError>() {
                    debug!(error = %extract, "Handler skipped: extractor rejected update");
                } else {
                    error!(error = %err, "Handler failed");
                }
                DispatchOutcome::Failed {
                    rule,
                    error: err.to_string(),
                }
            }
            Err(panic) => {
                let message = panic_message(&*panic);
                error!(panic = %message, "Handler panicked");
                DispatchOutcome::Panicked { rule, message }
            }
        }
    }

    /// Dispatches `update` on a new tracked task.
    ///
    /// Returns once the task is spawned, which is immediate unless a
    /// concurrency cap is set and reached.
    pub async fn spawn(&self, update: Update) -> JoinHandle<DispatchOutcome> {
        let permit = match &self.limiter {
            Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
            None => None,
        };
        let this = self.clone();
        self.tracker.spawn(async move {
            let _permit = permit;
            this.dispatch(update).await
        })
    }

    /// Spawns a task for every update until the stream closes.
    ///
    /// Returns as soon as the stream is exhausted; in-flight tasks keep
    /// running. Use [`drain`](Self::drain) to wait for them.
    pub async fn run(&self, mut updates: UpdateStream) {
        info!(transport = self.transport.name(), "Dispatcher started");
        while let Some(update) = updates.recv().await {
            self.spawn(update).await;
        }
        self.tracker.close();
        info!(
            in_flight = self.tracker.len(),
            "Update stream closed, no longer accepting updates"
        );
    }

    /// Waits for in-flight tasks, at most `timeout` if given.
    ///
    /// Tasks are never cancelled. Returns `false` if the timeout elapsed
    /// first.
    pub async fn drain(&self, timeout: Option<Duration>) -> bool {
        self.tracker.close();
        let drained = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.tracker.wait())
                .await
                .is_ok(),
            None => {
                self.tracker.wait().await;
                true
            }
        };
        if drained {
            debug!("All dispatch tasks finished");
        } else {
            warn!(
                in_flight = self.tracker.len(),
                "Drain timed out, leaving tasks running"
            );
        }
        drained
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("middlewares", &self.middlewares.len())
            .field("transport", &self.transport.name())
            .field("in_flight", &self.tracker.len())
            .field("max_concurrency", &self.limiter.is_some())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;
    use crate::extractor::{Chat, Text};
    use crate::middleware::from_fn;
    use std::sync::atomic::AtomicUsize;
    use tbot_core::{FileUpload, MemoryHandle, MemoryTransport};
    use tokio::sync::Notify;

    fn dispatcher() -> (Dispatcher, MemoryHandle) {
        let (transport, handle) = MemoryTransport::new(16);
        (Dispatcher::new(Router::new(), Arc::new(transport)), handle)
    }

    #[tokio::test]
    async fn test_outcomes() {
        let (dispatcher, handle) = dispatcher();
        let router = dispatcher.router();
        router.handle("/start", "greet").unwrap();
        router.set_alias("/start", ["/go"]).unwrap();
        router
            .handle_func("/fail", || async { Err::<(), _>("nope") })
            .unwrap();

        assert_eq!(
            dispatcher.dispatch(Update::text(42, "/go")).await,
            DispatchOutcome::Handled {
                rule: MatchKind::Alias
            }
        );
        assert_eq!(
            dispatcher.dispatch(Update::text(42, "/unknown")).await,
            DispatchOutcome::Unhandled
        );
        assert!(matches!(
            dispatcher.dispatch(Update::text(42, "/fail")).await,
            DispatchOutcome::Failed { rule: MatchKind::Route, error } if error.contains("nope")
        ));

        assert_eq!(handle.sent_texts(), vec!["greet"]);
        assert_eq!(
            dispatcher.stats(),
            StatsSnapshot {
                received: 3,
                handled: 1,
                unhandled: 1,
                failed: 1,
                panicked: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_extractor_rejection_is_a_failure() {
        let (dispatcher, _handle) = dispatcher();
        dispatcher
            .router()
            .handle_file(|Text(text): Text| async move { text });

        let outcome = dispatcher
            .dispatch(Update::file(1, FileUpload::new("f")))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Failed { rule: MatchKind::File, .. }));
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        async fn boom() {
            panic!("handler exploded");
        }

        let (dispatcher, handle) = dispatcher();
        let router = dispatcher.router();
        router.handle_func("/boom", boom).unwrap();
        router.handle("/ok", "still alive").unwrap();

        let outcome = dispatcher.spawn(Update::text(1, "/boom")).await.await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Panicked {
                rule: MatchKind::Route,
                message: "handler exploded".into()
            }
        );

        let outcome = dispatcher.spawn(Update::text(1, "/ok")).await.await.unwrap();
        assert!(outcome.is_handled());
        assert_eq!(handle.sent_texts(), vec!["still alive"]);
        assert_eq!(dispatcher.stats().panicked, 1);
    }

    #[tokio::test]
    async fn test_middleware_sees_match_and_can_short_circuit() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.router().handle("/admin", "secret").unwrap();
        dispatcher.router().handle("/public", "hello").unwrap();
        dispatcher.add_middleware(from_fn(|ctx, next| async move {
            if ctx.route() == Some("/admin") && ctx.chat_id() != 1 {
                ctx.reply("denied").await?;
                return Ok(());
            }
            next.run(ctx).await
        }));

        dispatcher.dispatch(Update::text(2, "/admin")).await;
        dispatcher.dispatch(Update::text(1, "/admin")).await;
        dispatcher.dispatch(Update::text(2, "/public")).await;

        assert_eq!(handle.sent_texts(), vec!["denied", "secret", "hello"]);
    }

    #[tokio::test]
    async fn test_middleware_registered_later_applies_to_later_updates() {
        let (dispatcher, handle) = dispatcher();
        dispatcher.router().handle("/a", "a").unwrap();

        dispatcher.dispatch(Update::text(1, "/a")).await;
        dispatcher.add_middleware(from_fn(|ctx, next| async move {
            ctx.reply("wrapped").await?;
            next.run(ctx).await
        }));
        dispatcher.dispatch(Update::text(1, "/a")).await;

        assert_eq!(handle.sent_texts(), vec!["a", "wrapped", "a"]);
    }

    #[tokio::test]
    async fn test_spawn_does_not_wait_for_handler() {
        let (dispatcher, _handle) = dispatcher();
        let release = Arc::new(Notify::new());
        let gate = Arc::clone(&release);
        dispatcher
            .router()
            .handle_func("/slow", move || {
                let gate = Arc::clone(&gate);
                async move { gate.notified().await }
            })
            .unwrap();
        dispatcher.router().handle("/fast", "fast").unwrap();

        let slow = dispatcher.spawn(Update::text(1, "/slow")).await;
        let fast = dispatcher.spawn(Update::text(1, "/fast")).await;

        assert!(fast.await.unwrap().is_handled());
        assert!(!slow.is_finished());

        release.notify_one();
        assert!(slow.await.unwrap().is_handled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_for_one_chat() {
        #[derive(Clone, Default)]
        struct Counter(u64);

        let (dispatcher, _handle) = dispatcher();
        let router = dispatcher.router();
        router
            .handle_func("/inc", |conv: Conversation| async move {
                conv.update(|c: &mut Counter| c.0 += 1);
            })
            .unwrap();
        router
            .handle_func("/reset", |conv: Conversation| async move {
                conv.reset();
            })
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..200 {
            let text = if i % 25 == 0 { "/reset" } else { "/inc" };
            tasks.push(dispatcher.spawn(Update::text(42, text)).await);
        }
        for task in tasks {
            assert!(task.await.unwrap().is_handled());
        }

        router.reset(42);
        for _ in 0..10 {
            dispatcher.dispatch(Update::text(42, "/inc")).await;
        }
        assert_eq!(router.conversations().get::<Counter>(42).map(|c| c.0), Some(10));
        assert_eq!(dispatcher.stats().handled, 210);
    }

    #[tokio::test]
    async fn test_run_stops_on_stream_close_and_drains() {
        let (transport, handle) = MemoryTransport::new(16);
        let transport: BoxedTransport = Arc::new(transport);
        let dispatcher = Dispatcher::new(Router::new(), Arc::clone(&transport));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        dispatcher
            .router()
            .handle_func("/count", move |Chat(_): Chat| {
                let counter = Arc::clone(&counter);
                async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        for _ in 0..5 {
            handle.push(Update::text(1, "/count")).await.unwrap();
        }
        handle.close();

        dispatcher.run(transport.updates().await.unwrap()).await;
        assert!(dispatcher.drain(Some(Duration::from_secs(5))).await);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_drain_timeout_leaves_tasks_running() {
        let (dispatcher, _handle) = dispatcher();
        dispatcher
            .router()
            .handle_func("/hang", || std::future::pending::<()>())
            .unwrap();

        dispatcher.spawn(Update::text(1, "/hang")).await;
        assert!(!dispatcher.drain(Some(Duration::from_millis(20))).await);
        assert_eq!(dispatcher.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_max_concurrency() {
        let (transport, _handle) = MemoryTransport::new(1);
        let dispatcher =
            Dispatcher::new(Router::new(), Arc::new(transport)).with_max_concurrency(Some(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        dispatcher
            .router()
            .handle_func("/work", move || {
                let (running, peak) = (Arc::clone(&r), Arc::clone(&p));
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        for _ in 0..6 {
            dispatcher.spawn(Update::text(1, "/work")).await;
        }
        assert!(dispatcher.drain(None).await);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
