//! Middleware chain.
//!
//! Every dispatch runs through the same onion of middlewares before the
//! resolved handler is invoked. A [`Middleware`] is a type-erased tower
//! [`Layer`] over [`HandlerService`], so anything from the tower ecosystem can
//! be plugged in with [`Middleware::from_layer`]; closures go through [`from_fn`].
//!
//! ```rust,ignore
//! let logging = middleware::from_fn(|ctx, next| async move {
//!     tracing::info!(chat_id = ctx.chat_id(), "enter");
//!     let res = next.run(ctx).await;
//!     tracing::info!("exit");
//!     res
//! });
//! ```
//!
//! The first middleware registered is the outermost: with `[log, auth]` and
//! handler `h`, the call order is `log -> auth -> h -> auth -> log`. A
//! middleware that returns without calling [`Next::run`] short-circuits the
//! rest of the chain.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceExt, service_fn};
use tower_layer::Layer;

use crate::context::Context;
use crate::error::BoxError;
use crate::handler::BoxedHandler;

/// The boxed service every middleware wraps.
pub type HandlerService = BoxCloneSyncService<Arc<Context>, (), BoxError>;

type WrapFn = dyn Fn(HandlerService) -> HandlerService + Send + Sync;

/// A type-erased layer over [`HandlerService`].
#[derive(Clone)]
pub struct Middleware {
    wrap: Arc<WrapFn>,
}

impl Middleware {
    /// Creates a middleware from a service-wrapping function.
    pub fn new<F>(wrap: F) -> Self
    where
        F: Fn(HandlerService) -> HandlerService + Send + Sync + 'static,
    {
        Self {
            wrap: Arc::new(wrap),
        }
    }

    /// Adapts any tower layer whose service handles `Arc<Context>`.
    ///
    /// ```rust,ignore
    /// use tower::util::MapRequestLayer;
    ///
    /// server.add_middleware(Middleware::from_layer(MapRequestLayer::new(
    ///     |ctx: Arc<Context>| {
    ///         ctx.set_extension(RequestId::next());
    ///         ctx
    ///     },
    /// )));
    /// ```
    pub fn from_layer<L>(layer: L) -> Self
    where
        L: Layer<HandlerService> + Send + Sync + 'static,
        L::Service: Service<Arc<Context>, Response = (), Error = BoxError>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Arc<Context>>>::Future: Send + 'static,
    {
        Self::new(move |inner| BoxCloneSyncService::new(layer.layer(inner)))
    }
}

impl Layer<HandlerService> for Middleware {
    type Service = HandlerService;

    fn layer(&self, inner: HandlerService) -> Self::Service {
        (self.wrap)(inner)
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// The rest of the chain, as seen from inside a [`from_fn`] middleware.
pub struct Next {
    inner: HandlerService,
}

impl Next {
    /// Runs the remaining middlewares and the handler.
    pub async fn run(self, ctx: Arc<Context>) -> Result<(), BoxError> {
        self.inner.oneshot(ctx).await
    }
}

/// Creates a middleware from an async closure.
pub fn from_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Arc<Context>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    let f = Arc::new(f);
    Middleware::new(move |inner: HandlerService| {
        let f = Arc::clone(&f);
        BoxCloneSyncService::new(service_fn(move |ctx: Arc<Context>| {
            let next = Next {
                inner: inner.clone(),
            };
            f(ctx, next)
        }))
    })
}

/// Wraps a handler as the innermost service of a chain.
pub fn terminal(handler: BoxedHandler) -> HandlerService {
    BoxCloneSyncService::new(service_fn(move |ctx: Arc<Context>| handler(ctx)))
}

/// Builds `m1(m2(...mn(terminal)))` from an ordered list.
pub fn compose(middlewares: &[Middleware], terminal: HandlerService) -> HandlerService {
    middlewares
        .iter()
        .rev()
        .fold(terminal, |service, middleware| Layer::layer(middleware, service))
}

/// The ordered, append-only list of registered middlewares.
///
/// Cloning shares the list. [`snapshot`](Self::snapshot) is what a dispatch
/// composes from, so a registration racing with a dispatch affects only
/// later updates.
#[derive(Clone, Default)]
pub struct MiddlewareStack {
    inner: Arc<RwLock<Arc<Vec<Middleware>>>>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware; it becomes the innermost one.
    pub fn push(&self, middleware: Middleware) {
        let mut list = self.inner.write();
        Arc::make_mut(&mut list).push(middleware);
    }

    /// The current list. Later pushes do not change the returned value.
    pub fn snapshot(&self) -> Arc<Vec<Middleware>> {
        Arc::clone(&self.inner.read())
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl std::fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("len", &self.len())
            .finish()
    }
}
