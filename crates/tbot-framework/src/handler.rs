//! Handler system.
//!
//! Handlers are plain async functions. The [`Handler`] trait is implemented
//! for every function that takes 0-12 parameters implementing
//! [`FromContext`] and returns a [`HandlerResponse`], in the style of Axum:
//!
//! ```rust,ignore
//! // No parameters, no reply
//! async fn ping() {}
//!
//! // Reply with the returned text
//! async fn greet(Chat(chat): Chat) -> String {
//!     format!("hello, chat {chat}")
//! }
//!
//! // Errors are logged and counted by the dispatcher
//! async fn risky(Args(args): Args) -> Result<String, std::num::ParseIntError> {
//!     Ok((args.parse::<i64>()? * 2).to_string())
//! }
//! ```
//!
//! Handlers are stored type-erased as [`BoxedHandler`].

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use tbot_core::OutboundMessage;

use crate::context::Context;
use crate::error::{BoxError, HandlerError};
use crate::extractor::FromContext;

// ============================================================================
// HandlerResponse
// ============================================================================

/// A type that can be returned from a handler.
#[async_trait]
pub trait HandlerResponse: Send + 'static {
    /// Performs the response's side effects (usually a reply).
    async fn respond(self, ctx: &Context) -> Result<(), BoxError>;
}

/// No reply.
#[async_trait]
impl HandlerResponse for () {
    async fn respond(self, _ctx: &Context) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Reply with the string as plain text.
#[async_trait]
impl HandlerResponse for String {
    async fn respond(self, ctx: &Context) -> Result<(), BoxError> {
        ctx.reply(self).await?;
        Ok(())
    }
}

#[async_trait]
impl HandlerResponse for &'static str {
    async fn respond(self, ctx: &Context) -> Result<(), BoxError> {
        ctx.reply(self).await?;
        Ok(())
    }
}

/// Send the message as-is.
#[async_trait]
impl HandlerResponse for OutboundMessage {
    async fn respond(self, ctx: &Context) -> Result<(), BoxError> {
        ctx.send(self).await?;
        Ok(())
    }
}

/// On `Some`, the inner value responds. On `None`, nothing happens.
#[async_trait]
impl<T: HandlerResponse> HandlerResponse for Option<T> {
    async fn respond(self, ctx: &Context) -> Result<(), BoxError> {
        match self {
            Some(t) => t.respond(ctx).await,
            None => Ok(()),
        }
    }
}

/// On `Ok`, the inner value responds. On `Err`, the error becomes a
/// [`HandlerError`] for the dispatcher to report.
#[async_trait]
impl<T, E> HandlerResponse for Result<T, E>
where
    T: HandlerResponse,
    E: std::fmt::Display + Send + 'static,
{
    async fn respond(self, ctx: &Context) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.respond(ctx).await,
            Err(e) => Err(HandlerError(e.to_string()).into()),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// An async function usable as a route handler.
///
/// `T` is the tuple of extracted parameter types; it only exists to keep the
/// blanket implementations apart and is never named by callers.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Extracts the parameters, runs the function and performs its response.
    fn call(self, ctx: Arc<Context>) -> BoxFuture<'static, Result<(), BoxError>>;
}

/// A type-erased handler that can be stored in the route table.
pub type BoxedHandler =
    Arc<dyn Fn(Arc<Context>) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(move |ctx: Arc<Context>| f.clone().call(ctx))
}

/// A handler that always replies with the same text.
pub fn static_reply(reply: impl Into<String>) -> BoxedHandler {
    let reply: Arc<str> = reply.into().into();
    Arc::new(move |ctx: Arc<Context>| {
        let reply = Arc::clone(&reply);
        async move {
            ctx.reply(reply.as_ref()).await?;
            Ok(())
        }
        .boxed()
    })
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandlerResponse,
            $( $ty: FromContext + Send + 'static, )*
        {
            fn call(self, ctx: Arc<Context>) -> BoxFuture<'static, Result<(), BoxError>> {
                Box::pin(async move {
                    $(
                        let $ty = $ty::from_context(&ctx)?;
                    )*

                    let res = (self)($($ty,)*).await;
                    res.respond(&ctx).await
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationStore;
    use crate::extractor::{Args, Chat};
    use tbot_core::{MemoryHandle, MemoryTransport, Update};

    fn ctx(text: &str) -> (Arc<Context>, MemoryHandle) {
        let (transport, handle) = MemoryTransport::new(1);
        let ctx = Context::new(
            Update::text(8, text),
            Arc::new(transport),
            Arc::new(ConversationStore::new()),
        );
        (Arc::new(ctx), handle)
    }

    #[test]
    fn test_string_response_replies() {
        async fn greet(Chat(chat): Chat) -> String {
            format!("hello {chat}")
        }

        let (ctx, handle) = ctx("/greet");
        tokio_test::block_on(into_handler(greet)(ctx)).unwrap();
        assert_eq!(handle.sent_texts(), vec!["hello 8"]);
    }

    #[test]
    fn test_err_response_is_reported() {
        async fn double(Args(args): Args) -> Result<String, std::num::ParseIntError> {
            Ok((args.parse::<i64>()? * 2).to_string())
        }

        let (ok_ctx, ok_handle) = ctx("/double 21");
        tokio_test::block_on(into_handler(double)(ok_ctx)).unwrap();
        assert_eq!(ok_handle.sent_texts(), vec!["42"]);

        let (bad_ctx, bad_handle) = ctx("/double x");
        let err = tokio_test::block_on(into_handler(double)(bad_ctx)).unwrap_err();
        assert!(err.is::<HandlerError>());
        assert!(bad_handle.sent().is_empty());
    }

    #[test]
    fn test_failed_send_is_reported() {
        let (ctx, handle) = ctx("/hi");
        handle.fail_sends(true);
        assert!(tokio_test::block_on(static_reply("hi")(ctx)).is_err());
    }

    #[test]
    fn test_none_response_is_silent() {
        async fn maybe() -> Option<String> {
            None
        }

        let (ctx, handle) = ctx("/maybe");
        tokio_test::block_on(into_handler(maybe)(ctx)).unwrap();
        assert!(handle.sent().is_empty());
    }
}
