//! Listener callables.
//!
//! A listener is either `Async` (awaited on the dispatch task) or `Blocking`
//! (moved onto tokio's bounded blocking pool). The tag is chosen when the
//! listener is built, so dispatch never has to inspect the callable.

use std::any::type_name;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;

/// Error type listeners may return.
pub type ListenerError = Box<dyn StdError + Send + Sync>;
pub type ListenerResult = std::result::Result<(), ListenerError>;

type AsyncFn<M> = dyn Fn(M) -> BoxFuture<'static, ListenerResult> + Send + Sync;
type BlockingFn<M> = dyn Fn(M) -> ListenerResult + Send + Sync;

pub enum ListenerBody<M> {
    Async(Arc<AsyncFn<M>>),
    Blocking(Arc<BlockingFn<M>>),
}

impl<M> Clone for ListenerBody<M> {
    fn clone(&self) -> Self {
        match self {
            ListenerBody::Async(f) => ListenerBody::Async(Arc::clone(f)),
            ListenerBody::Blocking(f) => ListenerBody::Blocking(Arc::clone(f)),
        }
    }
}

/// Captured failure of one listener invocation.
#[derive(Debug, Clone, Error)]
#[error("listener `{listener}` failed: {error}")]
pub struct ListenerFailure {
    pub listener: Arc<str>,
    pub error: String,
}

pub struct Listener<M> {
    name: Arc<str>,
    body: ListenerBody<M>,
}

impl<M> Clone for Listener<M> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            body: self.body.clone(),
        }
    }
}

impl<M: Send + 'static> fmt::Debug for Listener<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("blocking", &self.is_blocking())
            .finish()
    }
}

impl<M: Send + 'static> Listener<M> {
    /// Wrap an async callable. The name defaults to the callable's type name.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        Self {
            name: type_name::<F>().into(),
            body: ListenerBody::Async(Arc::new(move |msg| f(msg).boxed())),
        }
    }

    /// Wrap a synchronous callable; it runs on the blocking pool.
    pub fn from_blocking<F>(f: F) -> Self
    where
        F: Fn(M) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            name: type_name::<F>().into(),
            body: ListenerBody::Blocking(Arc::new(f)),
        }
    }

    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.body, ListenerBody::Blocking(_))
    }

    /// Run once with `msg`. Errors and panics both come back as failures.
    pub async fn invoke(&self, msg: M) -> Result<(), ListenerFailure> {
        let outcome = match &self.body {
            ListenerBody::Async(f) => {
                let f = Arc::clone(f);
                AssertUnwindSafe(async move { f(msg).await })
                    .catch_unwind()
                    .await
                    .map_err(|p| format!("panicked: {}", panic_text(p.as_ref())))
            }
            ListenerBody::Blocking(f) => {
                let f = Arc::clone(f);
                let name = Arc::clone(&self.name);
                tokio::task::spawn_blocking(move || {
                    let started = Instant::now();
                    let res = f(msg);
                    tracing::trace!(
                        listener = %name,
                        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                        "blocking listener finished"
                    );
                    res
                })
                .await
                .map_err(|e| match e.try_into_panic() {
                    Ok(p) => format!("panicked: {}", panic_text(p.as_ref())),
                    Err(e) => format!("worker failed: {e}"),
                })
            }
        };

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(self.failure(e.to_string())),
            Err(text) => Err(self.failure(text)),
        }
    }

    fn failure(&self, error: String) -> ListenerFailure {
        ListenerFailure {
            listener: Arc::clone(&self.name),
            error,
        }
    }
}

fn panic_text(p: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
