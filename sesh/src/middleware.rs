//! The Tower layer/service pair that wires [`Session`] into a request
//! pipeline (spec §4.1, §4.6).
//!
//! Grounded on the teacher's `SessionLayer`/`SessionManager` pair: config
//! and backends live behind `Arc`s on the layer so cloning it (Tower clones
//! layers freely when building a `ServiceBuilder`) is cheap, and the
//! service's `call` does the cookie parse before the inner service runs and
//! the flush/emit after it returns.

use std::{
    fmt,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{future::BoxFuture, FutureExt};
use http::{header, HeaderValue, Request, Response};
use sesh_core::store::{Cache, Datastore};
use tower::{Layer, Service};

use crate::{config::Config, session::Session};

/// A [`Layer`] that makes a [`Session`] available via [`http::Extensions`]
/// to every request the wrapped service handles.
pub struct SessionLayer {
    cache: Arc<dyn Cache>,
    datastore: Option<Arc<dyn Datastore>>,
    config: Arc<Config>,
}

impl SessionLayer {
    /// Builds a layer backed by `cache` and configured by `config`. Without
    /// a datastore, sessions whose payload doesn't fit in a cookie simply
    /// live in the cache (subject to its own eviction policy) — set one
    /// with [`SessionLayer::datastore`] for durability across cache
    /// restarts.
    pub fn new(cache: Arc<dyn Cache>, config: Config) -> SessionLayer {
        SessionLayer {
            cache,
            datastore: None,
            config: Arc::new(config),
        }
    }

    /// Attaches a durable datastore tier.
    pub fn datastore(mut self, datastore: Arc<dyn Datastore>) -> SessionLayer {
        self.datastore = Some(datastore);
        self
    }
}

impl Clone for SessionLayer {
    fn clone(&self) -> Self {
        SessionLayer {
            cache: Arc::clone(&self.cache),
            datastore: self.datastore.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl fmt::Debug for SessionLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLayer").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionManager<S>;

    fn layer(&self, inner: S) -> SessionManager<S> {
        SessionManager {
            inner,
            layer: self.clone(),
        }
    }
}

/// The [`Service`] produced by [`SessionLayer`].
pub struct SessionManager<S> {
    inner: S,
    layer: SessionLayer,
}

impl<S: Clone> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        SessionManager {
            inner: self.inner.clone(),
            layer: self.layer.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("inner", &self.inner)
            .field("layer", &self.layer)
            .finish()
    }
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for SessionManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Send,
    S::Future: Send + 'static,
    ResBody: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let session = Session::from_headers(
            req.headers(),
            Arc::clone(&self.layer.cache),
            self.layer.datastore.clone(),
            Arc::clone(&self.layer.config),
        );
        session.clone().insert_into(req.extensions_mut());

        let fut = self.inner.call(req);

        async move {
            let mut response = fut.await?;

            session.flush(false).await;
            for line in session.emit_cookie_headers() {
                append_set_cookie(response.headers_mut(), line);
            }

            Ok(response)
        }
        .boxed()
    }
}

fn append_set_cookie(headers: &mut http::HeaderMap, line: String) {
    match HeaderValue::from_str(&line) {
        Ok(value) => headers.append(header::SET_COOKIE, value),
        Err(_err) => {
            error!(err = %_err, "built a Set-Cookie header value that isn't a valid header value, dropping it");
        }
    };
}

#[cfg(test)]
mod test {
    use std::convert::Infallible;

    use http::{Request, Response};
    use tower::{ServiceBuilder, ServiceExt};

    use crate::{config::Key, store::{MemoryCache, MemoryDatastore}};

    use super::*;

    fn layer() -> SessionLayer {
        let config = Config::new(Key::try_from(vec![9u8; 32]).unwrap());
        SessionLayer::new(Arc::new(MemoryCache::new()), config)
            .datastore(Arc::new(MemoryDatastore::new()))
    }

    #[tokio::test]
    async fn emits_a_set_cookie_header_after_a_write() {
        let svc = ServiceBuilder::new().layer(layer()).service_fn(|req: Request<()>| async move {
            let session = Session::extract(req.extensions()).unwrap();
            session.set_item("x", 1).await;
            Ok::<_, Infallible>(Response::new(()))
        });

        let response = svc.oneshot(Request::new(())).await.unwrap();
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn untouched_session_emits_no_cookie() {
        let svc = ServiceBuilder::new().layer(layer()).service_fn(|req: Request<()>| async move {
            let _session = Session::extract(req.extensions()).unwrap();
            Ok::<_, Infallible>(Response::new(()))
        });

        let response = svc.oneshot(Request::new(())).await.unwrap();
        assert!(!response.headers().contains_key(header::SET_COOKIE));
    }
}
