//! Run with
//!
//! ```not_rust
//! cargo run -p demo-axum
//! ```

use std::sync::Arc;

use axum::{routing::get, Router};
use sesh::{config::Config, config::Key, store::MemoryCache, Session, SessionLayer, Value};
use tower::ServiceBuilder;

#[tokio::main]
async fn main() {
    let key = Key::try_from(b"demo-axum-does-not-use-a-real-secret-key!!".as_slice())
        .expect("key must be at least 32 bytes");
    let cache = MemoryCache::new();
    let config = Config::new(key).no_datastore(true);
    let middleware = ServiceBuilder::new().layer(SessionLayer::new(Arc::new(cache), config));

    let app = Router::new().route("/", get(handler)).layer(middleware);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .unwrap();
    println!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn handler(session: Session) -> String {
    if !session.is_active() {
        session.start(None, false);
    }

    let views = match session.get("views").await {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        _ => 0,
    } + 1;
    session.set_item("views", views).await;

    format!("you've visited this page {views} time(s)\n")
}
