#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! A Tower middleware for signed, tiered sessions.
//!
//! Small sessions ride entirely in a signed cookie; sessions too large for
//! a cookie overflow to a [`Cache`](sesh_core::Cache) and, if configured, a
//! durable [`Datastore`](sesh_core::Datastore). See [`Session`] for the
//! per-request handle and [`SessionLayer`] for wiring it into a [`tower`]
//! service stack.

#[macro_use]
mod macros;

pub mod codec;
pub mod config;
pub mod cookie;
pub mod middleware;
pub mod reaper;
pub mod session;
#[cfg(feature = "memory-store")]
pub mod store;
mod storage_tier;
pub mod value;

#[doc(inline)]
pub use config::{Config, ConfigError, Key, SameSite};
#[doc(inline)]
pub use middleware::{SessionLayer, SessionManager};
#[doc(inline)]
pub use session::{KeyMissing, Session};
#[doc(inline)]
pub use value::Value;
