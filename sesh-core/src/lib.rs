//! Core components for `sesh` and related crates.
//!
//! This crate carries the stable wire contract shared by every `sesh`
//! backend: the signed, fixed-format [`SessionId`], the HMAC [`signer`], and
//! the sealed [`store`] traits (`Cache` and `Datastore`) that a storage
//! backend implements.

#[macro_use]
mod macros;

#[doc(inline)]
pub use identifier::SessionId;
#[doc(inline)]
pub use store::{Cache, Datastore};

pub mod identifier;
pub mod signer;
pub mod store;
pub mod time;
pub mod util;
