//! Conformance test suite for [`Cache`] and [`Datastore`] implementations.
//!
//! [`Cache`]: sesh_core::store::Cache
//! [`Datastore`]: sesh_core::store::Datastore
//!
//! # Usage
//!
//! Add `sesh-test` to `dev-dependencies`, then invoke [`cache_test_suite!`]
//! and/or [`datastore_test_suite!`] with a `store:` expression that builds a
//! fresh instance of your type. The expression is re-evaluated once per
//! generated test, so each test runs against its own, freshly constructed
//! store:
//!
//! ```no_run
//! use sesh_test::cache_test_suite;
//!
//! cache_test_suite! {
//!     store: MyCache::new(),
//! }
//! ```
//!
//! ## Scope-based resource management
//!
//! Using `guard: <expr>`, you can tie a resource's lifetime to a single
//! generated test. `<expr>` is evaluated before `store:`, and dropped once
//! the test completes (pass or fail). Bind it to a name with
//! `guard: <ident> = <expr>` to refer to it from the `store:` expression,
//! e.g. when the store needs a handle to a container or temp file that must
//! outlive it.
//!
//! ## Test isolation
//!
//! Every test in this suite mints its session ids through
//! [`support::unique_sid`], which salts a fresh [`SessionId`][sid] per call.
//! This keeps tests safe to run concurrently against a single shared backend
//! (e.g. one Redis instance), but two suites that share a backend and a key
//! prefix must still not run at the same time, since nothing here
//! coordinates flushes.
//!
//! [sid]: sesh_core::SessionId

#![warn(missing_debug_implementations)]

pub use suite::cache::*;
pub use suite::datastore::*;

pub mod suite;
pub mod support;

#[doc(hidden)]
pub mod __private {
    pub use paste;
    pub use tokio;
}

/// Generates the `Cache` conformance suite for a store expression.
///
/// See [the crate-level documentation][crate] for the `guard:` syntax.
#[macro_export]
macro_rules! cache_test_suite {
    (guard: $guard_ident:ident = $guard:expr, store: $store:expr $(,)?) => {
        $crate::__cache_test_suite! {
            @(guard: $guard_ident = $guard, store: $store) => {
                get_returns_none_for_missing_key
                set_then_get_round_trips
                set_overwrites_existing_value
                delete_removes_entry
                delete_does_not_error_for_missing_entry
                get_returns_none_after_expiry
                flush_clears_all_entries
            }
        }
    };
    (guard: $guard:expr, store: $store:expr $(,)?) => {
        $crate::cache_test_suite! {
            guard: __guard = $guard,
            store: $store,
        }
    };
    (store: $store:expr $(,)?) => {
        $crate::cache_test_suite! {
            guard: (),
            store: $store,
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __cache_test_suite {
    (
        @(
            guard: $guard_ident:ident = $guard:expr,
            store: $store:expr
        ) => {
            $($test:ident)+
        }
    ) => {
        $(
            #[$crate::__private::tokio::test]
            async fn $test() {
                let $guard_ident = $guard;
                let __store = $store;
                $crate::__private::paste::paste! {
                    $crate::[<test_cache_ $test>](__store).await;
                }
            }
        )+
    };
}

/// Generates the `Datastore` conformance suite for a store expression.
///
/// See [the crate-level documentation][crate] for the `guard:` syntax.
#[macro_export]
macro_rules! datastore_test_suite {
    (guard: $guard_ident:ident = $guard:expr, store: $store:expr $(,)?) => {
        $crate::__datastore_test_suite! {
            @(guard: $guard_ident = $guard, store: $store) => {
                get_returns_none_for_missing_key
                put_then_get_round_trips
                put_overwrites_existing_value
                delete_removes_entry
                delete_does_not_error_for_missing_entry
                range_delete_respects_batch_size
                range_delete_only_below_upper_bound
                range_delete_reports_zero_when_nothing_expired
                range_delete_includes_exact_boundary
            }
        }
    };
    (guard: $guard:expr, store: $store:expr $(,)?) => {
        $crate::datastore_test_suite! {
            guard: __guard = $guard,
            store: $store,
        }
    };
    (store: $store:expr $(,)?) => {
        $crate::datastore_test_suite! {
            guard: (),
            store: $store,
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __datastore_test_suite {
    (
        @(
            guard: $guard_ident:ident = $guard:expr,
            store: $store:expr
        ) => {
            $($test:ident)+
        }
    ) => {
        $(
            #[$crate::__private::tokio::test]
            async fn $test() {
                let $guard_ident = $guard;
                let __store = $store;
                $crate::__private::paste::paste! {
                    $crate::[<test_datastore_ $test>](__store).await;
                }
            }
        )+
    };
}
