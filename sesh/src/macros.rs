#![allow(unused_macros)]

macro_rules! error {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
    };
}

macro_rules! info {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
    };
}

#[allow(unused_macros)]
macro_rules! define_rejection {
    (
        #[status = $status:ident]
        #[body = $body:expr]
        $(#[$m:meta])*
        pub struct $name:ident;
    ) => {
        #[cfg(feature = "axum")]
        $(#[$m])*
        #[derive(::core::fmt::Debug, ::core::default::Default)]
        #[non_exhaustive]
        pub struct $name;

        #[cfg(feature = "axum")]
        impl $name {
            pub fn status(&self) -> ::http::StatusCode {
                ::http::StatusCode::$status
            }
        }

        #[cfg(feature = "axum")]
        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str($body)
            }
        }

        #[cfg(feature = "axum")]
        impl ::std::error::Error for $name {}

        #[cfg(feature = "axum")]
        impl ::axum::response::IntoResponse for $name {
            fn into_response(self) -> ::axum::response::Response {
                (self.status(), $body).into_response()
            }
        }
    };
}
