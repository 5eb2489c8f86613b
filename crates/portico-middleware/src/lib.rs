//! # Portico Middleware
//!
//! Bundled middleware handlers for the Portico framework.
//!
//! Each function here builds a [`Handler`](portico_core::Handler) ready
//! to register with `App::use_handler`. They are ordinary chain members:
//! they wrap the rest of the chain by calling `next` and observing what
//! it did.
//!
//! ## Example
//!
//! ```
//! let access_log = portico_middleware::logger();
//! let panic_guard = portico_middleware::recovery();
//! // register both with `App::use_handler`, logger first
//! ```

#![doc(html_root_url = "https://docs.rs/portico-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod logger;
pub mod recovery;

pub use logger::logger;
pub use recovery::recovery;
