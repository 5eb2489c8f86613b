//! Request logging middleware.

use portico_core::{Context, Handler, HandlerResult, ResponseWriter};
use std::time::Instant;

/// Builds a handler that logs each request around the rest of the chain.
///
/// Emits one event when the request enters and one when the chain behind
/// it finishes, with the final status and elapsed time. Place it first so
/// it observes every other handler.
#[must_use]
pub fn logger() -> Handler {
    Handler::new(
        |resp: &mut ResponseWriter, ctx: &mut Context| -> HandlerResult {
            let started = Instant::now();
            let method = ctx.request().method().clone();
            let path = ctx.request().path().to_owned();
            let request_id = ctx.request_id();

            tracing::info!(%method, %path, request_id = %request_id, "request started");

            let result = ctx.next(resp);
            let elapsed = started.elapsed();

            match &result {
                Ok(()) => tracing::info!(
                    %method,
                    %path,
                    request_id = %request_id,
                    status = %resp.status(),
                    ?elapsed,
                    "request completed"
                ),
                Err(error) => tracing::warn!(
                    %method,
                    %path,
                    request_id = %request_id,
                    %error,
                    ?elapsed,
                    "request failed"
                ),
            }

            result
        },
    )
}
