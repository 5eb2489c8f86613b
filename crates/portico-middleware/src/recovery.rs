//! Panic recovery middleware.

use portico_core::{Context, ErrorHandler, Handler, HandlerResult, PorticoError, ResponseWriter};
use std::panic::{self, AssertUnwindSafe};

/// Builds a handler that catches panics from the rest of the chain.
///
/// A panic is converted into an internal error and routed through the
/// bound [`ErrorHandler`], so one misbehaving handler cannot take the
/// whole dispatch down. Place it early, after [`logger`] if both are
/// used, so it covers as much of the chain as possible.
///
/// [`logger`]: crate::logger
#[must_use]
pub fn recovery() -> Handler {
    Handler::new(
        |resp: &mut ResponseWriter, ctx: &mut Context| -> HandlerResult {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| ctx.next(resp)));

            match outcome {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        panic = %message,
                        "handler panicked"
                    );

                    let error = PorticoError::internal(format!("handler panicked: {message}"));
                    if let Ok(handler) = ctx.injector().get::<ErrorHandler>() {
                        handler.call(resp, &error);
                    } else {
                        resp.write_status(http::StatusCode::INTERNAL_SERVER_ERROR);
                    }
                    Ok(())
                }
            }
        },
    )
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unknown panic payload")
    }
}
