//! Recoverable boundary around single adapter calls.
//!
//! Engines signal broken internal state by panicking. Every adapter call made
//! by a runner goes through [`guard`], which turns such a panic into an
//! [`InternalFault`] owned by the one case or iteration that triggered it.

use crate::error::{InternalFault, Operation};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, converting a panic into an [`InternalFault`] for `operation`.
///
/// The adapter is not touched again by the caller for the faulted case, so
/// asserting unwind safety is sound: at worst the next `load_schema`
/// replaces whatever state the panic left behind.
pub fn guard<T>(operation: Operation, f: impl FnOnce() -> T) -> Result<T, InternalFault> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| InternalFault {
        operation,
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
