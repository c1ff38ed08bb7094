use std::{future::Future, pin::Pin};

/// Convenience type for a Future implementing the push loop.
pub type ExporterFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

mod push;
pub(crate) use self::push::new_push_loop;
pub use self::push::{InfluxReporter, PushError};
