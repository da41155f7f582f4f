//! Process-wide adaptor instance.
//!
//! A widget frame talks to exactly one host, so the adaptor is created once
//! on first use and shared. [`reset`] tears it down synchronously (pending
//! requests fail, timers stop, listeners are dropped) so the next
//! [`connect`] starts clean.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::adaptor::{Adaptor, HostEnvironment};
use crate::config::Config;
use crate::{Result, lock};

static SHARED: Lazy<Mutex<Option<Arc<Adaptor>>>> = Lazy::new(|| Mutex::new(None));

/// Return the shared adaptor, creating it from `config` and `env` if none
/// exists yet. `env` is ignored when an instance is already live.
pub async fn connect(config: &Config, env: HostEnvironment) -> Result<Arc<Adaptor>> {
    if let Some(existing) = current() {
        return Ok(existing);
    }

    let adaptor = Arc::new(Adaptor::connect(config, env).await?);

    let mut shared = lock(&SHARED);
    if let Some(existing) = shared.as_ref() {
        // Another caller finished connecting first.
        adaptor.shutdown();
        return Ok(Arc::clone(existing));
    }
    *shared = Some(Arc::clone(&adaptor));
    Ok(adaptor)
}

/// The shared adaptor, if one has been created.
pub fn current() -> Option<Arc<Adaptor>> {
    lock(&SHARED).clone()
}

/// Tear down and forget the shared adaptor.
pub fn reset() {
    let adaptor = lock(&SHARED).take();
    if let Some(adaptor) = adaptor {
        adaptor.shutdown();
    }
}
