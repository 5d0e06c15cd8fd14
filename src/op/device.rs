//! Device contexts, pooled per place.
//!
//! A device context is the narrow handle kernels submit work through. The
//! host context is synchronous; accelerator contexts model a stream whose
//! id is stable for the lifetime of the pool entry. Work submitted on one
//! context is ordered; cross-stream ordering is the caller's business.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use crate::tensor::Place;

/// The stream/queue handle for one place.
pub struct DeviceContext {
    place: Place,
    stream: u64,
}

impl DeviceContext {
    pub fn place(&self) -> Place {
        self.place
    }

    pub fn stream_id(&self) -> u64 {
        self.stream
    }

    /// Block until all work submitted on this context has finished. The
    /// host context has nothing in flight.
    pub fn wait(&self) {}
}

static POOL: Lazy<Mutex<HashMap<Place, Arc<DeviceContext>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_STREAM: AtomicU64 = AtomicU64::new(1);

/// Process-wide pool handing out one context per place.
pub struct DeviceContextPool;

impl DeviceContextPool {
    pub fn get(place: Place) -> Arc<DeviceContext> {
        let mut pool = POOL
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(pool.entry(place).or_insert_with(|| {
            Arc::new(DeviceContext {
                place,
                stream: NEXT_STREAM.fetch_add(1, Ordering::Relaxed),
            })
        }))
    }
}
