//! In-crate fakes for unit tests

use crate::error::{PumpError, Result};
use crate::feed::PriceFeed;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Feed that replays queued responses and counts calls
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceFeed for ScriptedFeed {
    async fn fetch_latest(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .map_err(|_| PumpError::remote_fetch("poisoned"))?
            .pop_front()
            .unwrap_or_else(|| Err(PumpError::remote_fetch("script exhausted")))
    }
}
