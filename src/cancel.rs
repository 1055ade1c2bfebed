//! Cooperative job cancellation.
//!
//! The coordinator holds a [`CancellationRegistry`] mapping job ids to
//! [`CancellationToken`]s. A worker creates a [`JobCancelListener`] when a
//! ProcessJob call begins; the listener registers a fresh token under the
//! job id and removes it again when dropped. The coordinator cancels by job id
//! from any thread and the worker polls its token.
//!
//! Polling is a single atomic load. The registry lock is only taken to
//! register, deregister, or cancel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::diagnostics;

/// One-shot cancellation flag. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag. It is never cleared.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn same_as(&self, other: &CancellationToken) -> bool {
        Arc::ptr_eq(&self.flag, &other.flag)
    }
}

type TokenMap = HashMap<u64, CancellationToken>;

/// Job id to token map. Clones share the map.
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    tokens: Arc<Mutex<TokenMap>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TokenMap> {
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start listening for cancellation of `job_id`.
    ///
    /// A listener already registered for the same id is displaced; it keeps
    /// its own token but can no longer be reached through the registry.
    pub fn listen(&self, job_id: u64) -> JobCancelListener {
        let token = CancellationToken::new();
        if self.lock().insert(job_id, token.clone()).is_some() {
            diagnostics::warning(format!("Job {job_id} already had a cancel listener; replacing it"));
        }
        JobCancelListener { registry: self.clone(), job_id, token }
    }

    /// Cancel the job with `job_id`. Returns `false` if nothing is listening.
    pub fn cancel(&self, job_id: u64) -> bool {
        match self.lock().get(&job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_listening(&self, job_id: u64) -> bool {
        self.lock().contains_key(&job_id)
    }

    /// Cancel every registered job.
    pub fn cancel_all(&self) -> usize {
        let tokens = self.lock();
        for token in tokens.values() {
            token.cancel();
        }
        tokens.len()
    }
}

/// Scoped registration of a job's cancellation token.
#[derive(Debug)]
pub struct JobCancelListener {
    registry: CancellationRegistry,
    job_id: u64,
    token: CancellationToken,
}

impl JobCancelListener {
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for JobCancelListener {
    fn drop(&mut self) {
        let mut tokens = self.registry.lock();
        // only remove our own token, not one that displaced it
        if tokens.get(&self.job_id).is_some_and(|t| t.same_as(&self.token)) {
            tokens.remove(&self.job_id);
        }
    }
}
