//! Cancellation and ordering primitives for kernel work.
//!
//! Kernel computations can be expensive, so they are modeled as cancellable
//! units of work even when the current execution is synchronous. Two rules
//! from the concurrency contract live here:
//!
//! - committed mutations for one logical identity complete in issue order,
//!   with at most one in flight at a time ([`OrderGate`]);
//! - preview computations have last-wins semantics: a newer preview cancels
//!   the older one's [`CancellationToken`] before publishing.

use crate::error::{GeomError, Result};
use crate::types::ItemId;
use ahash::AHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one unit of kernel work.
///
/// Cancellation is synchronous from the caller's perspective: once
/// [`cancel`](CancellationToken::cancel) returns, the superseded result will
/// never be published, even if cleanup continues in the background.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with a [`GeomError::Computation`] if cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GeomError::Computation("computation cancelled".into()))
        } else {
            Ok(())
        }
    }
}

/// A per-item sequence ticket for one committed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    item: ItemId,
    seq: u64,
}

impl Ticket {
    /// The logical identity this ticket serializes
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// Position of this mutation in the item's issue order
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

/// Serializes committed mutations per logical identity.
///
/// `issue` hands out the next sequence number for an item and refuses a
/// second in-flight ticket; `complete` asserts tickets finish in issue
/// order. Violations are programming errors, not recoverable conditions.
#[derive(Debug, Default)]
pub struct OrderGate {
    issued: AHashMap<ItemId, u64>,
    completed: AHashMap<ItemId, u64>,
}

impl OrderGate {
    /// Create an empty gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for the next committed mutation of `item`
    pub fn issue(&mut self, item: ItemId) -> Result<Ticket> {
        let issued = self.issued.get(&item).copied().unwrap_or(0);
        let completed = self.completed.get(&item).copied().unwrap_or(0);
        if issued != completed {
            return Err(GeomError::Internal(format!(
                "{item} already has a committed mutation in flight"
            )));
        }
        let seq = issued + 1;
        self.issued.insert(item, seq);
        Ok(Ticket { item, seq })
    }

    /// Mark a ticket's mutation as applied
    pub fn complete(&mut self, ticket: Ticket) -> Result<()> {
        let completed = self.completed.get(&ticket.item).copied().unwrap_or(0);
        if ticket.seq != completed + 1 {
            return Err(GeomError::Internal(format!(
                "{} completed out of order (ticket {}, expected {})",
                ticket.item,
                ticket.seq,
                completed + 1
            )));
        }
        self.completed.insert(ticket.item, ticket.seq);
        Ok(())
    }

    /// Whether a committed mutation is currently in flight for `item`
    pub fn in_flight(&self, item: ItemId) -> bool {
        let issued = self.issued.get(&item).copied().unwrap_or(0);
        let completed = self.completed.get(&item).copied().unwrap_or(0);
        issued != completed
    }

    /// Drop all bookkeeping for a retired logical identity
    pub fn retire(&mut self, item: ItemId) {
        self.issued.remove(&item);
        self.completed.remove(&item);
    }
}
