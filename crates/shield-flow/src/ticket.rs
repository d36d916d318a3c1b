//! # In-Flight Tickets
//!
//! Every asynchronous operation the engine starts is identified by a
//! [`Ticket`]. The engine keeps at most one outstanding ticket per slot and
//! only applies a completion whose ticket is still the outstanding one.
//!
//! ```text
//! begin_advance()  ──► slot.issue()  ──► Ticket #7 ──► caller awaits gateway
//!                                                             │
//! go_back()        ──► slot.abandon() (Ticket #7 now stale)   │
//!                                                             ▼
//! complete_plan_fetch(#7, plans) ──► slot.settle(#7) = false ──► dropped
//! ```
//!
//! This gives both guarantees the flows need: duplicate triggers are
//! refused while a ticket is out, and late responses cannot land on a state
//! that has moved on.

use tracing::debug;

/// What a ticket was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchPlans,
    SubmitPolicy,
    LoadPolicies,
    SearchPolicies,
    LoadOutlets,
    SubmitClaim,
}

/// Handle for one in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    id: u64,
    operation: Operation,
}

impl Ticket {
    pub fn operation(&self) -> Operation {
        self.operation
    }
}

/// Holds the single outstanding ticket for one region of a flow.
#[derive(Debug, Default)]
pub struct TicketSlot {
    next_id: u64,
    current: Option<Ticket>,
}

impl TicketSlot {
    /// Issues a ticket, or `None` if one is already outstanding.
    pub fn issue(&mut self, operation: Operation) -> Option<Ticket> {
        if self.current.is_some() {
            return None;
        }
        self.next_id += 1;
        let ticket = Ticket {
            id: self.next_id,
            operation,
        };
        self.current = Some(ticket);
        Some(ticket)
    }

    /// Consumes `ticket` if it is the outstanding one.
    ///
    /// Returns false for a stale ticket; the slot is left untouched.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.current == Some(ticket) {
            self.current = None;
            true
        } else {
            debug!(?ticket, current = ?self.current, "Dropping stale completion");
            false
        }
    }

    /// Forgets the outstanding ticket; its completion will be dropped.
    pub fn abandon(&mut self) -> Option<Ticket> {
        self.current.take()
    }

    pub fn is_pending(&self) -> bool {
        self.current.is_some()
    }
}
