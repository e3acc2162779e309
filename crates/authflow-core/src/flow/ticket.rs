//! Tickets matching provider results to the operation and state generation that started them.

use super::{FlowState, IntentKind};

/// Opaque id for one submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(u64);

/// Identifies an in-flight operation and the state generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTicket {
    pub id: OperationId,
    pub intent: IntentKind,
    pub origin: FlowState,
    generation: u64,
}

/// What became of a ticket handed back to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settled {
    /// The ticket was active and the state has not changed since it was issued.
    Current,
    /// The ticket was active but the flow moved on; its result must be ignored.
    Stale,
    /// The ticket is not the active one (already settled or never issued here).
    Unknown,
}

/// Single-slot tracker: at most one operation is in flight.
#[derive(Debug, Default)]
pub(crate) struct OperationTracker {
    next: u64,
    generation: u64,
    active: Option<OperationTicket>,
}

impl OperationTracker {
    pub(crate) fn begin(&mut self, origin: FlowState, intent: IntentKind) -> OperationTicket {
        let ticket = OperationTicket {
            id: OperationId(self.next),
            intent,
            origin,
            generation: self.generation,
        };
        self.next += 1;
        self.active = Some(ticket);
        ticket
    }

    /// Record a state change. Tickets issued before this call become stale.
    pub(crate) fn advance(&mut self) {
        self.generation += 1;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.active.is_some()
    }

    pub(crate) fn active(&self) -> Option<&OperationTicket> {
        self.active.as_ref()
    }

    pub(crate) fn settle(&mut self, ticket: &OperationTicket) -> Settled {
        match self.active {
            Some(active) if active.id == ticket.id => {
                self.active = None;
                if ticket.generation == self.generation {
                    Settled::Current
                } else {
                    Settled::Stale
                }
            }
            _ => Settled::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_current_ticket() {
        let mut tracker = OperationTracker::default();
        let ticket = tracker.begin(FlowState::LoggedOut, IntentKind::SubmitCredentials);
        assert!(tracker.is_pending());
        assert_eq!(tracker.settle(&ticket), Settled::Current);
        assert!(!tracker.is_pending());
    }

    #[test]
    fn advance_makes_ticket_stale() {
        let mut tracker = OperationTracker::default();
        let ticket = tracker.begin(FlowState::LoggedOut, IntentKind::SubmitCredentials);
        tracker.advance();
        assert_eq!(tracker.settle(&ticket), Settled::Stale);
        assert!(!tracker.is_pending());
    }

    #[test]
    fn settling_twice_is_unknown() {
        let mut tracker = OperationTracker::default();
        let ticket = tracker.begin(FlowState::Registering, IntentKind::SubmitRegistration);
        tracker.settle(&ticket);
        assert_eq!(tracker.settle(&ticket), Settled::Unknown);
    }

    #[test]
    fn ids_are_unique() {
        let mut tracker = OperationTracker::default();
        let first = tracker.begin(FlowState::LoggedOut, IntentKind::SubmitCredentials);
        tracker.settle(&first);
        let second = tracker.begin(FlowState::LoggedOut, IntentKind::SubmitCredentials);
        assert_ne!(first.id, second.id);
        assert_eq!(tracker.settle(&first), Settled::Unknown);
        assert_eq!(tracker.active(), Some(&second));
    }
}
