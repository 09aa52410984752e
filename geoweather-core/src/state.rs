use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::model::WeatherSnapshot;

/// What a presentation layer should show for the latest resolution.
///
/// Every resolution publishes `Loading` first and finishes with exactly one
/// of `Data` or `Error`. Each value replaces the previous one.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Data(WeatherSnapshot),
    Error(String),
}

impl ViewState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ViewState::Loading)
    }
}

/// Identifies one resolution; only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

/// Single-writer state slot shared with any number of watchers.
///
/// The slot starts empty. Ticket checks happen under the channel's write
/// lock, so a superseded resolution can never overwrite a newer one.
#[derive(Debug)]
pub(crate) struct StateChannel {
    tx: watch::Sender<Option<ViewState>>,
    generation: AtomicU64,
}

impl StateChannel {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, generation: AtomicU64::new(0) }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<ViewState>> {
        self.tx.subscribe()
    }

    pub(crate) fn current(&self) -> Option<ViewState> {
        self.tx.borrow().clone()
    }

    /// Supersede every earlier ticket and publish `Loading`.
    pub(crate) fn begin(&self) -> Ticket {
        let mut ticket = Ticket(0);
        self.tx.send_modify(|slot| {
            ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            *slot = Some(ViewState::Loading);
        });
        ticket
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Publish `state` if `ticket` is still the newest. Returns whether it was published.
    pub(crate) fn publish(&self, ticket: Ticket, state: ViewState) -> bool {
        self.tx.send_if_modified(|slot| {
            if !self.is_current(ticket) {
                return false;
            }
            *slot = Some(state);
            true
        })
    }
}
