//! Load outcome delivery

use crate::engine::SoundId;
use crate::error::PoolError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Outcome of a load request
pub type LoadOutcome = Result<SoundId, PoolError>;

/// Sending half held by the pool until the load settles
pub(crate) type LoadSender = oneshot::Sender<LoadOutcome>;

/// Pending result of [`PoolController::load`](crate::pool::PoolController::load)
///
/// Settles exactly once. Await it from async code, or use [`wait`] /
/// [`try_outcome`] from a synchronous host.
///
/// [`wait`]: LoadTicket::wait
/// [`try_outcome`]: LoadTicket::try_outcome
#[derive(Debug)]
#[must_use = "a load outcome is only observable through its ticket"]
pub struct LoadTicket {
    receiver: oneshot::Receiver<LoadOutcome>,
}

impl LoadTicket {
    /// Create an unsettled ticket and the sender that settles it
    pub(crate) fn pending() -> (LoadSender, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    /// Create a ticket that is already settled
    pub(crate) fn settled(outcome: LoadOutcome) -> Self {
        let (sender, ticket) = Self::pending();
        // The receiver is alive, so the send cannot fail
        let _ = sender.send(outcome);
        ticket
    }

    /// Block the current thread until the load settles
    ///
    /// # Panics
    /// Panics when called from within an asynchronous runtime context;
    /// await the ticket there instead.
    pub fn wait(self) -> LoadOutcome {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(PoolError::Abandoned))
    }

    /// Take the outcome if the load has settled
    ///
    /// Returns `None` while the load is still pending. The outcome is handed
    /// out once; later calls report [`PoolError::Abandoned`].
    pub fn try_outcome(&mut self) -> Option<LoadOutcome> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(PoolError::Abandoned)),
        }
    }
}

impl Future for LoadTicket {
    type Output = LoadOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PoolError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_ticket() {
        let mut ticket = LoadTicket::settled(Ok(SoundId(7)));
        assert_eq!(ticket.try_outcome(), Some(Ok(SoundId(7))));
        assert_eq!(ticket.try_outcome(), Some(Err(PoolError::Abandoned)));
    }

    #[test]
    fn test_pending_ticket() {
        let (sender, mut ticket) = LoadTicket::pending();
        assert_eq!(ticket.try_outcome(), None);
        sender.send(Err(PoolError::ResourceNotFound("x".into()))).unwrap();
        assert_eq!(ticket.wait(), Err(PoolError::ResourceNotFound("x".into())));
    }

    #[test]
    fn test_dropped_sender_abandons() {
        let (sender, ticket) = LoadTicket::pending();
        drop(sender);
        assert_eq!(ticket.wait(), Err(PoolError::Abandoned));
    }

    #[tokio::test]
    async fn test_await_ticket() {
        let (sender, ticket) = LoadTicket::pending();
        std::thread::spawn(move || sender.send(Ok(SoundId(2))).unwrap());
        assert_eq!(ticket.await, Ok(SoundId(2)));
    }
}
