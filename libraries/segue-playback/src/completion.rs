//! Completion handles for player operations
//!
//! Player operations are issued synchronously but finish later, when the
//! backend reports the resulting status. A [`Completion`] is the future the
//! caller holds in the meantime. It resolves with
//! [`PlaybackError::Detached`] if the player is torn down first.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{PlaybackError, Result};
use crate::types::PlayerStatus;

/// Future resolved by a player's state machine
#[derive(Debug)]
#[must_use = "completions do nothing unless awaited or polled"]
pub struct Completion<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

/// Completion resolving with the status that satisfied the wait
pub type StatusWaiter = Completion<PlayerStatus>;

/// Sending side kept by the state machine
pub(crate) type Resolver<T> = oneshot::Sender<Result<T>>;

impl<T> Completion<T> {
    /// Create a pending completion and its resolver
    pub(crate) fn pending() -> (Resolver<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    /// Completion that is already resolved with `value`
    pub fn ready(value: T) -> Self {
        let (sender, completion) = Self::pending();
        // The receiver is alive, so the send cannot fail
        let _ = sender.send(Ok(value));
        completion
    }

    /// Completion that is already rejected with `error`
    pub fn failed(error: PlaybackError) -> Self {
        let (sender, completion) = Self::pending();
        let _ = sender.send(Err(error));
        completion
    }

    /// Take the result if it has arrived, without waiting
    pub fn try_take(&mut self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(PlaybackError::Detached)),
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(PlaybackError::Detached)))
    }
}
