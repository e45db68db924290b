use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::DocumentError;

/// A pending full-document reconstruction with a single completion event.
///
/// Dropping the future cancels interest in the outcome; dropping the
/// matching [`ReconstructionHandle`] without completing it resolves the
/// future with [`DocumentError::Abandoned`].
#[must_use = "a reconstruction does nothing unless awaited"]
pub struct Reconstruction {
    rx: oneshot::Receiver<Result<(), DocumentError>>,
}

/// Completion side of a [`Reconstruction`], held by the document engine.
pub struct ReconstructionHandle {
    tx: oneshot::Sender<Result<(), DocumentError>>,
}

impl Reconstruction {
    /// Create a linked handle/future pair.
    pub fn channel() -> (ReconstructionHandle, Reconstruction) {
        let (tx, rx) = oneshot::channel();
        (ReconstructionHandle { tx }, Reconstruction { rx })
    }

    /// A reconstruction that has already finished with `result`.
    pub fn ready(result: Result<(), DocumentError>) -> Self {
        let (handle, reconstruction) = Self::channel();
        handle.finish(result);
        reconstruction
    }
}

impl Future for Reconstruction {
    type Output = Result<(), DocumentError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DocumentError::Abandoned)))
    }
}

impl ReconstructionHandle {
    /// Signal that the document is rebuilt and ready.
    pub fn complete(self) {
        self.finish(Ok(()));
    }

    /// Signal that reconstruction failed; the document state is unchanged.
    pub fn fail(self, error: DocumentError) {
        self.finish(Err(error));
    }

    /// Whether the awaiting side has gone away.
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    fn finish(self, result: Result<(), DocumentError>) {
        // Receiver may be gone already; nothing is waiting then.
        let _ = self.tx.send(result);
    }
}
