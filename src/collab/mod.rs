//! Collaboration invites.
//!
//! The editor only needs to hand an [`Invitation`] to some backend and learn
//! whether it was accepted; [`InMemoryInviteService`] is the local stand-in.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A request to share a project with another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    /// Identifies the shared project. The editor uses the project name.
    pub project_id: String,
    pub inviter: String,
    pub invitee: String,
}

/// Error type for invite delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteError {
    /// The backend refused the invite.
    Rejected(String),
    /// The backend could not be reached.
    Unavailable(String),
}

impl fmt::Display for InviteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteError::Rejected(reason) => write!(f, "invite rejected: {}", reason),
            InviteError::Unavailable(reason) => write!(f, "invite service unavailable: {}", reason),
        }
    }
}

impl std::error::Error for InviteError {}

/// Backend that delivers invitations.
pub trait InviteService: Send + Sync {
    fn send_invite(
        &self,
        invitation: &Invitation,
    ) -> impl Future<Output = Result<(), InviteError>> + Send;
}

/// Records every invitation it accepts. Clones share the same log.
#[derive(Clone, Default)]
pub struct InMemoryInviteService {
    sent: Arc<Mutex<Vec<Invitation>>>,
    failure: Arc<Mutex<Option<InviteError>>>,
}

impl InMemoryInviteService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following invite fail with `error`. `None` restores
    /// normal delivery.
    pub fn fail_with(&self, error: Option<InviteError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    /// Invitations delivered so far, oldest first.
    pub fn sent(&self) -> Vec<Invitation> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl InviteService for InMemoryInviteService {
    async fn send_invite(&self, invitation: &Invitation) -> Result<(), InviteError> {
        let failure = self
            .failure
            .lock()
            .map_err(|_| InviteError::Unavailable("lock poisoned".into()))?
            .clone();
        if let Some(error) = failure {
            return Err(error);
        }
        self.sent
            .lock()
            .map_err(|_| InviteError::Unavailable("lock poisoned".into()))?
            .push(invitation.clone());
        log::debug!(
            "invited {} to {} on behalf of {}",
            invitation.invitee,
            invitation.project_id,
            invitation.inviter
        );
        Ok(())
    }
}
