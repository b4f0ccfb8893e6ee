//! Receiver flow: drive the core [`Receiver`] against a relay.

use std::collections::VecDeque;

use sealdrop_core::{
    FetchOutcome, Receiver, ReceiverAction, ReceiverEvent, ReceiverState, RevealError, SecretId,
    ShareLink,
};

use crate::{error::ClientError, relay::RelayClient};

/// Result of one [`RevealSession::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Plaintext recovered; the relay no longer holds it
    Revealed(String),
    /// Link needs a PIN before anything is fetched
    PinRequired,
    /// Relay has no record: already viewed or expired
    NotFound,
    /// Reveal failed. Submit again only if `is_retryable()`.
    Failed(RevealError),
}

/// One share link being revealed.
///
/// Fetches from the relay at most once. After a wrong PIN the ciphertext
/// stays cached in this session, so later submissions decrypt locally.
/// Dropping the session drops the cache; the secret is then gone for good.
pub struct RevealSession<R> {
    relay: R,
    receiver: Receiver,
}

impl<R: RelayClient> RevealSession<R> {
    /// Session for an already parsed link.
    pub fn new(relay: R, link: ShareLink) -> Self {
        Self { relay, receiver: Receiver::from_link(link) }
    }

    /// Session for a link as pasted by the user.
    ///
    /// # Errors
    ///
    /// - `Link` if the text is not a share link with id and key fragment
    pub fn open(relay: R, link: &str) -> Result<Self, ClientError> {
        Ok(Self::new(relay, ShareLink::parse(link)?))
    }

    /// Returns true if a PIN must accompany [`submit`](Self::submit).
    pub fn requires_pin(&self) -> bool {
        self.receiver.requires_pin()
    }

    /// Secret being revealed.
    pub fn id(&self) -> SecretId {
        self.receiver.id()
    }

    /// Underlying receiver state.
    pub fn state(&self) -> &ReceiverState {
        self.receiver.state()
    }

    /// PIN submissions that reached decryption.
    pub fn pin_attempts(&self) -> u32 {
        self.receiver.pin_attempts()
    }

    /// Confirm the reveal, with a PIN for protected links.
    ///
    /// # Errors
    ///
    /// - `Receiver` if the session already finished
    /// - `Task` if the decrypt task was cancelled; the session keeps the
    ///   fetched ciphertext and can be submitted again
    pub async fn submit(&mut self, pin: Option<&str>) -> Result<RevealOutcome, ClientError> {
        let mut pending: VecDeque<ReceiverAction> = self
            .receiver
            .handle(ReceiverEvent::Submit { pin: pin.map(str::to_owned) })?
            .into();
        let mut outcome = RevealOutcome::PinRequired;

        while let Some(action) = pending.pop_front() {
            match action {
                ReceiverAction::Fetch { id } => {
                    let fetched = self.fetch(id).await;
                    pending.extend(self.receiver.handle(ReceiverEvent::FetchCompleted(fetched))?);
                },
                ReceiverAction::Decrypt(job) => {
                    let result = match tokio::task::spawn_blocking(move || job.run()).await {
                        Ok(result) => result,
                        Err(err) => {
                            // Ciphertext stays cached; the next submit decrypts again
                            self.receiver.handle(ReceiverEvent::DecryptAborted)?;
                            return Err(err.into());
                        },
                    };
                    pending.extend(self.receiver.handle(ReceiverEvent::DecryptCompleted(result))?);
                },
                ReceiverAction::Reveal(text) => outcome = RevealOutcome::Revealed(text),
                ReceiverAction::ReportNotFound => outcome = RevealOutcome::NotFound,
                ReceiverAction::ReportFailure(reason) => outcome = RevealOutcome::Failed(reason),
                ReceiverAction::PromptPin => {},
            }
        }

        Ok(outcome)
    }

    async fn fetch(&self, id: SecretId) -> FetchOutcome {
        match self.relay.fetch_secret(id).await {
            Ok(Some(secret)) => FetchOutcome::Found(secret),
            Ok(None) => FetchOutcome::NotFound,
            Err(err) => {
                tracing::warn!(%err, "secret fetch failed");
                FetchOutcome::Failed(err.to_string())
            },
        }
    }
}
