//! Receiver-side state machine.
//!
//! Drives one share link from "user opened it" to "secret shown" or a final
//! error. Pure: the driver executes the returned actions (relay fetch,
//! decrypt job, UI update) and feeds results back in as events.
//!
//! # State Machine
//!
//! ```text
//! ┌───────────────┐ Submit ┌──────────┐  Found   ┌────────────┐   Ok   ┌──────────┐
//! │ AwaitingInput │───────>│ Fetching │─────────>│ Decrypting │───────>│ Revealed │
//! └───────────────┘        └──────────┘          └────────────┘        └──────────┘
//!                               │                  │      ↑
//!                      NotFound │       wrong PIN  │      │ Submit (cached ciphertext)
//!                               ↓                  ↓      │
//!                         ┌──────────┐      ┌──────────────────────┐
//!                         │ NotFound │      │ Failed(IncorrectPin) │
//!                         └──────────┘      └──────────────────────┘
//! ```
//!
//! The relay serves a secret exactly once, so the machine never emits a second
//! `Fetch`. After a wrong PIN the fetched ciphertext stays cached here and the
//! next `Submit` goes straight to `Decrypting`. `Revealed`, `NotFound` and any
//! non-PIN failure are terminal.

use sealdrop_crypto::Nonce;

use crate::{
    envelope::SecretEnvelope,
    error::{OpenError, ReceiverError, RevealError},
    id::SecretId,
    link::ShareLink,
};

/// Ciphertext and nonce as returned by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSecret {
    /// Ciphertext with tag
    pub ciphertext: Vec<u8>,
    /// Data nonce
    pub iv: Nonce,
}

/// Result of a relay fetch, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Relay returned the record (and has now deleted it)
    Found(FetchedSecret),
    /// Relay has no record for the id
    NotFound,
    /// Relay unreachable or the response was unusable
    Failed(String),
}

/// Self-contained decryption work item.
///
/// Running it is CPU-bound in PIN mode; async drivers should move it to a
/// blocking pool.
#[derive(Debug, Clone)]
pub struct DecryptJob {
    /// Key material from the fragment
    pub envelope: SecretEnvelope,
    /// Cached ciphertext
    pub ciphertext: Vec<u8>,
    /// Data nonce
    pub iv: Nonce,
    /// Candidate PIN, if any
    pub pin: Option<String>,
}

impl DecryptJob {
    /// Open the envelope.
    pub fn run(&self) -> Result<String, OpenError> {
        self.envelope.open(&self.ciphertext, &self.iv, self.pin.as_deref())
    }
}

/// Inputs to the receiver.
#[derive(Debug, Clone)]
pub enum ReceiverEvent {
    /// User confirmed reveal, optionally with a PIN
    Submit {
        /// Candidate PIN (ignored for links without one)
        pin: Option<String>,
    },
    /// Driver finished the relay fetch
    FetchCompleted(FetchOutcome),
    /// Driver finished a decrypt job
    DecryptCompleted(Result<String, OpenError>),
    /// Decrypt job never produced a result (task cancelled or panicked).
    /// The cached ciphertext is kept and the attempt does not count.
    DecryptAborted,
}

impl ReceiverEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "Submit",
            Self::FetchCompleted(_) => "FetchCompleted",
            Self::DecryptCompleted(_) => "DecryptCompleted",
            Self::DecryptAborted => "DecryptAborted",
        }
    }
}

/// Outputs for the driver to execute.
#[derive(Debug, Clone)]
pub enum ReceiverAction {
    /// Consume the secret at the relay (at most once per receiver)
    Fetch {
        /// Secret to fetch
        id: SecretId,
    },
    /// Run this job and report back with `DecryptCompleted`
    Decrypt(DecryptJob),
    /// Show the plaintext to the user
    Reveal(String),
    /// Tell the user the secret is gone
    ReportNotFound,
    /// Tell the user why the reveal failed
    ReportFailure(RevealError),
    /// Ask the user for a PIN
    PromptPin,
}

/// Receiver state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiverState {
    /// Waiting for the user to confirm (and enter a PIN if needed)
    AwaitingInput,
    /// Fetch in flight
    Fetching,
    /// Relay had no record
    NotFound,
    /// Decrypt job in flight
    Decrypting,
    /// Secret shown
    Revealed,
    /// Reveal failed; only `IncorrectPin` accepts another `Submit`
    Failed(RevealError),
}

impl ReceiverState {
    fn name(&self) -> &'static str {
        match self {
            Self::AwaitingInput => "AwaitingInput",
            Self::Fetching => "Fetching",
            Self::NotFound => "NotFound",
            Self::Decrypting => "Decrypting",
            Self::Revealed => "Revealed",
            Self::Failed(_) => "Failed",
        }
    }

    /// Returns true if no further event can change the outcome.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::NotFound | Self::Revealed => true,
            Self::Failed(reason) => !reason.is_retryable(),
            Self::AwaitingInput | Self::Fetching | Self::Decrypting => false,
        }
    }
}

/// State machine for revealing one share link.
#[derive(Debug, Clone)]
pub struct Receiver {
    id: SecretId,
    envelope: SecretEnvelope,
    state: ReceiverState,
    /// Ciphertext held after the one and only fetch
    cached: Option<FetchedSecret>,
    /// PIN submitted alongside the fetch
    pending_pin: Option<String>,
    pin_attempts: u32,
}

impl Receiver {
    /// Receiver for a secret id and its fragment envelope.
    pub fn new(id: SecretId, envelope: SecretEnvelope) -> Self {
        Self {
            id,
            envelope,
            state: ReceiverState::AwaitingInput,
            cached: None,
            pending_pin: None,
            pin_attempts: 0,
        }
    }

    /// Receiver for a parsed share link.
    pub fn from_link(link: ShareLink) -> Self {
        let id = link.id();
        Self::new(id, link.into_envelope())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &ReceiverState {
        &self.state
    }

    /// Secret id being revealed.
    #[must_use]
    pub fn id(&self) -> SecretId {
        self.id
    }

    /// Returns true if the link needs a PIN.
    #[must_use]
    pub fn requires_pin(&self) -> bool {
        self.envelope.requires_pin()
    }

    /// Number of PIN submissions that reached a decrypt job.
    #[must_use]
    pub fn pin_attempts(&self) -> u32 {
        self.pin_attempts
    }

    /// Returns true if fetched ciphertext is held in memory.
    #[must_use]
    pub fn has_cached_ciphertext(&self) -> bool {
        self.cached.is_some()
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if the event is not valid in the current state
    pub fn handle(&mut self, event: ReceiverEvent) -> Result<Vec<ReceiverAction>, ReceiverError> {
        match (&self.state, event) {
            (ReceiverState::AwaitingInput, ReceiverEvent::Submit { pin }) => {
                Ok(self.handle_submit(pin))
            },
            (ReceiverState::Failed(RevealError::IncorrectPin), ReceiverEvent::Submit { pin })
                if self.cached.is_some() =>
            {
                Ok(self.handle_submit(pin))
            },
            (ReceiverState::Fetching, ReceiverEvent::FetchCompleted(outcome)) => {
                Ok(self.handle_fetch(outcome))
            },
            (ReceiverState::Decrypting, ReceiverEvent::DecryptCompleted(result)) => {
                Ok(self.handle_decrypt(result))
            },
            (ReceiverState::Decrypting, ReceiverEvent::DecryptAborted) => {
                Ok(self.handle_decrypt_aborted())
            },
            (state, event) => Err(ReceiverError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }

    fn handle_submit(&mut self, pin: Option<String>) -> Vec<ReceiverAction> {
        let pin = pin.filter(|p| !p.is_empty());
        if self.requires_pin() && pin.is_none() {
            return vec![ReceiverAction::PromptPin];
        }

        match self.decrypt_job(pin.clone()) {
            Some(job) => {
                self.state = ReceiverState::Decrypting;
                vec![ReceiverAction::Decrypt(job)]
            },
            None => {
                self.pending_pin = pin;
                self.state = ReceiverState::Fetching;
                vec![ReceiverAction::Fetch { id: self.id }]
            },
        }
    }

    fn handle_fetch(&mut self, outcome: FetchOutcome) -> Vec<ReceiverAction> {
        match outcome {
            FetchOutcome::Found(secret) => {
                self.cached = Some(secret);
                let pin = self.pending_pin.take();
                match self.decrypt_job(pin) {
                    Some(job) => {
                        self.state = ReceiverState::Decrypting;
                        vec![ReceiverAction::Decrypt(job)]
                    },
                    None => self.fail(RevealError::CorruptedLink),
                }
            },
            FetchOutcome::NotFound => {
                self.pending_pin = None;
                self.state = ReceiverState::NotFound;
                vec![ReceiverAction::ReportNotFound]
            },
            FetchOutcome::Failed(reason) => {
                self.pending_pin = None;
                self.fail(RevealError::Transport(reason))
            },
        }
    }

    fn handle_decrypt(&mut self, result: Result<String, OpenError>) -> Vec<ReceiverAction> {
        match result {
            Ok(plaintext) => {
                self.cached = None;
                self.state = ReceiverState::Revealed;
                vec![ReceiverAction::Reveal(plaintext)]
            },
            Err(err) => {
                let reason = RevealError::from(err);
                if reason.is_retryable() {
                    self.state = ReceiverState::Failed(reason.clone());
                    vec![ReceiverAction::ReportFailure(reason), ReceiverAction::PromptPin]
                } else {
                    self.fail(reason)
                }
            },
        }
    }

    fn handle_decrypt_aborted(&mut self) -> Vec<ReceiverAction> {
        if self.requires_pin() {
            self.pin_attempts = self.pin_attempts.saturating_sub(1);
        }
        self.state = ReceiverState::AwaitingInput;
        if self.requires_pin() {
            vec![ReceiverAction::PromptPin]
        } else {
            Vec::new()
        }
    }

    fn fail(&mut self, reason: RevealError) -> Vec<ReceiverAction> {
        self.cached = None;
        self.state = ReceiverState::Failed(reason.clone());
        vec![ReceiverAction::ReportFailure(reason)]
    }

    fn decrypt_job(&mut self, pin: Option<String>) -> Option<DecryptJob> {
        let cached = self.cached.as_ref()?;
        if self.requires_pin() {
            self.pin_attempts += 1;
        }
        Some(DecryptJob {
            envelope: self.envelope.clone(),
            ciphertext: cached.ciphertext.clone(),
            iv: cached.iv,
            pin,
        })
    }
}

#[cfg(test)]
mod tests {
    use sealdrop_crypto::{KEY_SIZE, NONCE_SIZE, SALT_SIZE, Salt, SecretKey, WRAPPED_KEY_SIZE, WrappedKey};

    use super::*;
    use crate::id::SECRET_ID_SIZE;

    fn id() -> SecretId {
        SecretId::from_bytes([0x11; SECRET_ID_SIZE])
    }

    fn direct() -> Receiver {
        Receiver::new(id(), SecretEnvelope::Direct { key: SecretKey::from_bytes([0u8; KEY_SIZE]) })
    }

    fn pin_wrapped() -> Receiver {
        Receiver::new(
            id(),
            SecretEnvelope::PinWrapped(WrappedKey {
                ciphertext: [0u8; WRAPPED_KEY_SIZE],
                nonce: Nonce::from_bytes([0u8; NONCE_SIZE]),
                salt: Salt::from_bytes([0u8; SALT_SIZE]),
            }),
        )
    }

    fn found() -> FetchOutcome {
        FetchOutcome::Found(FetchedSecret {
            ciphertext: vec![0xEE; 32],
            iv: Nonce::from_bytes([0x01; NONCE_SIZE]),
        })
    }

    fn submit(pin: Option<&str>) -> ReceiverEvent {
        ReceiverEvent::Submit { pin: pin.map(str::to_string) }
    }

    #[test]
    fn direct_happy_path() {
        let mut rx = direct();

        let actions = rx.handle(submit(None)).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::Fetch { id: fetched }] if *fetched == id()));
        assert_eq!(rx.state(), &ReceiverState::Fetching);

        let actions = rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::Decrypt(job)] if job.pin.is_none()));
        assert_eq!(rx.state(), &ReceiverState::Decrypting);

        let actions = rx.handle(ReceiverEvent::DecryptCompleted(Ok("hello".to_string()))).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::Reveal(text)] if text == "hello"));
        assert_eq!(rx.state(), &ReceiverState::Revealed);
        assert!(!rx.has_cached_ciphertext());
    }

    #[test]
    fn pin_link_prompts_without_fetching() {
        let mut rx = pin_wrapped();

        let actions = rx.handle(submit(None)).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::PromptPin]));
        assert_eq!(rx.state(), &ReceiverState::AwaitingInput);

        let actions = rx.handle(submit(Some(""))).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::PromptPin]));
    }

    #[test]
    fn wrong_pin_retries_from_cache_without_refetch() {
        let mut rx = pin_wrapped();

        rx.handle(submit(Some("0000"))).unwrap();
        let actions = rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap();
        assert!(
            matches!(actions.as_slice(), [ReceiverAction::Decrypt(job)] if job.pin.as_deref() == Some("0000"))
        );

        let actions = rx.handle(ReceiverEvent::DecryptCompleted(Err(OpenError::IncorrectPin))).unwrap();
        assert!(matches!(
            actions.as_slice(),
            [ReceiverAction::ReportFailure(RevealError::IncorrectPin), ReceiverAction::PromptPin]
        ));
        assert_eq!(rx.state(), &ReceiverState::Failed(RevealError::IncorrectPin));
        assert!(rx.has_cached_ciphertext());
        assert!(!rx.state().is_terminal());

        let actions = rx.handle(submit(Some("1234"))).unwrap();
        assert!(
            matches!(actions.as_slice(), [ReceiverAction::Decrypt(job)] if job.pin.as_deref() == Some("1234"))
        );
        assert_eq!(rx.pin_attempts(), 2);

        let actions = rx.handle(ReceiverEvent::DecryptCompleted(Ok("secret".to_string()))).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::Reveal(_)]));
        assert_eq!(rx.state(), &ReceiverState::Revealed);
    }

    #[test]
    fn not_found_is_terminal() {
        let mut rx = direct();
        rx.handle(submit(None)).unwrap();

        let actions = rx.handle(ReceiverEvent::FetchCompleted(FetchOutcome::NotFound)).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::ReportNotFound]));
        assert!(rx.state().is_terminal());

        let err = rx.handle(submit(None)).unwrap_err();
        assert_eq!(err, ReceiverError::InvalidTransition { state: "NotFound", event: "Submit" });
    }

    #[test]
    fn revealed_never_fetches_again() {
        let mut rx = direct();
        rx.handle(submit(None)).unwrap();
        rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap();
        rx.handle(ReceiverEvent::DecryptCompleted(Ok("x".to_string()))).unwrap();

        assert!(rx.handle(submit(None)).is_err());
        assert_eq!(rx.state(), &ReceiverState::Revealed);
    }

    #[test]
    fn corrupted_link_is_terminal_and_drops_cache() {
        let mut rx = pin_wrapped();
        rx.handle(submit(Some("1234"))).unwrap();
        rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap();

        let actions = rx.handle(ReceiverEvent::DecryptCompleted(Err(OpenError::CorruptedLink))).unwrap();
        assert!(matches!(
            actions.as_slice(),
            [ReceiverAction::ReportFailure(RevealError::CorruptedLink)]
        ));
        assert!(rx.state().is_terminal());
        assert!(!rx.has_cached_ciphertext());
        assert!(rx.handle(submit(Some("1234"))).is_err());
    }

    #[test]
    fn transport_failure_is_terminal() {
        let mut rx = direct();
        rx.handle(submit(None)).unwrap();

        let actions = rx
            .handle(ReceiverEvent::FetchCompleted(FetchOutcome::Failed("connection reset".to_string())))
            .unwrap();
        assert!(matches!(
            actions.as_slice(),
            [ReceiverAction::ReportFailure(RevealError::Transport(_))]
        ));
        assert!(rx.state().is_terminal());
    }

    #[test]
    fn events_out_of_order_are_rejected() {
        let mut rx = direct();
        assert_eq!(
            rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap_err(),
            ReceiverError::InvalidTransition { state: "AwaitingInput", event: "FetchCompleted" }
        );

        rx.handle(submit(None)).unwrap();
        assert_eq!(
            rx.handle(submit(None)).unwrap_err(),
            ReceiverError::InvalidTransition { state: "Fetching", event: "Submit" }
        );
        assert_eq!(
            rx.handle(ReceiverEvent::DecryptCompleted(Ok(String::new()))).unwrap_err(),
            ReceiverError::InvalidTransition { state: "Fetching", event: "DecryptCompleted" }
        );
    }

    #[test]
    fn aborted_decrypt_keeps_cache_for_next_submit() {
        let mut rx = pin_wrapped();
        rx.handle(submit(Some("1234"))).unwrap();
        rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap();
        assert_eq!(rx.pin_attempts(), 1);

        let actions = rx.handle(ReceiverEvent::DecryptAborted).unwrap();
        assert!(matches!(actions.as_slice(), [ReceiverAction::PromptPin]));
        assert_eq!(rx.state(), &ReceiverState::AwaitingInput);
        assert!(rx.has_cached_ciphertext());
        assert_eq!(rx.pin_attempts(), 0);

        // No second fetch: the next submit decrypts the cached ciphertext
        let actions = rx.handle(submit(Some("1234"))).unwrap();
        assert!(
            matches!(actions.as_slice(), [ReceiverAction::Decrypt(job)] if job.pin.as_deref() == Some("1234"))
        );
        assert_eq!(rx.state(), &ReceiverState::Decrypting);
    }

    #[test]
    fn decrypt_aborted_outside_decrypting_is_rejected() {
        let mut rx = direct();
        assert_eq!(
            rx.handle(ReceiverEvent::DecryptAborted).unwrap_err(),
            ReceiverError::InvalidTransition { state: "AwaitingInput", event: "DecryptAborted" }
        );
    }

    #[test]
    fn direct_links_do_not_count_pin_attempts() {
        let mut rx = direct();
        rx.handle(submit(Some("ignored"))).unwrap();
        rx.handle(ReceiverEvent::FetchCompleted(found())).unwrap();
        assert_eq!(rx.pin_attempts(), 0);
    }
}
