//! Shareable links.
//!
//! ```text
//! https://drop.example.com/s/3f2a...9c#p1.AbC...
//! \______ base_url ______/   \_ id _/ \_ fragment _/
//! ```
//!
//! Only the part before `#` is ever sent to the relay host.

use std::fmt;

use crate::{
    envelope::SecretEnvelope,
    error::LinkError,
    fragment::{from_fragment, to_fragment},
    id::SecretId,
};

/// Path segment that precedes the secret id
const SECRET_PATH: &str = "/s/";

/// A link that lets exactly one receiver reveal a secret.
#[derive(Debug, Clone)]
pub struct ShareLink {
    base_url: String,
    id: SecretId,
    envelope: SecretEnvelope,
}

impl ShareLink {
    /// Assemble a link. Trailing slashes on `base_url` are dropped.
    pub fn new(base_url: &str, id: SecretId, envelope: SecretEnvelope) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), id, envelope }
    }

    /// Parse `{base}/s/{id}#{fragment}`.
    ///
    /// Query strings after the id are ignored.
    pub fn parse(link: &str) -> Result<Self, LinkError> {
        let (location, fragment) = link.split_once('#').ok_or(LinkError::MissingFragment)?;
        if fragment.is_empty() {
            return Err(LinkError::MissingFragment);
        }

        let (base_url, tail) = location.rsplit_once(SECRET_PATH).ok_or(LinkError::MissingId)?;
        let id_text = tail.split(['/', '?']).next().unwrap_or_default();
        if id_text.is_empty() {
            return Err(LinkError::MissingId);
        }

        let id = id_text.parse::<SecretId>().map_err(LinkError::InvalidId)?;
        let envelope = from_fragment(fragment)?;

        Ok(Self::new(base_url, id, envelope))
    }

    /// Relay origin the link points at.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Secret id (the part the relay sees).
    pub fn id(&self) -> SecretId {
        self.id
    }

    /// Key material from the fragment.
    pub fn envelope(&self) -> &SecretEnvelope {
        &self.envelope
    }

    /// Consume the link, keeping only the envelope.
    pub fn into_envelope(self) -> SecretEnvelope {
        self.envelope
    }
}

impl fmt::Display for ShareLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SECRET_PATH}{}#{}", self.base_url, self.id, to_fragment(&self.envelope))
    }
}
