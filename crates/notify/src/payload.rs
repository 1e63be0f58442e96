//! Serialized payload handling shared by both card formats.

use std::io::Read;

use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{CardError, Error};

/// Which card schema a message uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    MessageCard,
    AdaptiveCard,
}

impl MessageFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageCard => "MessageCard",
            Self::AdaptiveCard => "AdaptiveCard",
        }
    }
}

/// JSON bytes stored by [`TeamsMessage::prepare`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedPayload {
    bytes: Option<Bytes>,
}

impl PreparedPayload {
    pub(crate) fn store(&mut self, bytes: Vec<u8>) {
        self.bytes = Some(Bytes::from(bytes));
    }

    /// The stored JSON, if prepared.
    #[must_use]
    pub fn bytes(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }

    #[must_use]
    pub const fn is_prepared(&self) -> bool {
        self.bytes.is_some()
    }
}

/// The build, validate, serialize pipeline shared by every card format.
///
/// The delivery client and retry loop only see the prepared bytes, so they
/// never need to know which format produced them.
pub trait TeamsMessage: Serialize {
    /// The schema this message uses.
    fn format(&self) -> MessageFormat;

    /// Check every structural rule for this format.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    fn validate(&self) -> Result<(), CardError>;

    /// Storage for the prepared payload.
    fn prepared(&self) -> &PreparedPayload;

    /// Mutable storage for the prepared payload.
    fn prepared_mut(&mut self) -> &mut PreparedPayload;

    /// Serialize to compact JSON and keep the bytes for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the message cannot be encoded.
    fn prepare(&mut self) -> Result<(), Error> {
        let json = serde_json::to_vec(&*self)?;
        self.prepared_mut().store(json);
        Ok(())
    }

    /// A cheap handle to the prepared bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotPrepared`] if [`prepare`](Self::prepare) was never called.
    fn payload_bytes(&self) -> Result<Bytes, Error> {
        self.prepared().bytes().cloned().ok_or(Error::NotPrepared)
    }

    /// The prepared payload as a reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotPrepared`] if [`prepare`](Self::prepare) was never called.
    fn payload(&self) -> Result<Reader<Bytes>, Error> {
        Ok(self.payload_bytes()?.reader())
    }

    /// Tab-indented JSON of the prepared payload, or an empty string if the
    /// message has not been prepared.
    fn pretty_print(&self) -> String {
        self.prepared()
            .bytes()
            .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(bytes).ok())
            .and_then(|value| to_tab_indented(&value).ok())
            .unwrap_or_default()
    }
}

/// Read a payload reader to a string.
///
/// # Errors
///
/// Returns any I/O error from the reader.
pub fn read_payload(mut reader: impl Read) -> std::io::Result<String> {
    let mut out = String::new();
    reader.read_to_string(&mut out)?;
    Ok(out)
}

/// Encode `value` as JSON indented with tabs.
pub(crate) fn to_tab_indented<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
