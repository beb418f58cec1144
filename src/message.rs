use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message kind discriminant, carried on the wire as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ClientMessageType {
    Connected,
    Subscribed,
    Data,
    Ping,
}

impl From<ClientMessageType> for u8 {
    fn from(typ: ClientMessageType) -> Self {
        match typ {
            ClientMessageType::Connected => 0,
            ClientMessageType::Subscribed => 1,
            ClientMessageType::Data => 10,
            ClientMessageType::Ping => 100,
        }
    }
}

impl TryFrom<u8> for ClientMessageType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Connected),
            1 => Ok(Self::Subscribed),
            10 => Ok(Self::Data),
            100 => Ok(Self::Ping),
            other => Err(format!("unknown message type {other}")),
        }
    }
}

/// A single inbound frame from the hub.
///
/// Wire shape (field names are the compatibility contract):
/// `{"typ": <0|1|10|100>, "chn": "...", "key": "...", "val": <any>,
/// "tag"?: "...", "cat"?: "..."}`.
///
/// Constructed once per frame by deserialization and immutable afterwards.
/// The payload type defaults to [`serde_json::Value`]; typed views convert
/// with [`ClientMessage::into_typed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage<T = Value> {
    typ: ClientMessageType,
    chn: String,
    key: String,
    val: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cat: Option<String>,
}

impl<T> ClientMessage<T> {
    pub fn new(
        typ: ClientMessageType,
        channel: impl Into<String>,
        key: impl Into<String>,
        value: T,
    ) -> Self {
        Self {
            typ,
            chn: channel.into(),
            key: key.into(),
            val: value,
            tag: None,
            cat: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.cat = Some(category.into());
        self
    }

    pub fn message_type(&self) -> ClientMessageType {
        self.typ
    }

    /// The raw channel path (`/`-delimited, 1-3 segments).
    pub fn channel(&self) -> &str {
        &self.chn
    }

    /// Decompose the channel path into up to three ordered segments.
    ///
    /// Absent segments are `None`, never `""`, so an empty segment stays
    /// distinguishable from a missing one: `"a/b/c"` → `(a, b, c)`,
    /// `"a/b"` → `(a, b, None)`, `"a"` → `(a, None, None)`.
    pub fn channel_parts(&self) -> (Option<&str>, Option<&str>, Option<&str>) {
        let mut parts = self.chn.splitn(3, '/');
        (parts.next(), parts.next(), parts.next())
    }

    /// Key correlating related messages.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &T {
        &self.val
    }

    pub fn into_value(self) -> T {
        self.val
    }

    pub fn has_tag(&self) -> bool {
        self.tag.is_some()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.cat.as_deref()
    }

    pub fn is_connected_type(&self) -> bool {
        self.typ == ClientMessageType::Connected
    }

    pub fn is_subscribed_type(&self) -> bool {
        self.typ == ClientMessageType::Subscribed
    }

    pub fn is_data_type(&self) -> bool {
        self.typ == ClientMessageType::Data
    }

    pub fn is_ping_type(&self) -> bool {
        self.typ == ClientMessageType::Ping
    }

    /// Prefix-match this message against a requested channel name.
    ///
    /// A subscriber to `requested` receives messages whose channel is a
    /// prefix of the requested name, so subscribing to a parent namespace
    /// also yields messages tagged with a more specific sub-channel.
    /// Exact match is the degenerate case.
    pub fn matches_channel(&self, requested: &str) -> bool {
        requested.starts_with(self.chn.as_str())
    }
}

impl ClientMessage<Value> {
    /// Convert the opaque payload into a concrete type.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<ClientMessage<T>, serde_json::Error> {
        Ok(ClientMessage {
            typ: self.typ,
            chn: self.chn,
            key: self.key,
            val: serde_json::from_value(self.val)?,
            tag: self.tag,
            cat: self.cat,
        })
    }
}

/// Payload of a `Connected` (typ 0) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConnectedMessage {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_id: Option<String>,
}

/// Payload of a `Subscribed` (typ 1) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSubscribedMessage {
    pub channel: SubscribedChannel,
}

/// Channel descriptor inside a `Subscribed` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribedChannel {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Size")]
    pub size: u64,
}
