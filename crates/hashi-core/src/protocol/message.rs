//! Typed inbound messages.
//!
//! Three shapes share a common base (`CurrentQQ`, `WebConnId`) and, for chat
//! messages, a common body (`MsgType`, `Content`, `MsgSeq`, `RedBaginfo`).
//! Rust field names describe the meaning; serde renames map them to the
//! gateway's wire names.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationFailure;
use crate::protocol::schema::{self, Field, FieldType};

/// Which channel event a message arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Event,
    Friend,
    Group,
}

impl MessageKind {
    pub const ALL: [MessageKind; 3] = [MessageKind::Event, MessageKind::Friend, MessageKind::Group];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Event => "event",
            MessageKind::Friend => "friend",
            MessageKind::Group => "group",
        }
    }

    /// Real-time channel event name carrying this kind.
    pub fn channel_event(self) -> &'static str {
        match self {
            MessageKind::Event => "OnEvents",
            MessageKind::Friend => "OnFriendMsgs",
            MessageKind::Group => "OnGroupMsgs",
        }
    }

    pub fn from_channel_event(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.channel_event() == name)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields every message carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBase {
    /// Account the client is logged in as.
    #[serde(rename = "CurrentQQ")]
    pub current_account: i64,
    #[serde(rename = "WebConnId")]
    pub connection_id: String,
}

/// Body shared by friend, group, and event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(rename = "MsgType")]
    pub message_type: String,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "MsgSeq")]
    pub sequence_number: i64,
    /// Extended payload (red packets and the like).
    #[serde(rename = "RedBaginfo", default)]
    pub extended: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendMessageData {
    #[serde(rename = "FromUin")]
    pub from_account: i64,
    #[serde(rename = "ToUin")]
    pub to_account: i64,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendMessage {
    #[serde(flatten)]
    pub base: MessageBase,
    #[serde(rename = "Data")]
    pub data: FriendMessageData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessageData {
    #[serde(rename = "FromGroupId")]
    pub from_group_id: i64,
    #[serde(rename = "FromGroupName")]
    pub from_group_name: String,
    #[serde(rename = "FromUserId")]
    pub from_user_id: i64,
    #[serde(rename = "FromNickName")]
    pub from_user_nickname: String,
    #[serde(rename = "MsgRandom")]
    pub message_random: i64,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    #[serde(flatten)]
    pub base: MessageBase,
    #[serde(rename = "Data")]
    pub data: GroupMessageData,
}

/// Payload attached to an event (sender, recipient, and a message body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "FromUin")]
    pub from_account: i64,
    #[serde(rename = "ToUin")]
    pub to_account: i64,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(rename = "EventName")]
    pub event_name: String,
    #[serde(rename = "EventData")]
    pub event_data: Map<String, Value>,
    #[serde(rename = "EventMsg")]
    pub event_payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(flatten)]
    pub base: MessageBase,
    #[serde(rename = "Data")]
    pub data: EventData,
}

const BASE_FIELDS: [Field; 2] = [
    Field::required("CurrentQQ", FieldType::Int),
    Field::required("WebConnId", FieldType::Str),
];

const BODY_FIELDS: [Field; 4] = [
    Field::required("MsgType", FieldType::Str),
    Field::required("Content", FieldType::Str),
    Field::required("MsgSeq", FieldType::Int),
    Field::optional("RedBaginfo", FieldType::Map),
];

const ACCOUNT_PAIR_DATA: &[Field] = &[
    Field::required("FromUin", FieldType::Int),
    Field::required("ToUin", FieldType::Int),
    BODY_FIELDS[0],
    BODY_FIELDS[1],
    BODY_FIELDS[2],
    BODY_FIELDS[3],
];

const GROUP_DATA: &[Field] = &[
    Field::required("FromGroupId", FieldType::Int),
    Field::required("FromGroupName", FieldType::Str),
    Field::required("FromUserId", FieldType::Int),
    Field::required("FromNickName", FieldType::Str),
    Field::required("MsgRandom", FieldType::Int),
    BODY_FIELDS[0],
    BODY_FIELDS[1],
    BODY_FIELDS[2],
    BODY_FIELDS[3],
];

const EVENT_DATA: &[Field] = &[
    Field::required("EventName", FieldType::Str),
    Field::required("EventData", FieldType::Map),
    Field::required("EventMsg", FieldType::Record(ACCOUNT_PAIR_DATA)),
];

const FRIEND_SCHEMA: &[Field] = &[
    BASE_FIELDS[0],
    BASE_FIELDS[1],
    Field::required("Data", FieldType::Record(ACCOUNT_PAIR_DATA)),
];

const GROUP_SCHEMA: &[Field] = &[
    BASE_FIELDS[0],
    BASE_FIELDS[1],
    Field::required("Data", FieldType::Record(GROUP_DATA)),
];

const EVENT_SCHEMA: &[Field] = &[
    BASE_FIELDS[0],
    BASE_FIELDS[1],
    Field::required("Data", FieldType::Record(EVENT_DATA)),
];

/// A message shape that can be validated out of a flattened envelope.
pub trait InboundMessage: DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: MessageKind;

    fn schema() -> &'static [Field];

    fn base(&self) -> &MessageBase;

    /// True when the bot authored this message itself (gateway echo).
    fn is_self_authored(&self) -> bool {
        false
    }

    /// One-line description for the message log.
    fn summary(&self) -> String;

    /// Validate and build from a flattened envelope.
    fn parse(envelope: &Map<String, Value>) -> Result<Self, ValidationFailure> {
        schema::validate(envelope, Self::schema())?;
        serde_json::from_value(Value::Object(envelope.clone()))
            .map_err(|e| ValidationFailure::new("", e.to_string()))
    }
}

impl InboundMessage for EventMessage {
    const KIND: MessageKind = MessageKind::Event;

    fn schema() -> &'static [Field] {
        EVENT_SCHEMA
    }

    fn base(&self) -> &MessageBase {
        &self.base
    }

    fn summary(&self) -> String {
        format!(
            "Current: {} - Event: {} - {:?}",
            self.base.current_account, self.data.event_name, self.data.event_payload.body.content
        )
    }
}

impl InboundMessage for FriendMessage {
    const KIND: MessageKind = MessageKind::Friend;

    fn schema() -> &'static [Field] {
        FRIEND_SCHEMA
    }

    fn base(&self) -> &MessageBase {
        &self.base
    }

    fn is_self_authored(&self) -> bool {
        self.data.from_account == self.base.current_account
    }

    fn summary(&self) -> String {
        format!(
            "Current: {} - From: {} - {:?}",
            self.base.current_account, self.data.from_account, self.data.body.content
        )
    }
}

impl InboundMessage for GroupMessage {
    const KIND: MessageKind = MessageKind::Group;

    fn schema() -> &'static [Field] {
        GROUP_SCHEMA
    }

    fn base(&self) -> &MessageBase {
        &self.base
    }

    fn is_self_authored(&self) -> bool {
        self.data.from_user_id == self.base.current_account
    }

    fn summary(&self) -> String {
        format!(
            "Current: {} - Group: {} - From: {} - {:?}",
            self.base.current_account,
            self.data.from_group_id,
            self.data.from_user_id,
            self.data.body.content
        )
    }
}

/// Any validated inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Event(EventMessage),
    Friend(FriendMessage),
    Group(GroupMessage),
}

impl Message {
    /// Validate a flattened envelope as the given kind.
    pub fn parse(kind: MessageKind, envelope: &Map<String, Value>) -> Result<Self, ValidationFailure> {
        Ok(match kind {
            MessageKind::Event => Message::Event(EventMessage::parse(envelope)?),
            MessageKind::Friend => Message::Friend(FriendMessage::parse(envelope)?),
            MessageKind::Group => Message::Group(GroupMessage::parse(envelope)?),
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Event(_) => MessageKind::Event,
            Message::Friend(_) => MessageKind::Friend,
            Message::Group(_) => MessageKind::Group,
        }
    }

    pub fn is_self_authored(&self) -> bool {
        match self {
            Message::Event(m) => m.is_self_authored(),
            Message::Friend(m) => m.is_self_authored(),
            Message::Group(m) => m.is_self_authored(),
        }
    }
}
