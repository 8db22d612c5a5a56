//! Typed request bodies for common gateway actions.

use serde::{Serialize, Serializer};

pub const SEND_MSG: &str = "SendMsg";
pub const GET_FRIEND_LIST: &str = "GetQQUserList";

/// Conversation type of `SendMsg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendTarget {
    Friend,
    Group,
    /// Private chat started from a group.
    GroupPrivate,
}

impl Serialize for SendTarget {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(match self {
            SendTarget::Friend => 1,
            SendTarget::Group => 2,
            SendTarget::GroupPrivate => 3,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMsg {
    #[serde(rename = "toUser")]
    pub to_user: i64,
    #[serde(rename = "sendToType")]
    pub send_to_type: SendTarget,
    #[serde(rename = "sendMsgType")]
    pub send_msg_type: String,
    pub content: String,
    #[serde(rename = "groupid")]
    pub group_id: i64,
    #[serde(rename = "atUser")]
    pub at_user: i64,
}

impl SendMsg {
    pub fn friend_text(to: i64, content: impl Into<String>) -> Self {
        Self {
            to_user: to,
            send_to_type: SendTarget::Friend,
            send_msg_type: "TextMsg".into(),
            content: content.into(),
            group_id: 0,
            at_user: 0,
        }
    }

    pub fn group_text(group: i64, content: impl Into<String>) -> Self {
        Self {
            to_user: group,
            send_to_type: SendTarget::Group,
            ..Self::friend_text(group, content)
        }
    }

    /// Mention `user` in a group message.
    pub fn at(mut self, user: i64) -> Self {
        self.at_user = user;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendListReq {
    #[serde(rename = "StartIndex")]
    pub start_index: u32,
}
