//! Outbound action calls over HTTP.
//!
//! `POST <address>/v1/LuaApiCaller?qq=<account>&timeout=<secs>&funcname=<action>`
//! with the arguments as a JSON body. Transport failures and error statuses
//! become `HashiError::Api`.

pub mod actions;
pub mod reply;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use hashi_core::error::{HashiError, Result};

pub use actions::{FriendListReq, SendMsg, SendTarget};
pub use reply::ActionReply;

const ENDPOINT: &str = "/v1/LuaApiCaller";

#[derive(Clone)]
pub struct ActionCaller {
    http: reqwest::Client,
    endpoint: String,
    account: i64,
    timeout: u64,
}

impl ActionCaller {
    pub fn new(address: &str, account: i64, timeout: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| HashiError::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            endpoint: format!("{address}{ENDPOINT}"),
            account,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Invoke `action` with `args` as the JSON body.
    pub async fn call<A: Serialize + ?Sized>(&self, action: &str, args: &A) -> Result<ActionReply> {
        let resp = self
            .http
            .post(&self.endpoint)
            .query(&[
                ("qq", self.account.to_string()),
                ("timeout", self.timeout.to_string()),
                ("funcname", action.to_string()),
            ])
            .json(args)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HashiError::Api(format!("action {action} failed: {e}")))?;

        let body = resp
            .bytes()
            .await
            .map_err(|e| HashiError::Api(format!("action {action} body read failed: {e}")))?;

        tracing::debug!(%action, "action executed");
        Ok(ActionReply::decode(body))
    }

    pub async fn send_msg(&self, msg: &SendMsg) -> Result<ActionReply> {
        self.call(actions::SEND_MSG, msg).await
    }

    pub async fn send_friend_text(&self, to: i64, content: &str) -> Result<ActionReply> {
        self.send_msg(&SendMsg::friend_text(to, content)).await
    }

    pub async fn send_group_text(&self, group: i64, content: &str) -> Result<ActionReply> {
        self.send_msg(&SendMsg::group_text(group, content)).await
    }

    pub async fn friend_list(&self, start_index: u32) -> Result<ActionReply> {
        self.call(actions::GET_FRIEND_LIST, &FriendListReq { start_index })
            .await
    }
}

impl fmt::Debug for ActionCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ActionCaller (Address:{} Account:{})>", self.endpoint, self.account)
    }
}
