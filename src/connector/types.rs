//! Bot connector wire types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    /// Ask the client to alert the recipient
    pub notify: bool,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            notify: false,
        }
    }

    #[must_use]
    pub fn with_notify(mut self, notify: bool) -> Self {
        self.notify = notify;
        self
    }
}

/// Message activity as posted to the connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<Value>,
}

impl Activity {
    pub fn from_message(message: &Message) -> Self {
        let channel_data = message
            .notify
            .then(|| serde_json::json!({ "notification": { "alert": true } }));

        Self {
            activity_type: "message".to_string(),
            text: message.text.clone(),
            channel_data,
        }
    }

    /// Whether the Teams notification alert is set
    pub fn notifies(&self) -> bool {
        self.channel_data
            .as_ref()
            .and_then(|d| d.pointer("/notification/alert"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Request body for starting a new conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParameters {
    pub is_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<Value>,
    pub activity: Activity,
}

impl ConversationParameters {
    /// Group conversation (a new thread) in the given channel
    pub fn channel_thread(channel_id: &str, activity: Activity) -> Self {
        Self {
            is_group: true,
            channel_data: Some(serde_json::json!({ "channel": { "id": channel_id } })),
            activity,
        }
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel_data
            .as_ref()
            .and_then(|d| d.pointer("/channel/id"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResourceResponse {
    pub id: String,
    #[serde(default)]
    pub activity_id: Option<String>,
    #[serde(default)]
    pub service_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_activity_has_no_channel_data() {
        let activity = Activity::from_message(&Message::text("hello"));
        assert_eq!(
            serde_json::to_value(&activity).unwrap(),
            json!({ "type": "message", "text": "hello" })
        );
        assert!(!activity.notifies());
    }

    #[test]
    fn test_notify_sets_alert() {
        let activity = Activity::from_message(&Message::text("ping").with_notify(true));
        assert!(activity.notifies());
        assert_eq!(
            serde_json::to_value(&activity).unwrap()["channelData"],
            json!({ "notification": { "alert": true } })
        );
    }

    #[test]
    fn test_channel_thread_parameters() {
        let params = ConversationParameters::channel_thread(
            "19:channel@thread",
            Activity::from_message(&Message::text("kickoff")),
        );
        let body = serde_json::to_value(&params).unwrap();
        assert_eq!(body["isGroup"], json!(true));
        assert_eq!(body["channelData"]["channel"]["id"], json!("19:channel@thread"));
        assert_eq!(body["activity"]["text"], json!("kickoff"));
        assert_eq!(params.channel_id(), Some("19:channel@thread"));
    }

    #[test]
    fn test_conversation_response_tolerates_missing_fields() {
        let resp: ConversationResourceResponse =
            serde_json::from_value(json!({ "id": "19:new@thread" })).unwrap();
        assert_eq!(resp.id, "19:new@thread");
        assert_eq!(resp.activity_id, None);
    }
}
