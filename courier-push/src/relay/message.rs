//! FCM HTTP v1 message types.
//!
//! These only describe the wire layout; nothing here is validated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Title, body and image shared by every platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            image: String::new(),
        }
    }
}

/// A message addressed to a token, a topic or a condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Set by the server on responses.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpush: Option<WebpushConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<FcmOptions>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Topic name without the `/topics/` prefix.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topic: String,
    /// e.g. `'foo' in topics && 'bar' in topics`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition: String,
}

impl Message {
    /// A message for one registration token.
    pub fn to_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// A message for every subscriber of a topic.
    pub fn to_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn android(mut self, android: AndroidConfig) -> Self {
        self.android = Some(android);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FcmOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analytics_label: String,
}

/// Android delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidPriority {
    Normal,
    High,
}

/// Notification priority shown by the Android system UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationPriority {
    PriorityUnspecified,
    PriorityMin,
    PriorityLow,
    PriorityDefault,
    PriorityHigh,
    PriorityMax,
}

/// Lock screen visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    VisibilityUnspecified,
    Private,
    Public,
    Secret,
}

/// RGBA color, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub alpha: f32,
}

/// LED blink pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightSettings {
    pub color: Color,
    pub light_on_duration: String,
    pub light_off_duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidNotification {
    #[serde(flatten)]
    pub base: Notification,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title_loc_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title_loc_args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body_loc_key: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_loc_args: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    /// `#rrggbb`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sound: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub click_action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ticker: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sticky: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub local_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_priority: Option<NotificationPriority>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default_sound: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default_vibrate_timings: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default_light_settings: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vibrate_timings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_settings: Option<LightSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub collapse_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AndroidPriority>,
    /// Duration string such as `3600s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub restricted_package_name: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<AndroidNotification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<FcmOptions>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub direct_boot_ok: bool,
}

impl AndroidConfig {
    /// Set the time to live.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(format!("{}s", ttl.as_secs()));
        self
    }

    pub fn priority(mut self, priority: AndroidPriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebpushFcmOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analytics_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebpushConfig {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, String>,
    /// Web Notification API options, passed through as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<WebpushFcmOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsFcmOptions {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub analytics_label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
}

/// APNs headers and payload forwarded through FCM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsOverride {
    /// e.g. `"apns-priority": "10"`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Complete APNs payload including `aps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<ApnsFcmOptions>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_message() {
        let message = Message::to_token("device-1").notification(Notification::new("Hi", "There"));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"token": "device-1", "notification": {"title": "Hi", "body": "There"}})
        );
    }

    #[test]
    fn test_android_wire_names() {
        let android = AndroidConfig {
            collapse_key: "news".into(),
            notification: Some(AndroidNotification {
                base: Notification::new("Hi", "There"),
                channel_id: "alerts".into(),
                notification_priority: Some(NotificationPriority::PriorityHigh),
                visibility: Some(Visibility::Public),
                ..Default::default()
            }),
            ..Default::default()
        }
        .ttl(Duration::from_secs(3600))
        .priority(AndroidPriority::High);

        let value = serde_json::to_value(&android).unwrap();
        assert_eq!(value["ttl"], "3600s");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["notification"]["title"], "Hi");
        assert_eq!(value["notification"]["channel_id"], "alerts");
        assert_eq!(value["notification"]["notification_priority"], "PRIORITY_HIGH");
        assert_eq!(value["notification"]["visibility"], "PUBLIC");
        assert!(value["notification"].get("sticky").is_none());
    }

    #[test]
    fn test_topic_message_with_data() {
        let message = Message::to_topic("weather").data("city", "Oslo");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"topic": "weather", "data": {"city": "Oslo"}}));
    }
}
