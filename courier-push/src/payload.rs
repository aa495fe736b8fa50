//! Notification payloads.
//!
//! Every notification kind renders into the same [`Payload`] envelope: the
//! reserved `aps` dictionary plus free-form top-level fields.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::PushType;

/// The `alert` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default)]
    pub body: String,
    /// Safari action button label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(rename = "launch-image", default, skip_serializing_if = "String::is_empty")]
    pub launch_image: String,
    #[serde(rename = "title-loc-key", default, skip_serializing_if = "String::is_empty")]
    pub title_loc_key: String,
    #[serde(rename = "title-loc-args", default, skip_serializing_if = "Option::is_none")]
    pub title_loc_args: Option<Vec<String>>,
    #[serde(rename = "subtitle-loc-key", default, skip_serializing_if = "String::is_empty")]
    pub subtitle_loc_key: String,
    #[serde(rename = "subtitle-loc-args", default, skip_serializing_if = "Option::is_none")]
    pub subtitle_loc_args: Option<Vec<String>>,
    #[serde(rename = "action-loc-key", default, skip_serializing_if = "String::is_empty")]
    pub action_loc_key: String,
    #[serde(rename = "loc-key", default, skip_serializing_if = "String::is_empty")]
    pub loc_key: String,
    #[serde(rename = "loc-args", default, skip_serializing_if = "Option::is_none")]
    pub loc_args: Option<Vec<String>>,
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}

/// The `aps` dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
    /// `Some(0)` clears the badge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<i64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sound: String,
    #[serde(rename = "thread-id", default, skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(rename = "content-available", default, skip_serializing_if = "is_zero")]
    pub content_available: u8,
    #[serde(rename = "mutable-content", default, skip_serializing_if = "is_zero")]
    pub mutable_content: u8,
    #[serde(rename = "target-content-id", default, skip_serializing_if = "String::is_empty")]
    pub target_content_id: String,
    /// Safari only; values for the `urlFormatString` placeholders.
    #[serde(rename = "url-args", default, skip_serializing_if = "Option::is_none")]
    pub url_args: Option<Vec<String>>,
}

/// The request body sent to APNs.
///
/// Extensions sit at the top level next to `aps`. An extension named `aps` is
/// ignored; the reserved dictionary always wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub aps: Aps,
    pub extensions: Map<String, Value>,
}

impl Payload {
    /// Envelope with no extensions.
    pub fn new(aps: Aps) -> Self {
        Self {
            aps,
            extensions: Map::new(),
        }
    }

    /// Add top-level fields.
    pub fn with_extensions(mut self, extensions: Map<String, Value>) -> Self {
        self.extensions.extend(extensions);
        self
    }

    /// Serialized body bytes.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let custom = self.extensions.iter().filter(|(k, _)| k.as_str() != "aps");
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in custom {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("aps", &self.aps)?;
        map.end()
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertPush {
    pub token: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub body: String,
    /// Empty plays the system sound.
    #[serde(default)]
    pub sound: String,
    #[serde(default)]
    pub badge: Option<i64>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// A silent content update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundPush {
    pub token: String,
    #[serde(default)]
    pub badge: Option<i64>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// An incoming VoIP call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoipPush {
    pub token: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub badge: Option<i64>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// A Safari website notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPush {
    pub token: String,
    pub title: String,
    pub body: String,
    /// Action button label.
    #[serde(default)]
    pub action: String,
    /// Always sent, even when empty.
    #[serde(default)]
    pub url_args: Vec<String>,
}

/// A notification ready to be delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Push {
    Alert(AlertPush),
    Background(BackgroundPush),
    Voip(VoipPush),
    Web(WebPush),
}

impl Push {
    /// The target device token.
    pub fn device_token(&self) -> &str {
        match self {
            Self::Alert(p) => &p.token,
            Self::Background(p) => &p.token,
            Self::Voip(p) => &p.token,
            Self::Web(p) => &p.token,
        }
    }

    /// The push type this kind is sent as. Web pushes carry none.
    pub fn push_type(&self) -> Option<PushType> {
        match self {
            Self::Alert(_) => Some(PushType::Alert),
            Self::Background(_) => Some(PushType::Background),
            Self::Voip(_) => Some(PushType::Voip),
            Self::Web(_) => None,
        }
    }

    /// Render the request body.
    pub fn payload(&self) -> Payload {
        match self {
            Self::Alert(p) => {
                let sound = if p.sound.is_empty() {
                    "default".to_string()
                } else {
                    p.sound.clone()
                };
                Payload::new(Aps {
                    alert: Some(Alert {
                        title: p.title.clone(),
                        subtitle: p.subtitle.clone(),
                        body: p.body.clone(),
                        ..Default::default()
                    }),
                    badge: p.badge,
                    sound,
                    thread_id: p.thread_id.clone(),
                    category: p.category.clone(),
                    ..Default::default()
                })
                .with_extensions(p.data.clone())
            }
            Self::Background(p) => Payload::new(Aps {
                badge: p.badge,
                content_available: 1,
                ..Default::default()
            })
            .with_extensions(p.data.clone()),
            Self::Voip(p) => Payload::new(Aps {
                alert: Some(Alert {
                    title: p.title.clone(),
                    body: p.body.clone(),
                    ..Default::default()
                }),
                badge: p.badge,
                ..Default::default()
            })
            .with_extensions(p.data.clone()),
            Self::Web(p) => Payload::new(Aps {
                alert: Some(Alert {
                    title: p.title.clone(),
                    body: p.body.clone(),
                    action: p.action.clone(),
                    ..Default::default()
                }),
                url_args: Some(p.url_args.clone()),
                ..Default::default()
            }),
        }
    }
}

impl From<AlertPush> for Push {
    fn from(push: AlertPush) -> Self {
        Self::Alert(push)
    }
}

impl From<BackgroundPush> for Push {
    fn from(push: BackgroundPush) -> Self {
        Self::Background(push)
    }
}

impl From<VoipPush> for Push {
    fn from(push: VoipPush) -> Self {
        Self::Voip(push)
    }
}

impl From<WebPush> for Push {
    fn from(push: WebPush) -> Self {
        Self::Web(push)
    }
}
