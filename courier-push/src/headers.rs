//! APNs request headers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// The `apns-push-type` of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushType {
    /// Notifications that trigger a user interaction.
    Alert,
    /// Silent content updates.
    Background,
    /// Incoming VoIP calls.
    Voip,
    /// watchOS complication updates.
    Complication,
    /// File Provider change signals.
    #[serde(rename = "fileprovider")]
    FileProvider,
    /// MDM check-in requests.
    Mdm,
}

impl PushType {
    /// The header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Background => "background",
            Self::Voip => "voip",
            Self::Complication => "complication",
            Self::FileProvider => "fileprovider",
            Self::Mdm => "mdm",
        }
    }

    /// Suffix appended to the bundle id to form the topic.
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            Self::Voip => ".voip",
            Self::Complication => ".complication",
            Self::FileProvider => ".pushkit.fileprovider",
            _ => "",
        }
    }

    /// Largest accepted payload in bytes.
    pub fn max_payload_size(push_type: Option<Self>) -> usize {
        match push_type {
            Some(Self::Voip) => 5120,
            _ => 4096,
        }
    }
}

impl fmt::Display for PushType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PushType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alert" => Ok(Self::Alert),
            "background" => Ok(Self::Background),
            "voip" => Ok(Self::Voip),
            "complication" => Ok(Self::Complication),
            "fileprovider" => Ok(Self::FileProvider),
            "mdm" => Ok(Self::Mdm),
            other => Err(format!("unknown push type: {}", other)),
        }
    }
}

/// Per-request APNs headers.
///
/// The topic is not set by callers; the delivery client fills it from the
/// bundle id right before sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    /// `apns-push-type`.
    pub push_type: Option<PushType>,
    /// `apns-id`, a canonical lowercase UUID.
    pub id: Option<String>,
    /// `apns-expiration`. `None` or the epoch means deliver once, don't store.
    pub expiration: Option<SystemTime>,
    /// `apns-priority`. `None` or `0` lets APNs pick.
    pub priority: Option<u8>,
    /// `apns-collapse-id`.
    pub collapse_id: Option<String>,
    topic: Option<String>,
}

impl Headers {
    /// Empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the push type.
    pub fn push_type(mut self, push_type: PushType) -> Self {
        self.push_type = Some(push_type);
        self
    }

    /// Set the notification id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Use a fresh random notification id.
    pub fn random_id(self) -> Self {
        self.id(uuid::Uuid::new_v4().to_string())
    }

    /// Set the expiration instant.
    pub fn expiration(mut self, at: SystemTime) -> Self {
        self.expiration = Some(at);
        self
    }

    /// Set the priority.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the collapse id.
    pub fn collapse_id(mut self, id: impl Into<String>) -> Self {
        self.collapse_id = Some(id.into());
        self
    }

    pub(crate) fn set_topic(&mut self, bundle_id: &str) {
        self.topic = Some(bundle_id.to_string());
    }

    /// The wire topic: bundle id plus the push type's suffix.
    pub fn topic(&self) -> Option<String> {
        let topic = self.topic.as_deref().filter(|t| !t.is_empty())?;
        let suffix = self.push_type.map(|t| t.topic_suffix()).unwrap_or("");
        Some(format!("{}{}", topic, suffix))
    }

    /// Translate to wire header names, omitting unset fields.
    pub fn wire_headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();

        if let Some(push_type) = self.push_type {
            headers.push(("apns-push-type", push_type.as_str().to_string()));
        }
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            headers.push(("apns-id", id.to_string()));
        }
        if let Some(expiration) = self.expiration {
            let secs = expiration
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            if secs > 0 {
                headers.push(("apns-expiration", secs.to_string()));
            }
        }
        if let Some(priority) = self.priority.filter(|p| *p > 0) {
            headers.push(("apns-priority", priority.to_string()));
        }
        if let Some(collapse_id) = self.collapse_id.as_deref().filter(|c| !c.is_empty()) {
            headers.push(("apns-collapse-id", collapse_id.to_string()));
        }
        if let Some(topic) = self.topic() {
            headers.push(("apns-topic", topic));
        }

        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn lookup<'a>(headers: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_topic_suffixes() {
        let cases = [
            (PushType::Alert, "com.example.app"),
            (PushType::Background, "com.example.app"),
            (PushType::Voip, "com.example.app.voip"),
            (PushType::Complication, "com.example.app.complication"),
            (PushType::FileProvider, "com.example.app.pushkit.fileprovider"),
            (PushType::Mdm, "com.example.app"),
        ];

        for (push_type, expected) in cases {
            let mut headers = Headers::new().push_type(push_type);
            headers.set_topic("com.example.app");
            assert_eq!(headers.topic().as_deref(), Some(expected), "{push_type}");
        }
    }

    #[test]
    fn test_empty_headers() {
        assert!(Headers::new().wire_headers().is_empty());
    }

    #[test]
    fn test_zero_values_omitted() {
        let headers = Headers::new().priority(0).expiration(UNIX_EPOCH).id("");
        assert!(headers.wire_headers().is_empty());
    }

    #[test]
    fn test_full_headers() {
        let mut headers = Headers::new()
            .push_type(PushType::Voip)
            .id("123e4567-e89b-12d3-a456-4266554400a0")
            .expiration(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
            .priority(10)
            .collapse_id("call");
        headers.set_topic("com.example.app");

        let wire = headers.wire_headers();
        assert_eq!(lookup(&wire, "apns-push-type"), Some("voip"));
        assert_eq!(
            lookup(&wire, "apns-id"),
            Some("123e4567-e89b-12d3-a456-4266554400a0")
        );
        assert_eq!(lookup(&wire, "apns-expiration"), Some("1700000000"));
        assert_eq!(lookup(&wire, "apns-priority"), Some("10"));
        assert_eq!(lookup(&wire, "apns-collapse-id"), Some("call"));
        assert_eq!(lookup(&wire, "apns-topic"), Some("com.example.app.voip"));
    }

    #[test]
    fn test_random_id_is_uuid() {
        let headers = Headers::new().random_id();
        let id = headers.id.unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_push_type_parse() {
        assert_eq!("VOIP".parse::<PushType>().unwrap(), PushType::Voip);
        assert!("carrier-pigeon".parse::<PushType>().is_err());
    }

    #[test]
    fn test_payload_ceiling() {
        assert_eq!(PushType::max_payload_size(Some(PushType::Voip)), 5120);
        assert_eq!(PushType::max_payload_size(Some(PushType::Alert)), 4096);
        assert_eq!(PushType::max_payload_size(None), 4096);
    }
}
