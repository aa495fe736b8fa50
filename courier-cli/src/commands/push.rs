//! Send a single notification through APNs.

use clap::ValueEnum;
use courier_push::{
    AlertPush, ApnsClient, BackgroundPush, Credentials, DeliveryResult, Headers, Push, VoipPush,
    WebPush,
};
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime};

use crate::error::{CliError, CliResult};
use crate::settings::CourierSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PushKind {
    #[default]
    Alert,
    Background,
    Voip,
    Web,
}

/// What to send and how.
#[derive(Debug, Clone, Default)]
pub struct PushArgs {
    pub token: String,
    pub kind: PushKind,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub sound: String,
    pub badge: Option<i64>,
    pub action: String,
    pub url_args: Vec<String>,
    /// JSON object merged into the payload top level.
    pub data: Option<String>,
    pub id: Option<String>,
    pub priority: Option<u8>,
    /// Seconds from now.
    pub expiration: Option<u64>,
    pub collapse_id: Option<String>,
}

/// Build the notification described by `args`.
pub fn build_push(args: &PushArgs) -> CliResult<Push> {
    let data = match &args.data {
        None => Map::new(),
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(CliError::InvalidArgument("--data must be a JSON object".into())),
            Err(e) => return Err(CliError::InvalidArgument(format!("--data: {}", e))),
        },
    };

    let push = match args.kind {
        PushKind::Alert => Push::Alert(AlertPush {
            token: args.token.clone(),
            title: args.title.clone(),
            subtitle: args.subtitle.clone(),
            body: args.body.clone(),
            sound: args.sound.clone(),
            badge: args.badge,
            data,
            ..Default::default()
        }),
        PushKind::Background => Push::Background(BackgroundPush {
            token: args.token.clone(),
            badge: args.badge,
            data,
        }),
        PushKind::Voip => Push::Voip(VoipPush {
            token: args.token.clone(),
            title: args.title.clone(),
            body: args.body.clone(),
            badge: args.badge,
            data,
        }),
        PushKind::Web => {
            if !data.is_empty() {
                return Err(CliError::InvalidArgument(
                    "web pushes carry no custom data".into(),
                ));
            }
            Push::Web(WebPush {
                token: args.token.clone(),
                title: args.title.clone(),
                body: args.body.clone(),
                action: args.action.clone(),
                url_args: args.url_args.clone(),
            })
        }
    };

    Ok(push)
}

/// Request headers described by `args`.
pub fn build_headers(args: &PushArgs) -> Headers {
    let mut headers = Headers::new();
    if let Some(id) = &args.id {
        headers = headers.id(id.clone());
    }
    if let Some(priority) = args.priority {
        headers = headers.priority(priority);
    }
    if let Some(secs) = args.expiration {
        headers = headers.expiration(SystemTime::now() + Duration::from_secs(secs));
    }
    if let Some(collapse_id) = &args.collapse_id {
        headers = headers.collapse_id(collapse_id.clone());
    }
    headers
}

pub async fn run(settings: &CourierSettings, args: &PushArgs) -> CliResult<DeliveryResult> {
    let apns = settings.apns()?;

    let mut credentials =
        Credentials::from_p8_file(apns.team_id, apns.key_id, apns.bundle_id, &apns.key_path)?;
    if let Some(path) = &apns.safari_cert_path {
        credentials = credentials.with_safari_cert(std::fs::read(path)?);
    }

    let mut client = ApnsClient::new(credentials, apns.environment)?;
    if let Some(endpoint) = &apns.endpoint {
        client = client.with_endpoint(endpoint)?;
    }

    let push = build_push(args)?;
    Ok(client.push(&push, Some(build_headers(args))).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_push::PushType;

    fn args(kind: PushKind) -> PushArgs {
        PushArgs {
            token: "abc".into(),
            kind,
            title: "Hi".into(),
            body: "There".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_alert_with_data() {
        let mut args = args(PushKind::Alert);
        args.data = Some(r#"{"conversation": 7}"#.into());

        let push = build_push(&args).unwrap();
        assert_eq!(push.push_type(), Some(PushType::Alert));

        let payload = serde_json::to_value(push.payload()).unwrap();
        assert_eq!(payload["conversation"], 7);
        assert_eq!(payload["aps"]["sound"], "default");
    }

    #[test]
    fn test_data_must_be_object() {
        let mut args = args(PushKind::Background);
        args.data = Some("[1, 2]".into());
        assert!(matches!(build_push(&args), Err(CliError::InvalidArgument(_))));

        args.data = Some("{not json".into());
        assert!(matches!(build_push(&args), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_web_push_rejects_data() {
        let mut args = args(PushKind::Web);
        args.url_args = vec!["news".into()];
        assert!(build_push(&args).is_ok());

        args.data = Some(r#"{"x": 1}"#.into());
        assert!(build_push(&args).is_err());
    }

    #[test]
    fn test_headers() {
        let mut args = args(PushKind::Voip);
        args.priority = Some(10);
        args.collapse_id = Some("call".into());

        let headers = build_headers(&args);
        assert_eq!(headers.priority, Some(10));
        assert_eq!(headers.collapse_id.as_deref(), Some("call"));
        assert!(headers.expiration.is_none());
    }
}
