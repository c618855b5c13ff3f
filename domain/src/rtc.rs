//! The RTC facade: token minting, webhook parsing and recording control behind one
//! configured entry point.

use crate::error::{config_error, Error};
use crate::gateway::cloud_recording::{
    CloudRecordingClient, RecordingMode, RecordingStatus, StartRequest, StoppedRecording,
};
use chrono::{DateTime, Utc};
use log::*;
use rtc_auth::token::{build_token, build_token_with_privileges, is_valid_channel_name, Role};
use rtc_auth::webhook::{EventParser, WebhookEvent};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};
use service::config::Config;
use std::collections::HashMap;

/// Version of this crate, reported by [`RtcSdk::version`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Token lifetime used by rooms and user tokens unless overridden (24 hours).
pub const DEFAULT_TOKEN_EXPIRE: u32 = 86400;
/// Uid of the room administrator unless overridden.
pub const DEFAULT_ADMIN_UID: u32 = 1;
/// Uid the cloud recorder joins as unless overridden.
pub const DEFAULT_RECORDING_UID: u32 = 999999;

/// Options for [`RtcSdk::create_room`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOptions {
    pub admin_uid: u32,
    pub token_expire: u32,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            admin_uid: DEFAULT_ADMIN_UID,
            token_expire: DEFAULT_TOKEN_EXPIRE,
        }
    }
}

/// A channel with a publisher token for its administrator.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub channel_name: String,
    pub admin_uid: u32,
    pub admin_token: String,
    pub token_expire: u32,
    pub created_at: DateTime<Utc>,
}

/// A token minted for one user of a channel.
#[derive(Debug, Clone, Serialize)]
pub struct UserToken {
    pub channel_name: String,
    pub uid: u32,
    pub token: String,
    pub role: Role,
    pub is_publisher: bool,
    pub token_expire: u32,
    pub generated_at: DateTime<Utc>,
}

/// Options for [`RtcSdk::start_recording`].
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    pub recording_uid: u32,
    pub token_expire: u32,
    pub mode: RecordingMode,
    /// Merged over the default recording config.
    pub recording_config: Option<Map<String, Value>>,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            recording_uid: DEFAULT_RECORDING_UID,
            token_expire: DEFAULT_TOKEN_EXPIRE,
            mode: RecordingMode::default(),
            recording_config: None,
        }
    }
}

/// A recording that was acquired and started.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSession {
    pub resource_id: String,
    pub sid: String,
    pub channel_name: String,
    pub uid: u32,
    pub mode: RecordingMode,
    /// Subscriber token the recorder joined with.
    pub recording_token: String,
    pub started_at: DateTime<Utc>,
}

/// Entry point for RTC operations with a fixed application identity.
pub struct RtcSdk {
    config: Config,
    app_id: String,
    app_certificate: SecretString,
}

impl RtcSdk {
    /// Create the facade. Requires an app id and app certificate.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let (app_id, app_certificate) = config
            .token_credentials()
            .ok_or_else(|| config_error("App ID and App Certificate are required"))?;

        if config.is_production() && !config.verify_webhook_signature {
            return Err(config_error(
                "Webhook signature verification cannot be disabled in production",
            ));
        }

        if !config.has_rest_credentials() {
            debug!("No REST credentials configured, cloud recording is unavailable");
        }

        Ok(Self {
            config: config.clone(),
            app_id: app_id.to_string(),
            app_certificate: app_certificate.clone(),
        })
    }

    pub fn version() -> &'static str {
        VERSION
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Room options using the configured token lifetime.
    pub fn default_room_options(&self) -> RoomOptions {
        RoomOptions {
            token_expire: self.config.token_expire_seconds,
            ..RoomOptions::default()
        }
    }

    /// Recording options using the configured recorder uid, mode and token lifetime.
    pub fn default_recording_options(&self) -> RecordingOptions {
        RecordingOptions {
            recording_uid: self.config.recording_uid,
            token_expire: self.config.token_expire_seconds,
            mode: self.config.recording_mode().parse().unwrap_or_default(),
            recording_config: None,
        }
    }

    /// Mint a token whose privileges follow `role`.
    pub fn generate_token(
        &self,
        channel_name: &str,
        uid: u32,
        role: Role,
        token_expire: u32,
        privilege_expire: u32,
    ) -> Result<String, Error> {
        Ok(build_token(
            &self.app_id,
            self.app_certificate.expose_secret(),
            channel_name,
            uid,
            role,
            token_expire,
            privilege_expire,
        )?)
    }

    /// Mint a token with an independent expiry per privilege.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_token_with_privileges(
        &self,
        channel_name: &str,
        uid: u32,
        token_expire: u32,
        join_channel_expire: u32,
        publish_audio_expire: u32,
        publish_video_expire: u32,
        publish_data_expire: u32,
    ) -> Result<String, Error> {
        Ok(build_token_with_privileges(
            &self.app_id,
            self.app_certificate.expose_secret(),
            channel_name,
            uid,
            token_expire,
            join_channel_expire,
            publish_audio_expire,
            publish_video_expire,
            publish_data_expire,
        )?)
    }

    /// Set up a channel and mint a publisher token for its administrator.
    pub fn create_room(&self, channel_name: &str, options: RoomOptions) -> Result<Room, Error> {
        if !is_valid_channel_name(channel_name) {
            return Err(config_error("Invalid channel name format"));
        }

        let admin_token = self.generate_token(
            channel_name,
            options.admin_uid,
            Role::Publisher,
            options.token_expire,
            self.config.privilege_expire_seconds,
        )?;

        info!("Created room {}", channel_name);

        Ok(Room {
            channel_name: channel_name.to_string(),
            admin_uid: options.admin_uid,
            admin_token,
            token_expire: options.token_expire,
            created_at: Utc::now(),
        })
    }

    /// Mint a publisher or subscriber token for one user.
    pub fn generate_user_token(
        &self,
        channel_name: &str,
        uid: u32,
        is_publisher: bool,
        token_expire: u32,
    ) -> Result<UserToken, Error> {
        let role = if is_publisher {
            Role::Publisher
        } else {
            Role::Subscriber
        };
        let token = self.generate_token(
            channel_name,
            uid,
            role,
            token_expire,
            self.config.privilege_expire_seconds,
        )?;

        Ok(UserToken {
            channel_name: channel_name.to_string(),
            uid,
            token,
            role,
            is_publisher,
            token_expire,
            generated_at: Utc::now(),
        })
    }

    /// A webhook parser keyed with the customer secret.
    pub fn event_parser(&self) -> Result<EventParser, Error> {
        let secret = self
            .config
            .customer_secret()
            .filter(|secret| !secret.expose_secret().is_empty())
            .ok_or_else(|| {
                config_error("Event parser requires Customer Secret for signature verification")
            })?;

        Ok(EventParser::new(secret.clone()))
    }

    /// Authenticate and normalize one inbound webhook.
    pub fn parse_webhook_event(
        &self,
        raw_body: &[u8],
        headers: &HashMap<String, String>,
        verify_signature: bool,
    ) -> Result<WebhookEvent, Error> {
        Ok(self
            .event_parser()?
            .parse_event(raw_body, headers, verify_signature)?)
    }

    /// Like [`RtcSdk::parse_webhook_event`], verifying signatures unless disabled in configuration.
    pub fn parse_webhook(
        &self,
        raw_body: &[u8],
        headers: &HashMap<String, String>,
    ) -> Result<WebhookEvent, Error> {
        if !self.config.verify_webhook_signature {
            warn!("Webhook signature verification is disabled");
        }
        self.parse_webhook_event(raw_body, headers, self.config.verify_webhook_signature)
    }

    /// A recording client authenticated with the customer id and secret.
    pub fn cloud_recording(&self) -> Result<CloudRecordingClient, Error> {
        CloudRecordingClient::from_config(&self.config)
    }

    /// Acquire a recording resource and start recording `channel_name`.
    ///
    /// The recorder joins with a subscriber token minted for `options.recording_uid`.
    pub async fn start_recording(
        &self,
        channel_name: &str,
        storage_config: &Map<String, Value>,
        options: RecordingOptions,
    ) -> Result<RecordingSession, Error> {
        let client = self.cloud_recording()?;

        let recording_token = self.generate_token(
            channel_name,
            options.recording_uid,
            Role::Subscriber,
            options.token_expire,
            self.config.privilege_expire_seconds,
        )?;

        let acquired = client.acquire(channel_name, options.recording_uid).await?;
        let started = client
            .start(StartRequest {
                resource_id: &acquired.resource_id,
                channel_name,
                uid: options.recording_uid,
                token: &recording_token,
                storage_config,
                mode: options.mode,
                recording_config: options.recording_config,
            })
            .await?;

        Ok(RecordingSession {
            resource_id: started.resource_id,
            sid: started.sid,
            channel_name: started.channel_name,
            uid: started.uid,
            mode: started.mode,
            recording_token,
            started_at: Utc::now(),
        })
    }

    pub async fn stop_recording(
        &self,
        resource_id: &str,
        sid: &str,
        channel_name: &str,
        recording_uid: u32,
        mode: RecordingMode,
    ) -> Result<StoppedRecording, Error> {
        self.cloud_recording()?
            .stop(resource_id, sid, channel_name, recording_uid, mode)
            .await
    }

    pub async fn query_recording(
        &self,
        resource_id: &str,
        sid: &str,
        mode: RecordingMode,
    ) -> Result<RecordingStatus, Error> {
        self.cloud_recording()?.query(resource_id, sid, mode).await
    }
}
