//! Cloud recording REST client.
//!
//! Drives the provider's recording lifecycle: acquire a resource, start a
//! recording with it, then query or stop the resulting session. Storage
//! settings are passed through to the provider as-is after a presence check.

use crate::error::{config_error, validation_error, DomainErrorKind, Error, ExternalErrorKind};
use log::*;
use rtc_auth::api_key::{BasicAuth, BearerTokenAuth, ProviderAuth};
use rtc_auth::http::{AuthenticatedClientBuilder, Transport};
use serde::Serialize;
use serde_json::{json, Map, Value};
use service::config::Config;
use std::fmt;
use std::str::FromStr;

/// Storage settings the provider requires before it accepts a start request.
pub const REQUIRED_STORAGE_FIELDS: [&str; 5] = ["vendor", "region", "bucket", "accessKey", "secretKey"];

/// Value reported for status fields the provider left out.
pub const UNKNOWN_STATUS: &str = "unknown";

/// 0 = communication channel, 1 = live broadcast.
const CHANNEL_TYPE_COMMUNICATION: u8 = 0;
/// 0 = audio only, 1 = video only, 2 = audio and video.
const STREAM_TYPES_AUDIO_AND_VIDEO: u8 = 2;
const DEFAULT_MAX_IDLE_TIME: u32 = 30;

/// How the recorder captures the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// One file per user stream.
    Individual,
    /// All streams mixed into one file.
    #[default]
    Composite,
    /// Records a rendered web page.
    Web,
}

impl RecordingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingMode::Individual => "individual",
            RecordingMode::Composite => "composite",
            RecordingMode::Web => "web",
        }
    }
}

impl fmt::Display for RecordingMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(RecordingMode::Individual),
            "composite" => Ok(RecordingMode::Composite),
            "web" => Ok(RecordingMode::Web),
            _ => Err(validation_error("Invalid recording mode")),
        }
    }
}

/// A recording resource reserved for one channel and recorder uid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquiredResource {
    pub resource_id: String,
    pub channel_name: String,
    pub uid: u32,
}

/// A running recording session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedRecording {
    pub resource_id: String,
    pub sid: String,
    pub channel_name: String,
    pub uid: u32,
    pub mode: RecordingMode,
}

/// Recording status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingStatus {
    pub status: Value,
    pub file_list: Value,
    pub upload_status: Value,
}

/// Outcome of stopping a recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoppedRecording {
    pub upload_status: Value,
    pub file_list: Value,
    pub file_list_mode: Value,
}

/// Parameters for [`CloudRecordingClient::start`].
#[derive(Debug, Clone)]
pub struct StartRequest<'a> {
    pub resource_id: &'a str,
    pub channel_name: &'a str,
    pub uid: u32,
    /// Channel token the recorder joins with.
    pub token: &'a str,
    pub storage_config: &'a Map<String, Value>,
    pub mode: RecordingMode,
    /// Merged over the default recording config, caller keys win.
    pub recording_config: Option<Map<String, Value>>,
}

/// Cloud recording API client
pub struct CloudRecordingClient {
    transport: Box<dyn Transport>,
    app_id: String,
}

impl CloudRecordingClient {
    /// Create a client on top of an existing transport.
    pub fn new(app_id: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            app_id: app_id.to_string(),
        }
    }

    /// Create a client that talks to `config.api_base_url()` with Basic auth.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let app_id = config
            .app_id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| config_error("App ID is required for cloud recording"))?;

        let auth: Box<dyn ProviderAuth> = match config.api_bearer_token() {
            Some(token) => {
                debug!("Cloud recording authorizes with a bearer token");
                Box::new(BearerTokenAuth::new(token.clone()))
            }
            None => {
                let (customer_id, customer_secret) = config.rest_credentials().ok_or_else(|| {
                    config_error("Cloud recording requires Customer ID and Customer Secret")
                })?;
                Box::new(BasicAuth::new(customer_id, customer_secret.clone())?)
            }
        };

        let transport = AuthenticatedClientBuilder::new()
            .with_auth(auth)
            .with_timeout(config.http_timeout())
            .with_user_agent(config.http_user_agent().to_string())
            .build_transport(config.api_base_url())?;

        Ok(Self::new(app_id, Box::new(transport)))
    }

    /// Reserve a recording resource for a channel.
    pub async fn acquire(&self, channel_name: &str, uid: u32) -> Result<AcquiredResource, Error> {
        if channel_name.is_empty() {
            return Err(validation_error("Channel name cannot be empty"));
        }
        if uid == 0 {
            return Err(validation_error("UID must be greater than 0"));
        }

        let path = format!("v1/apps/{}/cloud_recording/acquire", self.app_id);
        let body = json!({
            "cname": channel_name,
            "uid": uid.to_string(),
            "clientRequest": {},
        });

        let response = self.transport.post(&path, &body).await.map_err(|e| {
            warn!("Failed to acquire recording resource: {}", e);
            Error::from(e)
        })?;

        let resource_id = required_string(&response, "resourceId")?;
        info!("Acquired recording resource for channel {}", channel_name);

        Ok(AcquiredResource {
            resource_id,
            channel_name: channel_name.to_string(),
            uid,
        })
    }

    /// Start recording with a previously acquired resource.
    pub async fn start(&self, request: StartRequest<'_>) -> Result<StartedRecording, Error> {
        validate_start(&request)?;

        let path = format!(
            "v1/apps/{}/cloud_recording/resourceid/{}/mode/{}/start",
            self.app_id, request.resource_id, request.mode
        );

        let mut recording_config = default_recording_config();
        if let Some(overrides) = request.recording_config {
            recording_config.extend(overrides);
        }

        let body = json!({
            "cname": request.channel_name,
            "uid": request.uid.to_string(),
            "clientRequest": {
                "token": request.token,
                "storageConfig": request.storage_config,
                "recordingConfig": recording_config,
            },
        });

        debug!(
            "Starting {} recording for channel {}",
            request.mode, request.channel_name
        );

        let response = self.transport.post(&path, &body).await.map_err(|e| {
            warn!("Failed to start recording: {}", e);
            Error::from(e)
        })?;

        let sid = required_string(&response, "sid")?;
        info!("Started recording {} for channel {}", sid, request.channel_name);

        Ok(StartedRecording {
            resource_id: request.resource_id.to_string(),
            sid,
            channel_name: request.channel_name.to_string(),
            uid: request.uid,
            mode: request.mode,
        })
    }

    /// Query the status of a running recording.
    pub async fn query(
        &self,
        resource_id: &str,
        sid: &str,
        mode: RecordingMode,
    ) -> Result<RecordingStatus, Error> {
        validate_session(resource_id, sid)?;

        let path = format!(
            "v1/apps/{}/cloud_recording/resourceid/{}/sid/{}/mode/{}/query",
            self.app_id, resource_id, sid, mode
        );

        let response = self.transport.get(&path).await.map_err(|e| {
            warn!("Failed to query recording status: {}", e);
            Error::from(e)
        })?;

        let server_response = server_response(&response);
        Ok(RecordingStatus {
            status: field_or_unknown(server_response, "status"),
            file_list: field_or_empty_list(server_response, "fileList"),
            upload_status: field_or_unknown(server_response, "uploadingStatus"),
        })
    }

    /// Stop a running recording.
    pub async fn stop(
        &self,
        resource_id: &str,
        sid: &str,
        channel_name: &str,
        uid: u32,
        mode: RecordingMode,
    ) -> Result<StoppedRecording, Error> {
        validate_session(resource_id, sid)?;

        let path = format!(
            "v1/apps/{}/cloud_recording/resourceid/{}/sid/{}/mode/{}/stop",
            self.app_id, resource_id, sid, mode
        );
        let body = json!({
            "cname": channel_name,
            "uid": uid.to_string(),
            "clientRequest": {},
        });

        let response = self.transport.post(&path, &body).await.map_err(|e| {
            warn!("Failed to stop recording: {}", e);
            Error::from(e)
        })?;

        info!("Stopped recording {}", sid);

        let server_response = server_response(&response);
        Ok(StoppedRecording {
            upload_status: field_or_unknown(server_response, "uploadingStatus"),
            file_list: field_or_empty_list(server_response, "fileList"),
            file_list_mode: field_or_unknown(server_response, "fileListMode"),
        })
    }
}

/// Build a storage config in the provider's shape.
///
/// `vendor` and `region` are the provider's numeric codes. The prefix is
/// omitted when empty.
pub fn storage_config(
    vendor: u32,
    region: u32,
    bucket: &str,
    access_key: &str,
    secret_key: &str,
    file_name_prefix: &[String],
) -> Map<String, Value> {
    let mut config = Map::new();
    config.insert("vendor".to_string(), json!(vendor));
    config.insert("region".to_string(), json!(region));
    config.insert("bucket".to_string(), json!(bucket));
    config.insert("accessKey".to_string(), json!(access_key));
    config.insert("secretKey".to_string(), json!(secret_key));
    if !file_name_prefix.is_empty() {
        config.insert("fileNamePrefix".to_string(), json!(file_name_prefix));
    }
    config
}

fn default_recording_config() -> Map<String, Value> {
    let mut config = Map::new();
    config.insert("channelType".to_string(), json!(CHANNEL_TYPE_COMMUNICATION));
    config.insert("streamTypes".to_string(), json!(STREAM_TYPES_AUDIO_AND_VIDEO));
    config.insert("maxIdleTime".to_string(), json!(DEFAULT_MAX_IDLE_TIME));
    config
}

fn validate_start(request: &StartRequest<'_>) -> Result<(), Error> {
    if request.resource_id.is_empty() {
        return Err(validation_error("Resource ID cannot be empty"));
    }
    if request.channel_name.is_empty() {
        return Err(validation_error("Channel name cannot be empty"));
    }
    if request.uid == 0 {
        return Err(validation_error("UID must be greater than 0"));
    }
    if request.token.is_empty() {
        return Err(validation_error("Token cannot be empty"));
    }

    for field in REQUIRED_STORAGE_FIELDS {
        if request.storage_config.get(field).map_or(true, Value::is_null) {
            return Err(validation_error(&format!(
                "Missing storage config field: {}",
                field
            )));
        }
    }

    Ok(())
}

fn validate_session(resource_id: &str, sid: &str) -> Result<(), Error> {
    if resource_id.is_empty() {
        return Err(validation_error("Resource ID cannot be empty"));
    }
    if sid.is_empty() {
        return Err(validation_error("SID cannot be empty"));
    }
    Ok(())
}

fn required_string(response: &Value, field: &str) -> Result<String, Error> {
    response
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            warn!("Cloud recording response is missing {}", field);
            Error {
                source: Some(format!("Missing {} in response", field).into()),
                error_kind: DomainErrorKind::External(ExternalErrorKind::InvalidResponse),
            }
        })
}

fn server_response(response: &Value) -> Option<&Map<String, Value>> {
    response.get("serverResponse").and_then(Value::as_object)
}

fn field_or_unknown(server_response: Option<&Map<String, Value>>, field: &str) -> Value {
    server_response
        .and_then(|r| r.get(field))
        .cloned()
        .unwrap_or_else(|| Value::from(UNKNOWN_STATUS))
}

fn field_or_empty_list(server_response: Option<&Map<String, Value>>, field: &str) -> Value {
    server_response
        .and_then(|r| r.get(field))
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()))
}
