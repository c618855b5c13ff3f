//! Token building.

use chrono::Utc;
use log::*;
use rand::Rng;

use super::channel::is_valid_channel_name;
use super::codec::{encode_token, TokenContent, TokenMessage};
use super::privilege::{Privilege, Privileges, Role};
use crate::error::{config_error, token_error, ConfigErrorKind, Error, TokenErrorKind};

/// Salt range, inclusive on both ends.
const SALT_MIN: u32 = 1;
const SALT_MAX: u32 = 99_999_999;

/// Build a token whose privileges follow `role`.
///
/// The join privilege is always granted; publishers also get audio, video and
/// data stream publishing. Every privilege expires after `privilege_expire`
/// seconds (0 = never).
///
/// # Arguments
///
/// * `app_id` - Application identity, becomes the token issuer
/// * `app_secret` - App certificate used to sign the token
/// * `channel_name` - Channel the token grants access to
/// * `subject_id` - User id, 0 for any user
/// * `role` - Publisher or subscriber
/// * `token_expire` - Seconds from now until the token itself expires
/// * `privilege_expire` - Expiry of every granted privilege
pub fn build_token(
    app_id: &str,
    app_secret: &str,
    channel_name: &str,
    subject_id: u32,
    role: Role,
    token_expire: u32,
    privilege_expire: u32,
) -> Result<String, Error> {
    let request = TokenRequest::new(app_id, app_secret, channel_name, subject_id, token_expire)?;
    request.generate(&role.privileges(privilege_expire))
}

/// Build a token granting all four privileges with independent expiries.
///
/// Allows asymmetric grants such as an audio-only publisher (video and data
/// expiring immediately after issue).
#[allow(clippy::too_many_arguments)]
pub fn build_token_with_privileges(
    app_id: &str,
    app_secret: &str,
    channel_name: &str,
    subject_id: u32,
    token_expire: u32,
    join_channel_expire: u32,
    publish_audio_expire: u32,
    publish_video_expire: u32,
    publish_data_expire: u32,
) -> Result<String, Error> {
    let request = TokenRequest::new(app_id, app_secret, channel_name, subject_id, token_expire)?;

    let privileges = Privileges::from([
        (Privilege::JoinChannel, join_channel_expire),
        (Privilege::PublishAudioStream, publish_audio_expire),
        (Privilege::PublishVideoStream, publish_video_expire),
        (Privilege::PublishDataStream, publish_data_expire),
    ]);

    request.generate(&privileges)
}

/// A validated token request. Construction fails before any signing happens.
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
    channel_name: &'a str,
    subject_id: u32,
    token_expire: u32,
}

impl<'a> TokenRequest<'a> {
    fn new(
        app_id: &'a str,
        app_secret: &'a str,
        channel_name: &'a str,
        subject_id: u32,
        token_expire: u32,
    ) -> Result<Self, Error> {
        if app_id.is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingAppId,
                "App ID cannot be empty",
            ));
        }

        if app_secret.is_empty() {
            return Err(config_error(
                ConfigErrorKind::MissingAppSecret,
                "App Certificate cannot be empty",
            ));
        }

        if channel_name.is_empty() {
            return Err(token_error(
                TokenErrorKind::InvalidChannelName,
                "Channel name cannot be empty",
            ));
        }

        if !is_valid_channel_name(channel_name) {
            return Err(token_error(
                TokenErrorKind::InvalidChannelName,
                "Channel name must be at most 64 characters from the allowed set",
            ));
        }

        if token_expire == 0 {
            return Err(token_error(
                TokenErrorKind::InvalidExpiry,
                "Token expire time must be greater than 0",
            ));
        }

        Ok(Self {
            app_id,
            app_secret,
            channel_name,
            subject_id,
            token_expire,
        })
    }

    fn generate(&self, privileges: &Privileges) -> Result<String, Error> {
        let issued_at = Utc::now().timestamp();
        let salt = rand::thread_rng().gen_range(SALT_MIN..=SALT_MAX);
        self.sign(issued_at, salt, privileges)
    }

    /// Deterministic given the issue time and salt.
    fn sign(&self, issued_at: i64, salt: u32, privileges: &Privileges) -> Result<String, Error> {
        let expire_at = issued_at + i64::from(self.token_expire);
        let message = TokenMessage::new(salt, issued_at, privileges);
        let content = TokenContent::new(
            self.app_id,
            expire_at,
            self.channel_name,
            self.subject_id,
            &message,
        )?;

        debug!(
            "Issuing token for channel {} (uid {}, {} privileges, expires at {})",
            self.channel_name,
            self.subject_id,
            privileges.len(),
            expire_at
        );

        encode_token(content, self.app_secret)
    }
}
