//! Privileges granted by a token and the roles that imply them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{token_error, Error, TokenErrorKind};

/// A single capability in a channel. Each privilege carries its own expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    JoinChannel,
    PublishAudioStream,
    PublishVideoStream,
    PublishDataStream,
}

impl Privilege {
    pub const ALL: [Privilege; 4] = [
        Privilege::JoinChannel,
        Privilege::PublishAudioStream,
        Privilege::PublishVideoStream,
        Privilege::PublishDataStream,
    ];

    /// Wire code used as the key in the token message.
    pub fn code(&self) -> u16 {
        match self {
            Privilege::JoinChannel => 1,
            Privilege::PublishAudioStream => 2,
            Privilege::PublishVideoStream => 3,
            Privilege::PublishDataStream => 4,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }
}

/// Privilege to expiry in seconds (0 = never expires).
pub type Privileges = BTreeMap<Privilege, u32>;

/// Coarse-grained role. Publishers get every publish privilege, subscribers only join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Publisher,
    Subscriber,
}

impl Role {
    pub fn code(&self) -> i64 {
        match self {
            Role::Publisher => 1,
            Role::Subscriber => 2,
        }
    }

    /// The privileges implied by this role, all sharing `privilege_expire`.
    pub fn privileges(&self, privilege_expire: u32) -> Privileges {
        let mut privileges = Privileges::new();
        privileges.insert(Privilege::JoinChannel, privilege_expire);

        if *self == Role::Publisher {
            privileges.insert(Privilege::PublishAudioStream, privilege_expire);
            privileges.insert(Privilege::PublishVideoStream, privilege_expire);
            privileges.insert(Privilege::PublishDataStream, privilege_expire);
        }

        privileges
    }
}

impl TryFrom<i64> for Role {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Role::Publisher),
            2 => Ok(Role::Subscriber),
            _ => Err(token_error(
                TokenErrorKind::InvalidRole,
                "Invalid role. Must be 1 (publisher) or 2 (subscriber)",
            )),
        }
    }
}
