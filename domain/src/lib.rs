//! Platform-facing RTC operations built on `rtc-auth`.
//!
//! [`rtc::RtcSdk`] is the entry point: it holds the configured identity and
//! secrets and hands out tokens, webhook parsing and cloud recording control.

pub mod error;
pub mod gateway;
pub mod rtc;
