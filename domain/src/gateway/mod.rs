//! Clients for the provider REST API.

pub mod cloud_recording;
