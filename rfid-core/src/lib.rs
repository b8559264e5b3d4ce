//! Core types for the RFID access node
//!
//! This crate provides the error type shared by every layer of the node:
//! protocol codec, session security, transport and device control.

pub mod error;

pub use error::{AccessError, AccessResult};
