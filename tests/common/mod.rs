#![allow(dead_code)]
//! Shared utilities for the integration tests.
//!
//! - `mocks`: canned payloads in the services' wire shapes.
//! - `helpers`: flow and pipeline construction over a scripted transport.

pub mod helpers;
pub mod mocks;
