//! Find-and-register client for recycling collection points.
//!
//! The workspace splits along dependency lines:
//!
//! - `coleta-pipeline`: the domain-independent selection pipeline and
//!   query gate.
//! - `coleta-transport`: HTTP clients for the registry, the geographic
//!   directory and position lookup.
//! - `coleta-types`: plain data shared by both.
//!
//! This crate ties them together: [`resolvers`] bind the services to
//! pipeline stages, [`search`] and [`register`] drive the two user-facing
//! flows, and [`cli`] exposes everything as subcommands.

pub mod cli;
pub mod register;
pub mod resolvers;
pub mod search;

pub use register::{RegisterError, RegistrationFlow};
pub use search::{QueryError, SearchFlow};
