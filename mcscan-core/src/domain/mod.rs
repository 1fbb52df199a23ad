//! Core domain types
//!
//! This module contains the domain structures shared by the client, the
//! orchestration layer and the CLI. They describe a scan job as seen from
//! the client side; the backend worker that executes the scan is never
//! modelled here.

pub mod job;
