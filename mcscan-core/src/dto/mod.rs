//! Data Transfer Objects for the scan backend
//!
//! This module contains the wire shapes sent to and received from the
//! backend's `/scan` endpoints. Everything the backend returns is wrapped
//! in a `{success, data?, message?}` envelope (see [`job::is_rejected`]).

pub mod job;
