//! Shared helpers for socket-bound integration tests.

pub mod socket_guard;
