//! Modules layer - Infrastructure components shared by features
//!
//! Contains the outgoing mail clients and the server-side session store.

pub mod email;
pub mod session;
