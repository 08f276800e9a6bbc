//! HTTP middleware stack and request extractors.

pub mod cors;
pub mod session;
pub mod trace;
