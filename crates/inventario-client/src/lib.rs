//! Client for the inventory REST backend.
//!
//! Reads go through a [`Dispatcher`] that tries each request strategy of the
//! configured [`RuntimeMode`] in order; writes are sent once.  Listings can
//! fall back to bundled demo data when the backend is unreachable.

pub mod client;
pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod response;

pub use client::{InventoryClient, Listing, ProbeReport, validate_create, validate_delete, validate_update};
pub use config::{ApiConfig, INVENTORY_ENDPOINT, RuntimeMode, item_endpoint, join_path};
pub use dispatcher::{ApiRequest, ApiResponse, Dispatcher, ReqwestTransport, Strategy, Transport};
pub use error::ClientError;
pub use response::handle_response;
