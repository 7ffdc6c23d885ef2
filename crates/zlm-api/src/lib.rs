//! Client for the ZLMediaKit HTTP administrative API.
//!
//! Every response shares one envelope (`code`, `msg`, `data`); the payload
//! shape varies per endpoint. [`decode_and_validate`] checks the status code
//! before handing out the payload, and [`ZlmClient`] performs the
//! authenticated requests.

pub mod client;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod models;

pub use client::{ClientConfig, Fetcher, SECRET_HEADER, ZlmClient, install_rustls_provider, mask_secret};
pub use endpoint::Endpoint;
pub use envelope::{ApiResponse, ApiStatus, SUCCESS_CODE, decode_and_validate};
pub use error::ApiError;
