//! # File Delivery
//!
//! Authorized download path: pattern resolution, read-right enforcement,
//! content sniffing and header-safe filenames.

pub mod service;
pub mod sniff;

pub use service::{download_file_name, DeliveryError, FileDeliveryService, FileDownload};
pub use sniff::{sniff, SniffedType};
