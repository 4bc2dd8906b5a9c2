//! stitchbase - access-control and file-delivery core for a self-hostable
//! sewing-pattern library

pub mod access;
pub mod config;
pub mod delivery;
pub mod http_server;
pub mod patterns;
pub mod storage;
