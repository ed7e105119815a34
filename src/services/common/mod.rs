//! Common utilities and abstractions for services

/// Published values with consistent snapshot reads
pub mod property;

pub use property::Property;
