//! Infrastructure adapters. Implement outbound ports.
//!
//! Record store (HTTP or local JSON), conflict check, audit sink, terminal UI.
//! Map errors to DomainError.

pub mod audit;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod persistence;
pub mod ui;
