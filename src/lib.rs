//! tutor-slots: availability scheduling and conflict detection for a private-tutoring
//! dashboard, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
