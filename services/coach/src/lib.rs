//! MBTI Coach Service Crate
//!
//! Configuration, command-line parsing and wiring for the interactive coach.
//! The `mbti-coach` binary is a thin wrapper around this library.

pub mod app;
pub mod cli;
pub mod config;
