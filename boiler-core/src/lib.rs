#![no_std]

// Shared logic for the four-channel boiler controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware access goes through the `Platform` trait so
// the whole super-loop can be driven deterministically from tests.

pub mod channel;
pub mod config;
pub mod controller;
pub mod input;
pub mod platform;
pub mod scheduler;
pub mod serial;
pub mod time;
