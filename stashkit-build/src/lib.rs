//! Shared build utilities for stashkit crates.
//!
//! This crate provides common functionality for:
//! - Android: Kotlin → DEX compilation
//!
//! # Usage
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap();
//!
//!     if target_os == "android" {
//!         stashkit_build::build_kotlin(&["src/sys/android/Helper.kt"]);
//!     }
//! }
//! ```

#![warn(missing_docs)]

mod android;

pub use android::{AndroidConfig, build_kotlin, find_android_jar, find_d8_jar};
