//! # Stashkit
//!
//! A scoped-storage bridge for building WaterUI applications that save user
//! files into a folder the user has explicitly granted access to.
//!
//! Stashkit covers two native flows and the plumbing between them and the UI
//! layer: the system directory chooser (returning a durable, permission-backed
//! folder handle) and document creation under such a handle, plus an
//! asynchronous request/reply bridge the UI layer drives by method name.
//!
//! ## Features
//!
//! Stashkit is modular. Enable only the features you need to keep your
//! dependencies minimal.
//!
//! - `storage`: Folder handles, the native directory chooser, document
//!   writes, and permission grants.
//! - `bridge`: The method-call bridge that exposes the storage operations to
//!   a UI layer over an async channel.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! stashkit = { version = "0.1", features = ["full"] }
//! ```
//!
//! ```rust,ignore
//! use stashkit::storage::DirectoryPicker;
//!
//! async fn choose_folder() {
//!     if let Ok(Some(folder)) = DirectoryPicker::new().pick().await {
//!         println!("granted: {folder}");
//!     }
//! }
//! ```

#[cfg(feature = "bridge")]
pub use stashkit_bridge as bridge;

#[cfg(feature = "storage")]
pub use stashkit_storage as storage;
