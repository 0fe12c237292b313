//! Cross-platform folder grants and document writes.
//!
//! This crate covers the two native storage flows an application needs to
//! save files where the user asked for them: the system directory chooser,
//! which yields a durable permission-backed [`FolderHandle`], and document
//! creation under such a handle.

#![warn(missing_docs)]

mod error;
/// Platform-specific implementations.
pub mod sys;

pub use error::StorageError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An opaque reference to a directory the user granted access to.
///
/// Desktop backends store an absolute path; the Android backend stores a
/// `content://` tree URI. The handle stays valid for as long as the platform
/// keeps the permission grant alive, and must be supplied back verbatim on
/// every write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderHandle(String);

impl FolderHandle {
    /// Wrap a raw platform handle string.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw platform handle string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document created under a granted folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDocument {
    /// Platform handle of the created document.
    pub uri: String,
    /// The name the document was stored under. Differs from the requested
    /// name when that name was already taken.
    pub name: String,
}

/// The native directory chooser.
#[derive(Debug, Clone)]
pub struct DirectoryPicker {
    /// Title of the chooser window, where the platform shows one.
    pub title: Option<String>,
    /// Starting directory, where the platform chooser honors one. Defaults
    /// to the platform documents directory.
    pub location: Option<PathBuf>,
}

impl DirectoryPicker {
    /// Create a new directory chooser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: None,
            location: None,
        }
    }

    /// Set the title of the chooser.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the starting location.
    #[must_use]
    pub fn set_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Show the chooser and wait for the user to pick a directory.
    ///
    /// Resolves to `Ok(Some(handle))` once the user confirms a directory and
    /// the read+write grant for it has been persisted, or `Ok(None)` if the
    /// user dismisses the chooser.
    ///
    /// # Errors
    /// Returns an error if the native chooser fails or is not supported on
    /// this platform.
    pub async fn pick(self) -> Result<Option<FolderHandle>, StorageError> {
        sys::pick_directory(self).await
    }
}

impl Default for DirectoryPicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new document named `name` under `folder` and write the whole
/// payload into it.
///
/// The document is always new: an existing `name` is left intact and the
/// payload lands under a uniquified `stem (n).ext` name instead, matching the
/// Android document-provider convention. The name actually used is reported
/// in the returned [`SavedDocument`]. A zero-length payload produces a
/// zero-length document.
///
/// # Errors
/// - [`StorageError::InvalidName`] if `name` is empty, reserved, or contains
///   a path separator or NUL.
/// - [`StorageError::CreateFailed`] if the document or its output stream
///   could not be obtained.
/// - [`StorageError::Io`] if writing the payload fails midway. There is no
///   partial-write recovery.
pub async fn save_document(
    folder: &FolderHandle,
    name: &str,
    bytes: &[u8],
) -> Result<SavedDocument, StorageError> {
    validate_file_name(name)?;
    log::debug!("saving {} bytes as {name:?} under {folder}", bytes.len());
    sys::save_document(folder, name, bytes).await
}

/// Re-persist the platform permission grant for `folder`.
///
/// The chooser already persists the grant on selection; call this when a
/// handle arrives from elsewhere (e.g. restored application state).
///
/// # Errors
/// Returns an error if the platform refuses to persist the grant.
pub fn persist_grant(folder: &FolderHandle) -> Result<(), StorageError> {
    sys::persist_grant(folder)
}

/// Whether `folder` is currently backed by a usable read+write grant.
#[must_use]
pub fn has_grant(folder: &FolderHandle) -> bool {
    sys::has_grant(folder)
}

/// Release the platform permission grant for `folder`.
pub fn release_grant(folder: &FolderHandle) {
    sys::release_grant(folder);
}

fn validate_file_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("name is empty".into()));
    }
    if name == "." || name == ".." {
        return Err(StorageError::InvalidName(format!("{name:?} is reserved")));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(StorageError::InvalidName(format!(
            "{name:?} contains a path separator or NUL"
        )));
    }
    Ok(())
}
