#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod desktop;
#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub use desktop::{has_grant, persist_grant, pick_directory, release_grant, save_document};

#[cfg(target_os = "android")]
pub mod android;
#[cfg(target_os = "android")]
pub use android::{has_grant, persist_grant, pick_directory, release_grant, save_document};

#[cfg(target_os = "ios")]
/// iOS has no directory-chooser backend yet.
pub async fn pick_directory(
    _: crate::DirectoryPicker,
) -> Result<Option<crate::FolderHandle>, crate::StorageError> {
    Err(crate::StorageError::NotSupported(
        "directory chooser not supported on iOS yet".to_string(),
    ))
}

#[cfg(target_os = "ios")]
/// iOS has no document-write backend yet.
pub async fn save_document(
    _: &crate::FolderHandle,
    _: &str,
    _: &[u8],
) -> Result<crate::SavedDocument, crate::StorageError> {
    Err(crate::StorageError::NotSupported(
        "document writes not supported on iOS yet".to_string(),
    ))
}

#[cfg(target_os = "ios")]
/// iOS has no grant backend yet.
pub fn persist_grant(_: &crate::FolderHandle) -> Result<(), crate::StorageError> {
    Err(crate::StorageError::NotSupported(
        "grants not supported on iOS yet".to_string(),
    ))
}

#[cfg(target_os = "ios")]
/// iOS has no grant backend yet.
pub fn has_grant(_: &crate::FolderHandle) -> bool {
    false
}

#[cfg(target_os = "ios")]
/// iOS has no grant backend yet.
pub fn release_grant(_: &crate::FolderHandle) {}
