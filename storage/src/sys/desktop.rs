use crate::{DirectoryPicker, FolderHandle, SavedDocument, StorageError};
use futures::channel::oneshot;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Show the native folder chooser.
///
/// # Errors
/// Returns an error if the chooser backend fails.
pub async fn pick_directory(
    picker: DirectoryPicker,
) -> Result<Option<FolderHandle>, StorageError> {
    let mut builder = rfd::AsyncFileDialog::new();

    if let Some(title) = &picker.title {
        builder = builder.set_title(title);
    }

    if let Some(location) = picker.location.or_else(dirs::document_dir) {
        builder = builder.set_directory(location);
    }

    let folder = builder.pick_folder().await;

    Ok(folder.map(|f| FolderHandle::from_raw(f.path().to_string_lossy().into_owned())))
}

/// Create a new document under the folder and write the payload into it.
///
/// The blocking filesystem work runs on its own thread so the caller's event
/// loop is never held up.
///
/// # Errors
/// See [`crate::save_document`].
pub async fn save_document(
    folder: &FolderHandle,
    name: &str,
    bytes: &[u8],
) -> Result<SavedDocument, StorageError> {
    let dir = PathBuf::from(folder.as_str());
    let name = name.to_owned();
    let bytes = bytes.to_vec();
    let (tx, rx) = oneshot::channel();

    std::thread::spawn(move || {
        let _ = tx.send(write_new_document(&dir, &name, &bytes));
    });

    rx.await
        .map_err(|_| StorageError::Platform("writer thread panicked or channel closed".into()))?
}

fn write_new_document(dir: &Path, name: &str, bytes: &[u8]) -> Result<SavedDocument, StorageError> {
    if !dir.is_dir() {
        return Err(StorageError::CreateFailed(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    for candidate in candidates(name) {
        let path = dir.join(&candidate);
        let mut file = match File::create_new(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                return Err(StorageError::CreateFailed(e.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes)?;
        file.sync_all()?;
        return Ok(SavedDocument {
            uri: path.to_string_lossy().into_owned(),
            name: candidate,
        });
    }

    Err(StorageError::CreateFailed(format!(
        "no free name derived from {name:?}"
    )))
}

// "report.bin" → "report.bin", "report (1).bin", "report (2).bin", ...
fn candidates(name: &str) -> impl Iterator<Item = String> + '_ {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    std::iter::once(name.to_owned()).chain((1..=9999).map(move |n| match ext {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    }))
}

/// Grant persistence is implicit on desktop platforms; nothing to do.
///
/// # Errors
/// Never fails on desktop.
pub fn persist_grant(_folder: &FolderHandle) -> Result<(), StorageError> {
    Ok(())
}

/// A desktop folder handle is usable when it names a writable directory.
#[must_use]
pub fn has_grant(folder: &FolderHandle) -> bool {
    std::fs::metadata(folder.as_str())
        .is_ok_and(|m| m.is_dir() && !m.permissions().readonly())
}

/// No persisted grants exist on desktop platforms; nothing to release.
pub fn release_grant(_folder: &FolderHandle) {}
