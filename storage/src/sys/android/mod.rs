use crate::{DirectoryPicker, FolderHandle, SavedDocument, StorageError};
use jni::JNIEnv;
use jni::objects::{GlobalRef, JObject, JValue};
use std::sync::OnceLock;

/// Embedded DEX bytecode containing the StorageHelper class.
static DEX_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/classes.dex"));

/// Cached class loader for the embedded DEX.
static CLASS_LOADER: OnceLock<GlobalRef> = OnceLock::new();

/// Initialize the DEX class loader. Must be called with a valid Context.
pub fn init_with_context(env: &mut JNIEnv, context: &JObject) -> Result<(), String> {
    if CLASS_LOADER.get().is_some() {
        return Ok(());
    }

    let cache_dir = env
        .call_method(context, "getCacheDir", "()Ljava/io/File;", &[])
        .and_then(|v| v.l())
        .map_err(|e| format!("JNI error getCacheDir: {e}"))?;

    let cache_path = env
        .call_method(&cache_dir, "getAbsolutePath", "()Ljava/lang/String;", &[])
        .and_then(|v| v.l())
        .map_err(|e| format!("JNI error getAbsolutePath: {e}"))?;

    let dex_path = format!(
        "{}/stashkit_storage.dex",
        env.get_string((&cache_path).into())
            .map_err(|e| format!("JNI error get_string: {e}"))?
            .to_str()
            .map_err(|e| format!("JNI error to_str: {e}"))?
    );

    std::fs::write(&dex_path, DEX_BYTES).map_err(|e| format!("Failed to write DEX: {e}"))?;

    let dex_path_jstring = env
        .new_string(&dex_path)
        .map_err(|e| format!("JNI error new_string: {e}"))?;

    let parent_loader = env
        .call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .and_then(|v| v.l())
        .map_err(|e| format!("JNI error getClassLoader: {e}"))?;

    let dex_class_loader_class = env
        .find_class("dalvik/system/DexClassLoader")
        .map_err(|e| format!("JNI error find_class: {e}"))?;

    let class_loader = env
        .new_object(
            dex_class_loader_class,
            "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/ClassLoader;)V",
            &[
                JValue::Object(&dex_path_jstring),
                JValue::Object(&cache_path),
                JValue::Object(&JObject::null()),
                JValue::Object(&parent_loader),
            ],
        )
        .map_err(|e| format!("JNI error new_object: {e}"))?;

    let global_ref = env
        .new_global_ref(class_loader)
        .map_err(|e| format!("JNI error new_global_ref: {e}"))?;

    let _ = CLASS_LOADER.set(global_ref);
    Ok(())
}

fn get_helper_class<'a>(env: &mut JNIEnv<'a>) -> Result<jni::objects::JClass<'a>, String> {
    let class_loader = CLASS_LOADER
        .get()
        .ok_or_else(|| "Class loader not initialized".to_string())?;

    let helper_class_name = env
        .new_string("stashkit.storage.StorageHelper")
        .map_err(|e| format!("JNI error new_string name: {e}"))?;

    let helper_class = env
        .call_method(
            class_loader.as_obj(),
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&helper_class_name)],
        )
        .and_then(|v| v.l())
        .map_err(|e| format!("JNI error loadClass: {e}"))?;

    Ok(helper_class.into())
}

/// Run the document-tree chooser and persist the grant for the picked folder.
///
/// Blocks the calling thread until the chooser finishes; call from a
/// background thread, never from the UI thread.
pub fn pick_directory_with_context(
    env: &mut JNIEnv,
    context: &JObject,
    _picker: &DirectoryPicker,
) -> Result<Option<FolderHandle>, StorageError> {
    init_with_context(env, context).map_err(StorageError::Platform)?;
    let helper_jclass = get_helper_class(env).map_err(StorageError::Platform)?;

    let result = env
        .call_static_method(
            helper_jclass,
            "pickDirectory",
            "(Landroid/content/Context;)Ljava/lang/String;",
            &[JValue::Object(context)],
        )
        .map_err(|e| StorageError::Platform(format!("JNI error pickDirectory: {e}")))?
        .l()
        .map_err(|e| StorageError::Platform(format!("JNI error pickDirectory return: {e}")))?;

    if result.is_null() {
        Ok(None)
    } else {
        let uri = env
            .get_string((&result).into())
            .map_err(|e| StorageError::Platform(format!("JNI error get_string: {e}")))?;
        Ok(Some(FolderHandle::from_raw(String::from(uri))))
    }
}

/// Create a new document under the granted tree and write the payload.
///
/// The provider uniquifies colliding names itself; the stored name is read
/// back from the created document.
pub fn save_document_with_context(
    env: &mut JNIEnv,
    context: &JObject,
    folder: &FolderHandle,
    name: &str,
    bytes: &[u8],
) -> Result<SavedDocument, StorageError> {
    init_with_context(env, context).map_err(StorageError::Platform)?;
    let helper_jclass = get_helper_class(env).map_err(StorageError::Platform)?;

    let tree = env
        .new_string(folder.as_str())
        .map_err(|e| StorageError::Platform(format!("JNI error new_string tree: {e}")))?;
    let jname = env
        .new_string(name)
        .map_err(|e| StorageError::Platform(format!("JNI error new_string name: {e}")))?;
    let mime = env
        .new_string("application/octet-stream")
        .map_err(|e| StorageError::Platform(format!("JNI error new_string mime: {e}")))?;

    let document = env
        .call_static_method(
            &helper_jclass,
            "createDocument",
            "(Landroid/content/Context;Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
            &[
                JValue::Object(context),
                JValue::Object(&tree),
                JValue::Object(&jname),
                JValue::Object(&mime),
            ],
        )
        .map_err(|e| StorageError::Platform(format!("JNI error createDocument: {e}")))?
        .l()
        .map_err(|e| StorageError::Platform(format!("JNI error createDocument return: {e}")))?;

    if document.is_null() {
        return Err(StorageError::CreateFailed(
            "provider returned no document".to_string(),
        ));
    }

    let payload = env
        .byte_array_from_slice(bytes)
        .map_err(|e| StorageError::Platform(format!("JNI error byte_array: {e}")))?;

    let written = env
        .call_static_method(
            &helper_jclass,
            "writeDocument",
            "(Landroid/content/Context;Ljava/lang/String;[B)Z",
            &[
                JValue::Object(context),
                JValue::Object(&document),
                JValue::Object(&payload),
            ],
        )
        .map_err(|e| StorageError::Platform(format!("JNI error writeDocument: {e}")))?
        .z()
        .map_err(|e| StorageError::Platform(format!("JNI error writeDocument return: {e}")))?;

    if !written {
        return Err(StorageError::CreateFailed(
            "output stream unavailable".to_string(),
        ));
    }

    let uri: String = env
        .get_string((&document).into())
        .map_err(|e| StorageError::Platform(format!("JNI error get_string uri: {e}")))?
        .into();

    let stored_name = env
        .call_static_method(
            &helper_jclass,
            "displayName",
            "(Landroid/content/Context;Ljava/lang/String;)Ljava/lang/String;",
            &[JValue::Object(context), JValue::Object(&document)],
        )
        .and_then(|v| v.l())
        .ok()
        .filter(|obj| !obj.is_null())
        .and_then(|obj| env.get_string((&obj).into()).ok().map(String::from))
        .unwrap_or_else(|| name.to_owned());

    Ok(SavedDocument {
        uri,
        name: stored_name,
    })
}

/// Persist the read+write grant for a previously picked tree.
pub fn persist_grant_with_context(
    env: &mut JNIEnv,
    context: &JObject,
    folder: &FolderHandle,
) -> Result<(), StorageError> {
    init_with_context(env, context).map_err(StorageError::Platform)?;
    let helper_jclass = get_helper_class(env).map_err(StorageError::Platform)?;

    let uri = env
        .new_string(folder.as_str())
        .map_err(|e| StorageError::Platform(format!("JNI error new_string: {e}")))?;

    env.call_static_method(
        helper_jclass,
        "persistGrant",
        "(Landroid/content/Context;Ljava/lang/String;)V",
        &[JValue::Object(context), JValue::Object(&uri)],
    )
    .map_err(|e| StorageError::Platform(format!("JNI error persistGrant: {e}")))?;

    Ok(())
}

/// Whether a persisted read+write grant covers the tree.
pub fn has_grant_with_context(env: &mut JNIEnv, context: &JObject, folder: &FolderHandle) -> bool {
    let Ok(()) = init_with_context(env, context) else {
        return false;
    };
    let Ok(helper_jclass) = get_helper_class(env) else {
        return false;
    };
    let Ok(uri) = env.new_string(folder.as_str()) else {
        return false;
    };

    env.call_static_method(
        helper_jclass,
        "hasGrant",
        "(Landroid/content/Context;Ljava/lang/String;)Z",
        &[JValue::Object(context), JValue::Object(&uri)],
    )
    .and_then(|v| v.z())
    .unwrap_or(false)
}

/// Release the persisted grant for the tree.
pub fn release_grant_with_context(env: &mut JNIEnv, context: &JObject, folder: &FolderHandle) {
    let Ok(()) = init_with_context(env, context) else {
        return;
    };
    let Ok(helper_jclass) = get_helper_class(env) else {
        return;
    };
    let Ok(uri) = env.new_string(folder.as_str()) else {
        return;
    };

    let _ = env.call_static_method(
        helper_jclass,
        "releaseGrant",
        "(Landroid/content/Context;Ljava/lang/String;)V",
        &[JValue::Object(context), JValue::Object(&uri)],
    );
}

// Public API stubs calling for context
/// Android requires a JNI context; use [`pick_directory_with_context`].
pub async fn pick_directory(_: DirectoryPicker) -> Result<Option<FolderHandle>, StorageError> {
    Err(StorageError::Platform(
        "Android: use pick_directory_with_context() with JNIEnv and Context".into(),
    ))
}

/// Android requires a JNI context; use [`save_document_with_context`].
pub async fn save_document(
    _: &FolderHandle,
    _: &str,
    _: &[u8],
) -> Result<SavedDocument, StorageError> {
    Err(StorageError::Platform(
        "Android: use save_document_with_context() with JNIEnv and Context".into(),
    ))
}

/// Android requires a JNI context; use [`persist_grant_with_context`].
pub fn persist_grant(_: &FolderHandle) -> Result<(), StorageError> {
    Err(StorageError::Platform(
        "Android: use persist_grant_with_context() with JNIEnv and Context".into(),
    ))
}

/// Android requires a JNI context; use [`has_grant_with_context`].
pub fn has_grant(_: &FolderHandle) -> bool {
    false
}

/// Android requires a JNI context; use [`release_grant_with_context`].
pub fn release_grant(_: &FolderHandle) {}
