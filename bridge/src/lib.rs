//! Method-call bridge exposing scoped-storage operations to a UI layer.
//!
//! The UI layer addresses the bridge by method name over an async channel and
//! gets exactly one [`Reply`] per request. Two methods are implemented:
//!
//! - `getDirectory`: run the native directory chooser; replies with the
//!   granted folder handle, or a `CANCELLED` error if the chooser is
//!   dismissed or times out.
//! - `saveEncryptedFileToUri`: create a document under a granted folder and
//!   write the payload; replies with `"Saved"`, or `SAVE_FAILED` /
//!   `EXCEPTION` errors.
//!
//! Any other method name gets a not-implemented reply.
//!
//! ```rust,no_run
//! use stashkit_bridge::{Bridge, CallId, MethodCall};
//!
//! async fn choose(bridge: &Bridge) {
//!     let reply = bridge.handle(MethodCall::new(CallId(1), "getDirectory")).await;
//!     println!("{reply:?}");
//! }
//! ```

#![warn(missing_docs)]

mod envelope;
mod pending;

pub use envelope::{CallId, Envelope, ErrorCode, MethodCall, Reply, SaveDocumentArgs};

use futures::future::{self, BoxFuture, Either};
use futures::{FutureExt, StreamExt};
use futures_timer::Delay;
use pending::PendingPicks;
use stashkit_storage::{DirectoryPicker, FolderHandle, StorageError};
use std::fmt;
use std::time::Duration;

/// Outcome of a directory pick: a handle, dismissal, or a platform error.
pub type PickOutcome = Result<Option<FolderHandle>, StorageError>;

/// Source of directory picks; the seam between the bridge and the native
/// chooser.
pub trait DirectoryProvider: Send + Sync {
    /// Start a pick and resolve once the user is done with the chooser.
    fn pick_directory(&self) -> BoxFuture<'static, PickOutcome>;
}

/// Default provider: the native chooser from `stashkit-storage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePicker;

impl DirectoryProvider for NativePicker {
    fn pick_directory(&self) -> BoxFuture<'static, PickOutcome> {
        DirectoryPicker::new().pick().boxed()
    }
}

/// Provider for hosts that complete picks themselves through
/// [`Bridge::resolve_pick`]: the returned future never resolves on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeferredPicks;

impl DirectoryProvider for DeferredPicks {
    fn pick_directory(&self) -> BoxFuture<'static, PickOutcome> {
        future::pending::<PickOutcome>().boxed()
    }
}

/// The bridge handler: dispatches named requests and guarantees exactly one
/// reply per request.
pub struct Bridge {
    provider: Box<dyn DirectoryProvider>,
    pending: PendingPicks,
    pick_timeout: Option<Duration>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("pending_picks", &self.pending.len())
            .field("pick_timeout", &self.pick_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// Bridge backed by the native directory chooser, with no pick timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider(NativePicker)
    }

    /// Bridge backed by a custom pick source.
    pub fn with_provider(provider: impl DirectoryProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            pending: PendingPicks::default(),
            pick_timeout: None,
        }
    }

    /// Abandon directory picks that have not resolved after `timeout`. The
    /// caller gets a `CANCELLED` reply and any later completion for the same
    /// id is dropped.
    #[must_use]
    pub fn with_pick_timeout(mut self, timeout: Duration) -> Self {
        self.pick_timeout = Some(timeout);
        self
    }

    /// Number of directory picks currently awaiting completion.
    #[must_use]
    pub fn pending_picks(&self) -> usize {
        self.pending.len()
    }

    /// Resolve an in-flight directory pick from outside the handler. This is
    /// the path a host's own chooser-completion callback takes, paired with
    /// [`DeferredPicks`] as the provider.
    ///
    /// Returns `false` when `id` is not pending (already resolved, timed
    /// out, or never registered); the outcome is dropped in that case.
    pub fn resolve_pick(&self, id: CallId, outcome: PickOutcome) -> bool {
        self.pending.resolve(id, outcome)
    }

    /// Handle one request and produce its reply.
    pub async fn handle(&self, call: MethodCall) -> Reply {
        log::debug!("handling {:?} (id {})", call.method, call.id);
        match call.method.as_str() {
            "getDirectory" => self.get_directory(call.id).await,
            "saveEncryptedFileToUri" => save_file(call.args).await,
            other => {
                log::warn!("unknown method {other:?}");
                Reply::NotImplemented
            }
        }
    }

    /// Serve requests from a channel until it closes, replying to each
    /// envelope exactly once. Requests are handled concurrently on the
    /// calling task, so an open chooser never holds up a save.
    pub async fn serve(&self, requests: async_channel::Receiver<Envelope>) {
        requests
            .for_each_concurrent(None, |envelope| async move {
                let reply = self.handle(envelope.call).await;
                if envelope.reply_to.send(reply).is_err() {
                    log::warn!("reply dropped: requester went away");
                }
            })
            .await;
    }

    async fn get_directory(&self, id: CallId) -> Reply {
        let Ok(rx) = self.pending.register(id) else {
            return Reply::error(
                ErrorCode::Exception,
                format!("request id {id} is already in flight"),
            );
        };

        let drive = async {
            let outcome = self.provider.pick_directory().await;
            self.pending.resolve(id, outcome);
        };
        let wait = async {
            match rx.await {
                Ok(Ok(Some(folder))) => Reply::success(folder.as_str()),
                Ok(Ok(None)) => Reply::error(ErrorCode::Cancelled, "directory chooser dismissed"),
                Ok(Err(e)) => Reply::error(ErrorCode::Exception, e.to_string()),
                Err(_) => Reply::error(ErrorCode::Cancelled, "request abandoned"),
            }
        };

        // The reply always comes out of the pending slot, whether the
        // provider or an external completion resolves it.
        futures::pin_mut!(drive, wait);
        let resolved = async {
            match future::select(wait, drive).await {
                Either::Left((reply, _)) => reply,
                Either::Right(((), wait)) => wait.await,
            }
        };

        match self.pick_timeout {
            None => resolved.await,
            Some(timeout) => {
                let delay = Delay::new(timeout);
                futures::pin_mut!(resolved, delay);
                match future::select(resolved, delay).await {
                    Either::Left((reply, _)) => reply,
                    Either::Right(((), _)) => {
                        self.pending.abandon(id);
                        log::warn!("directory pick {id} timed out");
                        Reply::error(ErrorCode::Cancelled, "directory chooser timed out")
                    }
                }
            }
        }
    }
}

async fn save_file(args: serde_json::Value) -> Reply {
    let args: SaveDocumentArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => {
            return Reply::error(
                ErrorCode::Exception,
                format!("malformed saveEncryptedFileToUri arguments: {e}"),
            );
        }
    };

    let folder = FolderHandle::from_raw(args.uri);
    match stashkit_storage::save_document(&folder, &args.file_name, &args.bytes).await {
        Ok(saved) => {
            log::debug!("stored {:?} as {:?}", args.file_name, saved.name);
            Reply::success("Saved")
        }
        Err(e @ StorageError::CreateFailed(_)) => {
            log::warn!("save failed: {e}");
            Reply::error(ErrorCode::SaveFailed, "Failed to write file")
        }
        Err(e) => Reply::error(ErrorCode::Exception, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use std::sync::Arc;

    struct PicksFolder(String);

    impl DirectoryProvider for PicksFolder {
        fn pick_directory(&self) -> BoxFuture<'static, PickOutcome> {
            let handle = FolderHandle::from_raw(self.0.clone());
            future::ready(Ok(Some(handle))).boxed()
        }
    }

    struct Dismisses;

    impl DirectoryProvider for Dismisses {
        fn pick_directory(&self) -> BoxFuture<'static, PickOutcome> {
            future::ready(Ok(None)).boxed()
        }
    }

    struct ChooserFails;

    impl DirectoryProvider for ChooserFails {
        fn pick_directory(&self) -> BoxFuture<'static, PickOutcome> {
            future::ready(Err(StorageError::Platform("chooser exploded".into()))).boxed()
        }
    }

    fn save_args(dir: &Path, name: &str, bytes: &[u8]) -> serde_json::Value {
        json!({ "uri": dir.to_string_lossy(), "fileName": name, "bytes": bytes })
    }

    fn save_call(id: u64, args: serde_json::Value) -> MethodCall {
        MethodCall::new(CallId(id), "saveEncryptedFileToUri").with_args(args)
    }

    #[tokio::test]
    async fn unknown_method_is_not_implemented() {
        let bridge = Bridge::new();
        let reply = bridge.handle(MethodCall::new(CallId(1), "shredDirectory")).await;
        assert_eq!(reply, Reply::NotImplemented);
    }

    #[tokio::test]
    async fn save_writes_payload_and_replies_saved() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Bridge::new();

        let reply = bridge
            .handle(save_call(1, save_args(dir.path(), "blob.bin", &[1, 2, 3])))
            .await;

        assert_eq!(reply, Reply::success("Saved"));
        assert_eq!(
            std::fs::read(dir.path().join("blob.bin")).unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn zero_length_payload_still_replies_saved() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Bridge::new();

        let reply = bridge
            .handle(save_call(1, save_args(dir.path(), "empty.bin", &[])))
            .await;

        assert_eq!(reply, Reply::success("Saved"));
        assert_eq!(
            std::fs::metadata(dir.path().join("empty.bin")).unwrap().len(),
            0
        );
    }

    #[tokio::test]
    async fn repeated_name_keeps_both_documents_intact() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Bridge::new();

        let first = bridge
            .handle(save_call(1, save_args(dir.path(), "doc.bin", b"first")))
            .await;
        let second = bridge
            .handle(save_call(2, save_args(dir.path(), "doc.bin", b"second")))
            .await;

        assert_eq!(first, Reply::success("Saved"));
        assert_eq!(second, Reply::success("Saved"));
        assert_eq!(std::fs::read(dir.path().join("doc.bin")).unwrap(), b"first");
        assert_eq!(
            std::fs::read(dir.path().join("doc (1).bin")).unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn malformed_save_arguments_are_exceptions() {
        let bridge = Bridge::new();
        let cases = [
            serde_json::Value::Null,
            json!({}),
            json!({ "uri": "/tmp" }),
            json!({ "uri": "/tmp", "fileName": "x.bin" }),
            json!({ "fileName": "x.bin", "bytes": [1] }),
            json!({ "uri": 7, "fileName": "x.bin", "bytes": [1] }),
            json!({ "uri": "/tmp", "fileName": "x.bin", "bytes": "nope" }),
        ];

        for args in cases {
            let reply = bridge.handle(save_call(1, args.clone())).await;
            assert!(
                matches!(
                    reply,
                    Reply::Error {
                        code: ErrorCode::Exception,
                        ..
                    }
                ),
                "args {args} got {reply:?}"
            );
        }
    }

    #[tokio::test]
    async fn traversal_names_are_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Bridge::new();

        let reply = bridge
            .handle(save_call(1, save_args(dir.path(), "../escape.bin", b"x")))
            .await;

        assert!(matches!(
            reply,
            Reply::Error {
                code: ErrorCode::Exception,
                ..
            }
        ));
        assert!(
            !dir.path()
                .parent()
                .unwrap()
                .join("escape.bin")
                .exists()
        );
    }

    #[tokio::test]
    async fn missing_folder_is_save_failed() {
        let bridge = Bridge::new();
        let args = json!({
            "uri": "/definitely/not/a/real/directory",
            "fileName": "x.bin",
            "bytes": [1, 2, 3],
        });

        let reply = bridge.handle(save_call(1, args)).await;

        assert_eq!(
            reply,
            Reply::error(ErrorCode::SaveFailed, "Failed to write file")
        );
    }

    #[tokio::test]
    async fn picked_handle_accepts_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Bridge::with_provider(PicksFolder(
            dir.path().to_string_lossy().into_owned(),
        ));

        let reply = bridge.handle(MethodCall::new(CallId(1), "getDirectory")).await;
        let Reply::Success { value } = reply else {
            panic!("pick failed: {reply:?}");
        };
        let uri = value.as_str().unwrap().to_owned();

        let reply = bridge
            .handle(save_call(2, json!({ "uri": uri, "fileName": "x.bin", "bytes": [0] })))
            .await;
        assert_eq!(reply, Reply::success("Saved"));
        assert!(dir.path().join("x.bin").exists());
    }

    #[tokio::test]
    async fn dismissed_chooser_is_cancelled() {
        let bridge = Bridge::with_provider(Dismisses);
        let reply = bridge.handle(MethodCall::new(CallId(1), "getDirectory")).await;
        assert_eq!(
            reply,
            Reply::error(ErrorCode::Cancelled, "directory chooser dismissed")
        );
        assert_eq!(bridge.pending_picks(), 0);
    }

    #[tokio::test]
    async fn chooser_failure_is_an_exception() {
        let bridge = Bridge::with_provider(ChooserFails);
        let reply = bridge.handle(MethodCall::new(CallId(1), "getDirectory")).await;
        assert!(matches!(
            reply,
            Reply::Error {
                code: ErrorCode::Exception,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn concurrent_picks_resolve_independently() {
        let bridge = Arc::new(Bridge::with_provider(DeferredPicks));

        let first = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.handle(MethodCall::new(CallId(1), "getDirectory")).await }
        });
        let second = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.handle(MethodCall::new(CallId(2), "getDirectory")).await }
        });

        // Resolve out of order once both picks have registered.
        while !bridge.resolve_pick(CallId(2), Ok(Some(FolderHandle::from_raw("/b")))) {
            tokio::task::yield_now().await;
        }
        while !bridge.resolve_pick(CallId(1), Ok(Some(FolderHandle::from_raw("/a")))) {
            tokio::task::yield_now().await;
        }

        assert_eq!(first.await.unwrap(), Reply::success("/a"));
        assert_eq!(second.await.unwrap(), Reply::success("/b"));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_without_disturbing_the_first() {
        let bridge = Arc::new(Bridge::with_provider(DeferredPicks));

        let first = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.handle(MethodCall::new(CallId(7), "getDirectory")).await }
        });
        while bridge.pending_picks() == 0 {
            tokio::task::yield_now().await;
        }

        let dup = bridge.handle(MethodCall::new(CallId(7), "getDirectory")).await;
        assert!(matches!(
            dup,
            Reply::Error {
                code: ErrorCode::Exception,
                ..
            }
        ));

        assert!(bridge.resolve_pick(CallId(7), Ok(Some(FolderHandle::from_raw("/kept")))));
        assert_eq!(first.await.unwrap(), Reply::success("/kept"));
    }

    #[tokio::test]
    async fn abandoned_pick_times_out_as_cancelled() {
        let bridge = Bridge::with_provider(DeferredPicks)
            .with_pick_timeout(Duration::from_millis(50));

        let reply = bridge.handle(MethodCall::new(CallId(1), "getDirectory")).await;

        assert_eq!(
            reply,
            Reply::error(ErrorCode::Cancelled, "directory chooser timed out")
        );
        // A late completion finds nothing to resolve.
        assert!(!bridge.resolve_pick(CallId(1), Ok(None)));
        assert_eq!(bridge.pending_picks(), 0);
    }

    #[tokio::test]
    async fn serve_replies_to_each_envelope_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(Bridge::new());
        let (tx, rx) = async_channel::unbounded();

        let server = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.serve(rx).await }
        });

        let (env1, rx1) = Envelope::new(MethodCall::new(CallId(1), "shredDirectory"));
        let (env2, rx2) = Envelope::new(save_call(2, save_args(dir.path(), "s.bin", &[7])));
        tx.send(env1).await.unwrap();
        tx.send(env2).await.unwrap();

        assert_eq!(rx1.await.unwrap(), Reply::NotImplemented);
        assert_eq!(rx2.await.unwrap(), Reply::success("Saved"));

        drop(tx);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn open_chooser_does_not_block_saves() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(Bridge::with_provider(DeferredPicks));
        let (tx, rx) = async_channel::unbounded();

        let server = tokio::spawn({
            let bridge = bridge.clone();
            async move { bridge.serve(rx).await }
        });

        let (pick, pick_rx) = Envelope::new(MethodCall::new(CallId(1), "getDirectory"));
        let (save, save_rx) = Envelope::new(save_call(2, save_args(dir.path(), "s.bin", &[7])));
        tx.send(pick).await.unwrap();
        tx.send(save).await.unwrap();

        // The save completes while the pick is still waiting on the user.
        assert_eq!(save_rx.await.unwrap(), Reply::success("Saved"));
        assert_eq!(bridge.pending_picks(), 1);

        assert!(bridge.resolve_pick(CallId(1), Ok(Some(FolderHandle::from_raw("/picked")))));
        assert_eq!(pick_rx.await.unwrap(), Reply::success("/picked"));

        drop(tx);
        server.await.unwrap();
    }
}
