//! Shared demo exercising the stashkit bridge end to end.

use serde_json::json;
use stashkit_bridge::{Bridge, CallId, Envelope, MethodCall, Reply};

/// Run the demo: pick a folder, then save a small payload into it.
pub async fn run() {
    println!("Running Bridge Demo...");

    let bridge = Bridge::new();
    let (tx, rx) = async_channel::unbounded();

    let client = async move {
        let (pick, pick_reply) = Envelope::new(MethodCall::new(CallId(1), "getDirectory"));
        if tx.send(pick).await.is_err() {
            return;
        }

        let Ok(Reply::Success { value }) = pick_reply.await else {
            println!("no folder granted");
            return;
        };
        println!("granted folder: {value}");

        let args = json!({
            "uri": value,
            "fileName": "stashkit-demo.bin",
            "bytes": b"hello from stashkit".to_vec(),
        });
        let (save, save_reply) = Envelope::new(
            MethodCall::new(CallId(2), "saveEncryptedFileToUri").with_args(args),
        );
        if tx.send(save).await.is_err() {
            return;
        }

        println!("save reply: {:?}", save_reply.await);
    };

    futures::join!(bridge.serve(rx), client);
}
