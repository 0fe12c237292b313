//! Build script for stashkit-storage.

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap();

    if target_os == "android" {
        stashkit_build::build_kotlin(&["src/sys/android/StorageHelper.kt"]);
    }
}
