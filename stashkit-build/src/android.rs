//! Android platform build utilities.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Configuration for Kotlin → DEX compilation.
#[derive(Debug, Clone)]
pub struct AndroidConfig {
    /// Minimum Android API level passed to `d8`.
    pub min_api: u32,
    /// Extra classpath entries appended after `android.jar`.
    pub classpath: Vec<PathBuf>,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            min_api: 24,
            classpath: Vec::new(),
        }
    }
}

impl AndroidConfig {
    /// Compile the given Kotlin sources (paths relative to the crate
    /// manifest) into `classes.dex` in `OUT_DIR`.
    ///
    /// # Panics
    /// Panics if the Android SDK, `kotlinc`, or `java` cannot be found, or if
    /// either compilation step fails. Build scripts report failure by
    /// panicking.
    pub fn build(&self, sources: &[&str]) {
        let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
        let manifest_dir =
            PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));

        for source in sources {
            println!("cargo:rerun-if-changed={source}");
        }

        let android_jar =
            find_android_jar().expect("android.jar not found: set ANDROID_HOME or ANDROID_SDK_ROOT");
        let d8_jar = find_d8_jar().expect("d8.jar not found: install Android build-tools");

        let sep = if cfg!(windows) { ';' } else { ':' };
        let mut classpath = android_jar.display().to_string();
        for extra in &self.classpath {
            classpath.push(sep);
            classpath.push_str(&extra.display().to_string());
        }

        // 1. Kotlin → JVM bytecode
        let classes_dir = out_dir.join("classes");
        std::fs::create_dir_all(&classes_dir).expect("failed to create classes dir");

        let mut kotlinc = Command::new("kotlinc");
        kotlinc
            .arg("-classpath")
            .arg(&classpath)
            .arg("-d")
            .arg(&classes_dir);
        for source in sources {
            kotlinc.arg(manifest_dir.join(source));
        }
        let output = kotlinc.output().expect("failed to run kotlinc (is it on PATH?)");
        assert!(
            output.status.success(),
            "kotlinc failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );

        // 2. JVM bytecode → DEX
        let mut classes = Vec::new();
        collect_classes(&classes_dir, &mut classes);
        assert!(!classes.is_empty(), "kotlinc produced no .class files");

        let mut d8 = Command::new("java");
        d8.arg("-cp")
            .arg(&d8_jar)
            .arg("com.android.tools.r8.D8")
            .arg("--release")
            .arg("--min-api")
            .arg(self.min_api.to_string())
            .arg("--lib")
            .arg(&android_jar)
            .arg("--output")
            .arg(&out_dir)
            .args(&classes);
        let output = d8.output().expect("failed to run d8 (is java on PATH?)");
        assert!(
            output.status.success(),
            "d8 failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Compile Kotlin helper sources to `classes.dex` in `OUT_DIR` with the
/// default configuration.
pub fn build_kotlin(sources: &[&str]) {
    AndroidConfig::default().build(sources);
}

/// Locate the newest `android.jar` under the SDK `platforms` directory.
pub fn find_android_jar() -> Option<PathBuf> {
    let platforms = sdk_root()?.join("platforms");
    let mut best: Option<(u32, PathBuf)> = None;
    for entry in std::fs::read_dir(&platforms).ok()?.flatten() {
        let name = entry.file_name();
        let Some(level) = name
            .to_string_lossy()
            .strip_prefix("android-")
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };
        let jar = entry.path().join("android.jar");
        if jar.exists() && best.as_ref().is_none_or(|(b, _)| level > *b) {
            best = Some((level, jar));
        }
    }
    best.map(|(_, jar)| jar)
}

/// Locate `d8.jar` in the newest installed build-tools version.
pub fn find_d8_jar() -> Option<PathBuf> {
    let build_tools = sdk_root()?.join("build-tools");
    let mut best: Option<(Vec<u32>, PathBuf)> = None;
    for entry in std::fs::read_dir(&build_tools).ok()?.flatten() {
        let version: Vec<u32> = entry
            .file_name()
            .to_string_lossy()
            .split('.')
            .filter_map(|p| p.parse().ok())
            .collect();
        if version.is_empty() {
            continue;
        }
        let jar = entry.path().join("lib").join("d8.jar");
        if jar.exists() && best.as_ref().is_none_or(|(b, _)| version > *b) {
            best = Some((version, jar));
        }
    }
    best.map(|(_, jar)| jar)
}

fn sdk_root() -> Option<PathBuf> {
    env::var_os("ANDROID_HOME")
        .or_else(|| env::var_os("ANDROID_SDK_ROOT"))
        .map(PathBuf::from)
}

fn collect_classes(dir: &Path, out: &mut Vec<PathBuf>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_classes(&path, out);
            } else if path.extension().is_some_and(|e| e == "class") {
                out.push(path);
            }
        }
    }
}
