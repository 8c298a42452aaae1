//! Arduino mbed core builder.
//!
//! # Modules
//!
//! - [`flags`] — per-variant flag files and the C / C++ / common split
//! - [`flash_layout`] — Portenta H7 dual-core flash split
//! - [`ldscript`] — variant linker template preprocessing

pub mod flags;
pub mod flash_layout;
pub mod ldscript;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::env::{BuildEnv, Define, Lib};
use crate::error::Result;
use crate::framework::Framework;
use crate::paths::relocate;

pub use flags::{apply_variant_flags, load_flags, FlagPartition};
pub use flash_layout::{configure_flash_layout, FlashLayout};
pub use ldscript::preprocess_ldscript;

/// `ARDUINO` define value the core expects (1.8.10).
pub const ARDUINO_VERSION: &str = "10810";

/// Extensions compiled into the framework libraries.
const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "S"];

/// Configure `env` for the mbed core on the board in `fw`.
///
/// # Errors
///
/// `Error::MissingBoardKey` without `build.variant` or `build.core`;
/// `Error::Io` if a flag file exists but cannot be read.
pub fn configure(fw: &mut Framework, env: &mut BuildEnv) -> Result<()> {
    apply_variant_flags(fw, env)?;

    let core = fw.board.require_str("build.core")?;
    let core_dir = fw.root().join("cores").join(&core);
    let variant = fw.board.require_str("build.variant")?;
    let variant_dir = fw.root().join("variants").join(&variant);

    // Long include paths crash the toolchain without the -iprefix hook.
    env.ccflags.push(format!("-iprefix{}", core_dir.display()));
    env.ccflags
        .push(format!("@{}", variant_dir.join("includes.txt").display()));
    env.ccflags.push("-nostdlib".to_string());

    env.cppdefines.push(Define::value("ARDUINO", ARDUINO_VERSION));
    env.cppdefines.push(Define::flag("ARDUINO_ARCH_MBED"));
    env.cpppath.extend([
        core_dir.clone(),
        core_dir.join("api").join("deprecated"),
        core_dir.join("api").join("deprecated-avr-comp"),
    ]);
    env.linkflags.extend(
        ["--specs=nano.specs", "--specs=nosys.specs", "-Wl,--as-needed"]
            .iter()
            .map(|s| s.to_string()),
    );

    configure_flash_layout(&mut fw.board, env);
    preprocess_ldscript(fw, env)?;

    // The core relies on every object in the mbed archives being linked.
    env.lib_flags_prefix.push("-Wl,--whole-archive".to_string());
    env.lib_flags_suffix.extend(
        [
            "-Wl,--no-whole-archive",
            "-lstdc++",
            "-lsupc++",
            "-lm",
            "-lc",
            "-lgcc",
            "-lnosys",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    env.cpppath.push(variant_dir.clone());
    let libs = [
        framework_library(env, &variant_dir, "$BUILD_DIR/FrameworkArduinoVariant"),
        framework_library(env, &core_dir, "$BUILD_DIR/FrameworkArduino"),
    ];
    env.libs.splice(0..0, libs);

    tracing::debug!(
        board = %fw.board.id(),
        defines = env.cppdefines.len(),
        libs = env.libs.len(),
        "mbed core configured"
    );
    Ok(())
}

/// Library built from every source file under `dir`, objects placed under
/// `build_name`.
fn framework_library(env: &BuildEnv, dir: &Path, build_name: &str) -> Lib {
    let sources: Vec<PathBuf> = collect_sources(dir)
        .iter()
        .filter_map(|src| relocate(src, dir, Path::new(build_name)))
        .collect();
    tracing::debug!(dir = %dir.display(), count = sources.len(), "collected framework sources");
    env.library(build_name, sources)
}

/// Source files under `dir`, sorted by path. A missing directory yields none.
pub fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        })
        .map(|entry| entry.into_path())
        .collect()
}
