//! Variant linker template run through the C preprocessor.
//!
//! mbed variant templates are plain `.ld` files sprinkled with `#if`s on the
//! flash-layout defines, so they are expanded with only the `-D` link flags.

use std::path::PathBuf;

use crate::env::BuildEnv;
use crate::error::Result;
use crate::framework::Framework;

/// Output of the preprocessing step, under `$BUILD_DIR`.
pub const PREPROCESSED_LDSCRIPT: &str = "$BUILD_DIR/cpp.linker_script.ld";

/// Template path: board override (`build.arduino.ldscript`, or the older
/// `build.mbed.ldscript`) after variable expansion, else the variant's
/// `linker_script.ld`.
///
/// # Errors
///
/// `Error::MissingBoardKey` without `build.variant`.
pub fn template_path(fw: &Framework, env: &BuildEnv) -> Result<PathBuf> {
    let custom = ["build.arduino.ldscript", "build.mbed.ldscript"]
        .iter()
        .filter_map(|key| fw.board.get_str(key))
        .find(|value| !value.is_empty());
    if let Some(custom) = custom {
        return Ok(PathBuf::from(env.subst(&custom)));
    }
    let variant = fw.board.require_str("build.variant")?;
    Ok(fw
        .root()
        .join("variants")
        .join(variant)
        .join("linker_script.ld"))
}

/// Record the preprocessing command and point the link at its output.
///
/// Does nothing when the board names its own `build.ldscript`. A missing
/// template is logged and leaves `ldscript_path` as it was. Returns the
/// generated script path when one was recorded.
///
/// # Errors
///
/// See [`template_path`].
pub fn preprocess_ldscript(fw: &Framework, env: &mut BuildEnv) -> Result<Option<PathBuf>> {
    if !fw.board.get_str_or("build.ldscript", "").is_empty() {
        return Ok(None);
    }

    let template = template_path(fw, env)?;
    if !template.is_file() {
        tracing::warn!("Couldn't find linker script file {}", template.display());
        return Ok(None);
    }

    let mut argv: Vec<String> = ["$CXX", "-E", "-P", "-x", "c"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    argv.extend(env.linkflags.iter().filter(|f| f.starts_with("-D")).cloned());
    argv.push(template.to_string_lossy().into_owned());
    argv.push("-o".to_string());
    argv.push(PREPROCESSED_LDSCRIPT.to_string());

    let target = env.command(
        PREPROCESSED_LDSCRIPT,
        &template,
        argv,
        "Generating LD script $TARGET",
    );
    let program = env.program_path();
    env.depends(&program, &target);
    env.ldscript_path = Some(target.clone());
    Ok(Some(target))
}
