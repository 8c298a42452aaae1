//! Device linker script from `ld/devices.data` via `scripts/genlink.py`.
//!
//! genlink turns a device name into `-D` memory-region symbols; those feed
//! the C preprocessor over the shared `ld/linker.ld.S` template.

use std::path::PathBuf;

use crate::board::BoardConfig;
use crate::env::BuildEnv;
use crate::error::{Error, Result};
use crate::framework::Framework;
use crate::tool::{ToolCommand, ToolRunner};

/// Offsets genlink must always report.
pub const REQUIRED_SYMBOLS: [&str; 2] = ["_ROM_OFF", "_RAM_OFF"];

/// Device name genlink looks up. A board-specified
/// `build.libopencm3.ld_device` wins; otherwise STM32 names are cut to the
/// 11-character family/size prefix, and Tiva parts use the generic `lm4f`
/// entry because devices.data has no per-part data for them.
pub fn ld_device(board: &BoardConfig, platform: &str) -> String {
    if let Some(device) = board.get_str("build.libopencm3.ld_device") {
        return device;
    }
    let mcu = board.get_str_or("build.mcu", "");
    match platform {
        "ststm32" => mcu.chars().take(11).collect(),
        "titiva" => "lm4f".to_string(),
        _ => mcu,
    }
}

/// Append `-D_ROM=` / `-D_RAM=` from the board's upload limits when genlink
/// did not report the sizes.
///
/// # Errors
///
/// `Error::MissingDeviceSymbols` when the region offsets are absent.
pub fn complete_device_symbols(board: &BoardConfig, device: &str, symbols: &str) -> Result<String> {
    if !REQUIRED_SYMBOLS.iter().all(|s| symbols.contains(s)) {
        return Err(Error::MissingDeviceSymbols {
            device: device.to_string(),
            symbols: symbols.to_string(),
        });
    }
    let mut symbols = symbols.trim().to_string();
    if !symbols.contains("-D_ROM=") {
        let rom = board.get_u64("upload.maximum_size").unwrap_or(0);
        symbols.push_str(&format!(" -D_ROM={rom}"));
    }
    if !symbols.contains("-D_RAM=") {
        let ram = board.get_u64("upload.maximum_ram_size").unwrap_or(0);
        symbols.push_str(&format!(" -D_RAM={ram}"));
    }
    Ok(symbols)
}

/// Ask genlink for the device symbols. A failed run is logged and yields an
/// empty string; the preprocessed script is then left incomplete.
///
/// # Errors
///
/// `Error::MissingDeviceSymbols`, see [`complete_device_symbols`].
pub fn device_symbols(
    fw: &Framework,
    env: &BuildEnv,
    runner: &dyn ToolRunner,
    device: &str,
) -> Result<String> {
    let cmd = ToolCommand::new(env.subst("$PYTHONEXE"))
        .arg(fw.root().join("scripts").join("genlink.py"))
        .arg(fw.root().join("ld").join("devices.data"))
        .arg(device)
        .arg("DEFS");

    match runner.run(&cmd) {
        Ok(out) if out.success() => complete_device_symbols(&fw.board, device, &out.stdout),
        Ok(out) => {
            tracing::warn!("Couldn't generate linker script for {device}");
            tracing::warn!("{}", out.stdout);
            tracing::warn!("{}", out.stderr);
            Ok(String::new())
        }
        Err(e) => {
            tracing::warn!("Couldn't generate linker script for {device}: {e}");
            Ok(String::new())
        }
    }
}

/// Record `$CC -P -E linker.ld.S` with the device symbols and the `-m`
/// compiler flags, make the program depend on it and link with it.
///
/// # Errors
///
/// See [`device_symbols`].
pub fn generate_ldscript(
    fw: &Framework,
    env: &mut BuildEnv,
    runner: &dyn ToolRunner,
    device: &str,
) -> Result<PathBuf> {
    let symbols = device_symbols(fw, env, runner, device)?;
    let target = format!("$BUILD_DIR/generated.{device}.ld");
    let template = fw.root().join("ld").join("linker.ld.S");

    let mut argv: Vec<String> = vec![
        "$CC".into(),
        "-P".into(),
        "-E".into(),
        template.to_string_lossy().into_owned(),
        "-o".into(),
        target.clone(),
    ];
    argv.extend(symbols.split_whitespace().map(str::to_string));
    argv.extend(env.ccflags.iter().filter(|f| f.starts_with("-m")).cloned());

    let target = env.command(&target, &template, argv, "Generating linker script $TARGET");
    let program = env.program_path();
    env.depends(&program, &target);
    env.ldscript_path = Some(target.clone());
    Ok(target)
}
