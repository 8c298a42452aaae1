//! libopencm3 builder.
//!
//! # Modules
//!
//! - [`makefile`] — `include` / `VPATH` / `OBJS` extraction and merging
//! - [`sources`] — object list → C sources via `vpath`
//! - [`ldscript`] — genlink device symbols and linker script preprocessing
//! - [`nvic`] — `nvic.h` generation from `irq.json`

pub mod ldscript;
pub mod makefile;
pub mod nvic;
pub mod sources;

use std::path::PathBuf;

use crate::env::{BuildEnv, Define, Lib};
use crate::error::Result;
use crate::framework::Framework;
use crate::tool::ToolRunner;

pub use ldscript::{generate_ldscript, ld_device};
pub use makefile::{parse_makefile_data, MakefileData};
pub use nvic::generate_nvic_files;
pub use sources::{get_source_files, ResolvedSource, BUILD_SUBDIR};

/// Libraries every libopencm3 image links against.
pub const LIBS: [&str; 5] = ["c", "gcc", "m", "stdc++", "nosys"];

/// Where a platform's family library lives and what it defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTarget {
    /// Family directory relative to `<fw>/lib`.
    pub lib_subdir: PathBuf,
    /// Family define, e.g. `STM32F1`.
    pub define: Option<String>,
    /// `LM4F` is appended as-is; the other family defines are deduplicated.
    pub unique_define: bool,
}

/// `mcu[start..end]` by characters, clamped to the string.
fn mcu_slice(mcu: &str, start: usize, end: usize) -> String {
    mcu.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

impl FamilyTarget {
    /// Family for `platform`; unknown platforms build from `<fw>/lib` with no define.
    pub fn for_platform(platform: &str, mcu: &str) -> Self {
        match platform {
            "titiva" => Self {
                lib_subdir: PathBuf::from("lm4f"),
                define: Some("LM4F".to_string()),
                unique_define: false,
            },
            "ststm32" => Self {
                lib_subdir: PathBuf::from("stm32").join(mcu_slice(mcu, 5, 7)),
                define: Some(mcu_slice(mcu, 0, 7).to_uppercase()),
                unique_define: true,
            },
            "nxplpc" => {
                let variant = format!("{}xx", mcu_slice(mcu, 0, 5));
                Self {
                    define: Some(variant.to_uppercase()),
                    lib_subdir: PathBuf::from(variant),
                    unique_define: true,
                }
            }
            "siliconlabsefm32" => Self {
                lib_subdir: PathBuf::from("efm32").join(mcu_slice(mcu, 5, 7)),
                define: Some(mcu_slice(mcu, 0, 7).to_uppercase()),
                unique_define: true,
            },
            _ => Self {
                lib_subdir: PathBuf::new(),
                define: None,
                unique_define: true,
            },
        }
    }
}

/// `-mfpu` version for hard-float cores, `None` for soft-float ones.
pub fn fpu_version(cpu: &str, mcu: &str) -> Option<&'static str> {
    match cpu {
        "cortex-m4" | "cortex-m7" if mcu.starts_with("stm32h7") => Some("5"),
        "cortex-m7" => Some("5-sp"),
        "cortex-m4" => Some("4-sp"),
        _ => None,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configure `env` for libopencm3 on `platform` (`ststm32`, `titiva`,
/// `nxplpc`, `siliconlabsefm32`, ...).
///
/// # Errors
///
/// `Error::MissingBoardKey` without `build.mcu` or `build.cpu`, and any
/// fatal Makefile or genlink error.
pub fn configure(
    fw: &Framework,
    env: &mut BuildEnv,
    runner: &dyn ToolRunner,
    platform: &str,
) -> Result<()> {
    env.set_var("PIOPLATFORM", platform);
    let mcu = fw.board.require_str("build.mcu")?;
    let cpu = fw.board.require_str("build.cpu")?;

    let family = FamilyTarget::for_platform(platform, &mcu);
    if let Some(define) = &family.define {
        if family.unique_define {
            env.append_unique_define(Define::flag(define));
        } else {
            env.cppdefines.push(Define::flag(define));
        }
    }
    let root_dir = fw.root().join("lib").join(&family.lib_subdir);

    generate_nvic_files(fw, env, runner);

    let machine_flags = vec!["-mthumb".to_string(), format!("-mcpu={cpu}")];
    env.asflags.extend(machine_flags.iter().cloned());
    env.asppflags.extend(strings(&["-x", "assembler-with-cpp"]));
    env.cflags.extend(strings(&[
        "-Wimplicit-function-declaration",
        "-Wmissing-prototypes",
        "-Wstrict-prototypes",
    ]));
    env.ccflags.extend(machine_flags.iter().cloned());
    env.ccflags.extend(strings(&[
        "-Os",
        "-ffunction-sections",
        "-fdata-sections",
        "-Wall",
        "-Wextra",
        "-Wredundant-decls",
        "-Wshadow",
        "-fno-common",
    ]));
    env.cxxflags.extend(strings(&["-fno-rtti", "-fno-exceptions"]));

    let f_cpu = env.subst("$BOARD_F_CPU");
    env.cppdefines.push(Define::value("F_CPU", f_cpu));
    let lib_variant = fw.board.get_str_or("build.libopencm3.variant", "");
    if !lib_variant.is_empty() {
        env.cppdefines.push(Define::flag(lib_variant.to_uppercase()));
    }
    env.cpppath
        .extend([fw.root().to_path_buf(), fw.root().join("include")]);
    env.linkflags.extend(machine_flags);
    env.linkflags.extend(strings(&[
        "-Os",
        "-Wl,--gc-sections",
        "-nostartfiles",
        "--static",
        "--specs=nano.specs",
        "--specs=nosys.specs",
    ]));
    env.libs.extend(LIBS.iter().map(|l| Lib::named(*l)));
    env.libpath.push(fw.root().join("lib"));

    if let Some(fpv) = fpu_version(&cpu, &mcu) {
        let float_flags = vec!["-mfloat-abi=hard".to_string(), format!("-mfpu=fpv{fpv}-d16")];
        env.asflags.extend(float_flags.iter().cloned());
        env.ccflags.extend(float_flags.iter().cloned());
        env.linkflags.extend(float_flags);
    }

    if fw.board.get_str_or("build.ldscript", "").is_empty() {
        let device = ld_device(&fw.board, platform);
        generate_ldscript(fw, env, runner, &device)?;
    }

    env.variant_dir(BUILD_SUBDIR, fw.root());
    let sources = get_source_files(fw.root(), &root_dir)?
        .into_iter()
        .map(|s| s.build_path)
        .collect();
    let library = env.library(BUILD_SUBDIR, sources);
    env.libs.push(library);

    tracing::debug!(board = %fw.board.id(), platform, mcu = %mcu, "libopencm3 configured");
    Ok(())
}
