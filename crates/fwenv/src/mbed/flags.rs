//! Variant flag lists (`cflags.txt`, `cxxflags.txt`, `defines.txt`,
//! `ldflags.txt`) and their C / C++ / common partition.

use std::collections::BTreeSet;
use std::fs;

use crate::env::{BuildEnv, Define, Lib};
use crate::error::{Error, Result};
use crate::framework::Framework;

/// Runtime linked into every mbed image.
pub const MBED_LIB: &str = "mbed";

/// Extra crypto-cell libraries for nRF52840 parts.
pub const NRF52840_LIBS: [&str; 3] = ["cc_310_core", "cc_310_ext", "cc_310_trng"];

/// Read `<fw>/variants/<build.variant>/<name>.txt`: one flag per line,
/// trimmed, blank lines dropped. A missing file yields an empty list.
///
/// # Errors
///
/// `Error::MissingBoardKey` without `build.variant`; `Error::Io` if the file
/// exists but cannot be read.
pub fn load_flags(fw: &Framework, name: &str) -> Result<Vec<String>> {
    if name.is_empty() {
        return Ok(Vec::new());
    }
    let variant = fw.board.require_str("build.variant")?;
    let path = fw
        .root()
        .join("variants")
        .join(variant)
        .join(format!("{name}.txt"));
    if !path.is_file() {
        tracing::warn!("Couldn't find file '{}'", path.display());
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// C and C++ flag lists split into three disjoint, sorted buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagPartition {
    /// In both lists; passed to C and C++.
    pub common: BTreeSet<String>,
    pub c_only: BTreeSet<String>,
    pub cxx_only: BTreeSet<String>,
}

impl FlagPartition {
    pub fn new(cflags: &[String], cxxflags: &[String]) -> Self {
        let c: BTreeSet<String> = cflags.iter().cloned().collect();
        let cxx: BTreeSet<String> = cxxflags.iter().cloned().collect();
        Self {
            common: c.intersection(&cxx).cloned().collect(),
            c_only: c.difference(&cxx).cloned().collect(),
            cxx_only: cxx.difference(&c).cloned().collect(),
        }
    }

    /// Machine-selection flags (`-m...`) among the common set; the assembler
    /// needs these too.
    pub fn machine_flags(&self) -> impl Iterator<Item = &String> {
        self.common.iter().filter(|f| f.starts_with("-m"))
    }

    pub fn apply(&self, env: &mut BuildEnv) {
        env.asflags.extend(self.machine_flags().cloned());
        env.cflags.extend(self.c_only.iter().cloned());
        env.ccflags.extend(self.common.iter().cloned());
        env.cxxflags.extend(self.cxx_only.iter().cloned());
    }
}

/// `-DNAME` / `-DNAME=value` (marker optional) to a structured define.
fn parse_define(raw: &str) -> Define {
    let raw = raw.strip_prefix("-D").unwrap_or(raw);
    match raw.split_once('=') {
        Some((name, value)) => Define::value(name, value),
        None => Define::flag(raw),
    }
}

/// Apply the variant flag files, library paths and runtime libraries.
///
/// # Errors
///
/// See [`load_flags`].
pub fn apply_variant_flags(fw: &Framework, env: &mut BuildEnv) -> Result<()> {
    let variant = fw.board.require_str("build.variant")?;
    let variant_dir = fw.root().join("variants").join(&variant);

    let partition = FlagPartition::new(&load_flags(fw, "cflags")?, &load_flags(fw, "cxxflags")?);
    partition.apply(env);
    env.asppflags
        .extend(["-x".to_string(), "assembler-with-cpp".to_string()]);

    env.cppdefines.extend(
        load_flags(fw, "defines")?
            .iter()
            .map(|d| parse_define(d)),
    );
    env.libpath.push(variant_dir.clone());
    env.libpath.push(variant_dir.join("libs"));
    env.linkflags.extend(load_flags(fw, "ldflags")?);
    env.libsource_dirs.push(fw.root().join("libraries"));
    env.libs.push(Lib::named(MBED_LIB));

    if fw.board.get_str_or("build.mcu", "").starts_with("nrf52840") {
        env.libs.extend(NRF52840_LIBS.iter().map(|l| Lib::named(*l)));
    }
    Ok(())
}
