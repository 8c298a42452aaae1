//! Default construction variables and per-run options.
//!
//! Every tool name and output location used by the framework builders comes
//! from here rather than being hardcoded at the call site.

use std::path::PathBuf;

/// Build output directory used when none is given.
pub const DEFAULT_BUILD_DIR: &str = ".pio/build";

/// Program name; the final image is `$BUILD_DIR/$PROGNAME$PROGSUFFIX`.
pub const DEFAULT_PROGNAME: &str = "firmware";

/// Program suffix.
pub const DEFAULT_PROGSUFFIX: &str = ".elf";

/// C compiler, also used as the linker-script preprocessor for libopencm3.
pub const DEFAULT_CC: &str = "arm-none-eabi-gcc";

/// C++ compiler, used as the linker-script preprocessor for the mbed core.
pub const DEFAULT_CXX: &str = "arm-none-eabi-g++";

/// Interpreter for the vendor generator scripts.
pub const DEFAULT_PYTHONEXE: &str = "python3";

/// Options shared by both framework builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Root of the build output tree (`$BUILD_DIR`).
    pub build_dir: PathBuf,
    /// `$PROGNAME`
    pub progname: String,
    /// `$PROGSUFFIX`
    pub progsuffix: String,
    /// `$CC`
    pub cc: String,
    /// `$CXX`
    pub cxx: String,
    /// `$PYTHONEXE`
    pub pythonexe: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            progname: DEFAULT_PROGNAME.to_string(),
            progsuffix: DEFAULT_PROGSUFFIX.to_string(),
            cc: DEFAULT_CC.to_string(),
            cxx: DEFAULT_CXX.to_string(),
            pythonexe: DEFAULT_PYTHONEXE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_arm_gcc() {
        let opts = Options::default();
        assert_eq!(opts.cc, "arm-none-eabi-gcc");
        assert_eq!(opts.cxx, "arm-none-eabi-g++");
        assert_eq!(opts.build_dir, PathBuf::from(".pio/build"));
    }
}
