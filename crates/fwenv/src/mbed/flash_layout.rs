//! Dual-core flash split for the Portenta H7 family.
//!
//! The M7 image must know where the M4 image starts; the M4 image must also
//! know where it ends. The split is selected by `build.arduino.flash_layout`.

use crate::board::BoardConfig;
use crate::env::{BuildEnv, Define};

/// Boards this applies to; everything else is left untouched.
pub const BOARD_FAMILY: &str = "portenta_h7";

/// The M4 core board id.
pub const M4_BOARD: &str = "portenta_h7_m4";

pub const DEFAULT_LAYOUT: &str = "50_50";

/// Recognised `build.arduino.flash_layout` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLayout {
    /// 1 MB each, M4 image in internal flash bank 2.
    Half,
    /// 1.5 MB M7 / 0.5 MB M4.
    ThreeQuarters,
    /// All internal flash to the M7, M4 runs from external QSPI/SDRAM.
    Full,
}

impl FlashLayout {
    pub fn parse(selector: &str) -> Option<Self> {
        match selector {
            "50_50" => Some(Self::Half),
            "75_25" => Some(Self::ThreeQuarters),
            "100_0" => Some(Self::Full),
            _ => None,
        }
    }

    /// Address defines for this layout; the M4 build gets the end markers too.
    pub fn defines(self, m4: bool) -> Vec<(&'static str, &'static str)> {
        let mut defines = Vec::with_capacity(3);
        match self {
            Self::Half => {
                defines.push(("CM4_BINARY_START", "0x08100000"));
                if m4 {
                    defines.push(("CM4_BINARY_END", "0x08200000"));
                }
            }
            Self::ThreeQuarters => {
                defines.push(("CM4_BINARY_START", "0x08180000"));
                if m4 {
                    defines.push(("CM4_BINARY_END", "0x08200000"));
                }
            }
            Self::Full => {
                defines.push(("CM4_BINARY_START", "0x60000000"));
                if m4 {
                    defines.push(("CM4_BINARY_END", "0x60040000"));
                    defines.push(("CM4_RAM_END", "0x60080000"));
                }
            }
        }
        defines
    }

    /// Upload offset the M4 build must use, if it differs from the manifest.
    pub fn m4_upload_offset(self) -> Option<&'static str> {
        match self {
            Self::ThreeQuarters => Some("0x08180000"),
            _ => None,
        }
    }
}

/// Emit the layout defines as `-DNAME=VALUE` link flags and as preprocessor
/// defines. Boards outside the family and unknown selectors are a no-op.
pub fn configure_flash_layout(board: &mut BoardConfig, env: &mut BuildEnv) {
    let board_id = board.id().to_string();
    if !board_id.starts_with(BOARD_FAMILY) {
        return;
    }

    let selector = board.get_str_or("build.arduino.flash_layout", DEFAULT_LAYOUT);
    let Some(layout) = FlashLayout::parse(&selector) else {
        // Unknown selectors emit nothing, matching the vendor builder.
        tracing::debug!(layout = %selector, "unrecognised flash layout, no defines emitted");
        return;
    };

    let m4 = board_id == M4_BOARD;
    if m4 {
        if let Some(offset) = layout.m4_upload_offset() {
            board.update("upload.offset_address", offset);
        }
    }

    let defines = layout.defines(m4);
    env.linkflags
        .extend(defines.iter().map(|(name, value)| format!("-D{name}={value}")));
    env.cppdefines
        .extend(defines.iter().map(|(name, value)| Define::value(*name, *value)));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn board(id: &str, layout: Option<&str>) -> BoardConfig {
        let manifest = match layout {
            Some(l) => json!({"build": {"arduino": {"flash_layout": l}}}),
            None => json!({"build": {}}),
        };
        BoardConfig::new(id, manifest)
    }

    #[test]
    fn full_layout_on_m7_emits_start_only() {
        let mut b = board("portenta_h7_m7", Some("100_0"));
        let mut env = BuildEnv::default();
        configure_flash_layout(&mut b, &mut env);
        assert_eq!(env.linkflags, vec!["-DCM4_BINARY_START=0x60000000"]);
        assert_eq!(
            env.cppdefines,
            vec![Define::value("CM4_BINARY_START", "0x60000000")]
        );
    }

    #[test]
    fn full_layout_on_m4_emits_three_defines() {
        let mut b = board("portenta_h7_m4", Some("100_0"));
        let mut env = BuildEnv::default();
        configure_flash_layout(&mut b, &mut env);
        assert_eq!(
            env.linkflags,
            vec![
                "-DCM4_BINARY_START=0x60000000",
                "-DCM4_BINARY_END=0x60040000",
                "-DCM4_RAM_END=0x60080000",
            ]
        );
        assert_eq!(env.cppdefines.len(), 3);
    }

    #[test]
    fn default_layout_is_half() {
        let mut b = board("portenta_h7_m4", None);
        let mut env = BuildEnv::default();
        configure_flash_layout(&mut b, &mut env);
        assert_eq!(
            env.linkflags,
            vec!["-DCM4_BINARY_START=0x08100000", "-DCM4_BINARY_END=0x08200000"]
        );
    }

    #[test]
    fn three_quarters_moves_m4_upload_offset() {
        let mut b = board("portenta_h7_m4", Some("75_25"));
        let mut env = BuildEnv::default();
        configure_flash_layout(&mut b, &mut env);
        assert_eq!(
            b.get_str("upload.offset_address").as_deref(),
            Some("0x08180000")
        );

        let mut m7 = board("portenta_h7_m7", Some("75_25"));
        configure_flash_layout(&mut m7, &mut BuildEnv::default());
        assert!(m7.get("upload.offset_address").is_none());
    }

    #[test]
    fn other_boards_and_unknown_layouts_are_untouched() {
        let mut env = BuildEnv::default();
        configure_flash_layout(&mut board("nano33ble", Some("100_0")), &mut env);
        configure_flash_layout(&mut board("portenta_h7_m7", Some("60_40")), &mut env);
        assert_eq!(env, BuildEnv::default());
    }
}
