//! End-to-end mbed core configuration over a fixture framework tree.

#![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

use std::fs;
use std::path::{Path, PathBuf};

use fwenv::{BoardConfig, BuildEnv, Define, Framework, Lib, Options};
use serde_json::json;
use tempfile::TempDir;

const VARIANT: &str = "PORTENTA_H7_M7";

fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let variant = root.join("variants").join(VARIANT);
    fs::create_dir_all(variant.join("libs")).unwrap();
    fs::write(
        variant.join("cflags.txt"),
        "-c\n-std=gnu11\n-mcpu=cortex-m7\n-mthumb\n-Os\n",
    )
    .unwrap();
    fs::write(
        variant.join("cxxflags.txt"),
        "-c\n-std=gnu++14\n-fno-rtti\n-mcpu=cortex-m7\n-mthumb\n-Os\n",
    )
    .unwrap();
    fs::write(variant.join("defines.txt"), "-DARDUINO_ARCH_MBED_PORTENTA\n-DCORE_CM7\n").unwrap();
    fs::write(variant.join("ldflags.txt"), "-Wl,--gc-sections\n-DMBED_BOOT_STACK_SIZE=1024\n").unwrap();
    fs::write(variant.join("linker_script.ld"), "MEMORY {}\n").unwrap();
    fs::write(variant.join("variant.cpp"), "").unwrap();

    let core = root.join("cores").join("arduino");
    fs::create_dir_all(core.join("api")).unwrap();
    fs::write(core.join("main.cpp"), "").unwrap();
    fs::write(core.join("api").join("Common.cpp"), "").unwrap();
    tmp
}

fn configure(root: &Path, board_id: &str, layout: &str) -> (Framework, BuildEnv) {
    let board = BoardConfig::new(
        board_id,
        json!({
            "build": {
                "core": "arduino",
                "variant": VARIANT,
                "mcu": "stm32h747xih6",
                "arduino": {"flash_layout": layout}
            }
        }),
    );
    let opts = Options {
        build_dir: PathBuf::from("/build"),
        ..Options::default()
    };
    let mut fw = Framework::new(root, board, opts).unwrap();
    let mut env = fw.new_env();
    fwenv::mbed::configure(&mut fw, &mut env).unwrap();
    (fw, env)
}

#[test]
fn every_flag_lands_in_exactly_one_bucket() {
    let tmp = fixture();
    let (_, env) = configure(tmp.path(), "portenta_h7_m7", "50_50");

    assert_eq!(env.cflags, vec!["-std=gnu11"]);
    assert_eq!(env.cxxflags, vec!["-fno-rtti", "-std=gnu++14"]);
    assert_eq!(
        &env.ccflags[..4],
        &["-Os", "-c", "-mcpu=cortex-m7", "-mthumb"]
    );
    assert_eq!(env.asflags, vec!["-mcpu=cortex-m7", "-mthumb"]);
}

#[test]
fn core_paths_defines_and_libraries() {
    let tmp = fixture();
    let (_, env) = configure(tmp.path(), "portenta_h7_m7", "50_50");
    let core = tmp.path().join("cores/arduino");

    assert!(env.ccflags.contains(&format!("-iprefix{}", core.display())));
    assert!(env.ccflags.contains(&"-nostdlib".to_string()));
    assert!(env.cppdefines.contains(&Define::value("ARDUINO", "10810")));
    assert!(env.cppdefines.contains(&Define::flag("CORE_CM7")));
    assert!(env.cpppath.contains(&core.join("api/deprecated-avr-comp")));
    assert!(env.cpppath.contains(&tmp.path().join("variants").join(VARIANT)));
    assert_eq!(env.lib_flags_prefix, vec!["-Wl,--whole-archive"]);
    assert_eq!(env.lib_flags_suffix.first().map(String::as_str), Some("-Wl,--no-whole-archive"));

    // Framework libraries are prepended ahead of the mbed runtime.
    let Lib::Built(variant_lib) = &env.libs[0] else {
        panic!("expected variant library first, got {:?}", env.libs[0]);
    };
    assert_eq!(variant_lib.name, PathBuf::from("/build/FrameworkArduinoVariant"));
    assert_eq!(
        variant_lib.sources,
        vec![PathBuf::from("/build/FrameworkArduinoVariant/variant.cpp")]
    );
    let Lib::Built(core_lib) = &env.libs[1] else {
        panic!("expected core library second");
    };
    assert_eq!(core_lib.sources.len(), 2);
    assert_eq!(env.libs[2], Lib::named("mbed"));
}

#[test]
fn flash_layout_defines_feed_the_linker_script() {
    let tmp = fixture();
    let (fw, env) = configure(tmp.path(), "portenta_h7_m4", "75_25");

    assert_eq!(
        fw.board.get_str("upload.offset_address").as_deref(),
        Some("0x08180000")
    );
    let cmd = &env.commands[0];
    assert_eq!(cmd.argv[0], "arm-none-eabi-g++");
    let defines: Vec<&str> = cmd
        .argv
        .iter()
        .filter(|a| a.starts_with("-D"))
        .map(String::as_str)
        .collect();
    assert_eq!(
        defines,
        vec![
            "-DMBED_BOOT_STACK_SIZE=1024",
            "-DCM4_BINARY_START=0x08180000",
            "-DCM4_BINARY_END=0x08200000",
        ]
    );
    assert_eq!(
        env.ldscript_path,
        Some(PathBuf::from("/build/cpp.linker_script.ld"))
    );
}

#[test]
fn missing_flag_files_are_not_fatal() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("variants").join(VARIANT)).unwrap();
    let (_, env) = configure(tmp.path(), "nano33ble", "50_50");
    assert!(env.cflags.is_empty());
    assert!(env.cxxflags.is_empty());
    assert!(env.ldscript_path.is_none());
    assert!(env.commands.is_empty());
}
