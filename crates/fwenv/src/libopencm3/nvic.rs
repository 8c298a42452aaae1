//! `nvic.h` generation from the per-family `irq.json` files.
//!
//! Packaged libopencm3 snapshots ship the IRQ tables but not the generated
//! headers, so each family directory missing `nvic.h` is fed through
//! `scripts/irq2nvic_h` once.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::env::BuildEnv;
use crate::framework::Framework;
use crate::tool::{ToolCommand, ToolRunner};

/// Directories under `<root>/include/libopencm3` with an `irq.json` and no
/// `nvic.h`, as paths relative to `root`.
pub fn pending_irq_tables(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root.join("include").join("libopencm3"))
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == "irq.json")
        .filter_map(|entry| {
            let dir = entry.path().parent()?;
            if dir.join("nvic.h").is_file() {
                return None;
            }
            entry.path().strip_prefix(root).ok().map(Path::to_path_buf)
        })
        .collect()
}

/// Run `irq2nvic_h` for every pending table, from the framework root. A
/// failed run is logged; the compile step reports the missing header.
pub fn generate_nvic_files(fw: &Framework, env: &BuildEnv, runner: &dyn ToolRunner) {
    let python = env.subst("$PYTHONEXE");
    for table in pending_irq_tables(fw.root()) {
        // irq2nvic_h expects a `./`-relative path with forward slashes.
        let rel = format!("./{}", table.to_string_lossy().replace('\\', "/"));
        let cmd = ToolCommand::new(&python)
            .arg(Path::new("scripts").join("irq2nvic_h"))
            .arg(&rel)
            .current_dir(fw.root());
        match runner.run(&cmd) {
            Ok(out) if out.success() => tracing::debug!(table = %rel, "generated nvic.h"),
            Ok(out) => tracing::warn!("irq2nvic_h failed for {rel}: {}", out.stderr.trim()),
            Err(e) => tracing::warn!("irq2nvic_h failed for {rel}: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::board::BoardConfig;
    use crate::config::Options;
    use crate::mocks::FakeRunner;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn family(root: &Path, rel: &str, with_header: bool) {
        let dir = root.join("include/libopencm3").join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("irq.json"), "{}").unwrap();
        if with_header {
            fs::write(dir.join("nvic.h"), "").unwrap();
        }
    }

    #[test]
    fn only_tables_without_header_are_pending() {
        let tmp = TempDir::new().unwrap();
        family(tmp.path(), "stm32/f1", false);
        family(tmp.path(), "stm32/f4", true);
        family(tmp.path(), "lm4f", false);
        assert_eq!(
            pending_irq_tables(tmp.path()),
            vec![
                PathBuf::from("include/libopencm3/lm4f/irq.json"),
                PathBuf::from("include/libopencm3/stm32/f1/irq.json"),
            ]
        );
    }

    #[test]
    fn runs_generator_from_framework_root() {
        let tmp = TempDir::new().unwrap();
        family(tmp.path(), "stm32/f1", false);
        let fw = Framework::new(tmp.path(), BoardConfig::new("b", json!({})), Options::default())
            .unwrap();
        let runner = FakeRunner::default();
        generate_nvic_files(&fw, &fw.new_env(), &runner);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "python3");
        assert_eq!(
            calls[0].args,
            vec!["scripts/irq2nvic_h", "./include/libopencm3/stm32/f1/irq.json"]
        );
        assert_eq!(calls[0].cwd.as_deref(), Some(tmp.path()));
    }
}
