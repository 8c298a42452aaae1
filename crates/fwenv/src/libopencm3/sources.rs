//! Map the Makefile object list back to C sources.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::libopencm3::makefile::{parse_makefile_data, MakefileData};
use crate::paths::{normalize, relocate};

/// Build-tree directory the framework sources compile into.
pub const BUILD_SUBDIR: &str = "$BUILD_DIR/FrameworkLibOpenCM3";

/// A source located for one object file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Where the file lives in the framework package.
    pub path: PathBuf,
    /// The same file under [`BUILD_SUBDIR`].
    pub build_path: PathBuf,
}

/// Merged model of `<src_dir>/Makefile` and the Makefiles it includes.
/// Includes of includes are not followed.
///
/// # Errors
///
/// Any parse error of the root or an included Makefile.
pub fn load_makefiles(src_dir: &Path) -> Result<MakefileData> {
    let mut data = parse_makefile_data(&src_dir.join("Makefile"))?;
    for include in data.includes.clone() {
        let included = parse_makefile_data(&normalize(&src_dir.join(&include)))?;
        data.merge(included);
    }
    Ok(data)
}

/// First `vpath` entry under `src_dir` that holds `<obj stem>.c`.
pub fn resolve_object(src_dir: &Path, vpath: &[String], obj: &str) -> Option<PathBuf> {
    let stem = obj.strip_suffix(".o").unwrap_or(obj);
    let src_file = format!("{stem}.c");
    vpath
        .iter()
        .map(|dir| normalize(&src_dir.join(dir).join(&src_file)))
        .find(|candidate| candidate.is_file())
}

/// Sources for every object of the family in `src_dir`, in object order.
/// Objects with no matching source are skipped; some are built only for
/// parts this package does not ship sources for.
///
/// A `vpath` entry reaching outside `framework_root` has no place in the
/// build tree; its sources are dropped with a warning.
///
/// # Errors
///
/// See [`load_makefiles`].
pub fn get_source_files(framework_root: &Path, src_dir: &Path) -> Result<Vec<ResolvedSource>> {
    let data = load_makefiles(src_dir)?;
    let build_root = Path::new(BUILD_SUBDIR);
    let sources: Vec<ResolvedSource> = data
        .objs
        .iter()
        .filter_map(|obj| {
            let found = resolve_object(src_dir, &data.vpath, obj);
            if found.is_none() {
                tracing::trace!(obj = %obj, "no source for object");
            }
            found
        })
        .filter_map(|path| match relocate(&path, framework_root, build_root) {
            Some(build_path) => Some(ResolvedSource { path, build_path }),
            None => {
                tracing::warn!(
                    "Skipping {}: outside framework package {}",
                    path.display(),
                    framework_root.display()
                );
                None
            }
        })
        .collect();
    tracing::debug!(
        dir = %src_dir.display(),
        objs = data.objs.len(),
        sources = sources.len(),
        "resolved framework sources"
    );
    Ok(sources)
}
