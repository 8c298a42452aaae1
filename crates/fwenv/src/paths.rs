//! Lexical path helpers. Nothing here touches the file system.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without resolving symlinks.
///
/// `..` at the start of a relative path is kept; `..` directly under the
/// root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Move `path` from under `root` to under `dest`. Both sides are compared
/// after [`normalize`], so `./fw` and `/opt/pkgs/../fw` roots still match.
/// `None` when `path` is not under `root`.
pub fn relocate(path: &Path, root: &Path, dest: &Path) -> Option<PathBuf> {
    let path = normalize(path);
    let rel = path.strip_prefix(normalize(root)).ok()?;
    Some(dest.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/fw/lib/stm32/f1/./../common/x.c")),
            PathBuf::from("/fw/lib/stm32/common/x.c")
        );
        assert_eq!(normalize(Path::new("a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn normalize_keeps_leading_parent_of_relative() {
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn relocate_strips_root() {
        assert_eq!(
            relocate(
                Path::new("/fw/lib/stm32/f1/gpio.c"),
                Path::new("/fw"),
                Path::new("$BUILD_DIR/FrameworkLibOpenCM3"),
            ),
            Some(PathBuf::from("$BUILD_DIR/FrameworkLibOpenCM3/lib/stm32/f1/gpio.c"))
        );
    }

    #[test]
    fn relocate_matches_unnormalized_roots() {
        let dest = Path::new("out");
        assert_eq!(
            relocate(Path::new("fw/lib/a.c"), Path::new("./fw"), dest),
            Some(PathBuf::from("out/lib/a.c"))
        );
        assert_eq!(
            relocate(Path::new("/opt/fw/lib/a.c"), Path::new("/opt/pkgs/../fw"), dest),
            Some(PathBuf::from("out/lib/a.c"))
        );
    }

    #[test]
    fn relocate_outside_root_is_none() {
        assert_eq!(
            relocate(Path::new("/other/x.c"), Path::new("/fw"), Path::new("out")),
            None
        );
        assert_eq!(
            relocate(Path::new("/fw/../other/x.c"), Path::new("/fw"), Path::new("out")),
            None
        );
    }
}
