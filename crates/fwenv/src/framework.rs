//! `Framework` — the inputs every builder needs, bundled.

use std::path::{Path, PathBuf};

use crate::board::BoardConfig;
use crate::config::Options;
use crate::env::BuildEnv;
use crate::error::{Error, Result};
use crate::paths::normalize;

/// Framework package root plus the board being built for.
#[derive(Debug, Clone)]
pub struct Framework {
    root: PathBuf,
    /// The flash-layout step may write back into the manifest.
    pub board: BoardConfig,
    pub options: Options,
}

impl Framework {
    /// # Errors
    ///
    /// `Error::Io` (`NotFound`) when `root` is not a directory; a framework
    /// package that is not installed cannot be configured.
    ///
    /// `root` is kept normalized (`./fw` becomes `fw`).
    pub fn new(root: impl Into<PathBuf>, board: BoardConfig, options: Options) -> Result<Self> {
        let root = normalize(&root.into());
        if !root.is_dir() {
            return Err(Error::io(
                &root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "framework package not found"),
            ));
        }
        Ok(Self {
            root,
            board,
            options,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Environment seeded from the options plus `$BOARD`.
    pub fn new_env(&self) -> BuildEnv {
        let mut env = BuildEnv::new(&self.options);
        env.set_var("BOARD", self.board.id());
        if let Some(f_cpu) = self.board.get_str("build.f_cpu") {
            env.set_var("BOARD_F_CPU", f_cpu);
        }
        env
    }
}
