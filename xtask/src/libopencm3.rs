use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use fwenv::{BoardConfig, Framework, ProcessRunner};

use crate::BoardArgs;

pub fn run(args: &BoardArgs, platform: &str) -> Result<()> {
    println!();
    println!(
        "{}",
        format!("🔧 Configuring libopencm3 ({platform})...").cyan().bold()
    );
    println!();

    let start = Instant::now();
    let board = BoardConfig::load(&args.board, args.board_id.as_deref())
        .context("Failed to load board manifest")?;
    println!("   {}", format!("board {}", board.id()).dimmed());

    let fw = Framework::new(&args.framework_dir, board, args.options())
        .context("Framework package not found")?;
    let mut env = fw.new_env();
    fwenv::libopencm3::configure(&fw, &mut env, &ProcessRunner, platform)
        .context("Failed to configure libopencm3")?;

    crate::output::finish(&env, args.output.as_deref(), args.execute, start)
}
