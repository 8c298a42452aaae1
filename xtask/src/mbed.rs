use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use fwenv::{BoardConfig, Framework};

use crate::BoardArgs;

pub fn run(args: &BoardArgs) -> Result<()> {
    println!();
    println!("{}", "🔧 Configuring Arduino mbed core...".cyan().bold());
    println!();

    let start = Instant::now();
    let board = BoardConfig::load(&args.board, args.board_id.as_deref())
        .context("Failed to load board manifest")?;
    println!("   {}", format!("board {}", board.id()).dimmed());

    let mut fw = Framework::new(&args.framework_dir, board, args.options())
        .context("Framework package not found")?;
    let mut env = fw.new_env();
    fwenv::mbed::configure(&mut fw, &mut env).context("Failed to configure mbed core")?;

    crate::output::finish(&env, args.output.as_deref(), args.execute, start)
}
