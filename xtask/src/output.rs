//! Shared tail of every configure command: summary, JSON dump, execution.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;
use fwenv::{BuildEnv, Lib, ProcessRunner};

pub fn print_summary(env: &BuildEnv) {
    println!("{}", "  Build environment:".cyan());
    row("CCFLAGS", env.ccflags.len());
    row("CFLAGS", env.cflags.len());
    row("CXXFLAGS", env.cxxflags.len());
    row("ASFLAGS", env.asflags.len());
    row("LINKFLAGS", env.linkflags.len());
    row("CPPDEFINES", env.cppdefines.len());
    row("CPPPATH", env.cpppath.len());

    for lib in &env.libs {
        if let Lib::Built(built) = lib {
            println!(
                "   {}",
                format!(
                    "library {} ({} sources)",
                    built.name.display(),
                    built.sources.len()
                )
                .dimmed()
            );
        }
    }
    match &env.ldscript_path {
        Some(path) => println!("   {}", format!("LDSCRIPT_PATH {}", path.display()).dimmed()),
        None => println!("   {}", "LDSCRIPT_PATH unchanged".dimmed()),
    }
}

fn row(name: &str, count: usize) {
    println!("   {}", format!("{name:<11} {count}").dimmed());
}

pub fn write_json(env: &BuildEnv, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(env).context("Failed to serialise build environment")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, &json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!(bytes = json.len(), path = %path.display(), "wrote build environment");
    println!("{}", format!("  ✓ Environment written to {}", path.display()).green());
    Ok(())
}

pub fn execute(env: &BuildEnv) -> Result<()> {
    if env.commands.is_empty() {
        println!("{}", "  No commands to run".dimmed());
        return Ok(());
    }
    for cmd in &env.commands {
        tracing::debug!(output = %cmd.target.display(), "{}", cmd.argv.join(" "));
    }
    let start = Instant::now();
    env.execute(&ProcessRunner)
        .context("Failed to run recorded build commands")?;
    println!(
        "{}",
        format!(
            "  ✓ {} command(s) finished in {:.2}s",
            env.commands.len(),
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    Ok(())
}

/// Summary, optional JSON, optional execution.
pub fn finish(env: &BuildEnv, json: Option<&Path>, run_commands: bool, start: Instant) -> Result<()> {
    print_summary(env);
    println!();
    if let Some(path) = json {
        write_json(env, path)?;
    }
    if run_commands {
        execute(env)?;
    }
    println!(
        "{}",
        format!("✓ Configured in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();
    Ok(())
}
