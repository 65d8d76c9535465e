//! Renders the `vra-guest` manual pages into `OUT_DIR`.
//!
//! One page covers the top-level command and one is written per subcommand
//! (`vra-guest-provision.1`), so packaging can install them side by side.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory};
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

const BIN_NAME: &str = "vra-guest";

fn render_page(command: Command, target: &Path) -> io::Result<()> {
    let mut page = Vec::new();
    Man::new(command).render(&mut page)?;
    fs::write(target, page)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    for watched in ["build.rs", "src/cli/mod.rs"] {
        writeln!(stdout, "cargo:rerun-if-changed={watched}")?;
    }

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR was not set"))?;

    let command = Cli::command();
    for sub in command.get_subcommands() {
        let target = out_dir.join(format!("{BIN_NAME}-{}.1", sub.get_name()));
        render_page(sub.clone(), &target)?;
    }
    render_page(command, &out_dir.join(format!("{BIN_NAME}.1")))?;

    Ok(())
}
