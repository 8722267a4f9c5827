//! Capsulefall: a falling-capsule, virus-clearing puzzle. Plays a scripted session from stdin
//! by default, or an interactive game in the terminal.

mod app;
mod command;
mod dealer;
mod grid;
mod input;
mod matching;
mod physics;
mod piece;
mod render;
mod script;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::time::{SystemTime, UNIX_EPOCH};

/// Options for the interactive game derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    pub viruses: usize,
    pub seed: u32,
    /// Ticks per second.
    pub tick_rate: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if !args.interactive {
        let stdin = std::io::stdin();
        return script::run_script(stdin.lock(), std::io::stdout().lock());
    }

    let theme = theme::Theme::for_palette(args.palette).context("failed to build palette")?;
    let seed = args.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0x1234_5678)
    });
    let config = GameConfig {
        rows: args.rows,
        columns: args.columns,
        viruses: args.viruses,
        seed,
        tick_rate: args.tick_rate,
    };
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// Falling-capsule puzzle: line up four of a colour to clear viruses.
#[derive(Debug, Parser)]
#[command(
    name = "capsulefall",
    version,
    about = "Falling-capsule puzzle. Line up four of a colour to clear the viruses.",
    long_about = "Capsulefall is a falling-capsule puzzle.\n\n\
        Without flags it reads a scripted session from stdin: the row count, the column count, \
        EMPTY or CONTENTS (followed by one line per row), then one command per line: \
        F <a> <b> (new faller), V <row> <col> <colour> (virus), A / B (rotate), < / > (move), \
        an empty line (let time pass) and Q (quit). The field is printed after every command.\n\n\
        With --interactive it plays in the terminal.\n\n\
        CONTROLS:\n  Left/Right h/l  Move    Up k x  Rotate CW   z u  Rotate CCW\n  \
        Down j          Drop    P       Pause       R    Restart   Q / Esc  Quit"
)]
pub struct Args {
    /// Play in the terminal instead of reading a script from stdin.
    #[arg(short, long)]
    pub interactive: bool,

    /// Field height in rows.
    #[arg(long, default_value = "16", value_name = "ROWS")]
    pub rows: usize,

    /// Field width in columns.
    #[arg(long, default_value = "8", value_name = "COLS")]
    pub columns: usize,

    /// Viruses dealt at the start of each level.
    #[arg(long, default_value = "12", value_name = "N")]
    pub viruses: usize,

    /// Seed for colours and virus layout. Random if not set.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u32>,

    /// Game ticks per second.
    #[arg(long, default_value = "2.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Colour palette: normal, high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
