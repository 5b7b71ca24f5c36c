//! Tern terminal emulator

use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use tern_core::Term;
use tern_pty::{Pty, SpawnOptions, WindowSize};

use tern_term::clipboard::SystemClipboard;
use tern_term::config::{CliArgs, Config};
use tern_term::font::{FontProvider, SystemFonts};
use tern_term::render::Renderer;
use tern_term::{event_loop, window, App};

fn spawn_options(config: &Config, size: WindowSize) -> SpawnOptions {
    let mut opts = SpawnOptions::shell(&config.term, size);
    if let Some((program, args)) = config.command.split_first() {
        opts.program = program.clone();
        opts.args = args.to_vec();
    } else if let Some(shell) = &config.shell {
        opts.program = shell.clone();
    }
    opts
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug for more detail
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = CliArgs::parse();
    let config = match Config::load_with_args(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("Font: {} @ {}px", config.font.family, config.font.size);

    let mut fonts = SystemFonts::new(&config.font.family, &config.font.fallbacks, config.font.size);
    let faces = fonts.load(config.font.size)?;
    let renderer = Renderer::new(faces, config.colors.palette(), config.render_options());

    let (cols, rows) = config.dimensions;
    let (cw, ch) = renderer.cell_size();
    let width = 2 * config.border_px + cols as u32 * cw;
    let height = 2 * config.border_px + rows as u32 * ch;
    let (mut display, canvas) = window::open(&config.title, width, height)?;

    let size = WindowSize::new(cols, rows, (cols as u32 * cw) as u16, (rows as u32 * ch) as u16);
    let opts = spawn_options(&config, size);
    log::info!("Starting {} on a {}x{} terminal", opts.program, cols, rows);
    let pty = Rc::new(RefCell::new(Pty::spawn(&opts)?));

    let mut app = App::new(
        Term::new(cols as usize, rows as usize),
        canvas,
        renderer,
        Box::new(fonts),
        Box::new(pty.clone()),
        Box::new(SystemClipboard::new()),
        &config,
    );

    event_loop::run(&mut app, &pty, &mut display)?;

    log::debug!("Tern exited");
    Ok(())
}
