use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use anyhow::bail;
use crossterm::cursor;
use crossterm::execute;
use crossterm::queue;
use crossterm::style;
use crossterm::terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quadlife::World;
use quadlife::camera::Camera;

const USAGE: &str = "usage: quadlife [PATTERN.rle] [-g GENERATIONS] [-i MILLIS] [-W COLS] [-H ROWS]";

/// Command line options
struct Options {
    /// Pattern to load. Without one, the world starts with an R-pentomino.
    pattern: Option<PathBuf>,

    /// Number of generations to run. Runs forever if not given.
    generations: Option<u64>,

    /// Time between two frames
    interval: Duration,

    /// Size of the viewport, in cells
    width: usize,
    height: usize,
}

impl Options {
    fn parse() -> anyhow::Result<Self> {
        let mut options = Options {
            pattern: None,
            generations: None,
            interval: Duration::from_millis(100),
            width: 160,
            height: 96,
        };

        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .with_context(|| format!("{name} expects a value\n{USAGE}"))
            };

            match arg.as_str() {
                "-g" => options.generations = Some(value("-g")?.parse()?),
                "-i" => options.interval = Duration::from_millis(value("-i")?.parse()?),
                "-W" => options.width = value("-W")?.parse()?,
                "-H" => options.height = value("-H")?.parse()?,
                "-h" | "--help" => {
                    println!("{USAGE}");
                    std::process::exit(0);
                }
                flag if flag.starts_with('-') => bail!("Unknown option {flag}\n{USAGE}"),
                path => {
                    if options.pattern.is_some() {
                        bail!("Only one pattern can be given\n{USAGE}");
                    }

                    options.pattern = Some(PathBuf::from(path));
                }
            }
        }

        Ok(options)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let options = Options::parse()?;
    let mut world = World::new();

    match &options.pattern {
        Some(path) => {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;

            world
                .load_rle(&data)
                .with_context(|| format!("Failed to load {}", path.display()))?;
        }
        None => {
            for (x, y) in [(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)] {
                world.set(x, y)?;
            }
        }
    }

    let mut cam = Camera::centred(options.width, options.height);
    let mut stdout = io::stdout();

    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;

    loop {
        let frame = Instant::now();

        cam.draw_world(&world);

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            style::Print(cam.render()),
            style::Print(format!(
                "generation {} population {}\n",
                world.generation(),
                world.population()
            )),
        )?;
        stdout.flush()?;

        if options.generations.is_some_and(|n| world.generation() >= n) {
            break;
        }

        world.step()?;

        if let Some(rest) = options.interval.checked_sub(frame.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    info!(
        generation = world.generation(),
        nodes = world.store().len(),
        "done"
    );

    Ok(())
}
