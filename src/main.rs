//! # Warren Main Entry Point
//!
//! Loads an authored world from disk, starts the simulation engine, and
//! attaches one plain-text front-end reading single-letter commands from
//! stdin. The front-end is deliberately thin: it only draws snapshots and
//! translates keystrokes into intents, exactly like any external renderer
//! would.

use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use warren::{
    ClientId, Direction, Engine, Intent, Overlay, Snapshot, Terrain, TurnOutcome, WarrenResult,
};

/// Command line arguments for the warren engine.
#[derive(Parser, Debug)]
#[command(name = "warren")]
#[command(about = "A turn-based dungeon crawl engine")]
#[command(version)]
struct Args {
    /// Directory holding the .map files and world.txt linkage table
    #[arg(default_value = "maps")]
    world_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> WarrenResult<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    log::info!("starting warren v{}", warren::VERSION);
    let world = warren::loading::load_world_dir(&args.world_dir)?;

    let mut engine = Engine::new(world);
    let (client, snapshots) = engine.attach();
    let intents = engine.intent_sender();

    let front_end = tokio::spawn(run_front_end(client, snapshots, intents));
    engine.run().await?;
    front_end.abort();
    log::info!("engine stopped");
    Ok(())
}

/// The bundled text front-end: draws each snapshot, reads commands, sends
/// intents back. Exits when the engine's snapshot channel closes.
async fn run_front_end(
    client: ClientId,
    mut snapshots: mpsc::Receiver<Snapshot>,
    intents: mpsc::Sender<(ClientId, Intent)>,
) {
    println!("commands: w/a/s/d move, g take all, t N take, x N drop, e N equip, i inventory, q quit");
    let mut latest: Option<Snapshot> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            snapshot = snapshots.recv() => {
                let Some(snapshot) = snapshot else { return };
                draw(&snapshot);
                if snapshot.outcome == TurnOutcome::PlayerDied {
                    println!("You died.");
                    return;
                }
                latest = Some(snapshot);
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { return };
                match parse_command(line.trim(), latest.as_ref()) {
                    Some(intent) => {
                        let quitting = intent == Intent::Quit;
                        if intents.send((client, intent)).await.is_err() || quitting {
                            return;
                        }
                    }
                    None => {}
                }
            }
        }
    }
}

fn parse_command(line: &str, latest: Option<&Snapshot>) -> Option<Intent> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let index: Option<usize> = words.next().and_then(|word| word.parse().ok());

    match command {
        "w" => Some(Intent::Move(Direction::North)),
        "s" => Some(Intent::Move(Direction::South)),
        "a" => Some(Intent::Move(Direction::West)),
        "d" => Some(Intent::Move(Direction::East)),
        "g" => Some(Intent::TakeAll),
        "q" => Some(Intent::Quit),
        "t" => {
            let snapshot = latest?;
            let ground = snapshot.level.items.get(&snapshot.player.pos())?;
            ground.get(index?).map(|item| Intent::Take(item.id))
        }
        "x" => {
            let snapshot = latest?;
            snapshot
                .player
                .character
                .inventory
                .get(index?)
                .map(|item| Intent::Drop(item.id))
        }
        "e" => {
            let snapshot = latest?;
            snapshot
                .player
                .character
                .inventory
                .get(index?)
                .map(|item| Intent::Equip(item.id))
        }
        "i" => {
            if let Some(snapshot) = latest {
                for (idx, item) in snapshot.player.character.inventory.iter().enumerate() {
                    println!("  {idx}: {}", item.name());
                }
            }
            None
        }
        _ => None,
    }
}

/// Renders one snapshot as ASCII: lit cells in full, remembered cells
/// dimmed, unexplored cells blank.
fn draw(snapshot: &Snapshot) {
    let level = &snapshot.level;
    let player_pos = snapshot.player.pos();

    println!();
    for y in 0..level.grid.height() as i32 {
        let mut line = String::new();
        for x in 0..level.grid.width() as i32 {
            let pos = warren::Position::new(x, y);
            let tile = match level.grid.get(pos) {
                Some(tile) => tile,
                None => continue,
            };
            if !tile.seen {
                line.push(' ');
                continue;
            }

            let glyph = if pos == player_pos {
                '@'
            } else if let Some(monster) = level.monsters.get(&pos).filter(|_| tile.visible) {
                monster.character.entity.glyph
            } else if let Some(item) = level
                .items
                .get(&pos)
                .and_then(|stack| stack.last())
                .filter(|_| tile.visible)
            {
                item.entity.glyph
            } else {
                match tile.overlay {
                    Overlay::ClosedDoor => '|',
                    Overlay::OpenDoor => '/',
                    Overlay::StairsUp => 'U',
                    Overlay::StairsDown => 'D',
                    Overlay::Coin => '$',
                    Overlay::None => match tile.terrain {
                        Terrain::StoneWall => '#',
                        Terrain::DirtFloor => '.',
                        Terrain::Blank => ' ',
                    },
                }
            };

            if tile.visible {
                line.push(glyph);
            } else {
                // remembered but unlit
                line.push_str(&format!("\x1b[2m{glyph}\x1b[0m"));
            }
        }
        println!("{line}");
    }

    println!(
        "hp {}  coins {}  [{}]",
        snapshot.player.character.hp,
        level.coins,
        level.name
    );
    for event in level.events.iter() {
        println!("  {event}");
    }
}
