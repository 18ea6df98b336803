//! # Engine Module
//!
//! The concurrency shell around the simulation. One single-threaded loop
//! owns every piece of mutable world state and resolves intents strictly one
//! at a time; any number of front-ends talk to it over two kinds of channel:
//! a shared many-producer intent queue inbound, and one bounded snapshot
//! channel per front-end outbound.
//!
//! After each resolved intent the loop awaits delivery of the fresh snapshot
//! to every attached front-end. A slow consumer therefore stalls the whole
//! simulation; for a turn-based game ticking at human speed that is the
//! intended backpressure, not a bug.

use crate::game::{Intent, Level, Player, TurnOutcome, World};
use crate::{WarrenError, WarrenResult};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifies one attached front-end, so close-window intents can name the
/// channel to detach.
pub type ClientId = Uuid;

/// Depth of the shared inbound intent queue.
const INTENT_QUEUE_DEPTH: usize = 32;

/// Depth of each outbound snapshot channel. One: a front-end that has not
/// drawn the previous turn yet blocks the next one.
const SNAPSHOT_QUEUE_DEPTH: usize = 1;

/// A read-only view of the world after one resolved turn: the current level
/// with its visibility flags, monsters, items, and event log, plus the
/// player and the terminal-state tag.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub level: Level,
    pub player: Player,
    pub outcome: TurnOutcome,
}

/// Owns the world and the channel fan-out.
///
/// Front-ends are attached before the engine starts, each receiving an id
/// and a snapshot receiver; all of them share the intent sender. [`Engine::run`]
/// then consumes the engine and loops until quit, player death, or the last
/// front-end detaching.
pub struct Engine {
    world: World,
    intent_tx: mpsc::Sender<(ClientId, Intent)>,
    intent_rx: mpsc::Receiver<(ClientId, Intent)>,
    clients: HashMap<ClientId, mpsc::Sender<Snapshot>>,
}

impl Engine {
    pub fn new(world: World) -> Self {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE_DEPTH);
        Self {
            world,
            intent_tx,
            intent_rx,
            clients: HashMap::new(),
        }
    }

    /// A sender handle for pushing `(client, intent)` pairs at the engine.
    /// Clone freely; the queue is many-producer.
    pub fn intent_sender(&self) -> mpsc::Sender<(ClientId, Intent)> {
        self.intent_tx.clone()
    }

    /// Attaches a front-end, returning its id and the channel its snapshots
    /// will arrive on.
    pub fn attach(&mut self) -> (ClientId, mpsc::Receiver<Snapshot>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SNAPSHOT_QUEUE_DEPTH);
        self.clients.insert(id, tx);
        log::info!("front-end {id} attached ({} total)", self.clients.len());
        (id, rx)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    fn snapshot(&self, outcome: TurnOutcome) -> Snapshot {
        Snapshot {
            level: self.world.current_level().clone(),
            player: self.world.player.clone(),
            outcome,
        }
    }

    /// Hands the current snapshot to every attached front-end, blocking on
    /// each in turn. Front-ends whose receiver is gone are dropped from the
    /// fan-out set.
    async fn broadcast(&mut self, outcome: TurnOutcome) {
        let snapshot = self.snapshot(outcome);
        let mut dead = Vec::new();
        for (id, tx) in &self.clients {
            if tx.send(snapshot.clone()).await.is_err() {
                dead.push(*id);
            }
        }
        for id in dead {
            log::warn!("front-end {id} dropped its receiver, detaching");
            self.clients.remove(&id);
        }
    }

    /// The simulation loop. Runs until a quit intent, the player's death,
    /// or the last front-end detaching.
    ///
    /// Invalid intents are a normal part of play (a front-end letting the
    /// user try to equip a potion, say): the turn is rejected, logged, and
    /// re-broadcast so the sender sees the unchanged world. Precondition
    /// violations are front-end programming bugs and abort the loop with
    /// the error.
    pub async fn run(mut self) -> WarrenResult<()> {
        self.broadcast(TurnOutcome::Ongoing).await;

        while let Some((client, intent)) = self.intent_rx.recv().await {
            match intent {
                Intent::Quit => {
                    log::info!("quit intent received, stopping");
                    break;
                }
                Intent::CloseWindow => {
                    self.clients.remove(&client);
                    log::info!("front-end {client} closed ({} left)", self.clients.len());
                    if self.clients.is_empty() {
                        break;
                    }
                }
                _ => {
                    let outcome = match self.world.apply_intent(&intent) {
                        Ok(outcome) => outcome,
                        Err(WarrenError::InvalidIntent(reason)) => {
                            log::warn!("rejected intent from front-end {client}: {reason}");
                            TurnOutcome::Ongoing
                        }
                        Err(err) => return Err(err),
                    };
                    self.broadcast(outcome).await;
                    if outcome == TurnOutcome::PlayerDied {
                        log::info!("player died, stopping");
                        break;
                    }
                    if self.clients.is_empty() {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
