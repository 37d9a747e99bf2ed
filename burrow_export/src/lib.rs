//! burrow_export: build-time compiler for Burrow map triggers
//!
//! Takes the `burrow_data::WorldDef` object graph produced upstream of this
//! crate (quests, items, dialogs, tile maps with editor objects), derives one
//! fixed-size trigger record per object, and emits the records as C array
//! literals for the game runtime.
//!
//! The pass is linear and single-shot: registries are built once, each
//! object is compiled once, and any malformed input aborts the build with a
//! `CompileError`.

pub mod emit;
pub mod trigger;
pub mod world;

pub use emit::render_source;
pub use trigger::{Trigger, TriggerContext, TriggerError, TriggerEvent, TriggerKind, TriggerPayload};
pub use world::{Atlas, DialogSet, ItemSet, MapSheet, QuestBook, RoomSlot, World, WorldError};

use burrow_data::WorldDef;
use log::info;
use thiserror::Error;

/// Any error that aborts a build.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    World(#[from] WorldError),
    #[error(transparent)]
    Trigger(#[from] TriggerError),
    #[error("world registries do not match the map definitions (map '{map}')")]
    AtlasOutOfSync { map: String },
}

/// Compiled triggers for one map, grouped by record kind.
#[derive(Debug)]
pub struct MapTriggers {
    pub map_id: String,
    pub items: Vec<Trigger>,
    pub gateways: Vec<Trigger>,
    pub npcs: Vec<Trigger>,
}

impl MapTriggers {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.gateways.is_empty() && self.npcs.is_empty()
    }
}

/// Compile the whole world and render the generated source file.
///
/// # Errors
/// - `CompileError` on any malformed definition or unresolved reference.
pub fn compile_world_to_source(def: &WorldDef) -> Result<String, CompileError> {
    let mut world = World::from_def(def)?;
    let compiled = compile_world_triggers(def, &mut world)?;
    Ok(render_source(&compiled))
}

/// Compile every trigger object in the world, map by map in declaration
/// order. The quest book in `world` picks up any flags allocated on demand,
/// so later pipeline stages see the full flag table.
///
/// # Errors
/// - `CompileError` on the first object that fails to resolve, or when
///   `world` was not built from `def`.
pub fn compile_world_triggers(def: &WorldDef, world: &mut World) -> Result<Vec<MapTriggers>, CompileError> {
    let mut compiled = Vec::new();
    for map_def in &def.maps {
        let mut bucket = MapTriggers {
            map_id: map_def.id.clone(),
            items: Vec::new(),
            gateways: Vec::new(),
            npcs: Vec::new(),
        };
        for room_def in &map_def.rooms {
            for obj in &room_def.objects {
                let sheet = world.atlas.sheet(&map_def.id).ok_or_else(|| CompileError::AtlasOutOfSync {
                    map: map_def.id.clone(),
                })?;
                let room = sheet
                    .room(room_def.x, room_def.y)
                    .ok_or_else(|| CompileError::AtlasOutOfSync {
                        map: map_def.id.clone(),
                    })?;
                let ctx = TriggerContext {
                    map: sheet,
                    room,
                    atlas: &world.atlas,
                    items: &world.items,
                    dialogs: &world.dialogs,
                };
                let trigger = Trigger::from_object(obj, &ctx, &mut world.quests)?;
                match trigger.kind() {
                    TriggerKind::Item => bucket.items.push(trigger),
                    TriggerKind::Gateway => bucket.gateways.push(trigger),
                    TriggerKind::Npc => bucket.npcs.push(trigger),
                }
            }
        }
        info!(
            "map '{}': compiled {} item, {} gateway, {} npc trigger(s)",
            map_def.id,
            bucket.items.len(),
            bucket.gateways.len(),
            bucket.npcs.len()
        );
        compiled.push(bucket);
    }
    Ok(compiled)
}
