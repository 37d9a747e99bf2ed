//! Runtime lookup registries built once from a `WorldDef`.
//!
//! Every registry maps string ids from the editor onto the small integer
//! indexes the runtime records use. Indexes follow declaration order so a
//! rebuild of unchanged input emits identical records.

use std::collections::BTreeMap;

use burrow_data::{DialogDef, ItemDef, MapDef, QuestDef, RoomDef, WorldDef};
use thiserror::Error;

/// Sentinel quest index meaning "unbounded" in a trigger's quest window.
pub const QUEST_UNBOUNDED: u8 = 0xff;
/// Flag id meaning "no flag attached".
pub const FLAG_NONE: u8 = 0;
/// Rooms are square tile blocks this many pixels on a side.
pub const ROOM_PIXELS: u32 = 128;

/// Errors raised while building registries from a `WorldDef`.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("{count} {kind}s exceed the index space ({limit})")]
    IndexOverflow {
        kind: &'static str,
        count: usize,
        limit: usize,
    },
    #[error("flag space exhausted while defining '{name}'")]
    FlagOverflow { name: String },
    #[error("map '{map}' has empty dimensions")]
    EmptyMap { map: String },
    #[error("map '{map}' has {rooms} room slots; at most 256 fit a local room id")]
    RoomGridTooLarge { map: String, rooms: u64 },
    #[error("room ({x},{y}) out of bounds in map '{map}'")]
    RoomOutOfBounds { map: String, x: u32, y: u32 },
    #[error("duplicate room ({x},{y}) in map '{map}'")]
    DuplicateRoom { map: String, x: u32, y: u32 },
    #[error("unknown quest '{quest}' referenced by map '{map}'")]
    UnknownMapQuest { map: String, quest: String },
}

/// The quest registry: quest name -> ordering index, plus the flag namespace.
///
/// Flag ids come from a single sequence shared by quest-scoped flags and
/// global unlock flags, allocated 1..=255 in order of first definition.
/// Id 0 is reserved for "no flag".
#[derive(Debug, Default)]
pub struct QuestBook {
    /// Flag namespaces, one per quest, indexed by quest ordering index.
    quest_flags: Vec<BTreeMap<String, u8>>,
    by_name: BTreeMap<String, u8>,
    globals: BTreeMap<String, u8>,
    next_flag: u16,
}

impl QuestBook {
    fn from_defs(defs: &[QuestDef]) -> Result<Self, WorldError> {
        let mut book = QuestBook {
            next_flag: 1,
            ..QuestBook::default()
        };
        for (i, def) in defs.iter().enumerate() {
            // 0xff is the unbounded sentinel, so the last usable index is 0xfe.
            let index = u8::try_from(i)
                .ok()
                .filter(|index| *index < QUEST_UNBOUNDED)
                .ok_or(WorldError::IndexOverflow {
                    kind: "quest",
                    count: defs.len(),
                    limit: 255,
                })?;
            if book.by_name.insert(def.id.clone(), index).is_some() {
                return Err(WorldError::DuplicateId {
                    kind: "quest",
                    id: def.id.clone(),
                });
            }
            let mut flags = BTreeMap::new();
            for flag in &def.flags {
                if flags.contains_key(flag) {
                    return Err(WorldError::DuplicateId {
                        kind: "quest flag",
                        id: flag.clone(),
                    });
                }
                let gindex = book.alloc_flag(flag)?;
                flags.insert(flag.clone(), gindex);
            }
            book.quest_flags.push(flags);
        }
        Ok(book)
    }

    fn alloc_flag(&mut self, name: &str) -> Result<u8, WorldError> {
        let Ok(gindex) = u8::try_from(self.next_flag) else {
            return Err(WorldError::FlagOverflow { name: name.to_string() });
        };
        self.next_flag += 1;
        Ok(gindex)
    }

    /// Quest ordering index for a quest name.
    pub fn find(&self, name: &str) -> Option<u8> {
        self.by_name.get(name).copied()
    }

    /// Id of a flag already defined on the given quest.
    pub fn quest_flag(&self, quest: u8, flag: &str) -> Option<u8> {
        self.quest_flags[usize::from(quest)].get(flag).copied()
    }

    /// Reuse or allocate a flag in the given quest's namespace.
    pub fn add_quest_flag_if_undefined(&mut self, quest: u8, flag: &str) -> Result<u8, WorldError> {
        if let Some(gindex) = self.quest_flag(quest, flag) {
            return Ok(gindex);
        }
        let gindex = self.alloc_flag(flag)?;
        self.quest_flags[usize::from(quest)].insert(flag.to_string(), gindex);
        Ok(gindex)
    }

    /// Id of a global unlock flag, if defined.
    pub fn global_flag(&self, flag: &str) -> Option<u8> {
        self.globals.get(flag).copied()
    }

    /// Reuse or allocate a global unlock flag.
    pub fn add_global_flag_if_undefined(&mut self, flag: &str) -> Result<u8, WorldError> {
        if let Some(gindex) = self.globals.get(flag) {
            return Ok(*gindex);
        }
        let gindex = self.alloc_flag(flag)?;
        self.globals.insert(flag.to_string(), gindex);
        Ok(gindex)
    }

    /// Number of flags defined so far, across all namespaces.
    pub fn flag_count(&self) -> usize {
        usize::from(self.next_flag) - 1
    }
}

/// The item registry: item id -> numeric id (1-based; 0 means "no item").
#[derive(Debug, Default)]
pub struct ItemSet {
    by_id: BTreeMap<String, u8>,
}

impl ItemSet {
    fn from_defs(defs: &[ItemDef]) -> Result<Self, WorldError> {
        let mut by_id = BTreeMap::new();
        for (i, def) in defs.iter().enumerate() {
            let numeric = u8::try_from(i + 1).map_err(|_| WorldError::IndexOverflow {
                kind: "item",
                count: defs.len(),
                limit: 255,
            })?;
            if by_id.insert(def.id.clone(), numeric).is_some() {
                return Err(WorldError::DuplicateId {
                    kind: "item",
                    id: def.id.clone(),
                });
            }
        }
        Ok(Self { by_id })
    }

    pub fn numeric_id(&self, id: &str) -> Option<u8> {
        self.by_id.get(id).copied()
    }
}

/// The dialog registry: dialog id -> index (0-based).
#[derive(Debug, Default)]
pub struct DialogSet {
    by_id: BTreeMap<String, u8>,
}

impl DialogSet {
    fn from_defs(defs: &[DialogDef]) -> Result<Self, WorldError> {
        let mut by_id = BTreeMap::new();
        for (i, def) in defs.iter().enumerate() {
            let index = u8::try_from(i).map_err(|_| WorldError::IndexOverflow {
                kind: "dialog",
                count: defs.len(),
                limit: 256,
            })?;
            if by_id.insert(def.id.clone(), index).is_some() {
                return Err(WorldError::DuplicateId {
                    kind: "dialog",
                    id: def.id.clone(),
                });
            }
        }
        Ok(Self { by_id })
    }

    pub fn index_of(&self, id: &str) -> Option<u8> {
        self.by_id.get(id).copied()
    }
}

/// The map registry: map id -> indexed sheet with gates and room slots.
#[derive(Debug, Default)]
pub struct Atlas {
    sheets: BTreeMap<String, MapSheet>,
}

/// One indexed map: grid dimensions, inherited quest, gates, room slots.
#[derive(Debug)]
pub struct MapSheet {
    pub id: String,
    pub index: u8,
    pub width: u32,
    pub height: u32,
    /// Quest the whole map belongs to, inherited by ungated triggers.
    pub quest: Option<String>,
    gates: BTreeMap<String, u8>,
    rooms: BTreeMap<(u32, u32), RoomSlot>,
}

/// A room's place on its map grid. `lid` is the runtime's local room id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSlot {
    pub x: u32,
    pub y: u32,
    pub lid: u8,
}

impl Atlas {
    fn from_defs(defs: &[MapDef], quests: &QuestBook) -> Result<Self, WorldError> {
        let mut sheets = BTreeMap::new();
        for (i, def) in defs.iter().enumerate() {
            let index = u8::try_from(i).map_err(|_| WorldError::IndexOverflow {
                kind: "map",
                count: defs.len(),
                limit: 256,
            })?;
            let sheet = MapSheet::from_def(def, index, quests)?;
            if sheets.insert(def.id.clone(), sheet).is_some() {
                return Err(WorldError::DuplicateId {
                    kind: "map",
                    id: def.id.clone(),
                });
            }
        }
        Ok(Self { sheets })
    }

    pub fn sheet(&self, id: &str) -> Option<&MapSheet> {
        self.sheets.get(id)
    }
}

impl MapSheet {
    fn from_def(def: &MapDef, index: u8, quests: &QuestBook) -> Result<Self, WorldError> {
        if def.width == 0 || def.height == 0 {
            return Err(WorldError::EmptyMap { map: def.id.clone() });
        }
        let rooms = u64::from(def.width) * u64::from(def.height);
        if rooms > 256 {
            return Err(WorldError::RoomGridTooLarge { map: def.id.clone(), rooms });
        }
        if let Some(quest) = &def.quest {
            if quests.find(quest).is_none() {
                return Err(WorldError::UnknownMapQuest {
                    map: def.id.clone(),
                    quest: quest.clone(),
                });
            }
        }

        let mut gates = BTreeMap::new();
        for (i, gate) in def.gates.iter().enumerate() {
            let gate_index = u8::try_from(i).map_err(|_| WorldError::IndexOverflow {
                kind: "gate",
                count: def.gates.len(),
                limit: 256,
            })?;
            if gates.insert(gate.id.clone(), gate_index).is_some() {
                return Err(WorldError::DuplicateId {
                    kind: "gate",
                    id: gate.id.clone(),
                });
            }
        }

        let mut rooms = BTreeMap::new();
        for room in &def.rooms {
            let slot = room_slot(def, room)?;
            if rooms.insert((room.x, room.y), slot).is_some() {
                return Err(WorldError::DuplicateRoom {
                    map: def.id.clone(),
                    x: room.x,
                    y: room.y,
                });
            }
        }

        Ok(Self {
            id: def.id.clone(),
            index,
            width: def.width,
            height: def.height,
            quest: def.quest.clone(),
            gates,
            rooms,
        })
    }

    pub fn gate(&self, id: &str) -> Option<u8> {
        self.gates.get(id).copied()
    }

    pub fn room(&self, x: u32, y: u32) -> Option<RoomSlot> {
        self.rooms.get(&(x, y)).copied()
    }
}

fn room_slot(map: &MapDef, room: &RoomDef) -> Result<RoomSlot, WorldError> {
    if room.x >= map.width || room.y >= map.height {
        return Err(WorldError::RoomOutOfBounds {
            map: map.id.clone(),
            x: room.x,
            y: room.y,
        });
    }
    // In-bounds on a <=256-slot grid, so the local id fits a byte.
    let lid = u8::try_from(room.y * map.width + room.x).map_err(|_| WorldError::RoomGridTooLarge {
        map: map.id.clone(),
        rooms: u64::from(map.width) * u64::from(map.height),
    })?;
    Ok(RoomSlot {
        x: room.x,
        y: room.y,
        lid,
    })
}

/// All registries for one build, ready for trigger compilation.
///
/// The quest book stays mutable across the trigger pass because item and
/// unlock flags are allocated on first use.
#[derive(Debug)]
pub struct World {
    pub quests: QuestBook,
    pub items: ItemSet,
    pub dialogs: DialogSet,
    pub atlas: Atlas,
}

impl World {
    /// Build every registry from the definition graph.
    ///
    /// # Errors
    /// - `WorldError` on duplicate ids, bad room geometry, unresolvable map
    ///   quests, or exhausted index spaces.
    pub fn from_def(def: &WorldDef) -> Result<Self, WorldError> {
        let quests = QuestBook::from_defs(&def.quests)?;
        let items = ItemSet::from_defs(&def.items)?;
        let dialogs = DialogSet::from_defs(&def.dialogs)?;
        let atlas = Atlas::from_defs(&def.maps, &quests)?;
        Ok(Self {
            quests,
            items,
            dialogs,
            atlas,
        })
    }
}
