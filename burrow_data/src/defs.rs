use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier used across WorldDef references.
pub type Id = String;

/// Top-level build input: the object graph the exporter compiles from.
///
/// The editor/tile-map parsing that produces this graph lives upstream of
/// this crate; by the time a `WorldDef` exists, every entity is a plain
/// record and every cross-reference is a string id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldDef {
    #[serde(default)]
    pub quests: Vec<QuestDef>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub dialogs: Vec<DialogDef>,
    #[serde(default)]
    pub maps: Vec<MapDef>,
}

/// A quest in book order. The declaration index is the quest's ordering
/// index, which trigger quest windows (`minquest`/`maxquest`) compare against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: Id,
    /// Flags pre-declared on this quest, in allocation order. Triggers may
    /// also allocate further quest flags on demand during compilation.
    #[serde(default)]
    pub flags: Vec<String>,
}

/// An item the runtime can hand out; declaration order fixes its numeric id
/// (1-based, 0 is reserved for "no item").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: Id,
}

/// A dialog script an NPC trigger can start; declaration order fixes its index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogDef {
    pub id: Id,
}

/// One tile map: a `width` x `height` grid of rooms plus its named gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDef {
    pub id: Id,
    /// Map width in rooms.
    pub width: u32,
    /// Map height in rooms.
    pub height: u32,
    /// Quest this whole map belongs to. Triggers placed on the map that carry
    /// no quest gating of their own inherit it.
    pub quest: Option<Id>,
    #[serde(default)]
    pub gates: Vec<GateDef>,
    #[serde(default)]
    pub rooms: Vec<RoomDef>,
}

/// A named exit point on a map; declaration order fixes its index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDef {
    pub id: Id,
}

/// One room slot on the map grid. The room's local id is `y * width + x`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDef {
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub objects: Vec<ObjectDef>,
}

/// An editor object placed in a room: a pixel rect, a kind keyword, and the
/// free-form property bag the editor attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    /// Trigger kind keyword: `gateway`, `item`, or `npc`.
    pub kind: String,
    #[serde(default)]
    pub px: u32,
    #[serde(default)]
    pub py: u32,
    #[serde(default)]
    pub pw: u32,
    #[serde(default)]
    pub ph: u32,
    #[serde(default)]
    pub props: BTreeMap<String, String>,
}
