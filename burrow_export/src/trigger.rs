//! Trigger derivation.
//!
//! One `Trigger` is derived per editor object during the single build pass:
//! quest gating resolves to a `[qbegin, qend]` quest window, flag references
//! resolve to one flag id, and the kind-specific payload resolves every
//! string cross-reference (item, dialog, map gate) to its runtime index.
//! The result is immutable and exists only to be serialized.

use burrow_data::ObjectDef;
use thiserror::Error;

use crate::world::{
    Atlas, DialogSet, ItemSet, MapSheet, QuestBook, RoomSlot, WorldError, FLAG_NONE, QUEST_UNBOUNDED, ROOM_PIXELS,
};

/// Errors that abort the build while deriving a trigger.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("unknown trigger kind '{kind}' for object '{object}' in map '{map}'")]
    UnknownKind { kind: String, object: String, map: String },
    #[error("unknown quest '{quest}' for object '{object}' in map '{map}'")]
    UnknownQuest { quest: String, object: String, map: String },
    #[error("quest flag '{flag}' is not defined on quest '{quest}' (object '{object}' in map '{map}')")]
    UndefinedQuestFlag {
        flag: String,
        quest: String,
        object: String,
        map: String,
    },
    #[error("minquest '{min}' ordered after maxquest '{max}' for object '{object}' in map '{map}'")]
    QuestRangeInverted {
        min: String,
        max: String,
        object: String,
        map: String,
    },
    #[error("missing '{prop}' property for object '{object}' in map '{map}'")]
    MissingProp {
        prop: &'static str,
        object: String,
        map: String,
    },
    #[error("item '{item}' is undefined (object '{object}' in map '{map}')")]
    UnknownItem { item: String, object: String, map: String },
    #[error("malformed gateway target '{target}' for object '{object}' in map '{map}'")]
    MalformedTarget { target: String, object: String, map: String },
    #[error("unknown target map '{target}' for object '{object}' in map '{map}'")]
    UnknownTargetMap { target: String, object: String, map: String },
    #[error("unknown gate '{gate}' on map '{target}' (object '{object}' in map '{map}')")]
    UnknownTargetGate {
        gate: String,
        target: String,
        object: String,
        map: String,
    },
    #[error("invalid dialog id '{dialog}' for object '{object}' in map '{map}'")]
    UnknownDialog { dialog: String, object: String, map: String },
    #[error("unknown ontrigger event '{event}' for object '{object}' in map '{map}'")]
    UnknownEvent { event: String, object: String, map: String },
    #[error("object '{object}' lies outside room ({x},{y}) in map '{map}'")]
    ObjectOutsideRoom {
        object: String,
        map: String,
        x: u32,
        y: u32,
    },
    #[error(transparent)]
    World(#[from] WorldError),
}

/// Trigger kind, matching the editor keyword. Records of each kind land in
/// their own output array, so the kind never appears in the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Gateway,
    Item,
    Npc,
}

impl TriggerKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gateway" => Some(TriggerKind::Gateway),
            "item" => Some(TriggerKind::Item),
            "npc" => Some(TriggerKind::Npc),
            _ => None,
        }
    }
}

/// Lifecycle hook fired when the trigger activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerEvent {
    #[default]
    None,
    AdvanceQuestAndRefresh,
    AdvanceQuestAndTeleport,
}

impl TriggerEvent {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "advancequestandrefresh" => Some(TriggerEvent::AdvanceQuestAndRefresh),
            "advancequestandteleport" => Some(TriggerEvent::AdvanceQuestAndTeleport),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            TriggerEvent::None => 0,
            TriggerEvent::AdvanceQuestAndRefresh => 1,
            TriggerEvent::AdvanceQuestAndTeleport => 2,
        }
    }
}

/// Kind-specific payload, fully resolved to runtime indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPayload {
    Gateway { map: u8, gate: u8, x: u32, y: u32 },
    Item { item: u8 },
    Npc { dialog: u8, x: u32, y: u32 },
}

/// Read-only room/map context for one object's derivation.
#[derive(Debug)]
pub struct TriggerContext<'w> {
    pub map: &'w MapSheet,
    pub room: RoomSlot,
    pub atlas: &'w Atlas,
    pub items: &'w ItemSet,
    pub dialogs: &'w DialogSet,
}

/// A compiled trigger record: quest window, flag id, room local id, event
/// hook, and the kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// Lowercase object name; also the default flag name for item pickups.
    pub id: String,
    pub qbegin: u8,
    pub qend: u8,
    pub flagid: u8,
    pub room_lid: u8,
    pub event: TriggerEvent,
    pub payload: TriggerPayload,
}

impl Trigger {
    /// Derive a trigger from one editor object and its room/map context.
    ///
    /// The quest book is mutable because item pickups and `unlockflag`
    /// properties allocate flags on first use.
    ///
    /// # Errors
    /// - `TriggerError` on any unresolved reference, malformed property, or
    ///   exhausted flag space; the build aborts on the first failure.
    pub fn from_object(obj: &ObjectDef, ctx: &TriggerContext<'_>, quests: &mut QuestBook) -> Result<Self, TriggerError> {
        let id = obj.name.to_lowercase();
        let map = ctx.map;
        let kind = TriggerKind::from_keyword(&obj.kind).ok_or_else(|| TriggerError::UnknownKind {
            kind: obj.kind.clone(),
            object: obj.name.clone(),
            map: map.id.clone(),
        })?;

        let find_quest = |name: &str, quests: &QuestBook| {
            quests.find(name).ok_or_else(|| TriggerError::UnknownQuest {
                quest: name.to_string(),
                object: obj.name.clone(),
                map: map.id.clone(),
            })
        };

        // Quest gating, by priority: explicit quest, explicit min/max range,
        // inherited map quest, none.
        let mut quest = None;
        let mut minquest = None;
        let mut maxquest = None;
        let mut qflag = None;
        let mut unlockflag = None;

        if let Some(name) = obj.props.get("quest") {
            let q = find_quest(name, quests)?;
            quest = Some(q);
            minquest = Some(q);
            maxquest = Some(q);
            if let Some(flag) = obj.props.get("questflag") {
                // Explicit quests only reference flags already in their namespace.
                qflag = Some(
                    quests
                        .quest_flag(q, flag)
                        .ok_or_else(|| TriggerError::UndefinedQuestFlag {
                            flag: flag.clone(),
                            quest: name.clone(),
                            object: obj.name.clone(),
                            map: map.id.clone(),
                        })?,
                );
            }
        } else {
            if let Some(name) = obj.props.get("minquest") {
                minquest = Some(find_quest(name, quests)?);
            }
            if let Some(name) = obj.props.get("maxquest") {
                maxquest = Some(find_quest(name, quests)?);
            }
            if let (Some(min), Some(max)) = (minquest, maxquest) {
                if min > max {
                    return Err(TriggerError::QuestRangeInverted {
                        min: obj.props["minquest"].clone(),
                        max: obj.props["maxquest"].clone(),
                        object: obj.name.clone(),
                        map: map.id.clone(),
                    });
                }
            }
        }

        if quest.is_none() && minquest.is_none() && maxquest.is_none() {
            if let Some(name) = &map.quest {
                let q = find_quest(name, quests)?;
                quest = Some(q);
                minquest = Some(q);
                maxquest = Some(q);
                if let Some(flag) = obj.props.get("questflag") {
                    qflag = Some(quests.add_quest_flag_if_undefined(q, flag)?);
                }
            }
        }

        if quest.is_none() {
            if let Some(flag) = obj.props.get("unlockflag") {
                unlockflag = Some(quests.add_global_flag_if_undefined(flag)?);
            }
        }

        let require = |prop: &'static str| -> Result<&String, TriggerError> {
            obj.props.get(prop).ok_or_else(|| TriggerError::MissingProp {
                prop,
                object: obj.name.clone(),
                map: map.id.clone(),
            })
        };

        let payload = match kind {
            TriggerKind::Item => {
                let item = require("id")?;
                let numeric = ctx.items.numeric_id(item).ok_or_else(|| TriggerError::UnknownItem {
                    item: item.clone(),
                    object: obj.name.clone(),
                    map: map.id.clone(),
                })?;
                // Every pickup is remembered somewhere: fall back to a flag
                // named after the trigger itself.
                if let Some(q) = quest {
                    if qflag.is_none() {
                        qflag = Some(quests.add_quest_flag_if_undefined(q, &id)?);
                    }
                } else if unlockflag.is_none() {
                    unlockflag = Some(quests.add_global_flag_if_undefined(&id)?);
                }
                TriggerPayload::Item { item: numeric }
            },
            TriggerKind::Gateway => {
                let target = require("target")?;
                let (target_map, target_gate) =
                    parse_gate_target(target).ok_or_else(|| TriggerError::MalformedTarget {
                        target: target.clone(),
                        object: obj.name.clone(),
                        map: map.id.clone(),
                    })?;
                let sheet = ctx
                    .atlas
                    .sheet(&target_map)
                    .ok_or_else(|| TriggerError::UnknownTargetMap {
                        target: target_map.clone(),
                        object: obj.name.clone(),
                        map: map.id.clone(),
                    })?;
                let gate = sheet.gate(&target_gate).ok_or_else(|| TriggerError::UnknownTargetGate {
                    gate: target_gate.clone(),
                    target: target_map.clone(),
                    object: obj.name.clone(),
                    map: map.id.clone(),
                })?;
                let (x, y) = local_position(obj, ctx.room).ok_or_else(|| outside_room(obj, ctx))?;
                TriggerPayload::Gateway {
                    map: sheet.index,
                    gate,
                    x,
                    y,
                }
            },
            TriggerKind::Npc => {
                let dialog = require("id")?.to_lowercase();
                let index = ctx
                    .dialogs
                    .index_of(&dialog)
                    .ok_or_else(|| TriggerError::UnknownDialog {
                        dialog: dialog.clone(),
                        object: obj.name.clone(),
                        map: map.id.clone(),
                    })?;
                let (x, y) = local_position(obj, ctx.room).ok_or_else(|| outside_room(obj, ctx))?;
                TriggerPayload::Npc { dialog: index, x, y }
            },
        };

        let event = match obj.props.get("ontrigger") {
            Some(raw) => TriggerEvent::from_keyword(&raw.to_lowercase()).ok_or_else(|| TriggerError::UnknownEvent {
                event: raw.clone(),
                object: obj.name.clone(),
                map: map.id.clone(),
            })?,
            None => TriggerEvent::None,
        };

        Ok(Trigger {
            id,
            qbegin: minquest.unwrap_or(QUEST_UNBOUNDED),
            qend: maxquest.unwrap_or(QUEST_UNBOUNDED),
            flagid: qflag.or(unlockflag).unwrap_or(FLAG_NONE),
            room_lid: ctx.room.lid,
            event,
            payload,
        })
    }

    pub fn kind(&self) -> TriggerKind {
        match self.payload {
            TriggerPayload::Gateway { .. } => TriggerKind::Gateway,
            TriggerPayload::Item { .. } => TriggerKind::Item,
            TriggerPayload::Npc { .. } => TriggerKind::Npc,
        }
    }

    /// Whether the trigger is live while the given quest is current: its
    /// index must fall inside `[qbegin, qend]`, with 0xff bounds unbounded.
    pub fn is_active_for(&self, quest_index: u8) -> bool {
        if self.qbegin != QUEST_UNBOUNDED && quest_index < self.qbegin {
            return false;
        }
        if self.qend != QUEST_UNBOUNDED && quest_index > self.qend {
            return false;
        }
        true
    }

    /// Common header literal: quest window, flag id, room local id, event code.
    pub fn header_record(&self) -> String {
        format!(
            "{{0x{:x},0x{:x},0x{:x},0x{:x},0x{:x}}}",
            self.qbegin,
            self.qend,
            self.flagid,
            self.room_lid,
            self.event.code()
        )
    }

    /// Full fixed-size record literal for this trigger's kind.
    pub fn record(&self) -> String {
        match self.payload {
            TriggerPayload::Item { item } => format!("{{ {},0x{item:x}}}", self.header_record()),
            TriggerPayload::Gateway { map, gate, x, y } => {
                format!("{{ {},0x{map:x},0x{gate:x},0x{x:x},0x{y:x}}}", self.header_record())
            },
            TriggerPayload::Npc { dialog, x, y } => {
                format!("{{ {},0x{dialog:x},0x{x:x},0x{y:x}}}", self.header_record())
            },
        }
    }
}

/// Center of the object's pixel rect, relative to its room's 128x128 block.
/// `None` when the object does not lie inside the room.
pub fn local_position(obj: &ObjectDef, room: RoomSlot) -> Option<(u32, u32)> {
    let x = (obj.px + obj.pw / 2).checked_sub(ROOM_PIXELS * room.x)?;
    let y = (obj.py + obj.ph / 2).checked_sub(ROOM_PIXELS * room.y)?;
    (x < ROOM_PIXELS && y < ROOM_PIXELS).then_some((x, y))
}

fn parse_gate_target(raw: &str) -> Option<(String, String)> {
    let ident = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let (map, gate) = raw.split_once(':')?;
    (ident(map) && ident(gate)).then(|| (map.to_lowercase(), gate.to_lowercase()))
}

fn outside_room(obj: &ObjectDef, ctx: &TriggerContext<'_>) -> TriggerError {
    TriggerError::ObjectOutsideRoom {
        object: obj.name.clone(),
        map: ctx.map.id.clone(),
        x: ctx.room.x,
        y: ctx.room.y,
    }
}
