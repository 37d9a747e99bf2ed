use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::*;

/// Trigger kind keywords the exporter understands.
pub const OBJECT_KINDS: [&str; 3] = ["gateway", "item", "npc"];

/// Validation error for malformed or missing references in a WorldDef.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    MissingReference { kind: &'static str, id: String, context: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} id '{id}'")
            },
            ValidationError::MissingReference { kind, id, context } => {
                write!(f, "missing {kind} '{id}' ({context})")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate cross-references and basic invariants in a WorldDef.
///
/// This is the pre-flight lint for build input: it reports every finding
/// instead of stopping at the first, so an editor session can fix a batch of
/// problems at once. The exporter re-checks the same invariants as hard
/// errors during compilation.
///
/// ```
/// use burrow_data::{MapDef, WorldDef, validate_world};
///
/// let world = WorldDef {
///     maps: vec![MapDef {
///         id: "village".into(),
///         width: 2,
///         height: 2,
///         quest: None,
///         gates: Vec::new(),
///         rooms: Vec::new(),
///     }],
///     ..WorldDef::default()
/// };
/// assert!(validate_world(&world).is_empty());
/// ```
pub fn validate_world(world: &WorldDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut quests = HashSet::new();
    let mut items = HashSet::new();
    let mut dialogs = HashSet::new();
    let mut maps = HashSet::new();

    track_ids("quest", world.quests.iter().map(|q| q.id.as_str()), &mut quests, &mut errors);
    track_ids("item", world.items.iter().map(|i| i.id.as_str()), &mut items, &mut errors);
    track_ids(
        "dialog",
        world.dialogs.iter().map(|d| d.id.as_str()),
        &mut dialogs,
        &mut errors,
    );
    track_ids("map", world.maps.iter().map(|m| m.id.as_str()), &mut maps, &mut errors);

    check_capacity("quest", world.quests.len(), 255, &mut errors);
    check_capacity("item", world.items.len(), 255, &mut errors);
    check_capacity("dialog", world.dialogs.len(), 256, &mut errors);
    check_capacity("map", world.maps.len(), 256, &mut errors);

    // Quest ordering index and declared flag names, for gating checks below.
    let mut quest_info: HashMap<&str, (usize, HashSet<&str>)> = HashMap::new();
    for (index, quest) in world.quests.iter().enumerate() {
        let mut flags = HashSet::new();
        for flag in &quest.flags {
            if !flags.insert(flag.as_str()) {
                errors.push(ValidationError::DuplicateId {
                    kind: "quest flag",
                    id: format!("{}:{flag}", quest.id),
                });
            }
        }
        quest_info.entry(quest.id.as_str()).or_insert((index, flags));
    }

    let mut gates_by_map: HashMap<&str, HashSet<String>> = HashMap::new();
    for map in &world.maps {
        let mut gate_set = HashSet::new();
        track_ids("gate", map.gates.iter().map(|g| g.id.as_str()), &mut gate_set, &mut errors);
        check_capacity("gate", map.gates.len(), 256, &mut errors);
        gates_by_map.entry(map.id.as_str()).or_insert(gate_set);
    }

    for map in &world.maps {
        validate_map(map, &quest_info, &items, &dialogs, &gates_by_map, &mut errors);
    }

    errors
}

fn validate_map(
    map: &MapDef,
    quest_info: &HashMap<&str, (usize, HashSet<&str>)>,
    items: &HashSet<String>,
    dialogs: &HashSet<String>,
    gates_by_map: &HashMap<&str, HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) {
    if map.width == 0 || map.height == 0 {
        errors.push(ValidationError::InvalidValue {
            context: format!("map '{}' has empty dimensions", map.id),
        });
    }
    if u64::from(map.width) * u64::from(map.height) > 256 {
        errors.push(ValidationError::InvalidValue {
            context: format!("map '{}' has more than 256 room slots", map.id),
        });
    }
    if let Some(quest) = &map.quest {
        if !quest_info.contains_key(quest.as_str()) {
            errors.push(ValidationError::MissingReference {
                kind: "quest",
                id: quest.clone(),
                context: format!("map '{}'", map.id),
            });
        }
    }

    let mut coords = HashSet::new();
    for room in &map.rooms {
        if room.x >= map.width || room.y >= map.height {
            errors.push(ValidationError::InvalidValue {
                context: format!("room ({},{}) out of bounds in map '{}'", room.x, room.y, map.id),
            });
        }
        if !coords.insert((room.x, room.y)) {
            errors.push(ValidationError::InvalidValue {
                context: format!("duplicate room ({},{}) in map '{}'", room.x, room.y, map.id),
            });
        }
        for object in &room.objects {
            validate_object(object, map, quest_info, items, dialogs, gates_by_map, errors);
        }
    }
}

fn validate_object(
    object: &ObjectDef,
    map: &MapDef,
    quest_info: &HashMap<&str, (usize, HashSet<&str>)>,
    items: &HashSet<String>,
    dialogs: &HashSet<String>,
    gates_by_map: &HashMap<&str, HashSet<String>>,
    errors: &mut Vec<ValidationError>,
) {
    let context = format!("object '{}' in map '{}'", object.name, map.id);

    if !OBJECT_KINDS.contains(&object.kind.as_str()) {
        errors.push(ValidationError::InvalidValue {
            context: format!("unknown object kind '{}' ({context})", object.kind),
        });
    }

    validate_gating(object, quest_info, &context, errors);

    match object.kind.as_str() {
        "item" => match object.props.get("id") {
            Some(id) => {
                if !items.contains(id) {
                    errors.push(ValidationError::MissingReference {
                        kind: "item",
                        id: id.clone(),
                        context: context.clone(),
                    });
                }
            },
            None => errors.push(ValidationError::InvalidValue {
                context: format!("missing 'id' property ({context})"),
            }),
        },
        "npc" => match object.props.get("id") {
            Some(id) => {
                if !dialogs.contains(&id.to_lowercase()) {
                    errors.push(ValidationError::MissingReference {
                        kind: "dialog",
                        id: id.clone(),
                        context: context.clone(),
                    });
                }
            },
            None => errors.push(ValidationError::InvalidValue {
                context: format!("missing 'id' property ({context})"),
            }),
        },
        "gateway" => match object.props.get("target") {
            Some(target) => validate_gate_target(target, gates_by_map, &context, errors),
            None => errors.push(ValidationError::InvalidValue {
                context: format!("missing 'target' property ({context})"),
            }),
        },
        _ => {},
    }
}

fn validate_gating(
    object: &ObjectDef,
    quest_info: &HashMap<&str, (usize, HashSet<&str>)>,
    context: &str,
    errors: &mut Vec<ValidationError>,
) {
    let lookup = |prop: &str, errors: &mut Vec<ValidationError>| -> Option<usize> {
        let name = object.props.get(prop)?;
        match quest_info.get(name.as_str()) {
            Some((index, _)) => Some(*index),
            None => {
                errors.push(ValidationError::MissingReference {
                    kind: "quest",
                    id: name.clone(),
                    context: context.to_string(),
                });
                None
            },
        }
    };

    if let Some(quest) = object.props.get("quest") {
        match quest_info.get(quest.as_str()) {
            // An explicit quest requires its flag to be pre-declared; flags
            // are only auto-allocated for map-inherited quests.
            Some((_, declared)) => {
                if let Some(flag) = object.props.get("questflag") {
                    if !declared.contains(flag.as_str()) {
                        errors.push(ValidationError::MissingReference {
                            kind: "quest flag",
                            id: flag.clone(),
                            context: context.to_string(),
                        });
                    }
                }
            },
            None => errors.push(ValidationError::MissingReference {
                kind: "quest",
                id: quest.clone(),
                context: context.to_string(),
            }),
        }
    } else {
        let min = lookup("minquest", errors);
        let max = lookup("maxquest", errors);
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                errors.push(ValidationError::InvalidValue {
                    context: format!("minquest ordered after maxquest ({context})"),
                });
            }
        }
    }
}

fn validate_gate_target(
    target: &str,
    gates_by_map: &HashMap<&str, HashSet<String>>,
    context: &str,
    errors: &mut Vec<ValidationError>,
) {
    let ident = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let Some((map, gate)) = target.split_once(':').filter(|(m, g)| ident(m) && ident(g)) else {
        errors.push(ValidationError::InvalidValue {
            context: format!("malformed gateway target '{target}' ({context})"),
        });
        return;
    };
    let map = map.to_lowercase();
    let gate = gate.to_lowercase();
    match gates_by_map.get(map.as_str()) {
        Some(gates) => {
            if !gates.contains(gate.as_str()) {
                errors.push(ValidationError::MissingReference {
                    kind: "gate",
                    id: format!("{map}:{gate}"),
                    context: context.to_string(),
                });
            }
        },
        None => errors.push(ValidationError::MissingReference {
            kind: "map",
            id: map,
            context: context.to_string(),
        }),
    }
}

fn track_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    set: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) {
    for id in ids {
        if !set.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}

fn check_capacity(kind: &'static str, count: usize, limit: usize, errors: &mut Vec<ValidationError>) {
    if count > limit {
        errors.push(ValidationError::InvalidValue {
            context: format!("{count} {kind}s exceed the index space ({limit})"),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn object(name: &str, kind: &str, props: &[(&str, &str)]) -> ObjectDef {
        ObjectDef {
            name: name.to_string(),
            kind: kind.to_string(),
            px: 0,
            py: 0,
            pw: 16,
            ph: 16,
            props: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn map_with_objects(objects: Vec<ObjectDef>) -> MapDef {
        MapDef {
            id: "village".into(),
            width: 2,
            height: 2,
            quest: None,
            gates: vec![GateDef { id: "well".into() }],
            rooms: vec![RoomDef { x: 0, y: 0, objects }],
        }
    }

    fn base_world() -> WorldDef {
        WorldDef {
            quests: vec![
                QuestDef {
                    id: "crumbs".into(),
                    flags: vec!["met_baker".into()],
                },
                QuestDef {
                    id: "harvest".into(),
                    flags: Vec::new(),
                },
            ],
            items: vec![ItemDef { id: "bread".into() }],
            dialogs: vec![DialogDef { id: "baker_hello".into() }],
            maps: vec![map_with_objects(Vec::new())],
        }
    }

    #[test]
    fn clean_world_passes() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![
            object("Bread1", "item", &[("id", "bread"), ("quest", "crumbs")]),
            object("Baker", "npc", &[("id", "Baker_Hello")]),
            object("Well", "gateway", &[("target", "village:well")]),
        ])];

        let errors = validate_world(&world);
        assert!(errors.is_empty(), "unexpected findings: {errors:?}");
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let mut world = base_world();
        world.items = vec![ItemDef { id: "bread".into() }, ItemDef { id: "bread".into() }];

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateId { kind, id } if *kind == "item" && id == "bread"))
        );
    }

    #[test]
    fn unknown_object_kind_is_reported() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![object("Hatch", "trapdoor", &[])])];

        let errors = validate_world(&world);
        assert!(errors.iter().any(
            |err| matches!(err, ValidationError::InvalidValue { context } if context.contains("unknown object kind"))
        ));
    }

    #[test]
    fn capacity_overflows_are_reported() {
        let mut world = base_world();
        world.quests = (0..256)
            .map(|i| QuestDef {
                id: format!("quest_{i}"),
                flags: Vec::new(),
            })
            .collect();
        world.items = (0..256).map(|i| ItemDef { id: format!("item_{i}") }).collect();

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context == "256 quests exceed the index space (255)"))
        );
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context == "256 items exceed the index space (255)"))
        );
    }

    #[test]
    fn empty_and_oversized_maps_are_reported() {
        let mut world = base_world();
        world.maps[0].width = 0;
        world.maps.push(MapDef {
            id: "vast".into(),
            width: 32,
            height: 9,
            quest: None,
            gates: Vec::new(),
            rooms: Vec::new(),
        });

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context.contains("empty dimensions")))
        );
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context.contains("more than 256 room slots")))
        );
    }

    #[test]
    fn room_bounds_and_duplicates_are_reported() {
        let mut world = base_world();
        let mut map = map_with_objects(Vec::new());
        map.rooms = vec![
            RoomDef { x: 0, y: 0, objects: Vec::new() },
            RoomDef { x: 0, y: 0, objects: Vec::new() },
            RoomDef { x: 5, y: 0, objects: Vec::new() },
        ];
        world.maps = vec![map];

        let errors = validate_world(&world);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context.contains("duplicate room")))
        );
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::InvalidValue { context } if context.contains("out of bounds")))
        );
    }

    #[test]
    fn missing_item_reference_is_reported() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![object("Cake", "item", &[("id", "cake")])])];

        let errors = validate_world(&world);
        assert!(errors.iter().any(
            |err| matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "item" && id == "cake")
        ));
    }

    #[test]
    fn malformed_gateway_target_is_reported() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![object(
            "Door",
            "gateway",
            &[("target", "no-colon-here")],
        )])];

        let errors = validate_world(&world);
        assert!(errors.iter().any(
            |err| matches!(err, ValidationError::InvalidValue { context } if context.contains("malformed gateway target"))
        ));
    }

    #[test]
    fn unknown_gate_is_reported() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![object(
            "Door",
            "gateway",
            &[("target", "village:cellar")],
        )])];

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| {
            matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "gate" && id == "village:cellar")
        }));
    }

    #[test]
    fn inverted_quest_range_is_reported() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![object(
            "Door",
            "gateway",
            &[
                ("target", "village:well"),
                ("minquest", "harvest"),
                ("maxquest", "crumbs"),
            ],
        )])];

        let errors = validate_world(&world);
        assert!(errors.iter().any(
            |err| matches!(err, ValidationError::InvalidValue { context } if context.contains("minquest ordered after maxquest"))
        ));
    }

    #[test]
    fn undeclared_quest_flag_is_reported() {
        let mut world = base_world();
        world.maps = vec![map_with_objects(vec![object(
            "Baker",
            "npc",
            &[
                ("id", "baker_hello"),
                ("quest", "crumbs"),
                ("questflag", "never_declared"),
            ],
        )])];

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| {
            matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "quest flag" && id == "never_declared")
        }));
    }

    #[test]
    fn unknown_map_quest_is_reported() {
        let mut world = base_world();
        world.maps[0].quest = Some("lost_quest".into());

        let errors = validate_world(&world);
        assert!(errors.iter().any(|err| {
            matches!(err, ValidationError::MissingReference { kind, id, .. } if *kind == "quest" && id == "lost_quest")
        }));
    }
}
