use burrow_data::WorldDef;
use burrow_export::compile_world_to_source;

#[test]
fn quest_gated_village_golden() {
    let src = r#"
[[quests]]
id = "crumbs"
flags = ["met_baker"]

[[quests]]
id = "cellar_key"

[[items]]
id = "bread"

[[items]]
id = "lantern"

[[dialogs]]
id = "baker_hello"

[[maps]]
id = "forest"
width = 2
height = 2

[[maps.gates]]
id = "east"

[[maps]]
id = "village"
width = 2
height = 1
quest = "crumbs"

[[maps.gates]]
id = "well"

[[maps.rooms]]
x = 0
y = 0

[[maps.rooms.objects]]
name = "Bread1"
kind = "item"
px = 16
py = 24
pw = 16
ph = 16

[maps.rooms.objects.props]
id = "bread"

[[maps.rooms]]
x = 1
y = 0

[[maps.rooms.objects]]
name = "ForestDoor"
kind = "gateway"
px = 160
py = 64
pw = 32
ph = 32

[maps.rooms.objects.props]
target = "forest:east"
ontrigger = "advancequestandteleport"

[[maps.rooms.objects]]
name = "Baker"
kind = "npc"
px = 192
py = 32
pw = 16
ph = 32

[maps.rooms.objects.props]
id = "baker_hello"
quest = "crumbs"
questflag = "met_baker"
"#;
    let world: WorldDef = toml::from_str(src).expect("parse world ok");
    let actual = compile_world_to_source(&world).expect("compile ok");
    let expected = include_str!("fixtures/village_triggers.c");
    assert_eq!(actual.trim(), expected.trim());
}

#[test]
fn ungated_world_golden() {
    let src = r#"
[[quests]]
id = "crumbs"

[[quests]]
id = "cellar_key"

[[quests]]
id = "harvest"

[[items]]
id = "lantern"

[[maps]]
id = "cellar"
width = 1
height = 1

[[maps.gates]]
id = "stairs"

[[maps]]
id = "village"
width = 1
height = 1

[[maps.rooms]]
x = 0
y = 0

[[maps.rooms.objects]]
name = "Lantern"
kind = "item"
px = 8
py = 8
pw = 16
ph = 16

[maps.rooms.objects.props]
id = "lantern"
unlockflag = "cellar_door"

[[maps.rooms.objects]]
name = "CellarDoor"
kind = "gateway"
px = 64
py = 96
pw = 32
ph = 16

[maps.rooms.objects.props]
target = "cellar:stairs"
minquest = "cellar_key"
maxquest = "harvest"
"#;
    let world: WorldDef = toml::from_str(src).expect("parse world ok");
    let actual = compile_world_to_source(&world).expect("compile ok");
    let expected = include_str!("fixtures/ungated_triggers.c");
    assert_eq!(actual.trim(), expected.trim());
}

#[test]
fn maps_without_triggers_emit_nothing() {
    let src = r#"
[[maps]]
id = "forest"
width = 2
height = 2
"#;
    let world: WorldDef = toml::from_str(src).expect("parse world ok");
    let actual = compile_world_to_source(&world).expect("compile ok");
    assert_eq!(actual.trim(), "/*\n * Generated by burrow_export. Do not edit by hand.\n */");
}
