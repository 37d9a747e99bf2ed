//! Fixed-format C source emission for compiled trigger records.
//!
//! The surrounding header/array framework for other asset kinds lives in the
//! wider pipeline; this module only owns the trigger record arrays.

use crate::{MapTriggers, Trigger};

const INDENT: &str = "    ";

/// Banner comment at the top of every generated file.
const BANNER: &str = "/*\n * Generated by burrow_export. Do not edit by hand.\n */\n";

/// Render the per-map trigger arrays as one generated source file.
///
/// Maps are emitted in compilation order; arrays with no records are
/// omitted entirely.
pub fn render_source(maps: &[MapTriggers]) -> String {
    let mut out = String::from(BANNER);
    for map in maps.iter().filter(|map| !map.is_empty()) {
        render_array(
            &mut out,
            "ItemTriggerData",
            &format!("{}_item_triggers", map.map_id),
            &map.items,
        );
        render_array(
            &mut out,
            "GatewayTriggerData",
            &format!("{}_gateway_triggers", map.map_id),
            &map.gateways,
        );
        render_array(
            &mut out,
            "NpcTriggerData",
            &format!("{}_npc_triggers", map.map_id),
            &map.npcs,
        );
    }
    out
}

fn render_array(out: &mut String, ty: &str, name: &str, triggers: &[Trigger]) {
    if triggers.is_empty() {
        return;
    }
    out.push('\n');
    out.push_str(&format!("static const {ty} {name}[] = {{\n"));
    for trigger in triggers {
        out.push_str(INDENT);
        out.push_str(&trigger.record());
        out.push_str(",\n");
    }
    out.push_str("};\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{TriggerEvent, TriggerPayload};

    fn trigger(payload: TriggerPayload) -> Trigger {
        Trigger {
            id: "test".into(),
            qbegin: 0xff,
            qend: 0xff,
            flagid: 0,
            room_lid: 3,
            event: TriggerEvent::None,
            payload,
        }
    }

    #[test]
    fn record_literals_match_the_runtime_layout() {
        let item = trigger(TriggerPayload::Item { item: 0x1f });
        assert_eq!(item.record(), "{ {0xff,0xff,0x0,0x3,0x0},0x1f}");

        let gateway = trigger(TriggerPayload::Gateway {
            map: 2,
            gate: 1,
            x: 48,
            y: 80,
        });
        assert_eq!(gateway.record(), "{ {0xff,0xff,0x0,0x3,0x0},0x2,0x1,0x30,0x50}");

        let npc = trigger(TriggerPayload::Npc { dialog: 4, x: 72, y: 48 });
        assert_eq!(npc.record(), "{ {0xff,0xff,0x0,0x3,0x0},0x4,0x48,0x30}");
    }

    #[test]
    fn empty_arrays_are_omitted() {
        let maps = vec![MapTriggers {
            map_id: "forest".into(),
            items: Vec::new(),
            gateways: vec![trigger(TriggerPayload::Gateway {
                map: 0,
                gate: 0,
                x: 1,
                y: 2,
            })],
            npcs: Vec::new(),
        }];
        let src = render_source(&maps);
        assert!(src.starts_with("/*\n * Generated by burrow_export."));
        assert!(src.contains("static const GatewayTriggerData forest_gateway_triggers[] = {"));
        assert!(!src.contains("forest_item_triggers"));
        assert!(!src.contains("forest_npc_triggers"));
    }
}
