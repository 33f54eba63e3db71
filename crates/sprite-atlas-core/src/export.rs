use serde_json::{Map, Value, json};

use crate::coordinator::AtlasOutput;
use crate::model::OutputDescription;

/// The animation description as a JSON object:
/// `{ anim_id: [ [ [w, h, page, page_x, page_y, draw_offset_x, draw_offset_y], ... ], ... ] }`.
/// Keys keep the order animations were supplied in.
pub fn to_json(desc: &OutputDescription) -> Value {
    let mut map = Map::with_capacity(desc.animations.len());
    for anim in &desc.animations {
        let frames: Vec<Value> = anim
            .frames
            .iter()
            .map(|frame| {
                Value::Array(
                    frame
                        .iter()
                        .map(|t| {
                            json!([
                                t.width,
                                t.height,
                                t.page_index,
                                t.page_x,
                                t.page_y,
                                t.draw_offset_x,
                                t.draw_offset_y
                            ])
                        })
                        .collect(),
                )
            })
            .collect();
        map.insert(anim.id.clone(), Value::Array(frames));
    }
    Value::Object(map)
}

/// [`to_json`] rendered as text.
pub fn to_json_string(desc: &OutputDescription, pretty: bool) -> String {
    let value = to_json(desc);
    if pretty {
        format!("{value:#}")
    } else {
        value.to_string()
    }
}

/// Region-level view of a run: `{ pages, regions, meta }`.
///
/// Each region lists its source key, source rect and placement. Meant for
/// inspecting a layout, not for engine consumption.
pub fn to_layout_json(out: &AtlasOutput) -> Value {
    let regions: Vec<Value> = out
        .regions
        .iter()
        .zip(&out.placements)
        .map(|(r, p)| {
            json!({
                "id": r.id,
                "source": out.source_keys.get(r.source).map(String::as_str).unwrap_or(""),
                "rect": {"x": r.rect.x, "y": r.rect.y, "w": r.rect.width, "h": r.rect.height},
                "page": p.page_index,
                "pageX": p.page_x,
                "pageY": p.page_y,
            })
        })
        .collect();
    let pages: Vec<Value> = out
        .pages
        .iter()
        .map(|p| json!({"id": p.index, "width": p.width, "height": p.height}))
        .collect();
    json!({
        "pages": pages,
        "regions": regions,
        "meta": {
            "app": "sprite-atlas",
            "version": env!("CARGO_PKG_VERSION"),
            "format": "RGBA8888",
            "stats": out.stats,
        }
    })
}
