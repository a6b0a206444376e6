//! Node manipulation: paint, geometry, hierarchy and selection.

use super::params::{require_any, Args, Kind, Param};
use super::{Command, ToolDef};
use figma_bridge_core::{BridgeError, Result};
use serde_json::Value;

const BLEND_MODES: &[&str] = &[
    "PASS_THROUGH",
    "NORMAL",
    "DARKEN",
    "MULTIPLY",
    "LINEAR_BURN",
    "COLOR_BURN",
    "LIGHTEN",
    "SCREEN",
    "LINEAR_DODGE",
    "COLOR_DODGE",
    "OVERLAY",
    "SOFT_LIGHT",
    "HARD_LIGHT",
    "DIFFERENCE",
    "EXCLUSION",
    "HUE",
    "SATURATION",
    "COLOR",
    "LUMINOSITY",
];
const EFFECT_TYPES: &[&str] = &["DROP_SHADOW", "INNER_SHADOW", "LAYER_BLUR", "BACKGROUND_BLUR"];
const CONSTRAINTS: &[&str] = &["MIN", "CENTER", "MAX", "STRETCH", "SCALE"];
const EXPORT_FORMATS: &[&str] = &["PNG", "SVG", "JPG", "PDF"];
const DEV_STATUSES: &[&str] = &["READY_FOR_DEV", "COMPLETED"];

fn node_id() -> Param {
    Param::string("nodeId", "The node ID to modify")
}

fn node_ids(description: &'static str) -> Param {
    Param::ids("nodeIds", description).non_empty()
}

fn effect() -> Kind {
    Kind::Object(vec![
        Param::one_of("type", "Effect type", EFFECT_TYPES),
        Param::color("color", "Shadow color").optional(),
        Param::object(
            "offset",
            "Shadow offset",
            vec![
                Param::number("x", "Horizontal offset"),
                Param::number("y", "Vertical offset"),
            ],
        )
        .optional(),
        Param::number("radius", "Blur radius").min(0.0).optional(),
        Param::number("spread", "Spread radius").optional(),
        Param::boolean("visible", "Whether effect is visible").optional(),
        Param::string("blendMode", "Blend mode").optional(),
    ])
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(Command::SetFills, "Set fill color. Accepts hex shorthand or fills array.")
            .params(vec![
                node_id(),
                Param::color("fills", "Fill color - use { color: \"#RRGGBB\" } for simple colors"),
            ]),
        ToolDef::forward(Command::SetStrokes, "Set stroke color. Accepts hex shorthand or strokes array.")
            .params(vec![
                node_id(),
                Param::color("strokes", "Stroke color - use { color: \"#RRGGBB\" } for simple colors"),
                Param::number("strokeWeight", "Stroke weight in pixels").optional(),
            ]),
        ToolDef::forward(Command::SetText, "Set the text content of a text node.").params(vec![
            Param::string("nodeId", "The text node ID"),
            Param::string("text", "New text content"),
        ]),
        ToolDef::forward(Command::CloneNodes, "Duplicate nodes.").params(vec![
            node_ids("Array of node IDs to clone"),
            Param::string("parentId", "Parent node ID for clones (optional)").optional(),
            Param::object(
                "offset",
                "Position offset for cloned nodes",
                vec![
                    Param::number("x", "X offset from original").default(20),
                    Param::number("y", "Y offset from original").default(20),
                ],
            )
            .optional(),
        ]),
        ToolDef::forward(Command::DeleteNodes, "Delete nodes.")
            .params(vec![node_ids("Array of node IDs to delete")]),
        ToolDef::forward(Command::MoveNodes, "Move nodes. Use relative=true for offset.")
            .params(vec![
                node_ids("Array of node IDs to move"),
                Param::number("x", "X position (absolute) or offset (if relative=true)").optional(),
                Param::number("y", "Y position (absolute) or offset (if relative=true)").optional(),
                Param::boolean("relative", "If true, x/y are offsets from current position").default(false),
            ])
            .check(|args| require_any(args, &["x", "y"], "At least one of x or y must be provided")),
        ToolDef::forward(
            Command::ResizeNodes,
            "Resize one or more nodes. At least one dimension (width or height) must be provided.",
        )
        .params(vec![
            node_ids("Array of node IDs to resize"),
            Param::number("width", "New width in pixels").optional(),
            Param::number("height", "New height in pixels").optional(),
        ])
        .check(|args| {
            require_any(args, &["width", "height"], "At least one of width or height must be provided")
        }),
        ToolDef::forward(Command::SetOpacity, "Set opacity (0-1).").params(vec![
            node_id(),
            Param::number("opacity", "Opacity value from 0 (transparent) to 1 (opaque)").range(0.0, 1.0),
        ]),
        ToolDef::forward(
            Command::SetCornerRadius,
            "Set corner radius. Use individual values for asymmetric.",
        )
        .params(vec![
            node_id(),
            Param::number("radius", "Uniform corner radius for all corners").optional(),
            Param::number("topLeft", "Top-left corner radius").optional(),
            Param::number("topRight", "Top-right corner radius").optional(),
            Param::number("bottomLeft", "Bottom-left corner radius").optional(),
            Param::number("bottomRight", "Bottom-right corner radius").optional(),
        ])
        .check(|args| {
            require_any(
                args,
                &["radius", "topLeft", "topRight", "bottomLeft", "bottomRight"],
                "At least one radius value must be provided",
            )
        }),
        ToolDef::forward(Command::GroupNodes, "Group nodes.").params(vec![
            node_ids("Array of node IDs to group together"),
            Param::string("name", "Name for the new group").default("Group"),
        ]),
        ToolDef::forward(Command::UngroupNodes, "Ungroup nodes.")
            .params(vec![node_ids("Array of group node IDs to ungroup")]),
        ToolDef::forward(Command::SetSelection, "Set selection. Empty array clears.").params(vec![
            Param::ids("nodeIds", "Array of node IDs to select (empty array to clear)"),
        ]),
        ToolDef::forward(Command::SetCurrentPage, "Switch to a different page in the Figma document.")
            .params(vec![Param::string("pageId", "The page ID to switch to")]),
        ToolDef::forward(
            Command::ExportNode,
            "Export a node as an image (PNG, SVG, JPG, or PDF). Returns base64-encoded data.",
        )
        .params(vec![
            Param::string("nodeId", "The node ID to export"),
            Param::one_of("format", "Export format", EXPORT_FORMATS).default("PNG"),
            Param::number("scale", "Export scale (1 = 100%, 2 = 200%, etc.)").min(0.01).default(1),
        ]),
        ToolDef::forward(Command::SetEffects, "Set effects. Replaces existing.")
            .params(vec![
                node_id(),
                Param::array("effects", "Array of effects to apply", effect()),
            ])
            .check(check_effects),
        ToolDef::forward(
            Command::SetConstraints,
            "Set resizing constraints relative to the parent frame.",
        )
        .params(vec![
            node_id(),
            Param::one_of("horizontal", "Horizontal constraint", CONSTRAINTS).optional(),
            Param::one_of("vertical", "Vertical constraint", CONSTRAINTS).optional(),
        ])
        .check(|args| {
            require_any(
                args,
                &["horizontal", "vertical"],
                "At least one of horizontal or vertical must be provided",
            )
        }),
        ToolDef::forward(Command::SetBlendMode, "Set the layer blend mode of a node.").params(vec![
            node_id(),
            Param::one_of("blendMode", "Blend mode", BLEND_MODES),
        ]),
        ToolDef::forward(
            Command::RenameNode,
            "Rename one or more nodes. For batch renaming, all nodes get the same name.",
        )
        .params(vec![
            Param::string("nodeId", "Single node ID to rename").optional(),
            Param::ids("nodeIds", "Array of node IDs to rename (batch)").optional(),
            Param::string("name", "The new name for the node(s)"),
        ])
        .check(check_rename),
        ToolDef::forward(
            Command::ReorderNode,
            "Change the z-order (layer order) of a node. Bring to front, send to back, or move to a specific index.",
        )
        .params(vec![
            Param::string("nodeId", "The node ID to reorder"),
            Param::position("position", "Position: \"front\" (top), \"back\" (bottom), or index number"),
        ]),
        ToolDef::forward(
            Command::SetRotation,
            "Set the rotation (in degrees) of one or more nodes. Rotation is around the center point.",
        )
        .params(vec![
            node_ids("Array of node IDs to rotate"),
            Param::number("rotation", "Rotation in degrees (-180 to 180)").range(-180.0, 180.0),
        ]),
        ToolDef::forward(
            Command::ReparentNodes,
            "Move nodes to a different parent container. Useful for reorganizing the layer hierarchy.",
        )
        .params(vec![
            node_ids("Array of node IDs to move"),
            Param::string("newParentId", "The new parent node ID (must be a frame, group, or page)"),
            Param::number("index", "Position within the new parent (0 = bottom/back). Defaults to top/front.")
                .min(0.0)
                .optional(),
        ]),
        ToolDef::forward(Command::MoveToPage, "Move nodes from their current page to a different page.")
            .params(vec![
                node_ids("Array of node IDs to move"),
                Param::string("targetPageId", "The destination page ID"),
                Param::number("x", "X position on the target page").optional(),
                Param::number("y", "Y position on the target page").optional(),
            ]),
        ToolDef::forward(Command::ZoomToNode, "Scroll and zoom the viewport to fit the given nodes.")
            .params(vec![node_ids("Array of node IDs to zoom to")]),
        ToolDef::forward(
            Command::SetDevStatus,
            "Mark a node as \"Ready for Dev\" or \"Completed\" for Dev Mode handoff. Pass null to clear status.",
        )
        .params(vec![
            Param::string("nodeId", "The node ID to set status on"),
            Param::one_of(
                "status",
                "Dev status: READY_FOR_DEV, COMPLETED, or null to clear",
                DEV_STATUSES,
            )
            .nullable(),
        ]),
    ]
}

/// Blurs have no default radius.
fn check_effects(args: &Args) -> Result<()> {
    let effects = args.get("effects").and_then(Value::as_array);
    for (i, effect) in effects.into_iter().flatten().enumerate() {
        let kind = effect.get("type").and_then(Value::as_str).unwrap_or_default();
        if kind.ends_with("_BLUR") && effect.get("radius").is_none() {
            return Err(BridgeError::invalid_params(format!(
                "effects[{}].radius is required for {}",
                i, kind
            )));
        }
    }
    Ok(())
}

fn check_rename(args: &Args) -> Result<()> {
    let has_batch = args
        .get("nodeIds")
        .and_then(Value::as_array)
        .is_some_and(|ids| !ids.is_empty());
    if args.contains_key("nodeId") || has_batch {
        Ok(())
    } else {
        Err(BridgeError::invalid_params("nodeId or nodeIds is required"))
    }
}
