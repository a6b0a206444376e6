//! Shape creation and boolean geometry.

use super::params::Param;
use super::{Command, ToolDef};

const STROKE_CAPS: &[&str] = &["NONE", "ROUND", "SQUARE", "ARROW_LINES", "ARROW_EQUILATERAL"];
const WINDING_RULES: &[&str] = &["NONZERO", "EVENODD", "NONE"];
const BOOLEAN_OPERATIONS: &[&str] = &["UNION", "SUBTRACT", "INTERSECT", "EXCLUDE", "FLATTEN"];
/// A full turn, with slack for rounded inputs.
const MAX_ANGLE: f64 = std::f64::consts::TAU + 1e-5;

fn x() -> Param {
    Param::number("x", "X position").default(0)
}

fn y() -> Param {
    Param::number("y", "Y position").default(0)
}

fn width(default: u32) -> Param {
    Param::number("width", "Width in pixels").default(default)
}

fn height(default: u32) -> Param {
    Param::number("height", "Height in pixels").default(default)
}

fn name(default: &'static str) -> Param {
    Param::string("name", "Node name").default(default)
}

fn fills() -> Param {
    Param::color("fills", "Fill color").optional()
}

fn strokes() -> Param {
    Param::color("strokes", "Stroke color").optional()
}

fn stroke_weight() -> Param {
    Param::number("strokeWeight", "Stroke weight in pixels").min(0.0).optional()
}

fn parent_id() -> Param {
    Param::string("parentId", "Parent node ID (defaults to current page)").optional()
}

/// Position, size, name, fill and parent: the common box shape.
fn box_params(default_name: &'static str) -> Vec<Param> {
    vec![x(), y(), width(100), height(100), name(default_name), fills(), parent_id()]
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(Command::CreateRectangle, "Create a rectangle.")
            .params(box_params("Rectangle")),
        ToolDef::forward(Command::CreateFrame, "Create a frame.").params(box_params("Frame")),
        ToolDef::forward(Command::CreateText, "Create a text node.").params(vec![
            x(),
            y(),
            Param::string("text", "The text content").default("Text"),
            Param::number("fontSize", "Font size in pixels").min(1.0).default(16),
            Param::string("fontFamily", "Font family name").default("Inter"),
            Param::string("fontStyle", "Font style (Regular, Bold, etc.)").default("Regular"),
            Param::color("fills", "Text color").optional(),
            name("Text"),
            parent_id(),
        ]),
        ToolDef::forward(Command::CreateEllipse, "Create ellipse. Use arcData for arcs/rings.").params({
            let mut params = box_params("Ellipse");
            params.push(
                Param::object(
                    "arcData",
                    "Arc data for partial ellipses or rings",
                    vec![
                        Param::number("startingAngle", "Starting angle in radians (0 = 3 o'clock)")
                            .range(0.0, MAX_ANGLE)
                            .optional(),
                        Param::number("endingAngle", "Ending angle in radians (2*PI = full circle)")
                            .range(0.0, MAX_ANGLE)
                            .optional(),
                        Param::number("innerRadius", "Inner radius ratio (0 = solid, 0.5 = 50% hole)")
                            .range(0.0, 1.0)
                            .optional(),
                    ],
                )
                .optional(),
            );
            params
        }),
        ToolDef::forward(Command::CreateLine, "Create a line.").params(vec![
            x(),
            y(),
            Param::number("length", "Line length in pixels").default(100),
            Param::number("rotation", "Line rotation in degrees (0 = horizontal)").default(0),
            name("Line"),
            Param::number("strokeWeight", "Stroke weight in pixels").min(0.0).default(1),
            strokes(),
            Param::one_of(
                "strokeCap",
                "Stroke cap style (ARROW_LINES/ARROW_EQUILATERAL for arrows)",
                STROKE_CAPS,
            )
            .default("NONE"),
            parent_id(),
        ]),
        ToolDef::forward(
            Command::CreatePolygon,
            "Create a polygon (triangle, pentagon, hexagon, etc.) or star shape. Set innerRadius (0-1) to create a star with spiky points.",
        )
        .params(vec![
            x(),
            y(),
            width(100),
            height(100),
            Param::number("pointCount", "Number of sides (polygon) or points (star). Minimum 3.")
                .min(3.0)
                .default(5),
            Param::number(
                "innerRadius",
                "Inner radius ratio for stars (0-1). 0 = very spiky, 1 = polygon. Omit for regular polygon.",
            )
            .range(0.0, 1.0)
            .optional(),
            Param::string("name", "Node name").optional(),
            fills(),
            strokes(),
            stroke_weight(),
            Param::number("cornerRadius", "Corner radius for vertices").min(0.0).optional(),
            parent_id(),
        ]),
        ToolDef::forward(
            Command::CreateVector,
            "Create a custom vector shape using SVG-style path data. Supports M (move), L (line), Q (quadratic curve), C (cubic bezier), Z (close).",
        )
        .params(vec![
            x(),
            y(),
            Param::string("data", "SVG path string (e.g., \"M 0 100 L 100 100 L 50 0 Z\" for triangle)"),
            Param::one_of(
                "windingRule",
                "Fill rule: NONZERO (solid), EVENODD (holes), NONE (outline only)",
                WINDING_RULES,
            )
            .default("NONZERO"),
            name("Vector"),
            fills(),
            strokes(),
            stroke_weight(),
            parent_id(),
        ]),
        ToolDef::forward(
            Command::BooleanOperation,
            "Combine multiple shapes using boolean operations (union, subtract, intersect, exclude) or flatten them into a single vector.",
        )
        .params(vec![
            Param::one_of("operation", "Boolean operation type", BOOLEAN_OPERATIONS),
            Param::ids("nodeIds", "Array of node IDs to combine (minimum 2 nodes)").min_items(2),
            Param::string("name", "Name for the resulting node").optional(),
        ]),
        ToolDef::forward(
            Command::CreateNodeFromSvg,
            "Parse an SVG string and create a Figma node tree from it. Great for importing icons, illustrations, and vector graphics.",
        )
        .params(vec![
            Param::string("svg", "SVG markup string (e.g., \"<svg>...</svg>\")"),
            x(),
            y(),
            Param::string("name", "Name for the created node").optional(),
            parent_id(),
        ]),
        ToolDef::forward(
            Command::CreateSection,
            "Create a section node for organizing frames and content. Sections are used in both Figma and FigJam for grouping related items.",
        )
        .params(vec![
            Param::string("name", "Section name").default("Section"),
            x(),
            y(),
            width(400),
            height(300),
            Param::color("fills", "Section fill color").optional(),
            parent_id(),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_for;
    use serde_json::{json, Value};

    fn tool(command: Command) -> ToolDef {
        tool_for(tools(), command)
    }

    #[test]
    fn test_rectangle_defaults() {
        let args = tool(Command::CreateRectangle).validate(&json!({})).unwrap();
        assert_eq!(
            Value::Object(args),
            json!({"x": 0, "y": 0, "width": 100, "height": 100, "name": "Rectangle"})
        );
    }

    #[test]
    fn test_polygon_point_count() {
        let polygon = tool(Command::CreatePolygon);
        let err = polygon.validate(&json!({"pointCount": 2})).unwrap_err();
        assert_eq!(err.to_string(), "pointCount must be at least 3");
        assert_eq!(polygon.validate(&json!({})).unwrap()["pointCount"], json!(5));
    }

    #[test]
    fn test_boolean_operation_needs_two() {
        let op = tool(Command::BooleanOperation);
        let err = op
            .validate(&json!({"operation": "UNION", "nodeIds": ["1:1"]}))
            .unwrap_err();
        assert_eq!(err.to_string(), "nodeIds must be an array with at least 2 items");
        assert!(op
            .validate(&json!({"operation": "UNION", "nodeIds": ["1:1", "1:2"]}))
            .is_ok());
    }

    #[test]
    fn test_vector_requires_path() {
        let err = tool(Command::CreateVector).validate(&json!({})).unwrap_err();
        assert_eq!(err.to_string(), "data is required");
    }

    #[test]
    fn test_ellipse_arc_bounds() {
        let ellipse = tool(Command::CreateEllipse);
        assert!(ellipse
            .validate(&json!({"arcData": {"startingAngle": 0, "endingAngle": 3.14, "innerRadius": 0.5}}))
            .is_ok());
        assert!(ellipse
            .validate(&json!({"arcData": {"innerRadius": 1.5}}))
            .is_err());
    }
}
