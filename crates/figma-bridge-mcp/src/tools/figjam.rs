//! FigJam board elements.

use super::params::Param;
use super::{Command, ToolDef};

const STICKY_COLORS: &[&str] = &[
    "GRAY",
    "ORANGE",
    "GREEN",
    "BLUE",
    "VIOLET",
    "PINK",
    "LIGHT_GRAY",
    "YELLOW",
    "TEAL",
    "RED",
    "LIGHT_GREEN",
    "LIGHT_BLUE",
];
const MAGNETS: &[&str] = &["NONE", "AUTO", "TOP", "BOTTOM", "LEFT", "RIGHT", "CENTER"];
const CONNECTOR_TYPES: &[&str] = &["ELBOWED", "STRAIGHT", "CURVED"];
const SHAPE_TYPES: &[&str] = &[
    "SQUARE",
    "ELLIPSE",
    "ROUNDED_RECTANGLE",
    "DIAMOND",
    "TRIANGLE_UP",
    "TRIANGLE_DOWN",
    "PARALLELOGRAM_RIGHT",
    "PARALLELOGRAM_LEFT",
    "ENG_DATABASE",
    "ENG_QUEUE",
    "ENG_FILE",
    "ENG_FOLDER",
    "TRAPEZOID",
    "PREDEFINED_PROCESS",
    "SHIELD",
    "DOCUMENT_SINGLE",
    "DOCUMENT_MULTIPLE",
    "MANUAL_INPUT",
    "HEXAGON",
    "CHEVRON",
    "PENTAGON",
    "OCTAGON",
    "STAR",
    "PLUS",
    "ARROW_LEFT",
    "ARROW_RIGHT",
    "SUMMING_JUNCTION",
    "OR",
    "SPEECH_BUBBLE",
    "INTERNAL_STORAGE",
];
const CODE_LANGUAGES: &[&str] = &[
    "TYPESCRIPT",
    "CPP",
    "RUBY",
    "CSS",
    "JAVASCRIPT",
    "HTML",
    "JSON",
    "GRAPHQL",
    "PYTHON",
    "GO",
    "SQL",
    "SWIFT",
    "KOTLIN",
    "RUST",
    "BASH",
    "PLAINTEXT",
    "DART",
];

/// Position and parent shared by every board element.
fn placement() -> [Param; 3] {
    [
        Param::number("x", "X position").default(0),
        Param::number("y", "Y position").default(0),
        Param::string("parentId", "Parent node ID (defaults to current page)").optional(),
    ]
}

fn with_placement(mut params: Vec<Param>) -> Vec<Param> {
    params.extend(placement());
    params
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::CreateSticky,
            "Create a sticky note in FigJam. Supports different colors and text content.",
        )
        .params(with_placement(vec![
            Param::string("text", "Text content of the sticky").default(""),
            Param::one_of("color", "Sticky note color", STICKY_COLORS).default("YELLOW"),
        ])),
        ToolDef::forward(
            Command::CreateConnector,
            "Create a connector line between two nodes in FigJam. Connectors snap to node endpoints.",
        )
        .params(vec![
            Param::string("startNodeId", "Node ID for the start of the connector"),
            Param::string("endNodeId", "Node ID for the end of the connector"),
            Param::one_of(
                "startMagnet",
                "Start endpoint magnet position. STRAIGHT connectors only support CENTER or NONE.",
                MAGNETS,
            )
            .default("AUTO"),
            Param::one_of(
                "endMagnet",
                "End endpoint magnet position. STRAIGHT connectors only support CENTER or NONE.",
                MAGNETS,
            )
            .default("AUTO"),
            Param::one_of(
                "connectorType",
                "Connector line style. Note: STRAIGHT only allows CENTER/NONE magnets (auto-corrected).",
                CONNECTOR_TYPES,
            )
            .default("ELBOWED"),
            Param::string("text", "Label text on the connector").optional(),
            Param::color("strokes", "Connector line color").optional(),
        ]),
        ToolDef::forward(
            Command::CreateTable,
            "Create a table in FigJam with the specified number of rows and columns.",
        )
        .params(with_placement(vec![
            Param::number("rows", "Number of rows").range(1.0, 100.0),
            Param::number("columns", "Number of columns").range(1.0, 100.0),
        ])),
        ToolDef::forward(
            Command::CreateShapeWithText,
            "Create a shape with text in FigJam. Used for flowcharts, diagrams, and visual thinking.",
        )
        .params(with_placement(vec![
            Param::one_of("shapeType", "Shape type for the container", SHAPE_TYPES)
                .default("ROUNDED_RECTANGLE"),
            Param::string("text", "Text content inside the shape").default(""),
            Param::color("fills", "Shape fill color").optional(),
        ])),
        ToolDef::forward(Command::CreateCodeBlock, "Create a code block in FigJam with syntax highlighting.")
            .params(with_placement(vec![
                Param::string("code", "Code content"),
                Param::one_of("language", "Language for syntax highlighting", CODE_LANGUAGES)
                    .default("PLAINTEXT"),
            ])),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_for;
    use serde_json::{json, Value};

    #[test]
    fn test_sticky_defaults() {
        let args = tool_for(tools(), Command::CreateSticky)
            .validate(&json!({}))
            .unwrap();
        assert_eq!(
            Value::Object(args),
            json!({"text": "", "color": "YELLOW", "x": 0, "y": 0})
        );
    }

    #[test]
    fn test_table_bounds() {
        let tool = tool_for(tools(), Command::CreateTable);
        assert!(tool.validate(&json!({"rows": 3, "columns": "4"})).is_ok());

        let err = tool.validate(&json!({"rows": 0, "columns": 4})).unwrap_err();
        assert_eq!(err.to_string(), "rows must be a number between 1 and 100");
    }

    #[test]
    fn test_connector_defaults() {
        let args = tool_for(tools(), Command::CreateConnector)
            .validate(&json!({"startNodeId": "1:1", "endNodeId": "1:2"}))
            .unwrap();
        assert_eq!(args["startMagnet"], "AUTO");
        assert_eq!(args["connectorType"], "ELBOWED");
    }

    #[test]
    fn test_shape_and_language_catalogs() {
        assert_eq!(SHAPE_TYPES.len(), 30);
        assert_eq!(CODE_LANGUAGES.len(), 17);

        let err = tool_for(tools(), Command::CreateCodeBlock)
            .validate(&json!({"code": "fn main() {}", "language": "rust"}))
            .unwrap_err();
        assert!(err.to_string().starts_with("language must be one of:"));
    }
}
