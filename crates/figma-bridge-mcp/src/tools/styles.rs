//! Local styles and text formatting.

use super::params::{Args, Param};
use super::{Command, ToolDef};
use figma_bridge_core::{BridgeError, Result};
use serde_json::Value;

const STYLE_PROPERTIES: &[&str] = &["fills", "strokes", "text", "effects", "grid"];
const TEXT_CASES: &[&str] = &["ORIGINAL", "UPPER", "LOWER", "TITLE"];
const TEXT_DECORATIONS: &[&str] = &["NONE", "UNDERLINE", "STRIKETHROUGH"];
const LINE_HEIGHT_UNITS: &[&str] = &["AUTO", "PIXELS", "PERCENT"];
const LETTER_SPACING_UNITS: &[&str] = &["PIXELS", "PERCENT"];
const ALIGN_HORIZONTAL: &[&str] = &["LEFT", "CENTER", "RIGHT", "JUSTIFIED"];
const ALIGN_VERTICAL: &[&str] = &["TOP", "CENTER", "BOTTOM"];

fn line_height() -> Param {
    Param::object(
        "lineHeight",
        "Line height (AUTO, or PIXELS/PERCENT with value)",
        vec![
            Param::one_of("unit", "Unit", LINE_HEIGHT_UNITS),
            Param::number("value", "Line height value (not used with AUTO)").optional(),
        ],
    )
    .optional()
}

fn letter_spacing() -> Param {
    Param::object(
        "letterSpacing",
        "Letter spacing (PIXELS or PERCENT with value)",
        vec![
            Param::one_of("unit", "Unit", LETTER_SPACING_UNITS),
            Param::number("value", "Letter spacing value"),
        ],
    )
    .optional()
}

fn text_case() -> Param {
    Param::one_of("textCase", "Text case transformation", TEXT_CASES).optional()
}

fn text_decoration() -> Param {
    Param::one_of("textDecoration", "Text decoration", TEXT_DECORATIONS).optional()
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::ApplyStyle,
            "Apply a local style to a node. Styles provide consistent, reusable design tokens.",
        )
        .params(vec![
            Param::string("nodeId", "The node ID to apply the style to"),
            Param::string("styleId", "The style ID to apply"),
            Param::one_of("property", "Which property to apply the style to", STYLE_PROPERTIES),
        ]),
        ToolDef::forward(Command::SetTextStyle, "Set text font properties.")
            .params(vec![
                Param::string("nodeId", "Text node ID"),
                Param::number("fontSize", "Font size in pixels").min(1.0).optional(),
                Param::string("fontFamily", "Font family (e.g., \"Inter\")").optional(),
                Param::string("fontStyle", "Font style (e.g., \"Bold\", \"Regular\")").optional(),
                text_case(),
                text_decoration(),
                line_height(),
                letter_spacing(),
                Param::one_of("textAlignHorizontal", "Horizontal text alignment", ALIGN_HORIZONTAL)
                    .optional(),
                Param::one_of("textAlignVertical", "Vertical text alignment", ALIGN_VERTICAL).optional(),
            ])
            .check(check_line_height),
        ToolDef::forward(Command::CreatePaintStyle, "Create a paint style.").params(vec![
            Param::string("name", "Style name (use \"/\" for folders, e.g., \"Brand/Primary\")"),
            Param::color("fills", "Fill color - use { color: \"#RRGGBB\" } for simple colors"),
            Param::string("description", "Style description").optional(),
        ]),
        ToolDef::forward(Command::CreateTextStyle, "Create a text style.")
            .params(vec![
                Param::string("name", "Style name (use \"/\" for folders)"),
                Param::string("fontFamily", "Font family").default("Inter"),
                Param::string("fontStyle", "Font style (Regular, Bold, etc.)").default("Regular"),
                Param::number("fontSize", "Font size in pixels").min(1.0).default(16),
                line_height(),
                letter_spacing(),
                text_case(),
                text_decoration(),
                Param::string("description", "Style description").optional(),
            ])
            .check(check_line_height),
    ]
}

/// PIXELS and PERCENT line heights need a value; AUTO takes none.
fn check_line_height(args: &Args) -> Result<()> {
    let Some(line_height) = args.get("lineHeight") else {
        return Ok(());
    };
    let unit = line_height.get("unit").and_then(Value::as_str).unwrap_or_default();
    if unit != "AUTO" && line_height.get("value").is_none() {
        return Err(BridgeError::invalid_params(format!(
            "lineHeight.value is required for {}",
            unit
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_for;
    use serde_json::json;

    #[test]
    fn test_line_height_units() {
        let tool = tool_for(tools(), Command::SetTextStyle);
        assert!(tool
            .validate(&json!({"nodeId": "1:1", "lineHeight": {"unit": "AUTO"}}))
            .is_ok());
        assert!(tool
            .validate(&json!({"nodeId": "1:1", "lineHeight": {"unit": "PERCENT", "value": "150"}}))
            .is_ok());

        let err = tool
            .validate(&json!({"nodeId": "1:1", "lineHeight": {"unit": "PIXELS"}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "lineHeight.value is required for PIXELS");
    }

    #[test]
    fn test_text_style_defaults() {
        let tool = tool_for(tools(), Command::CreateTextStyle);
        let args = tool.validate(&json!({"name": "Heading/H1"})).unwrap();
        assert_eq!(args["fontFamily"], "Inter");
        assert_eq!(args["fontStyle"], "Regular");
        assert_eq!(args["fontSize"], json!(16));
    }

    #[test]
    fn test_paint_style_needs_fills() {
        let tool = tool_for(tools(), Command::CreatePaintStyle);
        let err = tool.validate(&json!({"name": "Brand/Primary"})).unwrap_err();
        assert_eq!(err.to_string(), "fills is required");
    }
}
