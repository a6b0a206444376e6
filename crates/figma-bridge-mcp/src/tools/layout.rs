//! Auto-layout, child alignment and layout grids.

use super::params::{Kind, Param};
use super::{Command, ToolDef};

const LAYOUT_MODES: &[&str] = &["NONE", "HORIZONTAL", "VERTICAL"];
const SIZING_MODES: &[&str] = &["FIXED", "AUTO"];
const PRIMARY_ALIGN: &[&str] = &["MIN", "CENTER", "MAX", "SPACE_BETWEEN"];
const COUNTER_ALIGN: &[&str] = &["MIN", "CENTER", "MAX", "BASELINE"];
const WRAP_MODES: &[&str] = &["NO_WRAP", "WRAP"];
const CHILD_ALIGN: &[&str] = &["MIN", "CENTER", "MAX", "STRETCH", "INHERIT"];
const POSITIONING: &[&str] = &["AUTO", "ABSOLUTE"];
const GRID_PATTERNS: &[&str] = &["COLUMNS", "ROWS", "GRID"];
const GRID_ALIGNMENT: &[&str] = &["MIN", "CENTER", "MAX", "STRETCH"];

fn spacing(name: &'static str, description: &'static str) -> Param {
    Param::number(name, description).min(0.0).optional()
}

fn layout_grid() -> Kind {
    Kind::Object(vec![
        Param::one_of("pattern", "Grid pattern type", GRID_PATTERNS),
        Param::number("sectionSize", "Size of each column/row/cell in pixels").min(0.0).optional(),
        Param::boolean("visible", "Whether grid is visible").default(true),
        Param::object(
            "color",
            "Grid color with alpha",
            vec![
                Param::number("r", "Red (0-1)").range(0.0, 1.0),
                Param::number("g", "Green (0-1)").range(0.0, 1.0),
                Param::number("b", "Blue (0-1)").range(0.0, 1.0),
                Param::number("a", "Alpha (0-1)").range(0.0, 1.0).default(0.1),
            ],
        )
        .optional(),
        Param::one_of("alignment", "Column/row alignment (for COLUMNS/ROWS pattern)", GRID_ALIGNMENT)
            .optional(),
        Param::number("gutterSize", "Gutter size between columns/rows in pixels").min(0.0).optional(),
        Param::number("offset", "Offset from edge in pixels").optional(),
        Param::number("count", "Number of columns/rows (use a large number like 100 for auto)")
            .min(1.0)
            .optional(),
    ])
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::SetAutoLayout,
            "Configure auto-layout on a frame. Enables responsive layouts with automatic spacing and alignment.",
        )
        .params(vec![
            Param::string("nodeId", "The frame node ID to configure"),
            Param::one_of(
                "layoutMode",
                "Layout direction: NONE (disable), HORIZONTAL (row), or VERTICAL (column)",
                LAYOUT_MODES,
            )
            .optional(),
            Param::one_of("primaryAxisSizingMode", "How the frame sizes along the primary axis", SIZING_MODES)
                .optional(),
            Param::one_of("counterAxisSizingMode", "How the frame sizes along the counter axis", SIZING_MODES)
                .optional(),
            Param::one_of("primaryAxisAlignItems", "Alignment of children along primary axis", PRIMARY_ALIGN)
                .optional(),
            Param::one_of("counterAxisAlignItems", "Alignment of children along counter axis", COUNTER_ALIGN)
                .optional(),
            spacing("paddingTop", "Top padding in pixels"),
            spacing("paddingRight", "Right padding in pixels"),
            spacing("paddingBottom", "Bottom padding in pixels"),
            spacing("paddingLeft", "Left padding in pixels"),
            spacing("itemSpacing", "Space between items in pixels"),
            spacing("counterAxisSpacing", "Space between rows when wrapped"),
            Param::one_of("layoutWrap", "Whether to wrap items to new rows/columns", WRAP_MODES).optional(),
        ]),
        ToolDef::forward(
            Command::SetLayoutAlign,
            "Set how a child behaves within an auto-layout frame. Controls individual alignment (STRETCH), growth (fill container), and absolute positioning.",
        )
        .params(vec![
            Param::string("nodeId", "The child node ID to modify"),
            Param::one_of("layoutAlign", "Counter-axis alignment: STRETCH to fill width/height", CHILD_ALIGN)
                .optional(),
            Param::number("layoutGrow", "Primary-axis growth: 0 = fixed size, 1 = fill available space")
                .range(0.0, 1.0)
                .optional(),
            Param::one_of(
                "layoutPositioning",
                "AUTO = follow auto-layout, ABSOLUTE = manually positioned",
                POSITIONING,
            )
            .optional(),
        ]),
        ToolDef::forward(
            Command::SetLayoutGrids,
            "Set layout grids on a frame. Grids help with alignment and spacing. Pass an empty array to remove all grids.",
        )
        .params(vec![
            Param::string("nodeId", "The frame node ID to set grids on"),
            Param::array("layoutGrids", "Array of layout grid configurations", layout_grid()),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_for;
    use serde_json::json;

    #[test]
    fn test_auto_layout_enums_and_padding() {
        let tool = tool_for(tools(), Command::SetAutoLayout);
        assert!(tool
            .validate(&json!({"nodeId": "1:1", "layoutMode": "VERTICAL", "itemSpacing": "8"}))
            .is_ok());

        let err = tool
            .validate(&json!({"nodeId": "1:1", "layoutMode": "DIAGONAL"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "layoutMode must be one of: NONE, HORIZONTAL, VERTICAL");

        let err = tool
            .validate(&json!({"nodeId": "1:1", "paddingTop": -4}))
            .unwrap_err();
        assert_eq!(err.to_string(), "paddingTop must be at least 0");
    }

    #[test]
    fn test_layout_grid_defaults() {
        let tool = tool_for(tools(), Command::SetLayoutGrids);
        let args = tool
            .validate(&json!({
                "nodeId": "1:1",
                "layoutGrids": [{"pattern": "COLUMNS", "count": 12, "color": {"r": 1, "g": 0, "b": 0}}]
            }))
            .unwrap();
        let grid = &args["layoutGrids"][0];
        assert_eq!(grid["visible"], json!(true));
        assert_eq!(grid["color"]["a"], json!(0.1));

        // Empty list removes grids.
        assert!(tool.validate(&json!({"nodeId": "1:1", "layoutGrids": []})).is_ok());
    }
}
