//! Variables, collections and modes.

use super::params::{Args, Kind, Param};
use super::{Command, ToolDef};
use figma_bridge_core::{BridgeError, Result};

const VARIABLE_TYPES: &[&str] = &["COLOR", "FLOAT", "STRING", "BOOLEAN"];
const VARIABLE_SCOPES: &[&str] = &[
    "ALL_SCOPES",
    "TEXT_CONTENT",
    "CORNER_RADIUS",
    "WIDTH_HEIGHT",
    "GAP",
    "ALL_FILLS",
    "FRAME_FILL",
    "SHAPE_FILL",
    "TEXT_FILL",
    "STROKE_COLOR",
    "STROKE_FLOAT",
    "EFFECT_FLOAT",
    "EFFECT_COLOR",
    "OPACITY",
    "FONT_FAMILY",
    "FONT_STYLE",
    "FONT_WEIGHT",
    "FONT_SIZE",
    "LINE_HEIGHT",
    "LETTER_SPACING",
    "PARAGRAPH_SPACING",
    "PARAGRAPH_INDENT",
];

fn collection_id(description: &'static str) -> Param {
    Param::string("collectionId", description)
}

fn paint_index() -> Param {
    Param::number("paintIndex", "Paint array index when binding to fills or strokes")
        .min(0.0)
        .default(0)
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::SetVariable,
            "Set the value of an existing variable for a specific mode, or bind a variable to a node property.",
        )
        .params(vec![
            Param::string("variableId", "The variable ID to set or bind"),
            Param::string("modeId", "Mode ID to set value for (required when setting value)").optional(),
            Param::variable_value("value", "The value to set (number, string, boolean, or color object)")
                .optional(),
            Param::string("nodeId", "Node ID to bind variable to (for binding operation)").optional(),
            Param::string(
                "field",
                "Node field to bind to (e.g., \"opacity\", \"cornerRadius\", \"fills\", \"strokes\")",
            )
            .optional(),
            paint_index(),
        ])
        .check(check_set_variable),
        ToolDef::forward(
            Command::CreateVariableCollection,
            "Create a new variable collection to organize variables.",
        )
        .params(vec![
            Param::string("name", "Collection name"),
            Param::ids("modes", "Mode names (defaults to [\"Mode 1\"])").optional(),
        ]),
        ToolDef::forward(Command::CreateVariable, "Create a new variable in a collection.").params(vec![
            collection_id("Variable collection ID"),
            Param::string("name", "Variable name (use \"/\" for groups, e.g., \"colors/primary\")"),
            Param::one_of("type", "Variable type", VARIABLE_TYPES),
            Param::variable_value("value", "Initial value for default mode").optional(),
            Param::string("aliasOf", "Variable ID to alias (instead of direct value)").optional(),
            Param::string("description", "Variable description").optional(),
            Param::array("scopes", "Where this variable can be used", Kind::Enum(VARIABLE_SCOPES))
                .optional(),
        ]),
        ToolDef::forward(
            Command::RenameVariable,
            "Rename an existing variable. Use \"/\" in the name to organize into groups (e.g., \"font weight/heading/h1\").",
        )
        .params(vec![
            Param::string("variableId", "The variable ID to rename"),
            Param::string("name", "The new name for the variable (use \"/\" for groups)"),
        ]),
        ToolDef::forward(
            Command::DeleteVariables,
            "Delete one or more variables from the document. Use with caution - this cannot be undone.",
        )
        .params(vec![Param::ids("variableIds", "Array of variable IDs to delete").non_empty()]),
        ToolDef::forward(
            Command::DeleteVariableCollection,
            "Delete a variable collection and all its variables. Use with caution - this cannot be undone.",
        )
        .params(vec![collection_id("The collection ID to delete")]),
        ToolDef::forward(Command::RenameVariableCollection, "Rename a variable collection.").params(vec![
            collection_id("The collection ID to rename"),
            Param::string("name", "The new name for the collection"),
        ]),
        ToolDef::forward(
            Command::RenameMode,
            "Rename a mode in a variable collection (e.g., \"Mode 1\" to \"dark\").",
        )
        .params(vec![
            collection_id("The collection ID containing the mode"),
            Param::string("modeId", "The mode ID to rename"),
            Param::string("name", "The new name for the mode"),
        ]),
        ToolDef::forward(Command::AddMode, "Add a new mode to a variable collection.").params(vec![
            collection_id("The collection ID to add mode to"),
            Param::string("name", "Name for the new mode"),
        ]),
        ToolDef::forward(
            Command::DeleteMode,
            "Delete a mode from a variable collection. Cannot delete the last mode.",
        )
        .params(vec![
            collection_id("The collection ID containing the mode"),
            Param::string("modeId", "The mode ID to delete"),
        ]),
        ToolDef::forward(Command::UnbindVariable, "Remove a variable binding from a node property.").params(
            vec![
                Param::string("nodeId", "The node ID to unbind from"),
                Param::string("field", "The field to unbind (fills, strokes, opacity, cornerRadius, etc.)"),
                paint_index(),
            ],
        ),
    ]
}

/// Setting a value needs a mode; binding to a node needs a field.
fn check_set_variable(args: &Args) -> Result<()> {
    if args.contains_key("value") && !args.contains_key("modeId") {
        return Err(BridgeError::invalid_params("modeId is required when setting a value"));
    }
    if args.contains_key("nodeId") && !args.contains_key("field") {
        return Err(BridgeError::invalid_params("field is required when binding to a node"));
    }
    Ok(())
}
