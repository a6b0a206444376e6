//! Read-only document queries.

use super::params::{Kind, Param};
use super::{Command, ToolDef};

const DEPTHS: &[&str] = &["minimal", "compact", "full"];
const STYLE_TYPES: &[&str] = &["PAINT", "TEXT", "EFFECT", "GRID", "ALL"];
const VARIABLE_TYPES: &[&str] = &["COLOR", "FLOAT", "STRING", "BOOLEAN", "ALL"];
const SEARCH_STYLE_TYPES: &[&str] = &["PAINT", "TEXT", "EFFECT", "GRID"];

fn compact() -> Param {
    Param::boolean("compact", "Return compact results (fewer properties, fewer tokens)").default(true)
}

fn limit() -> Param {
    Param::number("limit", "Maximum number of results").min(1.0).default(50)
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::ListPages,
            "List all pages in the current Figma document. Returns page IDs, names, and indicates which page is currently active.",
        ),
        ToolDef::forward(
            Command::GetNodes,
            "Get detailed information about specific Figma nodes by their IDs. Returns node properties including type, position, size, fills, strokes, and more. TIP: Use figma_search_nodes or figma_get_children FIRST to find node IDs efficiently, then use this tool only for nodes you need full details on.",
        )
        .params(vec![
            Param::ids("nodeIds", "Array of Figma node IDs (e.g., [\"1:23\", \"4:56\"])").non_empty(),
            Param::one_of(
                "depth",
                "Detail level: \"minimal\" (id, name, type, childIds), \"compact\" (+ position/size), \"full\" (all properties). Use minimal/compact for tree traversal.",
                DEPTHS,
            )
            .default("full"),
        ]),
        ToolDef::forward(
            Command::SearchNodes,
            "Search for nodes by name and type within a parent scope. Much cheaper than walking the tree with figma_get_nodes.",
        )
        .params(vec![
            Param::string("parentId", "Node ID to search within (use a page ID to search a whole page)"),
            Param::string("nameContains", "Case-insensitive substring match on node name").optional(),
            Param::string("namePattern", "Glob pattern on node name (e.g., \"Button/*\")").optional(),
            Param::array("types", "Node types to include (e.g., [\"FRAME\", \"COMPONENT\"])", Kind::String).optional(),
            Param::number("maxDepth", "Maximum depth to search (-1 = unlimited)").default(-1),
            compact(),
            limit(),
        ]),
        ToolDef::forward(
            Command::GetChildren,
            "Get the direct children of a node. Browse the hierarchy one level at a time.",
        )
        .params(vec![
            Param::string("parentId", "The parent node ID"),
            compact(),
        ]),
        ToolDef::forward(
            Command::SearchComponents,
            "Search local components by name. Returns compact results with component metadata.",
        )
        .params(vec![
            Param::string("nameContains", "Case-insensitive substring match on component name").optional(),
            Param::string("namePattern", "Glob pattern on component name").optional(),
            Param::boolean("includeVariants", "Include individual variants of component sets").default(false),
            compact(),
            limit(),
        ]),
        ToolDef::forward(
            Command::SearchStyles,
            "Search local styles by name and type. Prefer this over figma_get_local_styles for large documents.",
        )
        .params(vec![
            Param::string("nameContains", "Case-insensitive substring match on style name").optional(),
            Param::one_of("type", "Style type to include", SEARCH_STYLE_TYPES).optional(),
            compact(),
            limit(),
        ]),
        ToolDef::forward(
            Command::GetLocalStyles,
            "Get all local paint, text, effect and grid styles in the document.",
        )
        .params(vec![Param::one_of("type", "Style type to return", STYLE_TYPES).default("ALL")]),
        ToolDef::forward(
            Command::GetLocalVariables,
            "Get all local variables and collections. Output can be very large; prefer figma_search_variables.",
        )
        .params(vec![Param::one_of("type", "Variable type to return", VARIABLE_TYPES).default("ALL")]),
        ToolDef::forward(
            Command::SearchVariables,
            "Search variables by name pattern, type and collection. Much smaller output than figma_get_local_variables.",
        )
        .params(vec![
            Param::string("namePattern", "Glob pattern on variable name (e.g., \"colors/*\")").optional(),
            Param::string("nameContains", "Case-insensitive substring match on variable name").optional(),
            Param::one_of("type", "Variable type", VARIABLE_TYPES).optional(),
            Param::string("collectionName", "Only variables in this collection").optional(),
            compact(),
            limit(),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool_for;
    use serde_json::json;

    fn tool(command: Command) -> ToolDef {
        tool_for(tools(), command)
    }

    #[test]
    fn test_get_nodes_defaults_depth() {
        let args = tool(Command::GetNodes)
            .validate(&json!({"nodeIds": ["1:2"]}))
            .unwrap();
        assert_eq!(args["depth"], "full");

        let err = tool(Command::GetNodes)
            .validate(&json!({"nodeIds": ["1:2"], "depth": "deep"}))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
    }

    #[test]
    fn test_search_nodes_needs_scope() {
        let search = tool(Command::SearchNodes);
        let err = search.validate(&json!({"nameContains": "Button"})).unwrap_err();
        assert_eq!(err.to_string(), "parentId is required");

        let args = search
            .validate(&json!({"parentId": "0:1", "limit": "10"}))
            .unwrap();
        assert_eq!(args["limit"], json!(10));
        assert_eq!(args["maxDepth"], json!(-1));
        assert_eq!(args["compact"], json!(true));
    }
}
