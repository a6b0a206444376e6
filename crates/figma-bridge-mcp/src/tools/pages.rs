//! Page management.

use super::params::Param;
use super::{Command, ToolDef};

fn page_id(description: &'static str) -> Param {
    Param::string("pageId", description)
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::CreatePage,
            "Create a new page in the Figma document. Returns the created page.",
        )
        .params(vec![
            Param::string("name", "Name for the new page"),
            Param::number("index", "Position in the page list (0 = first). Defaults to end.")
                .min(0.0)
                .optional(),
        ]),
        ToolDef::forward(Command::RenamePage, "Rename an existing page in the Figma document.").params(vec![
            page_id("The page ID to rename"),
            Param::string("name", "The new name for the page"),
        ]),
        ToolDef::forward(
            Command::DeletePage,
            "Delete a page from the Figma document. Cannot delete the last remaining page.",
        )
        .params(vec![page_id("The page ID to delete")]),
        ToolDef::forward(Command::ReorderPage, "Change the position of a page in the page list.").params(vec![
            page_id("The page ID to reorder"),
            Param::number("index", "New position in the page list (0 = first)").min(0.0),
        ]),
        ToolDef::forward(
            Command::DuplicatePage,
            "Clone an entire page including all its contents. The new page is inserted after the original.",
        )
        .params(vec![
            page_id("The page ID to duplicate"),
            Param::string("name", "Name for the new page (defaults to \"original name + copy\")").optional(),
        ]),
    ]
}
