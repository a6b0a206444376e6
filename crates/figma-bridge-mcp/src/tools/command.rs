//! Plugin command names.

use std::fmt;

macro_rules! commands {
    ($($variant:ident => $name:literal,)*) => {
        /// Every command the Figma plugin understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($variant,)*
        }

        impl Command {
            #[cfg(test)]
            pub const ALL: &'static [Command] = &[$(Command::$variant,)*];

            /// Wire name sent in the `command` field.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)*
                }
            }
        }
    };
}

commands! {
    // Query
    GetContext => "get_context",
    ListPages => "list_pages",
    GetNodes => "get_nodes",
    SearchNodes => "search_nodes",
    GetChildren => "get_children",
    SearchComponents => "search_components",
    SearchStyles => "search_styles",
    GetLocalStyles => "get_local_styles",
    GetLocalVariables => "get_local_variables",
    SearchVariables => "search_variables",

    // Nodes
    SetFills => "set_fills",
    SetStrokes => "set_strokes",
    SetText => "set_text",
    CloneNodes => "clone_nodes",
    DeleteNodes => "delete_nodes",
    MoveNodes => "move_nodes",
    ResizeNodes => "resize_nodes",
    SetOpacity => "set_opacity",
    SetCornerRadius => "set_corner_radius",
    GroupNodes => "group_nodes",
    UngroupNodes => "ungroup_nodes",
    SetSelection => "set_selection",
    SetCurrentPage => "set_current_page",
    ExportNode => "export_node",
    SetEffects => "set_effects",
    SetConstraints => "set_constraints",
    SetBlendMode => "set_blend_mode",
    RenameNode => "rename_node",
    ReorderNode => "reorder_node",
    SetRotation => "set_rotation",
    ReparentNodes => "reparent_nodes",
    MoveToPage => "move_to_page",
    ZoomToNode => "zoom_to_node",
    SetDevStatus => "set_dev_status",

    // Shapes
    CreateRectangle => "create_rectangle",
    CreateFrame => "create_frame",
    CreateText => "create_text",
    CreateEllipse => "create_ellipse",
    CreateLine => "create_line",
    CreatePolygon => "create_polygon",
    CreateVector => "create_vector",
    BooleanOperation => "boolean_operation",
    CreateNodeFromSvg => "create_node_from_svg",
    CreateSection => "create_section",

    // Layout
    SetAutoLayout => "set_auto_layout",
    SetLayoutAlign => "set_layout_align",
    SetLayoutGrids => "set_layout_grids",

    // Styles
    ApplyStyle => "apply_style",
    SetTextStyle => "set_text_style",
    CreatePaintStyle => "create_paint_style",
    CreateTextStyle => "create_text_style",

    // Components
    CreateComponent => "create_component",
    CreateInstance => "create_instance",
    DetachInstance => "detach_instance",
    SwapInstance => "swap_instance",
    SetProperties => "set_properties",
    CombineAsVariants => "combine_as_variants",
    AddComponentProperty => "add_component_property",
    EditComponentProperty => "edit_component_property",
    DeleteComponentProperty => "delete_component_property",

    // Variables
    SetVariable => "set_variable",
    CreateVariableCollection => "create_variable_collection",
    CreateVariable => "create_variable",
    RenameVariable => "rename_variable",
    DeleteVariables => "delete_variables",
    DeleteVariableCollection => "delete_variable_collection",
    RenameVariableCollection => "rename_variable_collection",
    RenameMode => "rename_mode",
    AddMode => "add_mode",
    DeleteMode => "delete_mode",
    UnbindVariable => "unbind_variable",

    // Pages
    CreatePage => "create_page",
    RenamePage => "rename_page",
    DeletePage => "delete_page",
    ReorderPage => "reorder_page",
    DuplicatePage => "duplicate_page",

    // FigJam
    CreateSticky => "create_sticky",
    CreateConnector => "create_connector",
    CreateTable => "create_table",
    CreateShapeWithText => "create_shape_with_text",
    CreateCodeBlock => "create_code_block",
}

impl Command {
    /// MCP tool name: the command prefixed with `figma_`.
    pub fn tool_name(self) -> String {
        format!("figma_{}", self.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
