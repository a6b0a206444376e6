//! Components, instances and component properties.

use super::params::{Kind, Param};
use super::{Command, ToolDef};

const PROPERTY_TYPES: &[&str] = &["BOOLEAN", "TEXT", "INSTANCE_SWAP", "VARIANT"];
const PREFERRED_TYPES: &[&str] = &["COMPONENT", "COMPONENT_SET"];

fn preferred_values(name: &'static str, description: &'static str) -> Param {
    Param::array(
        name,
        description,
        Kind::Object(vec![
            Param::one_of("type", "Preferred value type", PREFERRED_TYPES),
            Param::string("key", "Component or component set key"),
        ]),
    )
    .optional()
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::forward(
            Command::CreateComponent,
            "Create a new component, or convert an existing node into a component with fromNodeId.",
        )
        .params(vec![
            Param::string("fromNodeId", "Existing node to convert into a component").optional(),
            Param::number("x", "X position").default(0),
            Param::number("y", "Y position").default(0),
            Param::number("width", "Width in pixels").default(100),
            Param::number("height", "Height in pixels").default(100),
            Param::string("name", "Component name").default("Component"),
            Param::color("fills", "Fill color").optional(),
            Param::string("parentId", "Parent node ID (defaults to current page)").optional(),
            Param::string("description", "Component description").optional(),
        ]),
        ToolDef::forward(Command::CreateInstance, "Create an instance of a component.").params(vec![
            Param::string("componentId", "The component ID to instantiate"),
            Param::number("x", "X position").default(0),
            Param::number("y", "Y position").default(0),
            Param::string("parentId", "Parent node ID (defaults to current page)").optional(),
            Param::string("name", "Instance name").optional(),
        ]),
        ToolDef::forward(
            Command::DetachInstance,
            "Detach an instance from its main component, turning it into a regular frame.",
        )
        .params(vec![Param::string("nodeId", "The instance node ID")]),
        ToolDef::forward(Command::SwapInstance, "Swap an instance to use a different component.")
            .params(vec![
                Param::string("instanceId", "The instance node ID"),
                Param::string("newComponentId", "The component to swap to"),
            ]),
        ToolDef::forward(
            Command::SetProperties,
            "Set component properties on an instance (variant values, text, booleans, instance swaps).",
        )
        .params(vec![
            Param::string("nodeId", "The instance node ID"),
            Param::record("properties", "Property name to value map"),
        ]),
        ToolDef::forward(
            Command::CombineAsVariants,
            "Combine components into a component set with variants.",
        )
        .params(vec![Param::ids(
            "componentIds",
            "Component IDs to combine (minimum 2)",
        )
        .min_items(2)]),
        ToolDef::forward(
            Command::AddComponentProperty,
            "Add a property to a component or component set.",
        )
        .params(vec![
            Param::string("componentId", "Component or component set ID"),
            Param::string("propertyName", "Property name"),
            Param::one_of("type", "Property type", PROPERTY_TYPES),
            Param::string_or_bool("defaultValue", "Default value (boolean for BOOLEAN, string otherwise)"),
            preferred_values("preferredValues", "Preferred values for INSTANCE_SWAP properties"),
        ]),
        ToolDef::forward(
            Command::EditComponentProperty,
            "Edit an existing component property's name, default value or preferred values.",
        )
        .params(vec![
            Param::string("componentId", "Component or component set ID"),
            Param::string("propertyName", "Current property name"),
            Param::string("newName", "New property name").optional(),
            Param::string_or_bool("newDefaultValue", "New default value").optional(),
            preferred_values("newPreferredValues", "New preferred values for INSTANCE_SWAP properties"),
        ]),
        ToolDef::forward(
            Command::DeleteComponentProperty,
            "Delete a property from a component or component set.",
        )
        .params(vec![
            Param::string("componentId", "Component or component set ID"),
            Param::string("propertyName", "Property name to delete"),
        ]),
    ]
}
