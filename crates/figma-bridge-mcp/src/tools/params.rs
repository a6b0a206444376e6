//! Tool parameter declarations.
//!
//! A tool declares its parameters once. The same declaration renders the
//! `inputSchema` advertised by `tools/list` and validates incoming arguments:
//! required fields, numbers given as strings, bounds, enumerations and
//! defaults. Undeclared arguments are dropped, so the validated map is the
//! exact command payload.

use figma_bridge_core::{BridgeError, Result};
use serde_json::{json, Map, Number, Value};

/// Validated tool arguments.
pub type Args = Map<String, Value>;

#[derive(Debug, Clone)]
pub enum Kind {
    String,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    Enum(&'static [&'static str]),
    Array {
        items: Box<Kind>,
        min_items: usize,
    },
    Object(Vec<Param>),
    /// `{color: "#RRGGBB"}`, `{r, g, b, a?}` or a full paints array.
    Color,
    /// RGBA object with 0-1 channels.
    Rgba,
    StringOrBool,
    /// Property name to string or boolean.
    Record,
    /// `"front"`, `"back"` or a layer index.
    Position,
    /// Number, string, boolean, RGBA object or `{color}` hex shorthand.
    VariableValue,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: Kind,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl Param {
    fn new(name: &'static str, description: &'static str, kind: Kind) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
            nullable: false,
            default: None,
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::String)
    }

    pub fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::Number { min: None, max: None })
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::Boolean)
    }

    pub fn one_of(
        name: &'static str,
        description: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::new(name, description, Kind::Enum(values))
    }

    pub fn array(name: &'static str, description: &'static str, items: Kind) -> Self {
        Self::new(
            name,
            description,
            Kind::Array {
                items: Box::new(items),
                min_items: 0,
            },
        )
    }

    /// Array of node (or other object) ids.
    pub fn ids(name: &'static str, description: &'static str) -> Self {
        Self::array(name, description, Kind::String)
    }

    pub fn object(name: &'static str, description: &'static str, fields: Vec<Param>) -> Self {
        Self::new(name, description, Kind::Object(fields))
    }

    pub fn color(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::Color)
    }

    pub fn string_or_bool(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::StringOrBool)
    }

    pub fn record(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::Record)
    }

    pub fn position(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::Position)
    }

    pub fn variable_value(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, Kind::VariableValue)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional, filled with `value` when absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(value.into());
        self
    }

    /// Explicit `null` is kept and forwarded.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn min(mut self, value: f64) -> Self {
        if let Kind::Number { min, .. } = &mut self.kind {
            *min = Some(value);
        }
        self
    }

    pub fn max(mut self, value: f64) -> Self {
        if let Kind::Number { max, .. } = &mut self.kind {
            *max = Some(value);
        }
        self
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.min(min).max(max)
    }

    pub fn min_items(mut self, count: usize) -> Self {
        if let Kind::Array { min_items, .. } = &mut self.kind {
            *min_items = count;
        }
        self
    }

    pub fn non_empty(self) -> Self {
        self.min_items(1)
    }

    fn schema(&self) -> Value {
        let mut schema = self.kind.schema();
        if let Value::Object(map) = &mut schema {
            map.insert("description".into(), self.description.into());
            if let Some(default) = &self.default {
                map.insert("default".into(), default.clone());
            }
        }
        if self.nullable {
            schema = json!({"anyOf": [schema, {"type": "null"}], "description": self.description});
        }
        schema
    }
}

/// Render `{type: "object", properties, required}` for a parameter list.
pub fn object_schema(params: &[Param]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        if param.required {
            required.push(Value::from(param.name));
        }
        properties.insert(param.name.to_string(), param.schema());
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn rgba_fields() -> Vec<Param> {
    vec![
        Param::number("r", "Red (0-1)").range(0.0, 1.0),
        Param::number("g", "Green (0-1)").range(0.0, 1.0),
        Param::number("b", "Blue (0-1)").range(0.0, 1.0),
        Param::number("a", "Alpha (0-1)").range(0.0, 1.0).optional(),
    ]
}

impl Kind {
    fn schema(&self) -> Value {
        match self {
            Kind::String => json!({"type": "string"}),
            Kind::Number { min, max } => {
                let mut schema = json!({"type": "number"});
                if let Some(min) = min {
                    schema["minimum"] = json!(min);
                }
                if let Some(max) = max {
                    schema["maximum"] = json!(max);
                }
                schema
            }
            Kind::Boolean => json!({"type": "boolean"}),
            Kind::Enum(values) => json!({"type": "string", "enum": values}),
            Kind::Array { items, min_items } => {
                let mut schema = json!({"type": "array", "items": items.schema()});
                if *min_items > 0 {
                    schema["minItems"] = json!(min_items);
                }
                schema
            }
            Kind::Object(fields) => object_schema(fields),
            Kind::Color => json!({
                "anyOf": [
                    {
                        "type": "object",
                        "properties": {"color": {"type": "string", "description": "Hex color (e.g., \"#FF0000\" or \"#FF0000FF\" with alpha)"}},
                        "required": ["color"]
                    },
                    object_schema(&rgba_fields()),
                    {"type": "array", "items": {}, "description": "Full Figma paints array (pass [] to remove all)"}
                ]
            }),
            Kind::Rgba => object_schema(&rgba_fields()),
            Kind::StringOrBool => json!({"type": ["string", "boolean"]}),
            Kind::Record => json!({
                "type": "object",
                "additionalProperties": {"type": ["string", "boolean"]}
            }),
            Kind::Position => json!({
                "anyOf": [{"type": "string", "enum": ["front", "back"]}, {"type": "number"}]
            }),
            Kind::VariableValue => json!({
                "anyOf": [
                    {"type": "number"},
                    {"type": "string"},
                    {"type": "boolean"},
                    object_schema(&rgba_fields()),
                    {"type": "object", "properties": {"color": {"type": "string"}}, "required": ["color"]}
                ]
            }),
        }
    }

    /// Check one present, non-null value. Returns the normalized value.
    fn check(&self, path: &str, value: &Value) -> Result<Value> {
        match self {
            Kind::String => match value {
                Value::String(_) => Ok(value.clone()),
                _ => Err(invalid(format!("{} must be a string", path))),
            },
            Kind::Number { min, max } => {
                let number = coerce_number(value)
                    .ok_or_else(|| invalid(format!("{} must be a number", path)))?;
                check_bounds(path, number, *min, *max)?;
                Ok(match value {
                    Value::Number(_) => value.clone(),
                    _ => number_value(number),
                })
            }
            Kind::Boolean => match value {
                Value::Bool(_) => Ok(value.clone()),
                _ => Err(invalid(format!("{} must be a boolean", path))),
            },
            Kind::Enum(values) => match value.as_str() {
                Some(s) if values.contains(&s) => Ok(value.clone()),
                _ => Err(invalid(format!(
                    "{} must be one of: {}",
                    path,
                    values.join(", ")
                ))),
            },
            Kind::Array { items, min_items } => {
                let array = value
                    .as_array()
                    .ok_or_else(|| invalid(format!("{} must be an array", path)))?;
                if array.len() < *min_items {
                    return Err(invalid(match min_items {
                        1 => format!("{} must be a non-empty array", path),
                        n => format!("{} must be an array with at least {} items", path, n),
                    }));
                }
                array
                    .iter()
                    .enumerate()
                    .map(|(i, item)| items.check(&format!("{}[{}]", path, i), item))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
            Kind::Object(fields) => {
                let map = value
                    .as_object()
                    .ok_or_else(|| invalid(format!("{} must be an object", path)))?;
                validate_map(fields, map, Some(path)).map(Value::Object)
            }
            Kind::Color => match value {
                Value::Array(_) => Ok(value.clone()),
                Value::Object(map) if map.contains_key("color") => match map.get("color") {
                    Some(Value::String(hex)) => Ok(json!({"color": hex})),
                    _ => Err(invalid(format!("{}.color must be a hex string", path))),
                },
                Value::Object(map) => validate_map(&rgba_fields(), map, Some(path)).map(Value::Object),
                _ => Err(invalid(format!(
                    "{} must be {{color: \"#RRGGBB\"}}, {{r, g, b, a?}} or a paints array",
                    path
                ))),
            },
            Kind::Rgba => match value.as_object() {
                Some(map) => validate_map(&rgba_fields(), map, Some(path)).map(Value::Object),
                None => Err(invalid(format!("{} must be an {{r, g, b, a?}} object", path))),
            },
            Kind::StringOrBool => match value {
                Value::String(_) | Value::Bool(_) => Ok(value.clone()),
                _ => Err(invalid(format!("{} must be a string or boolean", path))),
            },
            Kind::Record => {
                let map = value
                    .as_object()
                    .ok_or_else(|| invalid(format!("{} must be an object", path)))?;
                for (key, entry) in map {
                    Kind::StringOrBool.check(&format!("{}.{}", path, key), entry)?;
                }
                Ok(value.clone())
            }
            Kind::Position => match value {
                Value::String(s) if s == "front" || s == "back" => Ok(value.clone()),
                _ => coerce_number(value).map(number_value).ok_or_else(|| {
                    invalid(format!(
                        "{} is required (front, back, or index number)",
                        path
                    ))
                }),
            },
            Kind::VariableValue => match value {
                Value::Number(_) | Value::String(_) | Value::Bool(_) => Ok(value.clone()),
                Value::Object(map) if map.contains_key("color") => Kind::Color.check(path, value),
                Value::Object(_) => Kind::Rgba.check(path, value),
                _ => Err(invalid(format!(
                    "{} must be a number, string, boolean or color",
                    path
                ))),
            },
        }
    }
}

/// Validate raw tool arguments against a parameter list.
///
/// Absent (or `null`) arguments are valid only for optional parameters.
pub fn validate(params: &[Param], arguments: &Value) -> Result<Args> {
    let empty = Map::new();
    let map = match arguments {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(invalid("arguments must be an object")),
    };
    validate_map(params, map, None)
}

fn validate_map(params: &[Param], input: &Map<String, Value>, prefix: Option<&str>) -> Result<Args> {
    let mut out = Map::new();
    for param in params {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, param.name),
            None => param.name.to_string(),
        };

        match input.get(param.name) {
            Some(Value::Null) if param.nullable => {
                out.insert(param.name.to_string(), Value::Null);
            }
            None | Some(Value::Null) => {
                if let Some(default) = &param.default {
                    out.insert(param.name.to_string(), default.clone());
                } else if param.required {
                    return Err(invalid(format!("{} is required", path)));
                }
            }
            Some(value) => {
                out.insert(param.name.to_string(), param.kind.check(&path, value)?);
            }
        }
    }
    Ok(out)
}

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::invalid_params(message)
}

fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn check_bounds(path: &str, number: f64, min: Option<f64>, max: Option<f64>) -> Result<()> {
    match (min, max) {
        (Some(min), Some(max)) if number < min || number > max => Err(invalid(format!(
            "{} must be a number between {} and {}",
            path, min, max
        ))),
        (Some(min), None) if number < min => {
            Err(invalid(format!("{} must be at least {}", path, min)))
        }
        (None, Some(max)) if number > max => {
            Err(invalid(format!("{} must be at most {}", path, max)))
        }
        _ => Ok(()),
    }
}

/// Integral values stay integers on the wire.
fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::from(number as i64)
    } else {
        Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// At least one of `keys` must be present in validated arguments.
pub fn require_any(args: &Args, keys: &[&str], message: &str) -> Result<()> {
    if keys.iter().any(|key| args.get(*key).is_some_and(|v| !v.is_null())) {
        Ok(())
    } else {
        Err(invalid(message))
    }
}
