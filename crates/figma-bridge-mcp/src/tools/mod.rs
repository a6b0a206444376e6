//! Tool catalog, split by domain.
//!
//! Most tools forward a validated payload to one plugin command. A few run
//! locally: server info, document context (which reports disconnection as
//! a normal result) and the REST-backed comment tools.

mod command;
mod comments;
mod components;
mod figjam;
mod layout;
mod nodes;
mod pages;
pub mod params;
mod query;
mod shapes;
mod status;
mod styles;
mod variables;

pub use command::Command;

use crate::server::AppState;
use crate::wrapper::ToolOutput;
use figma_bridge_core::{BridgeError, Result};
use params::{Args, Param};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Extra rule over validated arguments (cross-field requirements).
pub type Check = fn(&Args) -> Result<()>;

/// What a tool does once its arguments are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward(Command),
    ServerInfo,
    GetContext,
    GetComments,
    PostComment,
}

pub struct ToolDef {
    pub name: String,
    pub description: &'static str,
    pub params: Vec<Param>,
    pub action: Action,
    check: Option<Check>,
}

impl ToolDef {
    /// Tool forwarding to `command`, named `figma_<command>`.
    pub fn forward(command: Command, description: &'static str) -> Self {
        Self {
            name: command.tool_name(),
            description,
            params: Vec::new(),
            action: Action::Forward(command),
            check: None,
        }
    }

    /// Tool handled in this process.
    pub fn local(name: &str, action: Action, description: &'static str) -> Self {
        Self {
            name: name.to_string(),
            description,
            params: Vec::new(),
            action,
            check: None,
        }
    }

    pub fn params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }

    /// Validate raw arguments, then apply the tool's own rule.
    pub fn validate(&self, arguments: &Value) -> Result<Args> {
        let args = params::validate(&self.params, arguments)?;
        if let Some(check) = self.check {
            check(&args)?;
        }
        Ok(args)
    }

    /// `tools/list` entry.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": params::object_schema(&self.params),
        })
    }
}

/// Every tool, in registration order.
pub struct Catalog {
    tools: Vec<ToolDef>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        let tools: Vec<ToolDef> = [
            status::tools(),
            query::tools(),
            nodes::tools(),
            shapes::tools(),
            layout::tools(),
            styles::tools(),
            components::tools(),
            variables::tools(),
            pages::tools(),
            figjam::tools(),
            comments::tools(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let by_name = tools
            .iter()
            .enumerate()
            .map(|(i, tool)| (tool.name.clone(), i))
            .collect();

        Self { tools, by_name }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn list(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDef::describe).collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one tool. Never fails: errors become error envelopes.
pub async fn call(state: &AppState, tool: &ToolDef, arguments: &Value) -> ToolOutput {
    debug!("Tool call: {}", tool.name);

    match tool.action {
        Action::ServerInfo => status::server_info(state),
        Action::GetContext => status::get_context(state).await,
        Action::GetComments => match tool.validate(arguments) {
            Ok(args) => comments::get_comments(state, args).await.into(),
            Err(e) => ToolOutput::from_error(&e),
        },
        Action::PostComment => match tool.validate(arguments) {
            Ok(args) => comments::post_comment(state, args).await.into(),
            Err(e) => ToolOutput::from_error(&e),
        },
        Action::Forward(command) => forward(state, tool, command, arguments).await.into(),
    }
}

async fn forward(state: &AppState, tool: &ToolDef, command: Command, arguments: &Value) -> Result<Value> {
    if !state.bridge.is_connected() {
        return Err(BridgeError::NotConnected);
    }
    let args = tool.validate(arguments)?;
    let result = state
        .bridge
        .send_command(command.as_str(), Value::Object(args))
        .await;

    if let Err(e) = &result {
        if e.outcome_unknown() {
            warn!("{} may still have been applied by the plugin: {}", command, e);
        } else if e.is_retryable() {
            debug!("{} failed but can be retried: {}", command, e);
        }
    }
    result
}

#[cfg(test)]
fn tool_for(tools: Vec<ToolDef>, command: Command) -> ToolDef {
    tools
        .into_iter()
        .find(|t| t.action == Action::Forward(command))
        .unwrap_or_else(|| panic!("no tool for {}", command))
}
