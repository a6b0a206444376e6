//! Comment tools backed by the Figma REST API.

use super::params::{Args, Param};
use super::{Action, ToolDef};
use crate::server::AppState;
use figma_bridge_core::comments;
use figma_bridge_core::{BridgeError, CommentFilter, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GetCommentsParams {
    node_id: Option<String>,
    unresolved_only: bool,
    include_replies: bool,
}

#[derive(Debug, Deserialize)]
struct PostCommentParams {
    message: String,
    node_id: Option<String>,
    reply_to: Option<String>,
}

pub(super) fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::local(
            "figma_get_comments",
            Action::GetComments,
            "Read all comments on the current Figma file. Supports filtering by node and resolved status. Requires FIGMA_PAT environment variable.",
        )
        .params(vec![
            Param::string("node_id", "Only return comments pinned to this node").optional(),
            Param::boolean("unresolved_only", "Only return unresolved comment threads").default(false),
            Param::boolean("include_replies", "Include replies under each thread").default(true),
        ]),
        ToolDef::local(
            "figma_post_comment",
            Action::PostComment,
            "Post a comment on the current Figma file, pinned to a node (node_id) or as a reply to an existing thread (reply_to). Requires FIGMA_PAT environment variable.",
        )
        .params(vec![
            Param::string("message", "Comment text"),
            Param::string("node_id", "Node to pin a new comment to").optional(),
            Param::string("reply_to", "Comment ID to reply to").optional(),
        ]),
    ]
}

fn parse<T: for<'de> Deserialize<'de>>(args: Args) -> Result<T> {
    serde_json::from_value(Value::Object(args)).map_err(|e| BridgeError::invalid_params(e.to_string()))
}

pub(super) async fn get_comments(state: &AppState, args: Args) -> Result<Value> {
    let params: GetCommentsParams = parse(args)?;
    let filter = CommentFilter {
        node_id: params.node_id,
        unresolved_only: params.unresolved_only,
        include_replies: params.include_replies,
    };

    let listing = comments::get_comments(state.comments.as_ref(), &state.bridge, &filter).await?;
    Ok(serde_json::to_value(listing)?)
}

pub(super) async fn post_comment(state: &AppState, args: Args) -> Result<Value> {
    let params: PostCommentParams = parse(args)?;

    let posted = comments::post_comment(
        state.comments.as_ref(),
        &state.bridge,
        &params.message,
        params.node_id.as_deref(),
        params.reply_to.as_deref(),
    )
    .await?;
    Ok(serde_json::to_value(posted)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str) -> ToolDef {
        tools()
            .into_iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("no tool {}", name))
    }

    #[test]
    fn test_get_comments_filter_defaults() {
        let args = tool("figma_get_comments").validate(&json!({})).unwrap();
        let params: GetCommentsParams = parse(args).unwrap();
        assert!(params.node_id.is_none());
        assert!(!params.unresolved_only);
        assert!(params.include_replies);
    }

    #[test]
    fn test_post_comment_requires_message() {
        let err = tool("figma_post_comment")
            .validate(&json!({"node_id": "1:2"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "message is required");

        let args = tool("figma_post_comment")
            .validate(&json!({"message": "Looks good", "reply_to": "42"}))
            .unwrap();
        let params: PostCommentParams = parse(args).unwrap();
        assert_eq!(params.reply_to.as_deref(), Some("42"));
        assert!(params.node_id.is_none());
    }
}
