//! File comments through the Figma REST API.
//!
//! Unlike plugin commands these calls go straight to `api.figma.com`. The
//! plugin connection is still needed: the file key comes from the handshake
//! metadata, and thread node names are looked up with a `get_nodes` command.

mod client;
pub mod model;

pub use client::FigmaApiClient;
pub use model::{
    CommentFilter, CommentReply, CommentTarget, CommentThread, PostedComment, RawComment,
};

use crate::bridge::Bridge;
use crate::{BridgeError, Result};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

/// Result of listing comments.
#[derive(Debug, Serialize)]
pub struct CommentListing {
    pub success: bool,
    pub comments: Vec<CommentThread>,
    pub total: usize,
}

/// Result of posting a comment.
#[derive(Debug, Serialize)]
pub struct CommentPosted {
    pub success: bool,
    pub comment: PostedComment,
}

/// Resolve the REST client and the open file's key.
///
/// Checked in order: token configured, plugin connected, file key known.
fn file_key<'a>(api: Option<&'a FigmaApiClient>, bridge: &Bridge) -> Result<(&'a FigmaApiClient, String)> {
    let api = api.ok_or(BridgeError::PatNotConfigured)?;

    if !bridge.is_connected() {
        return Err(BridgeError::FileKeyNeedsPlugin);
    }

    let key = bridge
        .document_info()
        .and_then(|doc| doc.get("fileId").and_then(Value::as_str).map(str::to_string))
        .filter(|key| !key.is_empty() && key != "unknown")
        .ok_or(BridgeError::FileKeyUnavailable)?;

    Ok((api, key))
}

/// List comment threads on the open file.
pub async fn get_comments(
    api: Option<&FigmaApiClient>,
    bridge: &Bridge,
    filter: &CommentFilter,
) -> Result<CommentListing> {
    let (api, key) = file_key(api, bridge)?;

    let raw = api.list_comments(&key).await?;
    let mut threads = model::assemble_threads(raw, filter);

    let node_ids = model::pinned_node_ids(&threads);
    if !node_ids.is_empty() && bridge.is_connected() {
        match bridge
            .send_command("get_nodes", json!({"nodeIds": node_ids, "depth": "minimal"}))
            .await
        {
            Ok(reply) => model::attach_node_names(&mut threads, &reply),
            Err(e) => debug!("Skipping comment node names: {}", e),
        }
    }

    Ok(CommentListing {
        success: true,
        total: threads.len(),
        comments: threads,
    })
}

/// Post a comment pinned to `node_id`, or a reply to `reply_to`. Exactly one
/// of the two must be given.
pub async fn post_comment(
    api: Option<&FigmaApiClient>,
    bridge: &Bridge,
    message: &str,
    node_id: Option<&str>,
    reply_to: Option<&str>,
) -> Result<CommentPosted> {
    let (api, key) = file_key(api, bridge)?;

    let target = match (node_id, reply_to) {
        (Some(node_id), None) => CommentTarget::Node(node_id.to_string()),
        (None, Some(reply_to)) => CommentTarget::Reply(reply_to.to_string()),
        (None, None) => {
            return Err(BridgeError::invalid_params(
                "Either node_id (to pin comment to a node) or reply_to (to reply to an existing comment) must be provided.",
            ))
        }
        (Some(_), Some(_)) => {
            return Err(BridgeError::invalid_params(
                "Provide either node_id or reply_to, not both. Use node_id for new comments pinned to a node, or reply_to for replying to an existing thread.",
            ))
        }
    };

    let comment = api.post_comment(&key, message, &target).await?;
    Ok(CommentPosted {
        success: true,
        comment,
    })
}
