//! Figma comment payloads and thread assembly.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Comment as returned by `GET /v1/files/{key}/comments`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub client_meta: Option<Value>,
    #[serde(default)]
    pub order_id: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommentsPage {
    #[serde(default)]
    pub comments: Vec<RawComment>,
}

impl RawComment {
    fn author(&self) -> String {
        self.user
            .as_ref()
            .and_then(|u| u.handle.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|p| !p.is_empty())
    }

    fn node_id(&self) -> Option<String> {
        self.client_meta
            .as_ref()
            .and_then(|meta| meta.get("node_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Top-level comment with its replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    pub id: String,
    pub message: String,
    pub author: String,
    pub created_at: Option<String>,
    pub resolved: bool,
    pub node_id: Option<String>,
    pub order_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<CommentReply>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentReply {
    pub id: String,
    pub message: String,
    pub author: String,
    pub created_at: Option<String>,
}

/// Which threads to return.
#[derive(Debug, Clone)]
pub struct CommentFilter {
    pub node_id: Option<String>,
    pub unresolved_only: bool,
    pub include_replies: bool,
}

impl Default for CommentFilter {
    fn default() -> Self {
        Self {
            node_id: None,
            unresolved_only: false,
            include_replies: true,
        }
    }
}

/// Group replies under their parents, then apply the filter.
///
/// Threads keep the API's order. Replies whose parent is missing are dropped.
pub fn assemble_threads(raw: Vec<RawComment>, filter: &CommentFilter) -> Vec<CommentThread> {
    let mut replies: HashMap<String, Vec<CommentReply>> = HashMap::new();
    let mut threads = Vec::new();

    for comment in raw {
        match comment.parent().map(str::to_string) {
            Some(parent) => {
                replies
                    .entry(parent)
                    .or_default()
                    .push(CommentReply {
                        author: comment.author(),
                        id: comment.id,
                        message: comment.message,
                        created_at: comment.created_at,
                    });
            }
            None => threads.push(CommentThread {
                author: comment.author(),
                node_id: comment.node_id(),
                resolved: comment.resolved_at.is_some(),
                order_id: comment.order_id.filter(|o| !o.is_null()),
                id: comment.id,
                message: comment.message,
                created_at: comment.created_at,
                node_name: None,
                replies: Some(Vec::new()),
            }),
        }
    }

    threads
        .into_iter()
        .filter(|t| !(filter.unresolved_only && t.resolved))
        .filter(|t| match &filter.node_id {
            Some(node_id) => t.node_id.as_deref() == Some(node_id.as_str()),
            None => true,
        })
        .map(|mut t| {
            t.replies = if filter.include_replies {
                Some(replies.remove(&t.id).unwrap_or_default())
            } else {
                None
            };
            t
        })
        .collect()
}

/// Distinct node ids the threads are pinned to, in first-seen order.
pub fn pinned_node_ids(threads: &[CommentThread]) -> Vec<String> {
    let mut seen = HashSet::new();
    threads
        .iter()
        .filter_map(|t| t.node_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Fill `node_name` from a `get_nodes` reply (`{"nodes":[{"id","name"}]}`).
pub fn attach_node_names(threads: &mut [CommentThread], nodes_reply: &Value) {
    let names: HashMap<&str, &str> = nodes_reply
        .get("nodes")
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(|n| Some((n.get("id")?.as_str()?, n.get("name")?.as_str()?)))
                .collect()
        })
        .unwrap_or_default();

    for thread in threads.iter_mut() {
        if let Some(name) = thread.node_id.as_deref().and_then(|id| names.get(id)) {
            thread.node_name = Some((*name).to_string());
        }
    }
}

/// Where a new comment goes.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentTarget {
    /// New thread pinned to a node.
    Node(String),
    /// Reply to an existing thread.
    Reply(String),
}

#[derive(Debug, Serialize)]
pub(crate) struct PostCommentBody<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_meta: Option<Value>,
}

impl<'a> PostCommentBody<'a> {
    pub fn new(message: &'a str, target: &'a CommentTarget) -> Self {
        match target {
            CommentTarget::Reply(comment_id) => Self {
                message,
                comment_id: Some(comment_id),
                client_meta: None,
            },
            CommentTarget::Node(node_id) => Self {
                message,
                comment_id: None,
                client_meta: Some(serde_json::json!({
                    "node_id": node_id,
                    "node_offset": {"x": 0, "y": 0}
                })),
            },
        }
    }
}

/// Comment echoed back by `POST /v1/files/{key}/comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostedComment {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<RawComment> {
        serde_json::from_value(json!([
            {
                "id": "1", "message": "Fix padding", "parent_id": "",
                "user": {"handle": "ana"}, "created_at": "2024-01-01T00:00:00Z",
                "client_meta": {"node_id": "10:1", "node_offset": {"x": 4, "y": 2}},
                "order_id": "1"
            },
            {
                "id": "2", "message": "Done", "parent_id": "1",
                "user": {"handle": "ben"}, "created_at": "2024-01-02T00:00:00Z"
            },
            {
                "id": "3", "message": "Old note", "resolved_at": "2024-01-03T00:00:00Z",
                "client_meta": {"x": 10, "y": 20}
            },
            {
                "id": "4", "message": "Also here",
                "user": {"handle": "cy"},
                "client_meta": {"node_id": "10:1"}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_replies_grouped_under_parent() {
        let threads = assemble_threads(sample(), &CommentFilter::default());
        assert_eq!(threads.len(), 3);

        let first = &threads[0];
        assert_eq!(first.author, "ana");
        assert_eq!(first.node_id.as_deref(), Some("10:1"));
        assert_eq!(first.order_id, Some(json!("1")));
        let replies = first.replies.as_ref().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].author, "ben");

        assert_eq!(threads[1].author, "Unknown");
        assert!(threads[1].resolved);
        assert!(threads[1].node_id.is_none());
        assert_eq!(threads[1].replies, Some(vec![]));
    }

    #[test]
    fn test_filters() {
        let filter = CommentFilter {
            node_id: Some("10:1".into()),
            unresolved_only: true,
            include_replies: false,
        };
        let threads = assemble_threads(sample(), &filter);
        let ids: Vec<_> = threads.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert!(threads.iter().all(|t| t.replies.is_none()));

        let value = serde_json::to_value(&threads[0]).unwrap();
        assert!(value.get("replies").is_none());
        assert!(value.get("node_name").is_none());
    }

    #[test]
    fn test_node_name_enrichment() {
        let mut threads = assemble_threads(sample(), &CommentFilter::default());
        assert_eq!(pinned_node_ids(&threads), vec!["10:1".to_string()]);

        attach_node_names(
            &mut threads,
            &json!({"nodes": [{"id": "10:1", "name": "Card"}, {"id": "x"}]}),
        );
        assert_eq!(threads[0].node_name.as_deref(), Some("Card"));
        assert_eq!(threads[2].node_name.as_deref(), Some("Card"));
        assert!(threads[1].node_name.is_none());
    }

    #[test]
    fn test_post_body_shapes() {
        let pinned = CommentTarget::Node("1:2".into());
        assert_eq!(
            serde_json::to_value(PostCommentBody::new("hi", &pinned)).unwrap(),
            json!({"message": "hi", "client_meta": {"node_id": "1:2", "node_offset": {"x": 0, "y": 0}}})
        );

        let reply = CommentTarget::Reply("99".into());
        assert_eq!(
            serde_json::to_value(PostCommentBody::new("ok", &reply)).unwrap(),
            json!({"message": "ok", "comment_id": "99"})
        );
    }
}
