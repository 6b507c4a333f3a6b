//! Assembles a flat list of comments into a nested reply tree.
//!
//! The input is expected pre-sorted ascending by creation time; both the
//! root sequence and every `replies` list preserve that relative order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Comment;

/// A comment together with its (possibly empty) replies, recursively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Build the reply forest for one subject.
///
/// Every comment appears exactly once in the output.  A comment whose
/// `parent_id` does not match any id in the input (the parent was deleted,
/// or lives on another subject) is surfaced as a root rather than dropped,
/// so nothing ever disappears from view.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let present: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();

    let mut roots: Vec<&Comment> = Vec::new();
    let mut children: HashMap<Uuid, Vec<&Comment>> = HashMap::new();

    for comment in comments {
        match comment.parent_id {
            // A comment can never legitimately name itself as parent.
            Some(parent) if parent != comment.id && present.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|c| attach(c, &children))
        .collect()
}

fn attach(comment: &Comment, children: &HashMap<Uuid, Vec<&Comment>>) -> CommentNode {
    let replies = children
        .get(&comment.id)
        .map(|kids| kids.iter().map(|k| attach(k, children)).collect())
        .unwrap_or_default();

    CommentNode {
        comment: comment.clone(),
        replies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn comment(n: i64, parent: Option<Uuid>) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            subject_id: Uuid::nil(),
            parent_id: parent,
            author_id: format!("user-{n}"),
            body: format!("comment {n}"),
            created_at: Utc::now() + Duration::milliseconds(n),
        }
    }

    fn count(nodes: &[CommentNode]) -> usize {
        nodes.iter().map(|n| 1 + count(&n.replies)).sum()
    }

    fn flatten<'a>(nodes: &'a [CommentNode], out: &mut Vec<&'a CommentNode>) {
        for node in nodes {
            out.push(node);
            flatten(&node.replies, out);
        }
    }

    #[test]
    fn empty_input_yields_empty_forest() {
        assert!(build_comment_tree(&[]).is_empty());
    }

    #[test]
    fn children_nest_under_their_parent() {
        let root = comment(0, None);
        let reply = comment(1, Some(root.id));
        let nested = comment(2, Some(reply.id));

        let tree = build_comment_tree(&[root.clone(), reply.clone(), nested.clone()]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, root.id);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].comment.id, reply.id);
        assert_eq!(tree[0].replies[0].replies[0].comment.id, nested.id);
    }

    #[test]
    fn every_comment_appears_exactly_once() {
        let a = comment(0, None);
        let b = comment(1, Some(a.id));
        let c = comment(2, Some(a.id));
        let d = comment(3, Some(c.id));
        let e = comment(4, None);

        let input = vec![a, b, c, d, e];
        let tree = build_comment_tree(&input);

        assert_eq!(count(&tree), input.len());
    }

    #[test]
    fn order_is_preserved_at_every_level() {
        let root_a = comment(0, None);
        let root_b = comment(1, None);
        let reply_1 = comment(2, Some(root_a.id));
        let reply_2 = comment(3, Some(root_a.id));
        let reply_3 = comment(4, Some(root_a.id));

        let input = vec![
            root_a.clone(),
            root_b.clone(),
            reply_1.clone(),
            reply_2.clone(),
            reply_3.clone(),
        ];
        let tree = build_comment_tree(&input);

        // Roots in creation order.
        assert_eq!(tree[0].comment.id, root_a.id);
        assert_eq!(tree[1].comment.id, root_b.id);

        // Replies in creation order.
        let reply_ids: Vec<Uuid> = tree[0].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(reply_ids, vec![reply_1.id, reply_2.id, reply_3.id]);

        // A pre-order walk lists everything in a creation-consistent order.
        let mut flat = Vec::new();
        flatten(&tree, &mut flat);
        for pair in flat.windows(2) {
            if pair[0].comment.parent_id == pair[1].comment.parent_id {
                assert!(pair[0].comment.created_at <= pair[1].comment.created_at);
            }
        }
    }

    #[test]
    fn dangling_parent_becomes_root() {
        let orphan = comment(0, Some(Uuid::new_v4()));
        let normal = comment(1, None);

        let tree = build_comment_tree(&[orphan.clone(), normal.clone()]);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, orphan.id);
        assert_eq!(tree[1].comment.id, normal.id);
    }

    #[test]
    fn nodes_serialize_flat_with_nested_replies() {
        let root = comment(0, None);
        let reply = comment(1, Some(root.id));

        let tree = build_comment_tree(&[root.clone(), reply.clone()]);
        let json = serde_json::to_value(&tree).unwrap();

        // The comment fields are flattened into the node object.
        assert_eq!(json[0]["id"], root.id.to_string());
        assert_eq!(json[0]["body"], "comment 0");
        assert_eq!(json[0]["replies"][0]["id"], reply.id.to_string());
        assert_eq!(json[0]["replies"][0]["parentId"], root.id.to_string());
        assert_eq!(json[0]["replies"][0]["replies"], serde_json::json!([]));
    }

    #[test]
    fn self_referential_parent_becomes_root() {
        let mut c = comment(0, None);
        c.parent_id = Some(c.id);

        let tree = build_comment_tree(&[c.clone()]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, c.id);
        assert!(tree[0].replies.is_empty());
    }
}
