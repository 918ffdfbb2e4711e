//! Message nodes and the ordered message list.

use serde::{Deserialize, Serialize};

/// Text of the transient node shown while a reply is pending.
pub const PLACEHOLDER_TEXT: &str = "Typing...";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the user.
    User,
    /// Returned by the chat endpoint (or the welcome text).
    Assistant,
}

impl Role {
    /// Role for the `isUser` flag.
    pub fn from_is_user(is_user: bool) -> Self {
        if is_user { Self::User } else { Self::Assistant }
    }

    /// CSS class used for the message bubble.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One chat bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Bubble text, rendered as plain text.
    pub content: String,
    /// Author.
    pub role: Role,
}

impl Message {
    /// Create a message.
    pub fn new(content: impl Into<String>, role: Role) -> Self {
        Self {
            content: content.into(),
            role,
        }
    }

    /// Whether the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Identity of a node within one widget, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a node in the message list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A real message.
    Message(Message),
    /// The "Typing..." indicator of a pending send.
    Placeholder,
}

/// A child of the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    /// Node identity.
    pub id: NodeId,
    /// Node content.
    pub kind: NodeKind,
}

impl MessageNode {
    /// The message, unless this is a placeholder.
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            NodeKind::Message(m) => Some(m),
            NodeKind::Placeholder => None,
        }
    }

    /// Whether this is a pending-reply indicator.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, NodeKind::Placeholder)
    }

    /// Role the node is rendered with. Placeholders render as assistant bubbles.
    pub fn role(&self) -> Role {
        self.message().map_or(Role::Assistant, |m| m.role)
    }

    /// Text the node displays.
    pub fn text(&self) -> &str {
        self.message().map_or(PLACEHOLDER_TEXT, |m| m.content.as_str())
    }
}

/// Ordered children of the `chat-messages` container.
#[derive(Debug, Default)]
pub struct MessageList {
    nodes: Vec<MessageNode>,
    next_id: u64,
}

impl MessageList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a message as the last child.
    pub fn push_message(&mut self, message: Message) -> NodeId {
        let id = self.allocate();
        self.nodes.push(MessageNode {
            id,
            kind: NodeKind::Message(message),
        });
        id
    }

    /// Append a placeholder as the last child.
    pub fn push_placeholder(&mut self) -> NodeId {
        let id = self.allocate();
        self.nodes.push(MessageNode {
            id,
            kind: NodeKind::Placeholder,
        });
        id
    }

    /// Remove a node by id. Returns false when it is already gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        self.nodes.len() != before
    }

    /// Drop every node. Ids keep increasing across clears.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// All nodes in render order.
    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    /// Messages only, skipping placeholders.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.nodes.iter().filter_map(MessageNode::message)
    }

    /// Last child, if any.
    pub fn last(&self) -> Option<&MessageNode> {
        self.nodes.last()
    }

    /// Number of placeholders currently shown.
    pub fn pending(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_placeholder()).count()
    }

    /// Number of nodes, placeholders included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the list has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
