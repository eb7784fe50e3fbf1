//! Core types for the connection engine.
//!
//! Nodes are owned by the host. The engine only sees their ids and the
//! connector layout implied by their [`NodeKind`]; connections are stored as
//! value-typed `{from, to}` keys so node ids may contain any characters.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

// ============================================================================
// Node Types
// ============================================================================

/// Stable identifier of a node, as supplied by the host.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Connector layout of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// One input, one output
    #[default]
    Plain,
    /// One input, two tagged outputs (`true` / `false`)
    Branching,
    /// One input, one output, plus an uncapped `bottom` output
    FanOutBottom,
}

impl NodeKind {
    /// Whether a node of this kind exposes the given connector role.
    pub fn has_connector(self, side: Side, branch: Option<Branch>) -> bool {
        match (side, branch) {
            (Side::Input, None) => true,
            (Side::Input, Some(_)) => false,
            (Side::Output, None) => matches!(self, NodeKind::Plain | NodeKind::FanOutBottom),
            (Side::Output, Some(Branch::True | Branch::False)) => self == NodeKind::Branching,
            (Side::Output, Some(Branch::Bottom)) => self == NodeKind::FanOutBottom,
        }
    }

    /// Every connector role of this kind, input first.
    pub fn connector_roles(self) -> &'static [(Side, Option<Branch>)] {
        match self {
            NodeKind::Plain => &[(Side::Input, None), (Side::Output, None)],
            NodeKind::Branching => &[
                (Side::Input, None),
                (Side::Output, Some(Branch::True)),
                (Side::Output, Some(Branch::False)),
            ],
            NodeKind::FanOutBottom => &[
                (Side::Input, None),
                (Side::Output, None),
                (Side::Output, Some(Branch::Bottom)),
            ],
        }
    }

    /// Connectors of the node `id`, in [`connector_roles`](Self::connector_roles) order.
    pub fn connectors(self, id: &NodeId) -> Vec<Connector> {
        self.connector_roles()
            .iter()
            .map(|&(side, branch)| Connector {
                node: id.clone(),
                side,
                branch,
            })
            .collect()
    }
}

// ============================================================================
// Connector Types
// ============================================================================

/// Which side of a node a connector sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Input,
    Output,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Input => Side::Output,
            Side::Output => Side::Input,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Input => f.write_str("input"),
            Side::Output => f.write_str("output"),
        }
    }
}

/// Tag of a sub-output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    True,
    False,
    Bottom,
}

impl Branch {
    /// Parse a branch tag from its persisted spelling.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Branch::True),
            "false" => Some(Branch::False),
            "bottom" => Some(Branch::Bottom),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Branch::True => "true",
            Branch::False => "false",
            Branch::Bottom => "bottom",
        }
    }

    /// Bottom outputs fan out and are excluded from the single-output cap.
    pub fn is_capped(self) -> bool {
        !matches!(self, Branch::Bottom)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connector role on a node: `(node, side, branch)`.
///
/// The branch is carried from the moment the connector is resolved and never
/// re-derived from presentation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Connector {
    pub node: NodeId,
    pub side: Side,
    pub branch: Option<Branch>,
}

impl Connector {
    pub fn input(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            side: Side::Input,
            branch: None,
        }
    }

    pub fn output(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            side: Side::Output,
            branch: None,
        }
    }

    pub fn branch(node: impl Into<NodeId>, branch: Branch) -> Self {
        Self {
            node: node.into(),
            side: Side::Output,
            branch: Some(branch),
        }
    }

    pub fn is_input(&self) -> bool {
        self.side == Side::Input
    }

    pub fn is_output(&self) -> bool {
        self.side == Side::Output
    }

    /// Opposite side and a different node.
    pub fn is_compatible_with(&self, other: &Connector) -> bool {
        self.side != other.side && self.node != other.node
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.branch {
            Some(branch) => write!(f, "{}:{}[{}]", self.node, self.side, branch),
            None => write!(f, "{}:{}", self.node, self.side),
        }
    }
}

// ============================================================================
// Connection Types
// ============================================================================

/// Key of a stored connection.
///
/// An input accepts a single connection, so `(from, to)` is unique across the
/// store even for branching sources.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId {
    pub from: NodeId,
    pub to: NodeId,
}

impl ConnectionId {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Legacy `"{from}-{to}"` spelling, for display and logs only.
impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// A directed `output -> input` link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub branch: Option<Branch>,
}

impl Connection {
    pub fn new(from: NodeId, to: NodeId, branch: Option<Branch>) -> Self {
        Self {
            id: ConnectionId { from, to },
            branch,
        }
    }

    pub fn from(&self) -> &NodeId {
        &self.id.from
    }

    pub fn to(&self) -> &NodeId {
        &self.id.to
    }

    /// The output connector this connection leaves from.
    pub fn source(&self) -> Connector {
        Connector {
            node: self.id.from.clone(),
            side: Side::Output,
            branch: self.branch,
        }
    }

    /// The input connector this connection arrives at.
    pub fn target(&self) -> Connector {
        Connector::input(self.id.to.clone())
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.id.from == node || &self.id.to == node
    }

    pub fn to_record(&self) -> ConnectionRecord {
        ConnectionRecord {
            id: None,
            from: self.id.from.clone(),
            to: self.id.to.clone(),
            branch: self.branch,
        }
    }
}

/// Persisted `{from, to, branch?}` shape exchanged with the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Externally supplied id; accepted on load and never written back.
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    pub from: NodeId,
    pub to: NodeId,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_branch_field"
    )]
    pub branch: Option<Branch>,
}

impl ConnectionRecord {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, branch: Option<Branch>) -> Self {
        Self {
            id: None,
            from: from.into(),
            to: to.into(),
            branch,
        }
    }
}

/// Accepts a tag string, a bool, an array holding a tag, or a pre-stringified array.
fn deserialize_branch_field<'de, D>(deserializer: D) -> Result<Option<Branch>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    branch_from_value(&value).map_err(de::Error::custom)
}

fn branch_from_value(value: &Value) -> Result<Option<Branch>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(true) => Ok(Some(Branch::True)),
        Value::Bool(false) => Ok(Some(Branch::False)),
        Value::Array(items) => match items.first() {
            Some(first) => branch_from_value(first),
            None => Ok(None),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.starts_with('[') {
                let inner: Value = serde_json::from_str(trimmed)
                    .map_err(|e| format!("invalid stringified branch {trimmed:?}: {e}"))?;
                return branch_from_value(&inner);
            }
            Branch::parse(trimmed)
                .map(Some)
                .ok_or_else(|| format!("unknown branch tag {trimmed:?}"))
        }
        other => Err(format!("unsupported branch value {other}")),
    }
}
