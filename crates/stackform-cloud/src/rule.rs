//! Security group rule specifications
//!
//! Rules are compared structurally on all four fields of a direction's
//! tuple (protocol, port range, cidr). There is no remote rule identity to
//! diff against; structural equality is the identity.

use serde::{Deserialize, Serialize};

/// Sentinel CIDR meaning "the operator's current network address".
///
/// Rule lists in the declarative input may carry this marker instead of a
/// literal CIDR (e.g. an SSH ingress rule scoped to whoever runs the
/// deployment). It is substituted exactly once, before reconciliation,
/// never inside the diff.
pub const OPERATOR_CIDR: &str = "operator";

/// Traffic direction of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Ingress,
    Egress,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Ingress => write!(f, "ingress"),
            Direction::Egress => write!(f, "egress"),
        }
    }
}

/// One security group rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Protocol name ("tcp", "udp", "icmp", "all")
    pub protocol: String,

    /// Start of the port range
    pub from_port: u16,

    /// End of the port range (inclusive)
    pub to_port: u16,

    /// Source (ingress) or destination (egress) CIDR block
    pub cidr: String,

    pub direction: Direction,
}

impl RuleSpec {
    pub fn ingress(
        protocol: impl Into<String>,
        from_port: u16,
        to_port: u16,
        cidr: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            from_port,
            to_port,
            cidr: cidr.into(),
            direction: Direction::Ingress,
        }
    }

    pub fn egress(
        protocol: impl Into<String>,
        from_port: u16,
        to_port: u16,
        cidr: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            from_port,
            to_port,
            cidr: cidr.into(),
            direction: Direction::Egress,
        }
    }

    /// Whether the rule's CIDR is the operator placeholder.
    pub fn wants_operator_cidr(&self) -> bool {
        self.cidr == OPERATOR_CIDR
    }
}

impl std::fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}-{} {}",
            self.direction, self.protocol, self.from_port, self.to_port, self.cidr
        )
    }
}
