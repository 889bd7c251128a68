use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::ProtocolError;
use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// DeclaredType

/// The type a node declares in the stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DeclaredType {
    /// The node carries no type metadata.
    #[default]
    Absent,
    /// The type name was bound to a known type.
    Resolved(&'static TypeInfo),
    /// The binder could not resolve the written type name.
    Unresolved(Box<str>),
}

impl DeclaredType {
    #[inline]
    pub fn from_info(info: Option<&'static TypeInfo>) -> Self {
        match info {
            Some(info) => Self::Resolved(info),
            None => Self::Absent,
        }
    }

    /// Returns the resolved type, `None` if absent or unresolved.
    #[inline]
    pub fn resolved(&self) -> Option<&'static TypeInfo> {
        match self {
            Self::Resolved(info) => Some(info),
            _ => None,
        }
    }

    /// Returns `true` if the node carries type metadata, resolved or not.
    #[inline]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

// -----------------------------------------------------------------------------
// NodeInfo

/// An open node or array on the [`NodeStack`].
#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    /// The node name, `None` for unnamed nodes.
    pub name: Option<String>,
    /// The internal reference id, `-1` for struct nodes.
    pub id: i32,
    /// The declared type of the node.
    pub declared: DeclaredType,
    /// `true` if this entry represents an array scope.
    pub is_array: bool,
}

impl NodeInfo {
    /// The sentinel returned by [`NodeStack::current`] when the stack is empty.
    pub const EMPTY: NodeInfo = NodeInfo {
        name: None,
        id: -1,
        declared: DeclaredType::Absent,
        is_array: false,
    };

    /// Returns `true` if this is a node with no name, id or type.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

static EMPTY_NODE: NodeInfo = NodeInfo::EMPTY;

// -----------------------------------------------------------------------------
// NodeStack

/// The stack of currently open nodes and arrays.
///
/// Every encoding keeps one and mutates it on the corresponding entries.
/// Mismatched pops are structural violations and fail immediately.
#[derive(Debug, Default)]
pub struct NodeStack {
    nodes: Vec<NodeInfo>,
}

impl NodeStack {
    #[inline]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// The innermost open scope, [`NodeInfo::EMPTY`] if none is open.
    #[inline]
    pub fn current(&self) -> &NodeInfo {
        self.nodes.last().unwrap_or(&EMPTY_NODE)
    }

    /// The number of open nodes and arrays.
    #[inline]
    pub fn depth(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_in_array(&self) -> bool {
        self.current().is_array
    }

    /// Opens a node.
    pub fn push_node(&mut self, name: Option<&str>, id: i32, declared: DeclaredType) {
        self.nodes.push(NodeInfo {
            name: name.map(String::from),
            id,
            declared,
            is_array: false,
        });
    }

    /// Opens an array.
    ///
    /// The array inherits name, id and type of the enclosing node, unless
    /// there is none or the enclosing scope is itself an array.
    pub fn push_array(&mut self) {
        let node = match self.nodes.last() {
            Some(current) if !current.is_array => NodeInfo {
                is_array: true,
                ..current.clone()
            },
            _ => NodeInfo {
                is_array: true,
                ..NodeInfo::EMPTY
            },
        };
        self.nodes.push(node);
    }

    /// Closes the current node, which must be named `name`.
    pub fn pop_node(&mut self, name: Option<&str>) -> Result<NodeInfo, ProtocolError> {
        let Some(current) = self.nodes.last() else {
            return Err(ProtocolError::EmptyNodeStack);
        };
        if current.is_array {
            return Err(ProtocolError::ArrayNotClosed);
        }
        if current.name.as_deref() != name {
            return Err(ProtocolError::NodeNameMismatch {
                expected: name.map(String::from),
                actual: current.name.clone(),
            });
        }
        Ok(self.nodes.pop().unwrap_or(NodeInfo::EMPTY))
    }

    /// Closes the current array.
    pub fn pop_array(&mut self) -> Result<(), ProtocolError> {
        match self.nodes.last() {
            None => Err(ProtocolError::EmptyNodeStack),
            Some(current) if !current.is_array => Err(ProtocolError::NotInArray),
            Some(_) => {
                self.nodes.pop();
                Ok(())
            }
        }
    }

    /// Drops every open scope.
    #[inline]
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{DeclaredType, NodeInfo, NodeStack};
    use crate::error::ProtocolError;

    #[test]
    fn current_of_empty_stack_is_sentinel() {
        let stack = NodeStack::new();
        assert!(stack.current().is_empty());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn array_inherits_enclosing_node() {
        let mut stack = NodeStack::new();
        stack.push_node(Some("items"), 3, DeclaredType::Absent);
        stack.push_array();

        let current = stack.current();
        assert!(current.is_array);
        assert_eq!(current.name.as_deref(), Some("items"));
        assert_eq!(current.id, 3);

        // Nested arrays do not inherit.
        stack.push_array();
        assert_eq!(stack.current().name, None);
        assert_eq!(stack.current().id, -1);
    }

    #[test]
    fn top_level_array_is_anonymous() {
        let mut stack = NodeStack::new();
        stack.push_array();
        assert_eq!(
            *stack.current(),
            NodeInfo {
                is_array: true,
                ..NodeInfo::EMPTY
            }
        );
        assert_eq!(stack.pop_array(), Ok(()));
    }

    #[test]
    fn mismatched_pops_fail() {
        let mut stack = NodeStack::new();
        assert_eq!(stack.pop_node(None), Err(ProtocolError::EmptyNodeStack));
        assert_eq!(stack.pop_array(), Err(ProtocolError::EmptyNodeStack));

        stack.push_node(Some("a"), -1, DeclaredType::Absent);
        assert_eq!(stack.pop_array(), Err(ProtocolError::NotInArray));
        assert_eq!(
            stack.pop_node(Some("b")),
            Err(ProtocolError::NodeNameMismatch {
                expected: Some("b".into()),
                actual: Some("a".into()),
            })
        );
        assert!(stack.pop_node(Some("a")).is_ok());
        assert_eq!(stack.depth(), 0);
    }
}
