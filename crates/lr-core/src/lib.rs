#![forbid(unsafe_code)]

pub mod types;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::str::FromStr;

/// A concrete runtime value: an integer or a homogeneous integer list.
///
/// Serializes untagged so the wire shape is a bare number or a bare array,
/// matching the framed JSON protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    List(Vec<i64>),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::List(_) => "int-list",
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[i64]> {
        match self {
            Self::Int(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(items: Vec<i64>) -> Self {
        Self::List(items)
    }
}

/// One edge of the routine DAG: a numeric constant, or a back-reference to
/// the overall input (`Dyn(0)`) or an earlier node's output (`Dyn(j)`, j ≥ 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wire {
    Static(i64),
    Dyn(usize),
}

/// A single subroutine invocation. `wires[0]` feeds the subroutine input;
/// the remaining wires bind its parameters in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub wires: SmallVec<[Wire; 3]>,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<String>, wires: impl IntoIterator<Item = Wire>) -> Self {
        Self {
            name: name.into(),
            wires: wires.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn input_wire(&self) -> Option<Wire> {
        self.wires.first().copied()
    }

    /// Parameter wires, i.e. everything after the input wire.
    #[must_use]
    pub fn param_wires(&self) -> &[Wire] {
        self.wires.get(1..).unwrap_or(&[])
    }
}

/// A routine: a topologically ordered pipeline of nodes. Node `i` (1-based)
/// may only reference indices `0..i`, so no cycle check is ever needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub nodes: Vec<Node>,
}

impl Routine {
    #[must_use]
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn first_node(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Structural well-formedness: nonempty, every node carries an input
    /// wire, back-references stay behind the referencing node, and every
    /// producible index short of the terminal output is consumed (the
    /// overall input, index 0, included).
    pub fn validate_well_formed(&self) -> Result<(), RoutineValidationError> {
        if self.nodes.is_empty() {
            return Err(RoutineValidationError::Empty);
        }

        let mut consumed = BTreeSet::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.wires.is_empty() {
                return Err(RoutineValidationError::MissingInput { node: idx + 1 });
            }
            for wire in &node.wires {
                if let Wire::Dyn(target) = wire {
                    if *target > idx {
                        return Err(RoutineValidationError::ForwardReference {
                            node: idx + 1,
                            target: *target,
                        });
                    }
                    consumed.insert(*target);
                }
            }
        }

        for index in 0..self.nodes.len() {
            if !consumed.contains(&index) {
                return Err(RoutineValidationError::Unconsumed { index });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineValidationError {
    Empty,
    MissingInput { node: usize },
    ForwardReference { node: usize, target: usize },
    Unconsumed { index: usize },
}

impl std::fmt::Display for RoutineValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "routine has no nodes"),
            Self::MissingInput { node } => {
                write!(f, "node {} has no input wire", node)
            }
            Self::ForwardReference { node, target } => {
                write!(
                    f,
                    "node {} references index {} ahead of itself",
                    node, target
                )
            }
            Self::Unconsumed { index } => {
                if *index == 0 {
                    write!(f, "overall input is never consumed")
                } else {
                    write!(f, "output of node {} is never consumed", index)
                }
            }
        }
    }
}

impl std::error::Error for RoutineValidationError {}

// ── Textual notation ───────────────────────────────────────────────
//
// The canonical routine notation is a flat sequence of node forms:
//
//     (index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))
//
// `Display` and `FromStr` round-trip through it; the dispatcher carries
// routines as strings in exactly this shape.

impl std::fmt::Display for Routine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if idx > 0 {
                out.push(' ');
            }
            let _ = write!(out, "({}", node.name);
            for wire in &node.wires {
                match wire {
                    Wire::Static(value) => {
                        let _ = write!(out, " (static {})", value);
                    }
                    Wire::Dyn(target) => {
                        let _ = write!(out, " (dyn {})", target);
                    }
                }
            }
            out.push(')');
        }
        f.write_str(&out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineParseError {
    Empty,
    Unbalanced,
    Expected { what: &'static str, found: String },
    BadNumber { text: String },
}

impl std::fmt::Display for RoutineParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty routine text"),
            Self::Unbalanced => write!(f, "unbalanced parentheses"),
            Self::Expected { what, found } => {
                write!(f, "expected {}, found `{}`", what, found)
            }
            Self::BadNumber { text } => write!(f, "`{}` is not an integer", text),
        }
    }
}

impl std::error::Error for RoutineParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut atom = String::new();
    for ch in text.chars() {
        match ch {
            '(' | ')' => {
                if !atom.is_empty() {
                    tokens.push(Token::Atom(std::mem::take(&mut atom)));
                }
                tokens.push(if ch == '(' { Token::Open } else { Token::Close });
            }
            ch if ch.is_whitespace() => {
                if !atom.is_empty() {
                    tokens.push(Token::Atom(std::mem::take(&mut atom)));
                }
            }
            ch => atom.push(ch),
        }
    }
    if !atom.is_empty() {
        tokens.push(Token::Atom(atom));
    }
    tokens
}

impl FromStr for Routine {
    type Err = RoutineParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(RoutineParseError::Empty);
        }

        let mut cursor = tokens.into_iter().peekable();
        let mut nodes = Vec::new();
        while cursor.peek().is_some() {
            nodes.push(parse_node(&mut cursor)?);
        }
        Ok(Self { nodes })
    }
}

fn parse_node(
    cursor: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
) -> Result<Node, RoutineParseError> {
    expect_open(cursor)?;
    let name = expect_atom(cursor, "subroutine name")?;
    let mut wires = SmallVec::new();
    loop {
        match cursor.peek() {
            Some(Token::Close) => {
                cursor.next();
                return Ok(Node { name, wires });
            }
            Some(Token::Open) => wires.push(parse_wire(cursor)?),
            Some(Token::Atom(found)) => {
                return Err(RoutineParseError::Expected {
                    what: "a wire form or `)`",
                    found: found.clone(),
                });
            }
            None => return Err(RoutineParseError::Unbalanced),
        }
    }
}

fn parse_wire(
    cursor: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
) -> Result<Wire, RoutineParseError> {
    expect_open(cursor)?;
    let kind = expect_atom(cursor, "`dyn` or `static`")?;
    let argument = expect_atom(cursor, "a wire argument")?;
    let wire = match kind.as_str() {
        "dyn" => Wire::Dyn(argument.parse().map_err(|_| RoutineParseError::BadNumber {
            text: argument.clone(),
        })?),
        "static" => Wire::Static(argument.parse().map_err(|_| {
            RoutineParseError::BadNumber {
                text: argument.clone(),
            }
        })?),
        _ => {
            return Err(RoutineParseError::Expected {
                what: "`dyn` or `static`",
                found: kind,
            });
        }
    };
    match cursor.next() {
        Some(Token::Close) => Ok(wire),
        Some(Token::Open) => Err(RoutineParseError::Expected {
            what: "`)`",
            found: "(".to_owned(),
        }),
        Some(Token::Atom(found)) => Err(RoutineParseError::Expected {
            what: "`)`",
            found,
        }),
        None => Err(RoutineParseError::Unbalanced),
    }
}

fn expect_open(
    cursor: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
) -> Result<(), RoutineParseError> {
    match cursor.next() {
        Some(Token::Open) => Ok(()),
        Some(Token::Close) => Err(RoutineParseError::Expected {
            what: "`(`",
            found: ")".to_owned(),
        }),
        Some(Token::Atom(found)) => Err(RoutineParseError::Expected {
            what: "`(`",
            found,
        }),
        None => Err(RoutineParseError::Unbalanced),
    }
}

fn expect_atom(
    cursor: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    what: &'static str,
) -> Result<String, RoutineParseError> {
    match cursor.next() {
        Some(Token::Atom(atom)) => Ok(atom),
        Some(Token::Open) => Err(RoutineParseError::Expected {
            what,
            found: "(".to_owned(),
        }),
        Some(Token::Close) => Err(RoutineParseError::Expected {
            what,
            found: ")".to_owned(),
        }),
        None => Err(RoutineParseError::Unbalanced),
    }
}
