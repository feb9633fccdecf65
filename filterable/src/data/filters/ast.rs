//! Filter expression AST
//!
//! A parsed filter is a tree of [`RuleNode`]s: leaves compare one field with
//! an operand, groups combine children with AND/OR. Trees are immutable once
//! parsed and render back to canonical expression syntax via `Display`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Boolean combinator of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// Keyword used in expression syntax and SQL
    pub fn keyword(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Comparison operator of a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorKind {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Between,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    IsNotNull,
}

/// Shape of the operand an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    None,
    Single,
    List,
    Range,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 14] = [
        OperatorKind::Eq,
        OperatorKind::Neq,
        OperatorKind::Lt,
        OperatorKind::Lte,
        OperatorKind::Gt,
        OperatorKind::Gte,
        OperatorKind::Between,
        OperatorKind::In,
        OperatorKind::NotIn,
        OperatorKind::Contains,
        OperatorKind::StartsWith,
        OperatorKind::EndsWith,
        OperatorKind::IsNull,
        OperatorKind::IsNotNull,
    ];

    /// Canonical (camelCase) operator name, as used in JSON payloads
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Eq => "eq",
            OperatorKind::Neq => "neq",
            OperatorKind::Lt => "lt",
            OperatorKind::Lte => "lte",
            OperatorKind::Gt => "gt",
            OperatorKind::Gte => "gte",
            OperatorKind::Between => "between",
            OperatorKind::In => "in",
            OperatorKind::NotIn => "notIn",
            OperatorKind::Contains => "contains",
            OperatorKind::StartsWith => "startsWith",
            OperatorKind::EndsWith => "endsWith",
            OperatorKind::IsNull => "isNull",
            OperatorKind::IsNotNull => "isNotNull",
        }
    }

    /// Look up an operator by its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Operator as written in expression syntax
    pub fn syntax(&self) -> &'static str {
        match self {
            OperatorKind::Eq => "=",
            OperatorKind::Neq => "!=",
            OperatorKind::Lt => "<",
            OperatorKind::Lte => "<=",
            OperatorKind::Gt => ">",
            OperatorKind::Gte => ">=",
            OperatorKind::Between => "BETWEEN",
            OperatorKind::In => "IN",
            OperatorKind::NotIn => "NOT IN",
            OperatorKind::Contains => "CONTAINS",
            OperatorKind::StartsWith => "STARTS WITH",
            OperatorKind::EndsWith => "ENDS WITH",
            OperatorKind::IsNull => "IS NULL",
            OperatorKind::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn operand_shape(&self) -> OperandShape {
        match self {
            OperatorKind::IsNull | OperatorKind::IsNotNull => OperandShape::None,
            OperatorKind::In | OperatorKind::NotIn => OperandShape::List,
            OperatorKind::Between => OperandShape::Range,
            _ => OperandShape::Single,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal value in a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Value {
    /// Human-readable kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Single(Value),
    List(Vec<Value>),
    Range(Value, Value),
}

impl Operand {
    pub fn shape(&self) -> OperandShape {
        match self {
            Operand::None => OperandShape::None,
            Operand::Single(_) => OperandShape::Single,
            Operand::List(_) => OperandShape::List,
            Operand::Range(..) => OperandShape::Range,
        }
    }

    /// All literal values carried by the operand, in order
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Operand::None => Vec::new(),
            Operand::Single(v) => vec![v],
            Operand::List(values) => values.iter().collect(),
            Operand::Range(low, high) => vec![low, high],
        }
    }
}

/// Single field/operator/operand comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub field: String,
    pub operator: OperatorKind,
    pub operand: Operand,
}

impl Leaf {
    pub fn new(field: impl Into<String>, operator: OperatorKind, operand: Operand) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.operator.syntax())?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Single(v) => write!(f, " {}", v),
            Operand::List(values) => {
                f.write_str(" [")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Operand::Range(low, high) => write!(f, " {} AND {}", low, high),
        }
    }
}

/// Boolean combination of child rules
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub combinator: Combinator,
    pub children: Vec<RuleNode>,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.children.as_slice() {
            return write!(f, "{}", only);
        }
        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.combinator)?;
            }
            match child {
                RuleNode::Group(_) => write!(f, "({})", child)?,
                RuleNode::Leaf(_) => write!(f, "{}", child)?,
            }
        }
        Ok(())
    }
}

/// Node of a parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    Leaf(Leaf),
    Group(Group),
}

impl RuleNode {
    pub fn leaf(field: impl Into<String>, operator: OperatorKind, operand: Operand) -> Self {
        RuleNode::Leaf(Leaf::new(field, operator, operand))
    }

    pub fn group(combinator: Combinator, children: Vec<RuleNode>) -> Self {
        RuleNode::Group(Group {
            combinator,
            children,
        })
    }

    /// Maximum group nesting below this node (a bare leaf has depth 0)
    pub fn depth(&self) -> usize {
        match self {
            RuleNode::Leaf(_) => 0,
            RuleNode::Group(group) => {
                1 + group.children.iter().map(RuleNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            RuleNode::Leaf(_) => 1,
            RuleNode::Group(group) => group.children.iter().map(RuleNode::leaf_count).sum(),
        }
    }

    /// Leaves in document order
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            RuleNode::Leaf(leaf) => out.push(leaf),
            RuleNode::Group(group) => {
                for child in &group.children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Structured (JSON) form, accepted back by `parse_json`
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            RuleNode::Leaf(leaf) => {
                let mut obj = serde_json::Map::new();
                obj.insert("field".into(), leaf.field.clone().into());
                obj.insert("op".into(), leaf.operator.name().into());
                match &leaf.operand {
                    Operand::None => {}
                    Operand::Single(v) => {
                        obj.insert("value".into(), v.to_json());
                    }
                    Operand::List(values) => {
                        obj.insert(
                            "value".into(),
                            values.iter().map(Value::to_json).collect(),
                        );
                    }
                    Operand::Range(low, high) => {
                        obj.insert(
                            "value".into(),
                            serde_json::Value::Array(vec![low.to_json(), high.to_json()]),
                        );
                    }
                }
                serde_json::Value::Object(obj)
            }
            RuleNode::Group(group) => serde_json::json!({
                "combinator": group.combinator,
                "rules": group.children.iter().map(RuleNode::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

impl fmt::Display for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleNode::Leaf(leaf) => write!(f, "{}", leaf),
            RuleNode::Group(group) => write!(f, "{}", group),
        }
    }
}
