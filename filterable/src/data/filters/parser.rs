//! Filter parsing
//!
//! Turns filter expression text, or its structured JSON form, into a
//! [`RuleNode`] tree. Parsing is pure; field and operator validity against
//! entity metadata is checked later by the compiler.

use super::ast::{Combinator, Leaf, OperandShape, Operand, OperatorKind, RuleNode, Value};
use super::error::FilterError;
use super::lexer::{Token, TokenKind, tokenize};

/// Maximum size of a filter expression in bytes (64KB)
pub const MAX_EXPRESSION_BYTES: usize = 64 * 1024;

/// Maximum group nesting depth
pub const MAX_DEPTH: usize = 32;

/// Maximum number of conditions in one expression
pub const MAX_CONDITIONS: usize = 50;

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "null", "true", "false", "contains", "starts", "ends",
    "with", "startswith", "endswith", "between",
];

/// Input limits applied before and during parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_expression_bytes: usize,
    pub max_depth: usize,
    pub max_conditions: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_expression_bytes: MAX_EXPRESSION_BYTES,
            max_depth: MAX_DEPTH,
            max_conditions: MAX_CONDITIONS,
        }
    }
}

impl ParseLimits {
    fn check_size(&self, len: usize) -> Result<(), FilterError> {
        if len > self.max_expression_bytes {
            return Err(FilterError::LimitExceeded {
                limit: "expression size in bytes",
                max: self.max_expression_bytes,
            });
        }
        Ok(())
    }

    fn check_tree(&self, node: &RuleNode) -> Result<(), FilterError> {
        if node.leaf_count() > self.max_conditions {
            return Err(FilterError::LimitExceeded {
                limit: "number of conditions",
                max: self.max_conditions,
            });
        }
        Ok(())
    }

    fn check_depth(&self, depth: usize) -> Result<(), FilterError> {
        if depth > self.max_depth {
            return Err(FilterError::LimitExceeded {
                limit: "nesting depth",
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Parse filter expression text with the default limits
pub fn parse(expression: &str) -> Result<RuleNode, FilterError> {
    parse_with_limits(expression, &ParseLimits::default())
}

/// Parse filter expression text
pub fn parse_with_limits(expression: &str, limits: &ParseLimits) -> Result<RuleNode, FilterError> {
    limits.check_size(expression.len())?;

    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        index: 0,
        limits,
    };
    let node = parser.parse_or(0)?;
    let next = parser.peek();
    if next.kind != TokenKind::Eof {
        return Err(FilterError::syntax(
            next.position,
            format!(
                "expected 'AND', 'OR' or end of input but found {}",
                next.kind.describe()
            ),
        ));
    }

    limits.check_tree(&node)?;
    tracing::trace!(
        conditions = node.leaf_count(),
        depth = node.depth(),
        "Parsed filter expression"
    );
    Ok(node)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    limits: &'a ParseLimits,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), FilterError> {
        if self.eat_keyword(keyword) {
            return Ok(());
        }
        let token = self.peek();
        Err(FilterError::syntax(
            token.position,
            format!(
                "expected '{}' but found {}",
                keyword.to_uppercase(),
                token.kind.describe()
            ),
        ))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, FilterError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        Err(FilterError::syntax(
            token.position,
            format!(
                "expected {} but found {}",
                kind.describe(),
                token.kind.describe()
            ),
        ))
    }

    fn parse_or(&mut self, depth: usize) -> Result<RuleNode, FilterError> {
        let mut children = vec![self.parse_and(depth)?];
        while self.eat_keyword("or") {
            children.push(self.parse_and(depth)?);
        }
        Ok(fold(Combinator::Or, children))
    }

    fn parse_and(&mut self, depth: usize) -> Result<RuleNode, FilterError> {
        let mut children = vec![self.parse_term(depth)?];
        while self.eat_keyword("and") {
            children.push(self.parse_term(depth)?);
        }
        Ok(fold(Combinator::And, children))
    }

    fn parse_term(&mut self, depth: usize) -> Result<RuleNode, FilterError> {
        if self.peek().kind == TokenKind::LParen {
            self.advance();
            self.limits.check_depth(depth + 1)?;
            let inner = self.parse_or(depth + 1)?;
            self.expect(TokenKind::RParen)?;
            return Ok(inner);
        }
        self.parse_comparison().map(RuleNode::Leaf)
    }

    fn parse_comparison(&mut self) -> Result<Leaf, FilterError> {
        let token = self.advance();
        let field = match token.kind {
            TokenKind::Ident(name) if !is_keyword(&name) => name,
            TokenKind::Ident(name) => {
                return Err(FilterError::syntax(
                    token.position,
                    format!("expected field name but found keyword '{}'", name),
                ));
            }
            other => {
                return Err(FilterError::syntax(
                    token.position,
                    format!("expected field name but found {}", other.describe()),
                ));
            }
        };

        let op_token = self.peek().clone();
        let (operator, operand) = match &op_token.kind {
            TokenKind::Compare(op) => {
                let op = *op;
                self.advance();
                (op, Operand::Single(self.parse_value()?))
            }
            TokenKind::Ident(word) => {
                let word = word.to_ascii_lowercase();
                self.advance();
                match word.as_str() {
                    "in" => (OperatorKind::In, Operand::List(self.parse_list()?)),
                    "not" => {
                        self.expect_keyword("in")?;
                        (OperatorKind::NotIn, Operand::List(self.parse_list()?))
                    }
                    "contains" => (OperatorKind::Contains, Operand::Single(self.parse_value()?)),
                    "startswith" => {
                        (OperatorKind::StartsWith, Operand::Single(self.parse_value()?))
                    }
                    "endswith" => (OperatorKind::EndsWith, Operand::Single(self.parse_value()?)),
                    "starts" => {
                        self.expect_keyword("with")?;
                        (OperatorKind::StartsWith, Operand::Single(self.parse_value()?))
                    }
                    "ends" => {
                        self.expect_keyword("with")?;
                        (OperatorKind::EndsWith, Operand::Single(self.parse_value()?))
                    }
                    "between" => {
                        let low = self.parse_value()?;
                        self.expect_keyword("and")?;
                        let high = self.parse_value()?;
                        (OperatorKind::Between, Operand::Range(low, high))
                    }
                    "is" => {
                        let op = if self.eat_keyword("not") {
                            OperatorKind::IsNotNull
                        } else {
                            OperatorKind::IsNull
                        };
                        self.expect_keyword("null")?;
                        (op, Operand::None)
                    }
                    _ => {
                        return Err(FilterError::syntax(
                            op_token.position,
                            format!("unknown operator '{}' after field '{}'", word, field),
                        ));
                    }
                }
            }
            other => {
                return Err(FilterError::syntax(
                    op_token.position,
                    format!(
                        "expected operator after field '{}' but found {}",
                        field,
                        other.describe()
                    ),
                ));
            }
        };

        Ok(Leaf::new(field, operator, operand))
    }

    fn parse_value(&mut self) -> Result<Value, FilterError> {
        let token = self.advance();
        match token.kind {
            TokenKind::String(s) => Ok(Value::String(s)),
            TokenKind::Number(n) => Ok(Value::Number(n)),
            TokenKind::Ident(word) if word.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            TokenKind::Ident(word) if word.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            TokenKind::Ident(word) if word.eq_ignore_ascii_case("null") => Ok(Value::Null),
            other => Err(FilterError::syntax(
                token.position,
                format!("expected value but found {}", other.describe()),
            )),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Value>, FilterError> {
        self.expect(TokenKind::LBracket)?;
        let mut values = Vec::new();
        if self.peek().kind == TokenKind::RBracket {
            self.advance();
            return Ok(values);
        }
        loop {
            values.push(self.parse_value()?);
            let token = self.advance();
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RBracket => return Ok(values),
                other => {
                    return Err(FilterError::syntax(
                        token.position,
                        format!("expected ',' or ']' but found {}", other.describe()),
                    ));
                }
            }
        }
    }
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// Whether `name` lexes as a single field token: `[A-Za-z_][A-Za-z0-9_.]*`,
/// not a keyword
fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !is_keyword(name)
}

/// Collapse a one-element chain to the element itself
fn fold(combinator: Combinator, mut children: Vec<RuleNode>) -> RuleNode {
    if children.len() == 1 {
        return children.remove(0);
    }
    RuleNode::group(combinator, children)
}

/// Decode the structured (JSON) filter form with the default limits
///
/// Leaf: `{"field": "status", "op": "eq", "value": "open"}`
/// Group: `{"combinator": "and", "rules": [...]}`
pub fn parse_json(payload: &serde_json::Value) -> Result<RuleNode, FilterError> {
    parse_json_with_limits(payload, &ParseLimits::default())
}

/// Decode structured filter JSON text, applying the size limit first
pub fn parse_json_str(json_str: &str, limits: &ParseLimits) -> Result<RuleNode, FilterError> {
    limits.check_size(json_str.len())?;
    let payload: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FilterError::invalid_payload("$", e.to_string()))?;
    parse_json_with_limits(&payload, limits)
}

pub fn parse_json_with_limits(
    payload: &serde_json::Value,
    limits: &ParseLimits,
) -> Result<RuleNode, FilterError> {
    let node = decode_node(payload, "$", 0, limits)?;
    limits.check_tree(&node)?;
    Ok(node)
}

fn decode_node(
    payload: &serde_json::Value,
    path: &str,
    depth: usize,
    limits: &ParseLimits,
) -> Result<RuleNode, FilterError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| FilterError::invalid_payload(path, "expected an object"))?;

    if let Some(rules) = obj.get("rules") {
        let combinator = match obj.get("combinator").and_then(|c| c.as_str()) {
            Some(c) if c.eq_ignore_ascii_case("and") => Combinator::And,
            Some(c) if c.eq_ignore_ascii_case("or") => Combinator::Or,
            Some(c) => {
                return Err(FilterError::invalid_payload(
                    format!("{}.combinator", path),
                    format!("unknown combinator '{}', expected 'and' or 'or'", c),
                ));
            }
            None => {
                return Err(FilterError::invalid_payload(
                    format!("{}.combinator", path),
                    "missing combinator",
                ));
            }
        };
        let rules = rules.as_array().ok_or_else(|| {
            FilterError::invalid_payload(format!("{}.rules", path), "expected an array")
        })?;
        if rules.is_empty() {
            return Err(FilterError::invalid_payload(
                format!("{}.rules", path),
                "group must contain at least one rule",
            ));
        }
        limits.check_depth(depth + 1)?;
        let children = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                decode_node(rule, &format!("{}.rules[{}]", path, i), depth + 1, limits)
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(RuleNode::group(combinator, children));
    }

    let field_path = format!("{}.field", path);
    let field = obj
        .get("field")
        .and_then(|f| f.as_str())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| FilterError::invalid_payload(&field_path, "missing field name"))?;
    if !is_field_name(field) {
        return Err(FilterError::invalid_payload(
            field_path,
            format!("invalid field name '{}'", field),
        ));
    }
    let op_name = obj.get("op").and_then(|o| o.as_str()).ok_or_else(|| {
        FilterError::invalid_payload(format!("{}.op", path), "missing operator")
    })?;
    let operator = OperatorKind::from_name(op_name).ok_or_else(|| {
        FilterError::invalid_payload(
            format!("{}.op", path),
            format!("unknown operator '{}'", op_name),
        )
    })?;

    let value_path = format!("{}.value", path);
    let value = obj.get("value");
    let operand = match (operator.operand_shape(), value) {
        (OperandShape::None, None | Some(serde_json::Value::Null)) => Operand::None,
        (OperandShape::None, Some(_)) => {
            return Err(FilterError::invalid_payload(
                value_path,
                format!("operator '{}' takes no value", operator),
            ));
        }
        (OperandShape::Single, Some(v)) => Operand::Single(decode_value(v, &value_path)?),
        (OperandShape::List, Some(serde_json::Value::Array(items))) => Operand::List(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| decode_value(v, &format!("{}[{}]", value_path, i)))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        (OperandShape::Range, Some(serde_json::Value::Array(items))) if items.len() == 2 => {
            Operand::Range(
                decode_value(&items[0], &format!("{}[0]", value_path))?,
                decode_value(&items[1], &format!("{}[1]", value_path))?,
            )
        }
        (OperandShape::List, _) => {
            return Err(FilterError::invalid_payload(
                value_path,
                format!("operator '{}' requires an array value", operator),
            ));
        }
        (OperandShape::Range, _) => {
            return Err(FilterError::invalid_payload(
                value_path,
                format!("operator '{}' requires a [low, high] array", operator),
            ));
        }
        (OperandShape::Single, None) => {
            return Err(FilterError::invalid_payload(
                value_path,
                format!("operator '{}' requires a value", operator),
            ));
        }
    };

    Ok(RuleNode::leaf(field, operator, operand))
}

fn decode_value(value: &serde_json::Value, path: &str) -> Result<Value, FilterError> {
    match value {
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| FilterError::invalid_payload(path, "number out of range")),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
            FilterError::invalid_payload(path, "expected a string, number, boolean or null"),
        ),
    }
}
