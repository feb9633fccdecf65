//! Tokenizer for filter expression text

use super::ast::OperatorKind;
use super::error::FilterError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Field name or keyword; keywords are resolved by the parser
    Ident(String),
    String(String),
    Number(f64),
    /// Symbolic comparison operator (`=`, `!=`, `<`, ...)
    Compare(OperatorKind),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

impl TokenKind {
    /// Description used in "expected X but found Y" messages
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::String(s) => format!("string \"{}\"", s),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Compare(op) => format!("'{}'", op.syntax()),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub position: usize,
}

/// Split an expression into tokens, always terminated by `Eof`
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            '[' => {
                chars.next();
                TokenKind::LBracket
            }
            ']' => {
                chars.next();
                TokenKind::RBracket
            }
            ',' => {
                chars.next();
                TokenKind::Comma
            }
            '=' => {
                chars.next();
                // "==" is accepted as an alias of "="
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                }
                TokenKind::Compare(OperatorKind::Eq)
            }
            '!' => {
                chars.next();
                match chars.peek() {
                    Some((_, '=')) => {
                        chars.next();
                        TokenKind::Compare(OperatorKind::Neq)
                    }
                    _ => return Err(FilterError::syntax(pos, "expected '=' after '!'")),
                }
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some((_, '=')) => {
                        chars.next();
                        TokenKind::Compare(OperatorKind::Lte)
                    }
                    Some((_, '>')) => {
                        chars.next();
                        TokenKind::Compare(OperatorKind::Neq)
                    }
                    _ => TokenKind::Compare(OperatorKind::Lt),
                }
            }
            '>' => {
                chars.next();
                if matches!(chars.peek(), Some((_, '='))) {
                    chars.next();
                    TokenKind::Compare(OperatorKind::Gte)
                } else {
                    TokenKind::Compare(OperatorKind::Gt)
                }
            }
            '"' | '\'' => {
                chars.next();
                TokenKind::String(read_string(input, pos, c, &mut chars)?)
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' => {
                TokenKind::Number(read_number(input, pos, &mut chars)?)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = pos;
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(input[pos..end].to_string())
            }
            other => {
                return Err(FilterError::syntax(
                    pos,
                    format!("unexpected character '{}'", other),
                ));
            }
        };

        tokens.push(Token {
            kind,
            position: pos,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: input.len(),
    });
    Ok(tokens)
}

type CharStream<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn read_string(
    input: &str,
    start: usize,
    quote: char,
    chars: &mut CharStream<'_>,
) -> Result<String, FilterError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => {
                return Err(FilterError::syntax(
                    input.len(),
                    format!("unterminated string starting at position {}", start),
                ));
            }
            Some((_, c)) if c == quote => return Ok(out),
            Some((pos, '\\')) => match chars.next() {
                Some((_, '"')) => out.push('"'),
                Some((_, '\'')) => out.push('\''),
                Some((_, '\\')) => out.push('\\'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, other)) => {
                    return Err(FilterError::syntax(
                        pos,
                        format!("invalid escape sequence '\\{}'", other),
                    ));
                }
                None => {
                    return Err(FilterError::syntax(
                        input.len(),
                        format!("unterminated string starting at position {}", start),
                    ));
                }
            },
            Some((_, c)) => out.push(c),
        }
    }
}

fn read_number(input: &str, start: usize, chars: &mut CharStream<'_>) -> Result<f64, FilterError> {
    let mut end = start;
    let mut prev = '\0';
    while let Some(&(i, c)) = chars.peek() {
        let is_sign = (c == '-' || c == '+') && (i == start || prev == 'e' || prev == 'E');
        if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || is_sign {
            end = i + c.len_utf8();
            prev = c;
            chars.next();
        } else {
            break;
        }
    }

    let text = &input[start..end];
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FilterError::syntax(start, format!("invalid number '{}'", text)))
}
