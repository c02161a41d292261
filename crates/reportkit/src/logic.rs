//! Filter logic expressions: `(1 AND 2) OR 3` over 1-based filter indices.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Joins indices `1..=filter_count` with one connective, parenthesized.
/// Returns an empty string when there are no filters.
#[must_use]
pub fn build_logic_string(filter_count: usize, connective: Connective) -> String {
    if filter_count == 0 {
        return String::new();
    }

    let separator = format!(" {} ", connective.keyword());
    let joined = (1..=filter_count)
        .map(|index| index.to_string())
        .collect::<Vec<_>>()
        .join(&separator);
    format!("({joined})")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicExpr {
    Filter(usize),
    And(Vec<LogicExpr>),
    Or(Vec<LogicExpr>),
}

impl LogicExpr {
    /// Evaluates the expression given the outcome of each filter, in order.
    /// Indices without an outcome evaluate to false.
    #[must_use]
    pub fn evaluate(&self, outcomes: &[bool]) -> bool {
        match self {
            Self::Filter(index) => index
                .checked_sub(1)
                .and_then(|position| outcomes.get(position))
                .copied()
                .unwrap_or(false),
            Self::And(children) => children.iter().all(|child| child.evaluate(outcomes)),
            Self::Or(children) => children.iter().any(|child| child.evaluate(outcomes)),
        }
    }

    #[must_use]
    pub fn referenced_indices(&self) -> BTreeSet<usize> {
        let mut indices = BTreeSet::new();
        self.collect_indices(&mut indices);
        indices
    }

    fn collect_indices(&self, indices: &mut BTreeSet<usize>) {
        match self {
            Self::Filter(index) => {
                indices.insert(*index);
            }
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_indices(indices);
                }
            }
        }
    }

    fn fmt_child(&self, child: &LogicExpr, f: &mut Formatter<'_>) -> std::fmt::Result {
        let needs_parens = matches!(
            (self, child),
            (Self::And(_), Self::Or(_)) | (Self::Or(_), Self::And(_))
        );
        if needs_parens {
            write!(f, "({child})")
        } else {
            write!(f, "{child}")
        }
    }
}

impl Display for LogicExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (children, connective) = match self {
            Self::Filter(index) => return write!(f, "{index}"),
            Self::And(children) => (children, Connective::And),
            Self::Or(children) => (children, Connective::Or),
        };

        for (position, child) in children.iter().enumerate() {
            if position > 0 {
                write!(f, " {} ", connective.keyword())?;
            }
            self.fmt_child(child, f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicError {
    Empty,
    UnexpectedToken { token: String, position: usize },
    UnexpectedEnd,
    UnbalancedParentheses { position: usize },
    IndexOutOfRange { index: usize, filter_count: usize },
    TooDeep { position: usize, limit: usize },
}

impl Display for LogicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("logic expression is empty"),
            Self::UnexpectedToken { token, position } => {
                write!(f, "unexpected `{token}` at position {position}")
            }
            Self::UnexpectedEnd => f.write_str("logic expression ends unexpectedly"),
            Self::UnbalancedParentheses { position } => {
                write!(f, "unbalanced parenthesis at position {position}")
            }
            Self::IndexOutOfRange {
                index,
                filter_count,
            } => write!(
                f,
                "filter #{index} does not exist (there are {filter_count} filters)"
            ),
            Self::TooDeep { position, limit } => write!(
                f,
                "parentheses nest deeper than {limit} levels at position {position}"
            ),
        }
    }
}

impl std::error::Error for LogicError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Open,
    Close,
    And,
    Or,
    Index(usize),
    Other,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    text: String,
    position: usize,
}

fn token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\(|\)|[0-9]+|[A-Za-z_]+|\S").expect("logic token regex must compile")
    })
}

fn tokenize(input: &str) -> Vec<Token> {
    token_regex()
        .find_iter(input)
        .map(|found| {
            let text = found.as_str();
            let kind = match text {
                "(" => TokenKind::Open,
                ")" => TokenKind::Close,
                word if word.eq_ignore_ascii_case("and") => TokenKind::And,
                word if word.eq_ignore_ascii_case("or") => TokenKind::Or,
                digits if digits.bytes().all(|byte| byte.is_ascii_digit()) => digits
                    .parse::<usize>()
                    .map_or(TokenKind::Other, TokenKind::Index),
                _ => TokenKind::Other,
            };
            Token {
                kind,
                text: text.to_string(),
                position: found.start(),
            }
        })
        .collect()
}

/// Deepest parenthesis nesting a logic string may use.
pub const MAX_LOGIC_NESTING: usize = 64;

/// Parses a custom logic string and checks every index against
/// `1..=filter_count`. AND binds tighter than OR.
pub fn parse_logic(input: &str, filter_count: usize) -> Result<LogicExpr, LogicError> {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return Err(LogicError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        cursor: 0,
        depth: 0,
        filter_count,
    };
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) if token.kind == TokenKind::Close => Err(LogicError::UnbalancedParentheses {
            position: token.position,
        }),
        Some(token) => Err(unexpected(token)),
    }
}

pub fn validate_logic(input: &str, filter_count: usize) -> Result<(), LogicError> {
    parse_logic(input, filter_count).map(|_| ())
}

struct Parser<'a> {
    tokens: &'a [Token],
    cursor: usize,
    depth: usize,
    filter_count: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.cursor);
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|token| &token.kind == kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expression(&mut self) -> Result<LogicExpr, LogicError> {
        let mut terms = vec![self.term()?];
        while self.eat(&TokenKind::Or) {
            terms.push(self.term()?);
        }
        Ok(collapse(terms, LogicExpr::Or))
    }

    fn term(&mut self) -> Result<LogicExpr, LogicError> {
        let mut factors = vec![self.factor()?];
        while self.eat(&TokenKind::And) {
            factors.push(self.factor()?);
        }
        Ok(collapse(factors, LogicExpr::And))
    }

    fn factor(&mut self) -> Result<LogicExpr, LogicError> {
        let filter_count = self.filter_count;
        let Some(token) = self.next().cloned() else {
            return Err(LogicError::UnexpectedEnd);
        };

        match token.kind {
            TokenKind::Index(index) => {
                if index == 0 || index > filter_count {
                    return Err(LogicError::IndexOutOfRange {
                        index,
                        filter_count,
                    });
                }
                Ok(LogicExpr::Filter(index))
            }
            TokenKind::Open => {
                if self.depth == MAX_LOGIC_NESTING {
                    return Err(LogicError::TooDeep {
                        position: token.position,
                        limit: MAX_LOGIC_NESTING,
                    });
                }
                self.depth += 1;
                let inner = self.expression();
                self.depth -= 1;
                let inner = inner?;
                match self.next() {
                    Some(close) if close.kind == TokenKind::Close => Ok(inner),
                    Some(other) => Err(unexpected(other)),
                    None => Err(LogicError::UnbalancedParentheses {
                        position: token.position,
                    }),
                }
            }
            // A `)` here closes an empty group such as `()`.
            TokenKind::Close
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Other => Err(unexpected(&token)),
        }
    }
}

fn collapse(mut items: Vec<LogicExpr>, wrap: fn(Vec<LogicExpr>) -> LogicExpr) -> LogicExpr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

fn unexpected(token: &Token) -> LogicError {
    LogicError::UnexpectedToken {
        token: token.text.clone(),
        position: token.position,
    }
}
