//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic; they serialize against a
//! [`DialectProfile`], which decides quoting and dialect spelling.

use super::dialect::SqlDialect;
use super::profile::DialectProfile;

/// SQL Token - every element the renderer emits.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    And,
    Or,
    Is,
    As,
    On,
    Join,
    Inner,
    Left,
    Outer,
    GroupBy,
    OrderBy,
    Case,
    When,
    Then,
    Else,
    End,
    Distinct,
    Cast,
    WithinGroup,

    // === Punctuation ===
    Comma,
    Dot,
    LParen,
    RParen,

    // === Operators ===
    Eq,
    GtEq,
    Lt,
    Plus,
    Minus,
    Mul,
    Div,

    // === Whitespace / Formatting ===
    Space,
    Newline,
    Indent(usize),
    /// Line comment. Newlines in the text are flattened to spaces.
    Comment(String),

    // === Dynamic Content ===
    /// Simple identifier (table alias, column, output name)
    Ident(String),
    /// Qualified identifier: schema.table or just table
    QualifiedIdent {
        schema: Option<String>,
        name: String,
    },
    LitInt(i64),
    LitFloat(f64),
    LitString(String),
    LitNull,
    /// Function name, rendered upper-case.
    FunctionName(String),
    /// Dialect keyword passed through verbatim (type names, date parts).
    Keyword(String),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// Only for trusted expressions taken from semantic model definitions.
    Raw(String),
}

impl Token {
    /// Serialize this token to a string for the given profile.
    pub fn serialize(&self, profile: &DialectProfile) -> String {
        match self {
            Token::Select => "SELECT".into(),
            Token::From => "FROM".into(),
            Token::And => "AND".into(),
            Token::Or => "OR".into(),
            Token::Is => "IS".into(),
            Token::As => "AS".into(),
            Token::On => "ON".into(),
            Token::Join => "JOIN".into(),
            Token::Inner => "INNER".into(),
            Token::Left => "LEFT".into(),
            Token::Outer => "OUTER".into(),
            Token::GroupBy => "GROUP BY".into(),
            Token::OrderBy => "ORDER BY".into(),
            Token::Case => "CASE".into(),
            Token::When => "WHEN".into(),
            Token::Then => "THEN".into(),
            Token::Else => "ELSE".into(),
            Token::End => "END".into(),
            Token::Distinct => "DISTINCT".into(),
            Token::Cast => "CAST".into(),
            Token::WithinGroup => "WITHIN GROUP".into(),

            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),

            Token::Eq => "=".into(),
            Token::GtEq => ">=".into(),
            Token::Lt => "<".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Mul => "*".into(),
            Token::Div => "/".into(),

            Token::Space => " ".into(),
            Token::Newline => "\n".into(),
            Token::Indent(n) => "  ".repeat(*n),
            Token::Comment(text) => format!("-- {}", text.replace(['\r', '\n'], " ")),

            Token::Ident(name) => profile.quote_identifier(name),
            Token::QualifiedIdent { schema, name } => match schema {
                Some(s) => format!(
                    "{}.{}",
                    profile.quote_identifier(s),
                    profile.quote_identifier(name)
                ),
                None => profile.quote_identifier(name),
            },
            Token::LitInt(n) => n.to_string(),
            Token::LitFloat(f) => {
                if f.is_nan() {
                    panic!("Cannot serialize NaN to SQL")
                }
                if f.is_infinite() {
                    panic!("Cannot serialize Infinity to SQL")
                }
                let mut buffer = ryu::Buffer::new();
                buffer.format(*f).to_string()
            }
            Token::LitString(s) => profile.dialect.quote_string(s),
            Token::LitNull => "NULL".into(),
            Token::FunctionName(name) => name.to_uppercase(),
            Token::Keyword(kw) => kw.clone(),

            Token::Raw(s) => s.clone(),
        }
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    pub fn serialize(&self, profile: &DialectProfile) -> String {
        self.tokens.iter().map(|t| t.serialize(profile)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn indent(&mut self, n: usize) -> &mut Self {
        self.push(Token::Indent(n))
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
