//! Tokenizer: keywords, identifiers (backtick-escaped permitted),
//! string/number/boolean literals, operators, punctuation. Tracks
//! `{line, column}` for every token so the parser can report precise
//! positions on failure.

use crate::error::{Error, Position, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    StringLiteral(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Keyword(String),
    // punctuation / operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    DotDot,
    Colon,
    Semicolon,
    Pipe,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Assign,
    ArrowLeft,  // <-
    ArrowRight, // ->
    Dash,       // bare -
    Caret,
    Dollar,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

const KEYWORDS: &[&str] = &[
    "MATCH", "OPTIONAL", "WHERE", "WITH", "RETURN", "UNWIND", "CREATE", "SET", "DELETE", "DETACH",
    "ORDER", "BY", "SKIP", "LIMIT", "ASC", "ASCENDING", "DESC", "DESCENDING", "UNION", "ALL",
    "EXISTS", "CASE", "WHEN", "THEN", "ELSE", "END", "AND", "OR", "XOR", "NOT", "IS", "NULL",
    "TRUE", "FALSE", "AS", "IN", "STARTS", "ENDS", "CONTAINS", "DISTINCT", "CALL", "LOAD", "CSV",
    "FROM", "HEADERS", "TABLE", "NODE", "REL", "DROP", "SEQUENCE", "ALTER", "ADD", "COLUMN",
    "RENAME", "TO", "PRIMARY", "KEY", "COPY", "COMMENT", "ON", "INSTALL", "UNINSTALL", "EXTENSION",
    "IF", "IF_NOT_EXISTS", "FOR",
];

fn keyword_or_ident(word: &str) -> TokenKind {
    let upper = word.to_ascii_uppercase();
    if upper == "TRUE" {
        TokenKind::BoolLiteral(true)
    } else if upper == "FALSE" {
        TokenKind::BoolLiteral(false)
    } else if KEYWORDS.contains(&upper.as_str()) {
        TokenKind::Keyword(upper)
    } else {
        TokenKind::Identifier(word.to_string())
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer { source, chars: source.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn current_pos(&self) -> Position {
        Position { line: self.line, column: self.column }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            if self.peek() == Some('/') && self.peek_at(1) == Some('/') {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let pos = self.current_pos();
            let Some(c) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, pos });
                break;
            };
            let kind = match c {
                '(' => { self.advance(); TokenKind::LParen }
                ')' => { self.advance(); TokenKind::RParen }
                '[' => { self.advance(); TokenKind::LBracket }
                ']' => { self.advance(); TokenKind::RBracket }
                '{' => { self.advance(); TokenKind::LBrace }
                '}' => { self.advance(); TokenKind::RBrace }
                ',' => { self.advance(); TokenKind::Comma }
                ';' => { self.advance(); TokenKind::Semicolon }
                '|' => { self.advance(); TokenKind::Pipe }
                '+' => { self.advance(); TokenKind::Plus }
                '*' => { self.advance(); TokenKind::Star }
                '/' => { self.advance(); TokenKind::Slash }
                '%' => { self.advance(); TokenKind::Percent }
                '^' => { self.advance(); TokenKind::Caret }
                '$' => { self.advance(); TokenKind::Dollar }
                ':' => { self.advance(); TokenKind::Colon }
                '.' => {
                    self.advance();
                    if self.peek() == Some('.') {
                        self.advance();
                        TokenKind::DotDot
                    } else {
                        TokenKind::Dot
                    }
                }
                '=' => { self.advance(); TokenKind::Eq }
                '<' => {
                    self.advance();
                    match self.peek() {
                        Some('>') => { self.advance(); TokenKind::Ne }
                        Some('=') => { self.advance(); TokenKind::Le }
                        Some('-') => { self.advance(); TokenKind::ArrowLeft }
                        _ => TokenKind::Lt,
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '-' => {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        TokenKind::ArrowRight
                    } else {
                        TokenKind::Dash
                    }
                }
                '!' => {
                    return Err(Error::parser(
                        "Unsupported operator '!='; use '<>' for inequality",
                        pos,
                    ));
                }
                '`' => {
                    self.advance();
                    let mut ident = String::new();
                    loop {
                        match self.advance() {
                            Some('`') => break,
                            Some(c) => ident.push(c),
                            None => return Err(Error::parser("Unterminated backtick identifier", pos)),
                        }
                    }
                    TokenKind::Identifier(ident)
                }
                '\'' | '"' => {
                    let quote = c;
                    self.advance();
                    let mut s = String::new();
                    loop {
                        match self.advance() {
                            Some(ch) if ch == quote => break,
                            Some('\\') => {
                                if let Some(escaped) = self.advance() {
                                    s.push(match escaped {
                                        'n' => '\n',
                                        't' => '\t',
                                        'r' => '\r',
                                        other => other,
                                    });
                                }
                            }
                            Some(ch) => s.push(ch),
                            None => return Err(Error::parser("Unterminated string literal", pos)),
                        }
                    }
                    TokenKind::StringLiteral(s)
                }
                c if c.is_ascii_digit() => {
                    let mut num = String::new();
                    let mut is_float = false;
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                        num.push(self.advance().unwrap());
                    }
                    if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit())
                    {
                        is_float = true;
                        num.push(self.advance().unwrap());
                        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                            num.push(self.advance().unwrap());
                        }
                    }
                    if matches!(self.peek(), Some('e') | Some('E')) {
                        is_float = true;
                        num.push(self.advance().unwrap());
                        if matches!(self.peek(), Some('+') | Some('-')) {
                            num.push(self.advance().unwrap());
                        }
                        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                            num.push(self.advance().unwrap());
                        }
                    }
                    if is_float {
                        TokenKind::FloatLiteral(num.parse().map_err(|_| {
                            Error::parser(format!("Invalid numeric literal '{num}'"), pos)
                        })?)
                    } else {
                        TokenKind::IntLiteral(num.parse().map_err(|_| {
                            Error::parser(format!("Invalid numeric literal '{num}'"), pos)
                        })?)
                    }
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut word = String::new();
                    while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                        word.push(self.advance().unwrap());
                    }
                    keyword_or_ident(&word)
                }
                other => {
                    return Err(Error::parser(format!("Unexpected character '{other}'"), pos));
                }
            };
            tokens.push(Token { kind, pos });
        }
        let _ = self.source;
        Ok(tokens)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
