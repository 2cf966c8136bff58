//! Tokenizer for DDL text.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: identifier or keyword.
    Word(String),
    /// Back-quoted identifier with the quotes removed.
    QuotedIdent(String),
    /// Single-quoted string literal with the quotes removed.
    String(String),
    Number(String),
    /// Any single punctuation or operator character.
    Symbol(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Token {
    /// Returns `true` if this is a bare word equal to `keyword`, ignoring
    /// ASCII case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol(symbol)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    /// Text shown in "Encountered" diagnostics.
    pub fn image(&self) -> String {
        match &self.kind {
            TokenKind::Word(w) => w.clone(),
            TokenKind::QuotedIdent(ident) => format!("`{ident}`"),
            TokenKind::String(s) => format!("'{s}'"),
            TokenKind::Number(n) => n.clone(),
            TokenKind::Symbol(c) => c.to_string(),
            TokenKind::Eof => "<EOF>".to_string(),
        }
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let Some(&(start, ch)) = self.chars.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                    column,
                    start: self.source.len(),
                    end: self.source.len(),
                });
                return Ok(tokens);
            };

            let kind = if ch.is_alphabetic() || ch == '_' {
                TokenKind::Word(self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '$'))
            } else if ch.is_ascii_digit() {
                TokenKind::Number(self.take_while(|c| c.is_ascii_digit() || c == '.'))
            } else if ch == '\'' {
                TokenKind::String(self.quoted('\'', line, column, "string literal")?)
            } else if ch == '`' {
                TokenKind::QuotedIdent(self.quoted('`', line, column, "quoted identifier")?)
            } else {
                self.bump();
                TokenKind::Symbol(ch)
            };

            let end = self.chars.peek().map_or(self.source.len(), |(idx, _)| *idx);
            tokens.push(Token {
                kind,
                line,
                column,
                start,
                end,
            });
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            out.push(ch);
            self.bump();
        }
        out
    }

    /// Skips whitespace, `-- line` comments and `/* block */` comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_second() == Some('-') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek_char() == Some('/') {
                            self.bump();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(ParseError::Lexical {
                            message: "unterminated block comment".to_string(),
                            line,
                            column,
                        });
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Reads a quoted run; a doubled quote character escapes itself.
    fn quoted(
        &mut self,
        quote: char,
        line: usize,
        column: usize,
        what: &str,
    ) -> Result<String, ParseError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    if self.peek_char() == Some(quote) {
                        self.bump();
                        out.push(quote);
                    } else {
                        return Ok(out);
                    }
                }
                Some(c) => out.push(c),
                None => {
                    return Err(ParseError::Lexical {
                        message: format!("unterminated {what}"),
                        line,
                        column,
                    });
                }
            }
        }
    }
}
