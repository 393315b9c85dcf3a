//! Lexer implementation for the PlasticOS configuration DSL.

use super::token::*;
use std::iter::Peekable;
use std::str::CharIndices;

/// Lexer for the configuration DSL.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    /// Tokenize the entire source into a vector of tokens, terminated by a
    /// single trailing `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.column;

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(':') => {
                self.advance();
                TokenKind::Colon
            }
            Some('-') if self.peek_ahead(1) == Some('>') => {
                self.advance();
                self.advance();
                TokenKind::Arrow
            }
            Some('"') => self.scan_string(),
            Some(c) if c.is_ascii_digit() || (c == '-' && self.peek_ahead(1).is_some_and(|d| d.is_ascii_digit())) => {
                self.scan_number()
            }
            Some(c) if is_ident_start(c) => self.scan_ident_or_keyword(),
            Some(c) => {
                self.advance();
                TokenKind::Error(format!("unexpected character '{c}'"))
            }
        };

        let span = Span {
            start: start_pos,
            end: self.pos,
            line: start_line,
            column: start_col,
        };
        Token::new(kind, span)
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => return TokenKind::Error("unterminated string literal".to_string()),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        TokenKind::String(value)
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut text = String::new();
        if self.peek_char() == Some('-') {
            text.push('-');
            self.advance();
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Error(format!("invalid numeric literal '{text}'")),
        }
    }

    fn scan_ident_or_keyword(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        keyword_from_ident(&text).unwrap_or(TokenKind::Identifier(text))
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_synonym_statement() {
        let tokens = Lexer::new(r#"synonym "blown film" -> "film""#).tokenize();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Synonym,
                TokenKind::String("blown film".to_string()),
                TokenKind::Arrow,
                TokenKind::String("film".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_weight_statement_with_negative_not_allowed_but_decimal_ok() {
        let tokens = Lexer::new("weight vector_similarity: 0.35").tokenize();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Weight,
                TokenKind::Identifier("vector_similarity".to_string()),
                TokenKind::Colon,
                TokenKind::Number(0.35),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        let tokens = Lexer::new("# a comment\ntag rule_gate_check: domain-safe").tokenize();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Tag,
                TokenKind::Identifier("rule_gate_check".to_string()),
                TokenKind::Colon,
                TokenKind::DomainSafe,
                TokenKind::Eof,
            ]
        );
    }
}
