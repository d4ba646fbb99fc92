//! Text → token tree (spec §4.1). Structural scanning (whitespace, comments,
//! matched parens) follows `examples/original_source/Rasp/src/lexer.cpp`'s
//! hand-written iterator; literal classification (numbers, escaped strings)
//! uses `nom` combinators, matching the teacher's
//! (`examples/TrevorS-lisp-llm-sandbox/src/parser.rs`) preference for `nom`
//! over hand-rolled character classification at the leaf level.

use nom::character::complete::{char, digit1};
use nom::combinator::{all_consuming, opt, recognize};
use nom::sequence::pair;
use nom::Parser;

use crate::error::{RaspError, Traced};
use crate::escape;
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::token::{Token, TokenKind};

struct Cursor<'a> {
    filename: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
}

impl<'a> Cursor<'a> {
    fn new(filename: &'a str, source: &'a str) -> Self {
        Cursor {
            filename,
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation::new(self.filename, self.line)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        if c == '\n' {
            self.line += 1;
        }
        self.pos += 1;
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map(|c| c.is_whitespace()).unwrap_or(false) {
            self.advance();
        }
    }

    /// Consumes `//` and `/* ... */` comments, looping to handle runs like
    /// `/* */ /* */`. Returns an error for an unterminated block comment or
    /// a stray `/`.
    fn skip_comments(&mut self) -> Result<(), Traced> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('/') => match self.peek_at(1) {
                    Some('/') => {
                        self.advance();
                        self.advance();
                        while self.peek().map(|c| c != '\n').unwrap_or(false) {
                            self.advance();
                        }
                    }
                    Some('*') => {
                        let start_loc = self.loc();
                        self.advance();
                        self.advance();
                        let mut closed = false;
                        while !self.at_end() {
                            if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                                self.advance();
                                self.advance();
                                closed = true;
                                break;
                            }
                            self.advance();
                        }
                        if !closed {
                            return Err(RaspError::lex(
                                start_loc,
                                "Cannot find end of block comment",
                            )
                            .into());
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        Ok(())
    }
}

fn is_literal_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

fn parse_number(text: &str) -> Option<i64> {
    all_consuming(recognize(pair(opt(char('-')), digit1)))
        .parse(text)
        .ok()?;
    text.parse::<i64>().ok()
}

/// Splits a dotted bare literal (`a.b.c`) into its base name plus member
/// names, or returns `None` if it has no dots.
fn split_dotted(text: &str) -> Option<(&str, Vec<&str>)> {
    if !text.contains('.') {
        return None;
    }
    let mut parts = text.split('.');
    let base = parts.next().unwrap();
    Some((base, parts.collect()))
}

fn bare_literal(cursor: &mut Cursor, location: SourceLocation) -> Result<Token, Traced> {
    let start = cursor.pos;
    while cursor.peek().map(|c| !is_literal_boundary(c)).unwrap_or(false) {
        cursor.advance();
    }
    let text: String = cursor.chars[start..cursor.pos].iter().collect();

    if let Some(kind) = Token::keyword_kind(&text) {
        return Ok(Token::new(kind, text, location));
    }

    if let Some(number) = parse_number(&text) {
        return Ok(Token::new(TokenKind::Number, number.to_string(), location));
    }

    if let Some((name, type_name)) = text.split_once(':') {
        if Identifier::is_valid(name) && Identifier::is_valid(type_name) {
            let mut declaration = Token::new(TokenKind::Declaration, "", location.clone());
            declaration.add_child(Token::new(TokenKind::Identifier, name, location.clone()));
            declaration.add_child(Token::new(TokenKind::Identifier, type_name, location));
            return Ok(declaration);
        }
        return Err(RaspError::lex(location, format!("Invalid declaration '{text}'")).into());
    }

    if let Some((base, members)) = split_dotted(&text) {
        if !Identifier::is_valid(base) {
            return Err(RaspError::lex(location, format!("Invalid identifier '{text}'")).into());
        }
        let mut identifier = Token::new(TokenKind::Identifier, base, location.clone());
        for member in members {
            if !Identifier::is_valid(member) {
                return Err(
                    RaspError::lex(location, format!("Invalid member name '{member}'")).into(),
                );
            }
            identifier.add_child(Token::new(TokenKind::Identifier, member, location.clone()));
        }
        return Ok(identifier);
    }

    if !Identifier::is_valid(&text) {
        return Err(RaspError::lex(location, format!("Invalid identifier '{text}'")).into());
    }

    Ok(Token::new(TokenKind::Identifier, text, location))
}

fn string_literal(cursor: &mut Cursor, location: SourceLocation) -> Result<Token, Traced> {
    let mut text = String::new();
    let mut escape_next = false;
    loop {
        let Some(c) = cursor.advance() else {
            return Err(RaspError::lex(location, "String literal never closed").into());
        };
        if escape_next {
            if escape::needs_escaping(c) {
                text.push(escape::unescape(c));
            } else {
                return Err(RaspError::lex(
                    cursor.loc(),
                    format!("Invalid escape sequence '\\{c}' found in string literal"),
                )
                .into());
            }
            escape_next = false;
        } else if c == '"' {
            return Ok(Token::new(TokenKind::String, text, location));
        } else if c == '\\' {
            escape_next = true;
        } else {
            text.push(c);
        }
    }
}

fn list(cursor: &mut Cursor, location: SourceLocation) -> Result<Token, Traced> {
    let mut token = Token::new(TokenKind::List, "", location.clone());
    loop {
        cursor.skip_whitespace();
        cursor.skip_comments()?;
        match cursor.peek() {
            None => return Err(RaspError::lex(location, "Unterminated list").into()),
            Some(')') => {
                cursor.advance();
                return Ok(token);
            }
            Some(_) => token.add_child(next_token(cursor)?),
        }
    }
}

fn next_token(cursor: &mut Cursor) -> Result<Token, Traced> {
    cursor.skip_whitespace();
    cursor.skip_comments()?;
    let location = cursor.loc();
    match cursor.peek() {
        None => unreachable!("caller checks at_end before calling next_token"),
        Some(')') => Err(RaspError::lex(location, "Stray ) in program").into()),
        Some('(') => {
            cursor.advance();
            list(cursor, location)
        }
        Some('"') => {
            cursor.advance();
            string_literal(cursor, location)
        }
        Some(_) => bare_literal(cursor, location),
    }
}

/// Lexes `source` (attributed to `filename` in source locations) into a
/// root list token whose children are the top-level forms.
pub fn lex(filename: &str, source: &str) -> Result<Token, Traced> {
    let mut cursor = Cursor::new(filename, source);
    let mut root = Token::new(TokenKind::Root, "", SourceLocation::new(filename, 1));
    loop {
        cursor.skip_whitespace();
        cursor.skip_comments()?;
        if cursor.at_end() {
            break;
        }
        root.add_child(next_token(&mut cursor)?);
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ok(source: &str) -> Token {
        lex("t.rasp", source).expect("expected lex to succeed")
    }

    #[test]
    fn lexes_number_and_identifier() {
        let root = lex_ok("42 foo");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].kind, TokenKind::Number);
        assert_eq!(root.children[0].text, "42");
        assert_eq!(root.children[1].kind, TokenKind::Identifier);
        assert_eq!(root.children[1].text, "foo");
    }

    #[test]
    fn lexes_nested_list() {
        let root = lex_ok("(+ 1 (* 2 3))");
        assert_eq!(root.children.len(), 1);
        let list = &root.children[0];
        assert_eq!(list.kind, TokenKind::List);
        assert_eq!(list.children.len(), 3);
        assert_eq!(list.children[2].kind, TokenKind::List);
    }

    #[test]
    fn lexes_string_with_escapes() {
        let root = lex_ok(r#""a\nb\"c""#);
        assert_eq!(root.children[0].kind, TokenKind::String);
        assert_eq!(root.children[0].text, "a\nb\"c");
    }

    #[test]
    fn rejects_invalid_escape() {
        let err = lex("t.rasp", r#""bad \q""#).unwrap_err();
        assert!(matches!(err.error, RaspError::LexError { .. }));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(lex("t.rasp", "\"no close").is_err());
    }

    #[test]
    fn rejects_unterminated_block_comment() {
        assert!(lex("t.rasp", "/* never closes").is_err());
    }

    #[test]
    fn line_comment_consumes_to_newline() {
        let root = lex_ok("1 // comment\n2");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].location.line(), 2);
    }

    #[test]
    fn rejects_stray_close_paren() {
        assert!(lex("t.rasp", ")").is_err());
    }

    #[test]
    fn rejects_unterminated_list() {
        assert!(lex("t.rasp", "(+ 1 2").is_err());
    }

    #[test]
    fn recognizes_keywords() {
        let root = lex_ok("while if var set inc nil type true false defun");
        let kinds: Vec<_> = root.children.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::While,
                TokenKind::If,
                TokenKind::Var,
                TokenKind::Set,
                TokenKind::Inc,
                TokenKind::Nil,
                TokenKind::Type,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Defun,
            ]
        );
    }

    #[test]
    fn lexes_declaration_syntax() {
        let root = lex_ok("x:number");
        assert_eq!(root.children[0].kind, TokenKind::Declaration);
        assert_eq!(root.children[0].children[0].text, "x");
        assert_eq!(root.children[0].children[1].text, "number");
    }

    #[test]
    fn lexes_dotted_identifier_as_member_chain() {
        let root = lex_ok("a.b.c");
        let id = &root.children[0];
        assert_eq!(id.kind, TokenKind::Identifier);
        assert_eq!(id.text, "a");
        assert_eq!(id.children.len(), 2);
        assert_eq!(id.children[0].text, "b");
        assert_eq!(id.children[1].text, "c");
    }

    #[test]
    fn lexes_negative_number_literal() {
        let root = lex_ok("-5");
        assert_eq!(root.children[0].kind, TokenKind::Number);
        assert_eq!(root.children[0].text, "-5");
    }

    #[test]
    fn bare_slash_with_no_following_slash_or_star_is_identifier() {
        let root = lex_ok("/ 2");
        assert_eq!(root.children[0].kind, TokenKind::Identifier);
        assert_eq!(root.children[0].text, "/");
    }
}
