//! Lexical analyzer

use crate::token::{LexError, Line, Literal, Token, TokenKind};

/// Turn source text into a sequence of tokens.
///
/// The sequence is produced lazily and ends with exactly one `Eof` token.  Malformed
/// lexemes become `TokenKind::Invalid` tokens rather than stopping the scan.
#[derive(Debug)]
pub struct Scanner<'a> {
    source: &'a str,
    // Byte offsets of the lexeme being scanned.
    start: usize,
    current: usize,
    line: Line,
    done: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner operating on `source`.
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source,
            start: 0,
            current: 0,
            line: 1,
            done: false,
        }
    }

    /// Scan next token and return it.  Returns `Eof` forever once the input is exhausted.
    pub fn get_token(&mut self) -> Token {
        loop {
            self.start = self.current;
            let ch = match self.advance() {
                None => return Token::new(TokenKind::Eof, "", self.line),
                Some(ch) => ch,
            };
            let kind = match ch {
                '\n' => {
                    self.line += 1;
                    continue;
                }
                ' ' | '\t' | '\r' => continue,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '-' => TokenKind::Minus,
                '+' => TokenKind::Plus,
                ';' => TokenKind::Semicolon,
                '*' => TokenKind::Star,
                '/' => {
                    if self.next_is('/') {
                        self.skip_comment();
                        continue;
                    }
                    TokenKind::Slash
                }
                '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
                '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
                '<' => self.either('=', TokenKind::LessEqual, TokenKind::Less),
                '>' => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater),
                '"' => return self.scan_string(),
                '0'..='9' => return self.scan_number(),
                ch if is_alpha(ch) => return self.scan_identifier(),
                _ => return self.scan_undefined(),
            };
            return self.make_token(kind);
        }
    }

    fn scan_string(&mut self) -> Token {
        let line = self.line;
        loop {
            match self.advance() {
                None => {
                    return Token::new(
                        TokenKind::Invalid(LexError::UnterminatedString),
                        self.lexeme(),
                        line,
                    );
                }
                Some('"') => break,
                Some('\n') => self.line += 1,
                Some(_) => (),
            }
        }
        let contents = &self.source[self.start + 1..self.current - 1];
        Token::new(TokenKind::String, self.lexeme(), line)
            .with_literal(Literal::Str(contents.to_string()))
    }

    fn scan_number(&mut self) -> Token {
        self.skip_digits();
        // A fractional part needs at least one digit after the dot.
        if self.peek() == Some('.') && self.peek_second().map_or(false, |ch| ch.is_ascii_digit())
        {
            self.advance();
            self.skip_digits();
        }
        // digit+ ('.' digit+)? always parses as a float.
        let n = self.lexeme().parse::<f64>().unwrap_or(f64::NAN);
        self.make_token(TokenKind::Number)
            .with_literal(Literal::Number(n))
    }

    fn scan_identifier(&mut self) -> Token {
        while self.peek().map_or(false, is_alphanumeric) {
            self.advance();
        }
        let kind = TokenKind::keyword(self.lexeme()).unwrap_or(TokenKind::Identifier);
        self.make_token(kind)
    }

    /// Swallow the rest of the offending word so that a single bad character does not
    /// produce a cascade of errors.
    fn scan_undefined(&mut self) -> Token {
        while self.peek().map_or(false, |ch| !ch.is_whitespace()) {
            self.advance();
        }
        self.make_token(TokenKind::Invalid(LexError::UndefinedToken))
    }

    fn skip_comment(&mut self) {
        while self.peek().map_or(false, |ch| ch != '\n') {
            self.advance();
        }
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |ch| ch.is_ascii_digit()) {
            self.advance();
        }
    }

    fn either(&mut self, second: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.next_is(second) {
            matched
        } else {
            otherwise
        }
    }

    /// Consume the next character if it is `expected`.
    fn next_is(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += ch.len_utf8();
        Some(ch)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.current..].chars().nth(1)
    }

    fn lexeme(&self) -> &'a str {
        &self.source[self.start..self.current]
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.line)
    }
}

fn is_alpha(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_alphanumeric(ch: char) -> bool {
    is_alpha(ch) || ch.is_ascii_digit()
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.get_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}

impl std::iter::FusedIterator for Scanner<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Scanner::new(input).map(|t| t.kind).collect()
    }

    fn scan(input: &str) -> Vec<Token> {
        Scanner::new(input).collect()
    }

    #[test]
    fn scan_single_token() {
        assert_eq!(kinds("+"), vec![TokenKind::Plus, TokenKind::Eof]);
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(scan(""), vec![Token::new(TokenKind::Eof, "", 1)]);
    }

    #[test]
    fn fixed_tokens() {
        assert_eq!(
            kinds("(){},.-+;*/ ! != = == > >= < <="),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_are_greedy() {
        assert_eq!(
            kinds("!==="),
            vec![TokenKind::BangEqual, TokenKind::EqualEqual, TokenKind::Eof]
        );
    }

    #[test]
    fn blanks_are_ignored() {
        assert_eq!(kinds(" \t\r\n+"), vec![TokenKind::Plus, TokenKind::Eof]);
    }

    #[test]
    fn integer_and_float() {
        let tokens = scan("42 4.2");
        assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].literal, Some(Literal::Number(4.2)));
        assert_eq!(tokens[1].lexeme, "4.2");
    }

    #[test]
    fn trailing_and_leading_dots_are_not_part_of_numbers() {
        assert_eq!(
            kinds("1. .5"),
            vec![
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Dot,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn scan_several_tokens_without_blanks() {
        assert_eq!(
            kinds("42+24"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn string_literal() {
        let tokens = scan("\"hello world\"");
        assert_eq!(
            tokens[0],
            Token::new(TokenKind::String, "\"hello world\"", 1)
                .with_literal(Literal::Str("hello world".to_string()))
        );
    }

    #[test]
    fn strings_are_not_unescaped() {
        let tokens = scan(r#""a\nb""#);
        assert_eq!(tokens[0].literal, Some(Literal::Str(r"a\nb".to_string())));
    }

    #[test]
    fn unterminated_string_spans_to_end_of_input() {
        let tokens = scan("print \"abc\ndef");
        assert_eq!(
            tokens[1],
            Token::new(
                TokenKind::Invalid(LexError::UnterminatedString),
                "\"abc\ndef",
                1
            )
        );
        assert_eq!(tokens[2], Token::new(TokenKind::Eof, "", 2));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn undefined_character_swallows_rest_of_word() {
        let tokens = scan("1 @#x$ 2");
        assert_eq!(
            tokens[1],
            Token::new(TokenKind::Invalid(LexError::UndefinedToken), "@#x$", 1)
        );
        assert_eq!(tokens[2].kind, TokenKind::Number);
        assert_eq!(tokens[2].lexeme, "2");
    }

    #[test]
    fn scanner_keeps_track_of_lines() {
        let lines = Scanner::new("1\n2 3\n4")
            .map(|t| t.line)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 2, 2, 3, 3]);
    }

    #[test]
    fn identifier() {
        let lexemes = Scanner::new("f foo _foo t42")
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.lexeme)
            .collect::<Vec<_>>();
        assert_eq!(lexemes, vec!["f", "foo", "_foo", "t42"]);
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("and class else false for fun if nil or print return super this true var while"),
            vec![
                TokenKind::And,
                TokenKind::Class,
                TokenKind::Else,
                TokenKind::False,
                TokenKind::For,
                TokenKind::Fun,
                TokenKind::If,
                TokenKind::Nil,
                TokenKind::Or,
                TokenKind::Print,
                TokenKind::Return,
                TokenKind::Super,
                TokenKind::This,
                TokenKind::True,
                TokenKind::Var,
                TokenKind::While,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_ignored() {
        assert_eq!(kinds("true // false"), vec![TokenKind::True, TokenKind::Eof]);
        assert_eq!(
            kinds("// only a comment\n1"),
            vec![TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn iteration_stops_after_eof() {
        let mut s = Scanner::new("1");
        assert_eq!(s.next().map(|t| t.kind), Some(TokenKind::Number));
        assert_eq!(s.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert_eq!(s.next(), None);
        assert_eq!(s.next(), None);
    }

    #[test]
    fn non_ascii_characters_are_undefined_tokens() {
        let tokens = scan("∏x y");
        assert_eq!(
            tokens[0],
            Token::new(TokenKind::Invalid(LexError::UndefinedToken), "∏x", 1)
        );
        assert_eq!(tokens[1].lexeme, "y");
    }
}
