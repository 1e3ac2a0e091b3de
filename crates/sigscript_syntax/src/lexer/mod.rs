//! Configurable tokenizer for SigScript.
//!
//! Turns source text into an ordered token sequence under a [`SyntaxConfig`]. At each position the first
//! matching rule wins:
//! 1. stop-symbol keywords (multi-character operators such as `<=`), longest first;
//! 2. single stop symbols; blanks separate tokens and are never emitted;
//! 3. quoted string literals, where a backslash escapes the next character;
//! 4. a maximal run of non-stop characters, classified as a number, keyword or identifier.
//!
//! After any multi-character token the next character must be a stop symbol or the end of input.
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (`TokenKind`, `Token`) and `SyntaxConfig`

pub mod tokens;

pub use tokens::{SyntaxConfig, Token, TokenKind};

use crate::ast::Span;
use crate::diagnostics::ParsingError;
use tokens::is_blank;

/// Tokenizer state.
pub struct Lexer<'a> {
    source: &'a str,
    config: &'a SyntaxConfig,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, config: &'a SyntaxConfig) -> Self {
        Self {
            source,
            config,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source.
    ///
    /// ## Errors
    /// Returns the first positioned [`ParsingError`] (unterminated string, invalid identifier, missing separator).
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParsingError> {
        while let Some(c) = self.peek() {
            self.scan_token(c)?;
        }
        Ok(self.tokens)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn advance(&mut self) -> Option<char> {
        if let Some((pos, c)) = self.chars.next() {
            self.current_pos = pos + c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    fn push(&mut self, value: impl Into<String>, kind: TokenKind, start: usize) {
        self.tokens
            .push(Token::new(value, kind, Span::new(start, self.current_pos)));
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self, c: char) -> Result<(), ParsingError> {
        let start = self.current_pos;

        if is_blank(c) {
            self.advance();
            return Ok(());
        }
        if self.scan_stop_keyword(start)? {
            return Ok(());
        }
        if self.config.stop_symbols.contains(&c) {
            self.advance();
            self.push(c, TokenKind::StopSymbol, start);
            return Ok(());
        }
        if self.config.is_quote(c) {
            return self.scan_string(c, start);
        }
        self.scan_word(start)
    }

    /// Try the configured multi-character operators at the current position.
    fn scan_stop_keyword(&mut self, start: usize) -> Result<bool, ParsingError> {
        let (config, source) = (self.config, self.source);
        let rest = &source[start..];
        let Some(keyword) = config.stop_keywords.iter().find(|kw| !kw.is_empty() && rest.starts_with(kw.as_str()))
        else {
            return Ok(false);
        };

        for _ in keyword.chars() {
            self.advance();
        }
        let ends_with_stop = keyword.chars().last().is_some_and(|c| config.is_stop_symbol(c));
        if !ends_with_stop {
            self.expect_separator(keyword, start)?;
        }
        self.push(keyword.as_str(), TokenKind::Keyword, start);
        Ok(true)
    }

    fn scan_string(&mut self, quote: char, start: usize) -> Result<(), ParsingError> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(ParsingError::syntax(
                        "unterminated string literal",
                        Span::new(start, self.current_pos),
                    ));
                }
                Some('\\') => match self.advance() {
                    Some(escaped) => value.push(escaped),
                    None => {
                        return Err(ParsingError::syntax(
                            "unterminated string literal",
                            Span::new(start, self.current_pos),
                        ));
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        let source = self.source;
        self.expect_separator(&source[start..self.current_pos], start)?;
        self.push(value, TokenKind::StringLiteral, start);
        Ok(())
    }

    fn scan_word(&mut self, start: usize) -> Result<(), ParsingError> {
        while let Some(c) = self.peek() {
            if self.config.is_stop_symbol(c) {
                break;
            }
            self.advance();
        }
        let source = self.source;
        let word = &source[start..self.current_pos];

        let kind = if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            TokenKind::NumericValue
        } else if self.config.is_keyword(word) {
            TokenKind::Keyword
        } else if is_identifier(word) {
            TokenKind::Identifier
        } else {
            return Err(ParsingError::syntax(
                format!("invalid identifier '{word}'"),
                Span::new(start, self.current_pos),
            ));
        };
        self.push(word, kind, start);
        Ok(())
    }

    /// The character after a multi-character token must be a stop symbol or the end of input.
    fn expect_separator(&mut self, token_text: &str, start: usize) -> Result<(), ParsingError> {
        match self.peek() {
            None => Ok(()),
            Some(c) if self.config.is_stop_symbol(c) => Ok(()),
            Some(c) => Err(ParsingError::syntax(
                format!("expected a separator after '{token_text}', found '{c}'"),
                Span::new(start, self.current_pos + c.len_utf8()),
            )),
        }
    }
}

/// `[A-Za-z][A-Za-z0-9]*(\.[A-Za-z0-9]+)*`
pub fn is_identifier(word: &str) -> bool {
    let mut segments = word.split('.');
    let first_ok = segments.next().is_some_and(|first| {
        first.starts_with(|c: char| c.is_ascii_alphabetic()) && first.chars().all(|c| c.is_ascii_alphanumeric())
    });
    first_ok && segments.all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Tokenize `source` under `config`.
///
/// ## Errors
/// Returns a positioned [`ParsingError`] for the first malformed token.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn tokenize(source: &str, config: &SyntaxConfig) -> Result<Vec<Token>, ParsingError> {
    Lexer::new(source, config).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigscript_core::lang::grammars::GrammarId;

    fn lex(source: &str, grammar: GrammarId) -> Result<Vec<Token>, ParsingError> {
        tokenize(source, &SyntaxConfig::for_grammar(grammar))
    }

    fn values(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.value.as_str()).collect()
    }

    #[test]
    fn test_prefix_form() {
        let tokens = lex("(eq (sig Foo.Bar) 5)", GrammarId::Prefix).unwrap();
        assert_eq!(values(&tokens), vec!["(", "eq", "(", "sig", "Foo.Bar", ")", "5", ")"]);
        assert_eq!(tokens[1].kind, TokenKind::Keyword);
        assert_eq!(tokens[4].kind, TokenKind::Identifier);
        assert_eq!(tokens[6].kind, TokenKind::NumericValue);
        assert_eq!(tokens[4].span, Span::new(9, 16));
    }

    #[test]
    fn test_prefix_negative_number_is_one_token() {
        let tokens = lex("(sub 1 -2)", GrammarId::Prefix).unwrap();
        assert_eq!(values(&tokens), vec!["(", "sub", "1", "-2", ")"]);
        assert_eq!(tokens[3].kind, TokenKind::NumericValue);
    }

    #[test]
    fn test_infix_stop_keywords_longest_first() {
        let tokens = lex("a<=b==c<d", GrammarId::Infix).unwrap();
        assert_eq!(values(&tokens), vec!["a", "<=", "b", "==", "c", "<", "d"]);
        assert_eq!(tokens[1].kind, TokenKind::Keyword);
        assert_eq!(tokens[5].kind, TokenKind::StopSymbol);
    }

    #[test]
    fn test_repeated_blanks_collapse() {
        let tokens = lex("1  +\t2\n", GrammarId::Infix).unwrap();
        assert_eq!(values(&tokens), vec!["1", "+", "2"]);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#"'it\'s' "a\\b""#, GrammarId::Infix).unwrap();
        assert_eq!(values(&tokens), vec!["it's", "a\\b"]);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::StringLiteral));
    }

    #[test]
    fn test_unterminated_string() {
        let err = lex("'abc", GrammarId::Infix).unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.span, Some(Span::new(0, 4)));
    }

    #[test]
    fn test_string_needs_separator() {
        let err = lex("'abc'x", GrammarId::Infix).unwrap_err();
        assert!(err.message.starts_with("expected a separator"), "{}", err.message);
    }

    #[test]
    fn test_invalid_identifier() {
        for bad in ["Foo..Bar", "Foo.", "_x", "a$b"] {
            let err = lex(bad, GrammarId::Prefix).unwrap_err();
            assert_eq!(err.message, format!("invalid identifier '{bad}'"));
        }
    }

    #[test]
    fn test_custom_stop_keyword_needs_separator() {
        let config = SyntaxConfig::new()
            .with_stop_symbols(&['('])
            .with_stop_keywords(["=>"]);
        assert!(tokenize("a => b", &config).is_ok());
        let err = tokenize("a =>b", &config).unwrap_err();
        assert!(err.message.contains("'=>'"), "{}", err.message);
    }

    #[test]
    fn test_identifier_shape() {
        assert!(is_identifier("Door"));
        assert!(is_identifier("Door.Position2"));
        assert!(!is_identifier("2Door"));
        assert!(!is_identifier(""));
    }
}
