//! Turns tton source text into a flat token list.
//!
//! There's no streaming tokenizer here: the parser needs random access
//! into the token sequence (to compute composite lengths ahead of
//! visiting their elements), so [`tokenize`] collects everything up
//! front, the same way the object builder's decoder reads a whole
//! instruction at a time rather than peeking ahead byte by byte.

use base64::Engine;
use snafu::{ensure, OptionExt, ResultExt};

use crate::error::{InvalidBase64Snafu, InvalidHexSnafu, InvalidNumberSnafu, Result, SyntaxSnafu};

/// A single lexical token, tagged with the character offset it started
/// at (used only for error messages).
#[derive(Debug, Clone)]
pub(crate) struct PositionedToken {
    pub offset: usize,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Int(i128),
    String(String),
    Blob(Vec<u8>),
    Singleton(char),
    Id([u8; 16]),
    Punctuation(char),
    Reference(String),
    End,
}

const PUNCTUATION: &str = "[],{}:@()";

fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

fn is_number_part(c: char) -> bool {
    is_number_start(c) || c == '_'
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<PositionedToken>> {
    let chars: Vec<char> = input.chars().collect();
    let mut cursor = 0usize;
    let mut tokens = Vec::new();

    while cursor < chars.len() {
        while cursor < chars.len() && chars[cursor].is_whitespace() {
            cursor += 1;
        }
        if cursor >= chars.len() {
            break;
        }
        let offset = cursor;
        let c = chars[cursor];
        let kind = if is_number_start(c) {
            read_number(&chars, &mut cursor, offset)?
        } else if c == '%' {
            read_marker(&chars, &mut cursor, offset)?
        } else if c == '$' {
            read_reference(&chars, &mut cursor)
        } else if c == '&' {
            read_id(&chars, &mut cursor, offset)?
        } else if c == '"' {
            read_string(&chars, &mut cursor)
        } else if PUNCTUATION.contains(c) {
            cursor += 1;
            TokenKind::Punctuation(c)
        } else {
            return SyntaxSnafu { offset, description: format!("unexpected character '{c}'") }.fail();
        };
        tokens.push(PositionedToken { offset, kind });
    }
    tokens.push(PositionedToken { offset: chars.len(), kind: TokenKind::End });
    Ok(tokens)
}

fn read_number(chars: &[char], cursor: &mut usize, offset: usize) -> Result<TokenKind> {
    let start = *cursor;
    if chars[*cursor] == '-' {
        *cursor += 1;
    }
    while *cursor < chars.len() && is_number_part(chars[*cursor]) {
        *cursor += 1;
    }
    let text: String = chars[start..*cursor].iter().collect();
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let value: i128 = cleaned
        .parse()
        .ok()
        .with_context(|| InvalidNumberSnafu { text: text.clone(), description: "not a valid integer literal" })?;
    Ok(TokenKind::Int(value))
}

fn read_marker(chars: &[char], cursor: &mut usize, offset: usize) -> Result<TokenKind> {
    *cursor += 1; // consume '%'
    let start = *cursor;
    while *cursor < chars.len() && chars[*cursor].is_ascii_alphanumeric() {
        *cursor += 1;
    }
    let mut name: String = chars[start..*cursor].iter().collect();
    let opens_bracket = *cursor < chars.len() && chars[*cursor] == '[';
    if opens_bracket {
        name.push('[');
        *cursor += 1;
    }
    match name.as_str() {
        "n" => Ok(TokenKind::Singleton('n')),
        "t" => Ok(TokenKind::Singleton('t')),
        "f" => Ok(TokenKind::Singleton('f')),
        "[" | "u[" => read_blob(chars, cursor, offset, false),
        "x[" => read_blob(chars, cursor, offset, true),
        other => SyntaxSnafu { offset, description: format!("unknown marker '%{other}'") }.fail(),
    }
}

fn read_blob(chars: &[char], cursor: &mut usize, offset: usize, hex_encoded: bool) -> Result<TokenKind> {
    let start = *cursor;
    while *cursor < chars.len() && chars[*cursor] != ']' {
        *cursor += 1;
    }
    ensure!(*cursor < chars.len(), SyntaxSnafu { offset, description: "unterminated blob literal" });
    let raw: String = chars[start..*cursor].iter().collect();
    *cursor += 1; // consume ']'
    let data = if hex_encoded {
        hex::decode(raw.trim()).context(InvalidHexSnafu)?
    } else {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD.decode(cleaned).context(InvalidBase64Snafu)?
    };
    Ok(TokenKind::Blob(data))
}

fn read_string(chars: &[char], cursor: &mut usize) -> TokenKind {
    *cursor += 1; // consume opening quote
    let start = *cursor;
    while *cursor < chars.len() && chars[*cursor] != '"' {
        *cursor += 1;
    }
    let text: String = chars[start..*cursor].iter().collect();
    if *cursor < chars.len() {
        *cursor += 1; // consume closing quote
    }
    TokenKind::String(text)
}

fn read_reference(chars: &[char], cursor: &mut usize) -> TokenKind {
    *cursor += 1; // consume '$'
    let start = *cursor;
    while *cursor < chars.len() && (chars[*cursor].is_ascii_alphanumeric() || chars[*cursor] == '_') {
        *cursor += 1;
    }
    TokenKind::Reference(chars[start..*cursor].iter().collect())
}

fn read_id(chars: &[char], cursor: &mut usize, offset: usize) -> Result<TokenKind> {
    *cursor += 1; // consume '&'
    let start = *cursor;
    while *cursor < chars.len() && chars[*cursor].is_ascii_hexdigit() {
        *cursor += 1;
    }
    let digits: String = chars[start..*cursor].iter().collect();
    ensure!(digits.len() <= 32, SyntaxSnafu { offset, description: "id literal longer than 32 hex digits" });
    let padded = format!("{:0>32}", digits);
    let bytes = hex::decode(&padded).context(InvalidHexSnafu)?;
    let mut id = [0u8; 16];
    id.copy_from_slice(&bytes);
    Ok(TokenKind::Id(id))
}

/// A cursor over a pre-tokenized stream, used by both the length-counting
/// pre-pass and the main parse pass. Both passes construct their own
/// `TokenStream` over the same token vector and walk it in lockstep, so a
/// given composite's entry position (`pos` at the moment its opening
/// punctuation is consumed) is identical across both passes; that's what
/// lets the pre-pass's length table be looked up by position in the main
/// pass.
pub(crate) struct TokenStream {
    tokens: Vec<PositionedToken>,
    pub pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<PositionedToken>) -> Self {
        TokenStream { tokens, pos: 0 }
    }

    pub fn current(&self) -> &PositionedToken {
        &self.tokens[self.pos]
    }

    pub fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub fn is_punctuation(&self, value: char) -> bool {
        matches!(self.current().kind, TokenKind::Punctuation(c) if c == value)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.current().kind, TokenKind::Reference(_))
    }

    pub fn is_singleton(&self) -> bool {
        matches!(self.current().kind, TokenKind::Singleton(_))
    }

    pub fn is_atomic(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Int(_) | TokenKind::String(_) | TokenKind::Blob(_) | TokenKind::Id(_)
        )
    }

    pub fn expect_punctuation(&mut self, value: char) -> Result<()> {
        if self.is_punctuation(value) {
            self.advance();
            Ok(())
        } else {
            self.syntax_error()
        }
    }

    pub fn expect_reference(&mut self) -> Result<String> {
        match &self.current().kind {
            TokenKind::Reference(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => self.syntax_error(),
        }
    }

    pub fn expect_singleton(&mut self, value: char) -> Result<()> {
        match self.current().kind {
            TokenKind::Singleton(c) if c == value => {
                self.advance();
                Ok(())
            }
            _ => self.syntax_error(),
        }
    }

    pub fn syntax_error<T>(&self) -> Result<T> {
        SyntaxSnafu { offset: self.current().offset, description: format!("unexpected token {:?}", self.current().kind) }.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_plain_array() {
        let tokens = tokenize("[1, %n, %t]").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Punctuation('['),
                TokenKind::Int(1),
                TokenKind::Punctuation(','),
                TokenKind::Singleton('n'),
                TokenKind::Punctuation(','),
                TokenKind::Singleton('t'),
                TokenKind::Punctuation(']'),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn tokenizes_underscored_integers() {
        let tokens = tokenize("1_000_000").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int(1_000_000));
    }

    #[test]
    fn tokenizes_a_reference_definition_and_use() {
        let tokens = tokenize("$a:[1, $a]").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Reference("a".to_owned()),
                TokenKind::Punctuation(':'),
                TokenKind::Punctuation('['),
                TokenKind::Int(1),
                TokenKind::Punctuation(','),
                TokenKind::Reference("a".to_owned()),
                TokenKind::Punctuation(']'),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn tokenizes_hex_and_base64_blobs() {
        let tokens = tokenize("%x[ff00] %[/wA=]").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Blob(vec![0xff, 0x00]));
        assert_eq!(tokens[1].kind, TokenKind::Blob(vec![0xff, 0x00]));
    }

    #[test]
    fn tokenizes_an_id_literal() {
        let tokens = tokenize("&cafe").unwrap();
        let mut expected = [0u8; 16];
        expected[14] = 0xca;
        expected[15] = 0xfe;
        assert_eq!(tokens[0].kind, TokenKind::Id(expected));
    }

    #[test]
    fn rejects_garbage_characters() {
        assert!(tokenize("[1, ^]").is_err());
    }
}
