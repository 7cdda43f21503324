//! Recursive-descent parsing over a token stream, driving an arbitrary
//! [`Visitor`] the same way [`plankton_object::ObjectBuilder`] is driven by
//! the binary decoder.
//!
//! tton's composites are prefix-length on the wire's visitor contract
//! (`on_begin_array(len)` etc.) but *not* on the page: `[1, 2, 3]` only
//! reveals its length once the closing `]` is reached. So parsing runs in
//! two passes over the same token vector: [`precount`] walks the grammar
//! once purely to record, for every composite's opening punctuation
//! position, how many children follow; [`parse_value`] then walks it again
//! emitting visitor calls, looking up each composite's length by the
//! position its opening punctuation is at. Both passes share the exact same
//! recursive structure, so a composite's entry position is identical across
//! the two walks.

use std::collections::HashMap;

use plankton_encoding::{Singleton, Visitor};
use snafu::OptionExt;

use crate::error::{visit, Result, UndefinedReferenceSnafu};
use crate::tokenizer::{tokenize, PositionedToken, TokenKind, TokenStream};

/// Parses `input` as a single tton value, driving `visitor` with exactly
/// the calls a binary decoder would make for the equivalent bton.
pub(crate) fn parse<V: Visitor>(input: &str, visitor: &mut V) -> Result<()> {
    let tokens = tokenize(input)?;
    let counts = precount(tokens.clone())?;
    let mut stream = TokenStream::new(tokens);
    let mut refs = HashMap::new();
    let mut next_slot = 0u64;
    parse_value(&mut stream, &counts, &mut refs, &mut next_slot, visitor)
}

/// Position (token index) -> child count, for every array, map or seed
/// encountered during the precount walk.
type Counts = HashMap<usize, usize>;

fn precount(tokens: Vec<PositionedToken>) -> Result<Counts> {
    let mut counts = Counts::new();
    let mut stream = TokenStream::new(tokens);
    precount_value(&mut stream, &mut counts)?;
    Ok(counts)
}

fn precount_value(stream: &mut TokenStream, counts: &mut Counts) -> Result<()> {
    if stream.is_reference() {
        stream.advance();
        if stream.is_punctuation(':') {
            stream.advance();
            return precount_value(stream, counts);
        }
        return Ok(());
    }
    if stream.is_atomic() || stream.is_singleton() {
        stream.advance();
        return Ok(());
    }
    if stream.is_punctuation('[') {
        let pos = stream.pos;
        stream.advance();
        let mut n = 0;
        if !stream.is_punctuation(']') {
            loop {
                precount_value(stream, counts)?;
                n += 1;
                if stream.is_punctuation(',') {
                    stream.advance();
                } else {
                    break;
                }
            }
        }
        stream.expect_punctuation(']')?;
        counts.insert(pos, n);
        return Ok(());
    }
    if stream.is_punctuation('{') {
        let pos = stream.pos;
        stream.advance();
        let mut n = 0;
        if !stream.is_punctuation('}') {
            loop {
                precount_value(stream, counts)?;
                stream.expect_punctuation(':')?;
                precount_value(stream, counts)?;
                n += 1;
                if stream.is_punctuation(',') {
                    stream.advance();
                } else {
                    break;
                }
            }
        }
        stream.expect_punctuation('}')?;
        counts.insert(pos, n);
        return Ok(());
    }
    if stream.is_punctuation('@') {
        let pos = stream.pos;
        stream.advance();
        precount_value(stream, counts)?; // header
        let mut n = 0;
        if stream.is_punctuation('(') {
            stream.advance();
            if !stream.is_punctuation(')') {
                loop {
                    precount_value(stream, counts)?;
                    stream.expect_punctuation(':')?;
                    precount_value(stream, counts)?;
                    n += 1;
                    if stream.is_punctuation(',') {
                        stream.advance();
                    } else {
                        break;
                    }
                }
            }
            stream.expect_punctuation(')')?;
        }
        counts.insert(pos, n);
        return Ok(());
    }
    stream.syntax_error()
}

fn parse_value<V: Visitor>(
    stream: &mut TokenStream,
    counts: &Counts,
    refs: &mut HashMap<String, u64>,
    next_slot: &mut u64,
    visitor: &mut V,
) -> Result<()> {
    if stream.is_reference() {
        let name = stream.expect_reference()?;
        if stream.is_punctuation(':') {
            stream.advance();
            let slot = *next_slot;
            *next_slot += 1;
            refs.insert(name, slot);
            visit(visitor.on_add_ref(slot))?;
            return parse_value(stream, counts, refs, next_slot, visitor);
        }
        let slot = refs.get(&name).copied().context(UndefinedReferenceSnafu { name })?;
        return visit(visitor.on_get_ref(slot));
    }

    let kind = stream.current().kind.clone();
    match kind {
        TokenKind::Int(value) => {
            stream.advance();
            visit(visitor.on_int(value))
        }
        TokenKind::String(text) => {
            stream.advance();
            visit(visitor.on_string(text.as_bytes(), None))
        }
        TokenKind::Blob(bytes) => {
            stream.advance();
            visit(visitor.on_blob(&bytes))
        }
        TokenKind::Id(bytes) => {
            stream.advance();
            visit(visitor.on_id(bytes))
        }
        TokenKind::Singleton(c) => {
            stream.advance();
            let singleton = match c {
                'n' => Singleton::Null,
                't' => Singleton::True,
                'f' => Singleton::False,
                other => unreachable!("tokenizer never produces singleton '{other}'"),
            };
            visit(visitor.on_singleton(singleton))
        }
        TokenKind::Punctuation('[') => parse_array(stream, counts, refs, next_slot, visitor),
        TokenKind::Punctuation('{') => parse_map(stream, counts, refs, next_slot, visitor),
        TokenKind::Punctuation('@') => parse_seed(stream, counts, refs, next_slot, visitor),
        _ => stream.syntax_error(),
    }
}

fn parse_array<V: Visitor>(
    stream: &mut TokenStream,
    counts: &Counts,
    refs: &mut HashMap<String, u64>,
    next_slot: &mut u64,
    visitor: &mut V,
) -> Result<()> {
    let pos = stream.pos;
    stream.expect_punctuation('[')?;
    let len = *counts.get(&pos).expect("precount recorded every array's position");
    visit(visitor.on_begin_array(len))?;
    for i in 0..len {
        parse_value(stream, counts, refs, next_slot, visitor)?;
        if i + 1 < len {
            stream.expect_punctuation(',')?;
        }
    }
    stream.expect_punctuation(']')
}

fn parse_map<V: Visitor>(
    stream: &mut TokenStream,
    counts: &Counts,
    refs: &mut HashMap<String, u64>,
    next_slot: &mut u64,
    visitor: &mut V,
) -> Result<()> {
    let pos = stream.pos;
    stream.expect_punctuation('{')?;
    let len = *counts.get(&pos).expect("precount recorded every map's position");
    visit(visitor.on_begin_map(len))?;
    for i in 0..len {
        parse_value(stream, counts, refs, next_slot, visitor)?;
        stream.expect_punctuation(':')?;
        parse_value(stream, counts, refs, next_slot, visitor)?;
        if i + 1 < len {
            stream.expect_punctuation(',')?;
        }
    }
    stream.expect_punctuation('}')
}

fn parse_seed<V: Visitor>(
    stream: &mut TokenStream,
    counts: &Counts,
    refs: &mut HashMap<String, u64>,
    next_slot: &mut u64,
    visitor: &mut V,
) -> Result<()> {
    let pos = stream.pos;
    stream.expect_punctuation('@')?;
    let field_count = *counts.get(&pos).expect("precount recorded every seed's position");
    visit(visitor.on_begin_seed(field_count))?;
    parse_value(stream, counts, refs, next_slot, visitor)?; // header
    if field_count > 0 || stream.is_punctuation('(') {
        stream.expect_punctuation('(')?;
        for i in 0..field_count {
            parse_value(stream, counts, refs, next_slot, visitor)?;
            stream.expect_punctuation(':')?;
            parse_value(stream, counts, refs, next_slot, visitor)?;
            if i + 1 < field_count {
                stream.expect_punctuation(',')?;
            }
        }
        stream.expect_punctuation(')')?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plankton_encoding::Singleton;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Visitor for Recorder {
        type Error = std::convert::Infallible;

        fn on_int(&mut self, value: i128) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("int({value})"));
            Ok(())
        }
        fn on_singleton(&mut self, value: Singleton) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("singleton({value:?})"));
            Ok(())
        }
        fn on_float(&mut self, value: f64) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("float({value})"));
            Ok(())
        }
        fn on_id(&mut self, value: [u8; 16]) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("id({value:?})"));
            Ok(())
        }
        fn on_string(&mut self, bytes: &[u8], _encoding: Option<&str>) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("string({:?})", String::from_utf8_lossy(bytes)));
            Ok(())
        }
        fn on_blob(&mut self, bytes: &[u8]) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("blob({bytes:?})"));
            Ok(())
        }
        fn on_begin_array(&mut self, len: usize) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_array({len})"));
            Ok(())
        }
        fn on_begin_map(&mut self, len: usize) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_map({len})"));
            Ok(())
        }
        fn on_begin_seed(&mut self, field_count: usize) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_seed({field_count})"));
            Ok(())
        }
        fn on_begin_struct(&mut self, tags: &[u32]) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_struct({tags:?})"));
            Ok(())
        }
        fn on_add_ref(&mut self, slot_index: u64) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("add_ref({slot_index})"));
            Ok(())
        }
        fn on_get_ref(&mut self, slot_index: u64) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("get_ref({slot_index})"));
            Ok(())
        }
        fn on_invalid_instruction(&mut self, opcode: u8) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("invalid({opcode})"));
            Ok(())
        }
    }

    fn run(input: &str) -> Vec<String> {
        let mut recorder = Recorder::default();
        parse(input, &mut recorder).unwrap();
        recorder.calls
    }

    #[test]
    fn parses_an_array_of_three() {
        assert_eq!(
            run("[1, %n, %t]"),
            vec!["begin_array(3)", "int(1)", "singleton(Null)", "singleton(True)"]
        );
    }

    #[test]
    fn parses_a_nested_map() {
        assert_eq!(
            run(r#"{"a": 1}"#),
            vec!["begin_map(1)", "string(\"a\")", "int(1)"]
        );
    }

    #[test]
    fn parses_a_ref_definition_and_use() {
        assert_eq!(
            run("$a:[1, $a]"),
            vec!["add_ref(0)", "begin_array(2)", "int(1)", "get_ref(0)"]
        );
    }

    #[test]
    fn parses_a_self_referential_array() {
        assert_eq!(
            run("$x:[$x]"),
            vec!["add_ref(0)", "begin_array(1)", "get_ref(0)"]
        );
    }

    #[test]
    fn parses_a_seed_with_fields() {
        assert_eq!(
            run(r#"@"point"("x": 1, "y": 2)"#),
            vec![
                "begin_seed(2)",
                "string(\"point\")",
                "string(\"x\")",
                "int(1)",
                "string(\"y\")",
                "int(2)",
            ]
        );
    }

    #[test]
    fn parses_a_headerless_seed() {
        assert_eq!(run("@1"), vec!["begin_seed(0)", "int(1)"]);
    }

    #[test]
    fn rejects_an_undefined_reference() {
        assert!(parse("$missing", &mut Recorder::default()).is_err());
    }
}
