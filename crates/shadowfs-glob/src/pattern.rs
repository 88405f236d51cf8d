//! Glob pattern compiler.
//!
//! A pattern segment is parsed into a small token tree by recursive
//! descent and rendered into an anchored [`regex::Regex`]. Everything that
//! is not glob syntax is escaped, so regex meta-characters in file names
//! (`.`, `(`, `^`, `$`, `+`, `|` ...) always match literally.

use std::collections::HashMap;

use regex::Regex;

use crate::error::GlobError;
use crate::flags::GlobFlags;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    AnyChar,
    AnyRun,
    Class { negated: bool, items: Vec<ClassItem> },
    Alternation(Vec<Vec<Token>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassItem {
    Char(char),
    Range(char, char),
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    flags: GlobFlags,
    /// Outcome of each brace group attempted so far, keyed by the
    /// position of its `{`: the parsed token and the position after it.
    groups: HashMap<usize, Option<(Token, usize)>>,
}

impl Parser {
    fn new(segment: &str, flags: GlobFlags) -> Self {
        Self {
            chars: segment.chars().collect(),
            pos: 0,
            flags,
            groups: HashMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn escapes(&self) -> bool {
        !self.flags.contains(GlobFlags::NOESCAPE)
    }

    /// Parse tokens until the input ends or, inside a brace group, until
    /// an unescaped `,` or `}`.
    fn parse_sequence(&mut self, in_group: bool) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if in_group && (c == ',' || c == '}') {
                break;
            }
            match c {
                '[' => match self.parse_class() {
                    Some(class) => tokens.push(class),
                    None => {
                        self.pos += 1;
                        push_literal(&mut tokens, '[');
                    }
                },
                '?' => {
                    self.pos += 1;
                    tokens.push(Token::AnyChar);
                }
                '*' => {
                    self.pos += 1;
                    if tokens.last() != Some(&Token::AnyRun) {
                        tokens.push(Token::AnyRun);
                    }
                }
                '\\' if self.escapes() => {
                    self.pos += 1;
                    // A trailing backslash has nothing to escape and stays literal.
                    match self.peek() {
                        Some(escaped) => {
                            self.pos += 1;
                            push_literal(&mut tokens, escaped);
                        }
                        None => push_literal(&mut tokens, '\\'),
                    }
                }
                '{' if self.flags.contains(GlobFlags::BRACE) => match self.parse_group() {
                    Some(group) => tokens.push(group),
                    None => {
                        self.pos += 1;
                        push_literal(&mut tokens, '{');
                    }
                },
                other => {
                    self.pos += 1;
                    push_literal(&mut tokens, other);
                }
            }
        }
        tokens
    }

    /// `[...]` or `[!...]` starting at `self.pos`. Returns `None` (and
    /// leaves the position untouched) when no closing `]` exists.
    ///
    /// A `]` directly after the opener is part of the class.
    fn parse_class(&mut self) -> Option<Token> {
        let mut i = self.pos + 1;
        let negated = self.chars.get(i) == Some(&'!');
        if negated {
            i += 1;
        }
        let body_start = i;
        let mut items = Vec::new();

        loop {
            let raw = self.chars.get(i).copied()?;
            if raw == ']' && i > body_start {
                break;
            }
            let c = if raw == '\\' && self.escapes() {
                i += 1;
                self.chars.get(i).copied()?
            } else {
                raw
            };
            i += 1;

            let is_range = self.chars.get(i) == Some(&'-')
                && self.chars.get(i + 1).is_some_and(|&next| next != ']');
            if is_range {
                let mut end_at = i + 1;
                let mut end = self.chars.get(end_at).copied()?;
                if end == '\\' && self.escapes() {
                    end_at += 1;
                    end = self.chars.get(end_at).copied()?;
                }
                items.push(ClassItem::Range(c, end));
                i = end_at + 1;
            } else {
                items.push(ClassItem::Char(c));
            }
        }

        self.pos = i + 1;
        Some(Token::Class { negated, items })
    }

    /// `{a,b,...}` starting at `self.pos`. Choices may nest. Returns `None`
    /// (position restored) when the group is never closed.
    ///
    /// A group's outcome depends only on where it starts, so each start is
    /// parsed once. Without this, a run of unclosed braces is reparsed for
    /// every enclosing attempt.
    fn parse_group(&mut self) -> Option<Token> {
        let start = self.pos;
        let parsed = match self.groups.get(&start) {
            Some(known) => known.clone(),
            None => {
                let parsed = self.parse_group_body(start);
                self.groups.insert(start, parsed.clone());
                parsed
            }
        };
        match parsed {
            Some((token, end)) => {
                self.pos = end;
                Some(token)
            }
            None => {
                self.pos = start;
                None
            }
        }
    }

    fn parse_group_body(&mut self, start: usize) -> Option<(Token, usize)> {
        self.pos = start + 1;
        let mut choices = Vec::new();
        loop {
            choices.push(self.parse_sequence(true));
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Some((Token::Alternation(choices), self.pos));
                }
                _ => return None,
            }
        }
    }
}

fn push_literal(tokens: &mut Vec<Token>, c: char) {
    if let Some(Token::Literal(run)) = tokens.last_mut() {
        run.push(c);
    } else {
        tokens.push(Token::Literal(c.to_string()));
    }
}

fn render(tokens: &[Token], out: &mut String) {
    for token in tokens {
        match token {
            Token::Literal(text) => out.push_str(&regex::escape(text)),
            Token::AnyChar => out.push('.'),
            Token::AnyRun => out.push_str(".*"),
            Token::Class { negated, items } => {
                out.push('[');
                if *negated {
                    out.push('^');
                }
                for item in items {
                    match item {
                        ClassItem::Char(c) => push_class_char(out, *c),
                        ClassItem::Range(from, to) => {
                            push_class_char(out, *from);
                            out.push('-');
                            push_class_char(out, *to);
                        }
                    }
                }
                out.push(']');
            }
            Token::Alternation(choices) => {
                out.push_str("(?:");
                for (i, choice) in choices.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    render(choice, out);
                }
                out.push(')');
            }
        }
    }
}

fn push_class_char(out: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}

/// Regex that no input satisfies: the start of input never follows a
/// character.
const NEVER_MATCHES: &str = r"(?s).\A";

/// Anchored matcher for a single path segment.
#[derive(Debug, Clone)]
pub struct SegmentMatcher {
    segment: String,
    regex: Regex,
}

impl SegmentMatcher {
    /// Returns true if `name` matches the whole segment pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// The glob segment this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.segment
    }

    /// The generated regular expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// True if any class in `tokens` holds a range whose end sorts before
/// its start.
fn has_inverted_range(tokens: &[Token]) -> bool {
    tokens.iter().any(|token| match token {
        Token::Class { items, .. } => items
            .iter()
            .any(|item| matches!(item, ClassItem::Range(from, to) if from > to)),
        Token::Alternation(choices) => choices.iter().any(|choice| has_inverted_range(choice)),
        _ => false,
    })
}

/// Compile one `/`-free glob segment.
///
/// A class with an inverted range such as `[z-a]` makes the whole segment
/// match nothing.
pub fn compile_segment(segment: &str, flags: GlobFlags) -> Result<SegmentMatcher, GlobError> {
    let tokens = Parser::new(segment, flags).parse_sequence(false);
    let source = if has_inverted_range(&tokens) {
        String::from(NEVER_MATCHES)
    } else {
        let mut source = String::from("(?s)^");
        render(&tokens, &mut source);
        source.push('$');
        source
    };

    tracing::trace!(segment, regex = %source, "compiled glob segment");

    let regex = Regex::new(&source).map_err(|e| GlobError::InvalidPattern {
        pattern: segment.to_string(),
        reason: e.to_string(),
    })?;
    Ok(SegmentMatcher {
        segment: segment.to_string(),
        regex,
    })
}

/// Compile a whole pattern into one matcher per segment.
///
/// Leading and trailing separators are ignored, so `/a/*/` and `a/*`
/// both yield two matchers.
pub fn compile(pattern: &str, flags: GlobFlags) -> Result<Vec<SegmentMatcher>, GlobError> {
    pattern
        .trim_matches('/')
        .split('/')
        .map(|segment| compile_segment(segment, flags))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(pattern: &str) -> SegmentMatcher {
        compile_segment(pattern, GlobFlags::empty()).unwrap()
    }

    fn brace(pattern: &str) -> SegmentMatcher {
        compile_segment(pattern, GlobFlags::BRACE).unwrap()
    }

    #[test]
    fn test_literal_is_anchored() {
        let m = matcher("file.txt");
        assert!(m.is_match("file.txt"));
        assert!(!m.is_match("fileXtxt"));
        assert!(!m.is_match("file.txt.bak"));
        assert!(!m.is_match("a.file.txt"));
    }

    #[test]
    fn test_star_and_question() {
        let m = matcher("*2*");
        assert!(m.is_match("file2.txt"));
        assert!(!m.is_match("file.txt"));

        let m = matcher("file?.txt");
        assert!(m.is_match("file1.txt"));
        assert!(!m.is_match("file.txt"));
        assert!(!m.is_match("file12.txt"));

        assert!(matcher("*").is_match(""));
        assert!(matcher("**").is_match("anything"));
    }

    #[test]
    fn test_character_classes() {
        let m = matcher("file[12].txt");
        assert!(m.is_match("file1.txt"));
        assert!(m.is_match("file2.txt"));
        assert!(!m.is_match("file3.txt"));

        let m = matcher("[a-c]x");
        assert!(m.is_match("bx"));
        assert!(!m.is_match("dx"));

        let m = matcher("[!a]*");
        assert!(m.is_match("bcd"));
        assert!(!m.is_match("abc"));
        assert!(!m.is_match(""));
    }

    #[test]
    fn test_class_edge_cases() {
        let m = matcher("[]a]");
        assert!(m.is_match("]"));
        assert!(m.is_match("a"));

        let m = matcher("[a-]");
        assert!(m.is_match("-"));
        assert!(m.is_match("a"));
        assert!(!m.is_match("b"));

        let m = matcher("[^]");
        assert!(m.is_match("^"));
    }

    #[test]
    fn test_unclosed_class_is_literal() {
        let m = matcher("[abc");
        assert!(m.is_match("[abc"));
        assert!(!m.is_match("a"));

        let m = matcher("[!x");
        assert!(m.is_match("[!x"));
    }

    #[test]
    fn test_escapes() {
        let m = matcher(r"\*");
        assert!(m.is_match("*"));
        assert!(!m.is_match("x"));

        let m = matcher(r"a\[b]");
        assert!(m.is_match("a[b]"));

        let m = compile_segment(r"a\b", GlobFlags::NOESCAPE).unwrap();
        assert!(m.is_match(r"a\b"));
        assert!(!m.is_match("ab"));
    }

    #[test]
    fn test_regex_meta_characters_are_literal() {
        let m = matcher("a(b).c^$+|");
        assert!(m.is_match("a(b).c^$+|"));
        assert!(!m.is_match("abxc"));
    }

    #[test]
    fn test_brace_alternation() {
        let m = brace("{foo,bar}.rs");
        assert!(m.is_match("foo.rs"));
        assert!(m.is_match("bar.rs"));
        assert!(!m.is_match("baz.rs"));

        let m = brace("x{a,b{c,d}}");
        assert!(m.is_match("xa"));
        assert!(m.is_match("xbc"));
        assert!(m.is_match("xbd"));
        assert!(!m.is_match("xb"));

        let m = brace("{*.rs,[A-Z]*}");
        assert!(m.is_match("lib.rs"));
        assert!(m.is_match("README"));
        assert!(!m.is_match("notes.txt"));
    }

    #[test]
    fn test_brace_escaped_comma() {
        let m = brace(r"{a\,b,c}");
        assert!(m.is_match("a,b"));
        assert!(m.is_match("c"));
        assert!(!m.is_match("a"));
    }

    #[test]
    fn test_braces_literal_without_flag_or_close() {
        let m = matcher("{a,b}");
        assert!(m.is_match("{a,b}"));
        assert!(!m.is_match("a"));

        let m = brace("{a,b");
        assert!(m.is_match("{a,b"));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let m = matcher("[z-a]");
        for name in ["", "a", "m", "z", "[z-a]"] {
            assert!(!m.is_match(name), "{name}");
        }
        assert!(!matcher("x[!z-a]").is_match("xb"));
        assert!(!brace("{a,[9-0]}").is_match("a"));
    }

    #[test]
    fn test_unclosed_braces_compile_quickly() {
        let opens = "{".repeat(64);
        let m = brace(&opens);
        assert!(m.is_match(&opens));
        assert!(!m.is_match("{"));

        let mixed = "{a,".repeat(40);
        let m = brace(&mixed);
        assert!(m.is_match(&mixed));

        let mut nested = "{".repeat(48);
        nested.push_str("x}");
        let m = brace(&nested);
        assert!(m.is_match(&format!("{}x", "{".repeat(47))));
    }

    #[test]
    fn test_compile_splits_segments() {
        let matchers = compile("/a/*/c*/", GlobFlags::empty()).unwrap();
        assert_eq!(matchers.len(), 3);
        assert_eq!(matchers[1].as_str(), "*");
        assert!(matchers[2].is_match("cat"));
    }
}
