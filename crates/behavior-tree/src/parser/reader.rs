//! Line-oriented scanner for the behavior tree DSL.
//!
//! The reader knows nothing about tasks. It splits the text into lines,
//! statements and attributes and reports them to a [`ReaderHandler`]:
//!
//! ```text
//! (isEnemyNear) selector             # guard, then a statement
//!   wait seconds:"uniform,1,5"       # attribute with a quoted value
//!   $patrol                          # subtree reference
//! ```

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use crate::error::{ParseError, ParseResult};

/// A literal attribute value as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Long(value) => write!(f, "{value}"),
            Value::Double(value) => write!(f, "{value:?}"),
            Value::String(value) => write!(f, "{value:?}"),
        }
    }
}

/// Receives the events produced by [`BehaviorTreeReader`].
///
/// Events for one line always arrive as `start_line`, then for each
/// statement `start_statement`, its `attribute`s and `end_statement`, then
/// `end_line`. Blank and comment-only lines produce no line events.
pub trait ReaderHandler {
    /// `indent` is the number of leading whitespace characters.
    fn start_line(&mut self, line: usize, indent: usize) -> ParseResult<()>;

    fn start_statement(
        &mut self,
        name: &str,
        is_subtree_reference: bool,
        is_guard: bool,
    ) -> ParseResult<()>;

    fn attribute(&mut self, name: &str, value: Value) -> ParseResult<()>;

    fn end_statement(&mut self) -> ParseResult<()>;

    fn end_line(&mut self) -> ParseResult<()>;

    /// Comment text without the leading `#`. Only called when the reader
    /// reports comments.
    fn comment(&mut self, _text: &str) -> ParseResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BehaviorTreeReader {
    reports_comments: bool,
    line_number: usize,
}

impl BehaviorTreeReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comments(reports_comments: bool) -> Self {
        Self {
            reports_comments,
            line_number: 0,
        }
    }

    pub fn reports_comments(&self) -> bool {
        self.reports_comments
    }

    /// Line the reader stopped at; after a full parse this is the number of
    /// lines in the input, counting the one after a trailing newline.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn parse<H: ReaderHandler + ?Sized>(&mut self, text: &str, handler: &mut H) -> ParseResult<()> {
        self.line_number = 0;
        for (index, line) in text.split('\n').enumerate() {
            self.line_number = index + 1;
            let line = line.strip_suffix('\r').unwrap_or(line);
            self.parse_line(line, handler)?;
        }
        Ok(())
    }

    /// Parses `length` characters of `data` starting at `offset`.
    pub fn parse_chars<H: ReaderHandler + ?Sized>(
        &mut self,
        data: &[char],
        offset: usize,
        length: usize,
        handler: &mut H,
    ) -> ParseResult<()> {
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| ParseError::syntax(0, format!("character range {offset}+{length} is out of bounds")))?;
        let text: String = data[offset..end].iter().collect();
        self.parse(&text, handler)
    }

    pub fn parse_reader<R: Read, H: ReaderHandler + ?Sized>(
        &mut self,
        mut reader: R,
        handler: &mut H,
    ) -> ParseResult<()> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.parse(&text, handler)
    }

    pub fn parse_bytes<H: ReaderHandler + ?Sized>(&mut self, bytes: &[u8], handler: &mut H) -> ParseResult<()> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| ParseError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        self.parse(text, handler)
    }

    pub fn parse_file<P: AsRef<Path>, H: ReaderHandler + ?Sized>(
        &mut self,
        path: P,
        handler: &mut H,
    ) -> ParseResult<()> {
        let text = std::fs::read_to_string(path)?;
        self.parse(&text, handler)
    }

    fn parse_line<H: ReaderHandler + ?Sized>(&mut self, line: &str, handler: &mut H) -> ParseResult<()> {
        let chars: Vec<char> = line.chars().collect();
        let indent = chars.iter().take_while(|c| c.is_whitespace()).count();
        let mut scanner = Scanner {
            chars: &chars,
            pos: indent,
            line: self.line_number,
        };
        scanner.skip_whitespace();
        if scanner.at_end() {
            return Ok(());
        }
        if scanner.peek() == Some('#') {
            return self.comment(&mut scanner, handler);
        }

        handler.start_line(self.line_number, indent)?;
        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                None => break,
                Some('#') => {
                    self.comment(&mut scanner, handler)?;
                    break;
                }
                Some('(') => {
                    scanner.pos += 1;
                    scanner.skip_whitespace();
                    scanner.statement(true, handler)?;
                    scanner.skip_whitespace();
                    if scanner.peek() != Some(')') {
                        return Err(scanner.error("guard is missing its closing ')'"));
                    }
                    scanner.pos += 1;
                }
                Some(')') => return Err(scanner.error("unexpected ')'")),
                Some(_) => scanner.statement(false, handler)?,
            }
        }
        handler.end_line()
    }

    fn comment<H: ReaderHandler + ?Sized>(&self, scanner: &mut Scanner<'_>, handler: &mut H) -> ParseResult<()> {
        let text: String = scanner.chars[scanner.pos + 1..].iter().collect();
        scanner.pos = scanner.chars.len();
        if self.reports_comments {
            handler.comment(&text)?;
        }
        Ok(())
    }
}

struct Scanner<'a> {
    chars: &'a [char],
    pos: usize,
    line: usize,
}

fn is_name_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ':' | '(' | ')' | '#' | '"')
}

impl Scanner<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(self.line, message)
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn statement<H: ReaderHandler + ?Sized>(&mut self, is_guard: bool, handler: &mut H) -> ParseResult<()> {
        let is_subtree_reference = self.peek() == Some('$');
        if is_subtree_reference {
            self.pos += 1;
        }
        let name = self.name();
        if name.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.error(format!("unexpected '{c}', expected a task name")),
                None => self.error("expected a task name"),
            });
        }
        handler.start_statement(&name, is_subtree_reference, is_guard)?;

        loop {
            let checkpoint = self.pos;
            self.skip_whitespace();
            if !self.peek().is_some_and(is_name_char) {
                self.pos = checkpoint;
                break;
            }
            let attribute_start = self.pos;
            let attribute = self.name();
            if self.peek() != Some(':') {
                // Next statement on the same line.
                self.pos = attribute_start;
                break;
            }
            self.pos += 1;
            self.skip_whitespace();
            let value = self.value()?;
            handler.attribute(&attribute, value)?;
        }

        if self.peek() == Some(':') {
            return Err(self.error(format!("attribute name missing before ':' in '{name}'")));
        }
        handler.end_statement()
    }

    fn value(&mut self) -> ParseResult<Value> {
        match self.peek() {
            Some('"') => {
                self.pos += 1;
                let start = self.pos;
                let mut escaped = false;
                while let Some(c) = self.peek() {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    }
                    self.pos += 1;
                }
                if self.at_end() {
                    return Err(self.error("unterminated string"));
                }
                let raw: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                unescape(&raw).map(Value::String).map_err(|message| self.error(message))
            }
            Some(c) if !c.is_whitespace() && !matches!(c, '(' | ')' | '#') => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '#'))
                {
                    self.pos += 1;
                }
                let raw: String = self.chars[start..self.pos].iter().collect();
                Ok(bare_value(raw))
            }
            _ => Err(self.error("missing attribute value")),
        }
    }
}

fn bare_value(raw: String) -> Value {
    match raw.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    let numeric_start = raw
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_start {
        if let Some(number) = parse_number(&raw) {
            return number;
        }
    }
    Value::String(raw)
}

fn parse_number(raw: &str) -> Option<Value> {
    if contains_floating_point_characters(raw) {
        let digits = raw.strip_suffix(['f', 'F', 'd', 'D']).unwrap_or(raw);
        return digits.parse().ok().map(Value::Double);
    }
    let digits = raw.strip_suffix(['l', 'L']).unwrap_or(raw);
    if let Ok(value) = digits.parse() {
        return Some(Value::Long(value));
    }
    // `5f` and `5d` are floating point literals without a fraction.
    let digits = raw.strip_suffix(['f', 'F', 'd', 'D'])?;
    digits.parse().ok().map(Value::Double)
}

fn contains_floating_point_characters(value: &str) -> bool {
    value.contains(['.', 'e', 'E'])
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid unicode escape '\\u{hex}'"))?;
                out.push(code);
            }
            Some(other) => return Err(format!("illegal escape sequence '\\{other}'")),
            None => return Err("dangling '\\' at end of string".to_string()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Statement {
        name: String,
        is_subtree_reference: bool,
        is_guard: bool,
        attributes: Vec<(String, Value)>,
    }

    #[derive(Debug, Default)]
    struct Line {
        number: usize,
        indent: usize,
        statements: Vec<Statement>,
    }

    #[derive(Debug, Default)]
    struct Recorder {
        lines: Vec<Line>,
        comments: Vec<String>,
    }

    impl Recorder {
        fn statement(&mut self) -> &mut Statement {
            self.lines
                .last_mut()
                .and_then(|line| line.statements.last_mut())
                .expect("statement started")
        }
    }

    impl ReaderHandler for Recorder {
        fn start_line(&mut self, line: usize, indent: usize) -> ParseResult<()> {
            self.lines.push(Line {
                number: line,
                indent,
                statements: Vec::new(),
            });
            Ok(())
        }

        fn start_statement(&mut self, name: &str, is_subtree_reference: bool, is_guard: bool) -> ParseResult<()> {
            let line = self.lines.last_mut().expect("line started");
            line.statements.push(Statement {
                name: name.to_string(),
                is_subtree_reference,
                is_guard,
                attributes: Vec::new(),
            });
            Ok(())
        }

        fn attribute(&mut self, name: &str, value: Value) -> ParseResult<()> {
            self.statement().attributes.push((name.to_string(), value));
            Ok(())
        }

        fn end_statement(&mut self) -> ParseResult<()> {
            Ok(())
        }

        fn end_line(&mut self) -> ParseResult<()> {
            Ok(())
        }

        fn comment(&mut self, text: &str) -> ParseResult<()> {
            self.comments.push(text.to_string());
            Ok(())
        }
    }

    fn read(text: &str) -> Recorder {
        let mut recorder = Recorder::default();
        BehaviorTreeReader::new().parse(text, &mut recorder).unwrap();
        recorder
    }

    #[test]
    fn indentation_is_reported_per_line() {
        let r = read("root\n  child1\n  child2\n");
        let indents: Vec<usize> = r.lines.iter().map(|l| l.indent).collect();
        assert_eq!(indents, [0, 2, 2]);
        assert_eq!(r.lines[1].statements[0].name, "child1");
        assert_eq!(r.lines[2].number, 3);
    }

    #[test]
    fn tabs_count_as_one_indent_unit() {
        let r = read("root\n\tchild1\n  child2\n\t\tgrandchild\n");
        let indents: Vec<usize> = r.lines.iter().map(|l| l.indent).collect();
        assert_eq!(indents, [0, 1, 2, 2]);
    }

    #[test]
    fn any_leading_whitespace_counts_toward_indent() {
        let r = read("root\n\u{c}child\n\u{a0}\u{a0}grandchild\n");
        let indents: Vec<usize> = r.lines.iter().map(|l| l.indent).collect();
        assert_eq!(indents, [0, 1, 2]);
        assert_eq!(r.lines[2].statements[0].name, "grandchild");
    }

    #[test]
    fn blank_lines_produce_no_events() {
        assert!(read("").lines.is_empty());
        assert!(read("   \n  \t\n \n").lines.is_empty());
    }

    #[test]
    fn line_number_counts_every_newline() {
        let mut reader = BehaviorTreeReader::new();
        let mut recorder = Recorder::default();
        reader
            .parse("root\n  child1\n    grandchild\n  child2\n", &mut recorder)
            .unwrap();
        assert_eq!(reader.line_number(), 5);
    }

    #[test]
    fn comments_are_reported_only_on_request() {
        let text = "# This is a comment\nroot\n  # Another comment\n  child # trailing\n";
        assert!(read(text).comments.is_empty());

        let mut recorder = Recorder::default();
        BehaviorTreeReader::with_comments(true).parse(text, &mut recorder).unwrap();
        assert_eq!(recorder.comments, [" This is a comment", " Another comment", " trailing"]);
        assert_eq!(recorder.lines.len(), 2);
        assert_eq!(recorder.lines[1].statements[0].name, "child");
    }

    #[test]
    fn attributes_and_value_classes() {
        let r = read(r#"wait seconds:5.0 times:3 name:"a \"b\"" flag:true none:null d:uniform,1,5 big:7L f:2f"#);
        let attrs = &r.lines[0].statements[0].attributes;
        assert_eq!(
            attrs,
            &[
                ("seconds".to_string(), Value::Double(5.0)),
                ("times".to_string(), Value::Long(3)),
                ("name".to_string(), Value::String("a \"b\"".into())),
                ("flag".to_string(), Value::Bool(true)),
                ("none".to_string(), Value::Null),
                ("d".to_string(), Value::String("uniform,1,5".into())),
                ("big".to_string(), Value::Long(7)),
                ("f".to_string(), Value::Double(2.0)),
            ]
        );
    }

    #[test]
    fn space_after_colon_is_allowed() {
        let r = read("wait seconds: uniform,1,5");
        assert_eq!(
            r.lines[0].statements[0].attributes,
            [("seconds".to_string(), Value::String("uniform,1,5".into()))]
        );
    }

    #[test]
    fn guards_and_subtree_references() {
        let r = read("(isHungry) (hasFood threshold:2) $eat");
        let s = &r.lines[0].statements;
        assert_eq!(s.len(), 3);
        assert!(s[0].is_guard && s[1].is_guard && !s[2].is_guard);
        assert_eq!(s[1].attributes, [("threshold".to_string(), Value::Long(2))]);
        assert_eq!(s[2].name, "eat");
        assert!(s[2].is_subtree_reference);
    }

    #[test]
    fn several_statements_on_one_line() {
        let r = read("import a:\"x\" b:\"y\"");
        assert_eq!(r.lines[0].statements.len(), 1);
        assert_eq!(r.lines[0].statements[0].attributes.len(), 2);

        let r = read("selector sequence");
        let names: Vec<&str> = r.lines[0].statements.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["selector", "sequence"]);
    }

    #[test]
    fn unescapes_quoted_strings() {
        assert_eq!(unescape("hello").unwrap(), "hello");
        assert_eq!(unescape(r#"test \"quote\""#).unwrap(), "test \"quote\"");
        assert_eq!(unescape(r"test \\ backslash").unwrap(), "test \\ backslash");
        assert_eq!(unescape(r"line1\nline2").unwrap(), "line1\nline2");
        assert_eq!(unescape(r"col1\tcol2").unwrap(), "col1\tcol2");
        assert_eq!(unescape(r"\u0041").unwrap(), "A");
        assert!(unescape(r"\q").is_err());
    }

    #[test]
    fn floating_point_detection() {
        assert!(contains_floating_point_characters("3.14"));
        assert!(contains_floating_point_characters("1.5E10"));
        assert!(contains_floating_point_characters("2.5e-3"));
        assert!(!contains_floating_point_characters("42"));
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        let mut recorder = Recorder::default();
        let err = BehaviorTreeReader::new()
            .parse("root\n  wait seconds:\"5", &mut recorder)
            .unwrap_err();
        assert_eq!(err.line(), Some(2));

        let err = BehaviorTreeReader::new()
            .parse("(guard task", &mut Recorder::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));
    }

    #[test]
    fn alternative_sources() {
        let text = "root\n  child\n";
        let chars: Vec<char> = text.chars().collect();
        let mut from_chars = Recorder::default();
        BehaviorTreeReader::new()
            .parse_chars(&chars, 0, chars.len(), &mut from_chars)
            .unwrap();
        assert_eq!(from_chars.lines.len(), 2);

        let mut from_bytes = Recorder::default();
        BehaviorTreeReader::new()
            .parse_bytes(text.as_bytes(), &mut from_bytes)
            .unwrap();
        assert_eq!(from_bytes.lines[1].statements[0].name, "child");

        let mut from_reader = Recorder::default();
        BehaviorTreeReader::new()
            .parse_reader(text.as_bytes(), &mut from_reader)
            .unwrap();
        assert_eq!(from_reader.lines.len(), 2);
    }
}
