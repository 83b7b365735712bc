//! Canonical text form of ranges.
//!
//! ```text
//! range     := "" | dim ("," dim)*
//! dim       := ":" | list | item | composite
//! list      := "(" [item ("," item)*] ")"
//! item      := int [":" int [":" int]]
//! composite := quoted "{" [group ("," group)*] "}"
//! group     := quoted ["[" color "]"] list
//! quoted    := '"' (char | '\' char)* '"'
//! ```
//!
//! `Display` always prints lists in parentheses and the wildcard as `:`;
//! bare integers and `start:end[:step]` slices are accepted as shorthands.

use std::fmt;

use super::composite::{CompositeRange1D, Range1DGroup};
use super::dim::Range1D;
use super::Range;
use crate::error::{ViewError, ViewResult};

/// Largest number of indices a single `start:end[:step]` slice may expand to.
const MAX_SLICE_LEN: usize = 1 << 26;

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, dim) in self.dims().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{dim}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Range1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range1D::All => f.write_str(":"),
            Range1D::List(v) => write_list(f, v),
            Range1D::Composite(c) => write!(f, "{c}"),
        }
    }
}

impl fmt::Display for CompositeRange1D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_quoted(f, &self.name)?;
        f.write_str("{")?;
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write_quoted(f, &group.name)?;
            f.write_str("[")?;
            write_escaped(f, &group.color, ']')?;
            f.write_str("]")?;
            write_list(f, group.indices())?;
        }
        f.write_str("}")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, v: &[usize]) -> fmt::Result {
    f.write_str("(")?;
    for (i, index) in v.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{index}")?;
    }
    f.write_str(")")
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    write_escaped(f, s, '"')?;
    f.write_str("\"")
}

/// Write `s` with `close` and backslashes escaped by a backslash.
fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str, close: char) -> fmt::Result {
    for c in s.chars() {
        if c == close || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

pub(crate) fn parse_range(input: &str) -> ViewResult<Range> {
    let mut parser = Parser::new(input);
    parser.skip_ws();
    if parser.at_end() {
        return Ok(Range::all());
    }
    let mut dims = Vec::new();
    loop {
        dims.push(parser.dim()?);
        parser.skip_ws();
        if parser.at_end() {
            break;
        }
        parser.expect(',')?;
    }
    Ok(Range::new(dims))
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ViewError {
        ViewError::malformed(
            self.input,
            format!("{} at offset {}", reason.into(), self.pos),
        )
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> ViewResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn dim(&mut self) -> ViewResult<Range1D> {
        self.skip_ws();
        match self.peek() {
            Some(':') => {
                self.pos += 1;
                Ok(Range1D::All)
            }
            Some('(') => self.list().map(Range1D::List),
            Some('"') => self.composite().map(Range1D::Composite),
            Some(c) if c.is_ascii_digit() => {
                let mut out = Vec::new();
                self.item(&mut out)?;
                Ok(Range1D::List(out))
            }
            Some(c) => Err(self.error(format!("unexpected '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn list(&mut self) -> ViewResult<Vec<usize>> {
        self.expect('(')?;
        let mut out = Vec::new();
        if self.eat(')') {
            return Ok(out);
        }
        loop {
            self.item(&mut out)?;
            if self.eat(')') {
                return Ok(out);
            }
            self.expect(',')?;
        }
    }

    fn item(&mut self, out: &mut Vec<usize>) -> ViewResult<()> {
        let start = self.int()?;
        if !self.eat(':') {
            out.push(start);
            return Ok(());
        }
        let end = self.int()?;
        let step = if self.eat(':') { self.int()? } else { 1 };
        if step == 0 {
            return Err(self.error("slice step must be positive"));
        }
        if end < start {
            return Err(self.error(format!("slice end {end} before start {start}")));
        }
        let count = (end - start).div_ceil(step);
        if count > MAX_SLICE_LEN {
            return Err(self.error(format!("slice of {count} indices too large")));
        }
        out.try_reserve(count)
            .map_err(|_| self.error(format!("slice of {count} indices too large")))?;
        out.extend((start..end).step_by(step));
        Ok(())
    }

    fn int(&mut self) -> ViewResult<usize> {
        self.skip_ws();
        let begin = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if begin == self.pos {
            return Err(self.error("expected a non-negative integer"));
        }
        let digits: String = self.chars[begin..self.pos].iter().collect();
        digits
            .parse()
            .map_err(|_| self.error(format!("integer '{digits}' too large")))
    }

    fn quoted(&mut self) -> ViewResult<String> {
        self.expect('"')?;
        self.escaped('"', "unterminated name")
    }

    /// Text up to the unescaped `close`, which is consumed.
    fn escaped(&mut self, close: char, unterminated: &str) -> ViewResult<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error(unterminated)),
            }
        }
    }

    fn composite(&mut self) -> ViewResult<CompositeRange1D> {
        let name = self.quoted()?;
        self.expect('{')?;
        let mut groups = Vec::new();
        if self.eat('}') {
            return Ok(CompositeRange1D::new(name, groups));
        }
        loop {
            groups.push(self.group()?);
            if self.eat('}') {
                return Ok(CompositeRange1D::new(name, groups));
            }
            self.expect(',')?;
        }
    }

    fn group(&mut self) -> ViewResult<Range1DGroup> {
        self.skip_ws();
        let name = self.quoted()?;
        let color = if self.eat('[') {
            self.escaped(']', "unterminated color")?
        } else {
            super::composite::DEFAULT_COLOR.to_string()
        };
        let indices = self.list()?;
        Ok(Range1DGroup::new(name, color, indices))
    }
}
