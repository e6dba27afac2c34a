//! CSS selector to XPath 1.0 translation
//!
//! Produces expressions in the style of the generic `cssselect` translator:
//! every selector of a group is anchored with `descendant-or-self::` so the
//! context node itself can match, and groups are joined with ` | `.
//!
//! Supported syntax:
//!
//! - type selectors and `*`
//! - `#id` and `.class`
//! - attribute selectors `[a]`, `[a=v]`, `[a~=v]`, `[a|=v]`, `[a^=v]`,
//!   `[a$=v]`, `[a*=v]` and `[a!=v]`
//! - descendant, child (`>`), adjacent (`+`) and sibling (`~`) combinators
//! - `:first-child`, `:last-child`, `:only-child`, `:first-of-type`,
//!   `:last-of-type`, `:only-of-type`, `:empty`, `:root`
//! - `:nth-child()`, `:nth-last-child()`, `:nth-of-type()`,
//!   `:nth-last-of-type()`, `:not()` and `:contains()`
//!
//! Pseudo-elements and any other pseudo-class are rejected.

use crate::error::CssSyntaxError;

/// Translate a CSS selector group into an equivalent XPath expression
///
/// # Examples
///
/// ```
/// use data_extractor::css_to_xpath;
///
/// assert_eq!(
///     css_to_xpath("ul > li").unwrap(),
///     "descendant-or-self::ul/li"
/// );
/// ```
pub fn css_to_xpath(css: &str) -> Result<String, CssSyntaxError> {
    let mut parser = Parser::new(css);
    let selectors = parser.parse_group()?;
    Ok(selectors
        .iter()
        .map(|path| format!("descendant-or-self::{path}"))
        .collect::<Vec<_>>()
        .join(" | "))
}

/// Quote a string as an XPath literal
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{part}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// A type or universal selector followed by its conditions
struct Compound {
    element: String,
    conditions: Vec<String>,
}

impl Compound {
    /// Location step form: `div[cond][cond]`
    fn step(&self) -> String {
        let mut step = self.element.clone();
        for condition in &self.conditions {
            step.push('[');
            step.push_str(condition);
            step.push(']');
        }
        step
    }

    /// Boolean form used inside `:not()`
    fn predicate(&self) -> String {
        let mut parts = Vec::new();
        if self.element != "*" {
            parts.push(format!("self::{}", self.element));
        }
        parts.extend(self.conditions.iter().map(|condition| format!("({condition})")));
        if parts.is_empty() {
            "true()".to_string()
        } else {
            parts.join(" and ")
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(css: &str) -> Self {
        Self {
            chars: css.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> CssSyntaxError {
        CssSyntaxError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), CssSyntaxError> {
        match self.peek() {
            Some(found) if found == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(self.error(format!("expected {expected:?}, found {found:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of selector"))),
        }
    }

    fn parse_group(&mut self) -> Result<Vec<String>, CssSyntaxError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_selector()?);
            self.skip_whitespace();
            match self.peek() {
                None => return Ok(selectors),
                Some(',') => self.pos += 1,
                Some(found) => return Err(self.error(format!("unexpected {found:?}"))),
            }
        }
    }

    fn parse_selector(&mut self) -> Result<String, CssSyntaxError> {
        let mut path = self.parse_compound()?.step();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                Some(found @ ('>' | '+' | '~')) => {
                    self.pos += 1;
                    self.skip_whitespace();
                    found
                }
                None | Some(',') => break,
                Some(_) if spaced => ' ',
                Some(found) => return Err(self.error(format!("unexpected {found:?}"))),
            };

            let right = self.parse_compound()?.step();
            path = match combinator {
                '>' => format!("{path}/{right}"),
                '+' => format!("{path}/following-sibling::*[1]/self::{right}"),
                '~' => format!("{path}/following-sibling::{right}"),
                _ => format!("{path}/descendant-or-self::*/{right}"),
            };
        }
        Ok(path)
    }

    fn parse_compound(&mut self) -> Result<Compound, CssSyntaxError> {
        let start = self.pos;
        let element = match self.peek() {
            Some('*') => {
                self.pos += 1;
                "*".to_string()
            }
            Some(c) if is_ident_start(c) => self.parse_ident()?,
            _ => "*".to_string(),
        };

        let mut compound = Compound {
            element,
            conditions: Vec::new(),
        };
        loop {
            let condition = match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    let id = self.parse_ident()?;
                    format!("@id = {}", xpath_literal(&id))
                }
                Some('.') => {
                    self.pos += 1;
                    let class = self.parse_ident()?;
                    format!(
                        "@class and contains(concat(' ', normalize-space(@class), ' '), {})",
                        xpath_literal(&format!(" {class} "))
                    )
                }
                Some('[') => self.parse_attribute()?,
                Some(':') => self.parse_pseudo(&compound.element)?,
                _ => break,
            };
            compound.conditions.push(condition);
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(found) => self.error(format!("expected selector, found {found:?}")),
                None => self.error("expected selector, found end of selector"),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, CssSyntaxError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                match self.peek_at(1) {
                    Some(escaped) => {
                        ident.push(escaped);
                        self.pos += 2;
                    }
                    None => return Err(self.error("incomplete escape")),
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }

        if ident.is_empty() {
            return Err(match self.peek() {
                Some(found) => self.error(format!("expected identifier, found {found:?}")),
                None => self.error("expected identifier, found end of selector"),
            });
        }
        Ok(ident)
    }

    fn parse_string(&mut self) -> Result<String, CssSyntaxError> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected string"));
        };
        self.pos += 1;

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some('\\') => {
                    if let Some(escaped) = self.peek_at(1) {
                        value.push(escaped);
                    }
                    self.pos += 2;
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(value);
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn parse_value(&mut self) -> Result<String, CssSyntaxError> {
        match self.peek() {
            Some('"' | '\'') => self.parse_string(),
            _ => self.parse_ident(),
        }
    }

    fn parse_attribute(&mut self) -> Result<String, CssSyntaxError> {
        self.expect('[')?;
        self.skip_whitespace();
        let attr = format!("@{}", self.parse_ident()?);
        self.skip_whitespace();

        let operator = match (self.peek(), self.peek_at(1)) {
            (Some(']'), _) => {
                self.pos += 1;
                return Ok(attr);
            }
            (Some('='), _) => {
                self.pos += 1;
                '='
            }
            (Some(op @ ('~' | '|' | '^' | '$' | '*' | '!')), Some('=')) => {
                self.pos += 2;
                op
            }
            (Some(found), _) => {
                return Err(self.error(format!("expected attribute operator, found {found:?}")));
            }
            (None, _) => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        self.expect(']')?;

        let literal = xpath_literal(&value);
        Ok(match operator {
            '=' => format!("{attr} = {literal}"),
            '~' if value.is_empty() || value.contains(char::is_whitespace) => "0".to_string(),
            '~' => format!(
                "{attr} and contains(concat(' ', normalize-space({attr}), ' '), {})",
                xpath_literal(&format!(" {value} "))
            ),
            '|' => format!(
                "{attr} and ({attr} = {literal} or starts-with({attr}, {}))",
                xpath_literal(&format!("{value}-"))
            ),
            '^' | '$' | '*' if value.is_empty() => "0".to_string(),
            '^' => format!("{attr} and starts-with({attr}, {literal})"),
            '$' => format!(
                "{attr} and substring({attr}, string-length({attr})-{}) = {literal}",
                value.chars().count() - 1
            ),
            '*' => format!("{attr} and contains({attr}, {literal})"),
            _ => format!("not({attr}) or {attr} != {literal}"),
        })
    }

    fn parse_pseudo(&mut self, element: &str) -> Result<String, CssSyntaxError> {
        self.expect(':')?;
        if self.peek() == Some(':') {
            return Err(self.error("pseudo-elements are not supported"));
        }
        let name_pos = self.pos;
        let name = self.parse_ident()?.to_ascii_lowercase();

        let typed = |parser: &Self| -> Result<String, CssSyntaxError> {
            if element == "*" {
                Err(CssSyntaxError {
                    message: format!(":{name} requires an element type"),
                    position: parser.pos,
                })
            } else {
                Ok(element.to_string())
            }
        };

        if self.peek() != Some('(') {
            return Ok(match name.as_str() {
                "first-child" => "count(preceding-sibling::*) = 0".to_string(),
                "last-child" => "count(following-sibling::*) = 0".to_string(),
                "only-child" => {
                    "count(preceding-sibling::*) = 0 and count(following-sibling::*) = 0".to_string()
                }
                "first-of-type" => format!("count(preceding-sibling::{}) = 0", typed(self)?),
                "last-of-type" => format!("count(following-sibling::{}) = 0", typed(self)?),
                "only-of-type" => {
                    let element = typed(self)?;
                    format!(
                        "count(preceding-sibling::{element}) = 0 and count(following-sibling::{element}) = 0"
                    )
                }
                "empty" => "not(*) and not(string-length())".to_string(),
                "root" => "not(parent::*)".to_string(),
                "before" | "after" | "first-line" | "first-letter" => {
                    return Err(CssSyntaxError {
                        message: "pseudo-elements are not supported".to_string(),
                        position: name_pos,
                    });
                }
                _ => {
                    return Err(CssSyntaxError {
                        message: format!("unsupported pseudo-class :{name}"),
                        position: name_pos,
                    });
                }
            });
        }

        self.expect('(')?;
        self.skip_whitespace();
        let condition = match name.as_str() {
            "nth-child" => nth_condition(self.parse_nth()?, "count(preceding-sibling::*)"),
            "nth-last-child" => nth_condition(self.parse_nth()?, "count(following-sibling::*)"),
            "nth-of-type" => {
                let count = format!("count(preceding-sibling::{})", typed(self)?);
                nth_condition(self.parse_nth()?, &count)
            }
            "nth-last-of-type" => {
                let count = format!("count(following-sibling::{})", typed(self)?);
                nth_condition(self.parse_nth()?, &count)
            }
            "not" => format!("not({})", self.parse_compound()?.predicate()),
            "contains" => format!("contains(string(.), {})", xpath_literal(&self.parse_value()?)),
            _ => {
                return Err(CssSyntaxError {
                    message: format!("unsupported pseudo-class :{name}()"),
                    position: name_pos,
                });
            }
        };
        self.skip_whitespace();
        self.expect(')')?;
        Ok(condition)
    }

    /// Parse an `an+b` argument, `odd` or `even`
    fn parse_nth(&mut self) -> Result<(i64, i64), CssSyntaxError> {
        let start = self.pos;
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c == ')' {
                break;
            }
            if !c.is_whitespace() {
                raw.push(c.to_ascii_lowercase());
            }
            self.pos += 1;
        }

        let invalid = || CssSyntaxError {
            message: format!("invalid nth argument {raw:?}"),
            position: start,
        };
        let number = |text: &str| text.parse::<i64>().map_err(|_| invalid());

        match raw.as_str() {
            "odd" => Ok((2, 1)),
            "even" => Ok((2, 0)),
            _ => match raw.split_once('n') {
                Some((a, b)) => {
                    let a = match a {
                        "" | "+" => 1,
                        "-" => -1,
                        other => number(other)?,
                    };
                    let b = if b.is_empty() { 0 } else { number(b)? };
                    Ok((a, b))
                }
                None => Ok((0, number(&raw)?)),
            },
        }
    }
}

/// Condition selecting positions `a*k + b` (k >= 0), given the XPath
/// expression counting the siblings before the node
fn nth_condition((a, b): (i64, i64), count: &str) -> String {
    let offset = b - 1;
    if a == 0 {
        return format!("{count} = {offset}");
    }

    let shifted = match offset {
        0 => count.to_string(),
        offset if offset > 0 => format!("{count} - {offset}"),
        offset => format!("{count} + {}", -offset),
    };

    let mut parts = Vec::new();
    if a > 0 {
        if offset > 0 {
            parts.push(format!("{count} >= {offset}"));
        }
        if a > 1 {
            parts.push(format!("({shifted}) mod {a} = 0"));
        }
    } else {
        parts.push(format!("{count} <= {offset}"));
        if a < -1 {
            parts.push(format!("({shifted}) mod {} = 0", -a));
        }
    }

    if parts.is_empty() {
        "true()".to_string()
    } else {
        parts.join(" and ")
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
