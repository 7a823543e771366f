//! SMTP reply parsing.
//!
//! Replies are a three-digit code plus text, possibly spread over several
//! lines (`250-…` continuations terminated by a `250 …` line). The parser is
//! written against partial input: callers read line by line and retry on
//! `nom::Err::Incomplete` until the terminating line arrives.

use std::fmt::{self, Display, Formatter};

use nom::{
    branch::alt,
    bytes::streaming::{tag, take_until},
    character::streaming::one_of,
    combinator::{map, opt},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};

/// First digit of a reply code
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Severity {
    /// 2yz
    PositiveCompletion = 2,
    /// 3yz
    PositiveIntermediate = 3,
    /// 4yz
    TransientNegativeCompletion = 4,
    /// 5yz
    PermanentNegativeCompletion = 5,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Second digit of a reply code
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Category {
    /// x0z
    Syntax = 0,
    /// x1z
    Information = 1,
    /// x2z
    Connections = 2,
    /// x3z
    Unspecified3 = 3,
    /// x4z
    Unspecified4 = 4,
    /// x5z
    MailSystem = 5,
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// A typed three-digit SMTP reply code
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Code {
    pub severity: Severity,
    pub category: Category,
    pub detail: u8,
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}{}{}", self.severity, self.category, self.detail)
    }
}

impl Code {
    pub fn new(severity: Severity, category: Category, detail: u8) -> Code {
        Code {
            severity,
            category,
            detail,
        }
    }

    /// The numeric value, e.g. 250
    pub fn value(self) -> u16 {
        self.severity as u16 * 100 + self.category as u16 * 10 + u16::from(self.detail)
    }
}

/// A complete server reply: code plus the text of every received line
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Response {
    pub code: Code,
    /// Line contents without their code prefixes
    pub message: Vec<String>,
}

impl Response {
    pub fn new(code: Code, message: Vec<String>) -> Response {
        Response { code, message }
    }

    /// Tells if the response is 2yz or 3yz
    pub fn is_positive(&self) -> bool {
        matches!(
            self.code.severity,
            Severity::PositiveCompletion | Severity::PositiveIntermediate
        )
    }

    /// Tests code equality against a numeric value
    pub fn has_code(&self, code: u16) -> bool {
        self.code.value() == code
    }

    /// Returns the first line of the message, if any
    pub fn first_line(&self) -> Option<&str> {
        self.message.first().map(String::as_str)
    }

    /// Reconstructs the reply as wire-shaped lines, for transcripts
    pub fn lines(&self) -> Vec<String> {
        if self.message.is_empty() {
            return vec![self.code.to_string()];
        }
        let last = self.message.len() - 1;
        self.message
            .iter()
            .enumerate()
            .map(|(index, text)| {
                if index < last {
                    format!("{}-{}", self.code, text)
                } else {
                    format!("{} {}", self.code, text)
                }
            })
            .collect()
    }
}

fn parse_severity(i: &str) -> IResult<&str, Severity> {
    alt((
        map(tag("2"), |_| Severity::PositiveCompletion),
        map(tag("3"), |_| Severity::PositiveIntermediate),
        map(tag("4"), |_| Severity::TransientNegativeCompletion),
        map(tag("5"), |_| Severity::PermanentNegativeCompletion),
    ))(i)
}

fn parse_category(i: &str) -> IResult<&str, Category> {
    alt((
        map(tag("0"), |_| Category::Syntax),
        map(tag("1"), |_| Category::Information),
        map(tag("2"), |_| Category::Connections),
        map(tag("3"), |_| Category::Unspecified3),
        map(tag("4"), |_| Category::Unspecified4),
        map(tag("5"), |_| Category::MailSystem),
    ))(i)
}

fn parse_code(i: &str) -> IResult<&str, Code> {
    let (i, severity) = parse_severity(i)?;
    let (i, category) = parse_category(i)?;
    let (i, detail) = map(one_of("0123456789"), |c| c as u8 - b'0')(i)?;
    Ok((i, Code::new(severity, category, detail)))
}

/// Parses a full reply, continuation lines included. Returns
/// `nom::Err::Incomplete` while the terminating line has not been seen.
pub fn parse_response(i: &str) -> IResult<&str, Response> {
    map(
        tuple((
            many0(tuple((
                parse_code,
                preceded(tag("-"), take_until("\r\n")),
                tag("\r\n"),
            ))),
            tuple((
                parse_code,
                opt(preceded(tag(" "), take_until("\r\n"))),
                tag("\r\n"),
            )),
        )),
        |(continuations, (code, last, _))| {
            let mut message: Vec<String> = continuations
                .into_iter()
                .map(|(_, text, _)| text.to_string())
                .collect();
            if let Some(last) = last {
                message.push(last.to_string());
            }
            Response::new(code, message)
        },
    )(i)
}
