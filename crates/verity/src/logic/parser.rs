//! Parser for the clause language.
//!
//! This grammar is a stable contract: LLM-generated text targets it directly.
//!
//! ```text
//! program   ::= { clause }
//! clause    ::= goal "." | goal ":-" goal { "," goal } "."
//! goal      ::= name [ "(" term { "," term } ")" ]
//! term      ::= variable | atom | number
//! variable  ::= (Uppercase | "_") { alnum | "_" }
//! atom      ::= lowercase { alnum | "_" } | "'" { char | "''" } "'"
//! number    ::= [ "-" ] digit { digit }
//! ```
//!
//! `%` starts a comment that runs to the end of the line. A lone `_` is an
//! anonymous variable; each occurrence is distinct.
//!
//! Statements are split on `.` before parsing, so a malformed clause is
//! reported with its position and parsing resumes at the next statement.

use super::clause::Clause;
use super::term::{Goal, Term};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, cut, map, map_res, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use std::fmt;

/// A malformed statement, located by 1-based line and column
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub statement: String,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {}: {} in `{}`",
            self.line, self.column, self.message, self.statement
        )
    }
}

impl std::error::Error for ParseError {}

/// Clauses parsed from a program text together with every statement that
/// failed to parse
#[derive(Debug, Clone, Default)]
pub struct ParsedProgram {
    pub clauses: Vec<Clause>,
    pub errors: Vec<ParseError>,
}

/// A statement slice and where it starts in the source text
struct Statement<'a> {
    text: &'a str,
    line: usize,
    column: usize,
}

/// Parse a whole program, collecting errors instead of stopping at the first
pub fn parse_program(input: &str) -> ParsedProgram {
    let cleaned = strip_comments(input);
    let (statements, unterminated) = split_statements(&cleaned);
    let mut result = ParsedProgram::default();

    for stmt in statements {
        match parse_statement(&stmt) {
            Ok(clause) => result.clauses.push(clause),
            Err(e) => result.errors.push(e),
        }
    }

    if let Some(stmt) = unterminated {
        result.errors.push(ParseError {
            line: stmt.line,
            column: stmt.column,
            statement: stmt.text.trim_end().to_string(),
            message: "missing terminating '.'".to_string(),
        });
    }

    result
}

/// Parse a query: one goal or a comma-separated conjunction.
///
/// A leading `?-` and a trailing `.` are both optional.
pub fn parse_query(input: &str) -> Result<Vec<Goal>, ParseError> {
    let cleaned = strip_comments(input);
    let mut text = cleaned.trim();
    if let Some(rest) = text.strip_prefix("?-") {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix('.') {
        text = rest.trim_end();
    }
    if text.is_empty() {
        return Err(ParseError {
            line: 1,
            column: 1,
            statement: input.trim().to_string(),
            message: "empty query".to_string(),
        });
    }

    let stmt = Statement {
        text,
        line: 1,
        column: 1,
    };
    let parsed = all_consuming(delimited(multispace0, goal_list, multispace0))(text);
    match parsed {
        Ok((_, mut goals)) => {
            let mut counter = 0;
            for goal in &mut goals {
                number_anonymous(goal, &mut counter);
            }
            Ok(goals)
        }
        Err(e) => Err(error_at(&stmt, e)),
    }
}

/// Parse a single fact, with or without the trailing `.`
pub fn parse_fact(input: &str) -> Result<Goal, ParseError> {
    let trimmed = input.trim();
    let text = if trimmed.ends_with('.') {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    };
    let stmt = Statement {
        text: &text,
        line: 1,
        column: 1,
    };
    let clause = parse_statement(&stmt)?;
    if !clause.is_fact() {
        return Err(ParseError {
            line: 1,
            column: 1,
            statement: trimmed.to_string(),
            message: "expected a fact, found a rule".to_string(),
        });
    }
    Ok(clause.head)
}

fn parse_statement(stmt: &Statement<'_>) -> Result<Clause, ParseError> {
    match all_consuming(terminated(clause, pair(multispace0, char('.'))))(stmt.text) {
        Ok((_, mut clause)) => {
            let mut counter = 0;
            number_anonymous(&mut clause.head, &mut counter);
            for goal in &mut clause.body {
                number_anonymous(goal, &mut counter);
            }
            Ok(clause)
        }
        Err(e) => Err(error_at(stmt, e)),
    }
}

/// Give each `_` its own variable name
fn number_anonymous(goal: &mut Goal, counter: &mut usize) {
    for arg in &mut goal.args {
        if matches!(arg, Term::Variable(name) if name == "_") {
            *arg = Term::anonymous(*counter);
            *counter += 1;
        }
    }
}

fn error_at(stmt: &Statement<'_>, err: nom::Err<nom::error::Error<&str>>) -> ParseError {
    let remaining = match &err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
        nom::Err::Incomplete(_) => "",
    };
    let offset = stmt.text.len() - remaining.len();
    let (line, column) = advance(stmt.line, stmt.column, &stmt.text[..offset]);

    let message = if remaining.trim().is_empty() {
        "unexpected end of clause".to_string()
    } else {
        let snippet: String = remaining.chars().take(16).collect();
        format!("unexpected input '{}'", snippet)
    };

    ParseError {
        line,
        column,
        statement: stmt.text.trim().to_string(),
        message,
    }
}

/// Position reached after reading `text` from (line, column)
fn advance(mut line: usize, mut column: usize, text: &str) -> (usize, usize) {
    for c in text.chars() {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Blank out `%` comments, keeping byte offsets and line structure intact
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_quote = false;
    let mut in_comment = false;
    for c in input.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
            } else {
                out.extend(std::iter::repeat(' ').take(c.len_utf8()));
            }
            continue;
        }
        match c {
            '\'' => in_quote = !in_quote,
            '%' if !in_quote => {
                in_comment = true;
                out.push(' ');
                continue;
            }
            '\n' => in_quote = false,
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Split on `.` outside quoted atoms; returns complete statements and any
/// unterminated trailing text
fn split_statements(input: &str) -> (Vec<Statement<'_>>, Option<Statement<'_>>) {
    let mut statements = Vec::new();
    let mut start: Option<(usize, usize, usize)> = None;
    let mut in_quote = false;
    let (mut line, mut column) = (1, 1);

    for (idx, c) in input.char_indices() {
        if start.is_none() && !c.is_whitespace() {
            start = Some((idx, line, column));
        }
        match c {
            '\'' => in_quote = !in_quote,
            '\n' => in_quote = false,
            '.' if !in_quote => {
                if let Some((begin, l, col)) = start.take() {
                    statements.push(Statement {
                        text: &input[begin..idx + 1],
                        line: l,
                        column: col,
                    });
                }
            }
            _ => {}
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    let trailing = start.map(|(begin, l, col)| Statement {
        text: &input[begin..],
        line: l,
        column: col,
    });
    (statements, trailing)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse a clause (fact or rule) without its terminating '.'
fn clause(input: &str) -> IResult<&str, Clause> {
    let (input, head) = preceded(multispace0, goal)(input)?;
    let (input, body) = opt(preceded(
        delimited(multispace0, tag(":-"), multispace0),
        goal_list,
    ))(input)?;
    let clause = match body {
        Some(body) => Clause::rule(head, body),
        None => Clause::fact(head),
    };
    Ok((input, clause))
}

fn goal_list(input: &str) -> IResult<&str, Vec<Goal>> {
    separated_list1(delimited(multispace0, char(','), multispace0), goal)(input)
}

/// Parse a goal: a predicate name with optional parenthesized arguments
fn goal(input: &str) -> IResult<&str, Goal> {
    let (input, name) = atom_name(input)?;
    // Once '(' is seen the argument list must be well formed
    let (input, args) = opt(preceded(
        pair(char('('), multispace0),
        cut(terminated(
            separated_list1(delimited(multispace0, char(','), multispace0), term),
            pair(multispace0, char(')')),
        )),
    ))(input)?;
    Ok((input, Goal::new(name, args.unwrap_or_default())))
}

fn term(input: &str) -> IResult<&str, Term> {
    alt((
        map(number, Term::Number),
        map(variable_name, |name| Term::Variable(name.to_string())),
        map(atom_name, Term::Atom),
    ))(input)
}

fn number(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

/// Parse a variable name (starts with an uppercase letter or underscore)
fn variable_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_uppercase() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}

/// Parse an atom name: a lowercase word or a single-quoted string
fn atom_name(input: &str) -> IResult<&str, String> {
    alt((
        single_quoted,
        map(
            recognize(pair(satisfy(|c| c.is_lowercase()), take_while(is_ident_char))),
            |s: &str| s.to_string(),
        ),
    ))(input)
}

/// Parse a single-quoted atom, where `''` is an escaped quote
fn single_quoted(input: &str) -> IResult<&str, String> {
    let fail = || {
        nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))
    };
    let body = input.strip_prefix('\'').ok_or_else(fail)?;

    let mut value = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                chars.next();
                value.push('\'');
            } else {
                return Ok((&body[idx + 1..], value));
            }
        } else {
            value.push(c);
        }
    }
    Err(fail())
}
