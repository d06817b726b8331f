//! Execution engine.
//!
//! The gateway only needs an engine that turns a [`GraphQlRequest`] into a
//! [`GraphQlResponse`]. [`StaticSchema`] is the built-in engine: a root `Query` type whose
//! fields are scalars produced by resolver closures.
//!
//! # Supported documents
//!
//! - `{ hello }` and `query [Name] [($vars...)] { hello }`
//! - several named queries in one document, selected by `operationName`
//! - aliases (`greeting: hello`) and `__typename`
//! - `#` comments and insignificant commas
//!
//! Anything else (mutations, fragments, directives, nested selections) is reported as a
//! GraphQL error in the response body, never as a transport failure.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::models::graphql::{GraphQlError, GraphQlRequest, GraphQlResponse};

/// Executes an already-authorized request.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    async fn execute(&self, request: GraphQlRequest) -> GraphQlResponse;
}

type Resolver = Arc<dyn Fn() -> Value + Send + Sync>;

/// Root `Query` type with scalar `String` fields.
#[derive(Clone, Default)]
pub struct StaticSchema {
    fields: BTreeMap<String, Resolver>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// `type Query { hello: String }`, resolving `hello` to `"world"`.
    pub fn hello_world() -> Self {
        Self::new().field("hello", || json!("world"))
    }

    /// Add a field to the `Query` type.
    pub fn field<F>(mut self, name: impl Into<String>, resolver: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.fields.insert(name.into(), Arc::new(resolver));
        self
    }

    /// Parse, validate and execute one document.
    pub fn run(&self, request: &GraphQlRequest) -> GraphQlResponse {
        let operation = match Parser::new(&request.query)
            .and_then(|mut p| p.document())
            .and_then(|operations| select_operation(operations, request.operation_name.as_deref()))
        {
            Ok(operation) => operation,
            Err(message) => return GraphQlResponse::error(message),
        };

        let mut errors = Vec::new();
        for selection in &operation.selections {
            if let Some(error) = self.validate(selection) {
                errors.push(error);
            }
        }
        if !errors.is_empty() {
            return GraphQlResponse {
                data: None,
                errors: errors
                    .into_iter()
                    .map(|message| GraphQlError { message })
                    .collect(),
            };
        }

        let mut data = Map::new();
        for selection in operation.selections {
            let value = match selection.name.as_str() {
                "__typename" => json!("Query"),
                name => self.fields.get(name).map(|resolve| resolve()).unwrap_or(Value::Null),
            };
            data.insert(selection.response_key().to_string(), value);
        }

        GraphQlResponse::data(Value::Object(data))
    }

    fn validate(&self, selection: &Selection) -> Option<String> {
        let name = selection.name.as_str();
        let ty = if name == "__typename" {
            "String!"
        } else if self.fields.contains_key(name) {
            "String"
        } else {
            return Some(format!("Cannot query field \"{name}\" on type \"Query\"."));
        };

        if let Some(argument) = &selection.first_argument {
            return Some(format!(
                "Unknown argument \"{argument}\" on field \"Query.{name}\"."
            ));
        }

        if selection.has_subselection {
            return Some(format!(
                "Field \"{name}\" must not have a selection since type \"{ty}\" has no subfields."
            ));
        }

        None
    }
}

/// Pick the operation to run: the one named `wanted`, or the only one in the document.
fn select_operation(operations: Vec<Operation>, wanted: Option<&str>) -> Result<Operation, String> {
    if operations.len() > 1 && operations.iter().any(|op| op.name.is_none()) {
        return Err("This anonymous operation must be the only defined operation.".to_string());
    }

    match wanted {
        Some(wanted) => operations
            .into_iter()
            .find(|op| op.name.as_deref() == Some(wanted))
            .ok_or_else(|| format!("Unknown operation named \"{wanted}\".")),
        None => {
            let mut operations = operations.into_iter();
            match (operations.next(), operations.next()) {
                (Some(operation), None) => Ok(operation),
                _ => Err(
                    "Must provide operation name if query contains multiple operations."
                        .to_string(),
                ),
            }
        }
    }
}

#[async_trait]
impl ExecutionEngine for StaticSchema {
    async fn execute(&self, request: GraphQlRequest) -> GraphQlResponse {
        self.run(&request)
    }
}

#[derive(Debug)]
struct Operation {
    name: Option<String>,
    selections: Vec<Selection>,
}

#[derive(Debug)]
struct Selection {
    alias: Option<String>,
    name: String,
    first_argument: Option<String>,
    has_subselection: bool,
}

impl Selection {
    fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Punct(char),
    Spread,
    Literal,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("Name \"{name}\""),
            Token::Punct(c) => format!("\"{c}\""),
            Token::Spread => "\"...\"".to_string(),
            Token::Literal => "literal".to_string(),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self, String> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn unexpected(found: Option<&Token>, expected: &str) -> String {
        match found {
            Some(token) => format!("Syntax Error: Expected {expected}, found {}.", token.describe()),
            None => format!("Syntax Error: Expected {expected}, found <EOF>."),
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), String> {
        match self.next() {
            Some(Token::Punct(found)) if found == c => Ok(()),
            other => Err(Self::unexpected(other.as_ref(), &format!("\"{c}\""))),
        }
    }

    fn expect_name(&mut self) -> Result<String, String> {
        match self.next() {
            Some(Token::Name(name)) => Ok(name),
            other => Err(Self::unexpected(other.as_ref(), "Name")),
        }
    }

    fn operation(&mut self) -> Result<Operation, String> {
        let mut name = None;

        let keyword = match self.peek() {
            Some(Token::Punct('{')) => None,
            Some(Token::Name(keyword)) => Some(keyword.clone()),
            other => return Err(Self::unexpected(other, "\"{\"")),
        };

        match keyword.as_deref() {
            None => {}
            Some("query") => {
                self.pos += 1;
                if let Some(Token::Name(_)) = self.peek() {
                    name = Some(self.expect_name()?);
                }
                if let Some(Token::Punct('(')) = self.peek() {
                    self.skip_group('(', ')')?;
                }
            }
            Some(kind @ ("mutation" | "subscription")) => {
                return Err(format!(
                    "Schema is not configured to execute {kind} operation."
                ));
            }
            Some("fragment") => return Err("Fragments are not supported.".to_string()),
            Some(_) => return Err(Self::unexpected(self.peek(), "\"{\"")),
        }

        if let Some(Token::Punct('@')) = self.peek() {
            return Err("Directives are not supported.".to_string());
        }

        let selections = self.selection_set()?;

        Ok(Operation { name, selections })
    }

    /// One or more operations, up to the end of the source.
    fn document(&mut self) -> Result<Vec<Operation>, String> {
        let mut operations = vec![self.operation()?];
        while self.peek().is_some() {
            operations.push(self.operation()?);
        }
        Ok(operations)
    }

    fn selection_set(&mut self) -> Result<Vec<Selection>, String> {
        self.expect_punct('{')?;

        let mut selections = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Punct('}')) if !selections.is_empty() => {
                    self.pos += 1;
                    return Ok(selections);
                }
                Some(Token::Spread) => return Err("Fragments are not supported.".to_string()),
                _ => selections.push(self.selection()?),
            }
        }
    }

    fn selection(&mut self) -> Result<Selection, String> {
        let mut name = self.expect_name()?;
        let mut alias = None;

        if let Some(Token::Punct(':')) = self.peek() {
            self.pos += 1;
            alias = Some(name);
            name = self.expect_name()?;
        }

        let mut first_argument = None;
        if let Some(Token::Punct('(')) = self.peek() {
            if let Some(Token::Name(argument)) = self.tokens.get(self.pos + 1) {
                first_argument = Some(argument.clone());
            }
            self.skip_group('(', ')')?;
        }

        if let Some(Token::Punct('@')) = self.peek() {
            return Err("Directives are not supported.".to_string());
        }

        let mut has_subselection = false;
        if let Some(Token::Punct('{')) = self.peek() {
            self.skip_group('{', '}')?;
            has_subselection = true;
        }

        Ok(Selection {
            alias,
            name,
            first_argument,
            has_subselection,
        })
    }

    /// Skip a balanced `open ... close` group, starting at `open`.
    fn skip_group(&mut self, open: char, close: char) -> Result<(), String> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                Some(Token::Punct(c)) if c == open => depth += 1,
                Some(Token::Punct(c)) if c == close => depth -= 1,
                Some(_) => {}
                None => return Err(Self::unexpected(None, &format!("\"{close}\""))),
            }
        }
        Ok(())
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' | ',' | '\u{feff}' => {
                chars.next();
            }
            '#' => {
                while let Some(c) = chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '{' | '}' | '(' | ')' | ':' | '$' | '!' | '=' | '@' | '[' | ']' => {
                chars.next();
                tokens.push(Token::Punct(c));
            }
            '.' => {
                for _ in 0..3 {
                    if chars.next() != Some('.') {
                        return Err("Syntax Error: Unexpected \".\".".to_string());
                    }
                }
                tokens.push(Token::Spread);
            }
            '"' => {
                chars.next();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return Err("Syntax Error: Unterminated string.".to_string());
                }
                tokens.push(Token::Literal);
            }
            c if c == '-' || c.is_ascii_digit() => {
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '.' || c == '+' || c == '-' {
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Literal);
            }
            c if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '_' || c.is_ascii_alphanumeric() {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(format!("Syntax Error: Unexpected character \"{other}\"."));
            }
        }
    }

    Ok(tokens)
}
