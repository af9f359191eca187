//! Constrained evaluator for `{{...}}` expressions.
//!
//! Supported: dotted/bracketed lookups from `this` (or a bare identifier,
//! read from the same scope), number/string/boolean/null/undefined
//! literals, array literals, `! -` unary, `* / %`, `+ -` (string
//! concatenation when either side is a string), `< <= > >=`, strict
//! `== === != !==`, and short-circuiting `&& ||`. `.length` works on
//! strings and arrays. Anything else is an error.

mod lexer;

use crate::failure::{Failure, Result};
use crate::value::{Value, format_number};
use lexer::{Token, tokenize};

/// Result of evaluation; `None` is JavaScript `undefined`.
pub type Operand = Option<Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Operand),
    This,
    Identifier(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Array(Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
}

/// Parse and evaluate `source` with `scope` bound to `this`.
pub fn evaluate(source: &str, scope: &Value) -> Result<Operand> {
    let expr = parse(source)?;
    eval(&expr, scope).map_err(|message| Failure::Expression {
        expression: source.to_owned(),
        message,
    })
}

pub fn parse(source: &str) -> Result<Expr> {
    let error = |message: String| Failure::Expression {
        expression: source.to_owned(),
        message,
    };
    let tokens = tokenize(source).map_err(error)?;
    let mut parser = Parser { tokens, position: 0 };
    let expr = parser.expression().map_err(error)?;
    match parser.peek() {
        Token::End => Ok(expr),
        other => Err(error(format!("unexpected token {other:?}"))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

type ParseResult = std::result::Result<Expr, String>;

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::End)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        self.position += 1;
        token
    }

    fn eat(&mut self, symbol: &str) -> bool {
        if matches!(self.peek(), Token::Symbol(found) if found == symbol) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, symbol: &str) -> std::result::Result<(), String> {
        if self.eat(symbol) {
            Ok(())
        } else {
            Err(format!("expected '{symbol}' but found {:?}", self.peek()))
        }
    }

    fn expression(&mut self) -> ParseResult {
        self.binary_level(0)
    }

    fn binary_level(&mut self, level: usize) -> ParseResult {
        const LEVELS: &[&[(&str, BinaryOp)]] = &[
            &[("||", BinaryOp::Or)],
            &[("&&", BinaryOp::And)],
            &[
                ("===", BinaryOp::Equal),
                ("==", BinaryOp::Equal),
                ("!==", BinaryOp::NotEqual),
                ("!=", BinaryOp::NotEqual),
            ],
            &[
                ("<=", BinaryOp::LessEqual),
                (">=", BinaryOp::GreaterEqual),
                ("<", BinaryOp::Less),
                (">", BinaryOp::Greater),
            ],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Subtract)],
            &[
                ("*", BinaryOp::Multiply),
                ("/", BinaryOp::Divide),
                ("%", BinaryOp::Remainder),
            ],
        ];

        let Some(operators) = LEVELS.get(level) else {
            return self.unary();
        };

        let mut left = self.binary_level(level + 1)?;
        'outer: loop {
            for (symbol, op) in operators.iter() {
                if self.eat(symbol) {
                    let right = self.binary_level(level + 1)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn unary(&mut self) -> ParseResult {
        if self.eat("!") {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat("-") {
            return Ok(Expr::Unary(UnaryOp::Negate, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> ParseResult {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                match self.advance() {
                    Token::Identifier(name) => expr = Expr::Member(Box::new(expr), name),
                    other => {
                        return Err(format!(
                            "expected property name after '.' but found {other:?}"
                        ));
                    }
                }
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> ParseResult {
        match self.advance() {
            Token::Number(number) => Ok(Expr::Literal(Some(Value::Number(number)))),
            Token::String(text) => Ok(Expr::Literal(Some(Value::String(text)))),
            Token::Identifier(name) => Ok(match name.as_str() {
                "this" => Expr::This,
                "true" => Expr::Literal(Some(Value::Bool(true))),
                "false" => Expr::Literal(Some(Value::Bool(false))),
                "null" => Expr::Literal(Some(Value::Null)),
                "undefined" => Expr::Literal(None),
                _ => Expr::Identifier(name),
            }),
            Token::Symbol(symbol) if symbol == "(" => {
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Symbol(symbol) if symbol == "[" => {
                let mut items = Vec::new();
                if !self.eat("]") {
                    loop {
                        items.push(self.expression()?);
                        if self.eat("]") {
                            break;
                        }
                        self.expect(",")?;
                    }
                }
                Ok(Expr::Array(items))
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

fn eval(expr: &Expr, scope: &Value) -> std::result::Result<Operand, String> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::This => Ok(Some(scope.clone())),
        Expr::Identifier(name) => Ok(scope.child(name).cloned()),
        Expr::Member(target, name) => member(eval(target, scope)?, name),
        Expr::Index(target, index) => {
            let target = eval(target, scope)?;
            let key = match eval(index, scope)? {
                Some(Value::String(text)) => text,
                Some(Value::Number(number)) => format_number(number),
                other => return Err(format!("unsupported index {}", describe(&other))),
            };
            member(target, &key)
        }
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, scope).map(Option::unwrap_or_default))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(|values| Some(Value::Array(values))),
        Expr::Unary(UnaryOp::Not, inner) => Ok(Some(Value::Bool(!truthy(&eval(inner, scope)?)))),
        Expr::Unary(UnaryOp::Negate, inner) => match eval(inner, scope)? {
            Some(Value::Number(number)) => Ok(Some(Value::Number(-number))),
            other => Err(format!("cannot negate {}", describe(&other))),
        },
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = eval(left, scope)?;
            if truthy(&left) { eval(right, scope) } else { Ok(left) }
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = eval(left, scope)?;
            if truthy(&left) { Ok(left) } else { eval(right, scope) }
        }
        Expr::Binary(op, left, right) => binary(*op, eval(left, scope)?, eval(right, scope)?),
    }
}

fn member(target: Operand, name: &str) -> std::result::Result<Operand, String> {
    match target {
        None => Err(format!("cannot read properties of undefined (reading '{name}')")),
        Some(Value::Null) => Err(format!("cannot read properties of null (reading '{name}')")),
        Some(Value::String(text)) if name == "length" => {
            Ok(Some(Value::Number(text.chars().count() as f64)))
        }
        Some(Value::Array(items)) if name == "length" => {
            Ok(Some(Value::Number(items.len() as f64)))
        }
        Some(value) => Ok(value.child(name).cloned()),
    }
}

fn binary(op: BinaryOp, left: Operand, right: Operand) -> std::result::Result<Operand, String> {
    let result = match (op, &left, &right) {
        (BinaryOp::Equal, _, _) => Value::Bool(left == right),
        (BinaryOp::NotEqual, _, _) => Value::Bool(left != right),
        (BinaryOp::Add, Some(Value::String(_)), _) | (BinaryOp::Add, _, Some(Value::String(_))) => {
            Value::String(format!("{}{}", text_of(&left), text_of(&right)))
        }
        (_, Some(Value::Number(a)), Some(Value::Number(b))) => match op {
            BinaryOp::Add => Value::Number(a + b),
            BinaryOp::Subtract => Value::Number(a - b),
            BinaryOp::Multiply => Value::Number(a * b),
            BinaryOp::Divide => Value::Number(a / b),
            BinaryOp::Remainder => Value::Number(a % b),
            BinaryOp::Less => Value::Bool(a < b),
            BinaryOp::LessEqual => Value::Bool(a <= b),
            BinaryOp::Greater => Value::Bool(a > b),
            BinaryOp::GreaterEqual => Value::Bool(a >= b),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Equal | BinaryOp::NotEqual => {
                return Err(format!("{op:?} is not an arithmetic operator"));
            }
        },
        (BinaryOp::Less, Some(Value::String(a)), Some(Value::String(b))) => Value::Bool(a < b),
        (BinaryOp::LessEqual, Some(Value::String(a)), Some(Value::String(b))) => {
            Value::Bool(a <= b)
        }
        (BinaryOp::Greater, Some(Value::String(a)), Some(Value::String(b))) => Value::Bool(a > b),
        (BinaryOp::GreaterEqual, Some(Value::String(a)), Some(Value::String(b))) => {
            Value::Bool(a >= b)
        }
        _ => {
            return Err(format!(
                "unsupported operands for {op:?}: {} and {}",
                describe(&left),
                describe(&right)
            ));
        }
    };
    Ok(Some(result))
}

fn truthy(operand: &Operand) -> bool {
    operand.as_ref().is_some_and(Value::is_truthy)
}

fn text_of(operand: &Operand) -> String {
    operand
        .as_ref()
        .map_or_else(|| "undefined".to_owned(), Value::to_display_string)
}

fn describe(operand: &Operand) -> &'static str {
    operand.as_ref().map_or("undefined", Value::type_name)
}
