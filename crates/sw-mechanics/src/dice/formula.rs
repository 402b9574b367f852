//! Dice formula parsing and evaluation.
//!
//! Grammar (whitespace ignored):
//!
//! ```text
//! formula := ['+' | '-'] term (('+' | '-') term)*
//! term    := [N] 'd' S ['kh' [K]]   -- roll N dice of S sides, keep highest K
//!          | N                      -- integer constant
//!          | '@' name               -- binding substituted at evaluation
//! ```
//!
//! The lexer is generated with `logos`; the parser is a single pass over the
//! token stream.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use logos::Logos;

use super::roll::{DieResult, RollResult};
use super::roller::DiceRoller;
use super::Die;

/// Upper bound on dice in one pool term.
pub const MAX_DICE: u32 = 100;

/// Errors raised while parsing or evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    /// The formula has no terms.
    #[error("empty dice formula")]
    Empty,

    /// The lexer hit a character outside the grammar.
    #[error("unexpected character {found:?} at {position}")]
    UnexpectedCharacter {
        /// Byte offset.
        position: usize,
        /// The offending text.
        found: String,
    },

    /// A token appeared where the grammar does not allow it.
    #[error("unexpected {found} at {position}")]
    UnexpectedToken {
        /// Byte offset.
        position: usize,
        /// The offending token.
        found: String,
    },

    /// The formula ended in the middle of a term.
    #[error("formula ended unexpectedly")]
    UnexpectedEnd,

    /// A pool term is malformed (bad sides or keep count).
    #[error("invalid dice: {0}")]
    InvalidDice(String),

    /// A pool term asks for more than [`MAX_DICE`] dice.
    #[error("too many dice: {0}")]
    TooManyDice(u32),

    /// A number does not fit.
    #[error("number too large: {0}")]
    NumberTooLarge(String),

    /// A binding referenced by the formula was not supplied.
    #[error("unknown binding @{0}")]
    UnknownBinding(String),

    /// The total does not fit in an `i32`.
    #[error("formula total overflowed")]
    Overflow,
}

/// Raw tokens produced by logos.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[regex(r"[0-9]+")]
    Number,

    #[token("d")]
    #[token("D")]
    Dice,

    #[token("kh")]
    KeepHigh,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    Binding,
}

/// Owned tokens with parsed payloads.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(u32),
    Dice,
    KeepHigh,
    Plus,
    Minus,
    Binding(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{n}"),
            Token::Dice => write!(f, "'d'"),
            Token::KeepHigh => write!(f, "'kh'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Binding(name) => write!(f, "@{name}"),
        }
    }
}

fn lex(source: &str) -> Result<Vec<(Token, usize)>, DiceError> {
    let mut tokens = Vec::new();

    for (result, span) in RawToken::lexer(source).spanned() {
        let slice = &source[span.clone()];
        let token = match result {
            Ok(RawToken::Number) => Token::Number(
                slice
                    .parse()
                    .map_err(|_| DiceError::NumberTooLarge(slice.to_string()))?,
            ),
            Ok(RawToken::Dice) => Token::Dice,
            Ok(RawToken::KeepHigh) => Token::KeepHigh,
            Ok(RawToken::Plus) => Token::Plus,
            Ok(RawToken::Minus) => Token::Minus,
            Ok(RawToken::Binding) => Token::Binding(slice[1..].to_string()),
            Err(()) => {
                return Err(DiceError::UnexpectedCharacter {
                    position: span.start,
                    found: slice.to_string(),
                });
            }
        };
        tokens.push((token, span.start));
    }

    Ok(tokens)
}

/// Whether a term is added or subtracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Added to the total.
    Plus,
    /// Subtracted from the total.
    Minus,
}

impl Sign {
    fn apply(self, value: i64) -> i64 {
        match self {
            Self::Plus => value,
            Self::Minus => -value,
        }
    }
}

/// One term of a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Roll `count` dice, summing the highest `keep` (all when `None`).
    Dice {
        /// Number of dice rolled.
        count: u32,
        /// Die type.
        die: Die,
        /// How many of the highest dice count.
        keep: Option<u32>,
    },
    /// A fixed number.
    Constant(i32),
    /// A named value supplied at evaluation time.
    Binding(String),
}

impl Term {
    /// A constant term.
    pub fn constant(value: i32) -> Self {
        Self::Constant(value)
    }

    /// A binding term.
    pub fn binding(name: impl Into<String>) -> Self {
        Self::Binding(name.into())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Dice { count, die, keep } => {
                write!(f, "{count}{die}")?;
                match keep {
                    Some(1) => write!(f, "kh"),
                    Some(k) => write!(f, "kh{k}"),
                    None => Ok(()),
                }
            }
            Term::Constant(n) => write!(f, "{n}"),
            Term::Binding(name) => write!(f, "@{name}"),
        }
    }
}

/// Named numeric values referenced by `@name` terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(BTreeMap<String, i32>);

impl Bindings {
    /// No bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: bind `name` to `value`.
    pub fn with(mut self, name: impl Into<String>, value: i32) -> Self {
        self.set(name, value);
        self
    }

    /// Bind `name` to `value`.
    pub fn set(&mut self, name: impl Into<String>, value: i32) {
        self.0.insert(name.into(), value);
    }

    /// The value bound to `name`.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.0.get(name).copied()
    }
}

/// A parsed dice formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceFormula {
    terms: Vec<(Sign, Term)>,
}

impl DiceFormula {
    /// Parse a formula string.
    pub fn parse(source: &str) -> Result<Self, DiceError> {
        let tokens = lex(source)?;
        if tokens.is_empty() {
            return Err(DiceError::Empty);
        }

        let mut parser = Parser { tokens, pos: 0 };
        let mut terms = Vec::new();
        while !parser.at_end() {
            let sign = match parser.peek() {
                Some(Token::Plus) => {
                    parser.pos += 1;
                    Sign::Plus
                }
                Some(Token::Minus) => {
                    parser.pos += 1;
                    Sign::Minus
                }
                _ if terms.is_empty() => Sign::Plus,
                _ => return Err(parser.unexpected()),
            };
            terms.push((sign, parser.term()?));
        }

        Ok(Self { terms })
    }

    /// The signed terms in order.
    pub fn terms(&self) -> &[(Sign, Term)] {
        &self.terms
    }

    /// Builder: append an added term.
    pub fn plus(mut self, term: Term) -> Self {
        self.terms.push((Sign::Plus, term));
        self
    }

    /// Builder: append a subtracted term.
    pub fn minus(mut self, term: Term) -> Self {
        self.terms.push((Sign::Minus, term));
        self
    }

    /// Names of every binding the formula references.
    pub fn binding_names(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|(_, term)| match term {
            Term::Binding(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Fails with the first binding the formula references but `bindings`
    /// does not supply.
    pub fn check_bindings(&self, bindings: &Bindings) -> Result<(), DiceError> {
        match self.binding_names().find(|n| bindings.get(n).is_none()) {
            Some(missing) => Err(DiceError::UnknownBinding(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Roll the formula. Bindings are checked before any die is rolled.
    pub fn evaluate(
        &self,
        bindings: &Bindings,
        roller: &mut impl DiceRoller,
    ) -> Result<RollResult, DiceError> {
        self.check_bindings(bindings)?;

        let mut dice = Vec::new();
        let mut total: i64 = 0;
        for (sign, term) in &self.terms {
            let value = match term {
                Term::Dice { count, die, keep } => {
                    let rolled = roll_pool(*count, *die, *keep, roller);
                    let sum: i64 = rolled
                        .iter()
                        .filter(|d| d.kept)
                        .map(|d| i64::from(d.value))
                        .sum();
                    dice.extend(rolled);
                    sum
                }
                Term::Constant(n) => i64::from(*n),
                Term::Binding(name) => {
                    let bound = bindings
                        .get(name)
                        .ok_or_else(|| DiceError::UnknownBinding(name.clone()))?;
                    i64::from(bound)
                }
            };
            total += sign.apply(value);
        }

        Ok(RollResult {
            formula: self.to_string(),
            dice,
            total: i32::try_from(total).map_err(|_| DiceError::Overflow)?,
        })
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (sign, term)) in self.terms.iter().enumerate() {
            match (i, sign) {
                (0, Sign::Plus) => {}
                (0, Sign::Minus) => write!(f, "-")?,
                (_, Sign::Plus) => write!(f, " + ")?,
                (_, Sign::Minus) => write!(f, " - ")?,
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Roll a pool and mark which dice survive a keep-highest. Ties keep the
/// earlier die.
fn roll_pool(
    count: u32,
    die: Die,
    keep: Option<u32>,
    roller: &mut impl DiceRoller,
) -> Vec<DieResult> {
    let mut rolled: Vec<DieResult> = (0..count)
        .map(|_| DieResult {
            die,
            value: roller.roll_die(die),
            kept: true,
        })
        .collect();

    if let Some(keep) = keep {
        let mut order: Vec<usize> = (0..rolled.len()).collect();
        order.sort_by(|&a, &b| rolled[b].value.cmp(&rolled[a].value));
        for &index in order.iter().skip(keep as usize) {
            rolled[index].kept = false;
        }
    }

    rolled
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self) -> DiceError {
        match self.tokens.get(self.pos) {
            Some((token, position)) => DiceError::UnexpectedToken {
                position: *position,
                found: token.to_string(),
            },
            None => DiceError::UnexpectedEnd,
        }
    }

    fn term(&mut self) -> Result<Term, DiceError> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                if self.peek() == Some(&Token::Dice) {
                    self.pos += 1;
                    self.dice(n)
                } else {
                    i32::try_from(n)
                        .map(Term::Constant)
                        .map_err(|_| DiceError::NumberTooLarge(n.to_string()))
                }
            }
            Some(Token::Dice) => {
                self.pos += 1;
                self.dice(1)
            }
            Some(Token::Binding(_)) => match self.next() {
                Some(Token::Binding(name)) => Ok(Term::Binding(name)),
                _ => Err(DiceError::UnexpectedEnd),
            },
            _ => Err(self.unexpected()),
        }
    }

    fn dice(&mut self, count: u32) -> Result<Term, DiceError> {
        let sides = match self.peek() {
            Some(Token::Number(n)) => *n,
            _ => return Err(self.unexpected()),
        };
        self.pos += 1;

        if count == 0 {
            return Err(DiceError::InvalidDice(format!("0d{sides}")));
        }
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice(count));
        }
        let die = Die::from_sides(sides)
            .ok_or_else(|| DiceError::InvalidDice(format!("{count}d{sides}")))?;

        let mut keep = None;
        if self.peek() == Some(&Token::KeepHigh) {
            self.pos += 1;
            let k = match self.peek() {
                Some(Token::Number(k)) => {
                    let k = *k;
                    self.pos += 1;
                    k
                }
                _ => 1,
            };
            if k == 0 || k > count {
                return Err(DiceError::InvalidDice(format!("{count}d{sides}kh{k}")));
            }
            keep = Some(k);
        }

        Ok(Term::Dice { count, die, keep })
    }
}
