use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Highest number on a single-zero wheel.
pub const MAX_NUMBER: u8 = 36;

const RED_NUMBERS: [u8; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];
const BLACK_NUMBERS: [u8; 18] = [
    2, 4, 6, 8, 10, 11, 13, 15, 17, 20, 22, 24, 26, 28, 29, 31, 33, 35,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouletteError {
    #[error("{0} is not on the wheel (0-36)")]
    InvalidNumber(u8),

    #[error("bet amount must be greater than 0")]
    InvalidAmount,

    #[error("color must be \"red\" or \"black\", got \"{0}\"")]
    InvalidColorValue(String),

    #[error("parity must be \"even\" or \"odd\", got \"{0}\"")]
    InvalidParityValue(String),

    #[error("malformed compound bet \"{0}\"")]
    InvalidCompositeValue(String),

    #[error("number must be between 0 and 36, got \"{0}\"")]
    InvalidNumberValue(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
    Green,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Black => "black",
            Color::Green => "green",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = RouletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(Color::Red),
            "black" => Ok(Color::Black),
            "green" => Ok(Color::Green),
            other => Err(RouletteError::InvalidColorValue(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn as_str(self) -> &'static str {
        match self {
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parity {
    type Err = RouletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "even" => Ok(Parity::Even),
            "odd" => Ok(Parity::Odd),
            other => Err(RouletteError::InvalidParityValue(other.to_string())),
        }
    }
}

/// The winning pocket of a spin, with everything a bet can match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub number: u8,
    pub color: Color,
    pub is_even: bool,
    pub is_odd: bool,
}

impl Classification {
    /// Zero belongs to neither parity.
    pub fn parity(&self) -> Option<Parity> {
        match (self.is_even, self.is_odd) {
            (true, _) => Some(Parity::Even),
            (_, true) => Some(Parity::Odd),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parity() {
            Some(parity) => write!(f, "{} {} ({})", self.number, self.color, parity),
            None => write!(f, "{} {}", self.number, self.color),
        }
    }
}

pub fn classify_number(number: u8) -> Result<Classification, RouletteError> {
    let color = if number == 0 {
        Color::Green
    } else if RED_NUMBERS.contains(&number) {
        Color::Red
    } else if BLACK_NUMBERS.contains(&number) {
        Color::Black
    } else {
        return Err(RouletteError::InvalidNumber(number));
    };

    Ok(Classification {
        number,
        color,
        is_even: number != 0 && number % 2 == 0,
        is_odd: number % 2 == 1,
    })
}

/// Anything that can pick a pocket. Implementations must be uniform over 0..=36.
pub trait NumberSource {
    fn next_number(&mut self) -> u8;
}

impl<R: Rng> NumberSource for R {
    fn next_number(&mut self) -> u8 {
        // gen_range rejects out-of-zone samples, so there is no modulo bias.
        self.gen_range(0..=MAX_NUMBER)
    }
}

pub fn generate_winning_number() -> u8 {
    rand::thread_rng().next_number()
}

pub fn spin(source: &mut impl NumberSource) -> Result<Classification, RouletteError> {
    classify_number(source.next_number())
}
