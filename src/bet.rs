use std::fmt;

use serde::{Deserialize, Serialize};

use crate::roulette::{classify_number, Classification, Color, Parity, RouletteError, MAX_NUMBER};

/// Wager categories as they arrive from the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, poise::ChoiceParameter)]
#[serde(rename_all = "snake_case")]
pub enum BetKind {
    #[name = "Color (red/black)"]
    Color,
    #[name = "Even / odd"]
    #[serde(rename = "even_odd")]
    Parity,
    #[name = "Color and parity (e.g. red_even)"]
    #[serde(rename = "color_even_odd")]
    ColorAndParity,
    #[name = "Number (0-36)"]
    #[serde(rename = "specific_number")]
    ExactNumber,
    #[name = "Number and color (e.g. 17_black)"]
    #[serde(rename = "number_color")]
    NumberAndColor,
}

impl BetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BetKind::Color => "color",
            BetKind::Parity => "even_odd",
            BetKind::ColorAndParity => "color_even_odd",
            BetKind::ExactNumber => "specific_number",
            BetKind::NumberAndColor => "number_color",
        }
    }

    /// Gross return per unit staked on a win.
    pub fn payout_multiplier(self) -> u32 {
        match self {
            BetKind::Color | BetKind::Parity => 2,
            BetKind::ColorAndParity => 4,
            BetKind::ExactNumber | BetKind::NumberAndColor => 36,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bet {
    Color(Color),
    Parity(Parity),
    ColorAndParity(Color, Parity),
    ExactNumber(u8),
    NumberAndColor(u8, Color),
}

impl Bet {
    pub fn kind(&self) -> BetKind {
        match self {
            Bet::Color(_) => BetKind::Color,
            Bet::Parity(_) => BetKind::Parity,
            Bet::ColorAndParity(..) => BetKind::ColorAndParity,
            Bet::ExactNumber(_) => BetKind::ExactNumber,
            Bet::NumberAndColor(..) => BetKind::NumberAndColor,
        }
    }

    pub fn payout_multiplier(&self) -> u32 {
        self.kind().payout_multiplier()
    }

    /// Applies the placement rules to an already typed bet.
    ///
    /// Green is a valid pocket but not a valid colour wager; zero can only be
    /// backed through [`Bet::ExactNumber`] or [`Bet::NumberAndColor`].
    pub fn validate(&self, amount: u32) -> Result<(), RouletteError> {
        if amount == 0 {
            return Err(RouletteError::InvalidAmount);
        }

        match *self {
            Bet::Color(Color::Green) => Err(RouletteError::InvalidColorValue(
                Color::Green.to_string(),
            )),
            Bet::ColorAndParity(Color::Green, _) => {
                Err(RouletteError::InvalidCompositeValue(self.to_string()))
            }
            Bet::ExactNumber(n) if n > MAX_NUMBER => {
                Err(RouletteError::InvalidNumberValue(n.to_string()))
            }
            Bet::NumberAndColor(n, _) if n > MAX_NUMBER => {
                Err(RouletteError::InvalidCompositeValue(self.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn matches(&self, result: &Classification) -> bool {
        match *self {
            Bet::Color(color) => result.color == color,
            Bet::Parity(parity) => result.parity() == Some(parity),
            Bet::ColorAndParity(color, parity) => {
                result.color == color && result.parity() == Some(parity)
            }
            Bet::ExactNumber(n) => result.number == n,
            Bet::NumberAndColor(n, color) => result.number == n && result.color == color,
        }
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bet::Color(color) => write!(f, "{color}"),
            Bet::Parity(parity) => write!(f, "{parity}"),
            Bet::ColorAndParity(color, parity) => write!(f, "{color}_{parity}"),
            Bet::ExactNumber(n) => write!(f, "{n}"),
            Bet::NumberAndColor(n, color) => write!(f, "{n}_{color}"),
        }
    }
}

fn parse_pocket(token: &str) -> Option<u8> {
    token.parse::<u8>().ok().filter(|n| *n <= MAX_NUMBER)
}

/// Splits a compound `a_b` value into exactly two tokens.
fn split_pair(value: &str) -> Option<(&str, &str)> {
    let mut tokens = value.split('_');
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(first), Some(second), None) => Some((first, second)),
        _ => None,
    }
}

/// Checks a raw bet and turns it into a typed [`Bet`].
pub fn validate_bet(kind: BetKind, value: &str, amount: u32) -> Result<Bet, RouletteError> {
    if amount == 0 {
        return Err(RouletteError::InvalidAmount);
    }

    let composite = || RouletteError::InvalidCompositeValue(value.to_string());

    let bet = match kind {
        BetKind::Color => match value.parse::<Color>()? {
            Color::Green => return Err(RouletteError::InvalidColorValue(value.to_string())),
            color => Bet::Color(color),
        },
        BetKind::Parity => Bet::Parity(value.parse::<Parity>()?),
        BetKind::ColorAndParity => {
            let (color, parity) = split_pair(value).ok_or_else(composite)?;
            let color = match color.parse::<Color>() {
                Ok(Color::Green) | Err(_) => return Err(composite()),
                Ok(color) => color,
            };
            let parity = parity.parse::<Parity>().map_err(|_| composite())?;
            Bet::ColorAndParity(color, parity)
        }
        BetKind::ExactNumber => Bet::ExactNumber(
            parse_pocket(value)
                .ok_or_else(|| RouletteError::InvalidNumberValue(value.to_string()))?,
        ),
        BetKind::NumberAndColor => {
            let (number, color) = split_pair(value).ok_or_else(composite)?;
            let number = parse_pocket(number).ok_or_else(composite)?;
            let color = color.parse::<Color>().map_err(|_| composite())?;
            Bet::NumberAndColor(number, color)
        }
    };

    Ok(bet)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetOutcome {
    pub bet: Bet,
    pub amount: u32,
    pub won: bool,
    pub payout_multiplier: u32,
    pub winnings: u64,
    pub profit: i64,
    pub result: Classification,
}

/// Settles `bet` against the pocket that came up.
pub fn resolve_bet(bet: &Bet, amount: u32, result_number: u8) -> Result<BetOutcome, RouletteError> {
    bet.validate(amount)?;
    let result = classify_number(result_number)?;

    let won = bet.matches(&result);
    let payout_multiplier = if won { bet.payout_multiplier() } else { 0 };
    let winnings = u64::from(amount) * u64::from(payout_multiplier);

    Ok(BetOutcome {
        bet: *bet,
        amount,
        won,
        payout_multiplier,
        winnings,
        profit: winnings as i64 - i64::from(amount),
        result,
    })
}
