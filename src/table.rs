use std::collections::{vec_deque, VecDeque};

use serde::Serialize;

use crate::bet::{resolve_bet, Bet, BetOutcome};
use crate::roulette::{NumberSource, RouletteError};

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("insufficient balance: have {balance}, tried to stake {amount}")]
    InsufficientBalance { balance: u64, amount: u32 },

    #[error("a bet is already on the table, spin first")]
    BetAlreadyPlaced,

    #[error("place a bet before spinning")]
    NoPendingBet,

    #[error(transparent)]
    Bet(#[from] RouletteError),
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub name: String,
    pub balance: u64,
}

impl Player {
    pub fn new(name: impl Into<String>, balance: u64) -> Self {
        Self {
            name: name.into(),
            balance,
        }
    }

    pub fn can_bet(&self, amount: u32) -> bool {
        self.balance >= u64::from(amount)
    }

    fn debit(&mut self, amount: u32) -> Result<(), TableError> {
        if !self.can_bet(amount) {
            return Err(TableError::InsufficientBalance {
                balance: self.balance,
                amount,
            });
        }
        self.balance -= u64::from(amount);
        Ok(())
    }

    fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingBet {
    pub bet: Bet,
    pub amount: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub bets_placed: u64,
    pub winning_bets: u64,
    pub total_staked: u64,
    pub total_winnings: u64,
}

impl TableStats {
    pub fn net_profit(&self) -> i64 {
        self.total_winnings as i64 - self.total_staked as i64
    }

    fn record(&mut self, outcome: &BetOutcome) {
        self.bets_placed += 1;
        self.total_staked += u64::from(outcome.amount);
        self.total_winnings += outcome.winnings;
        if outcome.won {
            self.winning_bets += 1;
        }
    }
}

/// Settled bets kept per table, oldest dropped first.
pub const HISTORY_LEN: usize = 10;

/// One player's seat: the stake is taken on placement and the payout credited
/// when the wheel is settled.
#[derive(Debug, Clone, Serialize)]
pub struct Table {
    player: Player,
    pending: Option<PendingBet>,
    history: VecDeque<BetOutcome>,
    stats: TableStats,
}

impl Table {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            pending: None,
            history: VecDeque::with_capacity(HISTORY_LEN),
            stats: TableStats::default(),
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn pending(&self) -> Option<&PendingBet> {
        self.pending.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&BetOutcome> {
        self.history.back()
    }

    /// Recent outcomes, oldest first.
    pub fn history(&self) -> vec_deque::Iter<'_, BetOutcome> {
        self.history.iter()
    }

    pub fn stats(&self) -> &TableStats {
        &self.stats
    }

    pub fn place_bet(&mut self, bet: Bet, amount: u32) -> Result<(), TableError> {
        bet.validate(amount)?;
        if self.pending.is_some() {
            return Err(TableError::BetAlreadyPlaced);
        }
        self.player.debit(amount)?;
        self.pending = Some(PendingBet { bet, amount });
        Ok(())
    }

    pub fn spin(&mut self, source: &mut impl NumberSource) -> Result<BetOutcome, TableError> {
        if self.pending.is_none() {
            return Err(TableError::NoPendingBet);
        }
        self.settle(source.next_number())
    }

    /// Settles the pending bet against a number drawn elsewhere.
    pub fn settle(&mut self, result_number: u8) -> Result<BetOutcome, TableError> {
        let pending = self.pending.ok_or(TableError::NoPendingBet)?;
        let outcome = resolve_bet(&pending.bet, pending.amount, result_number)?;

        self.pending = None;
        self.player.credit(outcome.winnings);
        self.stats.record(&outcome);
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(outcome.clone());
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roulette::{Color, Parity};
    use rand::{rngs::StdRng, SeedableRng};

    struct Fixed(Vec<u8>);

    impl NumberSource for Fixed {
        fn next_number(&mut self) -> u8 {
            self.0.remove(0)
        }
    }

    fn table(balance: u64) -> Table {
        Table::new(Player::new("alice", balance))
    }

    #[test]
    fn test_winning_spin_credits_balance() {
        let mut table = table(100);
        table.place_bet(Bet::ExactNumber(17), 10).unwrap();
        assert_eq!(table.player().balance, 90);

        let outcome = table.spin(&mut Fixed(vec![17])).unwrap();
        assert!(outcome.won);
        assert_eq!(outcome.winnings, 360);
        assert_eq!(table.player().balance, 450);
        assert!(table.pending().is_none());
        assert_eq!(table.last_outcome(), Some(&outcome));
    }

    #[test]
    fn test_losing_spin_keeps_stake() {
        let mut table = table(100);
        table.place_bet(Bet::Color(Color::Red), 25).unwrap();
        let outcome = table.spin(&mut Fixed(vec![2])).unwrap();
        assert!(!outcome.won);
        assert_eq!(outcome.profit, -25);
        assert_eq!(table.player().balance, 75);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut table = table(5);
        let err = table.place_bet(Bet::Parity(Parity::Odd), 6).unwrap_err();
        assert!(matches!(
            err,
            TableError::InsufficientBalance { balance: 5, amount: 6 }
        ));
        assert_eq!(table.player().balance, 5);
        assert!(table.pending().is_none());
    }

    #[test]
    fn test_invalid_bet_rejected_before_debit() {
        let mut table = table(100);
        let err = table.place_bet(Bet::Color(Color::Green), 10).unwrap_err();
        assert!(matches!(
            err,
            TableError::Bet(RouletteError::InvalidColorValue(_))
        ));
        assert!(matches!(
            table.place_bet(Bet::ExactNumber(3), 0),
            Err(TableError::Bet(RouletteError::InvalidAmount))
        ));
        assert_eq!(table.player().balance, 100);
    }

    #[test]
    fn test_one_bet_per_spin() {
        let mut table = table(100);
        table.place_bet(Bet::Parity(Parity::Even), 10).unwrap();
        assert!(matches!(
            table.place_bet(Bet::Parity(Parity::Odd), 10),
            Err(TableError::BetAlreadyPlaced)
        ));
        assert_eq!(table.player().balance, 90);
        assert_eq!(
            table.pending(),
            Some(&PendingBet {
                bet: Bet::Parity(Parity::Even),
                amount: 10
            })
        );
    }

    #[test]
    fn test_spin_without_bet() {
        let mut table = table(100);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(table.spin(&mut rng), Err(TableError::NoPendingBet)));
        assert!(matches!(table.settle(4), Err(TableError::NoPendingBet)));
    }

    #[test]
    fn test_settle_rejects_bad_number_and_keeps_bet() {
        let mut table = table(100);
        table.place_bet(Bet::Color(Color::Black), 10).unwrap();
        assert!(matches!(
            table.settle(37),
            Err(TableError::Bet(RouletteError::InvalidNumber(37)))
        ));
        assert!(table.pending().is_some());
        assert!(table.settle(4).unwrap().won);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut table = table(1000);
        let mut wheel = Fixed(vec![12, 0, 12]);

        table
            .place_bet(Bet::ColorAndParity(Color::Red, Parity::Even), 10)
            .unwrap();
        table.spin(&mut wheel).unwrap();
        table.place_bet(Bet::Parity(Parity::Even), 20).unwrap();
        table.spin(&mut wheel).unwrap();
        table.place_bet(Bet::NumberAndColor(12, Color::Red), 5).unwrap();
        table.spin(&mut wheel).unwrap();

        let stats = table.stats();
        assert_eq!(stats.bets_placed, 3);
        assert_eq!(stats.winning_bets, 2);
        assert_eq!(stats.total_staked, 35);
        assert_eq!(stats.total_winnings, 40 + 180);
        assert_eq!(stats.net_profit(), 185);
        assert_eq!(table.player().balance, 1185);
    }

    #[test]
    fn test_history_is_bounded_and_ordered() {
        let mut table = table(1000);
        let spins: Vec<u8> = (0..15).collect();
        let mut wheel = Fixed(spins.clone());
        for _ in &spins {
            table.place_bet(Bet::ExactNumber(3), 1).unwrap();
            table.spin(&mut wheel).unwrap();
        }

        let numbers: Vec<u8> = table.history().map(|o| o.result.number).collect();
        assert_eq!(numbers, (5..15).collect::<Vec<u8>>());
        assert_eq!(table.last_outcome().map(|o| o.result.number), Some(14));
        assert_eq!(table.stats().bets_placed, 15);
        assert_eq!(table.stats().winning_bets, 1);
    }
}
