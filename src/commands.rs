use anyhow::{Context as _, Result};
use dotenv::dotenv;
use log::{debug, info, warn};
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};
use serenity::builder::CreateMessage;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::bet::{validate_bet, BetKind, BetOutcome};
use crate::roulette::generate_winning_number;
use crate::table::{Player, Table, TableError, TableStats};

type Context<'a> = poise::Context<'a, Data, anyhow::Error>;

pub struct Data {
    pub config: Arc<RwLock<ConfigData>>,
    // One table per player; the write lock orders each player's bet and spin.
    pub tables: RwLock<HashMap<serenity::UserId, Table>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigData {
    pub log_channel: Option<u64>,
    pub starting_balance: u64,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            log_channel: None,
            starting_balance: 1000,
        }
    }
}

const CONFIG_FILE: &str = "bot_config.json";

impl ConfigData {
    async fn load() -> Result<Self> {
        if Path::new(CONFIG_FILE).exists() {
            let content = fs::read_to_string(CONFIG_FILE).await?;
            serde_json::from_str(&content).with_context(|| format!("parsing {CONFIG_FILE}"))
        } else {
            Ok(ConfigData::default())
        }
    }

    async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(CONFIG_FILE, content).await?;
        debug!("saved {CONFIG_FILE}");
        Ok(())
    }
}

impl Data {
    async fn new() -> Result<Self> {
        let config = ConfigData::load().await?;
        info!(
            "starting balance {}, log channel {:?}",
            config.starting_balance, config.log_channel
        );
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            tables: RwLock::new(HashMap::new()),
        })
    }

    async fn save_config(&self) -> Result<()> {
        let config = self.config.read().await;
        config.save().await
    }
}

fn describe_outcome(outcome: &BetOutcome) -> String {
    if outcome.won {
        format!(
            "The ball lands on {}. Your {} bet wins x{}: {} back, profit {}.",
            outcome.result, outcome.bet, outcome.payout_multiplier, outcome.winnings, outcome.profit
        )
    } else {
        format!(
            "The ball lands on {}. Your {} bet loses {}.",
            outcome.result, outcome.bet, outcome.amount
        )
    }
}

fn describe_stats(player: &Player, stats: &TableStats) -> String {
    format!(
        "{}: balance {}, {} bets ({} won), staked {}, paid out {}, net {}",
        player.name,
        player.balance,
        stats.bets_placed,
        stats.winning_bets,
        stats.total_staked,
        stats.total_winnings,
        stats.net_profit()
    )
}

/// Newest spin first.
fn describe_history<'a>(history: impl DoubleEndedIterator<Item = &'a BetOutcome>) -> String {
    history
        .rev()
        .enumerate()
        .map(|(i, outcome)| {
            format!(
                "\n{}. {}: {} on {}, {:+}",
                i + 1,
                outcome.result,
                outcome.amount,
                outcome.bet,
                outcome.profit
            )
        })
        .collect()
}

const NO_TABLE: &str = "You have no seat yet, use /join first.";

/// Takes a seat at the roulette table
#[poise::command(slash_command)]
async fn join(ctx: Context<'_>) -> Result<()> {
    let starting_balance = ctx.data().config.read().await.starting_balance;
    let author = ctx.author();

    let response = {
        let mut tables = ctx.data().tables.write().await;
        match tables.get(&author.id) {
            Some(table) => format!(
                "Welcome back {}! Your balance is {}.",
                author.name,
                table.player().balance
            ),
            None => {
                tables.insert(
                    author.id,
                    Table::new(Player::new(author.name.clone(), starting_balance)),
                );
                info!("{} ({}) joined with {}", author.name, author.id, starting_balance);
                format!("Welcome {}! Your starting balance is {}.", author.name, starting_balance)
            }
        }
    };

    ctx.say(response).await?;
    Ok(())
}

/// Shows your current balance
#[poise::command(slash_command)]
async fn balance(ctx: Context<'_>) -> Result<()> {
    let response = match ctx.data().tables.read().await.get(&ctx.author().id) {
        Some(table) => match table.pending() {
            Some(pending) => format!(
                "Balance {} with {} staked on {}.",
                table.player().balance,
                pending.amount,
                pending.bet
            ),
            None => format!("Balance {}.", table.player().balance),
        },
        None => NO_TABLE.to_string(),
    };
    ctx.say(response).await?;
    Ok(())
}

/// Places a bet for the next spin
#[poise::command(slash_command)]
async fn bet(
    ctx: Context<'_>,
    #[description = "What you are betting on"] kind: BetKind,
    #[description = "red, even, red_even, 17 or 17_black"] value: String,
    #[description = "Stake"]
    #[min = 1]
    amount: u32,
) -> Result<()> {
    let placed = {
        let mut tables = ctx.data().tables.write().await;
        tables.get_mut(&ctx.author().id).map(|table| {
            let bet = validate_bet(kind, &value, amount)?;
            table.place_bet(bet, amount)?;
            Ok::<_, TableError>((bet, table.player().balance))
        })
    };

    let response = match placed {
        Some(Ok((bet, balance))) => {
            debug!("{} staked {} on {}", ctx.author().name, amount, bet);
            format!("Bet placed: {amount} on {bet}. Balance {balance}.")
        }
        Some(Err(why)) => format!("Bet rejected: {why}"),
        None => NO_TABLE.to_string(),
    };
    ctx.say(response).await?;
    Ok(())
}

/// Spins the wheel and settles your bet
#[poise::command(slash_command)]
async fn spin(ctx: Context<'_>) -> Result<()> {
    let author = ctx.author();
    let settled = {
        let mut tables = ctx.data().tables.write().await;
        tables
            .get_mut(&author.id)
            .map(|table| {
                table
                    .settle(generate_winning_number())
                    .map(|outcome| (outcome, table.player().balance))
            })
    };

    let (outcome, balance) = match settled {
        Some(Ok(settled)) => settled,
        Some(Err(why)) => {
            ctx.say(format!("Cannot spin: {why}")).await?;
            return Ok(());
        }
        None => {
            ctx.say(NO_TABLE).await?;
            return Ok(());
        }
    };

    info!(
        "{} spun {}: won={} profit={}",
        author.name, outcome.result, outcome.won, outcome.profit
    );
    ctx.say(format!("{} Balance {}.", describe_outcome(&outcome), balance))
        .await?;

    let log_channel = ctx.data().config.read().await.log_channel;
    if let Some(log_channel_id) = log_channel {
        let content = format!(
            "{} (ID: {}): {}",
            author.name,
            author.id,
            describe_outcome(&outcome)
        );
        let channel_id = serenity::ChannelId::new(log_channel_id);
        if let Err(why) = channel_id
            .send_message(
                &ctx.serenity_context().http,
                CreateMessage::new().content(content),
            )
            .await
        {
            warn!("could not post spin to log channel {log_channel_id}: {why:?}");
        }
    }

    Ok(())
}

/// Shows your betting history
#[poise::command(slash_command)]
async fn stats(ctx: Context<'_>) -> Result<()> {
    let response = match ctx.data().tables.read().await.get(&ctx.author().id) {
        Some(table) => {
            let mut response = describe_stats(table.player(), table.stats());
            response.push_str(&describe_history(table.history()));
            response
        }
        None => NO_TABLE.to_string(),
    };
    ctx.say(response).await?;
    Ok(())
}

#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
async fn set_log_channel(
    ctx: poise::ApplicationContext<'_, Data, anyhow::Error>,
    #[description = "Channel to post spin results"] channel: serenity::Channel,
) -> Result<()> {
    if let serenity::Channel::Guild(channel) = channel {
        let mut config = ctx.data().config.write().await;
        config.log_channel = Some(channel.id.get());
        drop(config); // Release the lock before saving
        ctx.data().save_config().await?;
        ctx.say(format!("Spin results will be posted to {}", channel.name))
            .await?;
    } else {
        ctx.say("Please provide a valid guild text channel.")
            .await?;
    }
    Ok(())
}

async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, anyhow::Error>,
    _data: &Data,
) -> Result<()> {
    if let serenity::FullEvent::Ready { data_about_bot, .. } = event {
        info!("Logged in as {}", data_about_bot.user.name);
    }
    Ok(())
}

pub async fn start() -> Result<()> {
    dotenv().ok();
    let token = std::env::var("DISCORD_TOKEN").context("missing DISCORD_TOKEN")?;
    let intents = serenity::GatewayIntents::non_privileged();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                join(),
                balance(),
                bet(),
                spin(),
                stats(),
                set_log_channel(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Data::new().await
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}
