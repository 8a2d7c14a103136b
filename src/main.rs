use roulette_bot::commands::start;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    start().await
}
