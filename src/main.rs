use anyhow::Context;
use chatdesk::config::{ClientConfig, load_dotenv};

#[cfg(not(target_arch = "wasm32"))]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(target_arch = "wasm32")]
fn init_tracing() {}

fn main() -> anyhow::Result<()> {
    load_dotenv();
    init_tracing();

    let config = ClientConfig::from_env().context("invalid chat client configuration")?;
    tracing::info!(api_base = %config.api_base, "starting chat client");

    dioxus::LaunchBuilder::new()
        .with_context(config)
        .launch(chatdesk::ui::App);
    Ok(())
}
