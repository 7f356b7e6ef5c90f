use anyhow::{Context, Result};
use clap::Parser;
use hovor::chat::{ChatClient, ChatWorker};
use hovor::config::Config;
use hovor::conversation::ConversationController;
use hovor::speech::{CloudRecognizer, CloudSynthesizer};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hovor", version, about = "Voice chat with an OpenAI-compatible model")]
struct Cli {
    /// Configuration file (defaults to <config dir>/hovor/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Locale for speech recognition and synthesis, e.g. cs-CZ
    #[arg(short, long)]
    locale: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hovor=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    if let Some(locale) = cli.locale {
        config.speech.locale = locale;
    }
    config.validate().context("invalid configuration")?;

    info!(
        "Starting Hovor (model {}, locale {})",
        config.chat.model, config.speech.locale
    );

    let chat = ChatWorker::new(ChatClient::new(config.chat.clone()))
        .start()
        .context("failed to start chat worker")?;
    let recognizer = CloudRecognizer::new(config.speech.clone(), config.chat.api_key.clone());
    let synthesizer = CloudSynthesizer::start(config.speech.clone(), config.chat.api_key.clone())
        .context("failed to start speech worker")?;

    let controller = ConversationController::new(
        chat,
        Box::new(recognizer),
        Box::new(synthesizer),
        config.speech.locale.clone(),
    );

    hovor::ui::run(controller).map_err(|e| anyhow::anyhow!("window error: {}", e))?;

    info!("Hovor closed");
    Ok(())
}
