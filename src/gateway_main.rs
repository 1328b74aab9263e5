//! 翻译网关主程序入口

use clap::Parser;

use gpt_translate::env::{self, EnvVar};
use gpt_translate::gateway::{CompletionClient, GatewayConfig, GatewayServer, GatewayService};
use gpt_translate::translation::TranslatorConfig;

#[derive(Parser, Debug)]
#[command(name = "gpt-translate-gateway", version, about = "GPT translation gateway", long_about = None)]
struct Cli {
    /// 绑定地址 [默认: 127.0.0.1]
    #[arg(short, long)]
    bind: Option<String>,

    /// 端口 [默认: 7081]
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let level = env::core::LogLevel::get()
        .ok()
        .and_then(|level| level.parse::<tracing::Level>().ok())
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::default();
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let translator_config = TranslatorConfig::from_env()?;
    let client = CompletionClient::new(translator_config.api_url)?;

    GatewayServer::new(config, GatewayService::new(client))
        .start()
        .await?;

    Ok(())
}
