use anyhow::Result;
use clap::Parser;

use tradespec_cli::cli::Cli;
use tradespec_cli::logging::init_tracing;
use tradespec_core::config::{GeneralConfig, TradespecConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 설정 오류는 명령 처리 단계에서 보고하므로 여기서는 로깅 설정만 추출
    let mut general = TradespecConfig::load_or_default(&cli.config)
        .await
        .map(|config| config.general)
        .unwrap_or_else(|_| GeneralConfig::default());
    if let Some(ref level) = cli.log_level {
        general.log_level = level.clone();
    }
    init_tracing(&general)?;
    tradespec_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "tradespec starting");

    if let Err(e) = tradespec_cli::dispatch(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }

    Ok(())
}
