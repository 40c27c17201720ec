use std::path::PathBuf;

use clap::Parser;

/// Credential-shielding proxy for the Alchemer survey API
#[derive(Debug, Parser)]
#[command(name = "survey-proxy", version, about)]
struct Cli {
    /// Config file (defaults to ~/.survey_proxy/config.json)
    #[arg(short, long, env = "SURVEY_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Bind host, overrides allow_lan_access
    #[arg(long, env = "SURVEY_PROXY_HOST")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, env = "SURVEY_PROXY_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    survey_proxy_lib::run(survey_proxy_lib::RunOptions {
        config_path: cli.config,
        host: cli.host,
        port: cli.port,
    })
    .await?;

    Ok(())
}
