use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};

#[derive(Parser)]
#[command(name = "charla")]
#[command(about = "Charla CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: CHARLA_CONFIG_PATH or ~/.charla/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the relay server (chat, lead capture, health). Providers without
    /// credentials are skipped, not an error.
    Gateway {
        /// Config file path (default: CHARLA_CONFIG_PATH or ~/.charla/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Listening port (default from config or 4000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Chat with the relay from the terminal (interactive).
    Chat {
        /// Config file path (default: CHARLA_CONFIG_PATH or ~/.charla/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Relay base URL (default http://127.0.0.1:{port} from config)
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("charla {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, url }) => {
            if let Err(e) = run_chat(config, url).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("charla {} — run with --help for commands", env!("CARGO_PKG_VERSION"));
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, _path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    lib::gateway::run_gateway(config).await
}

/// Interactive loop: POST each stdin line to /api/chat and print the reply.
async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    url: Option<String>,
) -> anyhow::Result<()> {
    let (config, _path) = lib::config::load_config(config_path)?;
    let base_url = url.unwrap_or_else(|| format!("http://127.0.0.1:{}", config.server.port));
    let endpoint = format!("{}/api/chat", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();

    println!("connected to {} (empty line to quit)", endpoint);
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            break;
        }

        let res = client
            .post(&endpoint)
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await?;
        let status = res.status();
        let body: serde_json::Value = res.json().await?;
        if !status.is_success() {
            let error = body.get("error").and_then(|v| v.as_str()).unwrap_or("unknown error");
            println!("error ({}): {}", status, error);
            continue;
        }
        let reply = body.get("reply").and_then(|v| v.as_str()).unwrap_or("");
        println!("{}", reply);
        if body.get("sentAlert").and_then(|v| v.as_bool()) == Some(true) {
            log::debug!("alert sent (sid {:?})", body.get("sid"));
        }
    }
    Ok(())
}
