use clap::{Parser, Subcommand};
use lib::driver::{DriverSettings, ModemDriver};
use lib::modem::{HilinkClient, Message};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hilink-sms")]
#[command(about = "playSMS driver for Huawei hilink USB modems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the gateway: HTTP send API for playSMS plus the inbox poller.
    Gateway {
        /// Config file path (default: HILINK_CONFIG_PATH or ~/.hilink/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 8888)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// List SMS in the modem inbox.
    ListReceived {
        /// Config file path (default: HILINK_CONFIG_PATH or ~/.hilink/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// List SMS in the modem outbox.
    ListSent {
        /// Config file path (default: HILINK_CONFIG_PATH or ~/.hilink/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Send an SMS and print the index the modem assigned (-1 when unknown).
    Send {
        /// Config file path (default: HILINK_CONFIG_PATH or ~/.hilink/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Destination number; repeat for several recipients.
        #[arg(long, short, required = true)]
        number: Vec<String>,

        /// Message text.
        #[arg(long, short)]
        text: String,
    },

    /// Delete an SMS from the modem by index.
    Delete {
        /// Config file path (default: HILINK_CONFIG_PATH or ~/.hilink/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Index of the message to delete.
        #[arg(long, short)]
        index: u32,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("hilink-sms {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Gateway { config, port }) => run_gateway(config, port).await,
        Some(Commands::ListReceived { config }) => {
            with_driver(config, |d| async move {
                print_messages(&d.list_received_sms().await?);
                Ok(())
            })
            .await
        }
        Some(Commands::ListSent { config }) => {
            with_driver(config, |d| async move {
                print_messages(&d.list_sent_sms().await?);
                Ok(())
            })
            .await
        }
        Some(Commands::Send {
            config,
            number,
            text,
        }) => {
            with_driver(config, |d| async move {
                let index = d.send_sms(number, text).await?;
                println!("index {}", index.map(i64::from).unwrap_or(-1));
                Ok(())
            })
            .await
        }
        Some(Commands::Delete { config, index }) => {
            with_driver(config, |d| async move {
                d.delete_sms(index).await?;
                Ok(())
            })
            .await
        }
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run_gateway(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

/// Start a modem worker for a one-shot command, run `f`, then stop the worker.
async fn with_driver<F, Fut>(config_path: Option<PathBuf>, f: F) -> anyhow::Result<()>
where
    F: FnOnce(ModemDriver) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let (config, _) = lib::config::load_config(config_path)?;
    let client = HilinkClient::new(&config.modem)?;
    let (driver, worker) = ModemDriver::spawn(client, DriverSettings::from_config(&config));
    let result = f(driver.clone()).await;
    driver.stop().await?;
    let _ = worker.await;
    result
}

fn print_messages(messages: &[Message]) {
    if messages.is_empty() {
        println!("No messages");
        return;
    }
    for m in messages {
        match serde_json::to_string(m) {
            Ok(line) => println!("{}", line),
            Err(_) => println!("{} {} {}", m.index, m.phone, m.content),
        }
    }
}
