use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "swap-cli")]
#[command(about = "Drive a running dex-swap service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a quote for an amount in the source token's smallest unit
    Quote {
        amount: String,
        #[arg(long)]
        from_token: Option<String>,
        #[arg(long)]
        to_token: Option<String>,
    },
    /// Fetch the swap transaction for the current quote
    Prepare {
        /// Slippage tolerance as a fraction, e.g. 0.005
        #[arg(long)]
        slippage: Option<f64>,
    },
    /// Sign, broadcast and wait for confirmation
    Send,
    /// Show the current session state
    Status,
    /// Start over
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Quote {
            amount,
            from_token,
            to_token,
        } => {
            let mut body = json!({ "amount": amount });
            if let Some(from) = from_token {
                body["from_token_address"] = json!(from);
            }
            if let Some(to) = to_token {
                body["to_token_address"] = json!(to);
            }
            client
                .post(format!("{}/api/v1/quote", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::Prepare { slippage } => {
            let body = match slippage {
                Some(s) => json!({ "slippage": s }),
                None => json!({}),
            };
            client
                .post(format!("{}/api/v1/prepare", base))
                .json(&body)
                .send()
                .await?
        }
        Commands::Send => client.post(format!("{}/api/v1/send", base)).send().await?,
        Commands::Status => client.get(format!("{}/api/v1/session", base)).send().await?,
        Commands::Reset => client.post(format!("{}/api/v1/reset", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("{}", rendered);
        std::process::exit(1);
    }

    println!("{}", rendered);
    Ok(())
}
