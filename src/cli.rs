use clap::{Parser, Subcommand};

use crate::commands;
use crate::constants::DEFAULT_PORT;

#[derive(Parser)]
#[command(name = "stockcast")]
#[command(about = "Stock price prediction server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Train a model for one ticker, or for every company in companies.json
    Train {
        /// Ticker symbol like RELIANCE.NS
        ticker: Option<String>,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::Train { ticker } => {
            commands::train::run(ticker).await;
        }
    }
}
