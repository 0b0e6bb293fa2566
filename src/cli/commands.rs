use clap::{Parser, Subcommand};

use crate::api::models::Mode;

#[derive(Parser)]
#[command(name = "exam-chat", version, about = "Exam helper chat relay", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP relay server
    Serve,

    /// Chat with the relay from the terminal
    Chat {
        /// Initial mode: task-help or code-analysis
        #[arg(short, long, default_value = "task-help")]
        mode: Mode,

        /// Relay endpoint, defaults to client.relay_url from the config
        #[arg(short, long)]
        url: Option<String>,

        /// Print code blocks without colors
        #[arg(long)]
        no_color: bool,
    },
}
