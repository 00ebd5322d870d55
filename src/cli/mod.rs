pub mod init;
pub mod migrate;
pub mod serve;
pub mod user;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(version)]
#[command(about = "Blog management service for the admin dashboard", long_about = None)]
pub struct Cli {
    #[arg(short, long, default_value = "inkpost.toml", env = "INKPOST_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        #[arg(default_value = "inkpost.toml")]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
    /// Run migrations and start the HTTP server
    Serve {
        /// Overrides server.host from the config file
        #[arg(short = 'H', long)]
        host: Option<String>,
        /// Overrides server.port from the config file
        #[arg(short, long)]
        port: Option<u16>,
    },
    Migrate,
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "author")]
        role: String,
        #[arg(long)]
        password: Option<String>,
    },
    List,
    Remove {
        username: String,
    },
    Passwd {
        username: String,
    },
}
