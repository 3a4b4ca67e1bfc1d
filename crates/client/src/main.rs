// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cloudvar: watch and write cloud variables from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cloudvar::{
    ChannelListener, CloudSession, ConfigFile, Platform, SessionConfig, SessionEvent, Value,
};

/// cloudvar: cloud variable client
#[derive(Parser, Debug)]
#[command(name = "cloudvar")]
#[command(about = "Watch and write cloud variables")]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server URL; repeat to give fallbacks
    #[arg(short, long = "server")]
    servers: Vec<String>,

    /// Project id
    #[arg(short, long)]
    project: Option<String>,

    /// Username (random when omitted)
    #[arg(short, long)]
    username: Option<String>,

    /// User-Agent header sent to the server
    #[arg(long)]
    user_agent: Option<String>,

    /// Behave like a browser client (no User-Agent header)
    #[arg(long)]
    browser: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every update pushed by the server
    Watch,

    /// Write one variable and exit once it has been sent
    Set {
        name: String,
        /// JSON scalar, or any other text as a string
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let builder = FmtSubscriber::builder().with_writer(std::io::stderr);
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish())?
        }
        Err(_) => tracing::subscriber::set_global_default(builder.with_max_level(level).finish())?,
    }

    let config = build_config(&args)?;
    info!(
        "project {} as {} via {}",
        config.project_id(),
        config.username(),
        config.endpoints().join(", ")
    );

    let (listener, mut events) = ChannelListener::new();
    let session = CloudSession::connect(config, listener)?;

    match args.command {
        Command::Watch => {
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("interrupted");
                        break;
                    }
                    event = events.recv() => match event {
                        Some(SessionEvent::Set { name, value }) => println!("{}\t{}", name, value),
                        Some(SessionEvent::Connected) => info!("connected"),
                        Some(SessionEvent::Reconnecting) => {}
                        Some(SessionEvent::Error(e)) => return Err(e.into()),
                        None => break,
                    },
                }
            }
            session.close();
        }
        Command::Set { name, value } => {
            session.set(&name, parse_value(&value))?;
            session.flushed().await?;
            info!("sent {}", name);
            session.close();
        }
    }

    session.closed().await?;
    Ok(())
}

/// Merges the config file (if any) with command-line overrides.
fn build_config(args: &Args) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut builder = match &args.config {
        Some(path) => ConfigFile::load(path)?.into_builder()?,
        None => SessionConfig::builder(),
    };

    if !args.servers.is_empty() {
        builder = builder.endpoints(args.servers.iter().cloned());
    }
    if let Some(project) = &args.project {
        builder = builder.project_id(project.as_str());
    }
    if let Some(username) = &args.username {
        builder = builder.username(username.as_str());
    }
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }
    if args.browser {
        builder = builder.platform(Platform::Browser);
    }

    Ok(builder.build()?)
}

/// Reads a JSON scalar, falling back to the raw text.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| Value::try_from(json).ok())
        .unwrap_or_else(|| Value::from(raw))
}
