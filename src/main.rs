//! pushsub CLI - subscribe this host to web push and store the subscription.
//!
//! This is the main binary entry point. See the `pushsub` library for the
//! workflow and its capability interfaces.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pushsub::platform::{ConfigReader, ConsoleNotifier, LocalPushRegistry, TerminalPermission};
use pushsub::store::{self, StoreKind};
use pushsub::vapid::{self, VapidKeyPair};
use pushsub::{constants, Collaborators, Config, PushSubscriptionManager};

#[derive(Parser)]
#[command(name = "pushsub", version, about = "Web push subscription client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for notification permission, subscribe, and store the subscription
    Subscribe {
        /// Grant notification permission without prompting
        #[arg(long, short = 'y')]
        yes: bool,
        /// Where to store the subscription
        #[arg(long, value_enum, default_value_t = StoreKind::Rest)]
        store: StoreKind,
    },
    /// Manage VAPID keys
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
    /// Print the effective configuration, or change the config file
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Subcommand)]
enum KeysCommand {
    /// Generate a new VAPID keypair
    Generate,
    /// Check that a private key belongs to the server public key
    Check {
        /// Private key (base64url)
        #[arg(long)]
        private_key: String,
        /// Public key to check against (defaults to the configured key)
        #[arg(long)]
        public_key: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Save the server public key to the config file
    SetKey {
        /// Server public key (base64url)
        key: String,
    },
}

async fn run_subscribe(yes: bool, kind: StoreKind) -> Result<i32> {
    let config = Config::load()?;
    let store = store::open(kind, &config);

    let permissions = if yes {
        TerminalPermission::assume_yes()
    } else {
        TerminalPermission::interactive()
    };

    let manager = PushSubscriptionManager::new(Collaborators {
        permissions: Arc::new(permissions),
        registry: Arc::new(LocalPushRegistry::new(config.push_service_url.clone())),
        config: Arc::new(config),
        store,
        notifier: Arc::new(ConsoleNotifier),
    });

    let outcome = manager.subscribe_to_push().await;
    Ok(outcome.exit_code())
}

fn generate_keys() {
    let keys = VapidKeyPair::generate();
    println!(
        "Public key (set as {} or run `pushsub config set-key`):",
        constants::VAPID_PUBLIC_KEY_ENV
    );
    println!("  {}", keys.public_key());
    println!();
    println!("Private key (keep on the sending server):");
    println!("  {}", keys.private_key());
}

fn check_keys(private_key: &str, public_key: Option<String>) -> Result<()> {
    let public_key = match public_key {
        Some(key) => key,
        None => Config::load()?.vapid_public_key().with_context(|| {
            format!(
                "No server key configured (set {} or pass --public-key)",
                constants::VAPID_PUBLIC_KEY_ENV
            )
        })?,
    };
    vapid::check_pair(&public_key, private_key)?;
    println!("Key pair OK");
    Ok(())
}

fn set_key(key: &str) -> Result<()> {
    let path = Config::config_path()?;
    Config::set_vapid_public_key(&path, key)?;
    println!("Saved server key to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Subscribe { yes, store } => {
            let code = run_subscribe(yes, store).await?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Keys { command } => match command {
            KeysCommand::Generate => generate_keys(),
            KeysCommand::Check {
                private_key,
                public_key,
            } => check_keys(&private_key, public_key)?,
        },
        Commands::Config { command } => match command {
            Some(ConfigCommand::SetKey { key }) => set_key(&key)?,
            None => {
                let config = Config::load()?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        },
    }

    Ok(())
}
