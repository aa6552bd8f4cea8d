//! KOS CLI - browse the catalog, manage the cart and wishlist, and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! kos products --limit 12
//! kos search --q serum --max 100 --sort price_asc
//!
//! # Cart
//! kos cart add 12 --qty 2
//! kos cart set-qty 12 3
//! kos cart list
//!
//! # Account and checkout
//! kos login --email me@example.qa
//! kos checkout --name "Mariam" --phone "+974 5555 0000" --address "Street 12" --city Doha
//!
//! # Admin (signed in as an admin account)
//! kos admin orders
//! kos admin set-status 501 shipped
//! kos admin watch
//! ```
//!
//! # Environment Variables
//!
//! - `KOS_API_BASE`, `KOS_STORAGE_DIR`, `KOS_CATALOG_CACHE_TTL_SECS`,
//!   `KOS_HTTP_TIMEOUT_SECS`, `KOS_LOG_FORMAT` - see `kos_storefront::config`
//! - `RUST_LOG` - log filter (default: `kos_storefront=info,kos_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kos_storefront::config::{LogFormat, StorefrontConfig};
use kos_storefront::error::AppError;
use kos_storefront::state::AppState;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    account::{LoginArgs, SignupArgs},
    admin::AdminAction,
    cart::CartAction,
    catalog::{ReviewArgs, SearchArgs},
    checkout::CheckoutArgs,
    wishlist::WishlistAction,
};

#[derive(Parser)]
#[command(name = "kos")]
#[command(author, version, about = "KOS beauty storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage saved products
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// List the newest products
    Products {
        /// Maximum number of products
        #[arg(short, long, default_value_t = 24)]
        limit: u32,
    },
    /// List product categories
    Categories,
    /// Search and filter products
    Search(SearchArgs),
    /// Show reviews for a product
    Reviews {
        /// Product id
        id: kos_core::ProductId,
    },
    /// Review a product
    Review(ReviewArgs),
    /// Create an account and sign in
    Signup(SignupArgs),
    /// Sign in
    Login(LoginArgs),
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// List your orders
    Orders,
    /// Show your loyalty balance and history
    Rewards,
    /// Place a cash-on-delivery order for the cart
    Checkout(CheckoutArgs),
    /// Send a message to the store
    Contact {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        /// Message text
        message: String,
    },
    /// Store administration (admin accounts only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default());
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(AppError::from(e).exit_code());
        }
    };
    init_tracing(config.log_format);

    let cli = Cli::parse();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            commands::report(&e.user_message());
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kos_storefront=info,kos_cli=info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Cart { action } => commands::cart::run(&state, action).await?,
        Commands::Wishlist { action } => commands::wishlist::run(&state, action).await?,
        Commands::Products { limit } => commands::catalog::products(&state, limit).await?,
        Commands::Categories => commands::catalog::categories(&state).await?,
        Commands::Search(args) => commands::catalog::search(&state, args).await?,
        Commands::Reviews { id } => commands::catalog::reviews(&state, &id).await?,
        Commands::Review(args) => commands::catalog::review(&state, args).await?,
        Commands::Signup(args) => commands::account::signup(&state, args).await?,
        Commands::Login(args) => commands::account::login(&state, args).await?,
        Commands::Logout => commands::account::logout(&state).await,
        Commands::Whoami => commands::account::whoami(&state).await?,
        Commands::Orders => commands::account::orders(&state).await?,
        Commands::Rewards => commands::account::rewards(&state).await?,
        Commands::Checkout(args) => commands::checkout::run(&state, args).await?,
        Commands::Contact {
            name,
            email,
            message,
        } => commands::account::contact(&state, name, email, message).await?,
        Commands::Admin { action } => commands::admin::run(&state, action).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cart_add() {
        let cli = Cli::try_parse_from(["kos", "cart", "add", "12", "--qty", "3"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Add { qty: Some(3), .. }
            }
        ));
    }

    #[test]
    fn test_parse_search_sort() {
        let cli = Cli::try_parse_from(["kos", "search", "--q", "serum", "--sort", "price_desc"])
            .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.q.as_deref(), Some("serum"));
        assert_eq!(args.sort, Some(kos_storefront::api::SortOrder::PriceDesc));
    }

    #[test]
    fn test_parse_admin_set_status() {
        let cli = Cli::try_parse_from(["kos", "admin", "set-status", "501", "shipped"])
            .unwrap_or_else(|e| panic!("{e}"));
        let Commands::Admin {
            action: AdminAction::SetStatus { id, status },
        } = cli.command
        else {
            panic!("expected admin set-status");
        };
        assert_eq!(id, kos_core::OrderId::from(501));
        assert_eq!(status, kos_core::OrderStatus::Shipped);
    }

    #[test]
    fn test_parse_admin_rejects_unknown_status() {
        assert!(Cli::try_parse_from(["kos", "admin", "set-status", "501", "returned"]).is_err());
    }

    #[test]
    fn test_parse_admin_revoke() {
        let cli = Cli::try_parse_from(["kos", "admin", "set-admin", "5", "--revoke"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Admin {
                action: AdminAction::SetAdmin { revoke: true, .. }
            }
        ));
    }
}
