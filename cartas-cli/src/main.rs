//! Cartas CLI - Command-line interface for the Cartas message generator.
//!
//! Generates personalized Spanish messages from the terminal, with live
//! streaming output, and manages the account, contacts, favorites,
//! reminders, plans, and onboarding tours.

mod commands;

use clap::{Parser, Subcommand};
use tracing::info;

use cartas_core::config::{AppConfig, ConfigHandle};
use cartas_core::error::CtResult;
use cartas_core::logging;

/// Cartas - personalized messages for every occasion.
#[derive(Parser)]
#[command(
    name = "cartas",
    version,
    about = "Cartas message generator CLI",
    long_about = "A command-line interface for the Cartas message generator.\n\
                   Write birthday wishes, apologies, letters and poems tailored to each person."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password.
    Login {
        /// Account email (prompted when omitted).
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create an account.
    Register {
        /// Display name.
        #[arg(short, long)]
        name: Option<String>,
        /// Account email.
        #[arg(short, long)]
        email: Option<String>,
        /// ISO country code (e.g. MX, AR, ES).
        #[arg(long)]
        country: Option<String>,
    },
    /// Log out and forget the stored token.
    Logout,
    /// Show the current user and plan.
    Whoami,
    /// Generate a message, streaming it as it is written.
    Generate(commands::generate::GenerateArgs),
    /// Show the request and guardian prompt without calling the backend.
    Prompt(commands::generate::GenerateArgs),
    /// List occasions, tones, relationships, and formats.
    Catalog,
    /// Show today's and this session's generation counts.
    Usage,
    /// Manage contacts.
    Contacts {
        #[command(subcommand)]
        action: commands::contacts::ContactsAction,
    },
    /// Manage favorite messages.
    Favorites {
        #[command(subcommand)]
        action: commands::favorites::FavoritesAction,
    },
    /// Manage reminders for special dates.
    Reminders {
        #[command(subcommand)]
        action: commands::reminders::RemindersAction,
    },
    /// List the available plans.
    Plans,
    /// Start a plan purchase and print the payment link.
    Checkout {
        /// Plan id (see `cartas plans`).
        plan: String,
        /// Force a gateway (stripe, mercadopago).
        #[arg(short, long)]
        gateway: Option<String>,
    },
    /// Check the status of a payment.
    Payment {
        /// Checkout session or preference id.
        reference: String,
    },
    /// Show or dismiss the current offer banner.
    Offers {
        /// Dismiss the banner for this session.
        #[arg(long)]
        dismiss: bool,
    },
    /// Guided tours.
    Onboarding {
        #[command(subcommand)]
        action: commands::onboarding::OnboardingAction,
    },
}

#[tokio::main]
async fn main() -> CtResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(std::path::Path::new);
    let config = AppConfig::load(config_path)?;

    // Initialize logging
    let _guard = logging::init_from_config(&config, cli.verbose)?;

    let config_handle = ConfigHandle::new(config);

    info!("Cartas CLI v{}", cartas_core::constants::APP_VERSION);

    // Dispatch to command handlers
    let result = match cli.command {
        Commands::Login { email } => commands::account::login(config_handle, email, cli.format).await,
        Commands::Register { name, email, country } => {
            commands::account::register(config_handle, name, email, country, cli.format).await
        }
        Commands::Logout => commands::account::logout(config_handle).await,
        Commands::Whoami => commands::account::whoami(config_handle, cli.format).await,
        Commands::Generate(args) => commands::generate::run(config_handle, args, cli.format).await,
        Commands::Prompt(args) => commands::generate::prompt(config_handle, args, cli.format).await,
        Commands::Catalog => commands::generate::catalog(config_handle, cli.format).await,
        Commands::Usage => commands::generate::usage(config_handle, cli.format).await,
        Commands::Contacts { action } => {
            commands::contacts::run(config_handle, action, cli.format).await
        }
        Commands::Favorites { action } => {
            commands::favorites::run(config_handle, action, cli.format).await
        }
        Commands::Reminders { action } => {
            commands::reminders::run(config_handle, action, cli.format).await
        }
        Commands::Plans => commands::plans::list(config_handle, cli.format).await,
        Commands::Checkout { plan, gateway } => {
            commands::plans::checkout(config_handle, plan, gateway, cli.format).await
        }
        Commands::Payment { reference } => {
            commands::plans::payment(config_handle, reference, cli.format).await
        }
        Commands::Offers { dismiss } => commands::plans::offers(config_handle, dismiss, cli.format).await,
        Commands::Onboarding { action } => {
            commands::onboarding::run(config_handle, action, cli.format).await
        }
    };

    if let Err(e) = &result {
        commands::print_error(e);
    }
    result
}
