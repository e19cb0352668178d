//! Favorite message commands.

use clap::Subcommand;
use console::style;

use cartas_core::config::ConfigHandle;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{FavoriteItem, Occasion, Tone};

use super::{parse_occasion, parse_tone, truncate};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// List saved messages.
    List {
        /// Maximum number of messages to display.
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Save a message.
    Add {
        /// Message text.
        content: String,
        /// Occasion id.
        #[arg(short, long, value_parser = parse_occasion)]
        occasion: Option<Occasion>,
        /// Tone id.
        #[arg(short, long, value_parser = parse_tone)]
        tone: Option<Tone>,
    },
    /// Remove a saved message.
    Remove {
        /// Favorite id.
        id: String,
    },
}

pub async fn run(config: ConfigHandle, action: FavoritesAction, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let favorites = registry.favorites.read().await;

    match action {
        FavoritesAction::List { limit } => {
            let mut list = favorites.refresh().await?;
            if let Some(lim) = limit {
                list.truncate(lim);
            }
            match format {
                OutputFormat::Json => super::print_json(&list),
                OutputFormat::Text => {
                    if list.is_empty() {
                        println!("Aún no tienes favoritos. Usa `cartas generate --save`.");
                    } else {
                        let mut table = super::new_table(vec!["Id", "Ocasión", "Mensaje"]);
                        for f in &list {
                            table.add_row(vec![
                                f.id.clone().unwrap_or_else(|| "-".into()),
                                f.occasion.map(|o| o.label().to_string()).unwrap_or_else(|| "-".into()),
                                truncate(&f.content, 70),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        FavoritesAction::Add { content, occasion, tone } => {
            favorites.refresh().await?;
            let saved = favorites.add(FavoriteItem::new(content, occasion, tone)).await?;
            match format {
                OutputFormat::Json => super::print_json(&saved),
                OutputFormat::Text => println!("{} Guardado en favoritos.", style("OK").green().bold()),
            }
        }
        FavoritesAction::Remove { id } => {
            if id.trim().is_empty() {
                return Err(CtError::Validation(vec!["Indica el id del favorito.".into()]));
            }
            favorites.remove(&id).await?;
            println!("{} Favorito eliminado.", style("OK").green().bold());
        }
    }
    Ok(())
}
