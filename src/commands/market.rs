use campus_hub::blob::Upload;
use campus_hub::models::{ItemCondition, NewMarketplaceItem};
use campus_hub::{CampusHub, Session};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::{non_empty, print_list, print_one, truncate, CommandResult, OutputFormat};

#[derive(Args)]
pub struct MarketCommand {
    #[command(subcommand)]
    pub command: MarketSubcommand,
}

#[derive(Subcommand)]
pub enum MarketSubcommand {
    /// List an item for sale
    Sell {
        /// Item title
        title: String,

        /// Asking price
        #[arg(long)]
        price: f64,

        /// Category (e.g. books, electronics)
        #[arg(long)]
        category: String,

        /// Condition (new, like-new, good, fair, poor)
        #[arg(long, default_value = "good")]
        condition: ItemCondition,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Attach a photo
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Browse listings
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Include sold items
        #[arg(long)]
        all: bool,

        /// Only your own listings
        #[arg(long)]
        mine: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a listing
    Show {
        /// Item ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Mark one of your items sold
    Sold {
        /// Item ID
        id: String,
    },

    /// Remove one of your listings
    Delete {
        /// Item ID
        id: String,
    },
}

impl MarketCommand {
    pub async fn run(&self, hub: &CampusHub, session: &Session) -> CommandResult {
        match &self.command {
            MarketSubcommand::Sell {
                title,
                price,
                category,
                condition,
                description,
                image,
            } => {
                if !price.is_finite() || *price < 0.0 {
                    return Err("Price must be a non-negative number".into());
                }
                let new = NewMarketplaceItem {
                    title: non_empty(title, "Title")?.to_string(),
                    description: description.clone(),
                    price: *price,
                    category: category.to_lowercase(),
                    condition: *condition,
                    image_url: None,
                };

                let upload = match image {
                    Some(path) => Some(Upload::from_path(path).await?),
                    None => None,
                };
                let item = hub.marketplace.create(session, new, upload.as_ref()).await?;
                println!("Listed item:");
                println!("{}", item);
                Ok(())
            }

            MarketSubcommand::List {
                category,
                all,
                mine,
                format,
            } => {
                let items = if *mine {
                    hub.marketplace.by_seller(session.uid()).await?
                } else {
                    hub.marketplace.list(category.as_deref(), *all).await?
                };
                print_list(&items, format, "item(s)", |i| {
                    format!(
                        "{:<36}  {:>10.2}  {:<12}  {}{}",
                        i.id,
                        i.price,
                        truncate(&i.category, 12),
                        truncate(&i.title, 30),
                        if i.sold { " (SOLD)" } else { "" }
                    )
                })
            }

            MarketSubcommand::Show { id, format } => {
                let item = hub
                    .marketplace
                    .get(id)
                    .await?
                    .ok_or_else(|| format!("Item not found: {}", id))?;
                print_one(&item, format)
            }

            MarketSubcommand::Sold { id } => {
                hub.marketplace.mark_sold(session, id).await?;
                println!("Marked {} sold", id);
                Ok(())
            }

            MarketSubcommand::Delete { id } => {
                hub.marketplace.delete(session, id).await?;
                println!("Deleted listing {}", id);
                Ok(())
            }
        }
    }
}
