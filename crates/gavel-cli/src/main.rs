mod auctions;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "gavel-cli")]
#[command(about = "Auction management command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new auction (its window starts now)
    Create {
        #[arg(long)]
        product_name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: String,
        /// Product condition: new | used | refurbished
        #[arg(long, default_value = "used")]
        condition: String,
    },
    /// Show one auction as JSON
    Get { id: Uuid },
    /// List recent auctions
    List {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Close an auction now if it is still active
    Close { id: Uuid },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let pool = gavel_db::connect_pool_from_env().await?;

    match cli.command {
        Commands::Create {
            product_name,
            category,
            description,
            condition,
        } => auctions::create(pool, product_name, category, description, condition).await,
        Commands::Get { id } => auctions::get(pool, id).await,
        Commands::List { limit } => auctions::list(pool, limit).await,
        Commands::Close { id } => auctions::close(pool, id).await,
    }
}
