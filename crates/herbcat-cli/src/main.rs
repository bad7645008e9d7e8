use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "herbcat-cli")]
#[command(about = "Herbal catalog maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending schema migrations.
    Migrate,
    /// Upsert the category list from a YAML file into the database.
    SeedCategories {
        /// Path to the categories file; defaults to CATEGORIES_PATH
        /// from the environment.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => {
            let pool = herbcat_db::connect_pool_from_env().await?;
            let applied = herbcat_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::SeedCategories { path } => {
            let config = herbcat_core::load_app_config()?;
            let path = path.unwrap_or_else(|| config.categories_path.clone());

            let file = herbcat_core::categories::load_categories(&path)?;

            let pool = herbcat_db::connect_pool_from_env().await?;
            herbcat_db::run_migrations(&pool).await?;

            for category in &file.categories {
                let id = herbcat_db::upsert_category(&pool, category).await?;
                tracing::info!(id, name = %category.name, slug = %category.slug(), "category upserted");
            }
            println!(
                "seeded {} categories from {}",
                file.categories.len(),
                path.display()
            );
        }
    }

    Ok(())
}
