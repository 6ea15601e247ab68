#![allow(clippy::doc_markdown)]
//! `Affinity` CLI - recommendations from a preference file
//!
//! Usage:
//!   `affinity --data ratings.csv recommend alice -n 5`
//!   `affinity --data ratings.csv estimate alice item42`
//!   `affinity --data ratings.csv similar-items item42`
//!   `affinity --config affinity.toml config`

mod output;
#[cfg(test)]
mod output_tests;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use affinity_core::config::LoggingConfig;
use affinity_core::{
    build_item_based, build_recommender, build_user_based, AffinityConfig, DataModel,
    FileDataModel, ItemBasedRecommender, ItemId, UserBasedRecommender, UserId,
};

#[derive(Parser)]
#[command(name = "affinity")]
#[command(
    author,
    version,
    about = "Affinity CLI - collaborative-filtering recommendations"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "AFFINITY_CONFIG", default_value = "affinity.toml")]
    config: PathBuf,

    /// Preference file with `user,item,value` lines
    #[arg(short, long, global = true, env = "AFFINITY_DATA")]
    data: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, global = true, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend items a user has not rated
    Recommend {
        /// User id
        user: String,

        /// Number of recommendations
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Estimate a user's preference for an item
    Estimate {
        /// User id
        user: String,

        /// Item id
        item: String,
    },

    /// Items most similar to an item (item-based)
    SimilarItems {
        /// Item id
        item: String,

        /// Number of items
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Users most similar to a user (user-based)
    SimilarUsers {
        /// User id
        user: String,

        /// Number of users
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Items a user rated that explain recommending an item (item-based)
    Because {
        /// User id
        user: String,

        /// Recommended item id
        item: String,

        /// Number of items
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AffinityConfig> {
    let config = AffinityConfig::load_from_path(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    config.validate()?;
    Ok(config)
}

fn load_data(cli: &Cli) -> anyhow::Result<Arc<dyn DataModel>> {
    let path = cli
        .data
        .as_ref()
        .context("a preference file is required (--data or AFFINITY_DATA)")?;
    let model = FileDataModel::new(path)
        .with_context(|| format!("opening preference file {}", path.display()))?;
    Ok(Arc::new(model))
}

/// Executes `cli` against an already loaded configuration and returns the
/// rendered output.
fn run(cli: &Cli, config: &AffinityConfig) -> anyhow::Result<String> {
    let format = cli.format.as_str();
    match &cli.command {
        Commands::Config => Ok(config.to_toml()?),
        Commands::Recommend { user, count } => {
            let recommender = build_recommender(config, load_data(cli)?)?;
            let items = recommender.recommend(&UserId::from(user.as_str()), *count)?;
            output::render(&output::item_rows(&items), "item", format)
        }
        Commands::Estimate { user, item } => {
            let recommender = build_recommender(config, load_data(cli)?)?;
            let value = recommender
                .estimate_preference(&UserId::from(user.as_str()), &ItemId::from(item.as_str()))?;
            output::render_estimate(user, item, value, format)
        }
        Commands::SimilarItems { item, count } => {
            let recommender = build_item_based(config, load_data(cli)?)?;
            let items = recommender.most_similar_items(&ItemId::from(item.as_str()), *count)?;
            output::render(&output::item_rows(&items), "item", format)
        }
        Commands::SimilarUsers { user, count } => {
            let recommender = build_user_based(config, load_data(cli)?)?;
            let users = recommender.most_similar_users(&UserId::from(user.as_str()), *count)?;
            output::render(&output::user_rows(&users), "user", format)
        }
        Commands::Because { user, item, count } => {
            let recommender = build_item_based(config, load_data(cli)?)?;
            let items = recommender.recommended_because(
                &UserId::from(user.as_str()),
                &ItemId::from(item.as_str()),
                *count,
            )?;
            output::render(&output::item_rows(&items), "item", format)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.logging);
    tracing::debug!(
        config = %cli.config.display(),
        kind = ?config.recommender.kind,
        "configuration loaded"
    );

    let rendered = run(&cli, &config)?;
    println!("{rendered}");
    Ok(())
}
