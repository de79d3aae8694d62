// ABOUTME: Administrative command line tool for the LMS database
// ABOUTME: Lists sites, runs course sync and retraining without going through HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LMS CLI
//!
//! ```bash
//! lms-cli sites list
//! lms-cli sync --course <master-course-id> --targets <site-id>,<site-id>
//! lms-cli retrain --course <course-id> --site <site-id>
//! ```

mod commands;

use clap::{Parser, Subcommand};
use lms_server::config::{DatabaseConfig, ServerConfig};
use lms_server::database::Database;
use lms_server::errors::AppResult;
use lms_server::logging;
use lms_server::models::TenantId;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "lms-cli",
    about = "LMS administration tool",
    long_about = "Operate on the LMS database directly: site listing, course sync, retraining"
)]
struct Cli {
    /// Database URL override (otherwise `DATABASE_URL`)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Site management
    Sites {
        #[command(subcommand)]
        action: SitesAction,
    },
    /// Replicate a master course from the primary site into target sites
    Sync {
        /// Master course id
        #[arg(long)]
        course: Uuid,
        /// Comma-separated target site ids
        #[arg(long, value_delimiter = ',', required = true)]
        targets: Vec<TenantId>,
    },
    /// Reset progress of every learner who completed a course
    Retrain {
        /// Course id
        #[arg(long)]
        course: Uuid,
        /// Site owning the course
        #[arg(long)]
        site: TenantId,
    },
}

#[derive(Subcommand)]
enum SitesAction {
    /// List every site
    List,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database = DatabaseConfig { url };
    }
    logging::init(&config.logging)?;

    let database = Database::new(&config.database).await?;
    database.tenants().seed_core_sites().await?;

    match cli.command {
        Command::Sites {
            action: SitesAction::List,
        } => commands::sites::list(&database).await,
        Command::Sync { course, targets } => {
            commands::sync::run(&database, config.primary_site, course, &targets).await
        }
        Command::Retrain { course, site } => commands::retrain::run(&database, site, course).await,
    }
}
