//! Prickly Pear CLI - migrations and data seeding.
//!
//! Schema migrations are applied here, never on server startup:
//!
//! ```bash
//! pp-cli migrate          # apply pending migrations
//! pp-cli seed             # load demo catalog data
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};
use rand::Rng;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "pp-cli", about = "Prickly Pear Commerce management tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Insert demo suppliers, categories, products and a coupon.
    Seed,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

async fn connect() -> Result<PgPool, CliError> {
    let _ = dotenvy::dotenv();
    let url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CliError::MissingDatabaseUrl)?;

    Ok(PgPoolOptions::new()
        .max_connections(2)
        .connect(url.expose_secret())
        .await?)
}

async fn migrate(pool: &PgPool) -> Result<(), CliError> {
    sqlx::migrate!("../storefront/migrations").run(pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}

/// Demo catalog: a handful of suppliers and categories, a few dozen
/// products with randomized prices and stock, one welcome coupon.
async fn seed(pool: &PgPool) -> Result<(), CliError> {
    let suppliers = [
        ("Keychron Direct", "B81234567"),
        ("Logitach Iberia", "B87654321"),
        ("Samsonic Components", "B83456789"),
    ];
    let mut supplier_ids = Vec::new();
    for (company_name, tax_id) in suppliers {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.supplier (company_name, tax_id) VALUES ($1, $2) \
             ON CONFLICT (tax_id) DO UPDATE SET company_name = EXCLUDED.company_name \
             RETURNING id",
        )
        .bind(company_name)
        .bind(tax_id)
        .fetch_one(pool)
        .await?;
        supplier_ids.push(id);
    }

    let categories = [
        ("Keyboards", "keyboards"),
        ("Monitors", "monitors"),
        ("Storage", "storage"),
        ("Accessories", "accessories"),
    ];
    let mut category_ids = Vec::new();
    for (name, slug) in categories {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO shop.category (name, slug) VALUES ($1, $2) \
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .fetch_one(pool)
        .await?;
        category_ids.push(id);
    }

    let mut rng = rand::rng();
    for n in 1..=40 {
        let category_id = category_ids[rng.random_range(0..category_ids.len())];
        let supplier_id = supplier_ids[rng.random_range(0..supplier_ids.len())];
        // Two-decimal price between 5.00 and 500.00.
        let price = Decimal::new(rng.random_range(500..50_000), 2);
        let stock: i32 = rng.random_range(0..120);

        sqlx::query(
            "INSERT INTO shop.product \
                 (category_id, supplier_id, name, slug, description, price, stock) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(category_id)
        .bind(supplier_id)
        .bind(format!("Demo product {n}"))
        .bind(format!("demo-product-{n}"))
        .bind("Seeded demo product")
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;
    }

    let now = Utc::now();
    sqlx::query(
        "INSERT INTO shop.coupon (code, valid_from, valid_until, discount_percent, active) \
         VALUES ($1, $2, $3, $4, TRUE) \
         ON CONFLICT (lower(code)) DO NOTHING",
    )
    .bind("WELCOME10")
    .bind(now)
    .bind(now + TimeDelta::days(30))
    .bind(10)
    .execute(pool)
    .await?;

    tracing::info!("demo data seeded");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pp_cli=info,sqlx=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = async {
        let pool = connect().await?;
        match cli.command {
            Commands::Migrate => migrate(&pool).await,
            Commands::Seed => seed(&pool).await,
        }
    }
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}
