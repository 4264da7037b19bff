//! # Kitab Admin CLI
//!
//! Maintenance commands for the back-office database.
//!
//! ## Usage
//! ```bash
//! # Apply pending migrations
//! cargo run -p kitab-db --bin kitab-admin -- migrate
//!
//! # Show applied / pending migrations
//! cargo run -p kitab-db --bin kitab-admin -- status
//!
//! # Revert everything newer than version 2
//! cargo run -p kitab-db --bin kitab-admin -- rollback 2
//!
//! # Create an admin account, or reset its password
//! cargo run -p kitab-db --bin kitab-admin -- create-admin admin rahasia
//!
//! # Fill an empty catalog with sample books
//! cargo run -p kitab-db --bin kitab-admin -- --db ./data/kitab.db seed
//! ```

use std::env;

use kitab_core::{AffiliateLinks, Availability, BookDraft, Money};
use kitab_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// Sample catalog: (name, price in rupiah)
const SAMPLE_BOOKS: &[(&str, i64)] = &[
    ("Amtsilati Jilid 1", 25_000),
    ("Amtsilati Jilid 2", 25_000),
    ("Amtsilati Jilid 3", 25_000),
    ("Amtsilati Jilid 4", 25_000),
    ("Amtsilati Jilid 5", 25_000),
    ("Khulashoh Alfiyah", 30_000),
    ("Tatimmah", 35_000),
    ("Qoidati", 20_000),
    ("Sharfiyah", 22_500),
    ("Kamus Amtsilati", 45_000),
];

const DEFAULT_DB_PATH: &str = "./data/kitab.db";

fn print_help() {
    println!("Kitab Store Admin");
    println!();
    println!("Usage: kitab-admin [--db <PATH>] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  migrate                            Apply pending migrations");
    println!("  status                             Show applied and pending migrations");
    println!("  rollback <VERSION>                 Revert migrations newer than VERSION");
    println!("  create-admin <USERNAME> <PASSWORD> Create an admin or reset its password");
    println!("  seed                               Add sample books to an empty catalog");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>    Database file path (default: {DEFAULT_DB_PATH}, or KITAB_DATABASE_PATH)");
    println!("  -h, --help         Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("KITAB_DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let Some(command) = positional.first().map(String::as_str) else {
        print_help();
        return Ok(());
    };

    // rollback must not re-apply what it is about to revert
    let run_migrations = command != "rollback" && command != "status";
    let db = Database::new(DbConfig::new(&db_path).run_migrations(run_migrations)).await?;

    println!("Database: {}", db_path);

    match (command, &positional[1..]) {
        ("migrate", []) => {
            let status = db.migration_status().await?;
            println!("✓ Migrations applied ({} total)", status.applied.len());
        }
        ("status", []) => {
            let status = db.migration_status().await?;
            for (version, description) in &status.known {
                let mark = if status.applied.contains(version) { "✓" } else { "⬜" };
                println!("  {mark} {version:04} {description}");
            }
            let pending = status.pending();
            if pending.is_empty() {
                println!("Up to date");
            } else {
                println!("{} pending", pending.len());
            }
        }
        ("rollback", [version]) => {
            let target: i64 = version.parse()?;
            db.undo_migrations(target).await?;
            println!("✓ Reverted to version {target}");
        }
        ("create-admin", [username, password]) => {
            if username.trim().is_empty() || password.is_empty() {
                return Err("username and password must not be empty".into());
            }
            let user = db.users().upsert(username, password).await?;
            println!("✓ Admin '{}' saved (id {})", user.username, user.id);
        }
        ("seed", []) => seed(&db).await?,
        _ => {
            print_help();
            db.close().await;
            return Err(format!("unrecognised command: {}", positional.join(" ")).into());
        }
    }

    db.close().await;
    Ok(())
}

/// Adds the sample catalog when no books exist yet.
async fn seed(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let existing = db.books().list_all().await?;
    if !existing.is_empty() {
        println!("⚠ Catalog already has {} books", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    for (name, price) in SAMPLE_BOOKS {
        let draft = BookDraft {
            name: name.to_string(),
            price: Money::from_rupiah(*price),
            availability: Availability::Available,
            links: AffiliateLinks::default(),
        };
        if let Err(e) = db.books().create(&draft, None).await {
            eprintln!("Failed to insert {}: {}", name, e);
        }
    }

    println!("✓ Seeded {} books", SAMPLE_BOOKS.len());
    Ok(())
}
