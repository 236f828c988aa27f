//! # Seed Data
//!
//! Creates the first Super Admin and a starter hardware catalog for
//! development.
//!
//! ## Usage
//! ```bash
//! cargo run -p madeh-db --bin seed
//!
//! cargo run -p madeh-db --bin seed -- --db ./data/madeh.db \
//!     --admin-email owner@madeh.co.ke --admin-password changeme
//! ```
//!
//! An existing admin with the same email is left untouched. Products are
//! only generated into an empty catalog.

use std::env;

use madeh_core::{AdminRole, NewProduct};
use madeh_db::{Database, DbConfig, DbError, NewAdmin};

/// Starter catalog: category, then (name, price in cents, stock).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Tools",
        &[
            ("Claw Hammer 16oz", 125000, 24),
            ("Tape Measure 5m", 45000, 40),
            ("Flat Screwdriver Set", 89000, 15),
            ("Hacksaw Frame", 78000, 12),
            ("Spirit Level 600mm", 110000, 8),
            ("Adjustable Spanner 10in", 95000, 10),
        ],
    ),
    (
        "Fasteners",
        &[
            ("Wire Nails 3in (1kg)", 22000, 120),
            ("Roofing Nails (1kg)", 26000, 90),
            ("Wood Screws 40mm (100pc)", 35000, 60),
            ("Hex Bolts M10 (10pc)", 30000, 45),
        ],
    ),
    (
        "Painting",
        &[
            ("Paint Brush 2in", 15999, 50),
            ("Paint Roller 9in", 48000, 20),
            ("Masking Tape 24mm", 8750, 75),
            ("Emulsion White 4L", 235000, 18),
        ],
    ),
    (
        "Plumbing",
        &[
            ("PVC Pipe 1/2in (6m)", 42000, 30),
            ("Gate Valve 1/2in", 65000, 14),
            ("PTFE Thread Tape", 4000, 200),
            ("Elbow Joint 1/2in", 3500, 150),
        ],
    ),
    (
        "Electrical",
        &[
            ("Twin Cable 2.5mm (100m)", 890000, 4),
            ("Switch Socket 13A", 32000, 36),
            ("LED Bulb 9W", 18000, 80),
            ("Insulation Tape", 6000, 3),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./madeh_dev.db");
    let mut admin_email =
        env::var("MADEH_SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@madeh.co.ke".into());
    let mut admin_password =
        env::var("MADEH_SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "madeh-admin".into());

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-email" => {
                if i + 1 < args.len() {
                    admin_email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Madeh Hardware Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>            Database file path (default: ./madeh_dev.db)");
                println!("      --admin-email <EMAIL>  Super Admin email (default: admin@madeh.co.ke)");
                println!("      --admin-password <PW>  Super Admin password");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Madeh Hardware Seed Data");
    println!("========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let admin = NewAdmin {
        email: admin_email.clone(),
        username: "Owner".into(),
        role: AdminRole::SuperAdmin,
        password: admin_password,
    };
    match db.admins().create(&admin).await {
        Ok(created) => println!("✓ Super Admin created: {}", created.email),
        Err(DbError::UniqueViolation { .. }) => {
            println!("⚠ Admin {} already exists, leaving it unchanged", admin_email)
        }
        Err(e) => return Err(e.into()),
    }

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} products", existing);
        println!("  Skipping product seed to avoid duplicates.");
        db.close().await;
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    for (category, products) in CATALOG {
        for (name, price_cents, stock) in products.iter() {
            let product = NewProduct {
                name: (*name).to_string(),
                category: (*category).to_string(),
                price_cents: *price_cents,
                // Cost at 70% of price.
                cost_cents: Some(price_cents * 70 / 100),
                stock: *stock,
            };
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            generated += 1;
        }
        println!("  {}: {} products", category, products.len());
    }

    println!();
    println!("✓ Generated {} products", generated);
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
