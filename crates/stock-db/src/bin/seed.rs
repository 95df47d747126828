//! # Seed Data Generator
//!
//! Populates a database with the owner-restriction reference scenario and
//! reports what each availability mode and each owner policy yields.
//!
//! ## Usage
//! ```bash
//! # Uses STOCK_DB_PATH (default ./stock.db)
//! cargo run -p stock-db --bin seed
//!
//! # Specify database path
//! cargo run -p stock-db --bin seed -- --db ./data/stock.db
//! ```
//!
//! ## Generated Data
//! - Locations `WH` (view), `WH/Stock` (internal), `Customers`
//! - Partners "Customer test" and "Owner test"
//! - Product "Test restriction" with 500 unowned and 500 owned units
//! - Picking type "Delivery Orders" and one draft delivery of 1000 units

use serde::Serialize;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stock_core::{AvailabilityMode, LocationUsage, OwnerRestriction, PickingTypeCode, Quantity};
use stock_db::{
    AvailabilityQuery, Database, NewMove, NewPicking, NewPickingType, NewQuant, StockConfig,
};

/// Summary printed as JSON at the end of the run.
#[derive(Debug, Serialize)]
struct SeedReport {
    product_id: String,
    owner_id: String,
    qty_available_default: Quantity,
    qty_available_force_owner: Quantity,
    qty_available_skip_restriction: Quantity,
    reservations: Vec<PolicyReservation>,
}

#[derive(Debug, Serialize)]
struct PolicyReservation {
    policy: OwnerRestriction,
    reserved: Quantity,
    lines: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = StockConfig::load()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stock seed data generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $STOCK_DB_PATH or ./stock.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing(&config.log_filter);

    info!(path = %config.database_path.display(), "Seeding database");
    let db = Database::new(config.db_config()).await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let report = seed(&db).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    db.close().await;
    Ok(())
}

/// Installs the fmt subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn seed(db: &Database) -> Result<SeedReport, Box<dyn std::error::Error>> {
    let wh = db.locations().create("WH", LocationUsage::View, None).await?;
    let stock = db
        .locations()
        .create("Stock", LocationUsage::Internal, Some(wh.id.as_str()))
        .await?;
    let customers = db
        .locations()
        .create("Customers", LocationUsage::Customer, None)
        .await?;

    let customer = db.partners().create("Customer test").await?;
    let owner = db.partners().create("Owner test").await?;
    let product = db.products().create("Test restriction", Some("TEST-RESTRICT")).await?;

    db.quants()
        .create(&NewQuant::new(&product.id, &stock.id, Quantity::from_units(500)))
        .await?;
    db.quants()
        .create(&NewQuant::new(&product.id, &stock.id, Quantity::from_units(500)).owner(&owner.id))
        .await?;

    let mut new_type = NewPickingType::new("Delivery Orders", PickingTypeCode::Outgoing);
    new_type.default_location_src_id = Some(stock.id.clone());
    new_type.default_location_dest_id = Some(customers.id.clone());
    let picking_type = db.picking_types().create(&new_type).await?;

    let picking = db
        .pickings()
        .create(&NewPicking::new("WH/OUT/00001", &picking_type.id).partner(&customer.id))
        .await?;
    db.moves()
        .create(
            &NewMove::new("Test restriction", &product.id, Quantity::from_units(1000))
                .picking(&picking.id),
        )
        .await?;
    info!(picking = %picking.name, "Reference scenario created");

    let products = db.products();
    let qty_available_default = products
        .qty_available(&product.id, &AvailabilityQuery::default())
        .await?;
    let qty_available_force_owner = products
        .qty_available(
            &product.id,
            &AvailabilityQuery::new(AvailabilityMode::ForceOwner(owner.id.clone())),
        )
        .await?;
    let qty_available_skip_restriction = products
        .qty_available(&product.id, &AvailabilityQuery::new(AvailabilityMode::SkipRestriction))
        .await?;
    info!(
        default = %qty_available_default,
        force_owner = %qty_available_force_owner,
        skip_restriction = %qty_available_skip_restriction,
        "Available quantity per mode"
    );

    let mut reservations = Vec::with_capacity(OwnerRestriction::ALL.len());
    for policy in OwnerRestriction::ALL {
        db.picking_types()
            .set_owner_restriction(&picking_type.id, policy)
            .await?;
        db.pickings().action_assign(&picking.id).await?;

        let reserved = db.pickings().reserved_quantity(&picking.id).await?;
        let lines = db.pickings().move_lines(&picking.id).await?.len();
        info!(%policy, %reserved, lines, "Reserved under policy");
        reservations.push(PolicyReservation {
            policy,
            reserved,
            lines,
        });

        db.pickings().do_unreserve(&picking.id).await?;
    }

    Ok(SeedReport {
        product_id: product.id,
        owner_id: owner.id,
        qty_available_default,
        qty_available_force_owner,
        qty_available_skip_restriction,
        reservations,
    })
}
