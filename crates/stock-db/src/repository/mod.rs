//! # Repository Module
//!
//! Database repository implementations for the warehouse model.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                                 │
//! │       │  db.pickings().action_assign(&picking.id)                      │
//! │       ▼                                                                 │
//! │  PickingRepository ──► stock_move::reserve_move (per move, in one tx)  │
//! │       │                     │                                           │
//! │       │                     ├── quant::gather        (SQL)              │
//! │       │                     ├── eligible_quants      (stock-core)       │
//! │       │                     ├── plan_reservation     (stock-core)       │
//! │       │                     └── INSERT move_lines / UPDATE quants       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`partner::PartnerRepository`] - Partners (customers, stock owners)
//! - [`location::LocationRepository`] - Location tree
//! - [`product::ProductRepository`] - Products, available quantity, search
//! - [`lot::LotRepository`] - Lots with archiving
//! - [`quant::QuantRepository`] - On-hand stock
//! - [`picking_type::PickingTypeRepository`] - Transfer types and policies
//! - [`picking::PickingRepository`] - Transfers and their workflows
//! - [`stock_move::StockMoveRepository`] - Moves and move lines

pub mod location;
pub mod lot;
pub mod partner;
pub mod picking;
pub mod picking_type;
pub mod product;
pub mod quant;
pub mod stock_move;

use uuid::Uuid;

/// Generates a new record id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixture: the reference owner-restriction scenario.

    use stock_core::{
        Location, LocationUsage, OwnerRestriction, Partner, Picking, PickingType,
        PickingTypeCode, Product, Quantity,
    };

    use crate::pool::{Database, DbConfig};
    use crate::repository::picking::NewPicking;
    use crate::repository::picking_type::NewPickingType;
    use crate::repository::quant::NewQuant;

    pub struct Scenario {
        pub db: Database,
        pub stock: Location,
        pub customers: Location,
        pub customer: Partner,
        pub owner: Partner,
        pub product: Product,
        pub picking_type: PickingType,
        pub picking: Picking,
    }

    /// 500 unowned + 500 owned units in WH/Stock, and a draft delivery to
    /// the customer.
    pub async fn scenario() -> Scenario {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let wh = db.locations().create("WH", LocationUsage::View, None).await.unwrap();
        let stock = db
            .locations()
            .create("Stock", LocationUsage::Internal, Some(wh.id.as_str()))
            .await
            .unwrap();
        let customers = db
            .locations()
            .create("Customers", LocationUsage::Customer, None)
            .await
            .unwrap();

        let customer = db.partners().create("Customer test").await.unwrap();
        let owner = db.partners().create("Owner test").await.unwrap();
        let product = db.products().create("Test restriction", None).await.unwrap();

        db.quants()
            .create(&NewQuant::new(&product.id, &stock.id, Quantity::from_units(500)))
            .await
            .unwrap();
        db.quants()
            .create(
                &NewQuant::new(&product.id, &stock.id, Quantity::from_units(500))
                    .owner(&owner.id),
            )
            .await
            .unwrap();

        let picking_type = db
            .picking_types()
            .create(&NewPickingType {
                name: "Delivery Orders".to_string(),
                code: PickingTypeCode::Outgoing,
                default_location_src_id: Some(stock.id.clone()),
                default_location_dest_id: Some(customers.id.clone()),
                owner_restriction: OwnerRestriction::default(),
                restrict_cancel_if_printed: true,
            })
            .await
            .unwrap();

        let picking = db
            .pickings()
            .create(&NewPicking::new("WH/OUT/00001", &picking_type.id).partner(&customer.id))
            .await
            .unwrap();

        Scenario {
            db,
            stock,
            customers,
            customer,
            owner,
            product,
            picking_type,
            picking,
        }
    }
}
