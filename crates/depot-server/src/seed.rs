//! Development seed data: an admin account and a handful of sample items.
//!
//! Items go through the [`Ledger`], so each one gets its `ITEM_CREATED` row.
//! Running the seeder twice is harmless.

use depot_core::{
  IdentityService, Ledger, Result,
  item::NewItem,
  store::InventoryStore,
  user::{Role, User},
};
use rust_decimal::Decimal;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "password";

/// `(name, description, category, stock, price)`
const SAMPLE_ITEMS: &[(&str, &str, &str, u32, i64)] = &[
  ("Laptop Dell XPS 15", "High-performance laptop with 16GB RAM, 512GB SSD", "Electronics", 10, 25_000_000),
  ("Office Desk", "Wooden office desk 160x80 cm", "Furniture", 5, 1_500_000),
  ("Wireless Mouse", "Logitech wireless mouse with USB receiver", "Accessories", 50, 250_000),
  ("Ergonomic Chair", "Adjustable office chair with lumbar support", "Furniture", 8, 3_200_000),
];

/// What a seeding run actually did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub admin_created: bool,
  pub items_created: usize,
}

async fn ensure_admin<S: InventoryStore>(identity: &IdentityService<S>) -> Result<(User, bool)> {
  if let Some(existing) = identity.find_by_email(ADMIN_EMAIL).await? {
    return Ok((existing, false));
  }
  let admin = identity
    .register_with_role("Admin", ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin)
    .await?;
  Ok((admin, true))
}

pub async fn run<S: InventoryStore>(
  identity: &IdentityService<S>,
  ledger: &Ledger<S>,
) -> Result<SeedReport> {
  let (admin, admin_created) = ensure_admin(identity).await?;
  let mut report = SeedReport { admin_created, ..Default::default() };

  if !ledger.list_items().await?.is_empty() {
    tracing::info!("items already present, skipping sample items");
    return Ok(report);
  }

  for &(name, description, category, stock, price) in SAMPLE_ITEMS {
    let mut input = NewItem::new(name, stock);
    input.description = description.to_owned();
    input.category = category.to_owned();
    input.price = Decimal::from(price);
    ledger.create_item(input, admin.id).await?;
    report.items_created += 1;
  }

  tracing::info!(
    admin_created = report.admin_created,
    items_created = report.items_created,
    "seed complete"
  );
  Ok(report)
}
