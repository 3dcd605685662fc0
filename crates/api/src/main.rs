//! `adminkit-seed`: provision permissions, bootstrap roles and grants.

use std::sync::Arc;

use adminkit_auth::definitions::default_catalog;
use adminkit_infra::{AppConfig, SeedPlan, Seeder, Store};

fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }
    adminkit_observability::init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        guard = %config.guard_name,
        demo_users = config.seed_demo_users,
        "seeding"
    );

    let store = Arc::new(Store::new(config.schema.clone()));
    let catalog = default_catalog()?.clone();

    let mut plan = SeedPlan::standard();
    if config.seed_demo_users {
        plan = plan.with_demo_users();
    }

    let report = Seeder::new(store, catalog, config.guard_name.clone()).run(&plan)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
