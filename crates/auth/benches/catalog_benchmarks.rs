//! Benchmarks for catalog projections and authorization checks.
//!
//! Run with: `cargo bench -p adminkit-auth`

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use adminkit_auth::definitions::{catalog_builder, default_catalog, moderator_grant};
use adminkit_auth::{PermissionCatalog, PermissionDefinition, PermissionKey, Principal, authorize};
use adminkit_core::UserId;

/// Catalog with `entities` CRUD definitions (4 keys each) on top of the built-ins.
fn wide_catalog(entities: usize) -> PermissionCatalog {
    (0..entities)
        .fold(catalog_builder(), |builder, i| {
            builder.register(PermissionDefinition::crud(format!("Entity{i}"), format!("entity{i}")))
        })
        .build()
        .unwrap()
}

fn bench_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    group.bench_function("build_default", |b| b.iter(|| catalog_builder().build().unwrap()));

    let catalog = wide_catalog(250);
    let grant = moderator_grant();
    group.bench_function("all_permissions_1k", |b| {
        b.iter(|| catalog.all_permissions(black_box(&grant)))
    });
    group.bench_function("all_permissions_including_1k", |b| {
        b.iter(|| catalog.all_permissions_including(black_box(&grant)))
    });

    group.finish();
}

fn bench_authorize(c: &mut Criterion) {
    let catalog = default_catalog().unwrap();
    let principal = Principal::with_permissions(UserId::new(), moderator_grant());
    let granted = PermissionKey::new("users.view");
    let denied = PermissionKey::new("roles.super_admin_assign_permission");

    c.bench_function("authorize_granted", |b| {
        b.iter(|| authorize(&principal, black_box(&granted), catalog))
    });
    c.bench_function("authorize_denied", |b| {
        b.iter(|| authorize(&principal, black_box(&denied), catalog))
    });
}

criterion_group!(benches, bench_catalog, bench_authorize);
criterion_main!(benches);
