use common::UserId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    AddCartItem, CartService, InMemoryStore, Money, Product, TrackingStatus, UpdateCartItem,
};

fn catalog() -> InMemoryStore {
    InMemoryStore::with_products((0..50).map(|i| {
        Product::new(
            format!("SKU-{i:03}"),
            format!("Product {i}"),
            Money::from_cents(100 * (i + 1)),
            1_000_000,
        )
    }))
}

fn bench_add_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CartService::new(catalog());
    let user = UserId::new();

    c.bench_function("cart/add_item_then_clear", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .add_item(AddCartItem::new(user, "SKU-001", 1))
                    .await
                    .unwrap();
                service.clear_cart(user).await.unwrap();
            });
        });
    });
}

fn bench_fill_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cart/fill_50_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = CartService::new(catalog());
                let user = UserId::new();
                for i in 0..50 {
                    service
                        .add_item(AddCartItem::new(user, format!("SKU-{i:03}"), 2))
                        .await
                        .unwrap();
                }
            });
        });
    });
}

fn bench_update_quantity_large_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CartService::new(catalog());
    let user = UserId::new();
    rt.block_on(async {
        for i in 0..50 {
            service
                .add_item(AddCartItem::new(user, format!("SKU-{i:03}"), 1))
                .await
                .unwrap();
        }
    });

    let mut quantity = 1;
    c.bench_function("cart/update_quantity_50_lines", |b| {
        b.iter(|| {
            quantity = quantity % 100 + 1;
            rt.block_on(async {
                service
                    .update_quantity(UpdateCartItem::new(user, "SKU-049", quantity))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_transition_table(c: &mut Criterion) {
    c.bench_function("tracking/transition_table", |b| {
        b.iter(|| {
            TrackingStatus::ALL
                .iter()
                .flat_map(|from| TrackingStatus::ALL.iter().map(move |to| (*from, *to)))
                .filter(|(from, to)| from.can_transition_to(*to))
                .count()
        });
    });
}

criterion_group!(
    benches,
    bench_add_item,
    bench_fill_cart,
    bench_update_quantity_large_cart,
    bench_transition_table,
);
criterion_main!(benches);
