use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use returnflow_core::{Money, TenantId};
use returnflow_eligibility::{default_type_options, evaluate, ReturnCategory};
use returnflow_infra::{InMemoryReturnStore, SubmitItem, SubmitReturn, SubmitReturnService};

fn submission(tenant_id: TenantId, item_count: usize) -> SubmitReturn {
    SubmitReturn {
        tenant_id,
        order_id: "gid://orders/1".to_string(),
        order_number: "1001".to_string(),
        customer_name: "Ada Lovelace".to_string(),
        customer_email: "ada@example.com".to_string(),
        reason: "Changed my mind".to_string(),
        other_reason_description: None,
        customer_notes: None,
        category: ReturnCategory::Refund,
        type_option_id: None,
        items: (0..item_count)
            .map(|i| SubmitItem {
                product_id: format!("prod-{i}"),
                product_name: format!("Product {i}"),
                variant_id: None,
                variant_name: None,
                quantity: 1,
                unit_price: Money::from_minor(2_500),
                product_image_url: None,
                exchange_product_id: None,
                exchange_product_name: None,
                exchange_variant_name: None,
            })
            .collect(),
        evidence_image_urls: vec![],
    }
}

fn bench_eligibility_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("eligibility_evaluation");
    group.sample_size(1000);

    let options = default_type_options(TenantId::new());
    let reasons = [
        "Wrong size",
        "Damaged or defective",
        "Wrong item received",
        "Changed my mind",
        "Other",
    ];

    group.bench_function("full_reason_option_matrix", |b| {
        b.iter(|| {
            for reason in &reasons {
                for option in &options {
                    black_box(evaluate(black_box(reason), option));
                }
            }
        });
    });

    group.finish();
}

fn bench_submission_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("submission_throughput");
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("benchmark runtime");

    for item_count in [1usize, 5, 20].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("in_memory_submit", item_count),
            item_count,
            |b, &count| {
                let tenant_id = TenantId::new();
                let service = SubmitReturnService::new(Arc::new(InMemoryReturnStore::new()));
                let input = submission(tenant_id, count);

                b.iter(|| {
                    let receipt = rt
                        .block_on(service.submit(black_box(input.clone())))
                        .unwrap();
                    black_box(receipt);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_eligibility_evaluation,
    bench_submission_throughput
);
criterion_main!(benches);
