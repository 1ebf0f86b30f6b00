use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use user_service::models::{SortField, SortOrder, UserFilter};
use user_service::services::projection::project;
use user_service::services::query::compile_search;

fn benchmark_compile_search(c: &mut Criterion) {
    let empty = UserFilter::default();

    let full = UserFilter {
        search: Some("john".to_string()),
        date_from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        date_to: Some(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()),
        lat: Some(59.93428),
        lon: Some(30.335098),
        distance: Some("5km".to_string()),
        social_net: Some("telegram".to_string()),
        sort_by: Some(SortField::RegDate),
        sort_order: Some(SortOrder::Desc),
        page: Some(3),
        size: Some(50),
    };

    let mut group = c.benchmark_group("compile_search");

    group.bench_function("match_all", |b| {
        b.iter(|| compile_search(black_box(&empty)))
    });

    group.bench_function("all_clauses", |b| {
        b.iter(|| compile_search(black_box(&full)))
    });

    group.bench_function("all_clauses_to_body", |b| {
        b.iter(|| compile_search(black_box(&full)).to_body())
    });

    group.finish();
}

fn benchmark_project(c: &mut Criterion) {
    let point = geo::Point::new(30.335098, 59.93428);

    c.bench_function("project_z13", |b| {
        b.iter(|| project(black_box(point), black_box(13)))
    });
}

criterion_group!(benches, benchmark_compile_search, benchmark_project);
criterion_main!(benches);
