//! Criterion benchmarks for the notification payload parser.
//!
//! The parser runs once per inbound bus message, so its cost bounds how many
//! messages a single dispatch task can chew through.
//!
//! Run with:
//! ```bash
//! cargo bench --package notify-core --bench parse_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notify_core::parse_notification;

// ── Payload fixtures ──────────────────────────────────────────────────────────

fn minimal_payload() -> Vec<u8> {
    br#"{"notification": "Camera 3 motion detected"}"#.to_vec()
}

fn rich_payload() -> Vec<u8> {
    br#"{"camera":"driveway","zones":["gate","path"],"confidence":0.87,
        "snapshot":"/var/lib/nvr/snap/1699999999.jpg",
        "notification":"Person at the driveway gate"}"#
        .to_vec()
}

fn missing_field_payload() -> Vec<u8> {
    br#"{"status": "ok", "uptime": 86400}"#.to_vec()
}

fn malformed_payload() -> Vec<u8> {
    b"not-json".to_vec()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_notification");

    let fixtures = [
        ("minimal", minimal_payload()),
        ("rich", rich_payload()),
        ("missing_field", missing_field_payload()),
        ("malformed", malformed_payload()),
    ];

    for (name, payload) in &fixtures {
        group.bench_with_input(BenchmarkId::from_parameter(name), payload, |b, p| {
            b.iter(|| {
                let _ = parse_notification(black_box(p));
            })
        });
    }

    group.finish();
}

fn bench_large_body(c: &mut Criterion) {
    // Pushover caps bodies at 1024 characters; parse a payload at that limit.
    let body = "x".repeat(1024);
    let payload = format!(r#"{{"notification": "{body}"}}"#).into_bytes();

    c.bench_function("parse_notification/1024_char_body", |b| {
        b.iter(|| parse_notification(black_box(&payload)))
    });
}

criterion_group!(benches, bench_parse, bench_large_body);
criterion_main!(benches);
