//! Benchmarks for the collaboration hot paths: protocol codec, history
//! commits at capacity, and relay fan-out to a full room.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use easel_collab::protocol::ChannelMessage;
use easel_collab::relay::{ConnectionHandle, Relay};
use easel_core::{History, Snapshot};
use serde_json::json;
use tokio::runtime::Runtime;
use uuid::Uuid;

fn bench_protocol_codec(c: &mut Criterion) {
    let msg = ChannelMessage::canvas_update(
        (0..16)
            .map(|i| json!({"op": "move", "layer": i, "x": 10.0, "y": 20.0}))
            .collect(),
        Some("user-1".into()),
    );
    let encoded = msg.encode().unwrap();

    c.bench_function("protocol_encode_canvas_update", |b| {
        b.iter(|| black_box(&msg).encode().unwrap())
    });

    c.bench_function("protocol_decode_canvas_update", |b| {
        b.iter(|| ChannelMessage::decode(black_box(&encoded)).unwrap())
    });
}

fn bench_history_commit(c: &mut Criterion) {
    let snapshot = Snapshot::new(json!({
        "layers": (0..32).map(|i| json!({"id": i, "kind": "rect"})).collect::<Vec<_>>()
    }));

    c.bench_function("history_commit_at_capacity", |b| {
        // Pre-fill to the cap so every commit pays the drop-oldest cost
        let mut history = History::new();
        for _ in 0..60 {
            history.record(&snapshot);
        }
        b.iter(|| history.record(black_box(&snapshot)))
    });
}

fn bench_relay_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let relay = Arc::new(Relay::new());
    let doc_id = Uuid::new_v4();

    // 100 members, each drained by its own consumer task
    rt.block_on(async {
        for _ in 0..100 {
            let (tx, mut rx) = tokio::sync::mpsc::channel(1024);
            relay.join(doc_id, ConnectionHandle::new(Uuid::new_v4(), tx)).await;
            tokio::spawn(async move { while rx.recv().await.is_some() {} });
        }
    });

    let msg = ChannelMessage::cursor_move(1.0, 2.0, Some("user-1".into()));

    c.bench_function("relay_broadcast_100_members", |b| {
        b.iter(|| {
            rt.block_on(relay.broadcast(doc_id, black_box(&msg), None));
        })
    });
}

criterion_group!(
    benches,
    bench_protocol_codec,
    bench_history_commit,
    bench_relay_fan_out
);
criterion_main!(benches);
