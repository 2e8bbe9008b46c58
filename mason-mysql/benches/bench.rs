#[macro_use]
extern crate criterion;

use criterion::{BatchSize, Criterion};
use mason_mysql::Value;

fn bench_encode_literal(c: &mut Criterion) {
    let long_string = Value::Bytes(b"Spicy jalapeno bacon ipsum dolor amet doner venison ground round burgdoggen salami fatback jerky sirloin t-bone beef.".to_vec());
    let needs_escaping = Value::Bytes(b"O'Brien said \"hi\"\nand left\\".to_vec());
    let int = Value::Int(-123_456_789);
    let float = Value::Float(3.14159_26535);
    let null = Value::Null;

    for (name, value) in [
        ("bytes - plain", &long_string),
        ("bytes - needs escaping", &needs_escaping),
        ("int", &int),
        ("float", &float),
        ("null", &null),
    ] {
        c.bench_function(&format!("encode_literal - {}", name), |b| {
            b.iter(|| mason_mysql::encode_literal(criterion::black_box(value)).unwrap())
        });
    }
}

/// Throughput of the unbounded `mpsc` channel the Receiver task forwards
/// decoded frames over, exercised the same producer/consumer shape as
/// `Session::recv_frame` awaiting `Receiver::run`'s sender half.
fn bench_frame_channel(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap();

    c.bench_function("frame channel - send/recv 10_000 payloads", |b| {
        b.to_async(&rt).iter_batched(
            || (),
            |_| async {
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();

                let producer = tokio::spawn(async move {
                    for i in 0u32..10_000 {
                        tx.send(i.to_le_bytes().to_vec()).expect("receiver dropped early");
                    }
                });

                let consumer = tokio::spawn(async move {
                    let mut count = 0;
                    while rx.recv().await.is_some() {
                        count += 1;
                        if count == 10_000 {
                            break;
                        }
                    }
                });

                let _ = tokio::join!(producer, consumer);
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_encode_literal, bench_frame_channel);
criterion_main!(benches);
