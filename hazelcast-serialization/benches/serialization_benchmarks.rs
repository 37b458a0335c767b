//! Serialization/deserialization throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use hazelcast_serialization::partition::{murmur_hash3_x86_32, PARTITION_HASH_SEED};
use hazelcast_serialization::serialization::compact::{Compact, CompactReader, CompactWriter};
use hazelcast_serialization::serialization::{
    Portable, PortableFactory, PortableReader, PortableWriter,
};
use hazelcast_serialization::{
    ByteOrder, DataInput, DataOutput, ObjectDataInput, ObjectDataOutput, Result,
    SerializationConfig, SerializationService, Value,
};

#[derive(Debug, Default, Clone)]
struct Quote {
    symbol: String,
    price: f64,
    volume: i64,
}

impl Portable for Quote {
    fn factory_id(&self) -> i32 {
        1
    }

    fn class_id(&self) -> i32 {
        1
    }

    fn write_portable(&self, writer: &mut dyn PortableWriter) -> Result<()> {
        writer.write_string("symbol", Some(self.symbol.as_str()))?;
        writer.write_double("price", self.price)?;
        writer.write_long("volume", self.volume)
    }

    fn read_portable(&mut self, reader: &mut dyn PortableReader) -> Result<()> {
        self.symbol = reader.read_string("symbol")?.unwrap_or_default();
        self.price = reader.read_double("price")?;
        self.volume = reader.read_long("volume")?;
        Ok(())
    }
}

impl Compact for Quote {
    fn type_name() -> &'static str {
        "quote"
    }

    fn write(&self, writer: &mut dyn CompactWriter) -> Result<()> {
        writer.write_string("symbol", Some(self.symbol.as_str()))?;
        writer.write_float64("price", self.price)?;
        writer.write_int64("volume", self.volume)
    }

    fn read(reader: &mut dyn CompactReader) -> Result<Self> {
        Ok(Quote {
            symbol: reader.read_string("symbol")?.unwrap_or_default(),
            price: reader.read_float64("price")?,
            volume: reader.read_int64("volume")?,
        })
    }
}

struct QuoteFactory;

impl PortableFactory for QuoteFactory {
    fn create(&self, class_id: i32) -> Option<Box<dyn Portable>> {
        (class_id == 1).then(|| Box::new(Quote::default()) as Box<dyn Portable>)
    }
}

fn quote() -> Quote {
    Quote {
        symbol: "HZ".to_string(),
        price: 101.25,
        volume: 1_000_000,
    }
}

fn service() -> SerializationService {
    let config = SerializationConfig::builder()
        .add_portable_factory(1, QuoteFactory)
        .add_compact::<Quote>()
        .build()
        .unwrap();
    SerializationService::new(config).unwrap()
}

fn bench_primitive_streams(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitive_streams");

    for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
        group.bench_with_input(
            BenchmarkId::new("write_mixed", format!("{:?}", order)),
            &order,
            |b, order| {
                b.iter(|| {
                    let mut output = ObjectDataOutput::with_order(*order);
                    output.write_int(black_box(42)).unwrap();
                    output.write_long(black_box(123_456_789)).unwrap();
                    output.write_double(black_box(3.25)).unwrap();
                    output.write_bool(black_box(true)).unwrap();
                    black_box(output.into_bytes())
                })
            },
        );

        let bytes = {
            let mut output = ObjectDataOutput::with_order(order);
            output.write_int(42).unwrap();
            output.write_long(123_456_789).unwrap();
            output.write_double(3.25).unwrap();
            output.write_bool(true).unwrap();
            output.into_bytes()
        };
        group.bench_with_input(
            BenchmarkId::new("read_mixed", format!("{:?}", order)),
            &bytes,
            |b, bytes| {
                b.iter(|| {
                    let mut input = ObjectDataInput::with_order(bytes, order);
                    black_box(input.read_int().unwrap());
                    black_box(input.read_long().unwrap());
                    black_box(input.read_double().unwrap());
                    black_box(input.read_bool().unwrap())
                })
            },
        );
    }

    group.finish();
}

fn bench_string_to_data(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_to_data");
    let service = service();

    for size in [10, 100, 1000, 10000].iter() {
        let value = Value::String("x".repeat(*size));
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("to_data", size), &value, |b, v| {
            b.iter(|| black_box(service.to_data(v).unwrap()))
        });

        let data = service.to_data(&value).unwrap();
        group.bench_with_input(BenchmarkId::new("to_object", size), &data, |b, d| {
            b.iter(|| black_box(service.to_object(d).unwrap()))
        });
    }

    group.finish();
}

fn bench_portable(c: &mut Criterion) {
    let mut group = c.benchmark_group("portable");
    let service = service();
    let value = Value::portable(quote());
    let data = service.to_data(&value).unwrap();

    group.bench_function("to_data", |b| {
        b.iter(|| black_box(service.to_data(&value).unwrap()))
    });
    group.bench_function("to_object", |b| {
        b.iter(|| black_box(service.to_object(&data).unwrap()))
    });

    group.finish();
}

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("compact");
    let service = service();
    let value = Value::object(quote());
    let data = service.to_data_with_replication(&value).unwrap();

    group.bench_function("to_data", |b| {
        b.iter(|| black_box(service.to_data(&value).unwrap()))
    });
    group.bench_function("to_object", |b| {
        b.iter(|| black_box(service.to_object(&data).unwrap()))
    });

    group.finish();
}

fn bench_partition_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_hash");

    for size in [16, 256, 4096].iter() {
        let bytes = vec![0xabu8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("murmur3", size), &bytes, |b, bytes| {
            b.iter(|| black_box(murmur_hash3_x86_32(bytes, PARTITION_HASH_SEED)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_primitive_streams,
    bench_string_to_data,
    bench_portable,
    bench_compact,
    bench_partition_hash,
);

criterion_main!(benches);
