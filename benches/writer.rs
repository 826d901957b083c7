use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndis_pcapng::{Linktype, PacketRecord, PcapNGWriter, WriterConfig};
use std::io::Cursor;

static NDIS_METADATA: [u8; 48] = [
    0x80, 0x01, 0x30, 0x00, 0x02, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00, 0x85, 0x09, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0xd6, 0xff, 0xff, 0xff, 0x82, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00,
    0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, 0x00, 0x10, 0xa5, 0xd4, 0xe8, 0x00, 0x00, 0x00,
];

fn build_records(count: usize, packet_size: usize, with_metadata: bool) -> Vec<PacketRecord> {
    (0..count)
        .map(|n| {
            let t = Utc
                .timestamp_opt(1_600_000_000 + n as i64, 0)
                .single()
                .unwrap();
            let record = PacketRecord::new(t, vec![(n % 256) as u8; packet_size]);
            if with_metadata {
                record.with_metadata(NDIS_METADATA.to_vec())
            } else {
                record
            }
        })
        .collect()
}

fn do_write_capture(records: &[PacketRecord], linktype: Linktype) -> usize {
    let config = WriterConfig::default().with_linktype(linktype);
    let mut writer =
        PcapNGWriter::new(Cursor::new(Vec::with_capacity(1 << 20)), config).unwrap();
    writer.write_packets(records).unwrap();
    let (cursor, _) = writer.finish().unwrap();
    cursor.into_inner().len()
}

fn bench_write_ethernet(c: &mut Criterion) {
    let records = build_records(1000, 1514, false);
    c.bench_function("write_capture ethernet 1000x1514", |b| {
        b.iter(|| do_write_capture(&records, Linktype::ETHERNET))
    });
}

fn bench_write_wifi_metadata(c: &mut Criterion) {
    let records = build_records(1000, 256, true);
    c.bench_function("write_capture 802.11 metadata 1000x256", |b| {
        b.iter(|| do_write_capture(&records, Linktype::IEEE802_11))
    });
}

fn bench_write_packet_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_capture packet_size");
    for packet_size in [64usize, 512, 1514, 9000].iter() {
        let records = build_records(256, *packet_size, false);
        group.throughput(Throughput::Bytes((*packet_size * records.len()) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(packet_size),
            &records,
            |b, records| b.iter(|| do_write_capture(records, Linktype::ETHERNET)),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_write_ethernet,
    bench_write_wifi_metadata,
    bench_write_packet_size
);
criterion_main!(benches);
