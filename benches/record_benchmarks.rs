use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use pvs6_logger::{line, sample_snapshot, Record, Snapshot};
use serde_json::{json, Map, Value};

/// A snapshot shaped like a full residential system: a production and a
/// consumption meter plus `inverters` microinverters.
fn system_snapshot(inverters: usize) -> Snapshot {
    let mut vars = Map::new();
    vars.insert("/sys/info/serialnum".into(), json!("ZT231385000549F1084"));
    vars.insert("/sys/info/model".into(), json!("PVS6"));

    for (idx, suffix) in ["p", "c"].iter().enumerate() {
        let base = format!("/sys/devices/meter/{idx}");
        vars.insert(format!("{base}/sn"), json!(format!("PVS6M2313108{idx}{suffix}")));
        vars.insert(format!("{base}/prodMdlNm"), json!(format!("PVS6M0400{suffix}")));
        vars.insert(format!("{base}/p3phsumKw"), json!("1.234"));
        vars.insert(format!("{base}/freqHz"), json!("59.99"));
    }

    for idx in 0..inverters {
        let base = format!("/sys/devices/inverter/{idx}");
        vars.insert(format!("{base}/sn"), json!(format!("E0012215001{idx:04}")));
        vars.insert(format!("{base}/prodMdlNm"), json!("AC_Module_Type_H"));
        vars.insert(format!("{base}/p3phsumKw"), json!("0.289"));
        vars.insert(format!("{base}/vMppt1V"), json!("41.2"));
        vars.insert(format!("{base}/tHtsnkDegc"), json!("38"));
    }

    Snapshot::from_json(Value::Object(vars)).expect("Should build snapshot")
}

/// Benchmark building records from snapshots of increasing size
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_records");

    group.bench_function("sample_snapshot", |b| {
        let snapshot = sample_snapshot();
        b.iter(|| line::build(&snapshot, 1_700_000_000))
    });

    for inverters in [10, 30, 60] {
        let snapshot = system_snapshot(inverters);
        group.bench_with_input(
            BenchmarkId::from_parameter(inverters),
            &snapshot,
            |b, snapshot| b.iter(|| line::build(snapshot, 1_700_000_000)),
        );
    }

    group.finish();
}

/// Benchmark rendering and validating a full batch
fn bench_render(c: &mut Criterion) {
    let records = line::build(&system_snapshot(30), 1_700_000_000);

    c.bench_function("render_lines", |b| {
        b.iter(|| records.iter().map(Record::to_line).collect::<Vec<_>>())
    });

    let lines: Vec<String> = records.iter().map(Record::to_line).collect();
    c.bench_function("validate_lines", |b| {
        b.iter(|| lines.iter().all(|l| line::is_valid(l)))
    });
}

criterion_group!(benches, bench_build, bench_render);
criterion_main!(benches);
