use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dclass::{pack_to_vec, DcFile, DcValue, FieldId, NumericRange, Packer, Parameter, SimpleParameter, SubatomicType};

fn schema() -> (DcFile, FieldId) {
    let mut file = DcFile::new();
    let point = file.add_class("Point", true).unwrap();
    for name in ["x", "y", "z"] {
        let f = file.new_parameter_field(name, SimpleParameter::new(SubatomicType::Float64).into());
        file.add_field(point, f).unwrap();
    }
    let name = file.new_parameter_field("name", SimpleParameter::new(SubatomicType::String).into());
    let path = file
        .array_of(Parameter::class(point), NumericRange::new())
        .unwrap();
    let path = file.new_parameter_field("path", path);
    let root = file.new_atomic_field("setPath", vec![name, path]).unwrap();
    (file, root)
}

fn value() -> DcValue {
    let points = (0..32)
        .map(|i| DcValue::List(vec![(i as f64).into(), 0.5.into(), (-1.0f64).into()]))
        .collect();
    DcValue::List(vec!["waypoints".into(), DcValue::List(points)])
}

fn pack_bench(c: &mut Criterion) {
    let (file, root) = schema();
    let value = value();
    c.bench_function("pack_value", |b| {
        b.iter(|| black_box(pack_to_vec(&file, root, &value).unwrap()))
    });
}

fn unpack_bench(c: &mut Criterion) {
    let (file, root) = schema();
    let bytes = pack_to_vec(&file, root, &value()).unwrap();
    c.bench_function("unpack_value", |b| {
        b.iter(|| {
            let mut packer = Packer::new(&file);
            packer.set_unpack_data_borrowed(&bytes);
            packer.begin_unpack(root);
            black_box(packer.unpack_value());
            packer.end_unpack().unwrap();
        })
    });
    c.bench_function("unpack_skip", |b| {
        b.iter(|| {
            let mut packer = Packer::new(&file);
            packer.set_unpack_data_borrowed(&bytes);
            packer.begin_unpack(root);
            packer.unpack_skip();
            black_box(packer.get_num_unpacked_bytes());
            packer.end_unpack().unwrap();
        })
    });
}

fn repack_bench(c: &mut Criterion) {
    let (file, root) = schema();
    let bytes = pack_to_vec(&file, root, &value()).unwrap();
    c.bench_function("repack_name", |b| {
        b.iter(|| {
            let mut packer = Packer::new(&file);
            packer.set_unpack_data_borrowed(&bytes);
            packer.begin_repack(root);
            packer.seek("name");
            packer.pack_string("renamed");
            packer.end_repack().unwrap();
            black_box(packer.take_data())
        })
    });
}

criterion_group! {
    name = pack_benches;
    config = Criterion::default();
    targets = pack_bench, unpack_bench, repack_bench
}

criterion_main!(pack_benches);
