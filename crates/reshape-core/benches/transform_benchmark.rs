use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reshape_core::{format_data, match_data, transform, Template};
use serde_json::{json, Map, Value};

/// Six parallel lists of `len` numbers, with a template that reads them back
/// as lists.
fn wide_lists(len: usize) -> (Value, Template) {
    let mut data = Map::new();
    let mut template = Map::new();
    for key in ["u", "v", "w", "x", "y", "z"] {
        let values: Vec<Value> = (0..len).map(|i| json!(i as f64 / 7.0)).collect();
        data.insert(key.to_string(), Value::Array(values));
        template.insert(key.to_string(), json!([format!("${key}")]));
    }
    let template = Template::from_json(&Value::Object(template)).unwrap();
    (Value::Object(data), template)
}

/// `people` profiles with `addresses` addresses of 2 crossings each
fn nested_profiles(people: usize, addresses: usize) -> (Value, Template) {
    let profiles: Vec<Value> = (0..people)
        .map(|p| {
            let addresses: Vec<Value> = (0..addresses)
                .map(|a| {
                    json!({
                        "street": format!("{a} main st"),
                        "postal_code": format!("{:05}", p * 100 + a),
                        "street_crossing": [{"name": "north"}, {"name": "south"}]
                    })
                })
                .collect();
            json!({"first_name": format!("user{p}"), "addresses": addresses})
        })
        .collect();

    let template = Template::from_json(&json!({
        "profile_list": [{
            "first_name": "$first_name",
            "addresses": [{
                "street": "$street_address",
                "postal_code": "$postal_code",
                "street_crossing": [{"name": "$street_crossing_name"}]
            }]
        }]
    }))
    .unwrap();
    (json!({ "profile_list": profiles }), template)
}

fn bench_wide_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_round_trip");

    for len in [100, 1000] {
        let (data, template) = wide_lists(len);
        group.bench_with_input(BenchmarkId::new("transform", len), &len, |b, _| {
            b.iter(|| {
                let result = transform(&data, &template, &template).unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

fn bench_transposition(c: &mut Criterion) {
    let mut group = c.benchmark_group("transposition");

    let (data, match_template) = nested_profiles(50, 4);
    let tree = match_data(&match_template, &data).unwrap();
    let rows = Template::from_json(&json!([{
        "first_name": "$first_name",
        "postal_code": "$postal_code",
        "street_crossing_name": "$street_crossing_name"
    }]))
    .unwrap();
    let accumulated = Template::from_json(&json!({
        "first_names": ["$first_name"],
        "street_crossing_name": ["$street_crossing_name"]
    }))
    .unwrap();

    group.bench_function("match", |b| {
        b.iter(|| {
            let tree = match_data(&match_template, &data).unwrap();
            black_box(tree);
        });
    });

    group.bench_function("format_rows", |b| {
        b.iter(|| {
            let result = format_data(&rows, &tree).unwrap();
            black_box(result);
        });
    });

    group.bench_function("format_accumulated", |b| {
        b.iter(|| {
            let result = format_data(&accumulated, &tree).unwrap();
            black_box(result);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_wide_round_trip, bench_transposition);
criterion_main!(benches);
