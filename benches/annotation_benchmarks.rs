use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use external_extruder::expr::{Env, PinExpression};
use external_extruder::layers::split_layers;
use external_extruder::settings::{
    Settings, StateChangeSettings, StrategySettings, DEFAULT_PIN_EXPRESSIONS,
};
use external_extruder::{parse_line, transform};
use std::hint::black_box;

/// Generate sliced G-code of different patterns for benchmarking
fn generate_gcode_content(lines: usize, pattern: &str) -> String {
    let mut content = String::from(";FLAVOR:Marlin\nM83\nG1 F1800\n");

    match pattern {
        "varying_rate" => {
            for i in 0..lines {
                if i % 200 == 0 {
                    content.push_str(&format!(";LAYER:{}\n", i / 200));
                }
                content.push_str(&format!(
                    "G1 X{:.3} Y{:.3} E{:.4}\n",
                    (i as f32) * 0.1,
                    (i as f32) * 0.2,
                    ((i % 17) as f32) * 0.05
                ));
            }
        }
        "retract_heavy" => {
            for i in 0..lines {
                match i % 4 {
                    0 => content.push_str("G1 E-0.8 ;retract\n"),
                    1 => content.push_str(&format!("G0 X{:.1} Y{:.1} F6000\n", i as f32, i as f32)),
                    2 => content.push_str("G1 E0.8\n"),
                    _ => content.push_str(&format!("G1 X{:.1} E0.05 F1800\n", i as f32 + 0.5)),
                }
            }
        }
        _ => {
            for i in 0..lines {
                content.push_str(&format!("G1 X{} Y{} E0.1\n", i, i));
            }
        }
    }

    content
}

fn benchmark_line_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_parsing");
    let content = generate_gcode_content(1000, "varying_rate");
    group.throughput(Throughput::Bytes(content.len() as u64));

    group.bench_function("parse_and_code", |b| {
        b.iter(|| {
            for raw in content.split_inclusive('\n') {
                black_box(parse_line(black_box(raw)).code());
            }
        })
    });
    group.finish();
}

fn benchmark_expression_evaluation(c: &mut Criterion) {
    let expressions: Vec<PinExpression> = DEFAULT_PIN_EXPRESSIONS
        .iter()
        .filter_map(|source| PinExpression::compile(source).ok())
        .collect();

    c.bench_function("evaluate_default_pins", |b| {
        b.iter(|| {
            for rate in [0.0, 12.5, 37.5, 75.0, 200.0] {
                let env = Env {
                    extrusion_rate: rate,
                    maximum_extrusion_rate: 75.0,
                };
                for expression in &expressions {
                    let _ = black_box(expression.evaluate(black_box(&env)));
                }
            }
        })
    });
}

fn benchmark_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for (name, settings) in [
        ("bit_expression", Settings::default()),
        (
            "state_change",
            Settings {
                strategy: StrategySettings::StateChange(StateChangeSettings::default()),
                ..Settings::default()
            },
        ),
    ] {
        let Ok(config) = settings.compile() else {
            continue;
        };

        for pattern in ["varying_rate", "retract_heavy"] {
            let content = generate_gcode_content(10_000, pattern);
            let layers = split_layers(&content);
            group.throughput(Throughput::Elements(10_000));
            group.bench_with_input(
                BenchmarkId::new(name, pattern),
                &layers,
                |b, layers| {
                    b.iter(|| {
                        let _ = black_box(transform(
                            config.clone(),
                            black_box(layers.as_slice()),
                        ));
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_line_parsing,
    benchmark_expression_evaluation,
    benchmark_transform
);
criterion_main!(benches);
