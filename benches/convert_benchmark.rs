//! Benchmarks for textract2page conversion performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic Textract responses with a fixed number of
//! lines per page and words per line.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Creates a synthetic Textract JSON response.
fn create_test_response(line_count: usize, words_per_line: usize) -> String {
    let mut blocks = Vec::new();
    let line_ids: Vec<String> = (0..line_count).map(|i| format!("\"l{}\"", i)).collect();

    blocks.push(format!(
        r#"{{"BlockType":"PAGE","Id":"page","Geometry":{{"BoundingBox":{{"Left":0,"Top":0,"Width":1,"Height":1}}}},"Relationships":[{{"Type":"CHILD","Ids":[{}]}}]}}"#,
        line_ids.join(",")
    ));

    let line_height = 0.9 / line_count.max(1) as f64;
    for i in 0..line_count {
        let top = 0.05 + i as f64 * line_height;
        let word_ids: Vec<String> = (0..words_per_line)
            .map(|j| format!("\"w{}_{}\"", i, j))
            .collect();
        blocks.push(format!(
            r#"{{"BlockType":"LINE","Id":"l{}","Text":"line {}","Confidence":99.1,"Geometry":{{"BoundingBox":{{"Left":0.05,"Top":{},"Width":0.9,"Height":{}}}}},"Relationships":[{{"Type":"CHILD","Ids":[{}]}}]}}"#,
            i,
            i,
            top,
            line_height * 0.8,
            word_ids.join(",")
        ));

        let word_width = 0.9 / words_per_line.max(1) as f64;
        for j in 0..words_per_line {
            blocks.push(format!(
                r#"{{"BlockType":"WORD","Id":"w{}_{}","Text":"word{}","Confidence":97.5,"TextType":"PRINTED","Geometry":{{"BoundingBox":{{"Left":{},"Top":{},"Width":{},"Height":{}}}}}}}"#,
                i,
                j,
                j,
                0.05 + j as f64 * word_width,
                top,
                word_width * 0.9,
                line_height * 0.8
            ));
        }
    }

    format!(r#"{{"Blocks":[{}]}}"#, blocks.join(","))
}

/// Benchmark JSON parsing alone.
fn bench_parse(c: &mut Criterion) {
    let json = create_test_response(50, 8);

    c.bench_function("parse_50_lines", |b| {
        b.iter(|| textract2page::TextractResponse::from_json(black_box(&json)).unwrap());
    });
}

/// Benchmark the full conversion at various sizes.
fn bench_convert(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    let options = textract2page::ConvertOptions::new().with_image_size(2480, 3508);

    for line_count in [10, 100, 500].iter() {
        let json = create_test_response(*line_count, 8);
        let response = textract2page::TextractResponse::from_json(&json).unwrap();

        group.bench_function(format!("{}_lines", line_count), |b| {
            b.iter(|| textract2page::convert_blocks(black_box(&response.blocks), &options).unwrap());
        });
    }

    group.finish();
}

/// Benchmark XML serialization.
fn bench_render(c: &mut Criterion) {
    let json = create_test_response(100, 8);
    let options = textract2page::ConvertOptions::new().with_image_size(2480, 3508);
    let doc = textract2page::convert_str(&json, &options).unwrap();
    let render_options = textract2page::RenderOptions::default();

    c.bench_function("render_xml_100_lines", |b| {
        b.iter(|| textract2page::render::to_xml(black_box(&doc), &render_options).unwrap());
    });
}

criterion_group!(benches, bench_parse, bench_convert, bench_render);
criterion_main!(benches);
