//! Benchmark for itinerary documents: image grouping, JSON and HTML.
//!
//! Generates a synthetic multi-day itinerary, then times the grouping pass,
//! the steady-state re-run, the JSON round trip and the HTML round trip.

mod config;

use std::rc::Rc;
use std::time::Instant;

use tracing::info;
use tracing_subscriber::EnvFilter;
use tripdoc::extensions::{ImageGroup, ImageGroupOptions};
use tripdoc::{
    DocBuilder, Editor, GalleryLayout, Node, Schema, decode_doc, default_schema, encode_doc, from_html, to_html,
};

use config::Config;

fn build_itinerary(schema: &Schema, config: &Config) -> Node {
    let mut builder = DocBuilder::new(schema);
    for day in 0..config.days {
        let title = format!("Day {}", day + 1);
        let stop = format!("Stop {day}");
        builder = builder
            .heading(2, &title)
            .paragraph(|p| {
                p.text("Morning at ")
                    .link(&stop, "https://maps.example/stop")
                    .text(", then lunch.")
            });

        let run = day % config.max_run.max(1) + 1;
        for i in 0..run {
            builder = builder.image(&format!("day{day}-{i}.jpg"));
        }
        if day % 5 == 0 {
            builder = builder.gallery(GalleryLayout::Triple, &["g0.jpg", "g1.jpg"]);
        }
        if day % 7 == 0 {
            builder = builder.iframe("https://www.youtube.com/embed/itinerary");
        }
        builder = builder.bullet_list(&["Tickets", "Water"]);
    }
    builder.build().expect("Failed to build itinerary")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load();
    let schema = default_schema();

    let build_start = Instant::now();
    let doc = build_itinerary(&schema, &config);
    let build_time = build_start.elapsed();

    let mut images = 0;
    doc.descendants(|node, _| {
        if node.node_type() == tripdoc::NodeType::Image {
            images += 1;
        }
        true
    });
    println!(
        "Built itinerary: {} days, {} top-level blocks, {} images, size {} in {:?}",
        config.days,
        doc.child_count(),
        images,
        doc.content_size(),
        build_time
    );

    // Grouping
    let mut editor = Editor::new(schema.clone(), doc).expect("Generated itinerary is invalid");
    let options = ImageGroupOptions {
        tag_run_head: config.tag_run_head,
        ..ImageGroupOptions::default()
    };
    let grouper = Rc::new(ImageGroup::new(options));
    editor.add_observer(grouper.clone());

    let group_start = Instant::now();
    grouper.regroup(&mut editor);
    let group_time = group_start.elapsed();
    let first = grouper.stats();

    println!("\nGrouping pass: {:?}", group_time);
    println!(
        "  - {} adjacent pairs, {} ids minted, {} writes, {} failed",
        first.adjacent_pairs, first.ids_minted, first.writes, first.failed_writes
    );
    println!("  - document version after pass: {}", editor.version());

    let rerun_start = Instant::now();
    grouper.regroup(&mut editor);
    let rerun_time = rerun_start.elapsed();
    let second = grouper.stats();

    println!("\nSteady-state re-run: {:?}", rerun_time);
    println!(
        "  - {} ids reused, {} writes skipped, {} new writes",
        second.ids_reused - first.ids_reused,
        second.skipped_writes - first.skipped_writes,
        second.writes - first.writes
    );
    assert_eq!(second.writes, first.writes, "Re-run of a grouped document should not write");

    // JSON
    let doc = editor.doc();
    let encode_start = Instant::now();
    let json = encode_doc(&doc).expect("Failed to encode");
    let encode_time = encode_start.elapsed();

    println!("\nJSON encode: {} bytes in {:?}", json.len(), encode_time);
    println!(
        "  Throughput: {:.2} MB/s",
        (json.len() as f64 / 1_000_000.0) / encode_time.as_secs_f64()
    );

    let iterations = config.iterations.max(1);
    let decode_start = Instant::now();
    let mut decoded = None;
    for _ in 0..iterations {
        decoded = Some(decode_doc(&schema, &json).expect("Failed to decode"));
    }
    let decode_time = decode_start.elapsed() / iterations;
    let decoded = decoded.expect("At least one decode iteration");

    println!("JSON decode: {:?} (avg of {} iterations)", decode_time, iterations);
    println!(
        "  Throughput: {:.2} MB/s",
        (json.len() as f64 / 1_000_000.0) / decode_time.as_secs_f64()
    );
    assert_eq!(&decoded, doc.as_ref(), "JSON round trip should be lossless");

    // HTML
    let render_start = Instant::now();
    let mut html = String::new();
    for _ in 0..iterations {
        html = to_html(&schema, &doc).expect("Failed to render");
    }
    let render_time = render_start.elapsed() / iterations;

    println!("\nHTML render: {} bytes in {:?} (avg of {} iterations)", html.len(), render_time, iterations);
    println!(
        "  Grouped images in output: {}",
        html.matches("data-group=").count()
    );

    let parse_start = Instant::now();
    let parsed = from_html(&schema, &html).expect("Failed to parse HTML");
    let parse_time = parse_start.elapsed();

    println!("HTML parse: {:?}", parse_time);
    println!(
        "  Throughput: {:.2} MB/s",
        (html.len() as f64 / 1_000_000.0) / parse_time.as_secs_f64()
    );
    assert_eq!(&parsed, doc.as_ref(), "HTML round trip should be lossless");

    let summary = serde_json::json!({
        "days": config.days,
        "images": images,
        "group_ms": group_time.as_secs_f64() * 1000.0,
        "rerun_ms": rerun_time.as_secs_f64() * 1000.0,
        "writes": first.writes,
        "json_bytes": json.len(),
        "decode_ms": decode_time.as_secs_f64() * 1000.0,
        "render_ms": render_time.as_secs_f64() * 1000.0,
        "parse_ms": parse_time.as_secs_f64() * 1000.0,
    });
    println!("\n{summary}");

    info!(
        scans = second.scans,
        suppressed = second.suppressed,
        "benchmark finished"
    );
}
