//! Example: canonicalize a small imported graph
//!
//! Builds an MXNet-style source graph (pooling, activation, anchor priors),
//! runs the default pipeline and prints the resulting nodes.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example canonicalize -- [--no-passes]
//! ```

use std::env;

use graph_canonicalizer::prelude::*;
use graph_canonicalizer::tensor::format_shape;

fn main() -> GraphResult<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let no_passes = args.contains(&"--no-passes".to_string());

    let source = SourceGraph::new(SourceFormat::MxNet)
        .input("data", vec![1, 256, 20, 20])
        .op(
            "pool0",
            "Pooling",
            RawAttrs::new()
                .with("kernel", "(2, 2)")
                .with("stride", "(2, 2)")
                .with("pool_type", "max"),
        )
        .op("act0", "Activation", RawAttrs::new().with("act_type", "relu"))
        .op(
            "anchors",
            "_contrib_MultiBoxPrior",
            RawAttrs::new()
                .with("sizes", "(0.2, 0.272)")
                .with("ratios", "(1, 2, 0.5)"),
        )
        .edge("data", 0, "pool0", 0)
        .edge("pool0", 0, "act0", 0)
        .edge("act0", 0, "anchors", 0)
        .output("features", "act0", 0)
        .output("priors", "anchors", 0);

    let config = PipelineConfig {
        run_passes: !no_passes,
        validate_output: !no_passes,
        ..PipelineConfig::full()
    };
    let pipeline = Pipeline::builder().config(config).build()?;

    println!("Pass schedule: {}", pipeline.schedule().join(" -> "));

    let (graph, report) = pipeline.run(&source)?;

    println!();
    println!("Canonical graph ({} nodes):", graph.node_count());
    for node in graph.nodes() {
        let shapes: Vec<String> = node
            .outputs()
            .iter()
            .map(|p| match p.annotation().and_then(|a| a.shape.as_ref()) {
                Some(shape) => format_shape(shape),
                None => "?".to_string(),
            })
            .collect();
        println!("  {:<28} {:<14} {}", node.name(), node.op_type, shapes.join(" "));
    }

    if let Some(stats) = report.transform {
        println!();
        println!("Rewrites applied: {}", stats.transforms_applied);
        for name in &stats.transformed_nodes {
            println!("  - {}", name);
        }
    }
    if let Some(validation) = report.validation {
        println!("Warnings: {}", validation.warnings.len());
    }

    Ok(())
}
