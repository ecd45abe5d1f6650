//! End-to-end canonicalization
//!
//! Runs extraction, inference, the scheduled passes and validation over a
//! [`SourceGraph`]. The pass schedule is computed by
//! [`PipelineBuilder::build`], so ordering errors surface before any graph
//! is created.
//!
//! # Example
//!
//! ```ignore
//! use graph_canonicalizer::pipeline::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::builder()
//!     .config(PipelineConfig::full())
//!     .disable_pass("AvgPool")
//!     .build()?;
//!
//! let (graph, report) = pipeline.run(&source)?;
//! println!("{} rewrites", report.transform.map_or(0, |t| t.transforms_applied));
//! ```

use log::info;

use crate::error::{GraphResult, TransformError};
use crate::extract::{ExtractFn, ExtractorRegistry, SourceFormat};
use crate::front::SourceGraph;
use crate::graph::Graph;
use crate::infer::{InferFn, InferStats, InferenceEngine, InferenceRegistry};
use crate::traits::Transformer;
use crate::transform::{Pass, PassRegistry, TransformConfig, TransformEngine, TransformStats};
use crate::transformers::default_passes;
use crate::validation::{check_canonical, ValidationResult};

/// Pipeline options
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Annotate output ports before the passes run
    pub infer: bool,
    /// Run the scheduled passes
    pub run_passes: bool,
    /// Check the canonical-output contract at the end
    pub validate_output: bool,
    /// Fail when a mutation leaves its match in place
    pub verify_postconditions: bool,
    /// Passes to disable by name
    pub disabled_passes: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            infer: true,
            run_passes: true,
            validate_output: true,
            verify_postconditions: true,
            disabled_passes: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Every stage enabled
    pub fn full() -> Self {
        Self::default()
    }

    /// Import only; no inference, passes or validation
    pub fn extract_only() -> Self {
        Self {
            infer: false,
            run_passes: false,
            validate_output: false,
            ..Self::default()
        }
    }
}

/// What each stage of one run did
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Operator records imported from the source graph
    pub imported_nodes: usize,
    /// Inference counters, if inference ran
    pub infer: Option<InferStats>,
    /// Pass counters, if the passes ran
    pub transform: Option<TransformStats>,
    /// Validation report, if validation ran
    pub validation: Option<ValidationResult>,
}

/// Builder for [`Pipeline`]
///
/// Starts from the built-in extractors, inference functions and passes.
pub struct PipelineBuilder {
    config: PipelineConfig,
    extractors: ExtractorRegistry,
    inference: InferenceRegistry,
    passes: PassRegistry,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            extractors: ExtractorRegistry::with_defaults(),
            inference: InferenceRegistry::with_defaults(),
            passes: default_passes(),
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register or override an extractor
    pub fn extractor(mut self, format: SourceFormat, op: &str, extract: ExtractFn) -> Self {
        self.extractors.register(format, op, extract);
        self
    }

    /// Register or override an inference function
    pub fn infer_fn(mut self, op_type: &str, infer: InferFn) -> Self {
        self.inference.register(op_type, infer);
        self
    }

    /// Append a pass after the built-in ones
    pub fn pass(mut self, pass: Pass) -> Self {
        self.passes.register(pass);
        self
    }

    /// Append a typed pass after the built-in ones
    pub fn transformer<T: Transformer + 'static>(self, transformer: T) -> Self {
        self.pass(transformer.into_pass())
    }

    /// Disable a pass by name
    pub fn disable_pass(mut self, name: &str) -> Self {
        self.config.disabled_passes.push(name.to_string());
        self
    }

    /// Apply the disabled-pass list and compute the schedule
    pub fn build(mut self) -> GraphResult<Pipeline> {
        for name in &self.config.disabled_passes {
            if !self.passes.set_enabled(name, false) {
                return Err(TransformError::UnknownPass {
                    pass: "disabled_passes".to_string(),
                    missing: name.clone(),
                });
            }
        }
        let schedule = self.passes.schedule_names()?;
        info!("Pipeline schedule: {}", schedule.join(" -> "));

        Ok(Pipeline {
            config: self.config,
            extractors: self.extractors,
            inference: self.inference,
            passes: self.passes,
            schedule,
        })
    }
}

/// Configured canonicalization pipeline
pub struct Pipeline {
    config: PipelineConfig,
    extractors: ExtractorRegistry,
    inference: InferenceRegistry,
    passes: PassRegistry,
    schedule: Vec<String>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enabled pass names in execution order
    pub fn schedule(&self) -> &[String] {
        &self.schedule
    }

    /// Import a source graph and canonicalize it
    pub fn run(&self, source: &SourceGraph) -> GraphResult<(Graph, PipelineReport)> {
        let mut graph = source.import(&self.extractors)?;
        let mut report = self.canonicalize(&mut graph)?;
        report.imported_nodes = source.records().len();
        Ok((graph, report))
    }

    /// Run the configured stages on an existing graph
    pub fn canonicalize(&self, graph: &mut Graph) -> GraphResult<PipelineReport> {
        let mut report = PipelineReport::default();

        if self.config.infer {
            report.infer = Some(InferenceEngine::new(&self.inference).run(graph)?);
        }

        if self.config.run_passes {
            let engine = TransformEngine::new(&self.passes)?.with_config(TransformConfig {
                verify_postconditions: self.config.verify_postconditions,
            });
            report.transform = Some(engine.run(graph)?);
        }

        if self.config.validate_output {
            report.validation = Some(check_canonical(graph)?);
        }

        info!(
            "Canonicalized graph: {} node(s), {} connection(s)",
            graph.node_count(),
            graph.connection_count()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawAttrs;
    use crate::graph::{Annotation, PortRef};
    use crate::pattern::{Match, Pattern};

    fn pool_source(method: &str) -> SourceGraph {
        let op = if method == "max" { "MaxPool" } else { "AveragePool" };
        SourceGraph::new(SourceFormat::Onnx)
            .input("data", vec![1, 3, 8, 8])
            .op(
                "pool",
                op,
                RawAttrs::new()
                    .with("kernel_shape", vec![2i64, 2])
                    .with("strides", vec![2i64, 2]),
            )
            .edge("data", 0, "pool", 0)
            .output("pooled", "pool", 0)
    }

    #[test]
    fn test_max_pool_end_to_end() {
        let pipeline = Pipeline::builder().build().unwrap();
        let (graph, report) = pipeline.run(&pool_source("max")).unwrap();

        // The producer took over the output name
        let pool = graph.node_by_name("pooled").unwrap();
        assert_eq!(pool.op_type, "MaxPool");
        assert!(pool.attrs.was_removed("pool_method"));
        assert!(graph.find_nodes_by_type("FakeOutput").is_empty());

        // Indices output got its own terminal
        let indices = graph.consumers_of(pool.id, 1);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].name(), "pooled/Result_port_1/");
        assert_eq!(graph.consumers_of(pool.id, 0)[0].name(), "pooled/sink");
        assert_eq!(
            graph.output_annotation(PortRef::output(pool.id, 0)),
            Some(&Annotation::shape(vec![1, 3, 4, 4]))
        );

        assert_eq!(report.imported_nodes, 1);
        let validation = report.validation.unwrap();
        assert!(validation.is_valid);
        assert!(validation.warnings.is_empty());
    }

    #[test]
    fn test_avg_pool_end_to_end() {
        let pipeline = Pipeline::builder().build().unwrap();
        let (graph, _) = pipeline.run(&pool_source("avg")).unwrap();

        let pool = graph.node_by_name("pooled").unwrap();
        assert_eq!(pool.op_type, "AvgPool");
        assert!(pool.attrs.contains("exclude_pad"));
    }

    #[test]
    fn test_gather_without_axis() {
        let source = SourceGraph::new(SourceFormat::Onnx)
            .input("data", vec![5, 4])
            .input("indices", vec![3])
            .op("gather", "Gather", RawAttrs::new())
            .edge("data", 0, "gather", 0)
            .edge("indices", 0, "gather", 1)
            .output("picked", "gather", 0);

        let pipeline = Pipeline::builder().build().unwrap();
        let (graph, _) = pipeline.run(&source).unwrap();

        let gather = graph.node_by_name("picked").unwrap();
        assert_eq!(gather.op_type, "Gather");
        assert!(gather.attrs.was_removed("axis"));
        assert_eq!(
            graph.output_annotation(PortRef::output(gather.id, 0)),
            Some(&Annotation::shape(vec![3, 4]))
        );
        let axis = graph.producer_of(gather.id, 2).unwrap();
        assert_eq!(axis.op_type, "Const");
        assert_eq!(
            graph.input_annotation(gather.id, 2).and_then(|a| a.value.clone()),
            Some(vec![0])
        );
    }

    #[test]
    fn test_multi_box_prior_current_format() {
        let source = SourceGraph::new(SourceFormat::MxNet)
            .input("data", vec![1, 256, 10, 10])
            .op(
                "prior",
                "_contrib_MultiBoxPrior",
                RawAttrs::new()
                    .with("sizes", "(0.2, 0.3, 0.4)")
                    .with("ratios", "(1.0, 2.0)"),
            )
            .edge("data", 0, "prior", 0)
            .output("anchors", "prior", 0);

        let pipeline = Pipeline::builder().build().unwrap();
        let (graph, _) = pipeline.run(&source).unwrap();

        let prior = graph.node_by_name("anchors").unwrap();
        assert_eq!(
            graph.output_annotation(PortRef::output(prior.id, 0)),
            Some(&Annotation::shape(vec![1, 2, 1600]))
        );
    }

    #[test]
    fn test_cycle_fails_at_build() {
        let noop = |_: &mut Graph, _: &Match| -> GraphResult<()> { Ok(()) };
        let result = Pipeline::builder()
            .pass(Pass::new("A", Pattern::single("n", "Relu"), noop).runs_after("B"))
            .pass(Pass::new("B", Pattern::single("n", "Relu"), noop).runs_after("A"))
            .build();

        match result {
            Err(TransformError::CyclicPassDependency(passes)) => {
                assert_eq!(passes, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|p| p.schedule().to_vec())),
        }
    }

    #[test]
    fn test_disabled_pass_leaves_node_alone() {
        let pipeline = Pipeline::builder()
            .config(PipelineConfig {
                validate_output: false,
                ..PipelineConfig::default()
            })
            .disable_pass("MaxPool")
            .build()
            .unwrap();
        assert!(!pipeline.schedule().contains(&"MaxPool".to_string()));

        let (graph, _) = pipeline.run(&pool_source("max")).unwrap();
        assert_eq!(graph.node_by_name("pooled").unwrap().op_type, "Pooling");
    }

    #[test]
    fn test_unknown_disabled_pass() {
        assert!(matches!(
            Pipeline::builder().disable_pass("NoSuchPass").build(),
            Err(TransformError::UnknownPass { .. })
        ));
    }

    #[test]
    fn test_extract_only() {
        let pipeline = Pipeline::builder()
            .config(PipelineConfig::extract_only())
            .build()
            .unwrap();
        let (graph, report) = pipeline.run(&pool_source("max")).unwrap();

        assert!(report.infer.is_none());
        assert!(report.transform.is_none());
        assert_eq!(graph.node_by_name("pool").unwrap().op_type, "Pooling");
        assert_eq!(graph.find_nodes_by_type("FakeOutput").len(), 1);
    }
}
