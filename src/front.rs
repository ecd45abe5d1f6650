//! Source graph import
//!
//! A [`SourceGraph`] is what an external parser hands over: graph inputs,
//! raw operator records in source order, edges between record ports and the
//! tensors the user wants exposed as outputs. [`SourceGraph::import`] turns
//! it into a [`Graph`] through the extractor registry.
//!
//! # Example
//!
//! ```ignore
//! use graph_canonicalizer::extract::{ExtractorRegistry, RawAttrs, SourceFormat};
//! use graph_canonicalizer::front::SourceGraph;
//!
//! let source = SourceGraph::new(SourceFormat::Onnx)
//!     .input("data", vec![1, 3, 8, 8])
//!     .op("pool", "MaxPool", RawAttrs::new().with("kernel_shape", vec![2i64, 2]))
//!     .edge("data", 0, "pool", 0)
//!     .output("pooled", "pool", 0);
//!
//! let graph = source.import(&ExtractorRegistry::with_defaults())?;
//! ```

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::{GraphResult, TransformError};
use crate::extract::{ExtractorRegistry, RawAttrs, SourceFormat};
use crate::graph::{Graph, NodeDesc, NodeId, PortRef};
use crate::tensor::{format_shape, Shape};

/// One raw operator of the source model
#[derive(Debug, Clone, PartialEq)]
pub struct OpRecord {
    /// Unique operator name
    pub name: String,
    /// Operator type in the source format
    pub op: String,
    /// Raw attributes
    pub attrs: RawAttrs,
    /// Input ports used by the source model
    pub inputs: usize,
    /// Output ports used by the source model
    pub outputs: usize,
}

/// Edge `(src, out port) → (dst, in port)` between named operators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdge {
    pub src: String,
    pub src_port: usize,
    pub dst: String,
    pub dst_port: usize,
}

/// Requested model output: a marker name and the port it exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutput {
    pub name: String,
    pub src: String,
    pub src_port: usize,
}

/// Graph as produced by an external model parser
#[derive(Debug, Clone)]
pub struct SourceGraph {
    format: SourceFormat,
    inputs: Vec<(String, Shape)>,
    records: Vec<OpRecord>,
    edges: Vec<SourceEdge>,
    outputs: Vec<SourceOutput>,
}

impl SourceGraph {
    /// Create an empty source graph of the given format
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            inputs: Vec::new(),
            records: Vec::new(),
            edges: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Add a graph input; it becomes a `Parameter` node
    pub fn input(mut self, name: &str, shape: Shape) -> Self {
        self.inputs.push((name.to_string(), shape));
        self
    }

    /// Add an operator whose port counts come from its extractor
    pub fn op(self, name: &str, op: &str, attrs: RawAttrs) -> Self {
        self.op_with_ports(name, op, attrs, 0, 0)
    }

    /// Add an operator with explicit port counts
    ///
    /// The node gets at least as many ports as its extractor declares.
    pub fn op_with_ports(mut self, name: &str, op: &str, attrs: RawAttrs, inputs: usize, outputs: usize) -> Self {
        self.records.push(OpRecord {
            name: name.to_string(),
            op: op.to_string(),
            attrs,
            inputs,
            outputs,
        });
        self
    }

    /// Connect `src:src_port` to `dst:dst_port`
    pub fn edge(mut self, src: &str, src_port: usize, dst: &str, dst_port: usize) -> Self {
        self.edges.push(SourceEdge {
            src: src.to_string(),
            src_port,
            dst: dst.to_string(),
            dst_port,
        });
        self
    }

    /// Expose `src:src_port` as a model output called `name`
    pub fn output(mut self, name: &str, src: &str, src_port: usize) -> Self {
        self.outputs.push(SourceOutput {
            name: name.to_string(),
            src: src.to_string(),
            src_port,
        });
        self
    }

    pub fn records(&self) -> &[OpRecord] {
        &self.records
    }

    pub fn edges(&self) -> &[SourceEdge] {
        &self.edges
    }

    pub fn outputs(&self) -> &[SourceOutput] {
        &self.outputs
    }

    /// Build the operator graph
    ///
    /// Every record is extracted first, so an unsupported operator fails
    /// before any node exists. Requested outputs become a `FakeOutput`
    /// marker followed by a `Result` terminal.
    pub fn import(&self, extractors: &ExtractorRegistry) -> GraphResult<Graph> {
        let extracted = self
            .records
            .iter()
            .map(|record| extractors.extract(self.format, &record.op, &record.attrs))
            .collect::<GraphResult<Vec<_>>>()?;

        let mut graph = Graph::new();
        let mut ids: FxHashMap<&str, NodeId> = FxHashMap::default();

        for (name, shape) in &self.inputs {
            let id = graph.add_node(
                NodeDesc::new("Parameter")
                    .name(name)
                    .attr("shape", shape.clone())
                    .ports(0, 1),
            );
            debug!("Graph input '{}' {}", name, format_shape(shape));
            register_name(&mut ids, name, id)?;
        }

        for (record, attrs) in self.records.iter().zip(extracted) {
            let id = graph.add_node(
                NodeDesc::new(&attrs.op_type)
                    .name(&record.name)
                    .attrs(attrs.attrs)
                    .ports(record.inputs.max(attrs.inputs), record.outputs.max(attrs.outputs)),
            );
            register_name(&mut ids, &record.name, id)?;
        }

        for edge in &self.edges {
            let src = lookup(&ids, &edge.src)?;
            let dst = lookup(&ids, &edge.dst)?;
            graph.connect(
                PortRef::output(src, edge.src_port),
                PortRef::input(dst, edge.dst_port),
            )?;
        }

        for output in &self.outputs {
            let src = lookup(&ids, &output.src)?;
            let marker = graph.add_node(NodeDesc::new("FakeOutput").name(&output.name).ports(1, 1));
            register_name(&mut ids, &output.name, marker)?;
            let sink = graph.add_node(
                NodeDesc::new("Result")
                    .name(&format!("{}/sink", output.name))
                    .ports(1, 0),
            );
            graph.connect(
                PortRef::output(src, output.src_port),
                PortRef::input(marker, 0),
            )?;
            graph.connect(PortRef::output(marker, 0), PortRef::input(sink, 0))?;
        }

        info!(
            "Imported {} {} operator(s): {} node(s), {} connection(s)",
            self.records.len(),
            self.format,
            graph.node_count(),
            graph.connection_count()
        );
        Ok(graph)
    }
}

fn register_name<'a>(ids: &mut FxHashMap<&'a str, NodeId>, name: &'a str, id: NodeId) -> GraphResult<()> {
    if ids.insert(name, id).is_some() {
        return Err(TransformError::Internal(format!(
            "source name '{}' is used twice",
            name
        )));
    }
    Ok(())
}

fn lookup(ids: &FxHashMap<&str, NodeId>, name: &str) -> GraphResult<NodeId> {
    ids.get(name)
        .copied()
        .ok_or_else(|| TransformError::NodeNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AttrValue;

    fn pool_source() -> SourceGraph {
        SourceGraph::new(SourceFormat::Onnx)
            .input("data", vec![1, 3, 8, 8])
            .op(
                "pool",
                "MaxPool",
                RawAttrs::new()
                    .with("kernel_shape", vec![2i64, 2])
                    .with("strides", vec![2i64, 2]),
            )
            .edge("data", 0, "pool", 0)
            .output("pooled", "pool", 0)
    }

    #[test]
    fn test_import_builds_nodes_and_edges() {
        let graph = pool_source().import(&ExtractorRegistry::with_defaults()).unwrap();

        let data = graph.id_of("data").unwrap();
        let pool = graph.id_of("pool").unwrap();
        let node = graph.node(pool).unwrap();
        assert_eq!(node.op_type, "Pooling");
        assert_eq!(node.attrs.get("pool_method"), Some(&AttrValue::from("max")));
        // Extractor declares the indices output
        assert_eq!(node.outputs().len(), 2);
        assert_eq!(graph.input_source(pool, 0), Some(PortRef::output(data, 0)));

        let marker = graph.node_by_name("pooled").unwrap();
        assert_eq!(marker.op_type, "FakeOutput");
        assert_eq!(graph.consumers_of(marker.id, 0)[0].op_type, "Result");
    }

    #[test]
    fn test_unsupported_op_creates_nothing() {
        let source = SourceGraph::new(SourceFormat::Onnx)
            .input("data", vec![1, 3])
            .op("mystery", "NotAnOp", RawAttrs::new());
        assert!(matches!(
            source.import(&ExtractorRegistry::with_defaults()),
            Err(TransformError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_unknown_edge_endpoint() {
        let source = SourceGraph::new(SourceFormat::Onnx)
            .op("relu", "Relu", RawAttrs::new())
            .edge("missing", 0, "relu", 0);
        assert!(matches!(
            source.import(&ExtractorRegistry::with_defaults()),
            Err(TransformError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let source = SourceGraph::new(SourceFormat::Onnx)
            .input("x", vec![1])
            .op("x", "Relu", RawAttrs::new());
        assert!(matches!(
            source.import(&ExtractorRegistry::with_defaults()),
            Err(TransformError::Internal(_))
        ));
    }

    #[test]
    fn test_explicit_port_counts_extend_extractor() {
        let source = SourceGraph::new(SourceFormat::Onnx).op_with_ports(
            "relu",
            "Relu",
            RawAttrs::new(),
            2,
            1,
        );
        let graph = source.import(&ExtractorRegistry::with_defaults()).unwrap();
        assert_eq!(graph.node_by_name("relu").unwrap().inputs().len(), 2);
    }
}
