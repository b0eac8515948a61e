//! Node-link JSON persistence.
//!
//! ```json
//! {
//!   "directed": true,
//!   "multigraph": true,
//!   "graph": {},
//!   "nodes": [{"id": "p1", "paper": true}],
//!   "links": [{"source": "p1", "target": "v1", "key": "published_in", "published_in": 1.0}]
//! }
//! ```
//!
//! Node attributes other than `id` are role tags and must be booleans. Link
//! attributes other than `source`, `target` and `key` are weights and must be
//! numbers. A link without a `key` gets key `0`. The link list may also be
//! named `edges`. Links whose endpoints are not listed as nodes create those
//! nodes without roles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use crate::error::{GraphError, Result};
use crate::{EdgeKey, VenueGraph};

fn default_true() -> bool {
    true
}

/// Serialized form of a [`VenueGraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default = "default_true")]
    pub directed: bool,
    #[serde(default = "default_true")]
    pub multigraph: bool,
    #[serde(default)]
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<NodeRecord>,
    #[serde(alias = "edges")]
    pub links: Vec<LinkRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(flatten)]
    pub roles: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub key: EdgeKey,
    #[serde(flatten)]
    pub weights: BTreeMap<String, f64>,
}

impl GraphDocument {
    /// Sort nodes by id and links by `(source, target, key)`, so two
    /// documents describing the same graph compare equal.
    pub fn sorted(mut self) -> Self {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        self.links.sort_by(|a, b| {
            (&a.source, &a.target, &a.key).cmp(&(&b.source, &b.target, &b.key))
        });
        self
    }
}

impl VenueGraph {
    /// Snapshot the graph as a document, nodes and links in creation order.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            directed: true,
            multigraph: true,
            graph: self.attributes.clone(),
            nodes: self
                .nodes()
                .map(|node| NodeRecord {
                    id: node.id.to_string(),
                    roles: node
                        .roles
                        .into_iter()
                        .map(|(role, value)| (role.to_string(), value))
                        .collect(),
                })
                .collect(),
            links: self
                .edges()
                .map(|edge| LinkRecord {
                    source: edge.source.to_string(),
                    target: edge.target.to_string(),
                    key: edge.key.clone(),
                    weights: edge
                        .weights
                        .into_iter()
                        .map(|(relation, w)| (relation.to_string(), w))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Build a graph from a document. Repeated nodes merge their roles and
    /// repeated `(source, target, key)` links merge their weights.
    pub fn from_document(doc: GraphDocument) -> Result<Self> {
        if !doc.directed {
            return Err(GraphError::MalformedDocument(
                "undirected graphs are not supported".to_string(),
            ));
        }

        let mut graph = VenueGraph {
            attributes: doc.graph,
            ..VenueGraph::default()
        };

        for record in doc.nodes {
            let node = graph.ensure_node(&record.id);
            for (role, value) in record.roles {
                graph.tag(node, &role, value);
            }
        }

        for link in doc.links {
            let source = graph.ensure_node(&link.source);
            let target = graph.ensure_node(&link.target);
            let edge_id = graph.edges.ensure(source, target, link.key);
            for (relation, weight) in link.weights {
                let relation = graph.strings.intern(&relation);
                graph.edges.set_weight(edge_id, relation, weight);
            }
        }

        Ok(graph)
    }

    /// Write the graph to `path`, replacing any existing file. The file is
    /// complete and synced when this returns.
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.to_document()).map_err(|err| {
            if err.is_io() {
                io_err(err.into())
            } else {
                GraphError::Json {
                    path: path.to_path_buf(),
                    source: err,
                }
            }
        })?;
        let file = writer.into_inner().map_err(|err| io_err(err.into_error()))?;
        file.sync_all().map_err(io_err)?;

        tracing::debug!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "saved graph"
        );
        Ok(())
    }

    /// Read a graph document from `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_file(path, file)
    }

    /// Like [`read`](Self::read), but a missing file yields an empty graph.
    pub fn open(path: &Path) -> Result<Self> {
        match File::open(path) {
            Ok(file) => Self::read_file(path, file),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no graph file, starting empty");
                Ok(Self::new())
            }
            Err(source) => Err(GraphError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Replace the whole graph with the document at `path`. On error the
    /// current graph is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        *self = Self::read(path)?;
        Ok(())
    }

    fn read_file(path: &Path, file: File) -> Result<Self> {
        let doc: GraphDocument =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| GraphError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let graph = Self::from_document(doc)?;
        tracing::debug!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "loaded graph"
        );
        Ok(graph)
    }
}
