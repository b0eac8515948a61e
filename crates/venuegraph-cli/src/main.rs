//! Venuegraph CLI
//!
//! Command-line driver for:
//! - normalizing venue strings (with a learned abbreviation cache)
//! - adding count-weighted relations to a graph file
//! - inferring a new relation layer over two existing ones
//! - inspecting graphs (coverage, degree histogram, neighbours)

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

use venuegraph_graph::{LayerSpec, RelationMap, VenueGraph};
use venuegraph_normalize::{AbbreviationCache, VenueNormalizer};

mod config;
mod normalize;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "venuegraph")]
#[command(author, version, about = "Venuegraph: venue normalization and layered FoS graphs")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// JSON config file (defaults to $VENUEGRAPH_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize venue strings, one per line, into JSON lines.
    Normalize {
        /// Input file (defaults to stdin)
        input: Option<PathBuf>,
        /// Abbreviation cache (JSON object of phrase -> abbreviation)
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Return cleaned phrases without abbreviation lookup
        #[arg(long)]
        no_abbrev: bool,
        /// Write the cache, including learned entries, when done
        #[arg(long)]
        save_cache: Option<PathBuf>,
    },

    /// Add a relation from a `source -> target -> count` JSON file.
    Add {
        /// Graph file (created when missing)
        #[arg(long)]
        graph: PathBuf,
        #[arg(long)]
        from_role: String,
        #[arg(long)]
        to_role: String,
        #[arg(long)]
        relation: String,
        /// Counts JSON: {"source": {"target": count, ...}, ...}
        #[arg(long)]
        counts: PathBuf,
        /// Minimum normalized weight (defaults to the configured cutoff)
        #[arg(long)]
        cutoff: Option<f64>,
        /// Merge keys through this abbreviation cache before adding
        #[arg(long)]
        merge_cache: Option<PathBuf>,
        /// Output graph file (defaults to --graph)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Infer A -> C edges from A -> B -> C paths.
    Infer {
        #[arg(long)]
        graph: PathBuf,
        /// Roles A,B,C
        #[arg(long, value_parser = parse_entity_chain)]
        entities: [String; 3],
        /// Relations R1,R2
        #[arg(long, value_parser = parse_relation_chain)]
        relations: [String; 2],
        /// Recompute nodes that already have a C neighbour
        #[arg(long)]
        overwrite: bool,
        /// Edges kept per node (defaults to the configured value)
        #[arg(long)]
        max_links: Option<usize>,
        /// Minimum hop weights F1,F2
        #[arg(long, value_parser = parse_filters)]
        filters: Option<[f64; 2]>,
        /// Relation name for inferred edges ("default" reuses R2)
        #[arg(long, default_value = venuegraph_graph::DEFAULT_RELATIONSHIP)]
        new_relationship: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print node/edge counts, annotation coverage and degree histogram.
    Stats {
        #[arg(long)]
        graph: PathBuf,
        #[arg(long, default_value_t = 10)]
        bins: usize,
        /// RELATION:ROLE pairs to report coverage for
        #[arg(long, value_parser = parse_coverage)]
        coverage: Vec<(String, String)>,
    },

    /// List neighbours of a node over one relation.
    Neighbors {
        #[arg(long)]
        graph: PathBuf,
        #[arg(long)]
        node: String,
        #[arg(long)]
        relation: String,
        /// Role the neighbours must carry
        #[arg(long)]
        role: String,
        /// Follow edges backwards
        #[arg(long)]
        incoming: bool,
    },
}

fn split_exact<const N: usize>(s: &str, sep: char, what: &str) -> Result<[String; N], String> {
    let parts: Vec<String> = s.split(sep).map(|p| p.trim().to_string()).collect();
    let count = parts.len();
    parts
        .try_into()
        .map_err(|_| format!("expected {N} {what} separated by `{sep}`, got {count}"))
}

fn parse_entity_chain(s: &str) -> Result<[String; 3], String> {
    split_exact(s, ',', "roles")
}

fn parse_relation_chain(s: &str) -> Result<[String; 2], String> {
    split_exact(s, ',', "relations")
}

fn parse_filters(s: &str) -> Result<[f64; 2], String> {
    let [first, second] = split_exact::<2>(s, ',', "filters")?;
    let parse = |v: &str| v.parse::<f64>().map_err(|e| format!("bad filter `{v}`: {e}"));
    Ok([parse(&first)?, parse(&second)?])
}

fn parse_coverage(s: &str) -> Result<(String, String), String> {
    let [relation, role] = split_exact::<2>(s, ':', "fields")?;
    Ok((relation, role))
}

fn init_tracing(verbose: u8, config_filter: Option<&str>) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_filter.unwrap_or("warn"))),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, config.log_filter.as_deref());

    match cli.command {
        Commands::Normalize {
            input,
            cache,
            no_abbrev,
            save_cache,
        } => {
            let cache = cache.or(config.abbreviation_cache);
            cmd_normalize(input.as_deref(), cache.as_deref(), !no_abbrev, save_cache.as_deref())?;
        }
        Commands::Add {
            graph,
            from_role,
            to_role,
            relation,
            counts,
            cutoff,
            merge_cache,
            out,
        } => {
            let out = out.unwrap_or_else(|| graph.clone());
            cmd_add(
                &graph,
                &out,
                [from_role.as_str(), to_role.as_str(), relation.as_str()],
                &counts,
                cutoff.unwrap_or(config.default_cutoff),
                merge_cache.as_deref(),
            )?;
        }
        Commands::Infer {
            graph,
            entities,
            relations,
            overwrite,
            max_links,
            filters,
            new_relationship,
            out,
        } => {
            let spec = LayerSpec {
                entity_chain: entities,
                relationship_chain: relations,
                overwrite,
                max_links: max_links.unwrap_or(config.default_max_links),
                filters: filters.unwrap_or([0.0, 0.0]),
                new_relationship,
            };
            let out = out.unwrap_or_else(|| graph.clone());
            cmd_infer(&graph, &out, &spec)?;
        }
        Commands::Stats {
            graph,
            bins,
            coverage,
        } => cmd_stats(&graph, bins, &coverage)?,
        Commands::Neighbors {
            graph,
            node,
            relation,
            role,
            incoming,
        } => cmd_neighbors(&graph, &node, &relation, &role, incoming)?,
    }

    Ok(())
}

fn load_cache(path: Option<&Path>) -> Result<AbbreviationCache> {
    match path {
        Some(path) => AbbreviationCache::from_path(path)
            .with_context(|| format!("failed to load abbreviation cache {}", path.display())),
        None => Ok(AbbreviationCache::new()),
    }
}

fn open_graph(path: &Path) -> Result<VenueGraph> {
    VenueGraph::open(path).with_context(|| format!("failed to open graph {}", path.display()))
}

fn save_graph(graph: &VenueGraph, path: &Path) -> Result<()> {
    graph
        .save(path)
        .with_context(|| format!("failed to save graph {}", path.display()))?;
    eprintln!(
        "{} {} ({} nodes, {} edges)",
        "wrote".green().bold(),
        path.display().to_string().bold(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}

fn cmd_normalize(
    input: Option<&Path>,
    cache: Option<&Path>,
    get_abbrv: bool,
    save_cache: Option<&Path>,
) -> Result<()> {
    let normalizer = VenueNormalizer::new(load_cache(cache)?);
    let stdout = io::stdout().lock();

    let processed = match input {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            normalize::normalize_lines(&normalizer, BufReader::new(file), stdout, get_abbrv)?
        }
        None => normalize::normalize_lines(&normalizer, io::stdin().lock(), stdout, get_abbrv)?,
    };
    tracing::info!(processed, cached = normalizer.cache().len(), "normalized venues");

    if let Some(path) = save_cache {
        normalizer
            .cache()
            .write_json(path)
            .with_context(|| format!("failed to write abbreviation cache {}", path.display()))?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    Ok(())
}

fn read_counts(path: &Path) -> Result<RelationMap> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse counts {}", path.display()))
}

fn cmd_add(
    graph_path: &Path,
    out: &Path,
    [from_role, to_role, relation]: [&str; 3],
    counts: &Path,
    cutoff: f64,
    merge_cache: Option<&Path>,
) -> Result<()> {
    let mut counts = read_counts(counts)?;
    if let Some(cache) = merge_cache {
        let normalizer = VenueNormalizer::new(load_cache(Some(cache))?);
        let outcome = normalizer.postprocess(counts);
        println!("  {} merged {} keys", "→".yellow(), outcome.merged);
        counts = outcome.weights;
    }

    let mut graph = open_graph(graph_path)?;
    graph
        .add_entities(from_role, to_role, relation, &counts, cutoff)
        .with_context(|| format!("failed to add relation `{relation}`"))?;
    save_graph(&graph, out)
}

fn cmd_infer(graph_path: &Path, out: &Path, spec: &LayerSpec) -> Result<()> {
    let mut graph = open_graph(graph_path)?;
    if graph.node_count() == 0 {
        bail!("graph {} is empty", graph_path.display());
    }

    let report = graph.infer_layer(spec)?;
    println!(
        "{} {} nodes: {} skipped, {} without candidates, {} edges written",
        "Inferred".green().bold(),
        report.examined,
        report.already_resolved,
        report.no_candidates,
        report.edges_written
    );
    save_graph(&graph, out)
}

fn cmd_stats(graph_path: &Path, bins: usize, coverage: &[(String, String)]) -> Result<()> {
    let graph = VenueGraph::read(graph_path)
        .with_context(|| format!("failed to read graph {}", graph_path.display()))?;

    println!("{} {}", "Graph".green().bold(), graph_path.display());
    println!("  nodes: {}", graph.node_count());
    println!("  edges: {}", graph.edge_count());

    for (relation, role) in coverage {
        let c = graph.annotation_coverage(relation, role);
        println!(
            "  coverage {}:{}: {}/{} ({:.2}%)",
            relation.cyan(),
            role.cyan(),
            c.covered,
            c.total,
            c.ratio() * 100.0
        );
    }

    let histogram = graph.degree_distribution(bins)?;
    if !histogram.is_empty() {
        println!("  {}", "degree distribution".bold());
    }
    for bin in histogram {
        println!("    [{:>8.1}, {:>8.1}]  {}", bin.lower, bin.upper, bin.count);
    }
    Ok(())
}

fn cmd_neighbors(
    graph_path: &Path,
    node: &str,
    relation: &str,
    role: &str,
    incoming: bool,
) -> Result<()> {
    let graph = VenueGraph::read(graph_path)
        .with_context(|| format!("failed to read graph {}", graph_path.display()))?;
    if !graph.contains_node(node) {
        return Err(anyhow!("node `{node}` not found in {}", graph_path.display()));
    }

    let neighbours = if incoming {
        graph.incoming(node, relation, role)
    } else {
        graph.outgoing(node, relation, role)
    };
    for (neighbour, weight) in neighbours {
        println!("{neighbour}\t{weight}");
    }
    Ok(())
}
