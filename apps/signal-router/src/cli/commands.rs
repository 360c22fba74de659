//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use signal_router::{DryRunContext, PathOutcome, Router, Settings};
use signal_router_core::{ConnectRequest, NodeId, RouterError, SignalGraph};
use std::path::Path;

// =============================================================================
// HELPERS
// =============================================================================

/// One `SOURCE=TARGET[,TARGET...]` argument of `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteArg {
    pub source: String,
    pub targets: Vec<String>,
}

/// Parse a `SOURCE=TARGET[,TARGET...]` argument.
pub fn parse_route_arg(arg: &str) -> Result<RouteArg, String> {
    let (source, targets) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected SOURCE=TARGET[,TARGET...], got '{}'", arg))?;

    let source = source.trim();
    if source.is_empty() {
        return Err(format!("missing source in '{}'", arg));
    }

    let targets: Vec<String> = targets
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    if targets.is_empty() {
        return Err(format!("missing targets in '{}'", arg));
    }

    Ok(RouteArg {
        source: source.to_string(),
        targets,
    })
}

fn load_router(config: &Path) -> Result<Router, RouterError> {
    let settings = Settings::load(config)?;
    Router::from_connections(&settings.connections)
}

fn load_graph(config: &Path) -> Result<SignalGraph, RouterError> {
    let settings = Settings::load(config)?;
    SignalGraph::from_map(&settings.connections)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Build the graph and report counts.
pub fn cmd_check(config: &Path, json_mode: bool) -> Result<(), RouterError> {
    let graph = load_graph(config)?;

    if json_mode {
        print_json(&serde_json::json!({
            "config": config.to_string_lossy(),
            "valid": true,
            "node_count": graph.node_count(),
            "edge_count": graph.edge_count(),
        }));
        return Ok(());
    }

    println!("Settings OK: {}", config.display());
    println!("Nodes: {}", graph.node_count());
    println!("Edges: {}", graph.edge_count());
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show nodes, inputs and outputs.
pub async fn cmd_status(config: &Path, json_mode: bool) -> Result<(), RouterError> {
    let status = load_router(config)?.status().await;

    if json_mode {
        print_json(&serde_json::to_value(&status).unwrap_or_default());
        return Ok(());
    }

    println!("Signal Router Status");
    println!("====================");
    println!("Settings: {}", config.display());
    println!();
    println!("Nodes:   {}", status.nodes.len());
    println!("Inputs:  {}", join_ids(&status.inputs));
    println!("Outputs: {}", join_ids(&status.outputs));
    Ok(())
}

// =============================================================================
// GRAPH COMMAND
// =============================================================================

/// List every edge.
pub fn cmd_graph(config: &Path, json_mode: bool) -> Result<(), RouterError> {
    let graph = load_graph(config)?;

    if json_mode {
        let edges: Vec<serde_json::Value> = graph
            .edges()
            .map(|edge| {
                serde_json::json!({
                    "source": edge.source,
                    "target": edge.target,
                    "activation": edge.activation.as_ref().map(ToString::to_string),
                })
            })
            .collect();
        print_json(&serde_json::json!({ "edges": edges }));
        return Ok(());
    }

    print!("{}", graph);
    Ok(())
}

// =============================================================================
// ROUTE COMMAND
// =============================================================================

/// Show the shortest path from `from` to `to`.
pub async fn cmd_route(
    config: &Path,
    json_mode: bool,
    from: &str,
    to: &str,
) -> Result<(), RouterError> {
    let router = load_router(config)?;
    let path = router.route(&NodeId::new(from), &NodeId::new(to)).await?;

    if json_mode {
        print_json(&serde_json::json!({
            "from": from,
            "to": to,
            "hops": path.len().saturating_sub(1),
            "path": path,
        }));
        return Ok(());
    }

    let rendered: Vec<&str> = path.iter().map(NodeId::as_str).collect();
    println!("{}", rendered.join(" <- "));
    Ok(())
}

// =============================================================================
// CONNECT COMMAND
// =============================================================================

/// Plan a connect request and execute it against a dry-run context.
pub async fn cmd_connect(
    config: &Path,
    json_mode: bool,
    routes: Vec<RouteArg>,
) -> Result<(), RouterError> {
    let router = load_router(config)?;
    let request = routes
        .into_iter()
        .fold(ConnectRequest::new(), |request, route| {
            request.route(&route.source, route.targets)
        });

    let ctx = DryRunContext::new();
    let report = router.connect(&ctx, &request).await;

    if json_mode {
        print_json(&serde_json::to_value(&report).unwrap_or_default());
        return Ok(());
    }

    for path in &report.paths {
        match &path.outcome {
            PathOutcome::Routed => println!("OK     {} -> {}", path.source, path.target),
            PathOutcome::Failed { failed_hops } => println!(
                "FAILED {} -> {} ({} hop(s) failed)",
                path.source,
                path.target,
                failed_hops.len()
            ),
            PathOutcome::Unroutable { error } => {
                println!("SKIP   {} -> {}: {}", path.source, path.target, error);
            }
        }
    }

    println!();
    println!("Activations (dry run):");
    for activation in ctx.issued().await {
        println!("  {}", activation);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
