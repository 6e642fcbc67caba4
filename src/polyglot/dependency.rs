//! Read/write dependency analysis for sibling polyglot blocks (spec §4.8).
//!
//! Scope is deliberately narrow, per spec: "applies within a single
//! statement block ... that contains two or more sibling polyglot
//! expressions." This module only looks at the shape of a
//! `let x = <<lang[...]>>` / `x = <<lang[...]>>` statement — it never has to
//! understand the foreign source itself, only the bound-variable list the
//! AST already carries and which host name (if any) receives the result.
//! That is enough to build the RAW/WAW/WAR hazard graph the spec asks for
//! and to partition independent sites into parallelizable layers with
//! Kahn's algorithm.

use std::collections::{HashSet, VecDeque};

use crate::ast::{Expr, PolyglotBlock, Stmt};

/// One polyglot site within a contiguous run of sibling statements, indexed
/// by its position in that run (not the enclosing block).
#[derive(Debug)]
pub struct PolyglotSite<'a> {
    pub run_index: usize,
    pub block: &'a PolyglotBlock,
    /// The host variable the result is written to, if the statement is
    /// exactly `let x = <<...>>` or `x = <<...>>` (spec §4.8 "writes: the
    /// set of host-side names the block's result is assigned into").
    pub write: Option<String>,
}

/// Pull the polyglot expression and its write target out of one statement,
/// if it is shaped like a direct binding of a polyglot block's result.
fn as_polyglot_site(stmt: &Stmt) -> Option<(&PolyglotBlock, Option<String>)> {
    match stmt {
        Stmt::Let(decl) => match &decl.value {
            Expr::Polyglot(block) => Some((block, Some(decl.name.clone()))),
            _ => None,
        },
        Stmt::Expr(Expr::Assignment { target, value, .. }) => match value.as_ref() {
            Expr::Polyglot(block) => {
                let write = match target.as_ref() {
                    Expr::Ident(name, _) => Some(name.clone()),
                    _ => None,
                };
                Some((block, write))
            }
            _ => None,
        },
        Stmt::Expr(Expr::Polyglot(block)) => Some((block, None)),
        _ => None,
    }
}

/// Find the maximal run of consecutive statements, starting at `start`,
/// that are each a polyglot site. Returns an empty vec if `stmts[start]`
/// is not itself one.
pub fn collect_run<'a>(stmts: &'a [Stmt], start: usize) -> Vec<PolyglotSite<'a>> {
    let mut sites = Vec::new();
    let mut index = start;
    while index < stmts.len() {
        let Some((block, write)) = as_polyglot_site(&stmts[index]) else {
            break;
        };
        sites.push(PolyglotSite {
            run_index: sites.len(),
            block,
            write,
        });
        index += 1;
    }
    sites
}

/// Dependency graph over one run: `depends_on[i]` lists every `j` that must
/// execute before site `i` (spec §4.8 "Dependency edges").
pub struct DependencyGraph {
    pub depends_on: Vec<Vec<usize>>,
}

/// Build the RAW/WAW/WAR hazard graph for a run of sites.
pub fn analyze(sites: &[PolyglotSite]) -> DependencyGraph {
    let reads: Vec<HashSet<&str>> = sites
        .iter()
        .map(|site| site.block.bound_vars.iter().map(String::as_str).collect())
        .collect();
    let writes: Vec<HashSet<&str>> = sites
        .iter()
        .map(|site| site.write.as_deref().into_iter().collect())
        .collect();

    let mut depends_on = vec![Vec::new(); sites.len()];
    for b in 0..sites.len() {
        for a in 0..b {
            let raw = reads[b].intersection(&writes[a]).next().is_some();
            let waw = writes[b].intersection(&writes[a]).next().is_some();
            let war = writes[b].intersection(&reads[a]).next().is_some();
            if raw || waw || war {
                depends_on[b].push(a);
            }
        }
    }
    DependencyGraph { depends_on }
}

/// Partition a run into execution layers via Kahn's algorithm: every site
/// in a layer has no unresolved dependency on another site in the same or
/// a later layer, so a layer's sites may run concurrently (spec §4.8
/// "Independent blocks form a parallelizable group"). Layers themselves
/// must run in order. Sites keep their original source-order index within
/// a layer so a single-site layer is just "run sequentially".
pub fn layers(graph: &DependencyGraph) -> Vec<Vec<usize>> {
    let n = graph.depends_on.len();
    let mut remaining: Vec<HashSet<usize>> = graph
        .depends_on
        .iter()
        .map(|deps| deps.iter().copied().collect())
        .collect();
    let mut done: HashSet<usize> = HashSet::new();
    let mut result = Vec::new();

    while done.len() < n {
        let mut layer: VecDeque<usize> = VecDeque::new();
        for i in 0..n {
            if !done.contains(&i) && remaining[i].is_empty() {
                layer.push_back(i);
            }
        }
        if layer.is_empty() {
            // A cycle among sites (shouldn't happen: a direct self-write
            // chain still resolves via source order); break ties by index
            // to guarantee forward progress rather than looping forever.
            if let Some(i) = (0..n).find(|i| !done.contains(i)) {
                layer.push_back(i);
            } else {
                break;
            }
        }
        let mut layer_vec: Vec<usize> = layer.into_iter().collect();
        layer_vec.sort_unstable();
        for &i in &layer_vec {
            done.insert(i);
        }
        for deps in remaining.iter_mut() {
            for &i in &layer_vec {
                deps.remove(&i);
            }
        }
        result.push(layer_vec);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Position;

    fn block(bound_vars: Vec<&str>) -> PolyglotBlock {
        PolyglotBlock {
            language: "python".to_owned(),
            code: "pass".to_owned(),
            bound_vars: bound_vars.into_iter().map(String::from).collect(),
            position: Position::unknown(),
        }
    }

    #[test]
    fn test_independent_sites_form_one_layer() {
        let blocks = vec![block(vec!["a"]), block(vec!["b"]), block(vec!["c"])];
        let sites: Vec<PolyglotSite> = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| PolyglotSite {
                run_index: i,
                block: b,
                write: Some(format!("out{i}")),
            })
            .collect();
        let graph = analyze(&sites);
        let layers = layers(&graph);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0], vec![0, 1, 2]);
    }

    #[test]
    fn test_raw_hazard_forces_sequential_layers() {
        let b0 = block(vec!["x"]);
        let b1 = block(vec!["out0"]);
        let sites = vec![
            PolyglotSite {
                run_index: 0,
                block: &b0,
                write: Some("out0".to_owned()),
            },
            PolyglotSite {
                run_index: 1,
                block: &b1,
                write: Some("out1".to_owned()),
            },
        ];
        let graph = analyze(&sites);
        let layers = layers(&graph);
        assert_eq!(layers, vec![vec![0], vec![1]]);
    }
}
