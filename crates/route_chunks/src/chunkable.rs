use std::collections::BTreeSet;

use crate::parse::{ExportName, ModuleExportGraph};

/// Decides whether `name` owns all of its private top-level code and
/// imported bindings, i.e. whether it can be split into its own module.
///
/// An absent export is simply not chunkable; that is a normal verdict, not
/// an error.
pub fn is_chunkable(graph: &ModuleExportGraph, name: &ExportName) -> bool {
    let deps = match graph.get(name) {
        Some(deps) => deps,
        None => return false,
    };

    graph
        .exports()
        .filter(|(other, _)| *other != name)
        .all(|(_, other_deps)| {
            if intersects(
                &deps.top_level_non_module_stmts,
                &other_deps.top_level_non_module_stmts,
            ) {
                return false;
            }
            // imports are partitioned at specifier granularity, so two
            // exports may share an import statement but never a specifier
            deps.imported_names.is_empty()
                || !intersects(&deps.imported_names, &other_deps.imported_names)
        })
}

// iterate the smaller set against the larger
fn intersects<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|item| large.contains(item))
}
