use std::collections::BTreeSet;

use anyhow::{bail, Result};
use swc_ecma_ast::{Decl, Module, ModuleDecl, ModuleItem, Pat};
use swc_utils::PrintOptions;

use super::{import_local, specifier_exported_name};
use crate::chunkable::is_chunkable;
use crate::parse::{decl_kind, ExportName, ModuleExportGraph};

/// Emits the module with every actually-omitted export and its exclusive
/// dependencies removed. Listed exports that are not chunkable stay in
/// place. Returns `None` when nothing would remain.
pub fn omit_chunked_exports(
    graph: &ModuleExportGraph,
    names: &[ExportName],
    source: &str,
    options: &PrintOptions,
) -> Result<Option<String>> {
    // a listed export only counts when it is actually extractable
    let omitted: Vec<&ExportName> = names
        .iter()
        .filter(|name| is_chunkable(graph, name))
        .collect();

    let mut omitted_stmts: BTreeSet<usize> = BTreeSet::new();
    let mut omitted_imports: BTreeSet<&str> = BTreeSet::new();
    for name in &omitted {
        if let Some(deps) = graph.get(name) {
            // module statements are pruned at specifier granularity below
            omitted_stmts.extend(deps.top_level_non_module_stmts.iter().copied());
            omitted_imports.extend(deps.imported_names.iter().map(String::as_str));
        }
    }
    let omitted_names: BTreeSet<&str> = omitted.iter().map(|name| name.as_str()).collect();

    let (cm, mut module) = swc_utils::parse_ecma_src("route-module.tsx", source)?;

    remove_omitted_statements(&mut module, graph, &omitted_stmts);
    prune_import_specifiers(&mut module, &omitted_imports);
    prune_exports(&mut module, &omitted_names)?;

    if module.body.is_empty() {
        return Ok(None);
    }
    let code = swc_utils::ast_to_str(&cm, &module, options)?;
    Ok(Some(code))
}

fn remove_omitted_statements(
    module: &mut Module,
    graph: &ModuleExportGraph,
    omitted_stmts: &BTreeSet<usize>,
) {
    module.body.retain(|item| {
        !omitted_stmts
            .iter()
            .any(|&index| swc_utils::statements_equivalent(graph.statement(index), item))
    });
}

fn prune_import_specifiers(module: &mut Module, omitted_imports: &BTreeSet<&str>) {
    module.body.retain_mut(|item| {
        let import = match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import,
            _ => return true,
        };
        // a side-effect-only import stays exactly as written
        if import.specifiers.is_empty() {
            return true;
        }
        import
            .specifiers
            .retain(|spec| !omitted_imports.contains(import_local(spec).sym.as_str()));
        !import.specifiers.is_empty()
    });
}

fn prune_exports(module: &mut Module, omitted: &BTreeSet<&str>) -> Result<()> {
    let mut body = Vec::with_capacity(module.body.len());
    for item in module.body.drain(..) {
        let decl = match item {
            ModuleItem::ModuleDecl(decl) => decl,
            stmt => {
                body.push(stmt);
                continue;
            }
        };
        match decl {
            // passthroughs cannot be attributed to a single export
            ModuleDecl::ExportAll(export) => {
                body.push(ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)));
            }

            ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => {
                if !omitted.contains("default") {
                    body.push(ModuleItem::ModuleDecl(decl));
                }
            }

            ModuleDecl::ExportDecl(mut export) => {
                let keep = match &mut export.decl {
                    Decl::Var(var) => {
                        for declarator in &var.decls {
                            if !matches!(declarator.name, Pat::Ident(_)) {
                                bail!(
                                    "unsupported destructuring pattern in exported variable \
                                     declaration"
                                );
                            }
                        }
                        var.decls.retain(|declarator| match &declarator.name {
                            Pat::Ident(ident) => !omitted.contains(ident.id.sym.as_str()),
                            _ => false,
                        });
                        !var.decls.is_empty()
                    }
                    Decl::Fn(decl) => !omitted.contains(decl.ident.sym.as_str()),
                    Decl::Class(decl) => !omitted.contains(decl.ident.sym.as_str()),
                    other => {
                        bail!("unsupported export declaration kind: {}", decl_kind(other))
                    }
                };
                if keep {
                    body.push(ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)));
                }
            }

            ModuleDecl::ExportNamed(mut export) => {
                // `export {}` exposes nothing attributable and is kept verbatim
                if export.specifiers.is_empty() {
                    body.push(ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)));
                    continue;
                }
                export
                    .specifiers
                    .retain(|spec| !omitted.contains(specifier_exported_name(spec)));
                if !export.specifiers.is_empty() {
                    body.push(ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(export)));
                }
            }

            other => body.push(ModuleItem::ModuleDecl(other)),
        }
    }
    module.body = body;
    Ok(())
}
