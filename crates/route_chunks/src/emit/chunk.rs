use anyhow::{bail, Result};
use swc_ecma_ast::{Decl, Module, ModuleDecl, ModuleItem, Pat};
use swc_utils::PrintOptions;

use super::{import_local, specifier_exported_name};
use crate::chunkable::is_chunkable;
use crate::parse::{decl_kind, ExportDeps, ExportName, ModuleExportGraph};

/// Emits a standalone module containing only `name` and its transitive
/// top-level dependencies. Returns `None` when the export is absent or not
/// extractable.
pub fn chunked_export_module(
    graph: &ModuleExportGraph,
    name: &ExportName,
    source: &str,
    options: &PrintOptions,
) -> Result<Option<String>> {
    if !is_chunkable(graph, name) {
        return Ok(None);
    }
    let deps = match graph.get(name) {
        Some(deps) => deps,
        None => return Ok(None),
    };

    // rewrite a fresh copy; the analysis AST stays untouched
    let (cm, mut module) = swc_utils::parse_ecma_src("route-module.tsx", source)?;

    retain_dependency_statements(&mut module, graph, deps);
    prune_imports(&mut module, name, deps)?;
    restrict_exports(&mut module, name)?;

    let code = swc_utils::ast_to_str(&cm, &module, options)?;
    Ok(Some(code))
}

fn retain_dependency_statements(
    module: &mut Module,
    graph: &ModuleExportGraph,
    deps: &ExportDeps,
) {
    module.body.retain(|item| {
        deps.top_level_stmts
            .iter()
            .any(|&index| swc_utils::statements_equivalent(graph.statement(index), item))
    });
}

fn prune_imports(module: &mut Module, name: &ExportName, deps: &ExportDeps) -> Result<()> {
    let mut body = Vec::with_capacity(module.body.len());
    for item in module.body.drain(..) {
        let mut import = match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import,
            other => {
                body.push(other);
                continue;
            }
        };
        // an export with no imported dependencies carries no imports at all
        if deps.imported_names.is_empty() {
            continue;
        }
        import
            .specifiers
            .retain(|spec| deps.imported_names.contains(import_local(spec).sym.as_str()));
        if import.specifiers.is_empty() {
            bail!(
                "no specifier of the import from \"{}\" is needed by export `{}`, \
                 yet the statement was retained; the dependency analysis is inconsistent",
                import.src.value,
                name,
            );
        }
        body.push(ModuleItem::ModuleDecl(ModuleDecl::Import(import)));
    }
    module.body = body;
    Ok(())
}

fn restrict_exports(module: &mut Module, name: &ExportName) -> Result<()> {
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
            // passthroughs never travel with a chunk
            ModuleDecl::ExportAll(_) => {}

            ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => {
                if *name == ExportName::Default {
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
                            Pat::Ident(ident) => ident.id.sym.as_str() == name.as_str(),
                            _ => false,
                        });
                        !var.decls.is_empty()
                    }
                    Decl::Fn(decl) => decl.ident.sym.as_str() == name.as_str(),
                    Decl::Class(decl) => decl.ident.sym.as_str() == name.as_str(),
                    other => {
                        bail!("unsupported export declaration kind: {}", decl_kind(other))
                    }
                };
                if keep {
                    body.push(ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)));
                }
            }

            ModuleDecl::ExportNamed(mut export) => {
                export
                    .specifiers
                    .retain(|spec| specifier_exported_name(spec) == name.as_str());
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
