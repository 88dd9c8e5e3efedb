use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use anyhow::{bail, Result};
use swc_atoms::Atom;
use swc_ecma_ast::{
    Decl, DefaultDecl, ExportSpecifier, ImportSpecifier, Module, ModuleDecl, ModuleExportName,
    ModuleItem, Pat, Stmt, TsModuleName,
};
use tracing::debug;

use super::data::{ExportDeps, ExportName, ModuleExportGraph};
use super::scope::free_names;

/// How a top-level name came to be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    /// Bound by an import specifier, under the specifier's local name.
    Import,
    /// Declared by top-level code (variable, function, class, enum).
    Local,
}

#[derive(Debug, Clone, Copy)]
struct TopLevelBinding {
    stmt: usize,
    kind: BindingKind,
}

/// Parses `source` and computes, for every recognized export, the set of
/// top-level statements it depends on and the imported local names it
/// references.
pub fn analyze_exports(source: &str) -> Result<ModuleExportGraph> {
    let (_cm, module) = swc_utils::parse_ecma_src("route-module.tsx", source)?;
    build_export_graph(module)
}

fn build_export_graph(module: Module) -> Result<ModuleExportGraph> {
    let bindings = collect_top_level_bindings(&module);

    // free names of every top-level statement, computed in one pass and
    // shared by every export's closure walk
    let stmt_free: Vec<HashSet<Atom>> = module.body.iter().map(|item| free_names(item)).collect();

    let mut exports: BTreeMap<ExportName, ExportDeps> = BTreeMap::new();

    for (index, item) in module.body.iter().enumerate() {
        let decl = match item {
            ModuleItem::ModuleDecl(decl) => decl,
            ModuleItem::Stmt(_) => continue,
        };
        match decl {
            // `export * from …` passthroughs are not chunkable units
            ModuleDecl::ExportAll(_) => {}

            // `export default foo` and `export default function foo() {}`
            ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_) => {
                let deps = close_over(
                    index,
                    stmt_free[index].iter().cloned(),
                    &bindings,
                    &stmt_free,
                    &module,
                );
                exports.insert(ExportName::Default, deps);
            }

            // `export const foo = 1`, `export function foo() {}`, etc.
            ModuleDecl::ExportDecl(export) => match &export.decl {
                Decl::Var(var) => {
                    let mut names = Vec::with_capacity(var.decls.len());
                    for declarator in &var.decls {
                        match &declarator.name {
                            Pat::Ident(ident) => names.push(ident.id.sym.to_string()),
                            other => bail!(
                                "unsupported {} pattern in exported variable declaration",
                                pattern_kind(other),
                            ),
                        }
                    }
                    // every declarator is rooted at the whole statement
                    let deps = close_over(
                        index,
                        stmt_free[index].iter().cloned(),
                        &bindings,
                        &stmt_free,
                        &module,
                    );
                    for name in names {
                        exports.insert(ExportName::named(name), deps.clone());
                    }
                }
                Decl::Fn(decl) => {
                    let deps = close_over(
                        index,
                        stmt_free[index].iter().cloned(),
                        &bindings,
                        &stmt_free,
                        &module,
                    );
                    exports.insert(ExportName::named(decl.ident.sym.as_str()), deps);
                }
                Decl::Class(decl) => {
                    let deps = close_over(
                        index,
                        stmt_free[index].iter().cloned(),
                        &bindings,
                        &stmt_free,
                        &module,
                    );
                    exports.insert(ExportName::named(decl.ident.sym.as_str()), deps);
                }
                other => bail!("unsupported export declaration kind: {}", decl_kind(other)),
            },

            // `export { a, b as c }`, with or without a source
            ModuleDecl::ExportNamed(export) => {
                for spec in &export.specifiers {
                    let (exported, seeds) = match spec {
                        ExportSpecifier::Named(named) => {
                            let exported = named.exported.as_ref().unwrap_or(&named.orig);
                            // with a source the original name resolves in
                            // the other module, not here
                            let seeds = if export.src.is_none() {
                                match &named.orig {
                                    ModuleExportName::Ident(ident) => vec![ident.sym.clone()],
                                    ModuleExportName::Str(_) => vec![],
                                }
                            } else {
                                vec![]
                            };
                            (ExportName::named(module_export_name(exported)), seeds)
                        }
                        ExportSpecifier::Namespace(ns) => {
                            (ExportName::named(module_export_name(&ns.name)), vec![])
                        }
                        ExportSpecifier::Default(default) => {
                            (ExportName::named(default.exported.sym.as_str()), vec![])
                        }
                    };
                    let deps = close_over(index, seeds, &bindings, &stmt_free, &module);
                    exports.insert(exported, deps);
                }
            }

            ModuleDecl::Import(_) | ModuleDecl::TsImportEquals(_) => {}

            ModuleDecl::TsExportAssignment(_) => {
                bail!("unsupported export form: TypeScript export assignment")
            }
            ModuleDecl::TsNamespaceExport(_) => {
                bail!("unsupported export form: TypeScript namespace export")
            }
        }
    }

    debug!(
        "analyzed {} exports across {} top-level statements",
        exports.len(),
        module.body.len()
    );
    Ok(ModuleExportGraph::new(module, exports))
}

/// Follows the top-level binding graph outward from `seeds` until no new
/// statement is reached. The export's own statement is always included;
/// names with no top-level binding (globals, re-exported names) are not
/// ours to carry.
fn close_over(
    export_stmt: usize,
    seeds: impl IntoIterator<Item = Atom>,
    bindings: &HashMap<Atom, TopLevelBinding>,
    stmt_free: &[HashSet<Atom>],
    module: &Module,
) -> ExportDeps {
    let mut stmts = BTreeSet::new();
    stmts.insert(export_stmt);
    let mut imported_names = BTreeSet::new();

    let mut visited: HashSet<Atom> = HashSet::new();
    let mut worklist: Vec<Atom> = seeds.into_iter().collect();

    while let Some(name) = worklist.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let binding = match bindings.get(&name) {
            Some(binding) => binding,
            None => continue,
        };
        if binding.kind == BindingKind::Import {
            imported_names.insert(name.to_string());
        }
        if stmts.insert(binding.stmt) {
            worklist.extend(stmt_free[binding.stmt].iter().cloned());
        }
    }

    let top_level_non_module_stmts = stmts
        .iter()
        .copied()
        .filter(|&index| !matches!(module.body[index], ModuleItem::ModuleDecl(_)))
        .collect();

    ExportDeps {
        top_level_stmts: stmts,
        top_level_non_module_stmts,
        imported_names,
    }
}

fn collect_top_level_bindings(module: &Module) -> HashMap<Atom, TopLevelBinding> {
    let mut bindings = HashMap::new();

    for (index, item) in module.body.iter().enumerate() {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                for spec in &import.specifiers {
                    let local = match spec {
                        ImportSpecifier::Named(named) => &named.local,
                        ImportSpecifier::Default(default) => &default.local,
                        ImportSpecifier::Namespace(ns) => &ns.local,
                    };
                    bindings.insert(
                        local.sym.clone(),
                        TopLevelBinding {
                            stmt: index,
                            kind: BindingKind::Import,
                        },
                    );
                }
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                collect_decl_bindings(&export.decl, index, &mut bindings);
            }
            // `export default function foo() {}` still binds `foo`
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => match &export.decl {
                DefaultDecl::Fn(fn_expr) => {
                    if let Some(ident) = &fn_expr.ident {
                        insert_local(&mut bindings, ident.sym.clone(), index);
                    }
                }
                DefaultDecl::Class(class_expr) => {
                    if let Some(ident) = &class_expr.ident {
                        insert_local(&mut bindings, ident.sym.clone(), index);
                    }
                }
                DefaultDecl::TsInterfaceDecl(_) => {}
            },
            ModuleItem::Stmt(Stmt::Decl(decl)) => {
                collect_decl_bindings(decl, index, &mut bindings);
            }
            _ => {}
        }
    }

    bindings
}

fn collect_decl_bindings(
    decl: &Decl,
    index: usize,
    bindings: &mut HashMap<Atom, TopLevelBinding>,
) {
    match decl {
        Decl::Var(var) => {
            for declarator in &var.decls {
                collect_pattern_bindings(&declarator.name, index, bindings);
            }
        }
        Decl::Fn(decl) => insert_local(bindings, decl.ident.sym.clone(), index),
        Decl::Class(decl) => insert_local(bindings, decl.ident.sym.clone(), index),
        // enums and namespaces exist at runtime, unlike interfaces and
        // type aliases
        Decl::TsEnum(decl) => insert_local(bindings, decl.id.sym.clone(), index),
        Decl::TsModule(decl) => {
            if let TsModuleName::Ident(ident) = &decl.id {
                insert_local(bindings, ident.sym.clone(), index);
            }
        }
        Decl::TsInterface(_) | Decl::TsTypeAlias(_) | Decl::Using(_) => {}
    }
}

fn collect_pattern_bindings(
    pattern: &Pat,
    index: usize,
    bindings: &mut HashMap<Atom, TopLevelBinding>,
) {
    match pattern {
        Pat::Ident(ident) => insert_local(bindings, ident.id.sym.clone(), index),
        Pat::Array(array_pat) => {
            for sub in array_pat.elems.iter().flatten() {
                collect_pattern_bindings(sub, index, bindings);
            }
        }
        Pat::Object(object_pat) => {
            for prop in &object_pat.props {
                match prop {
                    swc_ecma_ast::ObjectPatProp::KeyValue(kv) => {
                        collect_pattern_bindings(&kv.value, index, bindings);
                    }
                    swc_ecma_ast::ObjectPatProp::Assign(assign_prop) => {
                        insert_local(bindings, assign_prop.key.id.sym.clone(), index);
                    }
                    swc_ecma_ast::ObjectPatProp::Rest(rest) => {
                        collect_pattern_bindings(&rest.arg, index, bindings);
                    }
                }
            }
        }
        Pat::Rest(rest_pat) => collect_pattern_bindings(&rest_pat.arg, index, bindings),
        Pat::Assign(assign_pat) => collect_pattern_bindings(&assign_pat.left, index, bindings),
        Pat::Invalid(_) | Pat::Expr(_) => {}
    }
}

fn insert_local(bindings: &mut HashMap<Atom, TopLevelBinding>, sym: Atom, index: usize) {
    bindings.insert(
        sym,
        TopLevelBinding {
            stmt: index,
            kind: BindingKind::Local,
        },
    );
}

fn module_export_name(name: &ModuleExportName) -> &str {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.as_str(),
        ModuleExportName::Str(value) => value.value.as_str(),
    }
}

pub(crate) fn decl_kind(decl: &Decl) -> &'static str {
    match decl {
        Decl::Var(_) => "variable",
        Decl::Fn(_) => "function",
        Decl::Class(_) => "class",
        Decl::TsInterface(_) => "TypeScript interface",
        Decl::TsTypeAlias(_) => "TypeScript type alias",
        Decl::TsEnum(_) => "TypeScript enum",
        Decl::TsModule(_) => "TypeScript namespace",
        Decl::Using(_) => "using declaration",
    }
}

fn pattern_kind(pattern: &Pat) -> &'static str {
    match pattern {
        Pat::Ident(_) => "identifier",
        Pat::Array(_) => "array destructuring",
        Pat::Object(_) => "object destructuring",
        Pat::Rest(_) => "rest",
        Pat::Assign(_) => "assignment",
        Pat::Expr(_) => "expression",
        Pat::Invalid(_) => "invalid",
    }
}
