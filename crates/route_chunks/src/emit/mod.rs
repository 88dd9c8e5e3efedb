mod chunk;
mod main;
#[cfg(test)]
mod emit_tests;

pub use chunk::chunked_export_module;
pub use main::omit_chunked_exports;

use swc_ecma_ast::{ExportSpecifier, Ident, ImportSpecifier, ModuleExportName};

/// The local binding an import specifier introduces.
pub(crate) fn import_local(spec: &ImportSpecifier) -> &Ident {
    match spec {
        ImportSpecifier::Named(named) => &named.local,
        ImportSpecifier::Default(default) => &default.local,
        ImportSpecifier::Namespace(ns) => &ns.local,
    }
}

/// The name under which an export specifier exposes its binding, the
/// post-`as` name when one is present.
pub(crate) fn specifier_exported_name(spec: &ExportSpecifier) -> &str {
    match spec {
        ExportSpecifier::Named(named) => {
            module_export_name(named.exported.as_ref().unwrap_or(&named.orig))
        }
        ExportSpecifier::Namespace(ns) => module_export_name(&ns.name),
        ExportSpecifier::Default(default) => default.exported.sym.as_str(),
    }
}

pub(crate) fn module_export_name(name: &ModuleExportName) -> &str {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.as_str(),
        ModuleExportName::Str(value) => value.value.as_str(),
    }
}
