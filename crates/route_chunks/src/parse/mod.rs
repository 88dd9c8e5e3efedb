pub mod data;
pub mod export_collector;
mod scope;

pub use data::{ExportDeps, ExportName, ModuleExportGraph};
pub use export_collector::analyze_exports;

pub(crate) use export_collector::decl_kind;
