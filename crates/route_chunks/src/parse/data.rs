use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display, Formatter};

use swc_ecma_ast::{Module, ModuleItem};

/// The name under which a binding is exposed by a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportName {
    /// `export default …`, exposed under the literal name "default".
    Default,
    /// Any other export form, keyed by the exported (post-`as`) name.
    Named(String),
}

impl ExportName {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == "default" {
            ExportName::Default
        } else {
            ExportName::Named(name)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExportName::Default => "default",
            ExportName::Named(name) => name,
        }
    }
}

impl Display for ExportName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level dependency summary for one exported name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDeps {
    /// Indices into the analysis module body of every top-level statement
    /// the export depends on, its own defining statement included.
    pub top_level_stmts: BTreeSet<usize>,
    /// The subset of `top_level_stmts` that is neither an import nor an
    /// export declaration.
    pub top_level_non_module_stmts: BTreeSet<usize>,
    /// Local names bound by import specifiers that the export references,
    /// directly or through its top-level dependencies.
    pub imported_names: BTreeSet<String>,
}

/// Result of analyzing one module: the working AST plus per-export
/// dependency summaries.
///
/// The retained module is the identity space for the statement indices in
/// each [`ExportDeps`]. It is never mutated and never printed; emitters
/// parse their own copies of the source and relocate statements by
/// structural equivalence.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleExportGraph {
    module: Module,
    exports: BTreeMap<ExportName, ExportDeps>,
}

impl ModuleExportGraph {
    pub(crate) fn new(module: Module, exports: BTreeMap<ExportName, ExportDeps>) -> Self {
        Self { module, exports }
    }

    pub fn get(&self, name: &ExportName) -> Option<&ExportDeps> {
        self.exports.get(name)
    }

    pub fn exports(&self) -> impl Iterator<Item = (&ExportName, &ExportDeps)> {
        self.exports.iter()
    }

    pub fn export_names(&self) -> impl Iterator<Item = &ExportName> {
        self.exports.keys()
    }

    pub fn statement(&self, index: usize) -> &ModuleItem {
        &self.module.body[index]
    }
}
