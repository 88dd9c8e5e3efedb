use std::collections::HashSet;

use swc_atoms::Atom;
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, BlockStmtOrExpr, BreakStmt, CatchClause, ClassDecl, ClassExpr,
    Constructor, ContinueStmt, FnDecl, FnExpr, ForInStmt, ForOfStmt, ForStmt, Function,
    GetterProp, Ident, ImportDecl, ImportSpecifier, LabeledStmt, ObjectPatProp,
    ParamOrTsParamProp, Pat, SetterProp, TsParamPropParam, VarDecl,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Computes the free identifier names of a node: names used somewhere
/// inside it that no scope it contains binds.
pub(crate) fn free_names<N: VisitWith<FreeNamesVisitor>>(node: &N) -> HashSet<Atom> {
    let mut visitor = FreeNamesVisitor::default();
    node.visit_with(&mut visitor);
    visitor.free
}

/// One lexical scope. Nested scopes run their own visitor and merge the
/// names that escaped them back into the parent via `absorb_child`.
///
/// This mirrors lexical scoping rather than matching text: a shadowed name
/// resolves to its local binding and never escapes, and a name declared
/// later in the same scope counts as hoisted rather than free.
#[derive(Default)]
pub(crate) struct FreeNamesVisitor {
    locals: HashSet<Atom>,
    free: HashSet<Atom>,
}

impl FreeNamesVisitor {
    fn declare_local(&mut self, ident: &Ident) {
        self.locals.insert(ident.sym.clone());
        // A use recorded before its declaration in the same scope was
        // hoisted, not free.
        self.free.remove(&ident.sym);
    }

    fn use_name(&mut self, sym: &Atom) {
        if !self.locals.contains(sym) {
            self.free.insert(sym.clone());
        }
    }

    fn use_name_owned(&mut self, sym: Atom) {
        if !self.locals.contains(&sym) {
            self.free.insert(sym);
        }
    }

    fn absorb_child(&mut self, child: FreeNamesVisitor) {
        for sym in child.free {
            self.use_name_owned(sym);
        }
    }

    /// Declares every name a binding pattern introduces in this scope.
    /// Default values and computed keys are expressions and are walked as
    /// ordinary uses.
    fn declare_pattern(&mut self, pattern: &Pat) {
        match pattern {
            Pat::Ident(ident) => {
                self.declare_local(&ident.id);
                if let Some(type_ann) = &ident.type_ann {
                    type_ann.visit_with(self);
                }
            }
            Pat::Array(array_pat) => {
                for sub in array_pat.elems.iter().flatten() {
                    self.declare_pattern(sub);
                }
                if let Some(type_ann) = &array_pat.type_ann {
                    type_ann.visit_with(self);
                }
            }
            Pat::Object(object_pat) => {
                for prop in &object_pat.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            kv.key.visit_with(self);
                            self.declare_pattern(&kv.value);
                        }
                        ObjectPatProp::Assign(assign_prop) => {
                            self.declare_local(&assign_prop.key.id);
                            if let Some(value) = &assign_prop.value {
                                value.visit_with(self);
                            }
                        }
                        ObjectPatProp::Rest(rest) => self.declare_pattern(&rest.arg),
                    }
                }
                if let Some(type_ann) = &object_pat.type_ann {
                    type_ann.visit_with(self);
                }
            }
            Pat::Rest(rest_pat) => self.declare_pattern(&rest_pat.arg),
            Pat::Assign(assign_pat) => {
                self.declare_pattern(&assign_pat.left);
                assign_pat.right.visit_with(self);
            }
            Pat::Invalid(_) | Pat::Expr(_) => {}
        }
    }
}

impl Visit for FreeNamesVisitor {
    fn visit_ident(&mut self, node: &Ident) {
        self.use_name(&node.sym);
    }

    fn visit_var_decl(&mut self, node: &VarDecl) {
        // declare every binding before walking the initializers so
        // self-referential initializers resolve to the declaration
        for decl in &node.decls {
            self.declare_pattern(&decl.name);
        }
        for decl in &node.decls {
            if let Some(init) = &decl.init {
                init.visit_with(self);
            }
        }
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.declare_local(&node.ident);
        node.function.visit_with(self);
    }

    fn visit_function(&mut self, node: &Function) {
        for decorator in &node.decorators {
            decorator.visit_with(self);
        }

        let mut child = FreeNamesVisitor::default();
        for param in &node.params {
            child.declare_pattern(&param.pat);
        }
        if let Some(type_params) = &node.type_params {
            type_params.visit_with(&mut child);
        }
        if let Some(body) = &node.body {
            body.visit_children_with(&mut child);
        }
        if let Some(return_type) = &node.return_type {
            return_type.visit_with(&mut child);
        }
        self.absorb_child(child);
    }

    fn visit_fn_expr(&mut self, node: &FnExpr) {
        // a function expression's own name is visible only inside it
        let mut child = FreeNamesVisitor::default();
        if let Some(ident) = &node.ident {
            child.declare_local(ident);
        }
        node.function.visit_with(&mut child);
        self.absorb_child(child);
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        let mut child = FreeNamesVisitor::default();
        for param in &node.params {
            child.declare_pattern(param);
        }
        if let Some(type_params) = &node.type_params {
            type_params.visit_with(&mut child);
        }
        match &*node.body {
            BlockStmtOrExpr::BlockStmt(block) => block.visit_children_with(&mut child),
            BlockStmtOrExpr::Expr(expr) => expr.visit_with(&mut child),
        }
        if let Some(return_type) = &node.return_type {
            return_type.visit_with(&mut child);
        }
        self.absorb_child(child);
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        self.declare_local(&node.ident);
        node.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        // a class expression's own name is visible only inside it
        let mut child = FreeNamesVisitor::default();
        if let Some(ident) = &node.ident {
            child.declare_local(ident);
        }
        node.class.visit_with(&mut child);
        self.absorb_child(child);
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        let mut child = FreeNamesVisitor::default();
        for param in &node.params {
            match param {
                ParamOrTsParamProp::Param(param) => child.declare_pattern(&param.pat),
                ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                    TsParamPropParam::Ident(ident) => child.declare_local(&ident.id),
                    TsParamPropParam::Assign(assign) => {
                        child.declare_pattern(&assign.left);
                        assign.right.visit_with(&mut child);
                    }
                },
            }
        }
        if let Some(body) = &node.body {
            body.visit_children_with(&mut child);
        }
        self.absorb_child(child);
    }

    fn visit_getter_prop(&mut self, node: &GetterProp) {
        node.key.visit_with(self);
        let mut child = FreeNamesVisitor::default();
        if let Some(body) = &node.body {
            body.visit_children_with(&mut child);
        }
        self.absorb_child(child);
    }

    fn visit_setter_prop(&mut self, node: &SetterProp) {
        node.key.visit_with(self);
        let mut child = FreeNamesVisitor::default();
        if let Some(this_param) = &node.this_param {
            child.declare_pattern(this_param);
        }
        child.declare_pattern(&node.param);
        if let Some(body) = &node.body {
            body.visit_children_with(&mut child);
        }
        self.absorb_child(child);
    }

    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        let mut child = FreeNamesVisitor::default();
        node.visit_children_with(&mut child);
        self.absorb_child(child);
    }

    fn visit_catch_clause(&mut self, node: &CatchClause) {
        let mut child = FreeNamesVisitor::default();
        if let Some(param) = &node.param {
            child.declare_pattern(param);
        }
        node.body.visit_children_with(&mut child);
        self.absorb_child(child);
    }

    // for-head declarations live in a scope of their own
    fn visit_for_stmt(&mut self, node: &ForStmt) {
        let mut child = FreeNamesVisitor::default();
        node.visit_children_with(&mut child);
        self.absorb_child(child);
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        let mut child = FreeNamesVisitor::default();
        node.visit_children_with(&mut child);
        self.absorb_child(child);
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        let mut child = FreeNamesVisitor::default();
        node.visit_children_with(&mut child);
        self.absorb_child(child);
    }

    fn visit_import_decl(&mut self, node: &ImportDecl) {
        // import locals bind in module scope; the pre-`as` names on the
        // module side of a specifier are not uses
        for spec in &node.specifiers {
            match spec {
                ImportSpecifier::Named(named) => self.declare_local(&named.local),
                ImportSpecifier::Default(default) => self.declare_local(&default.local),
                ImportSpecifier::Namespace(ns) => self.declare_local(&ns.local),
            }
        }
    }

    // break/continue labels and label declarations are not identifier uses
    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_labeled_stmt(&mut self, node: &LabeledStmt) {
        node.body.visit_with(self);
    }
}

#[cfg(test)]
mod test {
    use super::free_names;
    use pretty_assertions::assert_eq;

    // free names of each top-level statement, unioned; statements do not
    // see each other's bindings here (the analyzer resolves those against
    // the top-level binding map instead)
    fn free(src: &str) -> Vec<String> {
        let (_cm, module) = swc_utils::parse_ecma_src("test.ts", src).unwrap();
        let mut names: Vec<String> = module
            .body
            .iter()
            .flat_map(free_names)
            .map(|atom| atom.to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn no_names() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn declared_bindings_are_not_free() {
        assert_eq!(free("let a = 1; var b = 2; const c = 3;"), no_names());
    }

    #[test]
    fn initializer_references_escape() {
        assert_eq!(free("const c = build();"), vec!["build"]);
    }

    #[test]
    fn function_params_shadow_outer_names() {
        assert_eq!(
            free("function sum(a, b) { return a + b + c; }"),
            vec!["c"]
        );
    }

    #[test]
    fn arrow_params_shadow_outer_names() {
        assert_eq!(free("const f = (a) => a + b;"), vec!["b"]);
    }

    #[test]
    fn function_declarations_hoist_within_their_scope() {
        assert_eq!(
            free("const f = () => { return g(); function g() {} };"),
            no_names()
        );
    }

    #[test]
    fn block_scoped_bindings_do_not_leak() {
        assert_eq!(
            free("function f() { { const x = 1; } return x; }"),
            vec!["x"]
        );
    }

    #[test]
    fn member_properties_are_not_uses() {
        assert_eq!(free("const x = obj.prop.deep;"), vec!["obj"]);
    }

    #[test]
    fn computed_members_are_uses() {
        assert_eq!(free("const x = obj[key];"), vec!["key", "obj"]);
    }

    #[test]
    fn object_shorthand_is_a_use() {
        assert_eq!(free("const x = { shorthand };"), vec!["shorthand"]);
    }

    #[test]
    fn object_keys_are_not_uses() {
        assert_eq!(free("const x = { key: value };"), vec!["value"]);
    }

    #[test]
    fn labels_are_not_uses() {
        assert_eq!(free("outer: for (;;) { break outer; }"), no_names());
    }

    #[test]
    fn catch_params_bind_in_the_handler() {
        assert_eq!(
            free("try {} catch (error) { report(error); }"),
            vec!["report"]
        );
    }

    #[test]
    fn for_of_head_binds_in_the_loop() {
        assert_eq!(
            free("for (const item of items) { use(item); }"),
            vec!["items", "use"]
        );
    }

    #[test]
    fn class_members_scope_like_functions() {
        assert_eq!(
            free("class C { method(p) { return p + q; } }"),
            vec!["q"]
        );
    }

    #[test]
    fn named_function_expression_sees_itself() {
        assert_eq!(free("const f = function again() { return again; };"), no_names());
    }

    #[test]
    fn import_locals_are_declarations() {
        assert_eq!(
            free(r#"import def, { named as renamed } from "mod";"#),
            no_names()
        );
    }

    #[test]
    fn destructuring_defaults_are_uses() {
        assert_eq!(free("const { a = fallback } = source();"), vec!["fallback", "source"]);
    }
}
