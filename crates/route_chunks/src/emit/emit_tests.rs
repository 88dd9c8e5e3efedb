use pretty_assertions::assert_eq;
use swc_utils::{normalise_src, PrintOptions};

use crate::emit::{chunked_export_module, omit_chunked_exports};
use crate::parse::{analyze_exports, ExportName};

fn options() -> PrintOptions {
    PrintOptions::default()
}

fn chunk(src: &str, name: &str) -> Option<String> {
    let graph = analyze_exports(src).unwrap();
    chunked_export_module(&graph, &ExportName::named(name), src, &options()).unwrap()
}

fn main_without(src: &str, names: &[&str]) -> Option<String> {
    let graph = analyze_exports(src).unwrap();
    let names: Vec<ExportName> = names.iter().map(|name| ExportName::named(*name)).collect();
    omit_chunked_exports(&graph, &names, src, &options()).unwrap()
}

fn normal(src: &str) -> String {
    normalise_src(src, &options()).unwrap()
}

#[test]
fn independent_exports_split_completely() {
    let src = r#"
        import { a } from "a";
        import { b } from "b";
        export const x = a();
        export const y = b();
    "#;

    assert_eq!(
        chunk(src, "x"),
        Some(normal(r#"import { a } from "a"; export const x = a();"#))
    );
    assert_eq!(
        chunk(src, "y"),
        Some(normal(r#"import { b } from "b"; export const y = b();"#))
    );
    assert_eq!(main_without(src, &["x", "y"]), None);
}

#[test]
fn shared_helpers_leave_the_module_unsplit() {
    let src = r#"
        function helper() {}
        export const x = helper();
        export const y = helper();
    "#;

    assert_eq!(chunk(src, "x"), None);
    assert_eq!(chunk(src, "y"), None);
    assert_eq!(main_without(src, &["x", "y"]), Some(normal(src)));
}

#[test]
fn default_export_chunks_like_any_other() {
    let src = r#"
        import d from "d";
        export default d;
        export const x = 1;
    "#;

    assert_eq!(
        chunk(src, "default"),
        Some(normal(r#"import d from "d"; export default d;"#))
    );
    assert_eq!(
        main_without(src, &["default"]),
        Some(normal("export const x = 1;"))
    );
}

#[test]
fn side_effect_imports_stay_in_the_main_module() {
    let src = r#"
        import "side";
        export const x = 1;
        export const y = 2;
    "#;

    assert_eq!(
        main_without(src, &["x"]),
        Some(normal(r#"import "side"; export const y = 2;"#))
    );
}

#[test]
fn export_all_stays_in_main_and_never_in_chunks() {
    let src = r#"
        export * from "a";
        export const x = 1;
    "#;

    assert_eq!(chunk(src, "x"), Some(normal("export const x = 1;")));
    assert_eq!(
        main_without(src, &["x"]),
        Some(normal(r#"export * from "a";"#))
    );
}

#[test]
fn imports_are_pruned_to_the_needed_specifiers() {
    let src = r#"
        import { a, b } from "m";
        export const x = a;
        export const y = b;
    "#;

    assert_eq!(
        chunk(src, "x"),
        Some(normal(r#"import { a } from "m"; export const x = a;"#))
    );
    assert_eq!(
        main_without(src, &["x"]),
        Some(normal(r#"import { b } from "m"; export const y = b;"#))
    );
    assert_eq!(main_without(src, &["x", "y"]), None);
}

#[test]
fn named_specifier_exports_carry_their_binding() {
    let src = r#"
        const loaderImpl = () => null;
        export { loaderImpl as clientLoader };
    "#;

    assert_eq!(chunk(src, "clientLoader"), Some(normal(src)));
}

#[test]
fn multi_declarator_statements_are_restricted_per_name() {
    let src = "export const first = () => null, second = 1;";

    assert_eq!(
        chunk(src, "first"),
        Some(normal("export const first = () => null;"))
    );
    assert_eq!(
        main_without(src, &["first"]),
        Some(normal("export const second = 1;"))
    );
}

#[test]
fn absent_exports_produce_no_chunk() {
    assert_eq!(chunk("export const x = 1;", "missing"), None);
}

#[test]
fn listed_but_unchunkable_exports_stay_in_main() {
    let src = r#"
        import { k } from "k";
        export const x = k;
        export const y = k;
    "#;

    assert_eq!(main_without(src, &["x"]), Some(normal(src)));
}

#[test]
fn emitters_do_not_disturb_the_analysis_graph() {
    let src = r#"
        import { a } from "a";
        export const x = a();
        export const y = 2;
    "#;
    let graph = analyze_exports(src).unwrap();
    let before = graph.clone();

    let first = chunked_export_module(&graph, &ExportName::named("x"), src, &options()).unwrap();
    let again = chunked_export_module(&graph, &ExportName::named("x"), src, &options()).unwrap();
    let main = omit_chunked_exports(&graph, &[ExportName::named("x")], src, &options()).unwrap();

    assert_eq!(first, again);
    assert!(main.is_some());
    assert_eq!(before, graph);
}
