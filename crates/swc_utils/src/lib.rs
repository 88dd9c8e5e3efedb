use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use swc_common::comments::Comments;
use swc_common::sync::Lrc;
use swc_common::{EqIgnoreSpan, FileName, SourceFile, SourceMap};
use swc_compiler_base::PrintArgs;
use swc_ecma_ast::{Module, ModuleItem};
use swc_ecma_parser::{lexer::Lexer, StringInput, Syntax};
use swc_ecma_parser::{Capturing, Parser, TsSyntax};

pub fn create_lexer<'a>(fm: &'a SourceFile, comments: Option<&'a dyn Comments>) -> Lexer<'a> {
    let filename = fm.name.to_string();
    let lexer = Lexer::new(
        Syntax::Typescript(TsSyntax {
            tsx: filename.ends_with(".tsx") || filename.ends_with(".jsx"),
            decorators: true,
            ..Default::default()
        }),
        Default::default(),
        StringInput::from(fm),
        comments,
    );
    lexer
}

pub fn create_parser<'a>(
    fm: &'a Lrc<SourceFile>,
    comments: Option<&'a dyn Comments>,
) -> Parser<Capturing<Lexer<'a>>> {
    let lexer = create_lexer(fm, comments);
    let capturing = Capturing::new(lexer);

    Parser::new_from(capturing)
}

/// Parses module source into a fresh AST.
///
/// Every call builds an independent tree, so a caller that mutates the
/// result can never reach into a tree another caller is holding.
pub fn parse_ecma_src<TName, TBody>(
    name_str: TName,
    body: TBody,
) -> Result<(Lrc<SourceMap>, Module)>
where
    TName: Into<String>,
    TBody: ToString,
{
    let name: String = name_str.into();
    let cm = Lrc::<SourceMap>::default();
    let fname: Lrc<FileName> = Lrc::new(FileName::Custom(name.clone()));
    let fm = cm.new_source_file(fname, body.to_string());

    let mut parser = create_parser(&fm, None);
    let module = parser
        .parse_typescript_module()
        .map_err(|err| anyhow!("failed to parse {}: {}", name, err.kind().msg()))?;

    Ok((cm, module))
}

/// Printer configuration forwarded to the emitter.
///
/// `cache_component` is deterministic, so two equal option sets always map
/// to the same derived cache key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrintOptions {
    pub minify: bool,
    pub ascii_only: bool,
}

impl PrintOptions {
    pub fn cache_component(&self) -> String {
        format!("minify={},ascii_only={}", self.minify, self.ascii_only)
    }
}

pub fn ast_to_str(cm: &Lrc<SourceMap>, module: &Module, options: &PrintOptions) -> Result<String> {
    let codegen_config = swc_ecma_codegen::Config::default()
        .with_minify(options.minify)
        .with_ascii_only(options.ascii_only);
    let out_str = swc_compiler_base::print(
        cm.clone(),
        module,
        PrintArgs {
            codegen_config,
            ..Default::default()
        },
    )
    .context("failed to print module")?;
    Ok(out_str.code)
}

/// Parse-then-print round trip, putting arbitrary source in printer-normal
/// form. Tests compare emitter output against normalised expectations
/// instead of hand-maintained whitespace.
pub fn normalise_src(src: &str, options: &PrintOptions) -> Result<String> {
    let (cm, parsed) = parse_ecma_src("normalise.ts", src)?;
    ast_to_str(&cm, &parsed, options)
}

/// Structural equivalence of two top-level statements, ignoring spans.
/// Comments live outside the tree in swc, so they never participate.
pub fn statements_equivalent(a: &ModuleItem, b: &ModuleItem) -> bool {
    a.eq_ignore_span(b)
}

#[cfg(test)]
mod test {
    use crate::{normalise_src, parse_ecma_src, statements_equivalent, PrintOptions};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalise_src() {
        assert_eq!(
            normalise_src(
                r#"
                const used_1 = 1;
                const used_2 = 1;
                export { used_1, used_2 }
                "#,
                &PrintOptions::default(),
            )
            .unwrap(),
            r#"const used_1 = 1;
const used_2 = 1;
export { used_1, used_2 };
"#
        );
    }

    #[test]
    fn test_statements_equivalent_ignores_positions() {
        let (_, a) = parse_ecma_src("a.ts", "const x = 1;").unwrap();
        let (_, b) = parse_ecma_src("b.ts", "\n\n    const x = 1;").unwrap();
        let (_, c) = parse_ecma_src("c.ts", "const y = 1;").unwrap();

        assert!(statements_equivalent(&a.body[0], &b.body[0]));
        assert!(!statements_equivalent(&a.body[0], &c.body[0]));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = match parse_ecma_src("broken.ts", "const {") {
            Ok(_) => panic!("expected parse error"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("broken.ts"));
    }

    #[test]
    fn test_cache_component_is_deterministic() {
        let options = PrintOptions {
            minify: true,
            ascii_only: false,
        };
        assert_eq!(options.cache_component(), options.cache_component());
        assert_ne!(
            options.cache_component(),
            PrintOptions::default().cache_component()
        );
    }
}
