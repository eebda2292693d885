mod render;

use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gdexpr_catalog::{Catalog, FunctionSignature, OwnerScope, Scene, ValueKind};
use gdexpr_core::{
    DEFAULT_MAX_DEPTH, ParseOptions, ParseResult, UnknownFunctionPolicy, parse_expression,
    to_pretty_json,
};
use gdexpr_diagnostics::{self as diag, Diagnostic, LineIndex, Severity};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::render::{Format, print_summary, render_diagnostics};

// ── Embedded catalog ────────────────────────────────────────────────────

/// Function catalog baked into the binary at compile time.
#[cfg(has_embedded_catalog)]
const EMBEDDED_CATALOG_JSONC: &str = include_str!(concat!(env!("OUT_DIR"), "/catalog.jsonc"));

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "gdexpr",
    version,
    about = "Parse and check game logic expressions against a function catalog"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Path to a JSONC function catalog. When omitted, uses the catalog
    /// embedded at compile time.
    #[arg(long, global = true)]
    catalog: Option<String>,

    /// Path to a JSONC scene (objects, global objects and their behaviors).
    /// When omitted, the scene is empty.
    #[arg(long, global = true)]
    scene: Option<String>,

    /// Log resolution decisions to stderr (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse an expression and print its tree.
    Parse(ExpressionArgs),

    /// Check an expression without printing its tree.
    Check(ExpressionArgs),

    /// List catalog functions.
    Functions {
        /// Only functions of this scope.
        #[arg(long, value_enum)]
        scope: Option<ScopeArg>,
        /// Only functions of this object or behavior type.
        #[arg(long)]
        owner: Option<String>,
        /// Only functions returning this kind of value.
        #[arg(long, value_enum)]
        returns: Option<KindArg>,
    },

    /// Explain a diagnostic ID (e.g. GDX1101).
    Explain { id: String },
}

/// Input and parser options shared by `parse` and `check`.
#[derive(Args, Debug)]
struct ExpressionArgs {
    /// File holding the expression, or `-` for stdin.
    #[arg(required_unless_present = "expr", conflicts_with = "expr")]
    file: Option<String>,

    /// Expression given inline.
    #[arg(long, short = 'e')]
    expr: Option<String>,

    /// Grammar to parse with.
    #[arg(long, value_enum, default_value_t = KindArg::Number)]
    kind: KindArg,

    /// Reject unknown functions in numeric expressions, except built-in
    /// math functions.
    #[arg(long)]
    strict: bool,

    /// Deepest sub-expression nesting accepted.
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

impl ExpressionArgs {
    fn options(&self) -> ParseOptions {
        ParseOptions {
            unknown_functions: if self.strict {
                UnknownFunctionPolicy::BuiltinsOnly
            } else {
                UnknownFunctionPolicy::PassThrough
            },
            max_depth: self.max_depth,
        }
    }

    /// The expression text and the name diagnostics are reported under.
    fn read_input(&self) -> Result<(String, String)> {
        let (text, name) = match (&self.expr, self.file.as_deref()) {
            (Some(expr), _) => (expr.clone(), "<expr>".to_string()),
            (None, Some("-")) => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read expression from stdin")?;
                (buf, "<stdin>".to_string())
            }
            (None, Some(path)) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read expression file '{path}'"))?;
                (text, path.to_string())
            }
            (None, None) => bail!("no expression given; pass a FILE, `-` or --expr"),
        };
        Ok((text.trim_end_matches(['\n', '\r']).to_string(), name))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// Numeric expression.
    Number,
    /// Text expression.
    Text,
}

impl From<KindArg> for ValueKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Number => ValueKind::Number,
            KindArg::Text => ValueKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    /// Functions without a receiver.
    Static,
    /// Functions of objects.
    Object,
    /// Functions of behaviors.
    Behavior,
}

impl From<ScopeArg> for OwnerScope {
    fn from(s: ScopeArg) -> Self {
        match s {
            ScopeArg::Static => OwnerScope::Static,
            ScopeArg::Object => OwnerScope::ObjectBound,
            ScopeArg::Behavior => OwnerScope::BehaviorBound,
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli, format) {
        match format {
            Format::Json => {
                let out = serde_json::json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                });
                println!("{out}");
            }
            Format::Pretty => eprintln!("error: {err:#}"),
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,gdexpr_core=debug,gdexpr_cli=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, format: Format) -> Result<()> {
    match cli.cmd {
        Cmd::Parse(args) => {
            let catalog = resolve_catalog(cli.catalog.as_deref())?;
            let scene = resolve_scene(cli.scene.as_deref())?;
            cmd_parse(&args, &catalog, &scene, format)
        }
        Cmd::Check(args) => {
            let catalog = resolve_catalog(cli.catalog.as_deref())?;
            let scene = resolve_scene(cli.scene.as_deref())?;
            cmd_check(&args, &catalog, &scene, format)
        }
        Cmd::Functions {
            scope,
            owner,
            returns,
        } => {
            let catalog = resolve_catalog(cli.catalog.as_deref())?;
            cmd_functions(
                &catalog,
                scope.map(Into::into),
                owner.as_deref(),
                returns.map(Into::into),
                format,
            )
        }
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn parse_input(
    args: &ExpressionArgs,
    catalog: &Catalog,
    scene: &Scene,
) -> Result<(String, String, ParseResult)> {
    let (text, name) = args.read_input()?;
    debug!(input = %name, len = text.len(), "parsing expression");
    let result = parse_expression(&text, args.kind.into(), catalog, scene, args.options());
    Ok((text, name, result))
}

fn cmd_parse(args: &ExpressionArgs, catalog: &Catalog, scene: &Scene, format: Format) -> Result<()> {
    let (text, name, result) = parse_input(args, catalog, scene)?;

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "expression": result.expression,
                "diagnostics": result.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Tree to stdout, diagnostics to stderr.
            if let Some(expression) = &result.expression {
                println!("{}", to_pretty_json(expression));
            }
            render_diagnostics(&text, &name, &result.diagnostics);
            print_summary(&result.diagnostics);
        }
    }

    exit_on_errors(&result.diagnostics);
    Ok(())
}

fn cmd_check(args: &ExpressionArgs, catalog: &Catalog, scene: &Scene, format: Format) -> Result<()> {
    let (text, name, result) = parse_input(args, catalog, scene)?;
    let ok = result.is_ok();

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": ok,
                "position": error_position(&text, &result),
                "diagnostics": result.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics(&text, &name, &result.diagnostics);
            print_summary(&result.diagnostics);
            if ok {
                eprintln!("expression ok");
            }
        }
    }

    exit_on_errors(&result.diagnostics);
    Ok(())
}

fn cmd_functions(
    catalog: &Catalog,
    scope: Option<OwnerScope>,
    owner: Option<&str>,
    returns: Option<ValueKind>,
    format: Format,
) -> Result<()> {
    let selected: Vec<&FunctionSignature> = catalog
        .functions()
        .iter()
        .filter(|f| scope.is_none_or(|s| f.scope == s))
        .filter(|f| owner.is_none_or(|o| f.owner_type.as_deref() == Some(o)))
        .filter(|f| returns.is_none_or(|r| f.returns == r))
        .collect();

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
        Format::Pretty => {
            use ariadne::Fmt;
            for f in &selected {
                let receiver = match (f.scope, f.owner_type.as_deref()) {
                    (OwnerScope::ObjectBound, Some("")) => "*.".to_string(),
                    (OwnerScope::ObjectBound, Some(ty)) => format!("{ty}."),
                    _ => String::new(),
                };
                let signature = format!("{receiver}{}", f.display_signature());
                println!(
                    "{:<8} {:<6} {}",
                    f.scope.to_string(),
                    f.returns.to_string(),
                    signature.fg(ariadne::Color::Cyan)
                );
            }
            eprintln!("{} of {} functions", selected.len(), catalog.len());
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "known": diag::codes::is_known(id),
                "severity": diag::default_severity(id),
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// First error as `{offset, line, column}`, with 1-based line and column.
fn error_position(text: &str, result: &ParseResult) -> serde_json::Value {
    let Some(offset) = result.first_error_position() else {
        return serde_json::Value::Null;
    };
    let (line, column) = LineIndex::new(text).line_col(offset);
    serde_json::json!({ "offset": offset, "line": line + 1, "column": column + 1 })
}

/// Exit with code 1 if any diagnostic is an error.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}

/// Resolve the catalog from (in priority order):
///   1. Explicit `--catalog` path
///   2. The catalog embedded at compile time
fn resolve_catalog(explicit_path: Option<&str>) -> Result<Catalog> {
    if let Some(path) = explicit_path {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file '{path}'"))?;
        let catalog = Catalog::from_jsonc(&text)
            .with_context(|| format!("failed to load catalog file '{path}'"))?;
        debug!(path, functions = catalog.len(), "loaded catalog");
        return Ok(catalog);
    }
    embedded_catalog()
}

#[cfg(has_embedded_catalog)]
fn embedded_catalog() -> Result<Catalog> {
    Catalog::from_jsonc(EMBEDDED_CATALOG_JSONC).context("embedded catalog is invalid")
}

#[cfg(not(has_embedded_catalog))]
fn embedded_catalog() -> Result<Catalog> {
    bail!("no function catalog available; use --catalog or rebuild with data/catalog.jsonc")
}

fn resolve_scene(path: Option<&str>) -> Result<Scene> {
    let Some(path) = path else {
        return Ok(Scene::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read scene file '{path}'"))?;
    let scene =
        Scene::from_jsonc(&text).with_context(|| format!("failed to load scene file '{path}'"))?;
    debug!(
        path,
        objects = scene.objects().len(),
        global_objects = scene.global_objects().len(),
        "loaded scene"
    );
    Ok(scene)
}
