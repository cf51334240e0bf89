use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use sysflow::canvas::{CanvasEngine, CanvasError, CanvasOptions, Cell, MemoryCanvas, build_canvas};
use sysflow::{
    EditorConfig, EmitOptions, ImportError, LinkStyleStatus, MermaidSource, Model, emit_mermaid,
    export_json, export_legend, import_json,
};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Import(ImportError),
    Canvas(CanvasError),
    Json(serde_json::Error),
    Config(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Import(err) => write!(f, "{err}"),
            CliError::Canvas(err) => write!(f, "Canvas error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ImportError> for CliError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<CanvasError> for CliError {
    fn from(value: CanvasError) -> Self {
        Self::Canvas(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Mermaid,
    Normalize,
    Canvas,
    Legend,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    safe_mode: bool,
    notes: bool,
    config: Option<String>,
    out: Option<String>,
}

#[derive(Serialize)]
struct BuildOut {
    systems: usize,
    subgroups: usize,
    nodes: usize,
    edges: usize,
    skipped_edges: usize,
}

#[derive(Serialize)]
struct CanvasOut<'a> {
    scale: f64,
    translate: (f64, f64),
    build: BuildOut,
    cells: &'a [Cell],
}

fn usage() -> &'static str {
    "sysflow-cli\n\
\n\
USAGE:\n\
  sysflow-cli [mermaid] [--safe-mode] [--config <file>] [--out <path>] [<path>|-]\n\
  sysflow-cli normalize [--out <path>] [<path>|-]\n\
  sysflow-cli canvas [--pretty] [--config <file>] [<path>|-]\n\
  sysflow-cli legend [--notes] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - <path> is a JSON snapshot; if omitted or '-', it is read from stdin.\n\
  - mermaid prints Mermaid `graph` source; linkStyle diagnostics go to stderr.\n\
  - normalize re-exports the snapshot after import normalization.\n\
  - canvas builds the headless canvas and prints its cells as JSON.\n\
  - legend prints the legend HTML; --notes appends node descriptions.\n\
  - --config deep-merges a JSON settings file over the defaults.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "mermaid" => args.command = Command::Mermaid,
            "normalize" => args.command = Command::Normalize,
            "canvas" => args.command = Command::Canvas,
            "legend" => args.command = Command::Legend,
            "--pretty" => args.pretty = true,
            "--safe-mode" => args.safe_mode = true,
            "--notes" => args.notes = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn load_config(args: &Args) -> Result<EditorConfig, CliError> {
    let mut config = EditorConfig::default();
    if let Some(path) = args.config.as_deref() {
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        if !raw.is_object() {
            return Err(CliError::Config(format!("{path}: expected a JSON object")));
        }
        config.deep_merge(&raw);
    }
    if args.safe_mode {
        config.set_value("edgeStyle.safeMode", Value::Bool(true));
    }
    Ok(config)
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn report_diagnostics(model: &Model, source: &MermaidSource) {
    for collision in model.sanitized_id_collisions() {
        eprintln!(
            "warning: names {} share the diagram id `{}`",
            collision.names.join(", "),
            collision.id
        );
    }
    match &source.link_styles {
        LinkStyleStatus::Dropped { corrupt_edges } => {
            eprintln!("warning: linkStyle block dropped, corrupt edges {corrupt_edges:?}");
        }
        LinkStyleStatus::Emitted | LinkStyleStatus::SafeMode => {}
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let text = read_input(args.input.as_deref())?;
    let mut model = import_json(&text)?;

    match args.command {
        Command::Mermaid => {
            model.migrate_legacy_placement_if_needed();
            let source = emit_mermaid(&model, &EmitOptions::from_config(&config));
            report_diagnostics(&model, &source);
            write_text(&source.text, args.out.as_deref())
        }
        Command::Normalize => {
            let mut json = export_json(&model)?;
            json.push('\n');
            write_text(&json, args.out.as_deref())
        }
        Command::Canvas => {
            let mut canvas = MemoryCanvas::new();
            let built = build_canvas(&mut canvas, &model, &CanvasOptions::from_config(&config))?;
            let cells = canvas.cells();
            let out = CanvasOut {
                scale: canvas.scale(),
                translate: canvas.translate(),
                build: BuildOut {
                    systems: built.systems,
                    subgroups: built.subgroups,
                    nodes: built.nodes,
                    edges: built.edges,
                    skipped_edges: built.skipped_edges,
                },
                cells: &cells,
            };
            write_json(&out, args.pretty)
        }
        Command::Legend => {
            let mut html = export_legend(&model, args.notes);
            html.push('\n');
            write_text(&html, args.out.as_deref())
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
