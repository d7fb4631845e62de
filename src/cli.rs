use crate::config::{DisplayAlignment, DisplayMode, GridBase, load_config};
use crate::decode::{ParseOutcome, parse_layout};
use crate::extract::{ProjectContext, QueryError, QueryLocation, run_query};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::render::write_output_svg;
use crate::view::{LayoutView, ToggleOutcome};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "slview", version, about = "Memory layout viewer for C/C++ structures")]
pub struct Args {
    /// Result file (.slbin) or '-' for stdin
    #[arg(short = 'i', long = "input", conflicts_with = "query")]
    pub input: Option<PathBuf>,

    /// Run the extraction tool for FILE:LINE:COL instead of reading a result file
    #[arg(short = 'q', long = "query", requires = "tool")]
    pub query: Option<String>,

    /// Extraction tool executable
    #[arg(long = "tool")]
    pub tool: Option<PathBuf>,

    /// Project context JSON (include dirs, defines, standard, ...)
    #[arg(long = "context")]
    pub context: Option<PathBuf>,

    /// Directory the extraction tool writes its result to
    #[arg(long = "outDir")]
    pub out_dir: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Custom wrap width in bytes (implies --alignment custom)
    #[arg(long = "columns")]
    pub columns: Option<u32>,

    #[arg(long = "alignment", value_enum)]
    pub alignment: Option<AlignmentArg>,

    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Number base of the axis labels
    #[arg(long = "base", value_enum)]
    pub base: Option<BaseArg>,

    /// Expand every node before rendering
    #[arg(long = "expand-all")]
    pub expand_all: bool,

    /// Expand along a path of child indices, e.g. 1.0.2
    #[arg(long = "expand")]
    pub expand: Vec<String>,

    /// Print the description of the node under canvas point X,Y
    #[arg(long = "pick")]
    pub pick: Option<String>,

    /// trace, debug, info, warn or error
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlignmentArg {
    Struct,
    Cacheline,
    Custom,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Stack,
    Flat,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum BaseArg {
    Dec,
    Hex,
}

impl From<AlignmentArg> for DisplayAlignment {
    fn from(value: AlignmentArg) -> Self {
        match value {
            AlignmentArg::Struct => Self::Struct,
            AlignmentArg::Cacheline => Self::Cacheline,
            AlignmentArg::Custom => Self::Custom,
        }
    }
}

impl From<ModeArg> for DisplayMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Stack => Self::Stack,
            ModeArg::Flat => Self::Flat,
        }
    }
}

impl From<BaseArg> for GridBase {
    fn from(value: BaseArg) -> Self {
        match value {
            BaseArg::Dec => Self::Decimal,
            BaseArg::Hex => Self::Hexadecimal,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(alignment) = args.alignment {
        config.viewer.alignment = alignment.into();
    }
    if let Some(mode) = args.mode {
        config.viewer.mode = mode.into();
    }
    if let Some(base) = args.base {
        config.viewer.grid_base = base.into();
    }

    let outcome = load_outcome(&args)?;
    let Some(tree) = outcome.into_tree() else {
        eprintln!("No structure found at the given location.");
        return Ok(());
    };

    let font_family = config.layout.font_family.clone();
    let mut view = LayoutView::new(config);
    view.set_tree(Some(tree));
    if let Some(columns) = args.columns {
        view.set_columns(columns);
    }
    if args.expand_all {
        view.expand_all();
    }
    for path in &args.expand {
        expand_path(&mut view, path)?;
    }

    if let Some(point) = args.pick.as_deref() {
        let (x, y) = parse_point(point)?;
        match view.node_at(x, y).and_then(|id| view.describe(id)) {
            Some(text) => println!("{text}"),
            None => println!("Nothing at {x},{y}"),
        }
        return Ok(());
    }

    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&view.render_svg(), args.output.as_deref())?;
        }
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, &view)?,
            None => {
                let dump = LayoutDump::from_view(&view)
                    .ok_or_else(|| anyhow::anyhow!("no layout loaded"))?;
                println!("{}", serde_json::to_string_pretty(&dump)?);
            }
        },
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&view.render_svg(), &output, &font_family)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, font_family: &str) -> Result<()> {
    crate::render::write_output_png(svg, output, font_family)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _font_family: &str) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn setup_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn load_outcome(args: &Args) -> Result<ParseOutcome> {
    if let Some(query) = args.query.as_deref() {
        let location = QueryLocation::parse(query)
            .ok_or_else(|| anyhow::anyhow!("expected FILE:LINE:COL, got '{query}'"))?;
        let tool = args
            .tool
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("--query needs --tool"))?;
        let ctx = match args.context.as_deref() {
            Some(path) => ProjectContext::load(path)?,
            None => ProjectContext::default(),
        };
        let out_dir = args
            .out_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("slview"));
        return run_query(tool, &location, &ctx, &out_dir).map_err(|err| match err {
            QueryError::ExtractionFailed { ref log, .. } if !log.is_empty() => {
                anyhow::anyhow!("{err}\n{log}")
            }
            other => other.into(),
        });
    }

    let bytes = read_input(args.input.as_deref())?;
    Ok(parse_layout(&bytes)?)
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read(path)?);
    }
    let mut buf = Vec::new();
    io::stdin().read_to_end(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

fn parse_point(input: &str) -> Result<(f32, f32)> {
    let (x, y) = input
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("expected X,Y, got '{input}'"))?;
    Ok((x.trim().parse()?, y.trim().parse()?))
}

fn parse_path(path: &str) -> Result<Vec<usize>> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            segment
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("invalid child index '{segment}' in '{path}'"))
        })
        .collect()
}

/// Walks `path` from the root, expanding each node on the way so the
/// selected child becomes visible. Unions pick their member by index.
fn expand_path(view: &mut LayoutView, path: &str) -> Result<()> {
    let Some(tree) = view.tree() else {
        return Ok(());
    };
    let mut current = tree.root();
    for index in parse_path(path)? {
        let (child, shared, expanded, selected) = {
            let tree = view
                .tree()
                .ok_or_else(|| anyhow::anyhow!("no layout loaded"))?;
            let node = tree.node(current);
            let child = *tree.children(current).get(index).ok_or_else(|| {
                anyhow::anyhow!("'{}' has no child {index}", node.label())
            })?;
            (
                child,
                node.category.is_shared_memory(),
                node.is_expanded,
                node.expansion_index,
            )
        };
        let up_to_date = expanded && (!shared || selected == Some(index));
        if !up_to_date {
            if expanded {
                view.toggle_expand(current, None);
            }
            view.toggle_expand(current, shared.then_some(index));
        }
        current = child;
    }

    let expanded = view
        .tree()
        .is_some_and(|tree| tree.node(current).is_expanded);
    if !expanded && let ToggleOutcome::NeedsChoice(options) = view.toggle_expand(current, None) {
        log::warn!("'{path}' ends on a union, pick one of: {}", options.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_points_and_paths() {
        assert_eq!(parse_point("10.5, 20").unwrap(), (10.5, 20.0));
        assert!(parse_point("10").is_err());
        assert_eq!(parse_path("1.0.2").unwrap(), vec![1, 0, 2]);
        assert!(parse_path("1.x").is_err());
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "slview",
            "-i",
            "result.slbin",
            "--mode",
            "flat",
            "--base",
            "dec",
            "--expand",
            "0.1",
            "--expand",
            "2",
        ])
        .unwrap();
        assert!(matches!(args.mode, Some(ModeArg::Flat)));
        assert_eq!(args.expand, ["0.1", "2"]);
        assert!(Args::try_parse_from(["slview", "-q", "a.cpp:1:1"]).is_err());
    }
}
