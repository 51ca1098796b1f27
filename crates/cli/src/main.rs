use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use mdflowy_core::{
    Document, HostPage, MutationObserver, PanelController, PreviewConfig, RenderTrigger, StaticPage, diff_snapshots,
    inject_preview,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

use echo::{
    format_size, print_banner, print_collect_stats, print_field, print_info, print_replay, print_step, print_success,
    print_warning,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const STEPS: usize = 4;

/// What to print once the page has been replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// The Document String fed to the Markdown engine
    Markdown,
    /// The preview container contents
    Html,
    /// Plain text of the preview
    Text,
    /// The page with the preview panel injected
    Page,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "page" => Ok(Self::Page),
            _ => Err(format!("Invalid format: {}. Valid options: markdown, html, text, page", s)),
        }
    }
}

/// Render the Markdown preview of an outliner page snapshot
#[derive(Parser, Debug)]
#[command(name = "mdflowy")]
#[command(author = "mdflowy Contributors")]
#[command(version)]
#[command(about = "Render the Markdown preview of an outliner page snapshot", long_about = None)]
struct Args {
    /// Page snapshot (HTML file, or "-" for stdin)
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<String>,

    /// Later snapshot of the same page, replayed as a change (repeatable)
    #[arg(long = "then", value_name = "SNAPSHOT")]
    then: Vec<PathBuf>,

    /// Output format (markdown, html, text, page)
    #[arg(short, long, default_value = "html", value_name = "FORMAT")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Flatten host formatting to plain text before rendering
    #[arg(long)]
    plain: bool,

    /// Do not turn bare URLs into links
    #[arg(long)]
    no_linkify: bool,

    /// Typeset $...$ and $$...$$ formulas
    #[arg(long)]
    math: bool,

    /// Highlight theme for code blocks
    #[arg(long, value_name = "NAME")]
    theme: Option<String>,

    /// Config file (default: ~/.config/mdflowy/config.json)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn load_config(args: &Args) -> anyhow::Result<PreviewConfig> {
    let mut config = match &args.config {
        Some(path) => PreviewConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PreviewConfig::load().context("Failed to load config")?,
    };

    if args.plain {
        config.extract.preserve_host_formatting = false;
    }
    if args.no_linkify {
        config.markdown.linkify = false;
    }
    if args.math {
        config.render_math = true;
    }
    if let Some(theme) = &args.theme {
        config.highlight_theme = theme.clone();
    }
    Ok(config)
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "mdflowy", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let input = args.input.as_deref().context("No input given")?;
    let config = load_config(&args)?;

    if args.verbose {
        let source = if input == "-" { "stdin".to_string() } else { input.bright_white().to_string() };
        print_step(1, STEPS, &format!("Reading snapshot from {}", source));
    }

    let html = read_input(input)?;

    if args.verbose {
        print_field("Size", &format_size(html.len()));
        eprintln!();
        print_step(2, STEPS, "Loading page");
    }

    let trigger = RenderTrigger::new(config.host.clone());
    let mut panel = PanelController::new(StaticPage::new(html), config).context("Failed to set up preview")?;

    let blank = Document::parse("").context("Failed to parse HTML")?;
    let first = panel.page().snapshot().context("Failed to parse HTML")?;
    let batch = diff_snapshots(&blank, &first, &panel.config().host);
    panel.on_change(&batch);

    if !panel.is_loaded() {
        print_warning("No page container found; the preview panel was not created");
    }
    panel.toggle();

    if args.verbose {
        let (_, stats) = panel.renderer().collector().collect_with_stats(&first);
        print_collect_stats(&stats);
        print_field("Stylesheets", &panel.styles().len().to_string());
        eprintln!();
        print_step(3, STEPS, &format!("Replaying {} snapshot(s)", args.then.len()));
    }

    for path in &args.then {
        let next_html =
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
        let prev = panel.page().snapshot().context("Failed to parse HTML")?;
        let next = Document::parse(&next_html).context("Failed to parse HTML")?;
        let batch = diff_snapshots(&prev, &next, &panel.config().host);

        if args.verbose {
            print_replay(&path.display().to_string(), batch.len(), trigger.evaluate(&batch));
        }

        panel.page_mut().replace(next_html);
        panel.on_change(&batch);
    }

    if let Some(err) = panel.renderer().last_error() {
        print_warning(&format!("Last render failed, showing previous output: {}", err));
    }

    let output = match args.format {
        OutputFormat::Markdown => {
            let doc = panel.page().snapshot().context("Failed to parse HTML")?;
            panel.renderer().collector().collect(&doc)
        }
        OutputFormat::Html => panel.renderer().html().to_string(),
        OutputFormat::Text => Document::parse_fragment(panel.renderer().html()).text_content(),
        OutputFormat::Page => inject_preview(panel.page().html(), &panel.view(), panel.styles(), &panel.config().host)
            .context("Failed to inject preview")?,
    };

    if args.verbose {
        eprintln!();
        print_step(4, STEPS, "Writing output");
        print_field("Renders", &panel.renderer().render_count().to_string());
        print_field("Format", &format!("{:?}", args.format));
        eprintln!();
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}
