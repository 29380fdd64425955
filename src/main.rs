use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use kegg_pathway_explorer::cache::FileCache;
use kegg_pathway_explorer::config::Config;
use kegg_pathway_explorer::info::Description;
use kegg_pathway_explorer::kegg::RestClient;
use kegg_pathway_explorer::pass::RenderPass;

#[derive(Parser)]
#[command(author, version, about = "Explore the KEGG Alzheimer's disease pathway around selected biomarkers", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Selection {
    /// TOML file overriding the built-in settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Biomarker to show; repeat for several. Defaults to every option.
    #[arg(short, long = "biomarker")]
    biomarkers: Vec<String>,
    #[arg(long)]
    accession: Option<String>,
    #[arg(long)]
    cache: Option<PathBuf>,
}

impl Selection {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => Config::default(),
        };
        if let Some(accession) = &self.accession {
            config.set_accession(accession);
        }
        if let Some(cache) = &self.cache {
            config.cache_path = cache.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the interactive HTML page for a selection.
    #[command(name = "render")]
    Render {
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Draw the selected part of the pathway to PNG and SVG.
    #[cfg(feature = "diagram")]
    #[command(name = "draw")]
    Draw {
        #[command(flatten)]
        selection: Selection,
        #[arg(long, default_value = "pathway.png")]
        output: PathBuf,
        #[arg(long, default_value_t = kegg_pathway_explorer::diagram::DEFAULT_PADDING_PX)]
        padding: f64,
    },
    /// List the biomarkers that can be selected.
    #[command(name = "biomarkers")]
    Biomarkers {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.command {
        Command::Render { selection, output } => {
            let mut config = selection.load_config()?;
            if let Some(output) = output {
                config.output_path = output;
            }
            render(&config, &selection.biomarkers)
        }
        #[cfg(feature = "diagram")]
        Command::Draw {
            selection,
            output,
            padding,
        } => {
            let config = selection.load_config()?;
            draw(&config, &selection.biomarkers, &output, padding)
        }
        Command::Biomarkers { config } => {
            let config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            for biomarker in &config.biomarkers {
                println!("{biomarker}");
            }
            Ok(())
        }
    }
}

fn render(config: &Config, requested: &[String]) -> Result<()> {
    let selection = config.validate_selection(requested)?;
    let cache = FileCache::new(&config.cache_path);
    let client = RestClient::new(&config.rest_base_url);

    let report = RenderPass::new(config, &cache, &client)
        .run(&selection)
        .context("Render pass failed")?;

    println!("{}", report.notice);
    println!(
        "Showing {} nodes and {} edges",
        report.node_count, report.edge_count
    );
    for info in &report.infos {
        match &info.description {
            Description::Available(text) => println!("{}: {}", info.biomarker, text),
            Description::Unavailable(reason) => println!("{}: {}", info.biomarker, reason),
        }
        println!("  {}", info.link);
    }
    println!("Wrote {}", report.output_path.display());
    Ok(())
}

#[cfg(feature = "diagram")]
fn draw(config: &Config, requested: &[String], output: &std::path::Path, padding: f64) -> Result<()> {
    use kegg_pathway_explorer::{diagram, filter, render};

    let selection = config.validate_selection(requested)?;
    let cache = FileCache::new(&config.cache_path);
    let client = RestClient::new(&config.rest_base_url);

    let (_, graph) = RenderPass::new(config, &cache, &client).load_graph()?;
    let outcome = filter::filter(&graph, &selection);
    println!("{}", outcome.notice());
    let visual = render::to_visual(outcome.graph(), &selection);
    let svg_path = diagram::draw_pathway(outcome.graph(), &visual, output, padding)
        .context("Failed to draw pathway")?;
    println!("Wrote {} and {}", output.display(), svg_path.display());
    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_deref()
        .unwrap_or("info")
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "handlebars=off,reqwest=warn,{}",
            log_level
        )))
        .without_time()
        .init();
}
