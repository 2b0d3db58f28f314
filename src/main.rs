mod app;
mod knowledge;
mod util;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph document to explore: JSON with `nodes` and `edges`, or `.graphml`.
    graph: PathBuf,

    /// Select and center this node id once the graph is loaded.
    #[arg(long, value_name = "ID")]
    focus: Option<String>,

    /// Node ids drawn in the highlight colour.
    #[arg(long, value_name = "ID", value_delimiter = ',')]
    highlight: Vec<String>,

    /// Open the search panel on start.
    #[arg(long)]
    search: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn launch_options(&self) -> app::LaunchOptions {
        app::LaunchOptions {
            focus: self.focus.clone(),
            highlight: self.highlight.clone(),
            open_search: self.search,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };
    let launch = args.launch_options();

    eframe::run_native(
        "kg-explorer",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ExplorerApp::new(
                cc,
                args.graph.clone(),
                launch.clone(),
            )))
        }),
    )
}
