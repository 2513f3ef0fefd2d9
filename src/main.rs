use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{debug, error, info};

use survivor_pipeline::{
    CategoryCounts, FilterConfig, FilterPatch, Port, Sex, SurvivalPipeline, load_dataset,
    render_snapshot, save_records,
};

#[derive(Debug, Parser)]
#[command(name = "survivors")]
#[command(about = "Filter and aggregate Titanic survivors")]
struct Cli {
    /// Dataset to load (.csv or a .bin.gz snapshot)
    #[arg(env = "SURVIVORS_DATASET")]
    dataset: PathBuf,

    /// JSON file with the starting filter configuration
    #[arg(long)]
    filters: Option<PathBuf>,

    /// Filter edits applied after loading, e.g. --set male=false
    #[arg(long = "set", value_name = "KEY=VALUE")]
    patches: Vec<FilterPatch>,

    /// Print the projections as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Write a snapshot of the loaded dataset to this path
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Read filter edits from stdin and redraw after each one
    #[arg(long, short)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let filters = match &cli.filters {
        Some(path) => {
            let config: FilterConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
            debug!("starting filters from {}: {:?}", path.display(), config);
            config
        }
        None => FilterConfig::default(),
    };

    let pipeline = SurvivalPipeline::with_filters(filters);
    let graph = pipeline.graph();

    // Stand-ins for the chart layer: log every settled projection.
    let _by_sex = graph.subscribe(&pipeline.by_sex, |counts: &CategoryCounts<Sex>| {
        debug!("by_sex total={} groups={:?}", counts.total, counts.keys());
    });
    let _by_port = graph.subscribe(&pipeline.by_port, |counts: &CategoryCounts<Port>| {
        debug!("by_port total={} groups={:?}", counts.total, counts.keys());
    });

    let started = Instant::now();
    match load_dataset(&pipeline, &cli.dataset).await {
        Ok(count) => info!(
            "{} records ready in {:.3}s",
            count,
            started.elapsed().as_secs_f64()
        ),
        Err(e) => {
            error!("dataset load failed: {}", e);
            return Err(e.into());
        }
    }

    if let Some(path) = &cli.snapshot {
        save_records(&graph.get(&pipeline.records), path)?;
        info!("snapshot written to {}", path.display());
    }

    if !cli.patches.is_empty() {
        pipeline.update_filters(|filters| {
            for patch in &cli.patches {
                patch.apply(filters);
            }
        });
    }

    if cli.interactive {
        run_interactive(&pipeline)?;
    } else if cli.json {
        println!("{}", serde_json::to_string_pretty(&pipeline.snapshot())?);
    } else {
        print!("{}", render_snapshot(&pipeline.snapshot()));
    }

    Ok(())
}

fn run_interactive(pipeline: &SurvivalPipeline) -> io::Result<()> {
    let stdin = io::stdin();
    let mut status = String::from("ok");
    let mut show = true;
    let mut start_time = Instant::now();

    loop {
        if show {
            print!("{}", render_snapshot(&pipeline.snapshot()));
        }
        print!(
            "[{:.1}] ({}) > ",
            start_time.elapsed().as_secs_f64(),
            status
        );
        io::stdout().flush()?;

        let mut command = String::new();
        if stdin.lock().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();
        show = true;

        match command {
            "" => {
                status = String::from("invalid command");
                show = false;
            }
            "q" => break,
            "help" => {
                println!("Commands:");
                println!("  q: Quit");
                println!("  show: Redraw the projections");
                println!("  reset: Restore the default filters");
                println!("  <key>=<value>: Set a filter (male, female, class1-3, pC, pQ, pS, minAge, maxAge)");
                status = String::from("ok");
                show = false;
            }
            "show" => status = String::from("ok"),
            "reset" => {
                pipeline.set_filters(FilterConfig::default());
                status = String::from("ok");
            }
            _ => match command.parse::<FilterPatch>() {
                Ok(patch) => {
                    pipeline.update_filters(|filters| patch.apply(filters));
                    status = String::from("ok");
                }
                Err(e) => {
                    status = e.to_string();
                    show = false;
                }
            },
        }
    }
    Ok(())
}
