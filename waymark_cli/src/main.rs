// CLI entry point for waymark.
//
// Loads a JSON scene, builds the navmesh, and answers path queries. Output is
// JSON lines on stdout: one `stats` record for the built mesh, then one record
// per query. Logs go to stderr.
//
// Usage:
//   waymark --scene <FILE> [OPTIONS]
//     --config <FILE>     Replace the scene's config with this one
//     --from <X,Y>        Query start (requires --to); replaces scene queries
//     --to <X,Y>          Query end
//     -v, --verbose       Debug-level logging
//
// See `waymark_nav::scene` for the scene format.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tracing::{Level, info};
use waymark_nav::scene::{PathQuery, Scene};
use waymark_nav::{NavConfig, NavStats, PathOutcome, Vec2};

#[derive(Parser, Debug)]
#[command(name = "waymark")]
#[command(about = "Build a navigation mesh from a scene file and answer path queries")]
struct Args {
    /// Scene JSON (config, obstacles, queries)
    #[arg(long, short = 's')]
    scene: PathBuf,

    /// Config JSON overriding the scene's own config
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Query start point as "x,y"
    #[arg(long, value_parser = parse_point, requires = "to", allow_hyphen_values = true)]
    from: Option<Vec2>,

    /// Query end point as "x,y"
    #[arg(long, value_parser = parse_point, requires = "from", allow_hyphen_values = true)]
    to: Option<Vec2>,

    /// Log at debug level
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(Serialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record {
    Stats(NavStats),
    Query {
        start: Vec2,
        end: Vec2,
        result: PathOutcome,
    },
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got {s:?}"))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Vec2::new(x, y))
}

fn emit(record: &Record) -> Result<()> {
    println!("{}", serde_json::to_string(record).context("serializing output record")?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut scene = Scene::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    if let Some(path) = &args.config {
        scene.config = NavConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?;
    }

    let queries = match (args.from, args.to) {
        (Some(start), Some(end)) => vec![PathQuery { start, end }],
        (None, None) => scene.queries.clone(),
        _ => bail!("--from and --to must be given together"),
    };

    let mut mesh = scene.build().context("building navmesh")?;
    let stats = mesh.stats();
    info!(
        nodes = stats.nodes,
        edges = stats.edges,
        obstacles = stats.obstacles,
        "navmesh built"
    );
    emit(&Record::Stats(stats))?;

    for query in queries {
        let result = mesh.query_path(query.start, query.end);
        emit(&Record::Query {
            start: query.start,
            end: query.end,
            result,
        })?;
    }
    Ok(())
}
