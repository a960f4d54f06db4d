//! hpc-cli - Tool for inspecting Houdini point cache files.

use std::env;
use std::path::Path;
use std::process;

use houdini_pointcache::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "HPC_LOG";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Normal,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "off",
            Self::Normal => "warn",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    // Explicit flags win over the environment
    let filter = match verbosity {
        Verbosity::Normal => {
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(verbosity.directive()))
        }
        _ => EnvFilter::new(verbosity.directive()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut verbosity = Verbosity::Normal;
    let mut config: Option<String> = None;
    let mut title: Option<String> = None;
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Debug,
            "-vv" | "--trace" => verbosity = Verbosity::Trace,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "-c" | "--config" => config = iter.next().cloned(),
            "-t" | "--title" => title = iter.next().cloned(),
            _ => filtered_args.push(arg),
        }
    }

    init_logging(verbosity);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let mut opts = match config {
        Some(path) => LoadOptions::from_json_file(&path).unwrap_or_else(|e| {
            eprintln!("Failed to read config {}: {}", path, e);
            process::exit(1);
        }),
        None => LoadOptions::default(),
    };
    if let Some(title) = title {
        opts.custom_title_row = Some(title);
    }

    match filtered_args[0] {
        "info" | "i" => {
            require_args(&filtered_args, 2, "hpc-cli info <file>");
            cmd_info(filtered_args[1], &opts);
        }

        "attrs" | "a" => {
            require_args(&filtered_args, 2, "hpc-cli attrs <file>");
            cmd_attrs(filtered_args[1], &opts);
        }

        "point" | "p" => {
            require_args(&filtered_args, 4, "hpc-cli point <file> <id> <time> [attr]");
            let id = parse_arg::<usize>(filtered_args[2], "point id");
            let time = parse_arg::<f32>(filtered_args[3], "time");
            cmd_point(filtered_args[1], &opts, id, time, filtered_args.get(4).copied());
        }

        "spawn" | "s" => {
            require_args(&filtered_args, 5, "hpc-cli spawn <file> <t0> <t1> <dt>");
            let t0 = parse_arg::<f32>(filtered_args[2], "t0");
            let t1 = parse_arg::<f32>(filtered_args[3], "t1");
            let dt = parse_arg::<f32>(filtered_args[4], "dt");
            if dt <= 0.0 {
                eprintln!("Error: dt must be positive");
                process::exit(1);
            }
            cmd_spawn(filtered_args[1], &opts, t0, t1, dt);
        }

        "export" | "e" => {
            require_args(&filtered_args, 3, "hpc-cli export <file> <out>");
            cmd_export(filtered_args[1], filtered_args[2], &opts);
        }

        "version" => print_version(),

        "help" | "h" | "-h" | "--help" => print_help(),

        // Default: if file exists, show info; otherwise error
        _ => {
            if Path::new(filtered_args[0]).exists() {
                cmd_info(filtered_args[0], &opts);
            } else {
                eprintln!("Unknown command: {}", filtered_args[0]);
                eprintln!();
                print_help();
                process::exit(1);
            }
        }
    }
}

fn require_args(args: &[&str], count: usize, usage: &str) {
    if args.len() < count {
        eprintln!("Error: missing arguments");
        eprintln!("Usage: {}", usage);
        process::exit(1);
    }
}

fn parse_arg<T: std::str::FromStr>(value: &str, what: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid {}: {}", what, value);
        process::exit(1);
    })
}

fn print_version() {
    println!(
        "hpc-cli {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("HPC_BUILD_DATE"),
        env!("HPC_BUILD_TIME")
    );
}

fn print_help() {
    print_version();
    println!();
    println!("USAGE:");
    println!("    hpc-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <file>                     Show cache summary as JSON");
    println!("    a, attrs  <file>                     List attributes and special roles");
    println!("    p, point  <file> <id> <time> [attr]  Interpolate a point at a time");
    println!("    s, spawn  <file> <t0> <t1> <dt>      Replay spawn queries over a time range");
    println!("    e, export <file> <out>               Write the retained source file");
    println!("    version                              Show version and build date");
    println!("    h, help                              Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose        Show debug output");
    println!("    -vv, --trace         Show trace output (very verbose)");
    println!("    -q, --quiet          Suppress all log output");
    println!("    -c, --config <file>  Load options from a JSON file");
    println!("    -t, --title <row>    Replace the CSV title row");
    println!();
    println!("ENVIRONMENT:");
    println!("    {}              Log filter (default: warn)", LOG_ENV);
    println!();
    println!("EXAMPLES:");
    println!("    hpc-cli info sparks.hbjson");
    println!("    hpc-cli point sparks.hcsv 12 1.5 Cd");
    println!("    hpc-cli --title \"id,P,time\" spawn raw.hcsv 0 2 0.04");
}

fn open(path: &str, opts: &LoadOptions) -> PointCache {
    info!("Loading point cache: {}", path);
    match PointCache::load_with(path, opts) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn cmd_info(path: &str, opts: &LoadOptions) {
    let cache = open(path, opts);
    match serde_json::to_string_pretty(&cache.summary()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize summary: {}", e);
            process::exit(1);
        }
    }
}

fn cmd_attrs(path: &str, opts: &LoadOptions) {
    let cache = open(path, opts);

    println!("Attributes ({}):", cache.number_of_attributes());
    for (index, name) in cache.attribute_names().iter().enumerate() {
        let roles: Vec<&str> = SpecialAttribute::ALL
            .iter()
            .filter(|&&role| cache.role_index(role) == Some(index))
            .map(|role| role.label())
            .collect();
        if roles.is_empty() {
            println!("  [{:>3}] {}", index, name);
        } else {
            println!("  [{:>3}] {:<16} {}", index, name, roles.join(", "));
        }
    }
}

fn cmd_point(path: &str, opts: &LoadOptions, point: usize, time: f32, attr: Option<&str>) {
    let cache = open(path, opts);
    if point >= cache.number_of_points() {
        eprintln!(
            "Point {} out of range, cache has {} points",
            point,
            cache.number_of_points()
        );
        process::exit(1);
    }

    let bracket = cache.sample_indexes_for_point_at_time(point, time);
    debug!("Bracket for point {} at {}: {:?}", point, time, bracket);

    println!("Point {} at time {}", point, time);
    match attr {
        Some(name) => match cache.attribute_index(name) {
            Some(column) => {
                let label = &cache.attribute_names()[column];
                let prefix = format!("{}.", name.to_ascii_lowercase());
                let components = cache
                    .attribute_names()
                    .iter()
                    .filter(|n| n.to_ascii_lowercase().starts_with(&prefix))
                    .count();
                match components {
                    3 => print_value(name, cache.point_vector_value_at_time(point, column, time, false, false)),
                    4 => print_value(name, cache.point_vector4_value_at_time(point, column, time)),
                    _ => print_value(label, cache.point_value_at_time(point, column, time)),
                }
            }
            None => {
                eprintln!("Unknown attribute: {}", name);
                process::exit(1);
            }
        },
        None => {
            if let Some(p) = cache.point_position_at_time(point, time) {
                println!("  position: {:?}", p);
            }
            if let Some(spawn) = cache.spawn_times().get(point) {
                println!("  spawn:    {}", spawn);
            }
            if let Some(life) = cache.point_life_at_time(point, time) {
                println!("  life:     {}", life);
            }
            if let Some(kind) = cache.point_type(point) {
                println!("  type:     {}", kind);
            }
        }
    }
}

fn print_value<T: std::fmt::Debug>(name: &str, value: Option<T>) {
    match value {
        Some(v) => println!("  {}: {:?}", name, v),
        None => println!("  {}: <no sample>", name),
    }
}

fn cmd_spawn(path: &str, opts: &LoadOptions, t0: f32, t1: f32, dt: f32) {
    let cache = open(path, opts);
    let mut state = SpawnState::default();

    let steps = ((t1 - t0) / dt).floor().max(0.0) as usize;
    let mut total = 0i64;
    for step in 0..=steps {
        let time = t0 + step as f32 * dt;
        let range = cache.point_ids_to_spawn_at_time(time, &mut state);
        if !range.is_empty() {
            println!(
                "t={:<10.4} spawn {:>6} points  [{}..={}]",
                time, range.count, range.min_id, range.max_id
            );
            total += range.count as i64;
        }
    }
    println!("Total spawned: {}", total);
}

fn cmd_export(input: &str, output: &str, opts: &LoadOptions) {
    let mut opts = opts.clone();
    opts.retain_raw_data = true;
    let cache = open(input, &opts);

    match export_raw_to_path(&cache, output) {
        Ok(bytes) => println!("Exported {} -> {} ({} bytes)", input, output, bytes),
        Err(e) => {
            eprintln!("Failed to export {}: {}", output, e);
            process::exit(1);
        }
    }
}
