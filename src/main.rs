use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use pagewright::build::{build_site, write_manifest};
use pagewright::config::Config;
use std::error::Error;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("pagewright")
        .version(crate_version!())
        .about("Plans the pages of a static blog from a directory of markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Log progress (overrides RUST_LOG)"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Plans the site and writes its manifest")
                .arg(project_arg())
                .arg(threads_arg())
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("FILE")
                        .help("Where to write the manifest [default: <project>/public/pages.yaml]"),
                ),
        )
        .subcommand(
            SubCommand::with_name("plan")
                .about("Plans the site and prints its manifest to stdout")
                .arg(project_arg())
                .arg(threads_arg()),
        )
        .get_matches();

    // `-v` may come before or after the subcommand.
    let verbose = matches.is_present("verbose")
        || matches
            .subcommand()
            .1
            .map_or(false, |m| m.is_present("verbose"));
    let filter = match verbose {
        true => EnvFilter::new("info"),
        false => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match matches.subcommand() {
        ("build", Some(matches)) => build(matches),
        ("plan", Some(matches)) => plan(matches),
        _ => unreachable!("clap requires a subcommand"),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn project_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("project")
        .short("p")
        .long("project")
        .takes_value(true)
        .value_name("DIR")
        .help("A directory inside the project [default: the current directory]")
}

fn threads_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("threads")
        .short("t")
        .long("threads")
        .takes_value(true)
        .value_name("N")
        .help("Threads used to load documents [default: the number of CPUs]")
}

fn load_config(matches: &ArgMatches, output: Option<&Path>) -> Result<Config, Box<dyn Error>> {
    // Absolute, so the project file search can walk all the way up.
    let cwd = std::env::current_dir()?;
    let project = match matches.value_of("project") {
        Some(project) => cwd.join(project),
        None => cwd,
    };
    let threads = match matches.value_of("threads") {
        Some(threads) => Some(
            threads
                .parse::<usize>()
                .map_err(|e| format!("invalid --threads `{}`: {}", threads, e))?,
        ),
        None => None,
    };
    Ok(Config::from_directory(&project, output, threads)?)
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = load_config(matches, matches.value_of("output").map(Path::new))?;
    let summary = build_site(&config)?;
    if summary.documents == 0 {
        eprintln!(
            "No documents found in `{}`; wrote an empty manifest.",
            config.content_directory.display()
        );
    }
    println!(
        "Planned {} post pages and {} category pages into `{}`",
        summary.post_pages,
        summary.category_pages,
        summary.output_file.display()
    );
    Ok(())
}

fn plan(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let config = load_config(matches, None)?;
    let stdout = std::io::stdout();
    write_manifest(&config, stdout.lock())?;
    Ok(())
}
