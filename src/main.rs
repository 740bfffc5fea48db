use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use crisp::build::build_project;
use crisp::serve::{serve, DEFAULT_PORT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let root_arg = Arg::with_name("root")
        .long("root")
        .short("r")
        .takes_value(true)
        .default_value(".")
        .help("The project directory containing config.yml, posts/ and templates/");

    let matches = App::new("crisp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static blog from a directory of Markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders the index, post and tag pages")
                .arg(root_arg.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .help("The output directory [default: {root}/output]"),
                ),
        )
        .subcommand(
            SubCommand::with_name("serve")
                .about("Serves the output directory over HTTP")
                .arg(root_arg)
                .arg(
                    Arg::with_name("port")
                        .long("port")
                        .short("p")
                        .takes_value(true)
                        .help("The port to listen on [default: 3000]"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(matches)) => run_build(matches),
        ("serve", Some(matches)) => run_serve(matches),
        _ => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn root(matches: &ArgMatches) -> PathBuf {
    PathBuf::from(matches.value_of("root").unwrap_or("."))
}

fn run_build(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let root = root(matches);
    let output = matches.value_of("output").map(Path::new);
    let summary = build_project(&root, output)?;
    tracing::info!(
        posts = summary.posts,
        stamped = summary.stamped,
        tags = summary.tags,
        pages = summary.pages,
        "build finished"
    );
    Ok(())
}

fn run_serve(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let root = root(matches);
    let port = match matches.value_of("port") {
        Some(port) => port
            .parse::<u16>()
            .map_err(|e| format!("invalid port `{}`: {}", port, e))?,
        None => DEFAULT_PORT,
    };
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    serve(&root.join("output"), addr)?;
    Ok(())
}
