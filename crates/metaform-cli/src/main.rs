use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use metaform_cli::commands::{self, ReadArgs, WriteArgs};
use metaform_cli::CliConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn cli() -> Command {
    let schema = path_arg("schema", "Schema file (TOML)");
    let template = path_arg("template", "Template file").required(true);
    let root = Arg::new("root").long("root").help("Root object type");

    Command::new("metaform")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Template-driven metadata forms")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(path_arg("config", "Configuration file (TOML)").global(true))
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("write")
                .about("Render a JSON document as a form")
                .arg(schema.clone())
                .arg(template.clone())
                .arg(path_arg("object", "JSON document to render").required(true))
                .arg(root.clone())
                .arg(
                    Arg::new("prune")
                        .long("prune")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("no-prune")
                        .help("Leave out blocks without data"),
                )
                .arg(
                    Arg::new("no-prune")
                        .long("no-prune")
                        .action(ArgAction::SetTrue)
                        .help("Write every block, with default values"),
                ),
        )
        .subcommand(
            Command::new("read")
                .about("Apply a submitted form and print the resulting JSON document")
                .arg(schema)
                .arg(template.clone())
                .arg(path_arg("form", "Submitted form").required(true))
                .arg(path_arg("object", "Existing JSON document to update"))
                .arg(root)
                .arg(
                    Arg::new("skip-nulls")
                        .long("skip-nulls")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("clear-nulls")
                        .help("Leave properties unchanged for empty values"),
                )
                .arg(
                    Arg::new("clear-nulls")
                        .long("clear-nulls")
                        .action(ArgAction::SetTrue)
                        .help("Clear properties submitted empty"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Parse a template and report its shape")
                .arg(template),
        )
}

/// `Some(true)` / `Some(false)` when one of a flag pair is set
fn flag_pair(args: &ArgMatches, on: &str, off: &str) -> Option<bool> {
    if args.get_flag(on) {
        Some(true)
    } else if args.get_flag(off) {
        Some(false)
    } else {
        None
    }
}

fn path(args: &ArgMatches, name: &str) -> Option<PathBuf> {
    args.get_one::<PathBuf>(name).cloned()
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<String> {
    let config = CliConfig::load_or_default(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("write", args)) => commands::write(
            &config,
            &WriteArgs {
                schema: path(args, "schema"),
                template: path(args, "template").unwrap_or_default(),
                object: path(args, "object").unwrap_or_default(),
                root: args.get_one::<String>("root").cloned(),
                prune: flag_pair(args, "prune", "no-prune"),
            },
        ),
        Some(("read", args)) => commands::read(
            &config,
            &ReadArgs {
                schema: path(args, "schema"),
                template: path(args, "template").unwrap_or_default(),
                form: path(args, "form").unwrap_or_default(),
                object: path(args, "object"),
                root: args.get_one::<String>("root").cloned(),
                skip_nulls: flag_pair(args, "skip-nulls", "clear-nulls"),
            },
        ),
        Some(("check", args)) => commands::check(&config, &path(args, "template").unwrap_or_default()),
        _ => Err(anyhow::anyhow!("unknown subcommand")),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
