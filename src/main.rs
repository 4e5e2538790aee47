use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info};

use colombo_auth::auth::guard::{GuardPolarity, RecordingNavigator};
use colombo_auth::auth::store::{FileStorage, MemoryStorage, TokenStorage};
use colombo_auth::auth::user_interface::{run_login, run_registration, FlowOutcome};
use colombo_auth::client::HttpGateway;
use colombo_auth::security::KeyringStorage;
use colombo_auth::utils::logging::initialize_logging;
use colombo_auth::{sign_out, AppConfig, RouteGuard, SessionOracle, TokenStore};

const DEFAULT_TOKEN_FILE: &str = "colombo-session.json";

fn build_cli() -> Command {
    Command::new("colombo-auth")
        .about("Sign in, register, and check sessions against the Colombo Mail API")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log output (-v info, -vv debug, -vvv trace)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .help("Append logs to a file instead of stderr"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .value_name("URL")
                .env("COLOMBO_API_URL")
                .global(true)
                .help("Base URL of the API"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .value_parser(["keyring", "file", "memory"])
                .default_value("keyring")
                .global(true)
                .help("Where the session token is kept"),
        )
        .arg(
            Arg::new("token-file")
                .long("token-file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true)
                .help("Token file used with --store file"),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with email and password")
                .arg(Arg::new("email").long("email").help("Account email"))
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("LOCATION")
                        .help("Login page location, e.g. /login?redirect=%2Forders"),
                ),
        )
        .subcommand(Command::new("logout").about("Remove the stored session"))
        .subcommand(Command::new("status").about("Show whether a session is present"))
        .subcommand(Command::new("register").about("Create an account with a verified email"))
        .subcommand(
            Command::new("guard")
                .about("Evaluate a route guard for a location")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .help("Location of the guarded page"),
                )
                .arg(
                    Arg::new("public")
                        .long("public")
                        .action(ArgAction::SetTrue)
                        .help("Guard a visitor-only page instead of a protected one"),
                )
                .arg(
                    Arg::new("redirect-to")
                        .long("redirect-to")
                        .value_name("TARGET")
                        .help("Override the redirect target"),
                ),
        )
}

/// Builds the token store selected on the command line
fn open_store(matches: &ArgMatches, config: &AppConfig) -> TokenStore {
    let backend = matches
        .get_one::<String>("store")
        .map(String::as_str)
        .unwrap_or("keyring");

    let storage: Arc<dyn TokenStorage> = match backend {
        "file" => {
            let path = matches
                .get_one::<PathBuf>("token-file")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_FILE));
            debug!("Using file token storage at {}", path.display());
            Arc::new(FileStorage::new(path))
        }
        "memory" => Arc::new(MemoryStorage::new()),
        _ => Arc::new(KeyringStorage::new()),
    };

    TokenStore::with_slot(storage, config.token_slot.clone())
}

fn report_outcome(outcome: FlowOutcome) {
    match outcome {
        FlowOutcome::Navigate(next) => println!("Next: {}", next.path),
        FlowOutcome::Cancelled => println!("Cancelled."),
        FlowOutcome::Failed => println!("Giving up for now."),
    }
}

fn run_guard(matches: &ArgMatches, oracle: &SessionOracle, config: &AppConfig) {
    let location = matches
        .get_one::<String>("path")
        .cloned()
        .unwrap_or_else(|| "/".to_string());

    let mut guard = if matches.get_flag("public") {
        RouteGuard::public(location).with_redirect(config.landing_path.clone())
    } else {
        RouteGuard::protected(location).with_redirect(config.login_path.clone())
    };
    if let Some(target) = matches.get_one::<String>("redirect-to") {
        guard = guard.with_redirect(target.clone());
    }

    println!("Before check: {:?}", guard.view());
    let mut navigator = RecordingNavigator::default();
    let view = guard.guard(oracle, &mut navigator);

    let polarity = match guard.polarity() {
        GuardPolarity::Protected => "protected",
        GuardPolarity::Public => "public",
    };
    println!("Guard ({}) for {}: {:?}", polarity, guard.location(), guard.state());
    println!("View: {:?}", view);
    for path in navigator.visited {
        println!("Navigate to: {}", path);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let matches = build_cli().get_matches();

    initialize_logging(
        matches.get_count("verbose"),
        matches.get_one::<PathBuf>("log-file").map(PathBuf::as_path),
    )?;

    let config = AppConfig::load()
        .with_api_base_url(matches.get_one::<String>("api-url").map(String::as_str));
    let store = open_store(&matches, &config);
    let oracle = SessionOracle::new(store.clone());
    info!("Using token slot {}", store.slot());

    match matches.subcommand() {
        Some(("login", sub)) => {
            let gateway = HttpGateway::new(config.clone())?;
            let location = sub
                .get_one::<String>("from")
                .cloned()
                .unwrap_or_else(|| config.login_path.clone());
            let email = sub.get_one::<String>("email").cloned();
            let outcome =
                run_login(&gateway, &store, email, &location, &config.landing_path).await?;
            report_outcome(outcome);
        }
        Some(("logout", _)) => {
            let next = sign_out(&store);
            println!("Signed out. Next: {}", next.path);
        }
        Some(("status", _)) => {
            if oracle.is_authenticated() {
                println!("Signed in.");
            } else {
                println!("Not signed in.");
            }
        }
        Some(("register", _)) => {
            if oracle.is_authenticated() {
                println!("Already signed in. Run `colombo-auth logout` first.");
                return Ok(());
            }
            let gateway = HttpGateway::new(config.clone())?;
            let outcome = run_registration(&gateway, &store, &config.landing_path).await?;
            report_outcome(outcome);
        }
        Some(("guard", sub)) => run_guard(sub, &oracle, &config),
        _ => {
            build_cli().print_help()?;
        }
    }

    Ok(())
}
