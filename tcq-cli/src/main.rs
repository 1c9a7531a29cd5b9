//! tcq entry point.

use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use tcq_cli::args::Cli;
use tcq_cli::config::TcqConfig;
use tcq_cli::error::CliError;
use tcq_cli::render;
use tcq_cli::repl::{Command, HELP};
use tcq_cli::session::{Screen, SearchSession};
use tcq_cli::telemetry::init_tracing;
use tcq_client::{OwnersApi, OwnersEndpoint, RestClient, SearchEngine, Transport};
use tcq_core::{Owner, SearchItem, SearchResult, ValidationError};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    cli.validate()?;
    let config = TcqConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    let client: Arc<dyn Transport> = Arc::new(RestClient::new(&config.credentials())?);
    if cli.owners {
        let owners = OwnersApi::new(client).list().await?;
        return print_owners(&owners, cli.json);
    }

    let engine = SearchEngine::from_transport(client);
    let mut session = SearchSession::new(engine);

    if let Some(item) = cli.details {
        let item = session.open(item, cli.associations).await?;
        return print_item(&item, cli.json);
    }

    match cli.query.as_deref() {
        Some(query) => {
            let request = cli.to_request(query, &config.search)?;
            let result = session.search(request).await?;
            print_result(result, cli.json)?;
        }
        None if !cli.interactive => {
            return Err(ValidationError::invalid(
                "query",
                "provide a query, --details <kind>:<id>, --owners or --interactive",
            )
            .into());
        }
        None => {}
    }

    if cli.interactive {
        interactive(&cli, &config, &mut session).await?;
    }
    Ok(())
}

async fn interactive(
    cli: &Cli,
    config: &TcqConfig,
    session: &mut SearchSession,
) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        print!("tcq> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{}", err);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(err) = dispatch(command, cli, config, session).await {
            tracing::error!(error = %err, "Command failed");
            eprintln!("error: {}", err);
        }
    }
    Ok(())
}

async fn dispatch(
    command: Command,
    cli: &Cli,
    config: &TcqConfig,
    session: &mut SearchSession,
) -> Result<(), CliError> {
    match command {
        Command::Search(query) => {
            let request = cli.to_first_page_request(&query, &config.search)?;
            print_result(session.search(request).await?, cli.json)?;
        }
        Command::NextPage => match session.next_page().await? {
            Some(result) => print_result(result, cli.json)?,
            None => println!("Already on the last page."),
        },
        Command::PreviousPage => match session.previous_page().await? {
            Some(result) => print_result(result, cli.json)?,
            None => println!("Already on the first page."),
        },
        Command::GotoPage(page) => match session.goto_page(page).await? {
            Some(result) => print_result(result, cli.json)?,
            None => println!("No such page."),
        },
        Command::Open(item) => {
            let item = session.open(item, cli.associations).await?;
            print_item(&item, cli.json)?;
        }
        Command::Back => match session.back().await? {
            Some(screen) => print_screen(&screen, cli.json)?,
            None => println!("Nothing to go back to."),
        },
        Command::Forward => match session.forward().await? {
            Some(screen) => print_screen(&screen, cli.json)?,
            None => println!("Nothing to go forward to."),
        },
        Command::History => {
            for (index, entry) in session.search_history().entries().enumerate() {
                println!(
                    "{:>3}. [{}] {} ({} results, {})",
                    index + 1,
                    entry.kind,
                    entry.query,
                    entry.result_count,
                    entry.searched_at.format("%H:%M:%S")
                );
            }
        }
        Command::RecallPrevious => match session.search_history_mut().previous() {
            Some(entry) => println!("search {}", entry.query),
            None => println!("No earlier search."),
        },
        Command::RecallNext => match session.search_history_mut().next() {
            Some(entry) => println!("search {}", entry.query),
            None => println!("No later search."),
        },
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

fn print_result(result: &SearchResult, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", render::result_json(result)?);
    } else {
        for line in render::result_lines(result) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn print_item(item: &SearchItem, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", render::item_json(item)?);
    } else {
        for line in render::detail_lines(item) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn print_owners(owners: &[Owner], json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", render::owners_json(owners)?);
    } else {
        for line in render::owner_lines(owners) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn print_screen(screen: &Screen, json: bool) -> Result<(), CliError> {
    match screen {
        Screen::Results(result) => print_result(result, json),
        Screen::Details(item) => print_item(item, json),
    }
}
