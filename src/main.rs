//! agent-chat - terminal client for the streaming assistant API
//!
//! Reads lines from stdin, streams answers to stdout and logs to stderr.

use agent_chat::config::ClientConfig;
use agent_chat::conversation::{ConvState, ConversationMachine, Update};
use agent_chat::feedback::FeedbackRequest;
use agent_chat::transport::HttpClient;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Machine = ConversationMachine<Arc<HttpClient>, Arc<HttpClient>>;

const HELP: &str = "Commands: /confirm /cancel /stop /clear /feedback <text> /quit (Ctrl-C interrupts a request, or quits at the prompt)";

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Message(&'a str),
    Confirm,
    Cancel,
    Stop,
    Clear,
    Feedback(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Message(line);
        };
        let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        match name {
            "confirm" => Command::Confirm,
            "cancel" => Command::Cancel,
            "stop" => Command::Stop,
            "clear" => Command::Clear,
            "feedback" => Command::Feedback(arg.trim()),
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown(name),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_chat=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    let client = Arc::new(HttpClient::new(&config)?);
    tracing::info!(api_base = %client.base_url(), "Client initialized");

    let mut machine = ConversationMachine::new(client.clone(), client.clone(), &config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Chatting with {}. {HELP}", client.base_url());
    loop {
        prompt()?;
        let Some(line) = or_interrupt(lines.next_line()).await.transpose()?.flatten() else {
            println!();
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Message("") => {}
            Command::Message(text) => match or_interrupt(machine.submit(text)).await {
                Some(Ok(())) => stream_answer(&mut machine).await?,
                Some(Err(e)) => println!("! {e}"),
                None => println!("[stopped]"),
            },
            Command::Confirm => match or_interrupt(machine.confirm()).await {
                Some(Ok(())) => print_last(&machine),
                Some(Err(e)) => println!("! {e}"),
                None => println!("[interrupted] The proposal is still pending."),
            },
            Command::Cancel => match machine.cancel_proposal() {
                Ok(()) => print_last(&machine),
                Err(e) => println!("! {e}"),
            },
            Command::Stop => machine.stop(),
            Command::Clear => {
                machine.clear();
                println!("Conversation cleared.");
            }
            Command::Feedback(text) => {
                let request = FeedbackRequest::new(text);
                match or_interrupt(client.submit_feedback(&request)).await {
                    Some(Ok(response)) => println!("{}", response.message),
                    Some(Err(e)) => println!("! {e}"),
                    None => println!("[interrupted]"),
                }
            }
            Command::Unknown(name) => println!("Unknown command /{name}. {HELP}"),
        }
    }

    machine.stop();
    Ok(())
}

/// Run `work` unless Ctrl-C arrives first; `None` when interrupted.
///
/// Once a Ctrl-C listener exists the signal no longer ends the process, so
/// every await that waits on the user or the network goes through here.
async fn or_interrupt<F: Future>(work: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => None,
        output = work => Some(output),
    }
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

/// Render frames as they are applied until the stream closes or Ctrl-C
async fn stream_answer(machine: &mut Machine) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    if machine.is_awaiting_first_text() {
        write!(stdout, "assistant: ")?;
        stdout.flush()?;
    }

    loop {
        let Some(update) = or_interrupt(machine.next_update()).await else {
            machine.stop();
            writeln!(stdout, " [stopped]")?;
            return Ok(());
        };
        match update {
            Some(Update::Text { delta }) => {
                write!(stdout, "{delta}")?;
                stdout.flush()?;
            }
            Some(Update::ToolProposal) => {
                writeln!(stdout)?;
                print_proposal(machine);
                return Ok(());
            }
            Some(Update::Guardrail | Update::Error | Update::Failed) => {
                writeln!(stdout)?;
                print_last(machine);
                return Ok(());
            }
            Some(Update::Ended) | None => {
                writeln!(stdout)?;
                return Ok(());
            }
        }
    }
}

fn print_last(machine: &Machine) {
    let Some(message) = machine.log().last() else {
        return;
    };
    let prefix = if *machine.state() == ConvState::Guardrail {
        "notice"
    } else {
        message.role.as_str()
    };
    println!("{prefix}: {}", message.content);
}

fn print_proposal(machine: &Machine) {
    let Some(proposal) = machine.tool_proposal() else {
        return;
    };
    match proposal.meeting_args() {
        Some(args) => println!("Proposed meeting: {}", args.summary()),
        None => println!("Proposed action {}: {}", proposal.name, proposal.args),
    }
    println!("Type /confirm to proceed or /cancel to dismiss.");
}
