//! `printmon console` — line-oriented operator panel.

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};
use tokio::io::{AsyncBufReadExt, BufReader};

use printmon_core::{Endpoint, FormField, PrintParams};

use crate::app::App;
use crate::GlobalArgs;

const HELP: &[&str] = &[
    "Commands:",
    "  start                  launch the print server",
    "  stop                   stop the print server",
    "  status                 show whether the server is running",
    "  print                  send a test print to /imprimir",
    "  qrcode                 send a test print to /imprimir/qrcode",
    "  set <field> <value>    edit a form field (header, footer, code, services, created_date, qrcode)",
    "  show                   show the form",
    "  help                   this list",
    "  quit                   stop the server and exit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Start,
    Stop,
    Status,
    Test(Endpoint),
    Set { field: FormField, value: String },
    Show,
    Help,
    Quit,
    Empty,
}

impl ConsoleCommand {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" => ConsoleCommand::Empty,
            "start" => ConsoleCommand::Start,
            "stop" => ConsoleCommand::Stop,
            "status" => ConsoleCommand::Status,
            "print" => ConsoleCommand::Test(Endpoint::Print),
            "qrcode" | "qr" => ConsoleCommand::Test(Endpoint::QrCode),
            "show" => ConsoleCommand::Show,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            "set" => {
                let (field, value) = match rest.split_once(char::is_whitespace) {
                    Some((field, value)) => (field, value.trim()),
                    None => (rest, ""),
                };
                if field.is_empty() {
                    return Err("usage: set <field> <value>".to_string());
                }
                ConsoleCommand::Set {
                    field: field.parse()?,
                    value: value.to_string(),
                }
            }
            other => return Err(format!("unknown command '{other}'; type 'help'")),
        };
        Ok(command)
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn form_table(form: &PrintParams) -> String {
    let rows: Vec<FieldRow> = FormField::ALL
        .into_iter()
        .map(|field| FieldRow {
            field: field.key(),
            value: form.get(field).to_string(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn run(global: &GlobalArgs) -> Result<()> {
    let mut app = App::from_args(global)?;
    let runtime = super::runtime()?;
    runtime.block_on(async move {
        let relay = app.spawn_relay();
        app.banner();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "stdin read failed");
                    break;
                }
            };

            match ConsoleCommand::parse(&line) {
                Ok(ConsoleCommand::Quit) => break,
                Ok(command) => dispatch(&mut app, command).await,
                Err(message) => app.sink().error(&message),
            }
        }

        match relay.shutdown().await {
            Ok(stats) => tracing::debug!(lines = stats.lines, "relay joined"),
            Err(err) => tracing::warn!(error = %err, "relay did not shut down cleanly"),
        }
        app.shutdown().await;
    });
    // A pending stdin read holds a blocking thread until the next newline.
    runtime.shutdown_background();
    Ok(())
}

async fn dispatch(app: &mut App, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Start => {
            app.handle_start().await;
        }
        ConsoleCommand::Stop => app.handle_stop().await,
        ConsoleCommand::Status => app.handle_status(),
        ConsoleCommand::Test(endpoint) => {
            app.handle_test(endpoint).await;
        }
        ConsoleCommand::Set { field, value } => app.set_field(field, &value),
        ConsoleCommand::Show => {
            for line in form_table(app.form()).lines() {
                app.sink().info(line);
            }
        }
        ConsoleCommand::Help => {
            for line in HELP {
                app.sink().info(line);
            }
        }
        ConsoleCommand::Quit | ConsoleCommand::Empty => {}
    }
}
