use anyhow::Result;
use clap::Parser;
use std::process;

use catman_actions::{Action, ActionDispatcher, ActionResponse, LogNotifier};
use catman_auth::TokenSource;
use catman_core::Config;
use catman_gmail::GmailLabelClient;

mod cli;

use cli::{Cli, Commands};

const EMPTY_LABEL: &str = "Label name is empty!";
const EMPTY_FIELDS: &str = "One of the fields is empty!";

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(code);
}

/// Returns whether the command succeeded.
async fn run() -> Result<bool> {
    let cli = Cli::parse();
    catman_core::init()?;

    let (config, _) = Config::load_validated(cli.config.as_deref())?;
    let tokens = TokenSource::from_config(&config.oauth, cli.token.clone());
    let client = GmailLabelClient::with_base_url(tokens, &config.gmail.api_base_url);
    let dispatcher = ActionDispatcher::new(client, LogNotifier);

    let Some(action) = to_action(cli.command) else {
        return list_labels(&dispatcher, cli.json).await;
    };

    let rejected = matches!(action, Action::NotifyError { .. });
    tracing::info!("Dispatching {}", action.name());
    let response = dispatcher.dispatch(action).await;
    print_response(&response, cli.json)?;

    Ok(response.success && !rejected)
}

/// Map a subcommand to its action, rejecting empty fields up front.
///
/// `labels` is served directly by the client and has no action.
fn to_action(command: Commands) -> Option<Action> {
    let notify = |message: &str| Action::NotifyError {
        message: Some(message.to_string()),
    };

    let action = match command {
        Commands::Create { name } if name.trim().is_empty() => notify(EMPTY_LABEL),
        Commands::Create { name } => Action::CreateLabel { label_name: name },
        Commands::Delete { name } if name.trim().is_empty() => notify(EMPTY_LABEL),
        Commands::Delete { name } => Action::DeleteLabel { label_name: name },
        Commands::Apply { senders, label }
            if senders.trim().is_empty() || label.trim().is_empty() =>
        {
            notify(EMPTY_FIELDS)
        }
        Commands::Apply { senders, label } => Action::CreateEmailRule {
            sender_email: senders,
            label_name: label,
        },
        Commands::Labels => return None,
    };
    Some(action)
}

async fn list_labels(
    dispatcher: &ActionDispatcher<TokenSource, LogNotifier>,
    json: bool,
) -> Result<bool> {
    match dispatcher.client().list_labels().await {
        Ok(labels) if json => {
            println!("{}", serde_json::to_string_pretty(&labels)?);
            Ok(true)
        }
        Ok(labels) => {
            for label in labels {
                println!("{}\t{}", label.id, label.name);
            }
            Ok(true)
        }
        Err(e) => {
            tracing::error!("Failed to list labels: {}", e);
            if json {
                println!("{}", serde_json::to_string_pretty(&ActionResponse::failed(e.to_string()))?);
            } else {
                eprintln!("{}", e.user_message());
            }
            Ok(false)
        }
    }
}

fn print_response(response: &ActionResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else if let Some(result) = &response.result {
        println!("{}", result);
    } else if let Some(error) = &response.error {
        eprintln!("{}", error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_become_notify_error() {
        assert_eq!(
            to_action(Commands::Create { name: " ".into() }),
            Some(Action::NotifyError {
                message: Some(EMPTY_LABEL.into())
            })
        );
        assert_eq!(
            to_action(Commands::Apply {
                senders: "a@x.com".into(),
                label: String::new(),
            }),
            Some(Action::NotifyError {
                message: Some(EMPTY_FIELDS.into())
            })
        );
    }

    #[test]
    fn test_commands_map_to_actions() {
        assert_eq!(
            to_action(Commands::Delete { name: "Work".into() }),
            Some(Action::DeleteLabel {
                label_name: "Work".into()
            })
        );
        assert_eq!(
            to_action(Commands::Apply {
                senders: "a@x.com".into(),
                label: "Work".into(),
            }),
            Some(Action::CreateEmailRule {
                sender_email: "a@x.com".into(),
                label_name: "Work".into(),
            })
        );
        assert_eq!(to_action(Commands::Labels), None);
    }
}
