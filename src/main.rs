use std::{io::BufRead, process::ExitCode};

use clap::{Parser, Subcommand};
use common::settings::get_settings;
use db_adapters::user_adapter::{UserAdapter, UserQuery};
use use_cases::{
    users::{
        activate::activate_user,
        activation_email::activation_link,
        register::register_user,
        resend_activation::resend_activation_email,
        types::{ActivationRequest, RegisterRequest},
    },
    UseCaseError,
};

mod startup;
mod telemetry;

#[derive(Debug, Parser)]
#[command(name = "activation-backend", about = "Register and activate user accounts.")]
struct Cli {
    /// Env file to read settings from.
    #[arg(long, default_value = ".env")]
    env_file: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account and mail its activation link. The password is read from stdin.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Mail a fresh activation link to an inactive account.
    ResendActivation {
        #[arg(long)]
        email: String,
    },
    /// Activate an account with the uid and token from its activation link.
    Activate { uid: String, token: String },
    /// Print the activation link of an account without mailing it.
    IssueLink {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match get_settings(&cli.env_file) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error on getting settings: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = match telemetry::init_subscriber(settings.debug, settings.application.max_log_files)
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let app = match startup::Application::build(settings).await {
        Ok(app) => app,
        Err(e) => {
            tracing::event!(target: "backend", tracing::Level::ERROR, "{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &app).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::event!(target: "backend", tracing::Level::ERROR, "Command failed: {:?}", e);
            eprintln!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, app: &startup::Application) -> Result<String, UseCaseError> {
    match command {
        Command::Register {
            email,
            first_name,
            last_name,
        } => {
            let password = read_password(std::io::stdin().lock())?;
            let user = register_user(
                RegisterRequest {
                    email,
                    password,
                    first_name,
                    last_name,
                },
                &app.settings,
                &app.tokens,
                app.mailer.as_ref(),
                UserAdapter::init(&app.db),
            )
            .await?;
            to_json(&user)
        }
        Command::ResendActivation { email } => {
            resend_activation_email(
                email,
                &app.settings,
                &app.tokens,
                app.mailer.as_ref(),
                UserAdapter::init(&app.db),
            )
            .await?;
            Ok("Activation link has been sent to your email address.".to_string())
        }
        Command::Activate { uid, token } => {
            let user = activate_user(
                &app.db,
                app.tokens.clone(),
                app.bus.clone(),
                ActivationRequest::new(uid, token),
            )
            .await?;
            to_json(&user)
        }
        Command::IssueLink { email } => {
            let user = UserAdapter::init(&app.db)
                .get_by_email(email)
                .await
                .map_err(|e| UseCaseError::InternalServerError(format!("{:?}", e)))?
                .ok_or_else(|| UseCaseError::NotFound("User not found.".to_string()))?;
            activation_link(&app.settings, &app.tokens, &user)
        }
    }
}

/// First line of `input`, without its line ending.
fn read_password(mut input: impl BufRead) -> Result<String, UseCaseError> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| UseCaseError::InternalServerError(format!("{:?}", e)))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn to_json(value: &impl serde::Serialize) -> Result<String, UseCaseError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| UseCaseError::InternalServerError(format!("{:?}", e)))
}

fn describe(e: &UseCaseError) -> &str {
    match e {
        UseCaseError::BadRequest(message)
        | UseCaseError::NotFound(message)
        | UseCaseError::Conflict(message) => message,
        UseCaseError::InternalServerError(_) => "Internal server error.",
    }
}
