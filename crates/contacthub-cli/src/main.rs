use std::path::PathBuf;

use clap::{Parser, Subcommand};
use contacthub_cli::{check_policy, describe_token, issue_token, load_service};
use contacthub_core::hash_password;
use dialoguer::{Input, Password};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "contacthub-cli")]
#[command(about = "ContactHub CLI - credential and policy tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password for BOOTSTRAP_ADMIN_PASSWORD_HASH
    HashPassword {
        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Issue an access/refresh pair using the configured secrets
    IssueToken {
        /// Subject id (random UUID if omitted)
        #[arg(short = 's', long)]
        subject: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Role name, must exist in the role policy
        #[arg(short = 'r', long)]
        role: Option<String>,
    },
    /// Validate a role policy JSON file
    CheckPolicy {
        path: PathBuf,
    },
    /// Decode a token without verifying it
    InspectToken {
        token: String,
    },
}

fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::HashPassword { password } => handle_hash_password(password),
        Commands::IssueToken {
            subject,
            email,
            role,
        } => handle_issue_token(subject, email, role),
        Commands::CheckPolicy { path } => handle_check_policy(path),
        Commands::InspectToken { token } => describe_token(&token).map(|text| println!("{text}")),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {e:#}");
        std::process::exit(1);
    }
}

fn handle_hash_password(password: Option<String>) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("{hash}");
    Ok(())
}

fn handle_issue_token(
    subject: Option<String>,
    email: Option<String>,
    role: Option<String>,
) -> anyhow::Result<()> {
    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };
    let role = match role {
        Some(r) => r,
        None => Input::new().with_prompt("Role").interact_text()?,
    };

    let service = load_service()?;
    let pair = issue_token(&service, subject.as_deref(), &email, &role)?;

    println!("\n✅ Credentials issued");
    println!("{}", serde_json::to_string_pretty(&pair)?);
    Ok(())
}

fn handle_check_policy(path: PathBuf) -> anyhow::Result<()> {
    let lines = check_policy(&path)?;
    println!("✅ {} is valid ({} roles)", path.display(), lines.len());
    for line in lines {
        println!("   {line}");
    }
    Ok(())
}
