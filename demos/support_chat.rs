//! Interactive support chat on the terminal
//!
//! Configuration comes from the environment (AI_PROVIDER, GROQ_API_KEY,
//! EMAIL_PROVIDER, ...). Without keys the bot still runs and offers tickets.
//!
//! Commands: `/quick <network|software|device|other>`, `/tickets`, `/quit`.

use smart_escalate::{BotConfig, QuickAction, SupportBot, UserProfile, WELCOME_MESSAGE};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smart_escalate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = BotConfig::from_env()?;
    println!(
        "Using {} for replies and {} for ticket e-mail",
        config.provider, config.email.provider
    );

    let bot = SupportBot::from_config(&config)?;
    let user = match (std::env::var("CHAT_USER_NAME"), std::env::var("CHAT_USER_EMAIL")) {
        (Ok(name), Ok(email)) => UserProfile::new(name, email),
        _ => UserProfile::guest(),
    };
    let session_id = bot.create_session(user).await?;

    println!("\nBot: {}\n", WELCOME_MESSAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit", _) => break,
            ("/tickets", _) => {
                for ticket in bot.tickets(&session_id).await? {
                    println!(
                        "{}  {:<8} {:<12} {} (e-mail sent: {})",
                        ticket.ticket_number,
                        ticket.priority.as_str(),
                        ticket.status.label(),
                        ticket.company,
                        ticket.email_sent
                    );
                }
                continue;
            }
            ("/quick", action) => match action.parse::<QuickAction>() {
                Ok(action) => bot.handle_quick_action(session_id, action).await,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            },
            _ => bot.send_message(session_id, line).await,
        };

        match response {
            Ok(response) => println!("\nBot: {}\n", response.message),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    bot.end_session(&session_id).await?;
    Ok(())
}
