use chrono::Utc;

use visadesk::core::record::ServiceStatus;
use visadesk::core::summary::StatusSummary;
use visadesk::store::auth;
use visadesk::store::firestore::StoreClient;
use visadesk::store::keyring;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Report,
    SetToken(String),
    ClearToken,
}

fn parse_command(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    match args.next().as_deref() {
        None => Ok(Command::Report),
        Some("set-token") => match args.next() {
            Some(token) if !token.trim().is_empty() => {
                Ok(Command::SetToken(token.trim().to_string()))
            }
            _ => Err("set-token needs the sign-in token as its argument".to_string()),
        },
        Some("clear-token") => Ok(Command::ClearToken),
        Some(other) => Err(format!(
            "Unknown command \"{}\" (expected set-token <token> or clear-token)",
            other
        )),
    }
}

#[tokio::main]
async fn main() {
    systemd_journal_logger::JournalLog::new()
        .unwrap()
        .with_syslog_identifier("visadesk-store-check".to_string())
        .install()
        .unwrap();
    log::set_max_level(log::LevelFilter::Info);

    // Load config
    let cosmic_cfg = cosmic::cosmic_config::Config::new("dev.visadesk.app", visadesk::config::CONFIG_VERSION)
        .expect("Failed to load config");
    let config = <visadesk::config::AppConfig as cosmic::cosmic_config::CosmicConfigEntry>::get_entry(&cosmic_cfg)
        .unwrap_or_else(|(_, cfg)| cfg);

    let command = match parse_command(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    match command {
        Command::SetToken(token) => {
            if config.project_id.is_empty() {
                println!("No project configured. Set VISADESK_PROJECT_ID first.");
                return;
            }
            match keyring::store_auth_token(&config.project_id, &token).await {
                Ok(()) => println!("Sign-in token stored for project {}.", config.project_id),
                Err(e) => println!("Failed to store token: {}", e),
            }
            return;
        }
        Command::ClearToken => {
            if config.project_id.is_empty() {
                println!("No project configured. Set VISADESK_PROJECT_ID first.");
                return;
            }
            match keyring::delete_auth_token(&config.project_id).await {
                Ok(()) => println!("Sign-in token cleared for project {}.", config.project_id),
                Err(e) => println!("Failed to clear token: {}", e),
            }
            return;
        }
        Command::Report => {}
    }

    println!("=== Service Store Check ===\n");

    if !config.store_ready() {
        println!("Store not configured. Set VISADESK_PROJECT_ID and VISADESK_API_KEY.");
        return;
    }

    println!("Project:    {}", config.project_id);
    println!("Collection: {}\n", config.collection_path());

    let session = match auth::ensure_identity(&config).await {
        Ok(session) => session,
        Err(e) => {
            println!("Sign-in failed: {}", e);
            return;
        }
    };
    println!("Signed in as {}\n", session.uid);

    let client = match StoreClient::new(&config, &session) {
        Ok(c) => c,
        Err(e) => {
            println!("Client error: {}", e);
            return;
        }
    };

    let records = match client.list_services().await {
        Ok(records) => records,
        Err(e) => {
            println!("Error listing services: {}", e);
            return;
        }
    };

    println!("--- {} records ---", records.len());

    let summary = StatusSummary::from_records(&records);
    for status in ServiceStatus::ALL {
        println!("  {:<10} {}", status.label(), summary.count(*status));
    }

    let unknown = records.len() - summary.total();
    if unknown > 0 {
        println!("  {:<10} {} (foreign status values)", "Unknown", unknown);
    }

    let now = Utc::now();
    let overdue: Vec<_> = records.iter().filter(|r| r.is_overdue(now)).collect();
    if overdue.is_empty() {
        println!("\nNothing overdue.");
    } else {
        println!("\nOVERDUE ({}):", overdue.len());
        for record in &overdue {
            let age = record
                .timestamp
                .map(|ts| format!("{}d", (now - ts).num_days()))
                .unwrap_or_else(|| "?".to_string());
            println!("  [{}] {} — {} ({})", record.status, record.title, record.description, age);
        }
    }

    println!("\n=== Done ===");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_command(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_runs_the_report() {
        assert_eq!(parse(&[]), Ok(Command::Report));
    }

    #[test]
    fn set_token_takes_the_token_argument() {
        assert_eq!(
            parse(&["set-token", "  tok-1  "]),
            Ok(Command::SetToken("tok-1".to_string()))
        );
    }

    #[test]
    fn set_token_without_a_token_is_rejected() {
        assert!(parse(&["set-token"]).is_err());
        assert!(parse(&["set-token", "   "]).is_err());
    }

    #[test]
    fn clear_token_parses() {
        assert_eq!(parse(&["clear-token"]), Ok(Command::ClearToken));
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert!(parse(&["frobnicate"]).is_err());
    }
}
