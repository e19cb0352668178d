//! Reminder commands.

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use console::style;

use cartas_core::config::ConfigHandle;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{Occasion, Reminder};

use super::parse_occasion;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum RemindersAction {
    /// List reminders coming up.
    List {
        /// How many days ahead to look.
        #[arg(short, long, default_value = "30")]
        days: i64,
    },
    /// Create a reminder.
    Add {
        /// Reminder title.
        title: String,
        /// Date (YYYY-MM-DD).
        #[arg(short, long)]
        date: String,
        /// Time of day (HH:MM).
        #[arg(short, long, default_value = "09:00")]
        time: String,
        /// Repeat every year.
        #[arg(short, long)]
        yearly: bool,
        /// Related occasion id.
        #[arg(short, long, value_parser = parse_occasion)]
        occasion: Option<Occasion>,
        /// Contact id the reminder is about.
        #[arg(long)]
        contact: Option<String>,
        /// Notes shown in the notification.
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a reminder.
    Remove {
        /// Reminder id.
        id: String,
    },
    /// Notify every reminder that is due now.
    Check,
}

fn parse_date(raw: &str) -> CtResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CtError::Validation(vec!["La fecha debe tener el formato AAAA-MM-DD.".into()]))
}

pub async fn run(config: ConfigHandle, action: RemindersAction, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let reminders = registry.reminders.read().await;

    match action {
        RemindersAction::List { days } => {
            reminders.refresh().await?;
            let today = Local::now().date_naive();
            let upcoming = reminders.upcoming(today, days).await;
            match format {
                OutputFormat::Json => {
                    let json: Vec<_> = upcoming
                        .iter()
                        .map(|(date, r)| serde_json::json!({ "next": date, "reminder": r }))
                        .collect();
                    super::print_json(&json);
                }
                OutputFormat::Text => {
                    if upcoming.is_empty() {
                        println!("Nada en los próximos {days} días.");
                    } else {
                        let mut table = super::new_table(vec!["Id", "Fecha", "Hora", "Título", "Anual"]);
                        for (date, r) in &upcoming {
                            table.add_row(vec![
                                r.id.clone().unwrap_or_else(|| "-".into()),
                                date.format("%Y-%m-%d").to_string(),
                                r.time.clone(),
                                r.title.clone(),
                                if r.recurring_yearly { "sí" } else { "" }.to_string(),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        RemindersAction::Add {
            title,
            date,
            time,
            yearly,
            occasion,
            contact,
            notes,
        } => {
            let reminder = Reminder {
                id: None,
                contact_id: contact,
                title,
                occasion,
                date: parse_date(&date)?,
                time,
                recurring_yearly: yearly,
                notes,
            };
            let created = reminders.create(reminder).await?;
            match format {
                OutputFormat::Json => super::print_json(&created),
                OutputFormat::Text => println!("{} Recordatorio creado: {}", style("OK").green().bold(), created.title),
            }
        }
        RemindersAction::Remove { id } => {
            reminders.delete(&id).await?;
            println!("{} Recordatorio eliminado.", style("OK").green().bold());
        }
        RemindersAction::Check => {
            reminders.refresh().await?;
            let fired = reminders.check_due(Local::now().naive_local()).await?;
            match format {
                OutputFormat::Json => {
                    let json: Vec<_> = fired
                        .iter()
                        .map(|d| serde_json::json!({ "date": d.date, "reminder": d.reminder, "notified": d.notified }))
                        .collect();
                    super::print_json(&json);
                }
                OutputFormat::Text => {
                    if fired.is_empty() {
                        println!("No hay recordatorios pendientes.");
                    }
                    for due in &fired {
                        println!("{} {} ({})", style("!").yellow().bold(), due.reminder.title, due.reminder.time);
                    }
                }
            }
        }
    }
    Ok(())
}
