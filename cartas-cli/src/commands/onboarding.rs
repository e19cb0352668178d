//! Onboarding tour commands.

use clap::Subcommand;
use console::style;

use cartas_core::config::ConfigHandle;
use cartas_core::error::CtResult;
use cartas_services::onboarding::{TourProgress, TOURS};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum OnboardingAction {
    /// Show tours and which ones are done.
    Status,
    /// Start a tour (generator, contacts, reminders).
    Start {
        /// Tour id.
        tour: String,
        /// Restart even if already completed.
        #[arg(long)]
        force: bool,
    },
    /// Go to the next step of the active tour.
    Next,
    /// Dismiss the active tour.
    Skip,
    /// Forget completed tours.
    Reset,
}

fn print_step(progress: &TourProgress, format: OutputFormat) {
    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "tour": progress.tour.id,
            "step": progress.step,
            "steps": progress.tour.steps.len(),
            "text": progress.text(),
        })),
        OutputFormat::Text => {
            println!(
                "{} {}",
                style(format!("[{}/{}]", progress.step + 1, progress.tour.steps.len())).bold().dim(),
                progress.text()
            );
            if progress.is_last() {
                println!("  {}", style("Último paso: `cartas onboarding next` para terminar.").dim());
            }
        }
    }
}

pub async fn run(config: ConfigHandle, action: OnboardingAction, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let onboarding = registry.onboarding.read().await;

    match action {
        OnboardingAction::Status => {
            let done = onboarding.completed_tours()?;
            let active = onboarding.active()?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "completed": done,
                    "active": active.as_ref().map(|p| p.tour.id),
                    "step": active.as_ref().map(|p| p.step),
                })),
                OutputFormat::Text => {
                    for tour in TOURS {
                        let state = if done.iter().any(|d| d == tour.id) {
                            style("completado").green()
                        } else if active.as_ref().is_some_and(|p| p.tour.id == tour.id) {
                            style("en curso").yellow()
                        } else {
                            style("pendiente").dim()
                        };
                        println!("  {:<12} {state}", tour.id);
                    }
                }
            }
        }
        OnboardingAction::Start { tour, force } => match onboarding.start(&tour, force)? {
            Some(progress) => print_step(&progress, format),
            None => println!("Ya completaste ese recorrido. Usa --force para repetirlo."),
        },
        OnboardingAction::Next => match onboarding.advance()? {
            Some(progress) => print_step(&progress, format),
            None => println!("{} Recorrido terminado.", style("OK").green().bold()),
        },
        OnboardingAction::Skip => {
            onboarding.skip()?;
            println!("Recorrido omitido.");
        }
        OnboardingAction::Reset => {
            onboarding.reset()?;
            println!("{} Recorridos reiniciados.", style("OK").green().bold());
        }
    }
    Ok(())
}
