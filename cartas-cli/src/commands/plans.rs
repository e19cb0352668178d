//! Plan, checkout, payment, and offer commands.

use console::style;

use cartas_core::config::ConfigHandle;
use cartas_core::error::{CtError, CtResult};
use cartas_services::checkout::Gateway;

use crate::OutputFormat;

pub async fn list(config: ConfigHandle, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let plans = registry.checkout().plans().await?;
    let current = registry.user.plan().await;

    match format {
        OutputFormat::Json => super::print_json(&plans),
        OutputFormat::Text => {
            let mut table = super::new_table(vec!["Id", "Plan", "Precio", "Incluye"]);
            for p in &plans {
                let name = if p.level == current {
                    format!("{} (actual)", p.name)
                } else if p.highlighted {
                    format!("{} ★", p.name)
                } else {
                    p.name.clone()
                };
                table.add_row(vec![p.id.clone(), name, p.price_label(), p.features.join("\n")]);
            }
            println!("{table}");
            println!("\nCompra con `cartas checkout <id>`.");
        }
    }
    Ok(())
}

pub async fn checkout(
    config: ConfigHandle,
    plan: String,
    gateway: Option<String>,
    format: OutputFormat,
) -> CtResult<()> {
    let gateway = match gateway {
        Some(raw) => Some(
            Gateway::parse(&raw)
                .ok_or_else(|| CtError::Validation(vec![format!("Pasarela desconocida: {raw}")]))?,
        ),
        None => None,
    };
    let registry = super::open_registry(&config).await?;
    let redirect = registry.checkout().start(&plan, gateway).await?;

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "gateway": redirect.gateway.as_str(),
            "url": redirect.url,
            "reference": redirect.reference,
        })),
        OutputFormat::Text => {
            println!("Paga con {} en:", style(redirect.gateway).bold());
            println!("  {}", style(&redirect.url).underlined());
            if let Some(reference) = &redirect.reference {
                println!("\nLuego verifica el pago con `cartas payment {reference}`.");
            }
        }
    }
    Ok(())
}

pub async fn payment(config: ConfigHandle, reference: String, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let status = registry.checkout().verify(&reference).await?;

    if status.is_approved() {
        // Pick up the new plan.
        if let Err(e) = registry.auth.read().await.restore().await {
            tracing::warn!("could not refresh user after payment: {e}");
        }
    }

    match format {
        OutputFormat::Json => super::print_json(&status),
        OutputFormat::Text => {
            if status.is_approved() {
                println!("{} Pago aprobado. Plan: {}", style("OK").green().bold(), registry.user.plan().await);
            } else if status.is_pending() {
                println!("{} El pago sigue pendiente.", style("…").yellow().bold());
            } else {
                println!("{} Estado del pago: {}", style("!").red().bold(), status.status);
            }
            if let Some(msg) = &status.message {
                println!("  {msg}");
            }
        }
    }
    Ok(())
}

pub async fn offers(config: ConfigHandle, dismiss: bool, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let offers = registry.offers();
    let plan = registry.user.plan().await;

    let Some(offer) = offers.current_offer(plan)? else {
        if format == OutputFormat::Json {
            super::print_json(&serde_json::Value::Null);
        } else {
            println!("No hay ofertas por ahora.");
        }
        return Ok(());
    };

    if dismiss {
        offers.dismiss(offer.id)?;
        println!("{} Oferta ocultada por esta sesión.", style("OK").green().bold());
        return Ok(());
    }

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "id": offer.id,
            "headline": offer.headline,
            "body": offer.body,
        })),
        OutputFormat::Text => println!("{} {}", style(offer.headline).magenta().bold(), offer.body),
    }
    Ok(())
}
