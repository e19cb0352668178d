//! Generation commands: generate, prompt, catalog, usage.

use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use cartas_core::config::ConfigHandle;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{FavoriteItem, HistoryEntry, MessageFormat, Occasion, Relationship, Tone};
use cartas_services::generator::{ChatMessage, GenerationForm};
use cartas_services::guardian::suggestion_pills;
use cartas_services::ServiceRegistry;

use super::{parse_format, parse_occasion, parse_relationship, parse_tone, truncate};
use crate::OutputFormat;

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Occasion id (e.g. cumpleanos, aniversario, perdon).
    #[arg(short, long, value_parser = parse_occasion)]
    pub occasion: Occasion,
    /// Tone id (e.g. emotivo, divertido, poetico).
    #[arg(short, long, value_parser = parse_tone, default_value = "emotivo")]
    pub tone: Tone,
    /// Relationship id (e.g. pareja, amigo, jefe).
    #[arg(short, long, value_parser = parse_relationship)]
    pub relationship: Option<Relationship>,
    /// Message format id (mensaje, carta, poema, publicacion).
    #[arg(short = 'k', long = "kind", value_parser = parse_format, default_value = "mensaje")]
    pub kind: MessageFormat,
    /// Recipient name.
    #[arg(long)]
    pub to: Option<String>,
    /// Extra details to weave into the message.
    #[arg(short = 'x', long)]
    pub context: Option<String>,
    /// ISO country code for regional wording (overrides config).
    #[arg(long)]
    pub country: Option<String>,
    /// Saved contact (id or name) to write for.
    #[arg(long)]
    pub contact: Option<String>,
    /// Save the result to favorites.
    #[arg(long)]
    pub save: bool,
}

async fn build_form(registry: &ServiceRegistry, args: &GenerateArgs) -> CtResult<GenerationForm> {
    let contact = match &args.contact {
        Some(key) => {
            let contacts = registry.contacts.read().await;
            contacts.refresh().await?;
            let found = match contacts.find(key).await {
                Some(c) => Some(c),
                None => contacts.find_by_name(key).await,
            };
            Some(found.ok_or_else(|| CtError::NotFound(format!("contact {key}")))?)
        }
        None => None,
    };

    Ok(GenerationForm {
        occasion: Some(args.occasion),
        tone: args.tone,
        relationship: args.relationship,
        format: args.kind,
        recipient_name: args
            .to
            .clone()
            .or_else(|| contact.as_ref().map(|c| c.name.clone()))
            .unwrap_or_default(),
        extra_context: args.context.clone().unwrap_or_default(),
        country: args.country.clone(),
        contact,
    })
}

fn print_result(msg: &ChatMessage) {
    println!("\n{}\n", msg.content);
    if let Some(insight) = &msg.guardian_insight {
        println!("{} {insight}", style("Guardián:").cyan().bold());
    }
    if !msg.gift_recommendations.is_empty() {
        println!("{}", style("Ideas de regalo:").cyan().bold());
        for gift in &msg.gift_recommendations {
            match &gift.description {
                Some(d) => println!("  - {}: {d}", gift.title),
                None => println!("  - {}", gift.title),
            }
        }
    }
}

pub async fn run(config: ConfigHandle, args: GenerateArgs, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let form = build_form(&registry, &args).await?;
    let generator = registry.generator().await;

    let pb = match format {
        OutputFormat::Text => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            Some(pb)
        }
        OutputFormat::Json => None,
    };

    let live = pb.clone();
    let result = generator
        .generate(&form, move |msg| {
            if let Some(pb) = &live {
                pb.set_message(truncate(&msg.content, 70));
            }
        })
        .await;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    let msg = result?;

    let offers = registry.offers();
    if let Err(e) = offers
        .mark_occasion_visited(args.occasion)
        .and_then(|_| offers.mark_tone_visited(args.tone))
    {
        warn!("could not record visited badges: {e}");
    }

    if let Some(contact_id) = form.contact.as_ref().and_then(|c| c.id.clone()) {
        let entry = HistoryEntry {
            content: msg.content.clone(),
            occasion: Some(args.occasion),
            tone: Some(args.tone),
            feedback: None,
        };
        if let Err(e) = registry.contacts.read().await.record_message(&contact_id, entry).await {
            warn!("could not save message to contact history: {e}");
        }
    }

    let mut saved = None;
    if args.save {
        let favorites = registry.favorites.read().await;
        let mut item = FavoriteItem::new(msg.content.clone(), Some(args.occasion), Some(args.tone));
        item.contact_id = form.contact.as_ref().and_then(|c| c.id.clone());
        saved = Some(favorites.add(item).await?);
    }

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "message": msg,
            "favorite": saved,
        })),
        OutputFormat::Text => {
            print_result(&msg);
            if saved.is_some() {
                println!("{} Guardado en favoritos.", style("OK").green().bold());
            }
            let plan = registry.user.plan().await;
            if let Some(offer) = offers.current_offer(plan)? {
                println!("\n{} {}", style(offer.headline).magenta().bold(), offer.body);
            }
        }
    }
    Ok(())
}

pub async fn prompt(config: ConfigHandle, args: GenerateArgs, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let form = build_form(&registry, &args).await?;
    let errors = form.validate();
    if !errors.is_empty() {
        return Err(CtError::Validation(errors));
    }
    let generator = registry.generator().await;
    let request = generator.build_request(&form)?;
    let pills = suggestion_pills(args.occasion, 4, &mut rand::thread_rng());

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "request": request,
            "suggestions": pills,
        })),
        OutputFormat::Text => {
            let g = &request.guardian;
            println!("{}", style("Tono").bold());
            println!("{}\n", g.tone_instructions);
            println!("{}", style("Relación").bold());
            println!("{}\n", g.relationship_context);
            println!("{}", style("Estructura").bold());
            println!("{}\n", g.structure_instructions);
            if !g.variety_instructions.is_empty() {
                println!("{}", style("Variedad").bold());
                println!("{}\n", g.variety_instructions);
            }
            println!("{} {}", style("Ideas para el contexto:").dim(), pills.join(" · "));
        }
    }
    Ok(())
}

pub async fn catalog(config: ConfigHandle, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let offers = registry.offers();

    if format == OutputFormat::Json {
        super::print_json(&serde_json::json!({
            "occasions": Occasion::ALL,
            "tones": Tone::ALL,
            "relationships": Relationship::ALL,
            "formats": MessageFormat::ALL,
        }));
        return Ok(());
    }

    let premium = |p: bool| if p { "premium" } else { "" }.to_string();
    let new_badge = |n: bool| if n { "nuevo" } else { "" }.to_string();

    let mut table = super::new_table(vec!["Ocasión", "Id", "Plan", ""]);
    for o in Occasion::ALL {
        table.add_row(vec![
            o.label().to_string(),
            o.id().to_string(),
            premium(o.is_premium()),
            new_badge(offers.is_new_occasion(*o)?),
        ]);
    }
    println!("{table}");

    let mut table = super::new_table(vec!["Tono", "Id", "Plan", ""]);
    for t in Tone::ALL {
        table.add_row(vec![
            t.label().to_string(),
            t.id().to_string(),
            premium(t.is_premium()),
            new_badge(offers.is_new_tone(*t)?),
        ]);
    }
    println!("{table}");

    let mut table = super::new_table(vec!["Formato", "Id", "Plan"]);
    for f in MessageFormat::ALL {
        table.add_row(vec![f.label().to_string(), f.id().to_string(), premium(f.is_premium())]);
    }
    println!("{table}");

    let relationships: Vec<_> = Relationship::ALL
        .iter()
        .map(|r| format!("{} ({})", r.label(), r.id()))
        .collect();
    println!("Relaciones: {}", relationships.join(", "));
    Ok(())
}

pub async fn usage(config: ConfigHandle, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let plan = registry.user.plan().await;
    let summary = registry.usage().summary(plan)?;

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "plan": plan,
            "today": summary.today,
            "session": summary.session,
            "daily_limit": summary.daily_limit,
            "remaining": summary.remaining(),
        })),
        OutputFormat::Text => {
            println!("  Plan:      {}", style(plan).cyan().bold());
            println!("  Hoy:       {}", summary.today);
            println!("  Sesión:    {}", summary.session);
            match summary.remaining() {
                Some(left) => println!("  Restantes: {left} de {}", summary.daily_limit.unwrap_or_default()),
                None => println!("  Restantes: ilimitados"),
            }
        }
    }
    Ok(())
}
