//! Account commands: login, register, logout, whoami.

use console::style;
use dialoguer::{Input, Password};

use cartas_api::RegisterParams;
use cartas_core::config::ConfigHandle;
use cartas_core::error::CtResult;
use cartas_models::User;

use super::prompt_err;
use crate::OutputFormat;

fn ask(prompt: &str, value: Option<String>) -> CtResult<String> {
    match value {
        Some(v) => Ok(v),
        None => Input::new().with_prompt(prompt).interact_text().map_err(prompt_err),
    }
}

fn print_user(user: &User, format: OutputFormat) {
    match format {
        OutputFormat::Json => super::print_json(user),
        OutputFormat::Text => {
            println!("  Nombre: {}", user.name);
            println!("  Email:  {}", user.email);
            println!("  Plan:   {}", style(user.plan_level).cyan().bold());
            if let Some(country) = &user.country {
                println!("  País:   {country}");
            }
        }
    }
}

pub async fn login(config: ConfigHandle, email: Option<String>, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let email = ask("Email", email)?;
    let password = Password::new()
        .with_prompt("Contraseña")
        .interact()
        .map_err(prompt_err)?;

    let user = registry.auth.read().await.login(&email, &password).await?;
    if format == OutputFormat::Text {
        println!("{} ¡Hola, {}!", style("OK").green().bold(), user.first_name());
    }
    print_user(&user, format);
    Ok(())
}

pub async fn register(
    config: ConfigHandle,
    name: Option<String>,
    email: Option<String>,
    country: Option<String>,
    format: OutputFormat,
) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let name = ask("Nombre", name)?;
    let email = ask("Email", email)?;
    let password = Password::new()
        .with_prompt("Contraseña")
        .with_confirmation("Repite la contraseña", "Las contraseñas no coinciden")
        .interact()
        .map_err(prompt_err)?;

    let params = RegisterParams {
        name,
        email,
        password,
        country,
    };
    let user = registry.auth.read().await.register(params).await?;
    if format == OutputFormat::Text {
        println!("{} Cuenta creada.", style("OK").green().bold());
    }
    print_user(&user, format);
    Ok(())
}

pub async fn logout(config: ConfigHandle) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    registry.auth.read().await.logout().await?;
    println!("{} Sesión cerrada.", style("OK").green().bold());
    Ok(())
}

pub async fn whoami(config: ConfigHandle, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    match registry.user.get().await {
        Some(user) => print_user(&user, format),
        None => match format {
            OutputFormat::Json => super::print_json(&serde_json::json!({ "plan": "guest" })),
            OutputFormat::Text => {
                println!("No has iniciado sesión (plan {}).", style("guest").dim());
                println!("Crea una cuenta gratis con `cartas register`.");
            }
        },
    }
    Ok(())
}
