//! Contact commands.

use clap::Subcommand;
use console::style;

use cartas_core::config::ConfigHandle;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{Contact, Feedback, Relationship};

use super::{parse_relationship, truncate};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ContactsAction {
    /// List saved contacts.
    List,
    /// Show one contact with its message history.
    Show {
        /// Contact id or name.
        contact: String,
    },
    /// Save a new contact.
    Add {
        /// Contact name.
        name: String,
        /// Relationship id (pareja, familia, amigo, trabajo, jefe, otro).
        #[arg(short, long, value_parser = parse_relationship)]
        relationship: Option<Relationship>,
        /// Birthday (YYYY-MM-DD or MM-DD).
        #[arg(short, long)]
        birthday: Option<String>,
        /// Free-form notes.
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Delete a contact.
    Remove {
        /// Contact id or name.
        contact: String,
    },
    /// Mark a message in a contact's history as liked or disliked.
    Feedback {
        /// Contact id or name.
        contact: String,
        /// Exact message text.
        message: String,
        /// Mark as disliked instead of liked.
        #[arg(long)]
        dislike: bool,
    },
}

async fn resolve(contacts: &cartas_services::ContactService, key: &str) -> CtResult<Contact> {
    match contacts.find(key).await {
        Some(c) => Ok(c),
        None => contacts
            .find_by_name(key)
            .await
            .ok_or_else(|| CtError::NotFound(format!("contact {key}"))),
    }
}

fn contact_id(contact: &Contact) -> CtResult<String> {
    contact
        .id
        .clone()
        .ok_or_else(|| CtError::Internal(format!("contact {} has no id", contact.name)))
}

pub async fn run(config: ConfigHandle, action: ContactsAction, format: OutputFormat) -> CtResult<()> {
    let registry = super::open_registry(&config).await?;
    let contacts = registry.contacts.read().await;

    match action {
        ContactsAction::List => {
            let list = contacts.refresh().await?;
            match format {
                OutputFormat::Json => super::print_json(&list),
                OutputFormat::Text => {
                    if list.is_empty() {
                        println!("No hay contactos. Agrega uno con `cartas contacts add <nombre>`.");
                    } else {
                        let mut table = super::new_table(vec!["", "Nombre", "Relación", "Cumpleaños", "Mensajes"]);
                        for c in &list {
                            table.add_row(vec![
                                c.initials(),
                                c.name.clone(),
                                c.relationship.map(|r| r.label().to_string()).unwrap_or_else(|| "-".into()),
                                c.birthday.clone().unwrap_or_else(|| "-".into()),
                                c.message_history.len().to_string(),
                            ]);
                        }
                        println!("{table}");
                        println!("\n{} contacto(s)", list.len());
                    }
                }
            }
        }
        ContactsAction::Show { contact } => {
            contacts.refresh().await?;
            let c = resolve(&contacts, &contact).await?;
            match format {
                OutputFormat::Json => super::print_json(&c),
                OutputFormat::Text => {
                    println!("{} {}", style(&c.name).bold(), style(c.id.as_deref().unwrap_or("")).dim());
                    if let Some(notes) = &c.notes {
                        println!("  {notes}");
                    }
                    let liked = c.liked_tones();
                    if !liked.is_empty() {
                        let names: Vec<_> = liked.iter().map(|t| t.label()).collect();
                        println!("  Le gusta: {}", names.join(", "));
                    }
                    for entry in c.message_history.iter().rev() {
                        let mark = match entry.feedback {
                            Some(Feedback::Liked) => style("+").green(),
                            Some(Feedback::Disliked) => style("-").red(),
                            None => style(" ").dim(),
                        };
                        println!("  {mark} {}", truncate(&entry.content, 80));
                    }
                }
            }
        }
        ContactsAction::Add {
            name,
            relationship,
            birthday,
            notes,
        } => {
            contacts.refresh().await?;
            let mut contact = Contact::new(name, relationship);
            contact.birthday = birthday;
            contact.notes = notes;
            let created = contacts.create(contact).await?;
            match format {
                OutputFormat::Json => super::print_json(&created),
                OutputFormat::Text => println!("{} Contacto guardado: {}", style("OK").green().bold(), created.name),
            }
        }
        ContactsAction::Remove { contact } => {
            contacts.refresh().await?;
            let c = resolve(&contacts, &contact).await?;
            contacts.delete(&contact_id(&c)?).await?;
            println!("{} Contacto eliminado: {}", style("OK").green().bold(), c.name);
        }
        ContactsAction::Feedback {
            contact,
            message,
            dislike,
        } => {
            contacts.refresh().await?;
            let c = resolve(&contacts, &contact).await?;
            let feedback = if dislike { Feedback::Disliked } else { Feedback::Liked };
            contacts.record_feedback(&contact_id(&c)?, &message, feedback).await?;
            println!("{} Preferencia guardada.", style("OK").green().bold());
        }
    }
    Ok(())
}
