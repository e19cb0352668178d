//! Guardian prompt builder.
//!
//! Turns the form selection plus what we know about the recipient (relation,
//! notes, liked/disliked tones, previously generated messages) into the four
//! instruction blocks the backend splices into its model prompt. Pure apart
//! from the opening-style hint, which is drawn from the supplied RNG.

use std::collections::HashSet;

use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;

use cartas_core::constants::{MAX_AVOID_KEYWORDS, MIN_KEYWORD_LEN};
use cartas_models::{
    Contact, GuardianPrompt, HistoryEntry, MessageFormat, Occasion, Relationship, Tone,
};

lazy_static! {
    static ref KEYWORD: Regex = Regex::new(&format!("[a-záéíóúüñ]{{{MIN_KEYWORD_LEN},}}")).unwrap();

    /// Frequent words that say nothing about style; never reported as repeats.
    static ref SAFE_WORDS: HashSet<&'static str> = [
        "porque", "siempre", "cuando", "donde", "quiero", "gracias", "feliz",
        "sobre", "entre", "desde", "hasta", "estas", "estos", "también",
        "nuestro", "nuestra", "nuestros", "nuestras", "mucho", "mucha", "muchos",
        "muchas", "todos", "todas", "puedo", "puedes", "tener", "hacer", "estar",
        "contigo", "momento", "momentos", "mejor", "ahora", "aunque", "nunca",
        "otros", "otras", "mismo", "misma", "sabes", "tienes", "espero", "deseo",
        "deseos", "queda", "cumpleaños", "esperanza", "corazón", "persona",
        "especial", "alguien", "gente", "hacia", "mientras", "todavía", "quien",
        "quienes", "cuanto", "tanto", "tanta", "ellos", "ellas", "nosotros",
        "vosotros", "ustedes", "usted", "aquí", "allí", "están", "somos", "fueron",
        "había", "hemos", "puede", "pueden", "sería", "estoy", "tengo", "siento",
    ]
    .into_iter()
    .collect();
}

/// Opening-style hints; one is picked at random per relationship-directed
/// generation.
pub const OPENING_HINTS: [&str; 3] = [
    "Empieza con un recuerdo concreto o una imagen sensorial, no con un saludo genérico.",
    "Empieza con una pregunta o una frase corta que sorprenda.",
    "Empieza hablando directamente de la persona, por su nombre o apodo.",
];

/// Everything the builder looks at.
#[derive(Debug, Clone, Copy)]
pub struct GuardianInput<'a> {
    pub occasion: Occasion,
    pub tone: Tone,
    pub relationship: Option<Relationship>,
    pub format: MessageFormat,
    /// ISO country code for regional adaptation; `None` disables it.
    pub country: Option<&'a str>,
    pub recipient_name: Option<&'a str>,
    pub contact: Option<&'a Contact>,
}

impl<'a> GuardianInput<'a> {
    pub fn new(occasion: Occasion, tone: Tone, format: MessageFormat) -> Self {
        Self {
            occasion,
            tone,
            relationship: None,
            format,
            country: None,
            recipient_name: None,
            contact: None,
        }
    }

    fn effective_relationship(&self) -> Option<Relationship> {
        self.relationship
            .or_else(|| self.contact.and_then(|c| c.relationship))
    }

    fn effective_name(&self) -> Option<&'a str> {
        self.recipient_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| self.contact.map(|c| c.name.trim()).filter(|n| !n.is_empty()))
    }
}

/// Build the four instruction blocks.
pub fn build_guardian_prompt<R: Rng + ?Sized>(input: &GuardianInput<'_>, rng: &mut R) -> GuardianPrompt {
    GuardianPrompt {
        tone_instructions: tone_instructions(input),
        relationship_context: relationship_context(input),
        structure_instructions: structure_instructions(input, rng),
        variety_instructions: variety_instructions(input),
    }
}

fn tone_instructions(input: &GuardianInput<'_>) -> String {
    let mut out = format!("Tono {}: {}", input.tone.label().to_lowercase(), tone_rule(input.tone));

    if !input.occasion.is_daily_reflection() {
        if let Some(rel) = input.effective_relationship() {
            out.push(' ');
            out.push_str(relationship_register(rel));
        }
    }

    if let Some(contact) = input.contact {
        let liked = contact.liked_tones();
        let disliked = contact.disliked_tones();
        if !liked.is_empty() {
            out.push_str(&format!(
                " A esta persona le han gustado los mensajes en tono {}; acércate a ese estilo.",
                join_tones(&liked)
            ));
        }
        if !disliked.is_empty() {
            out.push_str(&format!(
                " No le gustaron los mensajes en tono {}; evita ese estilo.",
                join_tones(&disliked)
            ));
        }
    }

    out
}

fn relationship_context(input: &GuardianInput<'_>) -> String {
    let mut parts = Vec::new();

    if input.occasion.is_daily_reflection() {
        parts.push(
            "Reflexión para compartir con cualquier persona: no la dirijas a alguien en particular."
                .to_string(),
        );
    } else {
        if let Some(name) = input.effective_name() {
            parts.push(format!("El mensaje es para {name}."));
        }
        if let Some(rel) = input.effective_relationship() {
            parts.push(format!(
                "Relación: {}. {}",
                rel.label().to_lowercase(),
                relationship_closeness(rel)
            ));
        }
        if let Some(notes) = input.contact.and_then(|c| c.notes.as_deref()) {
            let notes = notes.trim();
            if !notes.is_empty() {
                parts.push(format!("Datos sobre la persona: {notes}."));
            }
        }
    }

    if let Some(code) = input.country {
        if let Some(country) = country_name(code) {
            let mut regional = format!(
                "Adaptación regional: escribe como alguien de {country}, con expresiones naturales de allí sin caer en caricatura."
            );
            if uses_voseo(code) {
                regional.push_str(" Usa voseo.");
            }
            parts.push(regional);
        }
    }

    parts.join(" ")
}

fn structure_instructions<R: Rng + ?Sized>(input: &GuardianInput<'_>, rng: &mut R) -> String {
    if input.occasion.is_daily_reflection() {
        return [
            "Estructura obligatoria en tres partes:",
            "1) Gancho: una frase inicial breve que atrape.",
            "2) Observación: una situación cotidiana con la que cualquiera se identifique.",
            "3) Lección: una enseñanza concreta y aplicable hoy, sin moralina.",
            "Máximo 120 palabras. Sin saludo ni firma.",
        ]
        .join(" ");
    }

    let hint = OPENING_HINTS.choose(rng).copied().unwrap_or(OPENING_HINTS[0]);
    format!(
        "Ocasión: {}. {} {}",
        input.occasion.label().to_lowercase(),
        format_rule(input.format),
        hint
    )
}

fn variety_instructions(input: &GuardianInput<'_>) -> String {
    let history = input.contact.map(|c| c.message_history.as_slice()).unwrap_or(&[]);
    let used = extract_used_keywords(history);
    if used.is_empty() {
        return String::new();
    }
    format!(
        "Ya usamos estas palabras en mensajes anteriores para esta persona; no las repitas: {}.",
        used.join(", ")
    )
}

/// Distinct "already used" words from past messages, newest message first,
/// at most 15, never a safe word.
pub fn extract_used_keywords(history: &[HistoryEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for entry in history.iter().rev() {
        let lowered = entry.content.to_lowercase();
        for m in KEYWORD.find_iter(&lowered) {
            let word = m.as_str();
            if SAFE_WORDS.contains(word) || !seen.insert(word.to_string()) {
                continue;
            }
            out.push(word.to_string());
            if out.len() == MAX_AVOID_KEYWORDS {
                return out;
            }
        }
    }

    out
}

/// Whether `word` is on the fixed safe-word list.
pub fn is_safe_word(word: &str) -> bool {
    SAFE_WORDS.contains(word)
}

/// Up to `count` suggestions for the extra-context field, shuffled.
pub fn suggestion_pills<R: Rng + ?Sized>(occasion: Occasion, count: usize, rng: &mut R) -> Vec<&'static str> {
    let mut pills = occasion_suggestions(occasion).to_vec();
    pills.shuffle(rng);
    pills.truncate(count);
    pills
}

fn join_tones(tones: &[Tone]) -> String {
    tones
        .iter()
        .map(|t| t.label().to_lowercase())
        .collect::<Vec<_>>()
        .join(", ")
}

fn tone_rule(tone: Tone) -> &'static str {
    match tone {
        Tone::Romantic => "cálido e íntimo, con imágenes tiernas y sin cursilería excesiva.",
        Tone::Funny => "ligero y con humor amable; una broma bien puesta vale más que muchas.",
        Tone::Formal => "respetuoso y cuidado, frases completas, sin coloquialismos.",
        Tone::Heartfelt => "sincero y emotivo, habla de lo que la persona significa.",
        Tone::Friendly => "cercano y natural, como se habla entre amigos.",
        Tone::Poetic => "lírico, con metáforas cuidadas y ritmo en las frases.",
        Tone::Sarcastic => "irónico y pícaro, sin llegar a herir; el cariño debe notarse.",
    }
}

fn relationship_register(rel: Relationship) -> &'static str {
    match rel {
        Relationship::Partner => "Puedes usar apodos cariñosos y referencias íntimas.",
        Relationship::Family => "Trato de confianza familiar; evita lo demasiado solemne.",
        Relationship::Friend => "Tutea y usa complicidad de amigos.",
        Relationship::Coworker => "Cordial y profesional; nada demasiado personal.",
        Relationship::Boss => "Respetuoso y agradecido; nada de confianzas excesivas.",
        Relationship::Other => "Mantén un registro neutro y amable.",
    }
}

fn relationship_closeness(rel: Relationship) -> &'static str {
    match rel {
        Relationship::Partner => "Es su pareja: máxima cercanía.",
        Relationship::Family => "Es de su familia: cariño y historia compartida.",
        Relationship::Friend => "Es su amigo o amiga: complicidad y recuerdos en común.",
        Relationship::Coworker => "Comparten trabajo: cercanía moderada.",
        Relationship::Boss => "Es su jefe o jefa: distancia respetuosa.",
        Relationship::Other => "Relación no especificada: cercanía moderada.",
    }
}

fn format_rule(format: MessageFormat) -> &'static str {
    match format {
        MessageFormat::Message => "Formato: mensaje breve de 2 a 4 frases, listo para enviar por chat.",
        MessageFormat::Letter => "Formato: carta con saludo, de 3 a 5 párrafos y una despedida.",
        MessageFormat::Poem => "Formato: poema de 3 o 4 estrofas con ritmo; la rima es opcional.",
        MessageFormat::SocialPost => {
            "Formato: publicación para redes, 1 o 2 párrafos cortos, hasta 3 emojis y un hashtag."
        }
    }
}

/// Country name for a supported ISO code (case-insensitive).
pub fn country_name(code: &str) -> Option<&'static str> {
    let name = match code.trim().to_ascii_uppercase().as_str() {
        "AR" => "Argentina",
        "BO" => "Bolivia",
        "CL" => "Chile",
        "CO" => "Colombia",
        "CR" => "Costa Rica",
        "DO" => "República Dominicana",
        "EC" => "Ecuador",
        "ES" => "España",
        "GT" => "Guatemala",
        "HN" => "Honduras",
        "MX" => "México",
        "NI" => "Nicaragua",
        "PA" => "Panamá",
        "PE" => "Perú",
        "PR" => "Puerto Rico",
        "PY" => "Paraguay",
        "SV" => "El Salvador",
        "US" => "Estados Unidos (comunidad hispana)",
        "UY" => "Uruguay",
        "VE" => "Venezuela",
        _ => return None,
    };
    Some(name)
}

fn uses_voseo(code: &str) -> bool {
    matches!(code.trim().to_ascii_uppercase().as_str(), "AR" | "UY" | "PY")
}

fn occasion_suggestions(occasion: Occasion) -> &'static [&'static str] {
    match occasion {
        Occasion::Birthday => &[
            "Cumple 30 años",
            "Le encanta viajar",
            "Estamos lejos este año",
            "Le organizo una sorpresa",
            "Es su primer cumpleaños juntos",
            "Le gusta el fútbol",
        ],
        Occasion::Anniversary => &[
            "Cumplimos 5 años",
            "Nos conocimos en la universidad",
            "Tuvimos un año difícil",
            "Recordar nuestro primer viaje",
            "Vivimos juntos desde hace poco",
        ],
        Occasion::Apology => &[
            "Olvidé una fecha importante",
            "Dije algo hiriente",
            "Llegué tarde otra vez",
            "No estuve cuando me necesitó",
            "Quiero arreglarlo en persona",
        ],
        Occasion::Love => &[
            "Hace poco que salimos",
            "Quiero sorprenderle sin motivo",
            "Relación a distancia",
            "Me hace reír todos los días",
            "Le admiro mucho",
        ],
        Occasion::Gratitude => &[
            "Me ayudó con la mudanza",
            "Me apoyó en un mal momento",
            "Fue mi mentor",
            "Cuidó de mis hijos",
            "Me regaló algo especial",
        ],
        Occasion::Friendship => &[
            "Amigos desde la infancia",
            "Nos vemos poco últimamente",
            "Siempre está cuando la necesito",
            "Compartimos un viaje inolvidable",
            "Se muda a otra ciudad",
        ],
        Occasion::Motivation => &[
            "Tiene un examen importante",
            "Empieza un trabajo nuevo",
            "Está pasando un mal momento",
            "Corre su primera maratón",
            "Emprende su propio negocio",
        ],
        Occasion::Condolences => &[
            "Falleció su madre",
            "Perdió a su mascota",
            "Conocí poco al fallecido",
            "Quiero ofrecer ayuda concreta",
            "Fue una pérdida repentina",
        ],
        Occasion::Congratulations => &[
            "Se graduó",
            "Le ascendieron",
            "Va a ser mamá o papá",
            "Se casa",
            "Compró su primera casa",
        ],
        Occasion::Christmas => &[
            "Pasamos la Navidad separados",
            "Primera Navidad en familia",
            "Para todo el equipo de trabajo",
            "Año de muchos cambios",
            "Con humor navideño",
        ],
        Occasion::MothersDay => &[
            "Vive lejos",
            "Es mamá primeriza",
            "Es como una madre para mí",
            "Le gustan las plantas",
            "Agradecer su sacrificio",
        ],
        Occasion::FathersDay => &[
            "Me enseñó a manejar",
            "Es abuelo este año",
            "Es fanático del asado",
            "No solemos decirnos te quiero",
            "Es papá primerizo",
        ],
        Occasion::DailyReflection => &[
            "Sobre la paciencia",
            "Empezar la semana con energía",
            "Aprender de los errores",
            "Valorar las cosas pequeñas",
            "Soltar lo que no controlamos",
        ],
    }
}
