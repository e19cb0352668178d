//! Guided tours.
//!
//! Completed tour ids persist in local storage as a JSON array; the tour in
//! progress and its step index live in the session scope, so an abandoned
//! tour restarts in the next session.

use tracing::info;

use cartas_core::constants::keys;
use cartas_core::error::{CtError, CtResult};
use cartas_models::{Scope, Storage};

use crate::service::{Service, ServiceState};

/// A tour and its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tour {
    pub id: &'static str,
    pub steps: &'static [&'static str],
}

pub const TOURS: &[Tour] = &[
    Tour {
        id: "generator",
        steps: &[
            "Elige la ocasión: cumpleaños, aniversario, perdón y muchas más.",
            "Escoge el tono y la relación con la persona.",
            "Agrega detalles en el contexto para un mensaje más personal.",
            "Pulsa Generar y mira cómo se escribe tu mensaje en vivo.",
            "Guarda en favoritos los mensajes que más te gusten.",
        ],
    },
    Tour {
        id: "contacts",
        steps: &[
            "Guarda a tus personas importantes como contactos.",
            "Cada mensaje que generes para un contacto queda en su historial.",
            "Marca los mensajes que te gustan: el Guardián aprende de tus preferencias.",
        ],
    },
    Tour {
        id: "reminders",
        steps: &[
            "Crea recordatorios para fechas especiales.",
            "Activa la repetición anual para cumpleaños y aniversarios.",
            "Te avisaremos el día indicado para que no se te pase.",
        ],
    },
];

pub fn find_tour(id: &str) -> Option<&'static Tour> {
    TOURS.iter().find(|t| t.id == id)
}

/// Where the user is in a tour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourProgress {
    pub tour: &'static Tour,
    pub step: usize,
}

impl TourProgress {
    pub fn text(&self) -> &'static str {
        self.tour.steps.get(self.step).copied().unwrap_or_default()
    }

    pub fn is_last(&self) -> bool {
        self.step + 1 >= self.tour.steps.len()
    }
}

pub struct OnboardingService {
    state: ServiceState,
    storage: Storage,
}

impl OnboardingService {
    pub fn new(storage: Storage) -> Self {
        Self {
            state: ServiceState::Created,
            storage,
        }
    }

    pub fn completed_tours(&self) -> CtResult<Vec<String>> {
        Ok(self
            .storage
            .get_json::<Vec<String>>(Scope::Local, keys::ONBOARDING_COMPLETED_TOURS)?
            .unwrap_or_default())
    }

    pub fn is_completed(&self, tour_id: &str) -> CtResult<bool> {
        Ok(self.completed_tours()?.iter().any(|t| t == tour_id))
    }

    /// Tour in progress in this session.
    pub fn active(&self) -> CtResult<Option<TourProgress>> {
        let Some(id) = self.storage.get(Scope::Session, keys::ONBOARDING_ACTIVE_TOUR)? else {
            return Ok(None);
        };
        let Some(tour) = find_tour(&id) else {
            return Ok(None);
        };
        let step = self
            .storage
            .get_u64(Scope::Session, keys::ONBOARDING_STEP_INDEX)? as usize;
        Ok(Some(TourProgress {
            tour,
            step: step.min(tour.steps.len().saturating_sub(1)),
        }))
    }

    /// Start a tour at its first step. A completed tour is not started again
    /// unless `force` is set.
    pub fn start(&self, tour_id: &str, force: bool) -> CtResult<Option<TourProgress>> {
        let tour = find_tour(tour_id).ok_or_else(|| CtError::NotFound(format!("tour {tour_id}")))?;
        if !force && self.is_completed(tour_id)? {
            return Ok(None);
        }
        self.storage
            .set(Scope::Session, keys::ONBOARDING_ACTIVE_TOUR, tour.id)?;
        self.storage
            .set(Scope::Session, keys::ONBOARDING_STEP_INDEX, "0")?;
        info!("tour started: {}", tour.id);
        Ok(Some(TourProgress { tour, step: 0 }))
    }

    /// Move to the next step; past the last step the tour completes and
    /// `None` is returned.
    pub fn advance(&self) -> CtResult<Option<TourProgress>> {
        let Some(progress) = self.active()? else {
            return Ok(None);
        };
        if progress.is_last() {
            self.complete(progress.tour.id)?;
            return Ok(None);
        }
        let step = progress.step + 1;
        self.storage
            .set(Scope::Session, keys::ONBOARDING_STEP_INDEX, &step.to_string())?;
        Ok(Some(TourProgress {
            tour: progress.tour,
            step,
        }))
    }

    pub fn complete(&self, tour_id: &str) -> CtResult<()> {
        let mut done = self.completed_tours()?;
        if !done.iter().any(|t| t == tour_id) {
            done.push(tour_id.to_string());
            self.storage
                .set_json(Scope::Local, keys::ONBOARDING_COMPLETED_TOURS, &done)?;
        }
        self.clear_active()?;
        info!("tour completed: {tour_id}");
        Ok(())
    }

    /// Dismiss the active tour for good.
    pub fn skip(&self) -> CtResult<()> {
        if let Some(progress) = self.active()? {
            self.complete(progress.tour.id)?;
        }
        Ok(())
    }

    pub fn reset(&self) -> CtResult<()> {
        self.storage
            .remove(Scope::Local, keys::ONBOARDING_COMPLETED_TOURS)?;
        self.clear_active()
    }

    fn clear_active(&self) -> CtResult<()> {
        self.storage
            .remove(Scope::Session, keys::ONBOARDING_ACTIVE_TOUR)?;
        self.storage
            .remove(Scope::Session, keys::ONBOARDING_STEP_INDEX)?;
        Ok(())
    }
}

impl Service for OnboardingService {
    fn name(&self) -> &str {
        "onboarding"
    }
    fn state(&self) -> ServiceState {
        self.state
    }
    fn init(&mut self) -> CtResult<()> {
        self.state = ServiceState::Running;
        Ok(())
    }
    fn shutdown(&mut self) -> CtResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> OnboardingService {
        OnboardingService::new(Storage::open_in_memory().unwrap())
    }

    #[test]
    fn test_walk_through_tour() {
        let svc = service();
        let p = svc.start("contacts", false).unwrap().unwrap();
        assert_eq!(p.step, 0);
        assert_eq!(svc.advance().unwrap().unwrap().step, 1);
        assert_eq!(svc.advance().unwrap().unwrap().step, 2);
        assert!(svc.advance().unwrap().is_none());
        assert!(svc.is_completed("contacts").unwrap());
        assert!(svc.active().unwrap().is_none());
        assert!(svc.start("contacts", false).unwrap().is_none());
        assert!(svc.start("contacts", true).unwrap().is_some());
    }

    #[test]
    fn test_skip_and_reset() {
        let svc = service();
        svc.start("generator", false).unwrap();
        svc.skip().unwrap();
        assert_eq!(svc.completed_tours().unwrap(), vec!["generator"]);
        svc.reset().unwrap();
        assert!(svc.completed_tours().unwrap().is_empty());
    }

    #[test]
    fn test_session_expiry_drops_active_tour() {
        let svc = service();
        svc.start("reminders", false).unwrap();
        svc.storage.clear_scope(Scope::Session).unwrap();
        assert!(svc.active().unwrap().is_none());
        assert!(!svc.is_completed("reminders").unwrap());
    }

    #[test]
    fn test_unknown_tour() {
        assert!(matches!(service().start("nope", false), Err(CtError::NotFound(_))));
    }
}
