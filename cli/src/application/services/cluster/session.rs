//! `CloudSession`: a provider handle plus the reservations made through it.

use anyhow::{Context, Result};

use crate::application::ports::ComputeProvider;
use crate::domain::instance::{InstanceRef, Reservation, unique_instance_ids};

/// Provider handle and the ordered reservations created through it.
///
/// Launching takes `&mut self` and reaping takes `&self`, so the borrow
/// checker keeps the two from overlapping.
pub struct CloudSession<P> {
    provider: P,
    reservations: Vec<Reservation>,
}

impl<P: ComputeProvider> CloudSession<P> {
    /// Start a session with no reservations.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            reservations: Vec::new(),
        }
    }

    /// Resume a session from previously recorded reservations.
    pub fn with_reservations(provider: P, reservations: Vec<Reservation>) -> Self {
        Self {
            provider,
            reservations,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    /// Every instance ID across all reservations, de-duplicated.
    #[must_use]
    pub fn instance_ids(&self) -> Vec<String> {
        unique_instance_ids(&self.reservations)
    }

    pub(crate) fn record(&mut self, reservation: Reservation) {
        self.reservations.push(reservation);
    }

    /// Fresh status for every instance in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's describe call fails.
    pub async fn describe(&self) -> Result<Vec<InstanceRef>> {
        let ids = self.instance_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.provider
            .describe_instances(&ids)
            .await
            .context("describing session instances")
    }
}
