use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::booking_store::apply_known_transition;
use crate::context::StoreContext;
use crate::error::FrontDeskError;
use crate::service::BookingService;
use crate::structs::{Booking, BookingId, BookingStatus, Filters};

#[derive(Debug, Clone, Default)]
pub struct CheckinState {
    pub confirmed_bookings: Vec<Booking>,
    pub is_loading: bool,
    pub search_value: String,
    pub selected_booking: Option<Booking>,
    pub is_processing: bool,
    fetch_generation: u64,
}

/// Confirmed bookings waiting at the desk, with search and the check-in
/// action.
pub struct CheckinStore<S> {
    service: Arc<S>,
    ctx: StoreContext,
    state: Mutex<CheckinState>,
}

pub fn confirmed_filter() -> Filters {
    let mut filters = Filters::new();
    filters.insert(
        "StatusId".to_string(),
        BookingStatus::Confirmed.code().to_string(),
    );
    filters
}

impl<S: BookingService> CheckinStore<S> {
    pub fn new(service: Arc<S>, ctx: StoreContext) -> Self {
        CheckinStore {
            service,
            ctx,
            state: Mutex::new(CheckinState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, CheckinState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CheckinState {
        self.state().clone()
    }

    pub fn confirmed_bookings(&self) -> Vec<Booking> {
        self.state().confirmed_bookings.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn is_processing(&self) -> bool {
        self.state().is_processing
    }

    pub fn search_value(&self) -> String {
        self.state().search_value.clone()
    }

    pub fn selected_booking(&self) -> Option<Booking> {
        self.state().selected_booking.clone()
    }

    pub fn set_search_value(&self, value: &str) {
        self.state().search_value = value.to_string();
    }

    pub fn set_selected_booking(&self, booking: Option<Booking>) {
        self.state().selected_booking = booking;
    }

    pub async fn fetch_confirmed_bookings(&self) {
        let generation = {
            let mut state = self.state();
            state.fetch_generation += 1;
            state.is_loading = true;
            state.fetch_generation
        };
        self.ctx.loading.set_loading(true);

        let res = self.service.get_many(&confirmed_filter()).await;

        let mut state = self.state();
        if state.fetch_generation != generation {
            debug!("dropping stale confirmed list (generation {})", generation);
            return;
        }
        state.is_loading = false;
        match res {
            Ok(bookings) => state.confirmed_bookings = bookings,
            Err(e) => {
                drop(state);
                self.ctx.errors.set_error(
                    e.message()
                        .unwrap_or_else(|| "Failed to fetch confirmed bookings".to_string()),
                );
                error!("Error fetching confirmed bookings: {}", e);
            }
        }
        self.ctx.loading.set_loading(false);
    }

    /// Check the guest in. Refused while another check-in is in flight.
    pub async fn process_checkin(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        {
            let mut state = self.state();
            if state.is_processing {
                drop(state);
                let err = FrontDeskError::Busy;
                self.ctx.errors.set_error(err.to_string());
                warn!("refusing check-in of booking {}: {}", id, err);
                return Err(err);
            }
            state.is_processing = true;
        }
        self.ctx.loading.set_loading(true);

        match self.service.checkin(id).await {
            Ok(result) => {
                {
                    let mut state = self.state();
                    apply_known_transition(&mut state.confirmed_bookings, id, BookingStatus::CheckedIn);
                    state.selected_booking = None;
                    state.is_processing = false;
                }
                self.ctx.loading.set_loading(false);
                info!("checked in booking {}", id);
                Ok(result)
            }
            Err(e) => {
                self.state().is_processing = false;
                self.ctx.loading.set_loading(false);
                self.ctx.errors.set_error(
                    e.message()
                        .unwrap_or_else(|| "Failed to check in booking".to_string()),
                );
                error!("Error checking in booking {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Bookings still waiting for check-in that match the search value.
    pub fn get_filtered_bookings(&self) -> Vec<Booking> {
        let state = self.state();
        awaiting(&state.confirmed_bookings)
            .filter(|b| b.matches_search(&state.search_value))
            .cloned()
            .collect()
    }

    pub fn get_today_check_ins(&self) -> Vec<Booking> {
        self.check_ins_on(Local::now().date_naive())
    }

    pub fn check_ins_on(&self, day: NaiveDate) -> Vec<Booking> {
        awaiting(&self.state().confirmed_bookings)
            .filter(|b| b.checks_in_on(day))
            .cloned()
            .collect()
    }
}

fn awaiting(bookings: &[Booking]) -> impl Iterator<Item = &Booking> {
    bookings
        .iter()
        .filter(|b| b.status_id == BookingStatus::Confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmed_filter_asks_for_status_two() {
        assert_eq!(confirmed_filter().get("StatusId").map(String::as_str), Some("2"));
    }

    #[test]
    fn awaiting_skips_checked_in_bookings() {
        let bookings = vec![
            Booking::new(1, 101, BookingStatus::Confirmed),
            Booking::new(2, 102, BookingStatus::CheckedIn),
        ];
        let ids: Vec<_> = awaiting(&bookings).map(|b| b.booking_id).collect();
        assert_eq!(ids, vec![1]);
    }
}
