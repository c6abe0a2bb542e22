use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, error, info};

use crate::context::StoreContext;
use crate::error::FrontDeskError;
use crate::service::BookingService;
use crate::structs::{Booking, BookingId, BookingInput, BookingStatus, Filters};

#[derive(Debug, Clone, Default)]
pub struct BookingState {
    pub items: Vec<Booking>,
    pub is_loading: bool,
    pub filters: Filters,
    pub is_visible: bool,
    pub is_form_visible: bool,
    pub is_submitting: bool,
    pub selected_item: Option<Booking>,
    /// Bumped by every list fetch; only the newest fetch may write `items`.
    fetch_generation: u64,
}

/// Booking list cache plus the operations that keep it in line with the
/// remote service.
///
/// The state lock is never held across a service call, so operations
/// started concurrently interleave at their await points.
pub struct BookingStore<S> {
    service: Arc<S>,
    ctx: StoreContext,
    state: Mutex<BookingState>,
}

impl<S: BookingService> BookingStore<S> {
    pub fn new(service: Arc<S>, ctx: StoreContext) -> Self {
        BookingStore {
            service,
            ctx,
            state: Mutex::new(BookingState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, BookingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> BookingState {
        self.state().clone()
    }

    pub fn items(&self) -> Vec<Booking> {
        self.state().items.clone()
    }

    pub fn find(&self, id: BookingId) -> Option<Booking> {
        self.state().items.iter().find(|b| b.booking_id == id).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.state().is_submitting
    }

    pub fn is_visible(&self) -> bool {
        self.state().is_visible
    }

    pub fn is_form_visible(&self) -> bool {
        self.state().is_form_visible
    }

    pub fn selected_item(&self) -> Option<Booking> {
        self.state().selected_item.clone()
    }

    pub fn filters(&self) -> Filters {
        self.state().filters.clone()
    }

    pub fn set_filters(&self, filters: Filters) {
        self.state().filters = filters;
    }

    pub fn set_items(&self, items: Vec<Booking>) {
        self.state().items = items;
    }

    pub fn add_item(&self, item: Booking) {
        self.state().items.push(item);
    }

    pub fn remove_item(&self, id: BookingId) {
        self.state().items.retain(|item| item.booking_id != id);
    }

    pub fn update_item(&self, id: BookingId, updated_item: &Booking) {
        for item in self.state().items.iter_mut().filter(|item| item.booking_id == id) {
            *item = item.merged(updated_item);
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.state().is_visible = visible;
    }

    pub fn set_form_visible(&self, visible: bool) {
        self.state().is_form_visible = visible;
    }

    pub fn set_selected_item(&self, item: Option<Booking>) {
        self.state().selected_item = item;
    }

    pub fn reset(&self) {
        let mut state = self.state();
        state.is_visible = false;
        state.is_submitting = false;
        state.selected_item = None;
    }

    pub fn reset_form(&self) {
        let mut state = self.state();
        state.is_form_visible = false;
        state.is_submitting = false;
        state.selected_item = None;
    }

    fn report(&self, err: &FrontDeskError, fallback: &str) {
        self.ctx
            .errors
            .set_error(err.message().unwrap_or_else(|| fallback.to_string()));
        error!("{}: {}", fallback, err);
    }

    /// Replace the list with the service's view. Failures are recorded in
    /// the shared error slot and swallowed.
    pub async fn fetch_items(&self) {
        let (generation, filters) = {
            let mut state = self.state();
            state.fetch_generation += 1;
            state.is_loading = true;
            (state.fetch_generation, state.filters.clone())
        };
        self.ctx.loading.set_loading(true);

        let res = self.service.get_many(&filters).await;

        let mut state = self.state();
        if state.fetch_generation != generation {
            debug!("dropping stale booking list (generation {})", generation);
            return;
        }
        state.is_loading = false;
        match res {
            Ok(items) => state.items = items,
            Err(e) => {
                drop(state);
                self.report(&e, "Failed to fetch bookings");
            }
        }
        self.ctx.loading.set_loading(false);
    }

    /// Cached record when the list already has it, otherwise the service's.
    pub async fn fetch_booking_by_id(&self, id: BookingId) -> Result<Booking, FrontDeskError> {
        if let Some(existing) = self.find(id) {
            return Ok(existing);
        }
        self.service.get_one(id).await.map_err(|e| {
            error!("Error fetching booking {}: {}", id, e);
            e
        })
    }

    fn begin_submit(&self) {
        self.state().is_submitting = true;
        self.ctx.loading.set_loading(true);
    }

    fn finish_submit(&self) {
        {
            let mut state = self.state();
            state.is_submitting = false;
            state.is_visible = false;
            state.is_form_visible = false;
            state.selected_item = None;
        }
        self.ctx.loading.set_loading(false);
    }

    fn abort_submit(&self, err: &FrontDeskError, fallback: &str) {
        self.state().is_submitting = false;
        self.ctx.loading.set_loading(false);
        self.report(err, fallback);
    }

    /// Create a booking, then load it back by id so the cached entry has
    /// the room and customer the create response leaves out.
    pub async fn create(&self, input: &BookingInput) -> Result<Booking, FrontDeskError> {
        self.begin_submit();
        let res = async {
            let created = self.service.create(input).await?;
            self.service.get_one(created.booking_id).await
        }
        .await;
        match res {
            Ok(complete_item) => {
                self.add_item(complete_item.clone());
                self.finish_submit();
                info!("created booking {}", complete_item.booking_id);
                Ok(complete_item)
            }
            Err(e) => {
                self.abort_submit(&e, "Failed to create booking");
                Err(e)
            }
        }
    }

    pub async fn update(&self, id: BookingId, input: &BookingInput) -> Result<Booking, FrontDeskError> {
        self.begin_submit();
        let res = async {
            self.service.update(id, input).await?;
            self.service.get_one(id).await
        }
        .await;
        match res {
            Ok(updated_item) => {
                self.update_item(id, &updated_item);
                self.finish_submit();
                Ok(updated_item)
            }
            Err(e) => {
                self.abort_submit(&e, "Failed to update booking");
                Err(e)
            }
        }
    }

    /// Remote delete first; the cached entry goes only once that succeeded.
    pub async fn delete(&self, id: BookingId) -> Result<(), FrontDeskError> {
        self.ctx.loading.set_loading(true);
        match self.service.delete(id).await {
            Ok(()) => {
                self.remove_item(id);
                self.ctx.loading.set_loading(false);
                Ok(())
            }
            Err(e) => {
                self.ctx.loading.set_loading(false);
                self.report(&e, "Failed to delete booking");
                Err(e)
            }
        }
    }

    pub async fn confirm_booking(&self, id: BookingId) -> Result<Booking, FrontDeskError> {
        self.state().is_loading = true;
        self.ctx.loading.set_loading(true);
        let res = self.update(id, &BookingInput::status(BookingStatus::Confirmed)).await;
        self.state().is_loading = false;
        self.ctx.loading.set_loading(false);
        res.map_err(|e| {
            self.report(&e, "Failed to confirm booking");
            e
        })
    }

    pub async fn checkin(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        self.transition(id, BookingStatus::CheckedIn, "Failed to check in booking")
            .await
    }

    pub async fn cancel(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        self.transition(id, BookingStatus::Cancelled, "Failed to cancel booking")
            .await
    }

    async fn transition(
        &self,
        id: BookingId,
        status: BookingStatus,
        fallback: &str,
    ) -> Result<Value, FrontDeskError> {
        self.state().is_loading = true;
        self.ctx.loading.set_loading(true);

        let res = match status {
            BookingStatus::Cancelled => self.service.cancel(id).await,
            _ => self.service.checkin(id).await,
        };

        match res {
            Ok(result) => {
                {
                    let mut state = self.state();
                    apply_known_transition(&mut state.items, id, status);
                    state.is_loading = false;
                }
                self.ctx.loading.set_loading(false);
                info!("booking {} is now {:?}", id, status);
                Ok(result)
            }
            Err(e) => {
                self.state().is_loading = false;
                self.ctx.loading.set_loading(false);
                self.report(&e, fallback);
                Err(e)
            }
        }
    }
}

/// Set `StatusId` on the cached booking without asking the service again.
/// Only valid right after the service accepted the matching transition: the
/// server is assumed to hold exactly this status now.
pub fn apply_known_transition(items: &mut [Booking], id: BookingId, status: BookingStatus) {
    for item in items.iter_mut().filter(|item| item.booking_id == id) {
        item.status_id = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_transition_touches_only_the_matching_booking() {
        let mut items = vec![
            Booking::new(1, 101, BookingStatus::Confirmed),
            Booking::new(2, 102, BookingStatus::Confirmed),
        ];
        apply_known_transition(&mut items, 2, BookingStatus::Cancelled);
        assert_eq!(items[0].status_id, BookingStatus::Confirmed);
        assert_eq!(items[1].status_id, BookingStatus::Cancelled);

        apply_known_transition(&mut items, 42, BookingStatus::CheckedIn);
        assert!(items.iter().all(|b| b.status_id != BookingStatus::CheckedIn));
    }
}
