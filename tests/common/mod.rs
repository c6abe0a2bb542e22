#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use frontdesk::structs::{
    Booking, BookingId, BookingInput, BookingRoom, BookingStatus, CreatedBooking, Customer,
    Filters, Room, RoomId, RoomInput, RoomType,
};
use frontdesk::{BookingService, FrontDeskError, RoomService};

pub fn booking(id: BookingId, room: RoomId, status: BookingStatus, checkin: &str, guest: &str) -> Booking {
    let mut b = Booking::new(id, room, status);
    b.checkin_date = checkin.to_string();
    b.checkout_date = checkin.to_string();
    b.customer = Some(Customer {
        customer_id: Some(id * 10),
        customer_name: Some(guest.to_string()),
    });
    b
}

pub fn room(id: RoomId) -> Room {
    serde_json::from_value(json!({ "RoomId": id, "RoomName": format!("R{}", id), "StatusId": 1 })).unwrap()
}

/// In-memory booking/room backend. `get_one` fills in the room and customer
/// the way the real service joins them; `create` answers with the id only.
#[derive(Default)]
pub struct MockService {
    pub bookings: Mutex<Vec<Booking>>,
    pub rooms: Mutex<Vec<Room>>,
    pub calls: Mutex<Vec<String>>,
    failure: Mutex<Option<Option<String>>>,
    next_id: AtomicI64,
}

impl MockService {
    pub fn with_bookings(bookings: Vec<Booking>) -> Self {
        let svc = MockService::default();
        svc.next_id.store(1000, Ordering::SeqCst);
        *svc.bookings.lock().unwrap() = bookings;
        svc
    }

    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        let svc = MockService::default();
        *svc.rooms.lock().unwrap() = rooms;
        svc
    }

    /// Every call fails from now on; `None` means the failure has no message.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some(message.map(str::to_string));
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn enter(&self, call: String) -> Result<(), FrontDeskError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(FrontDeskError::service(Some(500), message)),
            None => Ok(()),
        }
    }

    fn stored(&self, id: BookingId) -> Result<Booking, FrontDeskError> {
        self.bookings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.booking_id == id)
            .cloned()
            .ok_or(FrontDeskError::BookingNotFound(id))
    }

    fn set_status(&self, id: BookingId, status: BookingStatus) -> Result<Value, FrontDeskError> {
        let mut bookings = self.bookings.lock().unwrap();
        let b = bookings
            .iter_mut()
            .find(|b| b.booking_id == id)
            .ok_or(FrontDeskError::BookingNotFound(id))?;
        b.status_id = status;
        Ok(json!({ "success": true, "BookingId": id }))
    }
}

#[async_trait]
impl BookingService for MockService {
    async fn get_many(&self, filters: &Filters) -> Result<Vec<Booking>, FrontDeskError> {
        self.enter(format!("get_many {:?}", filters))?;
        let wanted = filters.get("StatusId").and_then(|s| s.parse::<i64>().ok());
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| wanted.map_or(true, |code| b.status_id.code() == code))
            .cloned()
            .collect())
    }

    async fn get_one(&self, id: BookingId) -> Result<Booking, FrontDeskError> {
        self.enter(format!("get_one {}", id))?;
        let mut b = self.stored(id)?;
        b.room = Some(BookingRoom {
            room_id: Some(b.room_id),
            room_name: Some(format!("R{}", b.room_id)),
            room_type: Some(RoomType {
                type_id: Some(1),
                type_name: Some("Standard".to_string()),
            }),
        });
        if b.customer.is_none() {
            b.customer = b.customer_id.map(|cid| Customer {
                customer_id: Some(cid),
                customer_name: Some(format!("Guest {}", cid)),
            });
        }
        Ok(b)
    }

    async fn create(&self, input: &BookingInput) -> Result<CreatedBooking, FrontDeskError> {
        self.enter("create".to_string())?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut b = Booking::new(id, input.room_id.unwrap_or_default(), BookingStatus::Other(1));
        b.customer_id = input.customer_id;
        b.checkin_date = input.checkin_date.clone().unwrap_or_default();
        b.checkout_date = input.checkout_date.clone().unwrap_or_default();
        self.bookings.lock().unwrap().push(b);
        let mut extra = Map::new();
        extra.insert("message".to_string(), json!("created"));
        Ok(CreatedBooking { booking_id: id, extra })
    }

    async fn update(&self, id: BookingId, input: &BookingInput) -> Result<(), FrontDeskError> {
        self.enter(format!("update {}", id))?;
        let mut bookings = self.bookings.lock().unwrap();
        let b = bookings
            .iter_mut()
            .find(|b| b.booking_id == id)
            .ok_or(FrontDeskError::BookingNotFound(id))?;
        if let Some(room_id) = input.room_id {
            b.room_id = room_id;
        }
        if let Some(status) = input.status_id {
            b.status_id = status;
        }
        if let Some(date) = &input.checkin_date {
            b.checkin_date = date.clone();
        }
        if let Some(date) = &input.checkout_date {
            b.checkout_date = date.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: BookingId) -> Result<(), FrontDeskError> {
        self.enter(format!("delete {}", id))?;
        self.bookings.lock().unwrap().retain(|b| b.booking_id != id);
        Ok(())
    }

    async fn checkin(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        self.enter(format!("checkin {}", id))?;
        // lets a concurrent caller run while this check-in is in flight
        tokio::task::yield_now().await;
        self.set_status(id, BookingStatus::CheckedIn)
    }

    async fn cancel(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        self.enter(format!("cancel {}", id))?;
        self.set_status(id, BookingStatus::Cancelled)
    }
}

#[async_trait]
impl RoomService for MockService {
    async fn get_rooms(&self) -> Result<Vec<Room>, FrontDeskError> {
        self.enter("get_rooms".to_string())?;
        Ok(self.rooms.lock().unwrap().clone())
    }

    async fn update_room(&self, id: RoomId, input: &RoomInput) -> Result<(), FrontDeskError> {
        self.enter(format!("update_room {}", id))?;
        let mut rooms = self.rooms.lock().unwrap();
        let r = rooms
            .iter_mut()
            .find(|r| r.room_id == id)
            .ok_or(FrontDeskError::RoomNotFound(id))?;
        if let Some(name) = &input.room_name {
            r.room_name = Some(name.clone());
        }
        Ok(())
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), FrontDeskError> {
        self.enter(format!("delete_room {}", id))?;
        self.rooms.lock().unwrap().retain(|r| r.room_id != id);
        Ok(())
    }
}
