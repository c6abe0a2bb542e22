pub mod structs;
pub mod error;
pub mod config;
pub mod context;
pub mod storage;
pub mod service;
pub mod booking_store;
pub mod checkin_store;
pub mod role;
pub mod room_actions;
pub mod views;

pub use booking_store::BookingStore;
pub use checkin_store::CheckinStore;
pub use config::FrontDeskConfig;
pub use context::StoreContext;
pub use error::FrontDeskError;
pub use room_actions::RoomActions;
pub use service::{BookingService, HttpBookingService, RoomService};
