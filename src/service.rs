use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::FrontDeskConfig;
use crate::error::FrontDeskError;
use crate::structs::{
    Booking, BookingId, BookingInput, CreatedBooking, Filters, ListEnvelope, Room, RoomId,
    RoomInput, ServiceErrorBody,
};

#[async_trait]
pub trait BookingService: Send + Sync {
    /// list bookings, filters go out as query parameters
    async fn get_many(&self, filters: &Filters) -> Result<Vec<Booking>, FrontDeskError>;
    /// one booking with its room and customer filled in
    async fn get_one(&self, id: BookingId) -> Result<Booking, FrontDeskError>;
    async fn create(&self, input: &BookingInput) -> Result<CreatedBooking, FrontDeskError>;
    async fn update(&self, id: BookingId, input: &BookingInput) -> Result<(), FrontDeskError>;
    async fn delete(&self, id: BookingId) -> Result<(), FrontDeskError>;
    /// check the guest in; the server moves the booking to checked-in
    async fn checkin(&self, id: BookingId) -> Result<Value, FrontDeskError>;
    /// cancel the booking; the server moves it to cancelled
    async fn cancel(&self, id: BookingId) -> Result<Value, FrontDeskError>;
}

#[async_trait]
pub trait RoomService: Send + Sync {
    async fn get_rooms(&self) -> Result<Vec<Room>, FrontDeskError>;
    async fn update_room(&self, id: RoomId, input: &RoomInput) -> Result<(), FrontDeskError>;
    async fn delete_room(&self, id: RoomId) -> Result<(), FrontDeskError>;
}

fn tr(access_token: Option<&str>) -> Result<HeaderMap, FrontDeskError> {
    let mut res = HeaderMap::new();
    res.insert(ACCEPT, HeaderValue::from_static("application/json"));
    res.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = access_token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| FrontDeskError::Config(format!("invalid access token: {}", e)))?;
        res.insert(AUTHORIZATION, value);
    }
    Ok(res)
}

/// JSON REST client for the booking and room endpoints.
#[derive(Debug, Clone)]
pub struct HttpBookingService {
    client: Client,
    base_url: String,
}

impl HttpBookingService {
    pub fn new(config: &FrontDeskConfig) -> Result<Self, FrontDeskError> {
        let client = ClientBuilder::new()
            .default_headers(tr(config.access_token.as_deref())?)
            .timeout(config.timeout())
            .build()?;
        Ok(HttpBookingService {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, FrontDeskError> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        debug!("service answered {}: {}", status, body);
        let message = serde_json::from_str::<ServiceErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        Err(FrontDeskError::service(Some(status.as_u16()), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, FrontDeskError> {
        let text = self.send(req).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Endpoints that may answer with an empty body.
    async fn send_value(&self, req: RequestBuilder) -> Result<Value, FrontDeskError> {
        let text = self.send(req).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl BookingService for HttpBookingService {
    async fn get_many(&self, filters: &Filters) -> Result<Vec<Booking>, FrontDeskError> {
        let req = self.client.get(self.url("/bookings")).query(filters);
        let list: ListEnvelope<Booking> = self.send_json(req).await?;
        Ok(list.into_items())
    }

    async fn get_one(&self, id: BookingId) -> Result<Booking, FrontDeskError> {
        let req = self.client.get(self.url(&format!("/bookings/{}", id)));
        self.send_json(req).await
    }

    async fn create(&self, input: &BookingInput) -> Result<CreatedBooking, FrontDeskError> {
        let req = self.client.post(self.url("/bookings")).json(input);
        self.send_json(req).await
    }

    async fn update(&self, id: BookingId, input: &BookingInput) -> Result<(), FrontDeskError> {
        let req = self.client.put(self.url(&format!("/bookings/{}", id))).json(input);
        self.send(req).await?;
        Ok(())
    }

    async fn delete(&self, id: BookingId) -> Result<(), FrontDeskError> {
        let req = self.client.delete(self.url(&format!("/bookings/{}", id)));
        self.send(req).await?;
        Ok(())
    }

    async fn checkin(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        let req = self.client.post(self.url(&format!("/bookings/{}/checkin", id)));
        self.send_value(req).await
    }

    async fn cancel(&self, id: BookingId) -> Result<Value, FrontDeskError> {
        let req = self.client.post(self.url(&format!("/bookings/{}/cancel", id)));
        self.send_value(req).await
    }
}

#[async_trait]
impl RoomService for HttpBookingService {
    async fn get_rooms(&self) -> Result<Vec<Room>, FrontDeskError> {
        let list: ListEnvelope<Room> = self.send_json(self.client.get(self.url("/rooms"))).await?;
        Ok(list.into_items())
    }

    async fn update_room(&self, id: RoomId, input: &RoomInput) -> Result<(), FrontDeskError> {
        let req = self.client.put(self.url(&format!("/rooms/{}", id))).json(input);
        self.send(req).await?;
        Ok(())
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), FrontDeskError> {
        let req = self.client.delete(self.url(&format!("/rooms/{}", id)));
        self.send(req).await?;
        Ok(())
    }
}
