use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::error::FrontDeskError;
use crate::role::{resolve_role, Permissions, Role, RoleSources};
use crate::service::RoomService;
use crate::structs::{Room, RoomInput};

pub mod messages {
    pub const DELETE_SUCCESS: &str = "Deleted successfully";
    pub const DELETE_ERROR: &str = "Delete failed";
    pub const CANCELED: &str = "Cancelled";
    pub const UPDATE_SUCCESS: &str = "Saved successfully";
    pub const UPDATE_ERROR: &str = "Save failed";
}

/// Toast style feedback for the person at the desk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
    Info(String),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Success(msg) => write!(f, "[OK] {}", msg),
            Notification::Error(msg) => write!(f, "[ERROR] {}", msg),
            Notification::Info(msg) => write!(f, "[INFO] {}", msg),
        }
    }
}

/// Edit/delete controls for one room row.
pub struct RoomActions<S> {
    service: Arc<S>,
    room: Room,
    role: Role,
    permissions: Permissions,
    delete_dialog_open: bool,
    is_deleting: bool,
}

impl<S: RoomService> RoomActions<S> {
    pub fn new(service: Arc<S>, room: Room, sources: &RoleSources<'_>) -> Self {
        let mut actions = RoomActions {
            service,
            room,
            role: Role::Unknown,
            permissions: Permissions::default(),
            delete_dialog_open: false,
            is_deleting: false,
        };
        actions.refresh_permissions(sources);
        actions
    }

    /// Resolve the role again, e.g. after the session changed.
    pub fn refresh_permissions(&mut self, sources: &RoleSources<'_>) {
        self.role = Role::from(resolve_role(sources));
        self.permissions = self.role.permissions();
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn can_edit(&self) -> bool {
        self.permissions.can_edit
    }

    pub fn can_delete(&self) -> bool {
        self.permissions.can_delete
    }

    pub fn is_delete_dialog_open(&self) -> bool {
        self.delete_dialog_open
    }

    pub fn is_deleting(&self) -> bool {
        self.is_deleting
    }

    /// The room to load into the edit form.
    pub fn edit(&self) -> Result<&Room, FrontDeskError> {
        if !self.can_edit() {
            return Err(FrontDeskError::Forbidden("editing rooms needs an admin or manager"));
        }
        Ok(&self.room)
    }

    pub async fn submit_edit(&mut self, input: &RoomInput) -> Result<Notification, FrontDeskError> {
        self.edit()?;
        let id = self.room.room_id;
        match self.service.update_room(id, input).await {
            Ok(()) => {
                if let Some(name) = &input.room_name {
                    self.room.room_name = Some(name.clone());
                }
                if let Some(status) = input.status_id {
                    self.room.status_id = Some(status);
                }
                if let Some(type_id) = input.type_id {
                    self.room.type_id = Some(type_id);
                }
                info!("updated room {}", id);
                Ok(Notification::Success(messages::UPDATE_SUCCESS.to_string()))
            }
            Err(e) => {
                error!("Error updating room {}: {}", id, e);
                Ok(Notification::Error(messages::UPDATE_ERROR.to_string()))
            }
        }
    }

    /// Open the confirmation step. Nothing is deleted yet.
    pub fn request_delete(&mut self) -> Result<(), FrontDeskError> {
        if !self.can_delete() {
            return Err(FrontDeskError::Forbidden("only a manager can delete rooms"));
        }
        self.delete_dialog_open = true;
        Ok(())
    }

    pub fn cancel_delete(&mut self) -> Notification {
        self.delete_dialog_open = false;
        Notification::Info(messages::CANCELED.to_string())
    }

    /// Delete the room after the confirmation step. The dialog stays open
    /// when the service refuses, so the user can retry or cancel.
    pub async fn confirm_delete(&mut self) -> Result<Notification, FrontDeskError> {
        if !self.delete_dialog_open {
            return Err(FrontDeskError::NothingToConfirm);
        }
        if !self.can_delete() {
            self.delete_dialog_open = false;
            return Err(FrontDeskError::Forbidden("only a manager can delete rooms"));
        }
        self.is_deleting = true;
        let id = self.room.room_id;
        let res = self.service.delete_room(id).await;
        self.is_deleting = false;
        match res {
            Ok(()) => {
                self.delete_dialog_open = false;
                info!("deleted room {}", id);
                Ok(Notification::Success(messages::DELETE_SUCCESS.to_string()))
            }
            Err(e) => {
                error!("Error deleting room {}: {}", id, e);
                Ok(Notification::Error(messages::DELETE_ERROR.to_string()))
            }
        }
    }
}
