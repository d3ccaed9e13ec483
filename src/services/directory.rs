use async_trait::async_trait;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use tracing::{info, warn};

use crate::errors::{ServiceError, ServiceResult};
use crate::models::room::Room;
use crate::models::user::{Role, User};

/// Lookup of principals. Used to resolve candidates and to build the
/// pending-approval and reminder audiences.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: &str) -> ServiceResult<Option<User>>;
    async fn find_by_role(&self, role: Role) -> ServiceResult<Vec<User>>;
}

/// Lookup of bookable rooms.
#[async_trait]
pub trait RoomCatalog: Send + Sync {
    async fn get_room(&self, id: &str) -> ServiceResult<Option<Room>>;
    async fn list_rooms(&self) -> ServiceResult<Vec<Room>>;
}

/// In-memory user directory, loaded once at startup.
///
/// Rooms and users are read-only as far as the engine is concerned, so a
/// startup snapshot is sufficient.
pub struct StaticUserDirectory {
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    fullname: String,
    email: String,
    role: String,
}

impl StaticUserDirectory {
    pub fn from_users(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Loads users from a CSV file with columns id,fullname,email,role.
    pub fn load_csv(path: &str) -> ServiceResult<Self> {
        let file = File::open(path)
            .map_err(|e| ServiceError::store(format!("Failed to open users file {}: {}", path, e)))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut users = Vec::new();

        for result in reader.deserialize::<UserRecord>() {
            let record = result
                .map_err(|e| ServiceError::store(format!("Failed to read user record: {}", e)))?;
            match Role::parse(&record.role) {
                Some(role) => users.push(User {
                    id: record.id,
                    fullname: record.fullname,
                    email: record.email,
                    role,
                }),
                None => {
                    warn!("Skipping user {} with unknown role '{}'", record.id, record.role);
                }
            }
        }

        info!("Loaded {} users from {}", users.len(), path);
        Ok(Self { users })
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn get_user(&self, id: &str) -> ServiceResult<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_role(&self, role: Role) -> ServiceResult<Vec<User>> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }
}

/// In-memory room catalog, loaded once at startup.
pub struct StaticRoomCatalog {
    rooms: Vec<Room>,
}

#[derive(Debug, Deserialize)]
struct RoomRecord {
    id: String,
    name: String,
    capacity: u32,
}

impl StaticRoomCatalog {
    pub fn from_rooms(rooms: Vec<Room>) -> Self {
        Self { rooms }
    }

    /// Loads rooms from a CSV file with columns id,name,capacity.
    pub fn load_csv(path: &str) -> ServiceResult<Self> {
        let file = File::open(path)
            .map_err(|e| ServiceError::store(format!("Failed to open rooms file {}: {}", path, e)))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut rooms = Vec::new();

        for result in reader.deserialize::<RoomRecord>() {
            let record = result
                .map_err(|e| ServiceError::store(format!("Failed to read room record: {}", e)))?;
            if record.capacity == 0 {
                warn!("Skipping room {} with zero capacity", record.id);
                continue;
            }
            rooms.push(Room {
                id: record.id,
                name: record.name,
                capacity: record.capacity,
            });
        }

        info!("Loaded {} rooms from {}", rooms.len(), path);
        Ok(Self { rooms })
    }
}

#[async_trait]
impl RoomCatalog for StaticRoomCatalog {
    async fn get_room(&self, id: &str) -> ServiceResult<Option<Room>> {
        Ok(self.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn list_rooms(&self) -> ServiceResult<Vec<Room>> {
        Ok(self.rooms.clone())
    }
}
