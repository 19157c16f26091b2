// The clients defined here are reqwest clients for the REST backend.

pub mod auth;
pub mod rooms;

pub use auth::{AuthClientError, LoginRequest, RegisterRequest, RestAuthClient, SystemClock, User};
pub use rooms::{CreateRoomRequest, Room, RoomsClient, RoomsClientError};
