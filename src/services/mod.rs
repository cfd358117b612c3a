// Service exports
pub mod appwrite;
pub mod location;
pub mod postgres;
pub mod sessions;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError, AppwriteProfileSource, ProfilePage};
pub use location::DeviceLocation;
pub use postgres::{PostgresClient, PostgresError};
pub use sessions::{SessionHandle, SessionRegistry};
