// roomprops: last-write-wins cosmetic property sync for shared rooms

pub mod avatar;
pub mod config;
pub mod gun;
pub mod room;
pub mod sync;
pub mod utils;

// Re-export commonly used types for convenience
pub use room::{Peer, PeerId, RoomBus, RoomClient, RoomEvent};
pub use sync::{Catalogue, CosmeticKind, PropertySyncEngine, SyncError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
