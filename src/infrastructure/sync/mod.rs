pub mod channel_sync;

pub use channel_sync::{ChannelBackgroundSync, SyncTagReceiver, detect_background_sync};
