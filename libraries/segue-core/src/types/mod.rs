mod ids;
mod track;

pub use ids::TrackId;
pub use track::{GeoLocation, ProviderKind, SharedTrack, Track, TrackMetadata};
