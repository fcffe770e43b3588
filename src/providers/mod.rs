//! Photo provider adapters
//!
//! One adapter per external photo source, all behind the [`PhotoProvider`]
//! trait. The factory assembles the registry map from configuration.

pub mod factory;
pub mod flickr;
pub mod google_places;
pub mod pexels;
pub mod traits;
pub mod tripadvisor;
pub mod unsplash;

pub use factory::create_providers;
pub use flickr::FlickrProvider;
pub use google_places::GooglePlacesProvider;
pub use pexels::PexelsProvider;
pub use traits::PhotoProvider;
pub use tripadvisor::TripAdvisorProvider;
pub use unsplash::UnsplashProvider;
