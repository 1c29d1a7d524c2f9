//! Sensor arrays for sensim.
//!
//! A [`SensorArray`] binds sensor geometry to a field and up to two error
//! chains (systematic and random). Truth, errors and measurements are
//! computed lazily and cached; changing any input invalidates every cache.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod descriptor;
pub mod error;
pub mod sensor_array;
pub mod tools;

pub use cache::Cached;
pub use descriptor::SensorDescriptor;
pub use error::SensorArrayError;
pub use sensor_array::SensorArray;
pub use tools::sensor_grid;
