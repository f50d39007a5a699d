//! Location resolution for the weather pipelines.
//!
//! Sources are tried in a fixed order: IP geolocation first, then the
//! device's fused and network last-known positions. The first fix wins, and
//! an exhausted cascade yields no location rather than an error.

pub mod device;
pub mod geoip;
pub mod resolver;
pub mod types;

pub use device::{DeviceLocation, UnavailableDeviceLocation};
pub use geoip::IpLocator;
pub use resolver::LocationResolver;
pub use types::{DeviceProvider, FixSource, LocationError, LocationFix};
