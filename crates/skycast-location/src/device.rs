//! Device location collaborators.
//!
//! The real providers ship with the host platform; this module only defines
//! the gate the resolver talks through, plus a default for hosts without
//! location services.

use crate::types::{DeviceProvider, LocationError};

/// Access to the platform's last-known-location providers.
///
/// `last_known` is only consulted after `permission_granted` returns true,
/// but implementations may still report `PermissionDenied` if the grant is
/// revoked between the two calls.
pub trait DeviceLocation: Send + Sync {
    /// Whether the location permission is currently granted.
    fn permission_granted(&self) -> bool;

    /// Last known coordinates from the given provider, if it holds any.
    ///
    /// # Errors
    /// Returns a `LocationError` when the provider cannot be consulted at
    /// all; a provider that simply has no stored position returns `Ok(None)`.
    fn last_known(
        &self,
        provider: DeviceProvider,
    ) -> Result<Option<(f64, f64)>, LocationError>;
}

/// Default collaborator: no permission, no providers.
pub struct UnavailableDeviceLocation;

impl DeviceLocation for UnavailableDeviceLocation {
    fn permission_granted(&self) -> bool {
        false
    }

    fn last_known(
        &self,
        _provider: DeviceProvider,
    ) -> Result<Option<(f64, f64)>, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}
