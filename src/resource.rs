//! Cached resource objects and their handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::kinds::ResourceKind;
use crate::name::ResourceName;

/// GPU-side lifecycle hooks a payload may implement.
///
/// The device abstraction itself lives outside this crate; payloads hold
/// whatever device pointers they need behind interior mutability. Invoked
/// only by the manager's fan-out, never by the cache layer.
pub trait DeviceResources {
    /// Creates device-side allocations. Returns false on failure.
    fn create_device_resources(&self) -> bool {
        true
    }

    /// Releases device-side allocations.
    fn release_device_resources(&self) {}
}

/// Shared-ownership handle to a cached resource. The store's own hold is
/// one such handle; the resource is destroyed when the last one drops.
pub type ResourceHandle<K> = Arc<Resource<K>>;

/// One loaded resource: kind tag, name, payload and the device-resource
/// state machine, which is independent of the refcounted lifetime.
pub struct Resource<K: ResourceKind> {
    name: ResourceName,
    payload: K::Payload,
    device_created: AtomicBool,
}

impl<K: ResourceKind> Resource<K> {
    #[must_use]
    pub fn new(name: ResourceName, payload: K::Payload) -> Self {
        Self {
            name,
            payload,
            device_created: AtomicBool::new(false),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &K::Payload {
        &self.payload
    }

    /// Kind label, e.g. `"material"`. Used in logs and dispatch.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        K::LABEL
    }

    #[inline]
    #[must_use]
    pub fn has_device_resources(&self) -> bool {
        self.device_created.load(Ordering::Acquire)
    }

    /// NoDeviceResources -> DeviceResourcesCreated. Idempotent.
    pub fn ensure_device_resources(&self) -> bool {
        if self.device_created.load(Ordering::Acquire) {
            return true;
        }
        if self.payload.create_device_resources() {
            self.device_created.store(true, Ordering::Release);
            true
        } else {
            log::error!("failed to create device resources for {} '{}'", K::LABEL, self.name);
            false
        }
    }

    /// DeviceResourcesCreated -> NoDeviceResources. Idempotent.
    pub fn release_device_resources(&self) {
        if self.device_created.swap(false, Ordering::AcqRel) {
            self.payload.release_device_resources();
        }
    }
}

impl<K: ResourceKind> Drop for Resource<K> {
    fn drop(&mut self) {
        // Device allocations must not outlive the CPU-side object.
        if self.device_created.load(Ordering::Acquire) {
            self.payload.release_device_resources();
        }
    }
}
