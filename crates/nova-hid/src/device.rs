//! Arctis Nova Pro base station detection.

use std::ffi::{CStr, CString};

use hidapi::HidApi;
use tracing::{debug, info};

use crate::error::{HidError, HidResult};

/// SteelSeries USB Vendor ID
pub const STEELSERIES_VID: u16 = 0x1038;
/// Arctis Nova Pro Wireless and Wired product IDs
pub const NOVA_PRO_PIDS: [u16; 4] = [0x12E0, 0x12E5, 0x12CB, 0x12CD];
/// bInterfaceNumber of the control interface
pub const CONTROL_INTERFACE: i32 = 4;

/// USB identity of the device to control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIds {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// Accepted product IDs, in order of preference
    pub product_ids: Vec<u16>,
    /// Control interface number
    pub interface: i32,
}

impl Default for DeviceIds {
    fn default() -> Self {
        Self {
            vendor_id: STEELSERIES_VID,
            product_ids: NOVA_PRO_PIDS.to_vec(),
            interface: CONTROL_INTERFACE,
        }
    }
}

/// An enumerated HID interface.
#[derive(Debug, Clone)]
pub struct HidCandidate<'a> {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface_number: i32,
    pub path: &'a CStr,
}

/// Pick the control interface among enumerated HID interfaces.
///
/// Product IDs are tried in order; within a product ID the first interface
/// with the right number wins.
#[must_use]
pub fn select_device_path<'a>(ids: &DeviceIds, candidates: &[HidCandidate<'a>]) -> Option<&'a CStr> {
    ids.product_ids.iter().find_map(|&pid| {
        candidates
            .iter()
            .find(|c| {
                c.vendor_id == ids.vendor_id
                    && c.product_id == pid
                    && c.interface_number == ids.interface
            })
            .map(|c| c.path)
    })
}

/// Find the device path of the base station's control interface.
///
/// # Errors
/// Returns [`HidError::DeviceNotFound`] if no matching interface is present.
pub fn resolve_device_path(api: &HidApi, ids: &DeviceIds) -> HidResult<CString> {
    let candidates: Vec<HidCandidate<'_>> = api
        .device_list()
        .map(|info| HidCandidate {
            vendor_id: info.vendor_id(),
            product_id: info.product_id(),
            interface_number: info.interface_number(),
            path: info.path(),
        })
        .collect();

    debug!(count = candidates.len(), "Enumerated HID interfaces");

    let path = select_device_path(ids, &candidates).ok_or(HidError::DeviceNotFound)?;
    info!(path = ?path, "Nova Pro base station detected");
    Ok(path.to_owned())
}
