//! Wireless link: BLE GATT server.
//!
//! The perception unit connects as a central and writes one reading per
//! update to the reading characteristic. Connect, disconnect and write
//! callbacks become [`LinkCommand`]s on the inbound queue; the ingest task
//! does the rest.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID16   | Perms       | Payload                         |
//! |----------------|----------|-------------|---------------------------------|
//! | (service)      | `0x181A` | -           | Environmental Sensing           |
//! | Status         | `0xFEF4` | Read        | JSON: pattern, link, reading    |
//! | Reading        | `0xDEAD` | Write       | `"s, d, near, far"`             |
//!
//! A write that is empty or all whitespace is a keep-alive heartbeat.

use core::sync::atomic::{AtomicU8, Ordering};

use log::info;
use serde::Serialize;

use crate::app::commands::LinkCommand;
use crate::fsm::{classify_snapshot, AlertPattern};
use crate::reading::Reading;
use crate::state::LinkSnapshot;

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID16: u16 = 0x181A;
pub const CHAR_STATUS_UUID16: u16 = 0xFEF4;
pub const CHAR_READING_UUID16: u16 = 0xDEAD;

/// Upper bound on the status JSON; longer reports are cut.
pub const MAX_STATUS_BYTES: usize = 160;

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BleState {
    Idle = 0,
    Advertising = 1,
    Connected = 2,
    Failed = 3,
}

impl BleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Advertising,
            2 => Self::Connected,
            3 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures; the link state lives in a static so both sides see it.
static BLE_STATE: AtomicU8 = AtomicU8::new(BleState::Idle as u8);

fn set_state(state: BleState) {
    BLE_STATE.store(state as u8, Ordering::Release);
}

pub fn ble_state() -> BleState {
    BleState::from_u8(BLE_STATE.load(Ordering::Acquire))
}

// ───────────────────────────────────────────────────────────────
// Callback translation (platform-independent)
// ───────────────────────────────────────────────────────────────

/// Map a reading-characteristic write to the command it stands for.
pub fn classify_write(raw: &[u8]) -> LinkCommand {
    if raw.iter().all(|b| b.is_ascii_whitespace() || *b == 0) {
        LinkCommand::Heartbeat
    } else {
        LinkCommand::from_bytes(raw)
    }
}

pub fn on_central_connected(conn_id: u16) -> LinkCommand {
    info!("BLE: central connected (conn_id={})", conn_id);
    set_state(BleState::Connected);
    LinkCommand::Connected(conn_id)
}

/// The caller restarts advertising; the state reflects that.
pub fn on_central_disconnected() -> LinkCommand {
    info!("BLE: central disconnected");
    if ble_state() != BleState::Idle {
        set_state(BleState::Advertising);
    }
    LinkCommand::Disconnected
}

// ───────────────────────────────────────────────────────────────
// Status characteristic
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusReport {
    pattern: AlertPattern,
    connected: bool,
    reading: Option<Reading>,
}

/// Render the status characteristic value for `snapshot`.
pub fn status_json(snapshot: &LinkSnapshot) -> heapless::Vec<u8, MAX_STATUS_BYTES> {
    let report = StatusReport {
        pattern: classify_snapshot(snapshot),
        connected: snapshot.connection.is_connected(),
        reading: snapshot.reading,
    };
    let mut out = heapless::Vec::new();
    if let Ok(bytes) = serde_json::to_vec(&report) {
        let n = bytes.len().min(MAX_STATUS_BYTES);
        let _ = out.extend_from_slice(&bytes[..n]);
    }
    out
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF Bluedroid glue
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp_impl {
    use core::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
    use std::sync::OnceLock;

    use esp_idf_svc::sys::*;
    use log::{error, info, warn};

    use super::*;
    use crate::events;
    use crate::state::SharedState;

    pub(super) static STATUS_SOURCE: OnceLock<&'static SharedState> = OnceLock::new();

    static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
    static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
    static BLE_STATUS_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
    static BLE_READING_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
    static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);

    /// Service UUID in 128-bit little-endian form for the advertising payload.
    static ADV_SERVICE_UUID: [u8; 16] = [
        0xfb, 0x34, 0x9b, 0x5f, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00,
        (SERVICE_UUID16 & 0xff) as u8, (SERVICE_UUID16 >> 8) as u8, 0x00, 0x00,
    ];

    fn uuid16_to_esp(uuid: u16) -> esp_bt_uuid_t {
        let mut t: esp_bt_uuid_t = unsafe { core::mem::zeroed() };
        t.len = ESP_UUID_LEN_16 as u16;
        t.uuid.uuid16 = uuid;
        t
    }

    unsafe fn add_gatt_char(svc_handle: u16, uuid: u16, perm: u32, prop: u32) {
        let mut char_uuid = uuid16_to_esp(uuid);
        unsafe {
            esp_ble_gatts_add_char(
                svc_handle,
                &mut char_uuid,
                perm as esp_gatt_perm_t,
                prop as esp_gatt_char_prop_t,
                core::ptr::null_mut(),
                core::ptr::null_mut(),
            );
        }
    }

    fn adv_params() -> esp_ble_adv_params_t {
        esp_ble_adv_params_t {
            adv_int_min: 0x20,
            adv_int_max: 0x40,
            adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
            own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
            channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
            adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
            ..unsafe { core::mem::zeroed() }
        }
    }

    pub(super) fn start_advertising() {
        let mut params = adv_params();
        unsafe {
            esp_ble_gap_start_advertising(&mut params);
        }
    }

    pub(super) unsafe extern "C" fn ble_gap_event_handler(
        event: esp_gap_ble_cb_event_t,
        _param: *mut esp_ble_gap_cb_param_t,
    ) {
        match event {
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
                start_advertising();
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
                info!("BLE GAP: advertising started");
            }
            esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
                info!("BLE GAP: advertising stopped");
            }
            _ => {}
        }
    }

    pub(super) unsafe extern "C" fn ble_gatts_event_handler(
        event: esp_gatts_cb_event_t,
        gatts_if: esp_gatt_if_t,
        param: *mut esp_ble_gatts_cb_param_t,
    ) {
        BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);

        match event {
            esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
                info!("BLE GATTS: app registered (if={})", gatts_if);
                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t {
                        uuid: uuid16_to_esp(SERVICE_UUID16),
                        inst_id: 0,
                    },
                    is_primary: true,
                };
                unsafe {
                    esp_ble_gatts_create_service(gatts_if, &mut svc_id, 6);
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
                let svc_handle = unsafe { (*param).create.service_handle };
                BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
                info!("BLE GATTS: service created (handle={})", svc_handle);
                BLE_CHAR_STEP.store(1, AtomicOrdering::Relaxed);
                unsafe {
                    esp_ble_gatts_start_service(svc_handle);
                    add_gatt_char(
                        svc_handle,
                        CHAR_STATUS_UUID16,
                        ESP_GATT_PERM_READ,
                        ESP_GATT_CHAR_PROP_BIT_READ,
                    );
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
                let handle = unsafe { (*param).add_char.attr_handle };
                let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
                match BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) {
                    1 => {
                        BLE_STATUS_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
                        info!("BLE GATTS: status char (handle={})", handle);
                        BLE_CHAR_STEP.store(2, AtomicOrdering::Relaxed);
                        unsafe {
                            add_gatt_char(
                                svc_handle,
                                CHAR_READING_UUID16,
                                ESP_GATT_PERM_WRITE,
                                ESP_GATT_CHAR_PROP_BIT_WRITE | ESP_GATT_CHAR_PROP_BIT_WRITE_NR,
                            );
                        }
                    }
                    2 => {
                        BLE_READING_CHAR_HANDLE.store(handle as u32, AtomicOrdering::Relaxed);
                        BLE_CHAR_STEP.store(3, AtomicOrdering::Relaxed);
                        info!("BLE GATTS: reading char (handle={}), all registered", handle);
                    }
                    _ => {}
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
                let conn_id = unsafe { (*param).connect.conn_id };
                events::push_blocking(on_central_connected(conn_id));
            }
            esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
                events::push_blocking(on_central_disconnected());
                start_advertising();
            }
            esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
                let p = unsafe { &(*param).write };
                if p.handle as u32 == BLE_READING_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                    let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                    events::push(classify_write(data));
                }
                if p.need_rsp {
                    unsafe {
                        esp_ble_gatts_send_response(
                            gatts_if,
                            p.conn_id,
                            p.trans_id,
                            esp_gatt_status_t_ESP_GATT_OK,
                            core::ptr::null_mut(),
                        );
                    }
                }
            }
            esp_gatts_cb_event_t_ESP_GATTS_READ_EVT => {
                let p = unsafe { &(*param).read };
                let payload = STATUS_SOURCE
                    .get()
                    .map(|state| status_json(&state.snapshot()))
                    .unwrap_or_default();
                let offset = (p.offset as usize).min(payload.len());
                let body = &payload[offset..];

                let mut rsp: esp_gatt_rsp_t = unsafe { core::mem::zeroed() };
                unsafe {
                    let n = body.len().min(rsp.attr_value.value.len());
                    rsp.attr_value.handle = p.handle;
                    rsp.attr_value.offset = p.offset;
                    rsp.attr_value.len = n as u16;
                    rsp.attr_value.value[..n].copy_from_slice(&body[..n]);
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        &mut rsp,
                    );
                }
            }
            _ => {}
        }
    }

    pub(super) fn platform_start(device_name: &str) -> bool {
        let Ok(name) = std::ffi::CString::new(device_name) else {
            error!("BLE: device name contains NUL");
            return false;
        };
        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                error!("BLE: bt_controller_init failed ({})", ret);
                return false;
            }
            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                error!("BLE: bt_controller_enable failed ({})", ret);
                return false;
            }
            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                error!("BLE: bluedroid_init failed ({})", ret);
                return false;
            }
            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                error!("BLE: bluedroid_enable failed ({})", ret);
                return false;
            }

            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            esp_ble_gatts_app_register(0);

            esp_ble_gap_set_device_name(name.as_ptr());

            // Advertising starts from ADV_DATA_SET_COMPLETE.
            let mut adv_data = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                min_interval: 0x0006,
                max_interval: 0x0010,
                appearance: 0,
                manufacturer_len: 0,
                p_manufacturer_data: core::ptr::null_mut(),
                service_data_len: 0,
                p_service_data: core::ptr::null_mut(),
                service_uuid_len: ADV_SERVICE_UUID.len() as u16,
                p_service_uuid: ADV_SERVICE_UUID.as_ptr().cast_mut(),
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
            };
            let ret = esp_ble_gap_config_adv_data(&mut adv_data);
            if ret != ESP_OK as i32 {
                warn!("BLE: config_adv_data failed ({}), advertising without payload", ret);
                start_advertising();
            }
        }
        true
    }

    pub(super) fn platform_stop() {
        unsafe {
            esp_ble_gap_stop_advertising();
            esp_bluedroid_disable();
            esp_bluedroid_deinit();
            esp_bt_controller_disable();
            esp_bt_controller_deinit();
        }
        info!("BLE(espidf): stack shut down");
    }
}

// ───────────────────────────────────────────────────────────────
// BLE link
// ───────────────────────────────────────────────────────────────

/// Owns the BLE stack lifecycle.
pub struct BleLink {
    device_name: heapless::String<24>,
}

impl BleLink {
    /// `state` backs the status characteristic; it must outlive the stack.
    pub fn new(device_name: heapless::String<24>, state: &'static crate::state::SharedState) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let _ = esp_impl::STATUS_SOURCE.set(state);
        }
        #[cfg(not(target_os = "espidf"))]
        let _ = state;
        Self { device_name }
    }

    pub fn start(&mut self) {
        info!("BLE: starting advertising as '{}'", self.device_name);
        if self.platform_start() {
            set_state(BleState::Advertising);
        } else {
            set_state(BleState::Failed);
        }
    }

    pub fn stop(&mut self) {
        self.platform_stop();
        set_state(BleState::Idle);
        info!("BLE: stopped");
    }

    pub fn state(&self) -> BleState {
        ble_state()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state(), BleState::Advertising | BleState::Connected)
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> bool {
        esp_impl::platform_start(&self.device_name)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> bool {
        info!(
            "BLE(sim): advertising '{}' (service {:04x})",
            self.device_name, SERVICE_UUID16
        );
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        esp_impl::platform_stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        info!("BLE(sim): stopped");
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
