//! Hardware timer module using ESP-IDF's esp_timer API.
//!
//! Creates periodic timers that flag events for the main loop.
//! On simulation targets, the main loop sleeps and pushes ticks itself.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can safely call push_event(), a single atomic fetch_or.

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Watchdog heartbeat period.
pub const WATCHDOG_TICK_MS: u32 = 5_000;

#[cfg(target_os = "espidf")]
static mut CONTROL_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut WATCHDOG_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: CONTROL_TIMER is written once in `start_timers()` before any
/// timer callbacks fire.  Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn control_timer() -> esp_timer_handle_t { unsafe { CONTROL_TIMER } }

/// SAFETY: Same invariants as `control_timer()`.
#[cfg(target_os = "espidf")]
unsafe fn watchdog_timer() -> esp_timer_handle_t { unsafe { WATCHDOG_TIMER } }

#[cfg(target_os = "espidf")]
unsafe extern "C" fn control_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::ControlTick);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn watchdog_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::WatchdogTick);
}

/// Create and start one periodic timer.  Returns `false` on failure.
#[cfg(target_os = "espidf")]
unsafe fn start_periodic(
    handle: *mut esp_timer_handle_t,
    callback: unsafe extern "C" fn(*mut core::ffi::c_void),
    name: &'static [u8],
    period_ms: u32,
) -> bool {
    let args = esp_timer_create_args_t {
        callback: Some(callback),
        arg: core::ptr::null_mut(),
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: name.as_ptr() as *const _,
        skip_unhandled_events: true,
    };
    let ret = unsafe { esp_timer_create(&args, handle) };
    if ret != ESP_OK {
        log::error!("hw_timer: create failed (rc={})", ret);
        return false;
    }
    let ret = unsafe { esp_timer_start_periodic(*handle, u64::from(period_ms) * 1_000) };
    if ret != ESP_OK {
        log::error!("hw_timer: start failed (rc={})", ret);
        return false;
    }
    true
}

/// Start the hardware tick timers.
///
/// - control tick at `control_interval_ms`
/// - watchdog heartbeat at [`WATCHDOG_TICK_MS`]
#[cfg(target_os = "espidf")]
pub fn start_timers(control_interval_ms: u32) {
    // SAFETY: the handles are written here once at boot from the single
    // main-task context before any timer callbacks fire.  The callbacks
    // themselves only call push_event(), which is ISR-safe.
    unsafe {
        if !start_periodic(&raw mut CONTROL_TIMER, control_tick_cb, b"control\0", control_interval_ms) {
            log::error!("hw_timer: continuing without control ticks");
            return;
        }
        if !start_periodic(&raw mut WATCHDOG_TIMER, watchdog_tick_cb, b"wdt\0", WATCHDOG_TICK_MS) {
            log::error!("hw_timer: continuing without watchdog ticks");
            return;
        }
    }
    log::info!("hw_timer: control@{}ms + watchdog@{}ms started", control_interval_ms, WATCHDOG_TICK_MS);
}

#[cfg(not(target_os = "espidf"))]
pub fn start_timers(control_interval_ms: u32) {
    log::info!(
        "hw_timer(sim): timers not started, loop sleeps {} ms per tick",
        control_interval_ms
    );
}

/// Stop all hardware tick timers.
#[cfg(target_os = "espidf")]
pub fn stop_timers() {
    // SAFETY: handles are valid if start_timers() succeeded; the null
    // check covers the failure path.
    unsafe {
        let ct = control_timer();
        if !ct.is_null() { esp_timer_stop(ct); }
        let wt = watchdog_timer();
        if !wt.is_null() { esp_timer_stop(wt); }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_timers() {}
