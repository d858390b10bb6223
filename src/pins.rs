//! GPIO / peripheral pin assignments for the ColdGuard controller board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Compressor relay
// ---------------------------------------------------------------------------

/// Digital output: relay coil driver (HIGH = compressor on).
pub const RELAY_COIL_GPIO: i32 = 10;
/// Digital input: auxiliary relay contact (HIGH = contacts closed).
pub const RELAY_FEEDBACK_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// Sensors: analog (ADC1)
// ---------------------------------------------------------------------------

/// Cabinet air NTC, 10 kΩ @ 25 °C, voltage divider to ADC1 channel 3.
pub const AIR_NTC_ADC_GPIO: i32 = 4;
/// Evaporator coil NTC, 10 kΩ @ 25 °C, voltage divider to ADC1 channel 4.
pub const EVAP_NTC_ADC_GPIO: i32 = 5;
/// Current transformer on the compressor supply, ADC1 channel 5.
pub const POWER_CT_ADC_GPIO: i32 = 6;

pub const ADC1_CH_AIR: u32 = 3;
pub const ADC1_CH_EVAP: u32 = 4;
pub const ADC1_CH_POWER: u32 = 5;

// ---------------------------------------------------------------------------
// User input (active-low with external pull-up)
// ---------------------------------------------------------------------------

/// Front-panel override button.
pub const OVERRIDE_BUTTON_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// UART debug / console
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 17;
pub const UART_RX_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Board options
// ---------------------------------------------------------------------------

/// Current transformer populated on this board revision.
pub const POWER_CT_FITTED: bool = true;
/// Auxiliary relay contact wired back to `RELAY_FEEDBACK_GPIO`.
pub const RELAY_FEEDBACK_FITTED: bool = true;
