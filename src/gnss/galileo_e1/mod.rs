
pub const E1_CODE_CHIP_RATE_HZ:f64 = 1.023e6;
pub const E1_B_CODE_LENGTH_CHIPS:usize = 4092;
pub const E1_CODE_PERIOD_SEC:f64 = 4.0e-3;

pub mod signal_modulation;

pub mod tracking;
