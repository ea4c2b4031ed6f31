
use serde::{Serialize, Deserialize};

/// Per-epoch synchronization record passed from tracking to the telemetry and PVT
/// stages.  The acquisition stage fills the `acq_*` triplet (and system/PRN) before
/// handing the record to a tracking channel; tracking copies those through and fills
/// the rest once per PRN epoch.
///
/// `prompt_i` intentionally carries the imaginary arm of the prompt correlator and
/// `prompt_q` the real arm; downstream decoders were built against that convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GnssSynchro {
	pub system: char,
	pub prn: usize,
	pub acq_delay_samples: f64,
	pub acq_doppler_hz: f64,
	pub acq_samplestamp_samples: u64,
	pub prompt_i: f64,
	pub prompt_q: f64,
	pub tracking_timestamp_secs: f64,
	pub code_phase_secs: f64,
	pub carrier_phase_rads: f64,
	pub cn0_db_hz: f64,
}

impl Default for GnssSynchro {

	fn default() -> Self {
		Self { system: ' ', prn: 0,
			acq_delay_samples: 0.0, acq_doppler_hz: 0.0, acq_samplestamp_samples: 0,
			prompt_i: 0.0, prompt_q: 0.0,
			tracking_timestamp_secs: 0.0, code_phase_secs: 0.0,
			carrier_phase_rads: 0.0, cn0_db_hz: 0.0 }
	}

}
