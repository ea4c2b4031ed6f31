
use std::f64::consts;
use std::sync::mpsc::Sender;

use rustfft::num_complex::Complex;
use serde::{Serialize, Deserialize};

use crate::filters::{ScalarFilter, SecondOrderLoopFilter};
use crate::gnss::channel::{ChannelCommand, ChannelMessage};
use crate::gnss::galileo_e1::{signal_modulation, E1_B_CODE_LENGTH_CHIPS, E1_CODE_CHIP_RATE_HZ, E1_CODE_PERIOD_SEC};
use crate::gnss::synchro::GnssSynchro;
use crate::gnss::tracking::correlator::{self, VemlOutput};
use crate::gnss::tracking::discriminators;
use crate::gnss::tracking::lock_detectors;
use crate::utils::AlignedVec;

pub mod dump;


use self::dump::{DumpRecord, TrackingDump};

pub const CN0_ESTIMATION_SAMPLES:usize = 10;
pub const MINIMUM_VALID_CN0_DB_HZ:f64 = 25.0;
pub const MAXIMUM_LOCK_FAIL_COUNTER:usize = 200;

/* The unlock comparison below is |lock_test| > threshold, inherited from the
reference receiver even though the narrowband statistic approaches +1 when the
carrier is phase locked.  With the statistic bounded by 1 the arm is unreachable at
this threshold, which is exactly how the reference behaves: in practice every
unlock decision comes from the C/N0 floor.  Lowering this below 1 under the
inverted comparison would shut down every healthy channel after ~200 epochs. */
pub const CARRIER_LOCK_THRESHOLD:f64 = 20.0;

const TWO_PI:f64 = 2.0 * consts::PI;
const ZERO:Complex<f64> = Complex{ re: 0.0, im: 0.0 };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
	pub if_freq_hz:f64,
	pub fs_in_hz:f64,
	/// Nominal samples per PRN period at fs_in_hz
	pub vector_length:usize,
	pub dump:bool,
	pub dump_filename:String,
	pub pll_bw_hz:f64,
	pub dll_bw_hz:f64,
	pub early_late_space_chips:f64,
	pub very_early_late_space_chips:f64,
}

impl Default for TrackingConfig {

	fn default() -> Self {
		Self { if_freq_hz: 0.0, fs_in_hz: 4.0e6, vector_length: 16000,
			dump: false, dump_filename: String::from("./tracking_ch"),
			pll_bw_hz: 15.0, dll_bw_hz: 2.0,
			early_late_space_chips: 0.15, very_early_late_space_chips: 0.6 }
	}

}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TrackingState {
	/// Initial state, re-entered on loss of lock; awaits an acquisition handoff
	Idle,
	/// Handoff received; the next call aligns the sample stream to the PRN start
	PullIn,
	/// Producing one correlated epoch per call
	Running,
}

#[derive(Debug)]
pub enum TrackingResult {
	/// Tracking is disabled; samples were still consumed to keep the stream moving
	Disabled{ num_consumed:usize, synchro:GnssSynchro },
	/// Pull-in alignment consumed samples without correlating
	PullIn{ num_consumed:usize, synchro:GnssSynchro },
	/// One full PRN epoch was correlated and the loops updated
	Epoch{ num_consumed:usize, synchro:GnssSynchro },
	/// The epoch completed but the lock monitor tripped; tracking is now disabled
	LossOfLock{ num_consumed:usize, synchro:GnssSynchro },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingDebug {
	pub abs_very_early:f64,
	pub abs_early:f64,
	pub abs_prompt:f64,
	pub abs_late:f64,
	pub abs_very_late:f64,
	pub carrier_doppler_hz:f64,
	pub code_freq_hz:f64,
	pub carr_error_cycles:f64,
	pub code_error_chips:f64,
	pub cn0_db_hz:f64,
	pub carrier_lock_test:f64,
	pub sample_counter:u64,
}

pub struct Tracking {
	// Immutable configuration
	fs_in:f64,
	if_freq_hz:f64,
	vector_length:usize,
	early_late_spc_chips:f64,
	very_early_late_spc_chips:f64,
	dump_enabled:bool,
	dump_filename:String,
	channel:usize,

	carrier_loop_filter: SecondOrderLoopFilter,
	code_loop_filter: SecondOrderLoopFilter,

	// Acquisition handoff
	acquisition_synchro:Option<GnssSynchro>,
	synchro_template:GnssSynchro,
	acq_code_phase_samples:f64,
	acq_carrier_doppler_hz:f64,
	acq_sample_stamp:u64,

	state:TrackingState,

	// NCO state
	code_freq_hz:f64,
	carrier_doppler_hz:f64,
	code_phase_step_chips:f64,
	rem_code_phase_samples:f64,
	next_rem_code_phase_samples:f64,
	rem_carr_phase_rad:f64,
	acc_carrier_phase_rad:f64,
	current_prn_length_samples:usize,
	next_prn_length_samples:usize,
	sample_counter:u64,

	// Long-lived local code: sinBOC(1,1) at two samples per chip with a two-sample
	// cyclic guard on each end, so any rounded lookup stays in bounds
	ca_code:Vec<Complex<f64>>,

	// Per-epoch scratch, aligned for the vectorized correlator.  The very-early
	// array is the guard-extended super-array; the other four taps are views into it
	very_early_code:AlignedVec,
	carr_sign:AlignedVec,

	// Lock monitor
	prompt_buffer:[Complex<f64>; CN0_ESTIMATION_SAMPLES],
	cn0_counter:usize,
	carrier_lock_fail_counter:usize,
	cn0_snv_db_hz:f64,
	carrier_lock_test:f64,

	last_veml:VemlOutput,
	last_carr_error_cycles:f64,
	last_code_error_chips:f64,

	last_seg:u64,

	dump:TrackingDump,
	queue:Option<Sender<ChannelMessage>>,
}

impl Tracking {

	pub fn state(&self) -> TrackingState { self.state }
	pub fn vector_length(&self) -> usize { self.vector_length }
	pub fn sample_counter(&self) -> u64 { self.sample_counter }
	pub fn carrier_doppler_hz(&self) -> f64 { self.carrier_doppler_hz }
	pub fn code_freq_hz(&self) -> f64 { self.code_freq_hz }
	pub fn rem_carr_phase_rad(&self) -> f64 { self.rem_carr_phase_rad }
	pub fn acc_carrier_phase_rad(&self) -> f64 { self.acc_carrier_phase_rad }
	pub fn cn0_snv_db_hz(&self) -> f64 { self.cn0_snv_db_hz }
	pub fn carrier_lock_test(&self) -> f64 { self.carrier_lock_test }

	pub fn debug(&self) -> TrackingDebug {
		TrackingDebug {
			abs_very_early: self.last_veml.very_early.norm(),
			abs_early:      self.last_veml.early.norm(),
			abs_prompt:     self.last_veml.prompt.norm(),
			abs_late:       self.last_veml.late.norm(),
			abs_very_late:  self.last_veml.very_late.norm(),
			carrier_doppler_hz: self.carrier_doppler_hz,
			code_freq_hz: self.code_freq_hz,
			carr_error_cycles: self.last_carr_error_cycles,
			code_error_chips: self.last_code_error_chips,
			cn0_db_hz: self.cn0_snv_db_hz,
			carrier_lock_test: self.carrier_lock_test,
			sample_counter: self.sample_counter,
		}
	}

	/// Binds this tracker to a channel index and opens the dump file if dumping is
	/// configured.  A dump-open failure disables the dump and nothing else.
	pub fn set_channel(&mut self, channel:usize) {
		self.channel = channel;
		if self.dump_enabled && !self.dump.is_open() {
			let filename = format!("{}_{}.dat", self.dump_filename, channel);
			match TrackingDump::open(&filename) {
				Ok(d) => {
					self.dump = d;
					eprintln!("Tracking dump enabled on channel {}, log file {}", channel, filename);
				},
				Err(e) => eprintln!("Tracking channel {}: {} ({})", channel, e, filename),
			}
		}
	}

	pub fn set_channel_queue(&mut self, queue:Sender<ChannelMessage>) {
		self.queue = Some(queue);
	}

	/// Binds the acquisition-handoff record that the next start_tracking() reads
	pub fn set_gnss_synchro(&mut self, synchro:GnssSynchro) {
		self.acquisition_synchro = Some(synchro);
	}

	/// Resets all per-handoff state from the bound acquisition record and arms the
	/// pull-in alignment.  Repeating set_gnss_synchro + start_tracking restarts the
	/// channel from scratch; only the stream position survives.
	pub fn start_tracking(&mut self) -> Result<(), &'static str> {
		let handoff = self.acquisition_synchro.clone().ok_or("No acquisition handoff has been bound to this channel")?;

		self.acq_code_phase_samples = handoff.acq_delay_samples;
		self.acq_carrier_doppler_hz = handoff.acq_doppler_hz + self.if_freq_hz;
		self.acq_sample_stamp = handoff.acq_samplestamp_samples;

		self.carrier_loop_filter.initialize();
		self.code_loop_filter.initialize();

		// Local sinBOC(1,1) replica starting at offset 2, then the cyclic guard:
		// the first two entries mirror the end of the code and the last two mirror
		// its start
		let code = signal_modulation::e1b_sinboc11_complex(handoff.prn);
		let code_len = 2 * E1_B_CODE_LENGTH_CHIPS;
		self.ca_code[2 .. 2 + code_len].copy_from_slice(&code);
		self.ca_code[0] = self.ca_code[code_len];
		self.ca_code[1] = self.ca_code[code_len + 1];
		self.ca_code[code_len + 2] = self.ca_code[2];
		self.ca_code[code_len + 3] = self.ca_code[3];

		self.carrier_lock_fail_counter = 0;
		self.cn0_counter = 0;
		self.prompt_buffer = [ZERO; CN0_ESTIMATION_SAMPLES];
		self.cn0_snv_db_hz = 0.0;
		self.carrier_lock_test = 1.0;

		self.rem_code_phase_samples = 0.0;
		self.next_rem_code_phase_samples = 0.0;
		self.rem_carr_phase_rad = 0.0;
		self.acc_carrier_phase_rad = 0.0;

		self.code_freq_hz = E1_CODE_CHIP_RATE_HZ;
		self.code_phase_step_chips = self.code_freq_hz / self.fs_in;
		self.carrier_doppler_hz = self.acq_carrier_doppler_hz;

		self.current_prn_length_samples = self.vector_length;
		self.next_prn_length_samples = self.vector_length;

		self.last_veml = VemlOutput{ very_early: ZERO, early: ZERO, prompt: ZERO, late: ZERO, very_late: ZERO };
		self.last_carr_error_cycles = 0.0;
		self.last_code_error_chips = 0.0;

		self.synchro_template = handoff;
		self.state = TrackingState::PullIn;

		eprintln!("Tracking start on channel {} for satellite {}{:02}: doppler {:.1} [Hz], code phase {:.1} [samples]",
			self.channel, self.synchro_template.system, self.synchro_template.prn,
			self.acq_carrier_doppler_hz, self.acq_code_phase_samples);

		Ok(())
	}

	/// Runs the tracker over the front of `input` and reports how many samples it
	/// consumed.  The caller must supply at least two nominal PRN periods of
	/// samples per call and drop the consumed prefix before the next call.
	pub fn process(&mut self, input:&[Complex<f64>]) -> TrackingResult {
		assert!(input.len() >= 2 * self.vector_length,
			"The scheduler must provide at least two nominal PRN periods per call");

		match self.state {
			TrackingState::Idle => {
				// Keep the stream moving at the nominal epoch rate while disabled
				let num_consumed = self.current_prn_length_samples;
				self.sample_counter += num_consumed as u64;
				TrackingResult::Disabled{ num_consumed, synchro: GnssSynchro::default() }
			},
			TrackingState::PullIn => {
				let acq_to_trk_delay_samples:u64 = self.sample_counter - self.acq_sample_stamp;
				let acq_trk_shift_correction_samples:f64 =
					self.vector_length as f64 - (acq_to_trk_delay_samples as f64 % self.vector_length as f64);
				let samples_offset:usize = (self.acq_code_phase_samples + acq_trk_shift_correction_samples).round() as usize;
				self.sample_counter += samples_offset as u64;
				self.state = TrackingState::Running;
				TrackingResult::PullIn{ num_consumed: samples_offset, synchro: self.synchro_template.clone() }
			},
			TrackingState::Running => self.run_epoch(input),
		}
	}

	fn run_epoch(&mut self, input:&[Complex<f64>]) -> TrackingResult {
		// Variable PRN block size driven by the code NCO
		self.current_prn_length_samples = self.next_prn_length_samples;
		let n = self.current_prn_length_samples;

		let (el_spc_samples, vel_spc_samples) = self.update_local_code();
		self.update_local_carrier();

		// Five-tap correlation; E/P/L/VL are views into the very-early super-array
		let veml = {
			let super_array = self.very_early_code.as_slice();
			let e_ofs = vel_spc_samples - el_spc_samples;
			let p_ofs = vel_spc_samples;
			let l_ofs = vel_spc_samples + el_spc_samples;
			let vl_ofs = 2 * vel_spc_samples;
			correlator::carrier_wipeoff_and_veml(&input[..n], &self.carr_sign.as_slice()[..n],
				&super_array[0 .. n],
				&super_array[e_ofs .. e_ofs + n],
				&super_array[p_ofs .. p_ofs + n],
				&super_array[l_ofs .. l_ofs + n],
				&super_array[vl_ofs .. vl_ofs + n])
		};
		self.last_veml = veml;

		// Carrier loop: two-quadrant atan discriminator, cycles in, Hz out
		let carr_error:f64 = discriminators::pll_two_quadrant_atan(veml.prompt) / TWO_PI;
		let carr_nco:f64 = self.carrier_loop_filter.apply(carr_error);
		self.carrier_doppler_hz = self.acq_carrier_doppler_hz + carr_nco;

		// Code loop: normalized very-early minus very-late power
		let code_error:f64 = discriminators::dll_nc_veml_normalized(veml.very_early, veml.very_late);
		let code_nco:f64 = self.code_loop_filter.apply(code_error);
		self.code_freq_hz = E1_CODE_CHIP_RATE_HZ - code_nco;
		self.code_phase_step_chips = self.code_freq_hz / self.fs_in;

		self.update_epoch_timing();

		self.last_carr_error_cycles = carr_error;
		self.last_code_error_chips = code_error;

		let loss_of_lock = self.cn0_and_lock_monitor(veml.prompt);

		// Output record for the telemetry decoder and PVT, aligned with the PRN
		// start sample (hence code_phase_secs = 0); prompt I/Q keep the downstream
		// swapped convention
		let mut synchro = self.synchro_template.clone();
		synchro.prompt_i = veml.prompt.im;
		synchro.prompt_q = veml.prompt.re;
		synchro.tracking_timestamp_secs =
			(self.sample_counter as f64 + self.next_prn_length_samples as f64 + self.next_rem_code_phase_samples) / self.fs_in;
		synchro.code_phase_secs = 0.0;
		synchro.carrier_phase_rads = self.acc_carrier_phase_rad;
		synchro.cn0_db_hz = self.cn0_snv_db_hz;

		if self.dump.is_open() {
			let record = DumpRecord{
				abs_very_early: veml.very_early.norm() as f32,
				abs_early:      veml.early.norm() as f32,
				abs_prompt:     veml.prompt.norm() as f32,
				abs_late:       veml.late.norm() as f32,
				abs_very_late:  veml.very_late.norm() as f32,
				prompt_i: veml.prompt.im as f32,
				prompt_q: veml.prompt.re as f32,
				sample_counter: self.sample_counter,
				acc_carrier_phase_rad: self.acc_carrier_phase_rad as f32,
				carrier_doppler_hz: self.carrier_doppler_hz as f32,
				code_freq_hz: self.code_freq_hz as f32,
				carr_error: carr_error as f32,
				carr_nco: carr_nco as f32,
				code_error: code_error as f32,
				code_nco: code_nco as f32,
				cn0_db_hz: self.cn0_snv_db_hz as f32,
				carrier_lock_test: self.carrier_lock_test as f32,
				rem_code_phase_samples: self.rem_code_phase_samples as f32,
				prn_start_sample: (self.sample_counter + n as u64) as f64,
			};
			self.dump.write(&record);
		}

		let seg = (self.sample_counter as f64 / self.fs_in).floor() as u64;
		if seg != self.last_seg {
			self.last_seg = seg;
			eprintln!("Tracking channel {}: satellite {}{:02}, CN0 = {:.1} [dB-Hz]",
				self.channel, self.synchro_template.system, self.synchro_template.prn, self.cn0_snv_db_hz);
		}

		self.sample_counter += n as u64;

		if loss_of_lock {
			self.state = TrackingState::Idle;
			TrackingResult::LossOfLock{ num_consumed: n, synchro }
		} else {
			TrackingResult::Epoch{ num_consumed: n, synchro }
		}
	}

	/* Resample the guard-padded local code into the super-array at the current code
	NCO rate.  The array spans one very-early-to-very-late spacing beyond the PRN on
	each side; walking it in half-chips keeps the sinBOC(1,1) subcarrier intact. */
	fn update_local_code(&mut self) -> (usize, usize) {
		let code_length_half_chips:f64 = (2 * E1_B_CODE_LENGTH_CHIPS) as f64;
		let code_phase_step_chips:f64 = self.code_phase_step_chips;
		let code_phase_step_half_chips:f64 = 2.0 * code_phase_step_chips;
		let rem_code_phase_half_chips:f64 = self.rem_code_phase_samples * code_phase_step_half_chips;
		let mut tcode_half_chips:f64 = -rem_code_phase_half_chips;

		let early_late_spc_samples:usize = (self.early_late_spc_chips / code_phase_step_chips).round() as usize;
		let very_early_late_spc_samples:usize = (self.very_early_late_spc_chips / code_phase_step_chips).round() as usize;
		let loop_length_samples:usize = self.current_prn_length_samples + 2 * very_early_late_spc_samples;

		let super_array = self.very_early_code.as_mut_slice();
		for i in 0..loop_length_samples {
			let associated_half_chip_index:usize = 2 +
				(tcode_half_chips - 2.0 * self.very_early_late_spc_chips).rem_euclid(code_length_half_chips).round() as usize;
			super_array[i] = self.ca_code[associated_half_chip_index];
			tcode_half_chips += code_phase_step_half_chips;
		}

		(early_late_spc_samples, very_early_late_spc_samples)
	}

	fn update_local_carrier(&mut self) {
		let phase_step_rad:f64 = TWO_PI * self.carrier_doppler_hz / self.fs_in;
		let mut phase_rad:f64 = self.rem_carr_phase_rad;
		let carr = self.carr_sign.as_mut_slice();
		for i in 0..self.current_prn_length_samples {
			carr[i] = Complex{ re: phase_rad.cos(), im: phase_rad.sin() };
			phase_rad += phase_step_rad;
		}
		self.rem_carr_phase_rad = phase_rad.rem_euclid(TWO_PI);
		self.acc_carrier_phase_rad += self.rem_carr_phase_rad;
	}

	/* Recompute the next variable epoch length from the updated code frequency.
	The fractional sample left over after rounding carries into the next epoch as
	the code-phase residual. */
	fn update_epoch_timing(&mut self) {
		let t_chip_seconds:f64 = 1.0 / self.code_freq_hz;
		let t_prn_seconds:f64 = t_chip_seconds * E1_B_CODE_LENGTH_CHIPS as f64;
		let t_prn_samples:f64 = t_prn_seconds * self.fs_in;
		self.rem_code_phase_samples = self.next_rem_code_phase_samples;
		let k_blk_samples:f64 = t_prn_samples + self.rem_code_phase_samples;
		self.next_prn_length_samples = k_blk_samples.round() as usize;
		self.next_rem_code_phase_samples = k_blk_samples - self.next_prn_length_samples as f64;
	}

	/// Feeds one prompt into the monitor ring; once the ring is primed the C/N0
	/// estimate and lock test run every epoch over the last CN0_ESTIMATION_SAMPLES
	/// prompts.  Returns true when the fail counter trips loss of lock.
	fn cn0_and_lock_monitor(&mut self, prompt:Complex<f64>) -> bool {
		self.prompt_buffer[self.cn0_counter % CN0_ESTIMATION_SAMPLES] = prompt;
		self.cn0_counter += 1;
		if self.cn0_counter < CN0_ESTIMATION_SAMPLES { return false; }

		self.cn0_snv_db_hz = lock_detectors::cn0_snv_estimator(&self.prompt_buffer, E1_CODE_PERIOD_SEC);
		self.carrier_lock_test = lock_detectors::carrier_lock_detector(&self.prompt_buffer);

		// Inverted-polarity comparison preserved from the reference; see the note
		// on CARRIER_LOCK_THRESHOLD
		if self.carrier_lock_test.abs() > CARRIER_LOCK_THRESHOLD || self.cn0_snv_db_hz < MINIMUM_VALID_CN0_DB_HZ {
			self.carrier_lock_fail_counter += 1;
		} else if self.carrier_lock_fail_counter > 0 {
			self.carrier_lock_fail_counter -= 1;
		}

		if self.carrier_lock_fail_counter > MAXIMUM_LOCK_FAIL_COUNTER {
			eprintln!("Tracking channel {}: loss of lock", self.channel);
			if let Some(queue) = &self.queue {
				if queue.send(ChannelMessage{ channel: self.channel, command: ChannelCommand::LossOfLock }).is_err() {
					eprintln!("Tracking channel {}: control queue is disconnected", self.channel);
				}
			}
			self.carrier_lock_fail_counter = 0;
			return true;
		}
		false
	}

}

pub fn new_veml_tracker(config:TrackingConfig) -> Result<Tracking, &'static str> {
	if config.fs_in_hz <= 0.0 || config.vector_length == 0 {
		return Err("The sample rate and vector length must both be positive");
	}
	if config.very_early_late_space_chips <= config.early_late_space_chips {
		return Err("The very-early/late spacing must exceed the early/late spacing");
	}

	// Scratch sized for one nominal PRN on top of the configured period, which
	// covers the NCO dynamic range plus the correlator guard on both sides
	let scratch_len = 2 * config.vector_length;
	let very_early_code = AlignedVec::zeroed(scratch_len)?;
	let carr_sign = AlignedVec::zeroed(scratch_len)?;

	let carrier_loop_filter = SecondOrderLoopFilter::new(config.pll_bw_hz, E1_CODE_PERIOD_SEC);
	let code_loop_filter = SecondOrderLoopFilter::new(config.dll_bw_hz, E1_CODE_PERIOD_SEC);

	Ok(Tracking {
		fs_in: config.fs_in_hz,
		if_freq_hz: config.if_freq_hz,
		vector_length: config.vector_length,
		early_late_spc_chips: config.early_late_space_chips,
		very_early_late_spc_chips: config.very_early_late_space_chips,
		dump_enabled: config.dump,
		dump_filename: config.dump_filename,
		channel: 0,

		carrier_loop_filter, code_loop_filter,

		acquisition_synchro: None,
		synchro_template: GnssSynchro::default(),
		acq_code_phase_samples: 0.0,
		acq_carrier_doppler_hz: 0.0,
		acq_sample_stamp: 0,

		state: TrackingState::Idle,

		code_freq_hz: E1_CODE_CHIP_RATE_HZ,
		carrier_doppler_hz: 0.0,
		code_phase_step_chips: E1_CODE_CHIP_RATE_HZ / config.fs_in_hz,
		rem_code_phase_samples: 0.0,
		next_rem_code_phase_samples: 0.0,
		rem_carr_phase_rad: 0.0,
		acc_carrier_phase_rad: 0.0,
		current_prn_length_samples: config.vector_length,
		next_prn_length_samples: config.vector_length,
		sample_counter: 0,

		ca_code: vec![ZERO; 2 * E1_B_CODE_LENGTH_CHIPS + 4],
		very_early_code, carr_sign,

		prompt_buffer: [ZERO; CN0_ESTIMATION_SAMPLES],
		cn0_counter: 0,
		carrier_lock_fail_counter: 0,
		cn0_snv_db_hz: 0.0,
		carrier_lock_test: 1.0,

		last_veml: VemlOutput{ very_early: ZERO, early: ZERO, prompt: ZERO, late: ZERO, very_late: ZERO },
		last_carr_error_cycles: 0.0,
		last_code_error_chips: 0.0,

		last_seg: 0,

		dump: TrackingDump::disabled(),
		queue: None,
	})
}
