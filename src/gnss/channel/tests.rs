
use rustfft::num_complex::Complex;

use crate::{Sample, DigSigProcErr};
use crate::block::{BlockFunctionality, BlockResult};
use crate::gnss::galileo_e1::tracking::{new_veml_tracker, TrackingConfig};
use crate::gnss::synchro::GnssSynchro;

use super::Channel;

#[test]
fn channel_buffers_samples_steps_the_tracker_and_reports_loss_of_lock() {
	let config = TrackingConfig{ fs_in_hz: 4.092e6, vector_length: 16368,
		early_late_space_chips: 0.25, very_early_late_space_chips: 0.5,
		..TrackingConfig::default() };
	let trk = new_veml_tracker(config).unwrap();
	let mut ch = Channel::new(trk);

	let handoff = GnssSynchro{ system: 'E', prn: 3, ..GnssSynchro::default() };
	ch.control(&handoff).unwrap();

	// An all-silent stream: the channel pulls in, free-runs, and the C/N0 floor
	// eventually drops the lock
	let mut outputs:usize = 0;
	let mut saw_loss = false;
	for i in 0..4_000_000usize {
		match ch.apply(&Sample{ val: Complex{ re: 0.0, im: 0.0 }, idx: i }) {
			BlockResult::NotReady => (),
			BlockResult::Ready(synchro) => {
				outputs += 1;
				assert_eq!(synchro.prn, 3);
				assert_eq!(synchro.system, 'E');
			},
			BlockResult::Err(e) => {
				assert_eq!(e, DigSigProcErr::LossOfLock);
				saw_loss = true;
				break;
			},
		}
	}

	assert!(saw_loss, "The channel never dropped its lock on silence");
	// One pull-in record plus the silent epochs before the monitor tripped
	assert!(outputs >= 200 && outputs <= 220, "outputs = {}", outputs);
}

#[test]
fn control_fails_cleanly_without_a_start_but_recovers_with_one() {
	let config = TrackingConfig{ fs_in_hz: 4.092e6, vector_length: 16368,
		early_late_space_chips: 0.25, very_early_late_space_chips: 0.5,
		..TrackingConfig::default() };
	let trk = new_veml_tracker(config).unwrap();
	let mut ch = Channel::new(trk);

	// Without a handoff the tracker idles and the channel reports nothing
	for i in 0..40000usize {
		match ch.apply(&Sample{ val: Complex{ re: 0.0, im: 0.0 }, idx: i }) {
			BlockResult::NotReady => (),
			BlockResult::Ready(_) => panic!("An idle channel must not produce output"),
			BlockResult::Err(_)   => panic!("An idle channel must not fail"),
		}
	}

	let handoff = GnssSynchro{ system: 'E', prn: 8, ..GnssSynchro::default() };
	ch.control(&handoff).unwrap();

	let mut got_output = false;
	for i in 0..100_000usize {
		if let BlockResult::Ready(_) = ch.apply(&Sample{ val: Complex{ re: 0.0, im: 0.0 }, idx: i }) {
			got_output = true;
			break;
		}
	}
	assert!(got_output);
}
