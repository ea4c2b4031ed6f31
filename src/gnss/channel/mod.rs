
use rustfft::num_complex::Complex;
use serde::{Serialize, Deserialize};

use crate::{Sample, DigSigProcErr as DSPErr};
use crate::block::{BlockFunctionality, BlockResult};
use crate::gnss::galileo_e1::tracking::{Tracking, TrackingResult};
use crate::gnss::synchro::GnssSynchro;

#[cfg(test)]
mod tests;

/// Channel-command identifiers shared with the receiver's flowgraph controller.
/// The numeric values are part of the control-bus contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelCommand {
	AcquisitionFailed = 0,
	AcquisitionSuccess = 1,
	LossOfLock = 2,
}

impl ChannelCommand {

	pub fn id(&self) -> usize { *self as usize }

}

/// Message posted to the control bus.  The bus accepts messages from many channels
/// concurrently; each tracking channel only ever sends, addressed by its own index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
	pub channel: usize,
	pub command: ChannelCommand,
}

/// One satellite's tracking channel behind the dataflow scheduler.  Samples are
/// buffered until the tracker's backpressure contract (two nominal PRN periods) is
/// met; each step of the core then consumes a prefix of the buffer.
pub struct Channel {
	pub trk: Tracking,
	buffer: Vec<Complex<f64>>,
	min_samples: usize,
}

impl Channel {

	pub fn new(trk:Tracking) -> Self {
		let min_samples = 2 * trk.vector_length();
		Self { trk, buffer: Vec::with_capacity(2 * min_samples), min_samples }
	}

}

impl BlockFunctionality<GnssSynchro, (), Sample, GnssSynchro> for Channel {

	fn control(&mut self, handoff:&GnssSynchro) -> Result<(), &'static str> {
		// A control message is a fresh acquisition handoff
		self.trk.set_gnss_synchro(handoff.clone());
		self.trk.start_tracking()
	}

	fn apply(&mut self, input:&Sample) -> BlockResult<GnssSynchro> {
		self.buffer.push(input.val);
		if self.buffer.len() < self.min_samples { return BlockResult::NotReady; }

		match self.trk.process(&self.buffer) {
			TrackingResult::Epoch{ num_consumed, synchro } => {
				self.buffer.drain(..num_consumed);
				BlockResult::Ready(synchro)
			},
			TrackingResult::PullIn{ num_consumed, synchro } => {
				self.buffer.drain(..num_consumed);
				BlockResult::Ready(synchro)
			},
			TrackingResult::Disabled{ num_consumed, .. } => {
				self.buffer.drain(..num_consumed);
				BlockResult::NotReady
			},
			TrackingResult::LossOfLock{ num_consumed, .. } => {
				self.buffer.drain(..num_consumed);
				BlockResult::Err(DSPErr::LossOfLock)
			},
		}
	}

}
