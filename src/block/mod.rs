
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::DigSigProcErr as DSPErr;

#[cfg(test)]
mod tests;

pub enum BlockResult<U> {
	NotReady,
	Ready(U),
	Err(DSPErr)
}

impl<U> BlockResult<U> {

	pub fn unwrap(self) -> U {
		match self {
			Self::Ready(u) => u,
			_ => panic!("Called unwrap on something other than BlockResult::Ready")
		}
	}

}

/* A type that implements BlockFunctionality consumes instances of T and produces
Ready(U) when an output is available, NotReady when it needs more input, or Err(_)
when processing fails.  The control channel carries C in and D out; for a tracking
channel C is a fresh acquisition handoff. */
pub trait BlockFunctionality<C, D, T, U> {

	fn control(&mut self, control:&C) -> Result<D, &'static str>;
	fn apply(&mut self, input:&T) -> BlockResult<U>;

}

/// A block running on its own tokio task, owning its state and talking to the rest
/// of the flowgraph over channels.  One Block per satellite keeps every tracker
/// single-threaded with no shared mutable state.
pub struct Block<C: 'static + Send, T: 'static + Send, U: 'static + Send> {
	pub tx_control: mpsc::Sender<C>,
	pub tx_input:   mpsc::Sender<T>,
	pub rx_output:  mpsc::Receiver<U>,
	pub handle:     JoinHandle<Result<(), &'static str>>,
}

impl<C: 'static + Send, T: 'static + Send, U: 'static + Send> Block<C, T, U> {

	pub fn from<B: 'static + BlockFunctionality<C, (), T, U> + Send>(b:B) -> Self {

		let (tx_control, mut rx_control) = mpsc::channel::<C>(10);
		let (tx_input,   mut rx_input)   = mpsc::channel::<T>(64);
		let (tx_output,      rx_output)  = mpsc::channel::<U>(64);

		let handle:JoinHandle<Result<(), &'static str>> = tokio::spawn(async move {

			let mut owned_b = b;

			'rx: while let Some(t) = rx_input.recv().await {

				// Interleaving control handling with input handling keeps the state
				// behind a single owner instead of a mutex
				if let Ok(c) = rx_control.try_recv() {
					owned_b.control(&c)?;
				}

				match owned_b.apply(&t) {
					BlockResult::Ready(u) => tx_output.send(u).await.map_err(|_| "Unable to send output")?,
					BlockResult::NotReady => (),
					// A lost lock idles the block until the control channel delivers
					// the next acquisition handoff
					BlockResult::Err(DSPErr::LossOfLock) => (),
					BlockResult::Err(e) => {
						eprintln!("Error in block: {:?}", e);
						break 'rx;
					}
				}

			}

			Ok(())
		});

		Block{ tx_control, tx_input, rx_output, handle }
	}

	pub async fn shutdown(self) -> Result<(), &'static str> {

		let Block{ tx_control, tx_input, rx_output:_, handle } = self;

		drop(tx_control);
		drop(tx_input);

		handle.await.map_err(|_| "Block task panicked")?
	}

}
