
use crate::DigSigProcErr;
use crate::block::{Block, BlockFunctionality, BlockResult};

/* A stand-in for a tracking channel: accumulates inputs and emits the running sum
every `epoch_len` samples.  A control message re-zeros the accumulator, the way an
acquisition handoff restarts a tracker; an input of zero drops the lock. */
struct MockChannel {
	epoch_len: usize,
	count: usize,
	sum: i64,
}

impl BlockFunctionality<(), (), i64, i64> for MockChannel {

	fn control(&mut self, _:&()) -> Result<(), &'static str> {
		self.count = 0;
		self.sum = 0;
		Ok(())
	}

	fn apply(&mut self, input:&i64) -> BlockResult<i64> {
		if *input == 0 { return BlockResult::Err(DigSigProcErr::LossOfLock); }
		self.count += 1;
		self.sum += *input;
		if self.count % self.epoch_len == 0 {
			BlockResult::Ready(self.sum)
		} else {
			BlockResult::NotReady
		}
	}

}

#[tokio::test(flavor = "multi_thread")]
async fn block_batches_inputs_and_survives_loss_of_lock() {

	let mut blk = Block::from(MockChannel{ epoch_len: 4, count: 0, sum: 0 });

	for x in 1..=8 {
		blk.tx_input.send(x).await.unwrap();
	}
	assert_eq!(blk.rx_output.recv().await.unwrap(), 1 + 2 + 3 + 4);
	assert_eq!(blk.rx_output.recv().await.unwrap(), 1 + 2 + 3 + 4 + 5 + 6 + 7 + 8);

	// A loss of lock must idle the task, not kill it
	blk.tx_input.send(0).await.unwrap();
	blk.tx_control.send(()).await.unwrap();
	for x in 1..=4 {
		blk.tx_input.send(x).await.unwrap();
	}
	assert_eq!(blk.rx_output.recv().await.unwrap(), 1 + 2 + 3 + 4);

	blk.shutdown().await.unwrap();

}
