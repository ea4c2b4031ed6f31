
use std::alloc::{alloc_zeroed, dealloc, Layout};

use rustfft::num_complex::Complex;

// The correlation kernel is written to auto-vectorize, so the scratch buffers it
// walks are kept on 32-byte boundaries
pub const BUFFER_ALIGNMENT:usize = 32;

/// Fixed-capacity heap buffer of complex samples on a 32-byte boundary.  Works like
/// a `Vec<Complex<f64>>` that never grows; all access goes through plain slices.
pub struct AlignedVec {
	ptr: *mut Complex<f64>,
	len: usize,
}

// The allocation is uniquely owned and only reachable through &self / &mut self
unsafe impl Send for AlignedVec {}

impl AlignedVec {

	pub fn zeroed(len:usize) -> Result<Self, &'static str> {
		if len == 0 { return Err("Refusing to allocate an empty sample buffer"); }
		let layout = Self::layout(len)?;
		let ptr = unsafe { alloc_zeroed(layout) } as *mut Complex<f64>;
		if ptr.is_null() { return Err("Sample buffer allocation failed"); }
		Ok(Self { ptr, len })
	}

	pub fn len(&self) -> usize { self.len }

	pub fn as_slice(&self) -> &[Complex<f64>] {
		unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
	}

	pub fn as_mut_slice(&mut self) -> &mut [Complex<f64>] {
		unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
	}

	fn layout(len:usize) -> Result<Layout, &'static str> {
		Layout::from_size_align(len * std::mem::size_of::<Complex<f64>>(), BUFFER_ALIGNMENT)
			.map_err(|_| "Invalid sample buffer layout")
	}

}

impl Drop for AlignedVec {

	fn drop(&mut self) {
		// The layout succeeded once in zeroed(), so it succeeds again here
		if let Ok(layout) = Self::layout(self.len) {
			unsafe { dealloc(self.ptr as *mut u8, layout); }
		}
	}

}

#[cfg(test)]
mod tests {

	use super::{AlignedVec, BUFFER_ALIGNMENT};
	use rustfft::num_complex::Complex;

	#[test]
	fn buffers_are_aligned_and_zeroed() {
		let buf = AlignedVec::zeroed(1000).unwrap();
		assert_eq!(buf.as_slice().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
		assert_eq!(buf.len(), 1000);
		assert!(buf.as_slice().iter().all(|c| c.re == 0.0 && c.im == 0.0));
	}

	#[test]
	fn writes_round_trip_through_the_slice() {
		let mut buf = AlignedVec::zeroed(16).unwrap();
		for (i, c) in buf.as_mut_slice().iter_mut().enumerate() {
			*c = Complex{ re: i as f64, im: -(i as f64) };
		}
		assert_eq!(buf.as_slice()[7], Complex{ re: 7.0, im: -7.0 });
	}

	#[test]
	fn empty_allocation_is_refused() {
		assert!(AlignedVec::zeroed(0).is_err());
	}

}
