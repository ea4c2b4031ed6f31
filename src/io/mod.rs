
use std::fs::File;
use std::io::BufReader;

use byteorder::{LittleEndian, ReadBytesExt};
use rustfft::num_complex::Complex;

/// Streams contiguous little-endian f32 I/Q pairs, the wire format the baseband
/// front end delivers, yielding each complex sample with its stream index
pub struct FileSourceLEf32Complex {
	f: BufReader<File>,
	idx: usize,
}

pub fn file_source_f32_complex(filename:&str) -> Result<FileSourceLEf32Complex, &'static str> {
	let f = File::open(filename).map_err(|_| "Unable to open source file")?;
	Ok(FileSourceLEf32Complex{ f: BufReader::new(f), idx: 0 })
}

impl Iterator for FileSourceLEf32Complex {
	type Item = (Complex<f64>, usize);

	fn next(&mut self) -> Option<(Complex<f64>, usize)> {
		match (self.f.read_f32::<LittleEndian>(), self.f.read_f32::<LittleEndian>()) {
			(Ok(re), Ok(im)) => {
				let i = self.idx;
				self.idx += 1;
				Some((Complex{ re: re as f64, im: im as f64 }, i))
			},
			(_, _) => None,
		}
	}
}

#[cfg(test)]
mod tests {

	use std::io::Write;

	use byteorder::{LittleEndian, WriteBytesExt};

	use super::file_source_f32_complex;

	#[test]
	fn f32_pairs_round_trip_with_indices() {
		let path = std::env::temp_dir().join("galileo_radio_io_test.dat");
		let samples:Vec<(f32, f32)> = vec![(1.0, -1.0), (0.5, 0.25), (-3.0, 2.0)];
		{
			let mut f = std::fs::File::create(&path).unwrap();
			for (re, im) in &samples {
				f.write_f32::<LittleEndian>(*re).unwrap();
				f.write_f32::<LittleEndian>(*im).unwrap();
			}
			// A trailing half-pair must terminate the stream cleanly
			f.write_f32::<LittleEndian>(9.0).unwrap();
			f.flush().unwrap();
		}

		let read:Vec<_> = file_source_f32_complex(path.to_str().unwrap()).unwrap().collect();
		assert_eq!(read.len(), samples.len());
		for (i, (c, idx)) in read.iter().enumerate() {
			assert_eq!(*idx, i);
			assert_eq!(c.re, samples[i].0 as f64);
			assert_eq!(c.im, samples[i].1 as f64);
		}

		std::fs::remove_file(&path).ok();
	}

}
