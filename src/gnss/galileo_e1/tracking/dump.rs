
use std::fs::File;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

pub const DUMP_RECORD_SIZE_BYTES:usize = 84;

/// One fixed-layout little-endian record per tracked epoch.  Field order is part of
/// the on-disk contract with the analysis scripts that read these files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpRecord {
	pub abs_very_early: f32,
	pub abs_early:      f32,
	pub abs_prompt:     f32,
	pub abs_late:       f32,
	pub abs_very_late:  f32,
	pub prompt_i:       f32,
	pub prompt_q:       f32,
	pub sample_counter: u64,
	pub acc_carrier_phase_rad:  f32,
	pub carrier_doppler_hz:     f32,
	pub code_freq_hz:           f32,
	pub carr_error:             f32,
	pub carr_nco:               f32,
	pub code_error:             f32,
	pub code_nco:               f32,
	pub cn0_db_hz:              f32,
	pub carrier_lock_test:      f32,
	pub rem_code_phase_samples: f32,
	pub prn_start_sample:       f64,
}

impl DumpRecord {

	pub fn write_to<W: Write>(&self, w:&mut W) -> std::io::Result<()> {
		// Correlator magnitudes
		w.write_f32::<LittleEndian>(self.abs_very_early)?;
		w.write_f32::<LittleEndian>(self.abs_early)?;
		w.write_f32::<LittleEndian>(self.abs_prompt)?;
		w.write_f32::<LittleEndian>(self.abs_late)?;
		w.write_f32::<LittleEndian>(self.abs_very_late)?;
		// Prompt I and Q (to analyze navigation symbols)
		w.write_f32::<LittleEndian>(self.prompt_i)?;
		w.write_f32::<LittleEndian>(self.prompt_q)?;
		// PRN start sample stamp
		w.write_u64::<LittleEndian>(self.sample_counter)?;
		// Accumulated carrier phase
		w.write_f32::<LittleEndian>(self.acc_carrier_phase_rad)?;
		// Carrier and code frequency
		w.write_f32::<LittleEndian>(self.carrier_doppler_hz)?;
		w.write_f32::<LittleEndian>(self.code_freq_hz)?;
		// PLL commands
		w.write_f32::<LittleEndian>(self.carr_error)?;
		w.write_f32::<LittleEndian>(self.carr_nco)?;
		// DLL commands
		w.write_f32::<LittleEndian>(self.code_error)?;
		w.write_f32::<LittleEndian>(self.code_nco)?;
		// CN0 and carrier lock test
		w.write_f32::<LittleEndian>(self.cn0_db_hz)?;
		w.write_f32::<LittleEndian>(self.carrier_lock_test)?;
		// AUX vars
		w.write_f32::<LittleEndian>(self.rem_code_phase_samples)?;
		w.write_f64::<LittleEndian>(self.prn_start_sample)?;
		Ok(())
	}

}

/// Dump-file handle for one tracking channel.  I/O failures never reach the
/// tracking loop: an open failure leaves the dump disabled and a write failure
/// drops the record.
pub struct TrackingDump {
	file: Option<File>,
}

impl TrackingDump {

	pub fn disabled() -> Self { Self{ file: None } }

	pub fn open(filename:&str) -> Result<Self, &'static str> {
		let f = File::create(filename).map_err(|_| "Unable to create tracking dump file")?;
		Ok(Self{ file: Some(f) })
	}

	pub fn is_open(&self) -> bool { self.file.is_some() }

	pub fn write(&mut self, record:&DumpRecord) {
		if let Some(f) = self.file.as_mut() {
			let mut buf:Vec<u8> = Vec::with_capacity(DUMP_RECORD_SIZE_BYTES);
			// Writes into a Vec cannot fail; the file write can
			if record.write_to(&mut buf).is_ok() {
				if let Err(e) = f.write_all(&buf) {
					eprintln!("Failed to write tracking dump record: {}", e);
				}
			}
		}
	}

}

#[cfg(test)]
mod tests {

	use super::{DumpRecord, DUMP_RECORD_SIZE_BYTES};

	#[test]
	fn record_serializes_to_the_fixed_layout() {
		let record = DumpRecord{ sample_counter: 0x0102030405060708, prn_start_sample: 16000.0, ..Default::default() };
		let mut buf:Vec<u8> = vec![];
		record.write_to(&mut buf).unwrap();
		assert_eq!(buf.len(), DUMP_RECORD_SIZE_BYTES);
		// The sample counter sits after seven f32 fields, little-endian
		assert_eq!(&buf[28..36], &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
		// The trailing f64 occupies the final eight bytes
		assert_eq!(&buf[76..84], &16000.0f64.to_le_bytes());
	}

}
