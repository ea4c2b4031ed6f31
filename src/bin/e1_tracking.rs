
extern crate clap;
extern crate colored;
extern crate galileo_radio;
extern crate rustfft;
extern crate serde_json;

use clap::{Arg, App};
use colored::*;
use rustfft::num_complex::Complex;

use galileo_radio::gnss::channel::ChannelMessage;
use galileo_radio::gnss::galileo_e1::tracking::{self, TrackingConfig, TrackingDebug, TrackingResult, TrackingState};
use galileo_radio::gnss::synchro::GnssSynchro;
use galileo_radio::io;

fn main() {

	let matches = App::new("Galileo E1 VEML Tracking")
		.version("0.1.0")
		.about("Takes baseband IQ samples centered on 1575.42 MHz and produces VEML tracking results for the Galileo E1 signal")
		.arg(Arg::with_name("filename")
			.short("f").long("filename")
			.help("Input filename (little-endian f32 I/Q pairs)")
			.required(true).takes_value(true))
		.arg(Arg::with_name("sample_rate_sps")
			.short("s").long("sample_rate_sps")
			.takes_value(true).required(true))
		.arg(Arg::with_name("prn")
			.short("p").long("prn")
			.takes_value(true).required(true))
		.arg(Arg::with_name("acq_doppler_hz")
			.short("d").long("acq_doppler_hz")
			.takes_value(true).required(true))
		.arg(Arg::with_name("acq_code_phase")
			.short("c").long("acq_code_phase")
			.help("Acquisition code phase estimate [samples]")
			.takes_value(true).required(true))
		.arg(Arg::with_name("max_records")
			.short("m").long("max_records")
			.takes_value(true))
		.arg(Arg::with_name("dump")
			.long("dump")
			.help("Basename for the binary per-epoch dump file")
			.takes_value(true))
		.get_matches();

	// Parse mandatory fields
	let fname:&str          = matches.value_of("filename").unwrap();
	let fs:f64              = matches.value_of("sample_rate_sps").unwrap().parse().unwrap();
	let prn:usize           = matches.value_of("prn").unwrap().parse().unwrap();
	let acq_doppler_hz:f64  = matches.value_of("acq_doppler_hz").unwrap().parse().unwrap();
	let acq_code_phase:f64  = matches.value_of("acq_code_phase").unwrap().parse().unwrap();

	// Parse optional fields
	let opt_max_records:Option<usize> = matches.value_of("max_records").map(|s| s.parse().unwrap() );
	let opt_dump:Option<&str> = matches.value_of("dump");

	eprintln!("Tracking PRN {} in {} at {} [samples/sec]", prn, &fname, &fs);

	let config = TrackingConfig {
		fs_in_hz: fs,
		vector_length: (fs * 4.0e-3).round() as usize,
		dump: opt_dump.is_some(),
		dump_filename: opt_dump.unwrap_or("./tracking_ch").to_string(),
		..TrackingConfig::default()
	};
	let vector_length = config.vector_length;

	let (tx, rx) = std::sync::mpsc::channel::<ChannelMessage>();
	let mut trk = tracking::new_veml_tracker(config).unwrap();
	trk.set_channel(0);
	trk.set_channel_queue(tx);

	let handoff = GnssSynchro{ system: 'E', prn,
		acq_delay_samples: acq_code_phase, acq_doppler_hz, acq_samplestamp_samples: 0,
		..GnssSynchro::default() };
	trk.set_gnss_synchro(handoff);
	trk.start_tracking().unwrap();

	let mut buffer:Vec<Complex<f64>> = Vec::with_capacity(4 * vector_length);
	let mut all_results:Vec<TrackingDebug> = vec![];
	let mut epoch_count:usize = 0;

	'outer: for (val, _idx) in io::file_source_f32_complex(&fname).unwrap() {
		buffer.push(val);
		if buffer.len() < 2 * vector_length { continue; }

		match trk.process(&buffer) {
			TrackingResult::Epoch{ num_consumed, .. } => {
				buffer.drain(..num_consumed);
				epoch_count += 1;
				// One status record per second of signal
				if epoch_count % 250 == 0 {
					let debug = trk.debug();
					match trk.state() {
						TrackingState::Running => eprintln!("Running {}", format!("{:9.2} [Hz], {:5.1} [dB-Hz]", debug.carrier_doppler_hz, debug.cn0_db_hz).green()),
						state                  => eprintln!("{:?} {}", state, format!("{:9.2} [Hz]", debug.carrier_doppler_hz).yellow()),
					}
					all_results.push(debug);
					if let Some(max_records) = opt_max_records {
						if all_results.len() >= max_records { break 'outer; }
					}
				}
			},
			TrackingResult::PullIn{ num_consumed, .. } => {
				buffer.drain(..num_consumed);
			},
			TrackingResult::Disabled{ num_consumed, .. } => {
				buffer.drain(..num_consumed);
			},
			TrackingResult::LossOfLock{ num_consumed, .. } => {
				buffer.drain(..num_consumed);
				if let Ok(msg) = rx.try_recv() {
					eprintln!("{}", format!("Loss of lock on channel {} (command {})", msg.channel, msg.command.id()).red());
				}
				all_results.push(trk.debug());
				break 'outer;
			},
		}
	}

	// Output data in JSON format
	println!("{}", serde_json::to_string_pretty(&all_results).unwrap());

}
