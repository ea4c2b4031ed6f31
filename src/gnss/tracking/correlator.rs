
use rustfft::num_complex::Complex;

const ZERO:Complex<f64> = Complex{ re: 0.0, im: 0.0 };

#[derive(Debug, Clone, Copy)]
pub struct VemlOutput {
	pub very_early: Complex<f64>,
	pub early:      Complex<f64>,
	pub prompt:     Complex<f64>,
	pub late:       Complex<f64>,
	pub very_late:  Complex<f64>,
}

/// One-pass carrier wipeoff and five-tap correlation.  Every replica slice must be
/// at least as long as `input`; the five tap slices are normally sub-views of one
/// guard-extended super-array, offset from each other by the correlator spacings.
pub fn carrier_wipeoff_and_veml(input:&[Complex<f64>], carr_sign:&[Complex<f64>],
		very_early_code:&[Complex<f64>], early_code:&[Complex<f64>], prompt_code:&[Complex<f64>],
		late_code:&[Complex<f64>], very_late_code:&[Complex<f64>]) -> VemlOutput {

	let mut ve = ZERO;
	let mut e  = ZERO;
	let mut p  = ZERO;
	let mut l  = ZERO;
	let mut vl = ZERO;

	for i in 0..input.len() {
		let x = input[i] * carr_sign[i].conj();
		ve += x * very_early_code[i].conj();
		e  += x * early_code[i].conj();
		p  += x * prompt_code[i].conj();
		l  += x * late_code[i].conj();
		vl += x * very_late_code[i].conj();
	}

	VemlOutput{ very_early: ve, early: e, prompt: p, late: l, very_late: vl }
}
