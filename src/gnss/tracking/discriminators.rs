
use rustfft::num_complex::Complex;

/// Two-quadrant arctangent PLL discriminator, insensitive to data-bit sign flips.
/// Output in radians; divide by 2*pi for cycles.
pub fn pll_two_quadrant_atan(prompt:Complex<f64>) -> f64 {
	if prompt.re != 0.0 { (prompt.im / prompt.re).atan() } else { 0.0 }
}

/// Normalized non-coherent DLL discriminator on the outer correlator pair
pub fn dll_nc_veml_normalized(very_early:Complex<f64>, very_late:Complex<f64>) -> f64 {
	let p_ve:f64 = very_early.norm();
	let p_vl:f64 = very_late.norm();
	if p_ve + p_vl == 0.0 { 0.0 } else { (p_ve - p_vl) / (p_ve + p_vl) }
}

/// Early/late form of the same discriminator, kept for diagnostics
pub fn dll_nc_eml_normalized(early:Complex<f64>, late:Complex<f64>) -> f64 {
	let p_e:f64 = early.norm();
	let p_l:f64 = late.norm();
	if p_e + p_l == 0.0 { 0.0 } else { (p_e - p_l) / (p_e + p_l) }
}

#[cfg(test)]
mod tests {

	use rustfft::num_complex::Complex;

	use super::*;

	#[test]
	fn pll_reads_phase_regardless_of_bit_sign() {
		let phi: f64 = 0.2;
		let pos = Complex{ re: phi.cos(), im: phi.sin() };
		let neg = Complex{ re: -pos.re, im: -pos.im };
		assert!((pll_two_quadrant_atan(pos) - phi).abs() < 1.0e-12);
		assert!((pll_two_quadrant_atan(neg) - phi).abs() < 1.0e-12);
	}

	#[test]
	fn pll_guards_the_zero_prompt() {
		assert_eq!(pll_two_quadrant_atan(Complex{ re: 0.0, im: 5.0 }), 0.0);
	}

	#[test]
	fn dll_sign_follows_the_stronger_tap() {
		let big = Complex{ re: 8.0, im: 0.0 };
		let small = Complex{ re: 2.0, im: 0.0 };
		assert!(dll_nc_veml_normalized(big, small) > 0.0);
		assert!(dll_nc_veml_normalized(small, big) < 0.0);
		assert_eq!(dll_nc_veml_normalized(big, big), 0.0);
		assert!((dll_nc_veml_normalized(big, small) - 0.6).abs() < 1.0e-12);
	}

	#[test]
	fn dll_guards_the_all_zero_taps() {
		let z = Complex{ re: 0.0, im: 0.0 };
		assert_eq!(dll_nc_veml_normalized(z, z), 0.0);
		assert_eq!(dll_nc_eml_normalized(z, z), 0.0);
	}

}
