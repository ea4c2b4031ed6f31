
use rustfft::num_complex::Complex;

use super::E1_B_CODE_LENGTH_CHIPS;

const G2_PERIOD:usize = 8191;

/// Primary-code chips for one satellite, one chip per element, values +1/-1.
///
/// The flight E1-B primary codes are published as memory-code hex tables; this
/// generator stands in for that table lookup with a Gold-style register pair
/// (x^13 + x^4 + x^3 + x + 1 against a PRN-delayed x^13 + x^12 + x^11 + x^8 + 1)
/// so the crate stays self-contained.  Everything downstream treats the output as
/// an opaque 4092-chip spreading sequence.
pub fn e1b_code(prn:usize) -> Vec<i8> {

	let mut r2 = [-1i8; 13];
	let mut g2:Vec<i8> = Vec::with_capacity(G2_PERIOD);
	for _ in 0..G2_PERIOD {
		g2.push(r2[12]);
		let c2 = r2[7] * r2[10] * r2[11] * r2[12];
		r2.rotate_right(1);
		r2[0] = c2;
	}

	let delay:usize = (prn * 137) % G2_PERIOD;

	let mut r1 = [-1i8; 13];
	let mut code:Vec<i8> = Vec::with_capacity(E1_B_CODE_LENGTH_CHIPS);
	for i in 0..E1_B_CODE_LENGTH_CHIPS {
		code.push(r1[12] * g2[(i + delay) % G2_PERIOD]);
		let c1 = r1[0] * r1[2] * r1[3] * r1[12];
		r1.rotate_right(1);
		r1[0] = c1;
	}

	code
}

/// sinBOC(1,1)-modulated replica at two samples per chip: each chip c becomes the
/// half-chip pair (+c, -c)
pub fn e1b_sinboc11_complex(prn:usize) -> Vec<Complex<f64>> {
	let mut ans:Vec<Complex<f64>> = Vec::with_capacity(2 * E1_B_CODE_LENGTH_CHIPS);
	for chip in e1b_code(prn) {
		let c = chip as f64;
		ans.push(Complex{ re: c,  im: 0.0 });
		ans.push(Complex{ re: -c, im: 0.0 });
	}
	ans
}

#[cfg(test)]
mod tests {

	use super::{e1b_code, e1b_sinboc11_complex};
	use crate::gnss::galileo_e1::E1_B_CODE_LENGTH_CHIPS;

	#[test]
	fn code_has_full_length_and_binary_chips() {
		let code = e1b_code(1);
		assert_eq!(code.len(), E1_B_CODE_LENGTH_CHIPS);
		assert!(code.iter().all(|&c| c == 1 || c == -1));
	}

	#[test]
	fn codes_are_deterministic_and_prn_specific() {
		assert_eq!(e1b_code(11), e1b_code(11));
		let a = e1b_code(1);
		let b = e1b_code(2);
		let agreements:usize = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
		// Distinct PRNs disagree in a large fraction of chip positions
		assert!(agreements < E1_B_CODE_LENGTH_CHIPS - 1000);
	}

	#[test]
	fn sinboc_doubles_the_rate_and_negates_the_second_half_chip() {
		let code = e1b_code(5);
		let boc = e1b_sinboc11_complex(5);
		assert_eq!(boc.len(), 2 * E1_B_CODE_LENGTH_CHIPS);
		for (i, chip) in code.iter().enumerate() {
			assert_eq!(boc[2*i].re,    *chip as f64);
			assert_eq!(boc[2*i+1].re, -(*chip as f64));
			assert_eq!(boc[2*i].im, 0.0);
		}
	}

}
