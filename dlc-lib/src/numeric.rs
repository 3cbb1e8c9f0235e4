//!
//! Digit decomposition for numeric outcome events.
//!
//! A numeric oracle signs the outcome value digit by digit. A contract over
//! such an event does not need one CET per attestable value: any range of
//! values with the same payout can be covered by CETs that only commit to a
//! digit prefix. This module implements the value <-> digits conversion and
//! the minimal prefix cover of a value interval.
//!

use crate::Error;

/// The number of values attestable with the given digit count, if it fits a u64.
pub fn max_value(base: u16, nb_digits: u16) -> Option<u64> {
	(base as u64).checked_pow(nb_digits as u32)
}

/// Decompose a value into `nb_digits` digits, most significant first.
pub fn decompose(mut value: u64, base: u16, nb_digits: u16) -> Vec<u16> {
	let mut digits = vec![0u16; nb_digits as usize];
	for i in (0..nb_digits as usize).rev() {
		digits[i] = (value % base as u64) as u16;
		value /= base as u64;
	}
	digits
}

/// Compose digits (most significant first) back into a value.
pub fn compose(digits: &[u16], base: u16) -> u64 {
	digits.iter().fold(0u64, |acc, &d| acc * base as u64 + d as u64)
}

/// Compute the minimal set of digit prefixes covering the inclusive
/// interval `[start, end]`.
///
/// A prefix of length `k` covers the `base^(nb_digits - k)` values sharing
/// its leading digits; the empty prefix covers the whole domain. The
/// returned prefixes are disjoint and cover exactly the interval.
pub fn prefix_cover(
	start: u64,
	end: u64,
	base: u16,
	nb_digits: u16,
) -> Result<Vec<Vec<u16>>, Error> {
	if base < 2 {
		return Err(Error::InvalidArgument("digit base must be at least 2"));
	}
	let max = max_value(base, nb_digits)
		.ok_or(Error::InvalidArgument("digit domain overflows u64"))?;
	if start > end || end >= max {
		return Err(Error::InvalidArgument("invalid digit interval"));
	}

	let mut ret = Vec::new();
	let mut cur = start;
	loop {
		// Largest aligned block starting at cur that stays within the interval.
		let mut block = 1u64;
		let mut trailing = 0u16;
		while trailing < nb_digits {
			let next = block * base as u64;
			if cur % next != 0 || cur.checked_add(next - 1).map_or(true, |e| e > end) {
				break;
			}
			block = next;
			trailing += 1;
		}
		ret.push(decompose(cur, base, nb_digits)[..(nb_digits - trailing) as usize].to_vec());
		match cur.checked_add(block) {
			Some(next) if next <= end => cur = next,
			_ => break,
		}
	}
	Ok(ret)
}

/// Whether the CET prefix matches the attested digits.
pub fn prefix_matches(prefix: &[u16], attested_digits: &[u16]) -> bool {
	prefix.len() <= attested_digits.len() && attested_digits[..prefix.len()] == *prefix
}


#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn decompose_compose_roundtrip() {
		for value in [0, 1, 7, 255, 256, 1023] {
			let digits = decompose(value, 2, 10);
			assert_eq!(digits.len(), 10);
			assert_eq!(compose(&digits, 2), value);
		}
		assert_eq!(decompose(5, 2, 4), vec![0, 1, 0, 1]);
	}

	fn expand(prefix: &[u16], base: u16, nb_digits: u16) -> (u64, u64) {
		let span = max_value(base, nb_digits - prefix.len() as u16).unwrap();
		let start = compose(prefix, base) * span;
		(start, start + span - 1)
	}

	#[test]
	fn cover_is_exact_and_disjoint() {
		for (start, end) in [(0, 1023), (3, 700), (512, 512), (0, 511), (17, 18)] {
			let cover = prefix_cover(start, end, 2, 10).unwrap();
			let mut ranges = cover.iter()
				.map(|p| expand(p, 2, 10))
				.collect::<Vec<_>>();
			ranges.sort();
			assert_eq!(ranges.first().unwrap().0, start);
			assert_eq!(ranges.last().unwrap().1, end);
			for w in ranges.windows(2) {
				assert_eq!(w[0].1 + 1, w[1].0);
			}
		}
	}

	#[test]
	fn full_domain_is_empty_prefix() {
		let cover = prefix_cover(0, 1023, 2, 10).unwrap();
		assert_eq!(cover, vec![Vec::<u16>::new()]);
	}

	#[test]
	fn cover_rejects_bad_interval() {
		assert!(prefix_cover(5, 4, 2, 10).is_err());
		assert!(prefix_cover(0, 1024, 2, 10).is_err());
	}

	#[test]
	fn prefix_matching() {
		assert!(prefix_matches(&[], &[1, 0, 1]));
		assert!(prefix_matches(&[1, 0], &[1, 0, 1]));
		assert!(!prefix_matches(&[1, 1], &[1, 0, 1]));
	}
}
