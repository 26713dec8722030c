//! Smooths the movement penalties of a [Grid] with a box blur so that costly
//! terrain and obstacles bleed into their surroundings, which nudges paths
//! away from hugging walls and from skimming the edge of a swamp.
//!
//! The blur is separable: a horizontal pass sums each row with a sliding
//! window and a vertical pass sums the columns of that result. Each window
//! step adds the sample entering the kernel and removes the one leaving it,
//! so the whole blur is `O(rows * columns)` regardless of the kernel size.
//!
//! Samples outside of the grid are clamped to the nearest edge cell
//! (replicate border).
//!
//! ```text
//!  kernel extent 1, width 3
//!  ___________
//! |   |   |   |
//! | + | + | + |   each cell becomes the average of the 3x3 block around it
//! |___|___|___|
//! |   |   |   |
//! | + | X | + |
//! |___|___|___|
//! |   |   |   |
//! | + | + | + |
//! |___|___|___|
//! ```
//!

/// Blur a row-major `rows x columns` field of penalties with a kernel
/// extending `blur_size` cells either side of the centre. Returns the
/// blurred field alongside its `(min, max)` values.
///
/// Averages are rounded half away from zero. The kernel area is always odd
/// so an integer sum never lands exactly on a half.
pub fn box_blur(
	penalties: &[i32],
	rows: usize,
	columns: usize,
	blur_size: usize,
) -> (Vec<i32>, (i32, i32)) {
	if penalties.len() != rows * columns {
		panic!(
			"Cannot blur penalties, expected {} values for a {}x{} grid, found {}",
			rows * columns,
			rows,
			columns,
			penalties.len()
		);
	}
	let extent = blur_size as isize;
	let kernel_width = 2 * blur_size as i64 + 1;
	let kernel_area = kernel_width * kernel_width;
	let index = |row: usize, column: usize| row * columns + column;

	// horizontal pass, sliding along the columns of each row
	let mut horizontal = vec![0i64; rows * columns];
	for row in 0..rows {
		let mut sum = 0;
		for offset in -extent..=extent {
			let column = clamp_index(offset, columns);
			sum += penalties[index(row, column)] as i64;
		}
		horizontal[index(row, 0)] = sum;
		for column in 1..columns {
			let remove = clamp_index(column as isize - extent - 1, columns);
			let add = clamp_index(column as isize + extent, columns);
			sum += penalties[index(row, add)] as i64 - penalties[index(row, remove)] as i64;
			horizontal[index(row, column)] = sum;
		}
	}

	// vertical pass over the horizontal sums
	let mut blurred = vec![0i32; rows * columns];
	let mut min = i32::MAX;
	let mut max = i32::MIN;
	let mut store = |value: i64, at: usize, blurred: &mut Vec<i32>| {
		let average = (value as f64 / kernel_area as f64).round() as i32;
		blurred[at] = average;
		min = min.min(average);
		max = max.max(average);
	};
	for column in 0..columns {
		let mut sum = 0;
		for offset in -extent..=extent {
			let row = clamp_index(offset, rows);
			sum += horizontal[index(row, column)];
		}
		store(sum, index(0, column), &mut blurred);
		for row in 1..rows {
			let remove = clamp_index(row as isize - extent - 1, rows);
			let add = clamp_index(row as isize + extent, rows);
			sum += horizontal[index(add, column)] - horizontal[index(remove, column)];
			store(sum, index(row, column), &mut blurred);
		}
	}
	(blurred, (min, max))
}

/// Clamp a possibly out of range index to `0..len`
fn clamp_index(i: isize, len: usize) -> usize {
	i.clamp(0, len as isize - 1) as usize
}
