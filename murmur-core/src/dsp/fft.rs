//! In-place iterative radix-2 FFT over split real/imaginary `f64` buffers.
//!
//! ## Design
//!
//! The bit-reversal permutation and the twiddle table are derived once in
//! [`FftContext::new`] and reused for every frame. Forward transforms use
//! `e^{-2πik/N}`; inverse transforms conjugate the twiddles and scale by
//! `1/N`, so `inverse(forward(x)) == x` up to rounding.
//!
//! ```ignore
//! let fft = FftContext::new(9)?; // 512 points
//! fft.run(&mut re, &mut im, false)?;
//! fft.run(&mut re, &mut im, true)?;
//! ```

use std::f64::consts::PI;

use crate::error::{MurmurError, Result};

/// Largest accepted order: 2^24 points.
pub const MAX_ORDER: u32 = 24;

/// Precomputed state for a fixed power-of-two transform length.
#[derive(Debug, Clone)]
pub struct FftContext {
    order: u32,
    len: usize,
    /// `bit_reverse[i]` is `i` with its low `order` bits reversed.
    bit_reverse: Vec<usize>,
    /// `cos(2πk/N)` for `k < N/2`.
    cos: Vec<f64>,
    /// `sin(2πk/N)` for `k < N/2`.
    sin: Vec<f64>,
}

impl FftContext {
    /// Prepare a transform of `2^order` points.
    ///
    /// # Errors
    /// `MurmurError::InvalidFftOrder` when `order` exceeds [`MAX_ORDER`].
    pub fn new(order: u32) -> Result<Self> {
        if order > MAX_ORDER {
            return Err(MurmurError::InvalidFftOrder(order));
        }
        let len = 1usize << order;

        let bit_reverse = (0..len)
            .map(|i| if order == 0 { 0 } else { i.reverse_bits() >> (usize::BITS - order) })
            .collect();

        let half = len / 2;
        let (cos, sin): (Vec<f64>, Vec<f64>) = (0..half)
            .map(|k| {
                let angle = 2.0 * PI * k as f64 / len as f64;
                (angle.cos(), angle.sin())
            })
            .unzip();

        Ok(Self {
            order,
            len,
            bit_reverse,
            cos,
            sin,
        })
    }

    /// Smallest context whose length is at least `min_len`.
    pub fn covering(min_len: usize) -> Result<Self> {
        let order = min_len.max(1).next_power_of_two().trailing_zeros();
        Self::new(order)
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Transform `re`/`im` in place.
    ///
    /// # Errors
    /// `MurmurError::FftLengthMismatch` unless both slices are exactly
    /// [`len`](Self::len) long. Nothing is written in that case.
    pub fn run(&self, re: &mut [f64], im: &mut [f64], inverse: bool) -> Result<()> {
        if re.len() != self.len || im.len() != self.len {
            return Err(MurmurError::FftLengthMismatch {
                expected: self.len,
                re: re.len(),
                im: im.len(),
            });
        }
        self.transform(re, im, inverse);
        Ok(())
    }

    /// [`run`](Self::run) for buffers the caller sized from [`len`](Self::len).
    /// Panics on shorter slices.
    pub(crate) fn transform(&self, re: &mut [f64], im: &mut [f64], inverse: bool) {
        for (i, &j) in self.bit_reverse.iter().enumerate() {
            if i < j {
                re.swap(i, j);
                im.swap(i, j);
            }
        }

        let n = self.len;
        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size;
            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let w_re = self.cos[k * stride];
                    let w_im = if inverse {
                        self.sin[k * stride]
                    } else {
                        -self.sin[k * stride]
                    };

                    let a = start + k;
                    let b = a + half;
                    let t_re = w_re * re[b] - w_im * im[b];
                    let t_im = w_re * im[b] + w_im * re[b];

                    re[b] = re[a] - t_re;
                    im[b] = im[a] - t_im;
                    re[a] += t_re;
                    im[a] += t_im;
                }
            }
            size *= 2;
        }

        if inverse {
            let scale = 1.0 / n as f64;
            re.iter_mut().for_each(|v| *v *= scale);
            im.iter_mut().for_each(|v| *v *= scale);
        }
    }
}
