use std::collections::VecDeque;

use crate::fit::PolynomialFit;

/// Bounded FIFO of accepted fits for one boundary.
///
/// Newest entries sit at the front; pushing into a full history drops the
/// oldest one from the back.
#[derive(Debug, Clone)]
pub struct FitHistory {
    deque: VecDeque<PolynomialFit>,
    capacity: usize,
}

impl FitHistory {
    #[inline]
    pub fn with_capacity(cap: usize) -> Self {
        let capacity = cap.max(1);

        Self {
            deque: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Stores `fit`, returning the evicted oldest fit if the history was full.
    #[inline]
    pub fn push(&mut self, fit: PolynomialFit) -> Option<PolynomialFit> {
        let evicted = if self.is_full() {
            self.deque.pop_back()
        } else {
            None
        };

        self.deque.push_front(fit);

        evicted
    }

    /// Coefficient-wise mean of the stored fits, `None` while empty.
    pub fn effective_fit(&self) -> Option<PolynomialFit> {
        if self.deque.is_empty() {
            return None;
        }

        let n = self.deque.len() as f64;
        let sum = self.deque.iter().fold([0.0f64; 3], |mut acc, fit| {
            for (s, c) in acc.iter_mut().zip(fit.coefficients()) {
                *s += c;
            }
            acc
        });

        Some(PolynomialFit::new(sum[0] / n, sum[1] / n, sum[2] / n))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.deque.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.deque.len() == self.capacity
    }
}
