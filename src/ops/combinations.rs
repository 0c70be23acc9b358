/// Lazy enumeration of every strictly increasing `m`-subset of `0..n`, in
/// lexicographic order.
///
/// `m == 0` yields a single empty subset, `m > n` yields nothing.
#[derive(Clone, Debug)]
pub struct Combinations {
    n: usize,
    m: usize,
    state: Option<Vec<usize>>,
}

impl Combinations {
    pub fn new(n: usize, m: usize) -> Self {
        let state = (m <= n).then(|| (0..m).collect());
        Self { n, m, state }
    }

    /// Step `state` to its successor, `false` once exhausted.
    fn advance(state: &mut [usize], n: usize, m: usize) -> bool {
        for i in (0..m).rev() {
            if state[i] < i + n - m {
                state[i] += 1;
                for j in i + 1..m {
                    state[j] = state[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let state = self.state.as_mut()?;
        let current = state.clone();
        if !Self::advance(state, self.n, self.m) {
            self.state = None;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn four_choose_two() {
        let all: Vec<Vec<usize>> = Combinations::new(4, 2).collect();
        assert_eq!(all, vec![vec![0, 1], vec![0, 2], vec![0, 3], vec![1, 2], vec![1, 3], vec![2, 3]]);
    }

    #[test]
    fn choose_zero_yields_one_empty_subset() {
        assert_eq!(Combinations::new(3, 0).collect::<Vec<_>>(), vec![Vec::<usize>::new()]);
        assert_eq!(Combinations::new(0, 0).count(), 1);
    }

    #[test]
    fn m_greater_than_n_yields_nothing() {
        assert_eq!(Combinations::new(2, 3).next(), None);
    }

    #[test]
    fn counts_match_binomial() {
        assert_eq!(Combinations::new(7, 3).count(), 35);
        assert_eq!(Combinations::new(5, 5).collect::<Vec<_>>(), vec![vec![0, 1, 2, 3, 4]]);
        assert!(Combinations::new(9, 4).all(|c| c.windows(2).all(|w| w[0] < w[1])));
    }
}
