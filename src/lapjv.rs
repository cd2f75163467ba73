use crate::error::CompareError::{self, LapjvError};
use nalgebra::DMatrix;

/* -----------------------------------------------------------------------------
 * lapjv.rs - Jonker-Volgenant linear assignment algorithm (dense, square)
 * ----------------------------------------------------------------------------- */

// Upper bound for reduced costs. Kept far above any finite entry so the
// initial column duals never clip a real cost.
const LARGE: f64 = 1e15;

/// Dual variables and the partial assignment while solving one problem.
///
/// `x[i]` is the column assigned to row `i`, `y[j]` the row assigned to
/// column `j`; `-1` marks a free vertex.
struct Lapjv<'a> {
    n: usize,
    cost: &'a DMatrix<f64>,
    x: Vec<isize>,
    y: Vec<isize>,
    v: Vec<f64>,
}

impl<'a> Lapjv<'a> {
    fn new(cost: &'a DMatrix<f64>) -> Self {
        let n = cost.nrows();
        Self {
            n,
            cost,
            x: vec![-1; n],
            y: vec![0; n],
            v: vec![LARGE; n],
        }
    }

    #[inline(always)]
    fn c(&self, i: usize, j: usize) -> f64 {
        self.cost[(i, j)]
    }

    /// Column reduction and reduction transfer. Returns the rows left free.
    fn column_reduction(&mut self) -> Vec<usize> {
        let n = self.n;
        for i in 0..n {
            for j in 0..n {
                let c = self.c(i, j);
                if c < self.v[j] {
                    self.v[j] = c;
                    self.y[j] = i as isize;
                }
            }
        }

        let mut unique = vec![true; n];
        for j in (0..n).rev() {
            let i = self.y[j] as usize;
            if self.x[i] < 0 {
                self.x[i] = j as isize;
            } else {
                unique[i] = false;
                self.y[j] = -1;
            }
        }

        let mut free_rows = Vec::with_capacity(n);
        for i in 0..n {
            if self.x[i] < 0 {
                free_rows.push(i);
            } else if unique[i] {
                let j = self.x[i] as usize;
                let min = (0..n)
                    .filter(|&j2| j2 != j)
                    .map(|j2| self.c(i, j2) - self.v[j2])
                    .fold(LARGE, f64::min);
                self.v[j] -= min;
            }
        }
        free_rows
    }

    /// Augmenting row reduction. Consumes `free_rows` and returns the rows
    /// still free afterwards.
    fn augmenting_row_reduction(&mut self, mut free_rows: Vec<usize>) -> Vec<usize> {
        let n = self.n;
        let n_free = free_rows.len();
        let mut current = 0;
        let mut new_free = 0;
        let mut rr_cnt = 0;

        while current < n_free {
            rr_cnt += 1;
            let free_i = free_rows[current];
            current += 1;

            // lowest and second lowest reduced cost in this row
            let mut j1 = 0usize;
            let mut j2: Option<usize> = None;
            let mut v1 = self.c(free_i, 0) - self.v[0];
            let mut v2 = LARGE;
            for j in 1..n {
                let c = self.c(free_i, j) - self.v[j];
                if c < v2 {
                    if c >= v1 {
                        v2 = c;
                        j2 = Some(j);
                    } else {
                        v2 = v1;
                        v1 = c;
                        j2 = Some(j1);
                        j1 = j;
                    }
                }
            }

            let mut i0 = self.y[j1];
            let v1_new = self.v[j1] - (v2 - v1);
            let v1_lowers = v1_new < self.v[j1];

            if rr_cnt < current * n {
                if v1_lowers {
                    self.v[j1] = v1_new;
                } else if let (true, Some(j2)) = (i0 >= 0, j2) {
                    j1 = j2;
                    i0 = self.y[j2];
                }
                if i0 >= 0 {
                    if v1_lowers {
                        current -= 1;
                        free_rows[current] = i0 as usize;
                    } else {
                        free_rows[new_free] = i0 as usize;
                        new_free += 1;
                    }
                }
            } else if i0 >= 0 {
                free_rows[new_free] = i0 as usize;
                new_free += 1;
            }
            self.x[free_i] = j1 as isize;
            self.y[j1] = free_i as isize;
        }
        free_rows.truncate(new_free);
        free_rows
    }

    /// Moves the columns with minimal `d` among `cols[lo..]` to the front
    /// of that range and returns the end of the block.
    fn find_minimum(&self, lo: usize, d: &[f64], cols: &mut [usize]) -> usize {
        let mut hi = lo + 1;
        let mut mind = d[cols[lo]];
        for k in hi..self.n {
            let j = cols[k];
            if d[j] <= mind {
                if d[j] < mind {
                    hi = lo;
                    mind = d[j];
                }
                cols[k] = cols[hi];
                cols[hi] = j;
                hi += 1;
            }
        }
        hi
    }

    /// Scans the columns in `cols[lo..hi]`, relaxing the distances of the
    /// remaining columns. Returns a free column reached at minimal
    /// distance, if any.
    fn scan(
        &self,
        lo: &mut usize,
        hi: &mut usize,
        d: &mut [f64],
        cols: &mut [usize],
        pred: &mut [usize],
    ) -> Option<usize> {
        while *lo != *hi {
            let j = cols[*lo];
            *lo += 1;
            let i = self.y[j] as usize;
            let mind = d[j];
            let h = self.c(i, j) - self.v[j] - mind;
            for k in *hi..self.n {
                let j = cols[k];
                let cred_ij = self.c(i, j) - self.v[j] - h;
                if cred_ij < d[j] {
                    d[j] = cred_ij;
                    pred[j] = i;
                    if cred_ij == mind {
                        if self.y[j] < 0 {
                            return Some(j);
                        }
                        cols[k] = cols[*hi];
                        cols[*hi] = j;
                        *hi += 1;
                    }
                }
            }
        }
        None
    }

    /// Dijkstra-like shortest augmenting path from `start_i`. Updates the
    /// duals of the scanned columns and returns the free column found.
    fn find_path(&mut self, start_i: usize, pred: &mut [usize]) -> usize {
        let n = self.n;
        let mut lo = 0;
        let mut hi = 0;
        let mut n_ready = 0;
        let mut cols: Vec<usize> = (0..n).collect();
        let mut d: Vec<f64> = (0..n).map(|j| self.c(start_i, j) - self.v[j]).collect();
        pred.iter_mut().for_each(|p| *p = start_i);

        let final_j = loop {
            let mut found = None;
            if lo == hi {
                n_ready = lo;
                hi = self.find_minimum(lo, &d, &mut cols);
                for &j in &cols[lo..hi] {
                    if self.y[j] < 0 {
                        found = Some(j);
                    }
                }
            }
            if found.is_none() {
                found = self.scan(&mut lo, &mut hi, &mut d, &mut cols, pred);
            }
            if let Some(j) = found {
                break j;
            }
        };

        let mind = d[cols[lo]];
        for &j in &cols[..n_ready] {
            self.v[j] += d[j] - mind;
        }
        final_j
    }

    /// Augments along shortest paths until every row in `free_rows` is
    /// assigned.
    fn augment(&mut self, free_rows: &[usize]) {
        let mut pred = vec![0; self.n];
        for &free_row in free_rows {
            let mut j = self.find_path(free_row, &mut pred) as isize;
            let mut i = -1isize;
            let mut steps = 0;
            while i != free_row as isize {
                i = pred[j as usize] as isize;
                self.y[j as usize] = i;
                std::mem::swap(&mut j, &mut self.x[i as usize]);
                steps += 1;
                debug_assert!(steps <= self.n, "augmenting path longer than n");
            }
        }
    }
}

/// Solves the square assignment problem on `cost`, minimizing total cost.
///
/// Returns `x` with `x[row] = column`. All entries must be finite.
pub(crate) fn lapjv(cost: &DMatrix<f64>) -> Result<Vec<usize>, CompareError> {
    let n = cost.nrows();
    if n == 0 {
        return Err(LapjvError(format!(
            "cost.nrows() must be greater than 0, but cost.nrows() = {}",
            n
        )));
    }
    if n != cost.ncols() {
        return Err(LapjvError(format!(
            "cost must be square, but got {}x{}",
            n,
            cost.ncols()
        )));
    }
    if let Some(bad) = cost.iter().find(|c| !c.is_finite()) {
        return Err(LapjvError(format!(
            "cost entries must be finite, but found {}",
            bad
        )));
    }

    let mut solver = Lapjv::new(cost);
    let mut free_rows = solver.column_reduction();
    let mut passes = 0;
    while !free_rows.is_empty() && passes < 2 {
        free_rows = solver.augmenting_row_reduction(free_rows);
        passes += 1;
    }
    if !free_rows.is_empty() {
        solver.augment(&free_rows);
    }

    solver
        .x
        .iter()
        .map(|&j| {
            usize::try_from(j).map_err(|_| {
                LapjvError(format!("row left unassigned (x = {})", j))
            })
        })
        .collect()
}
