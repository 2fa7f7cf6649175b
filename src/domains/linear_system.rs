//! Dense linear systems over a field, solved with Gaussian elimination.

use std::fmt::{Display, Write};
use std::ops::{Index, IndexMut};
use std::slice::Chunks;

use smallvec::SmallVec;

use super::{Field, RingPrinter};

/// A row-major matrix.
#[derive(Debug, Eq, PartialEq)]
pub struct Matrix<F: Field> {
    pub shape: (u32, u32),
    pub data: SmallVec<[F::Element; 25]>,
    pub field: F,
}

impl<F: Field> Matrix<F> {
    pub fn new(rows: u32, cols: u32, field: F) -> Matrix<F> {
        Matrix {
            shape: (rows, cols),
            data: (0..rows as usize * cols as usize)
                .map(|_| field.zero())
                .collect(),
            field,
        }
    }

    pub fn rows(&self) -> usize {
        self.shape.0 as usize
    }

    pub fn cols(&self) -> usize {
        self.shape.1 as usize
    }

    pub fn row_iter(&self) -> Chunks<'_, F::Element> {
        self.data.chunks(self.shape.1.max(1) as usize)
    }
}

impl<F: Field> Index<(u32, u32)> for Matrix<F> {
    type Output = F::Element;

    fn index(&self, index: (u32, u32)) -> &Self::Output {
        &self.data[(index.0 * self.shape.1 + index.1) as usize]
    }
}

impl<F: Field> IndexMut<(u32, u32)> for Matrix<F> {
    fn index_mut(&mut self, index: (u32, u32)) -> &mut F::Element {
        &mut self.data[(index.0 * self.shape.1 + index.1) as usize]
    }
}

impl<F: Field> Display for Matrix<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('{')?;
        for (ri, r) in self.row_iter().enumerate() {
            f.write_char('{')?;
            for (ci, c) in r.iter().enumerate() {
                write!(f, "{}", RingPrinter::new(&self.field, c))?;
                if ci + 1 < self.cols() {
                    f.write_char(',')?;
                }
            }
            f.write_char('}')?;
            if ri + 1 < self.rows() {
                f.write_char(',')?;
            }
        }
        f.write_char('}')
    }
}

/// Error from the linear solver.
#[derive(Debug)]
pub enum LinearSolverError<F: Field> {
    /// The system has fewer independent equations than unknowns. The row reduced
    /// augmented matrix is included when the elimination got that far.
    Underdetermined {
        min_rank: u32,
        max_rank: u32,
        row_reduced_matrix: Option<Matrix<F>>,
    },
    Inconsistent,
}

impl<F: Field> Matrix<F> {
    /// Bring the first `max_col` columns into row echelon form, carrying
    /// along the other columns. Returns the rank.
    pub fn solve_subsystem(&mut self, max_col: u32) -> Result<u32, LinearSolverError<F>> {
        let (neqs, ncols) = self.shape;

        if neqs < max_col {
            return Err(LinearSolverError::Underdetermined {
                min_rank: 0,
                max_rank: neqs,
                row_reduced_matrix: None,
            });
        }

        let mut i = 0;
        for j in 0..max_col {
            if F::is_zero(&self[(i, j)]) {
                // select a non-zero pivot
                for k in i + 1..neqs {
                    if !F::is_zero(&self[(k, j)]) {
                        for l in j..ncols {
                            let old = self[(i, l)].clone();
                            self[(i, l)] = self[(k, l)].clone();
                            self[(k, l)] = old;
                        }
                        break;
                    }
                }
                if F::is_zero(&self[(i, j)]) {
                    return Err(LinearSolverError::Underdetermined {
                        min_rank: i,
                        max_rank: max_col - 1,
                        row_reduced_matrix: None,
                    });
                }
            }

            let inv_x = self.field.inv(&self[(i, j)]);
            for k in i + 1..neqs {
                if !F::is_zero(&self[(k, j)]) {
                    let s = self.field.mul(&self[(k, j)], &inv_x);
                    self[(k, j)] = self.field.zero();
                    for l in j + 1..ncols {
                        self[(k, l)] = self
                            .field
                            .sub(&self[(k, l)], &self.field.mul(&self[(i, l)], &s));
                    }
                }
            }

            i += 1;
            if i >= neqs {
                break;
            }
        }

        Ok(i)
    }

    /// Solve `A * x = b` for `x`, where `A` is `self`.
    pub fn solve(&self, b: &Matrix<F>) -> Result<Matrix<F>, LinearSolverError<F>> {
        assert!(self.shape.0 == b.shape.0 && b.shape.1 == 1 && self.field == b.field);

        let (neqs, nvars) = self.shape;

        if neqs < nvars {
            return Err(LinearSolverError::Underdetermined {
                min_rank: 0,
                max_rank: neqs,
                row_reduced_matrix: None,
            });
        }

        // the augmented matrix
        let mut m = Matrix::new(neqs, nvars + 1, self.field.clone());
        for r in 0..neqs {
            for c in 0..nvars {
                m[(r, c)] = self[(r, c)].clone();
            }
            m[(r, nvars)] = b.data[r as usize].clone();
        }

        let rank = match m.solve_subsystem(nvars) {
            Ok(i) => i,
            Err(mut x) => {
                if let LinearSolverError::Underdetermined {
                    row_reduced_matrix, ..
                } = &mut x
                {
                    *row_reduced_matrix = Some(m);
                }
                return Err(x);
            }
        };

        for k in rank..neqs {
            if !F::is_zero(&m[(k, nvars)]) {
                return Err(LinearSolverError::Inconsistent);
            }
        }

        if rank < nvars {
            return Err(LinearSolverError::Underdetermined {
                min_rank: rank,
                max_rank: rank,
                row_reduced_matrix: Some(m),
            });
        }

        // back substitution
        for i in (0..nvars).rev() {
            if !m.field.is_one(&m[(i, i)]) {
                let inv_x = m.field.inv(&m[(i, i)]);
                m[(i, nvars)] = m.field.mul(&m[(i, nvars)], &inv_x);
            }
            for k in 0..i {
                if !F::is_zero(&m[(k, i)]) {
                    m[(k, nvars)] = m
                        .field
                        .sub(&m[(k, nvars)], &m.field.mul(&m[(i, nvars)], &m[(k, i)]));
                }
            }
        }

        Ok(Matrix {
            shape: (nvars, 1),
            data: (0..nvars).map(|i| m[(i, nvars)].clone()).collect(),
            field: m.field,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::domains::finite_field::FiniteField;

    use super::{LinearSolverError, Matrix};

    fn matrix(rows: u32, cols: u32, data: &[u64]) -> Matrix<FiniteField> {
        Matrix {
            shape: (rows, cols),
            data: data.iter().copied().collect(),
            field: FiniteField::new(17),
        }
    }

    #[test]
    fn solve() {
        let a = matrix(3, 3, &[1, 1, 2, 3, 4, 3, 16, 5, 5]);
        let b = matrix(3, 1, &[3, 15, 8]);
        let r = a.solve(&b).unwrap();
        assert_eq!(&r.data[..], &[2, 3, 16]);

        let r = matrix(1, 1, &[12]).solve(&matrix(1, 1, &[7])).unwrap();
        assert_eq!(&r.data[..], &[2]);
    }

    #[test]
    fn pivoting() {
        let a = matrix(2, 2, &[0, 1, 1, 0]);
        let r = a.solve(&matrix(2, 1, &[5, 6])).unwrap();
        assert_eq!(&r.data[..], &[6, 5]);
    }

    #[test]
    fn underdetermined() {
        let r = matrix(2, 3, &[1, 1, 2, 3, 4, 3]).solve(&matrix(2, 1, &[3, 15]));
        assert!(matches!(
            r,
            Err(LinearSolverError::Underdetermined {
                min_rank: 0,
                max_rank: 2,
                ..
            })
        ));

        // the second row is twice the first
        let r = matrix(2, 2, &[1, 2, 2, 4]).solve(&matrix(2, 1, &[3, 6]));
        match r {
            Err(LinearSolverError::Underdetermined {
                row_reduced_matrix: Some(m),
                ..
            }) => assert_eq!(m.row_iter().nth(1), Some(&[0, 0, 0][..])),
            _ => panic!("expected an underdetermined system"),
        }
    }

    #[test]
    fn inconsistent() {
        let r = matrix(2, 1, &[1, 1]).solve(&matrix(2, 1, &[1, 2]));
        assert!(matches!(r, Err(LinearSolverError::Inconsistent)));
    }
}
