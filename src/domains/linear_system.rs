//! Dense linear systems over a field, solved by Gaussian elimination.

use std::{
    ops::{Index, IndexMut},
    slice::Chunks,
};

use smallvec::SmallVec;

use super::Field;

/// A dense matrix stored in row-major order.
#[derive(Debug, Clone, Eq, PartialEq)]
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

    /// Create a matrix from row-major data.
    pub fn from_rows(rows: u32, cols: u32, data: SmallVec<[F::Element; 25]>, field: F) -> Matrix<F> {
        debug_assert_eq!(data.len(), rows as usize * cols as usize);
        Matrix {
            shape: (rows, cols),
            data,
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
        self.data.chunks(self.cols().max(1))
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

/// Error from the linear solver.
#[derive(Debug)]
pub enum LinearSolverError<F: Field> {
    /// The system has more than one solution. The row-reduced augmented
    /// matrix is included when elimination got far enough to produce it.
    Underdetermined {
        min_rank: u32,
        max_rank: u32,
        row_reduced_matrix: Option<Matrix<F>>,
    },
    Inconsistent,
}

impl<F: Field> Matrix<F> {
    /// Bring the first `max_col` columns into row echelon form. The other
    /// columns are augmented. Returns the rank.
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

    /// Solves `A * x = b` for `x`, where `A` is `self` and `b` is a column vector.
    pub fn solve(&self, b: &Matrix<F>) -> Result<Matrix<F>, LinearSolverError<F>> {
        debug_assert!(self.shape.0 == b.shape.0 && b.shape.1 == 1 && self.field == b.field);

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

        if rank < nvars || nvars == 0 {
            return Err(LinearSolverError::Underdetermined {
                min_rank: rank,
                max_rank: rank,
                row_reduced_matrix: Some(m),
            });
        }

        // back substitution
        let mut i = rank - 1;
        for j in (0..nvars).rev() {
            if !m.field.is_one(&m[(i, j)]) {
                let inv_x = m.field.inv(&m[(i, j)]);
                m[(i, nvars)] = m.field.mul(&m[(i, nvars)], &inv_x);
            }
            for k in 0..i {
                if !F::is_zero(&m[(k, j)]) {
                    m[(k, nvars)] = m
                        .field
                        .sub(&m[(k, nvars)], &m.field.mul(&m[(i, nvars)], &m[(k, j)]));
                }
            }
            if i == 0 {
                break;
            }
            i -= 1;
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
    use smallvec::SmallVec;

    use crate::domains::finite_field::{FiniteField, FiniteFieldElement};

    use super::{LinearSolverError, Matrix};

    fn matrix(rows: u32, cols: u32, data: &[u32]) -> Matrix<FiniteField> {
        let field = FiniteField::new(17);
        let data: SmallVec<[FiniteFieldElement; 25]> =
            data.iter().map(|n| field.to_element(*n)).collect();
        Matrix::from_rows(rows, cols, data, field)
    }

    fn values(m: &Matrix<FiniteField>) -> Vec<u32> {
        m.data.iter().map(|x| m.field.from_element(x)).collect()
    }

    #[test]
    fn trivial() {
        let r = matrix(1, 1, &[12]).solve(&matrix(1, 1, &[7])).unwrap();
        assert_eq!(values(&r), [2]);
    }

    #[test]
    fn three_by_three() {
        let a = matrix(3, 3, &[1, 1, 2, 3, 4, 3, 16, 5, 5]);
        let r = a.solve(&matrix(3, 1, &[3, 15, 8])).unwrap();
        assert_eq!(values(&r), [2, 3, 16]);
    }

    #[test]
    fn overdetermined() {
        let a = matrix(5, 3, &[1, 1, 2, 3, 4, 3, 9, 0, 11, 1, 1, 7, 2, 3, 8]);
        let r = a.solve(&matrix(5, 1, &[3, 15, 7, 6, 6])).unwrap();
        assert_eq!(values(&r), [11, 1, 4]);
    }

    #[test]
    fn underdetermined() {
        let a = matrix(2, 3, &[1, 1, 2, 3, 4, 3]);
        assert!(matches!(
            a.solve(&matrix(2, 1, &[3, 15])),
            Err(LinearSolverError::Underdetermined {
                min_rank: 0,
                max_rank: 2,
                ..
            })
        ));

        // the third row is a combination of the first two
        let a = matrix(3, 3, &[1, 1, 2, 3, 4, 3, 10, 7, 12]);
        match a.solve(&matrix(3, 1, &[3, 15, 12])) {
            Err(LinearSolverError::Underdetermined {
                min_rank: 2,
                max_rank: 2,
                row_reduced_matrix: Some(m),
            }) => {
                assert_eq!(m.shape, (3, 4));
                assert!(m.row_iter().last().unwrap().iter().all(|x| x.0 == 0));
            }
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn inconsistent() {
        let a = matrix(3, 2, &[1, 0, 0, 1, 1, 1]);
        assert!(matches!(
            a.solve(&matrix(3, 1, &[1, 1, 1])),
            Err(LinearSolverError::Inconsistent)
        ));
    }
}
