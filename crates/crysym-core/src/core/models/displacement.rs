use crate::core::lattice::Lattice;
use nalgebra::{Matrix3, Matrix6, Vector6};

/// Tensor element `(row, column)` held at each position of the six-component
/// displacement vector `(U11, U22, U33, U12, U13, U23)`.
pub const ADP_INDICES: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];

/// Conventional names of the six displacement components, in storage order.
pub const ADP_LABELS: [&str; 6] = ["U11", "U22", "U33", "U12", "U13", "U23"];

/// Atomic displacement parameters of a site.
///
/// Anisotropic parameters are the six independent elements of the symmetric
/// displacement tensor expressed in the reciprocal-normalized lattice basis (the
/// convention of `U_ij` values in crystallographic data files), in Å².
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Displacement {
    /// A single mean-square displacement `U_iso`.
    Isotropic(f64),
    /// The components `(U11, U22, U33, U12, U13, U23)`.
    Anisotropic(Vector6<f64>),
}

impl Default for Displacement {
    fn default() -> Self {
        Displacement::Isotropic(0.0)
    }
}

/// Packs a 3x3 tensor into its six-component form, averaging the off-diagonal pairs.
pub fn tensor_to_vector(tensor: &Matrix3<f64>) -> Vector6<f64> {
    Vector6::from_fn(|k, _| {
        let (i, j) = ADP_INDICES[k];
        0.5 * (tensor[(i, j)] + tensor[(j, i)])
    })
}

/// Unpacks a six-component displacement vector into the symmetric 3x3 tensor.
pub fn vector_to_tensor(components: &Vector6<f64>) -> Matrix3<f64> {
    let mut tensor = Matrix3::zeros();
    for (k, &(i, j)) in ADP_INDICES.iter().enumerate() {
        tensor[(i, j)] = components[k];
        tensor[(j, i)] = components[k];
    }
    tensor
}

/// The action induced by a linear part `R` on six-component displacement vectors.
///
/// Column `k` holds the image of the `k`-th unit component under `U ↦ R·U·Rᵀ`, so that
/// `adp_action(R) * u` is the packed form of `R·U·Rᵀ`.
pub fn adp_action(rotation: &Matrix3<f64>) -> Matrix6<f64> {
    let mut action = Matrix6::zeros();
    for k in 0..6 {
        let mut unit = Vector6::zeros();
        unit[k] = 1.0;
        let image = rotation * vector_to_tensor(&unit) * rotation.transpose();
        action.set_column(k, &tensor_to_vector(&image));
    }
    action
}

impl Displacement {
    pub fn is_anisotropic(&self) -> bool {
        matches!(self, Displacement::Anisotropic(_))
    }

    /// Builds anisotropic parameters from a displacement tensor.
    pub fn from_tensor(tensor: &Matrix3<f64>) -> Self {
        Displacement::Anisotropic(tensor_to_vector(tensor))
    }

    /// The full displacement tensor in the reciprocal-normalized basis of `lattice`.
    ///
    /// An isotropic value becomes `U_iso` times the lattice's isotropic unit tensor.
    pub fn to_tensor(&self, lattice: &Lattice) -> Matrix3<f64> {
        match self {
            Displacement::Isotropic(u) => lattice.isotropic_unit() * *u,
            Displacement::Anisotropic(components) => vector_to_tensor(components),
        }
    }

    /// The six-component form of [`Displacement::to_tensor`].
    pub fn to_vector(&self, lattice: &Lattice) -> Vector6<f64> {
        match self {
            Displacement::Isotropic(_) => tensor_to_vector(&self.to_tensor(lattice)),
            Displacement::Anisotropic(components) => *components,
        }
    }

    /// Applies the linear part of a symmetry operation.
    ///
    /// Isotropic parameters are invariant. Anisotropic parameters transform as the
    /// covariance of `R·p`, that is `U' = R·U·Rᵀ`.
    pub fn transformed(&self, rotation: &Matrix3<f64>) -> Self {
        match self {
            Displacement::Isotropic(u) => Displacement::Isotropic(*u),
            Displacement::Anisotropic(components) => {
                Displacement::Anisotropic(adp_action(rotation) * components)
            }
        }
    }

    /// The equivalent isotropic displacement `U_eq = ⅓ Σ U_ij a*_i a*_j (a_i · a_j)`.
    pub fn isotropic_equivalent(&self, lattice: &Lattice) -> f64 {
        match self {
            Displacement::Isotropic(u) => *u,
            Displacement::Anisotropic(components) => {
                let tensor = vector_to_tensor(components);
                let reciprocal = lattice.reciprocal_lengths();
                let metric = lattice.metric();
                let mut sum = 0.0;
                for i in 0..3 {
                    for j in 0..3 {
                        sum += tensor[(i, j)] * reciprocal[i] * reciprocal[j] * metric[(i, j)];
                    }
                }
                sum / 3.0
            }
        }
    }

    /// The displacement tensor in Cartesian coordinates.
    pub fn to_cartesian(&self, lattice: &Lattice) -> Matrix3<f64> {
        let normalized = lattice.base() * Matrix3::from_diagonal(lattice.reciprocal_lengths());
        normalized * self.to_tensor(lattice) * normalized.transpose()
    }

    /// Expresses a Cartesian displacement tensor as anisotropic parameters of `lattice`.
    pub fn from_cartesian(lattice: &Lattice, tensor: &Matrix3<f64>) -> Self {
        let inverse = Matrix3::from_diagonal(&lattice.reciprocal_lengths().map(|r| 1.0 / r))
            * lattice.inverse_base();
        Self::from_tensor(&(inverse * tensor * inverse.transpose()))
    }

    /// Collapses anisotropic parameters that describe an isotropic tensor within
    /// `tolerance` into their isotropic equivalent.
    pub fn collapsed(&self, lattice: &Lattice, tolerance: f64) -> Self {
        match self {
            Displacement::Anisotropic(components)
                if !lattice.is_anisotropic(&vector_to_tensor(components), tolerance) =>
            {
                Displacement::Isotropic(self.isotropic_equivalent(lattice))
            }
            other => *other,
        }
    }
}
