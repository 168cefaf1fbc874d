//! Base kernels bound to input dimensions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StructureError;

/// The closed set of base kernel families.
///
/// The textual symbol of each kind is the one used in kernel expressions
/// such as `LIN0 * SE1 + PER2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// Constant (bias) kernel, not bound to any dimension.
    Constant,
    /// Linear kernel.
    Linear,
    /// Squared-exponential (RBF) kernel.
    SquaredExp,
    /// Periodic kernel.
    Periodic,
}

impl KernelKind {
    /// Every kind that can be bound to an input dimension.
    pub const BASE: [KernelKind; 3] = [
        KernelKind::Linear,
        KernelKind::SquaredExp,
        KernelKind::Periodic,
    ];

    /// Short symbol used in kernel expressions.
    pub fn symbol(&self) -> &'static str {
        match self {
            KernelKind::Constant => "C",
            KernelKind::Linear => "LIN",
            KernelKind::SquaredExp => "SE",
            KernelKind::Periodic => "PER",
        }
    }

    /// Whether this kind binds to an input dimension.
    pub fn is_dimensional(&self) -> bool {
        !matches!(self, KernelKind::Constant)
    }

    /// Look up a kind from its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "C" => Some(KernelKind::Constant),
            "LIN" => Some(KernelKind::Linear),
            "SE" => Some(KernelKind::SquaredExp),
            "PER" => Some(KernelKind::Periodic),
            _ => None,
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A single base kernel bound to one input dimension.
///
/// The constant kernel is the only atom without a dimension. Atoms order by
/// dimension first (the constant sorts before every bound atom), then kind,
/// which fixes the canonical order of factors inside a product term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Atom {
    dim: Option<usize>,
    kind: KernelKind,
}

impl Atom {
    /// Bind a dimensional kernel kind to `dim`.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::ConstantWithDimension`] for the constant kind.
    pub fn new(kind: KernelKind, dim: usize) -> Result<Self, StructureError> {
        if !kind.is_dimensional() {
            return Err(StructureError::ConstantWithDimension { dim });
        }
        Ok(Self {
            dim: Some(dim),
            kind,
        })
    }

    /// The constant (bias) atom.
    pub fn constant() -> Self {
        Self {
            dim: None,
            kind: KernelKind::Constant,
        }
    }

    /// Linear kernel on `dim`.
    pub fn linear(dim: usize) -> Self {
        Self {
            dim: Some(dim),
            kind: KernelKind::Linear,
        }
    }

    /// Squared-exponential kernel on `dim`.
    pub fn squared_exp(dim: usize) -> Self {
        Self {
            dim: Some(dim),
            kind: KernelKind::SquaredExp,
        }
    }

    /// Periodic kernel on `dim`.
    pub fn periodic(dim: usize) -> Self {
        Self {
            dim: Some(dim),
            kind: KernelKind::Periodic,
        }
    }

    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    /// The bound dimension, `None` for the constant atom.
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dim {
            Some(dim) => write!(f, "{}{}", self.kind.symbol(), dim),
            None => write!(f, "{}", self.kind.symbol()),
        }
    }
}

impl FromStr for Atom {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(s.len());
        let (symbol, digits) = s.split_at(split);

        let kind = KernelKind::from_symbol(symbol).ok_or_else(|| StructureError::Parse {
            input: s.to_string(),
            reason: format!("unknown kernel symbol '{}'", symbol),
        })?;

        if digits.is_empty() {
            return if kind.is_dimensional() {
                Err(StructureError::Parse {
                    input: s.to_string(),
                    reason: "missing dimension index".to_string(),
                })
            } else {
                Ok(Atom::constant())
            };
        }

        let dim = digits.parse::<usize>().map_err(|e| StructureError::Parse {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Atom::new(kind, dim)
    }
}
