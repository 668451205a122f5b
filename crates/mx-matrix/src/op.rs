use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// The closed set of matrix operations a backend can execute.
///
/// Each operation maps to a distinct bit so that a backend's supported
/// subset packs into a single [`OpSet`] word. The bit layout is sparse;
/// the gaps are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Multiply,
    DotProduct,
    MultiplyElementwise,
    Subtract,
    MinIndex,
    MaxIndex,
    GetColumn,
    GetRow,
    Negate,
    Normalize,
    Norm2,
    EuclideanDistance,
    CosineDistance,
    Exp,
    Log,
    Abs,
    Floor,
    Round,
    Ceil,
    Copy,
}

impl Operation {
    /// Every member of the catalog, in declaration order.
    pub const ALL: [Operation; 21] = [
        Operation::Add,
        Operation::Multiply,
        Operation::DotProduct,
        Operation::MultiplyElementwise,
        Operation::Subtract,
        Operation::MinIndex,
        Operation::MaxIndex,
        Operation::GetColumn,
        Operation::GetRow,
        Operation::Negate,
        Operation::Normalize,
        Operation::Norm2,
        Operation::EuclideanDistance,
        Operation::CosineDistance,
        Operation::Exp,
        Operation::Log,
        Operation::Abs,
        Operation::Floor,
        Operation::Round,
        Operation::Ceil,
        Operation::Copy,
    ];

    /// The bit identifying this operation inside an [`OpSet`].
    pub fn bit(self) -> u64 {
        match self {
            Operation::Add => 1,
            Operation::Multiply => 1 << 2,
            Operation::DotProduct => 1 << 6,
            Operation::MultiplyElementwise => 1 << 7,
            Operation::Subtract => 1 << 8,
            Operation::MinIndex => 1 << 10,
            Operation::MaxIndex => 1 << 11,
            Operation::GetColumn => 1 << 14,
            Operation::GetRow => 1 << 15,
            Operation::Negate => 1 << 18,
            Operation::Normalize => 1 << 21,
            Operation::Norm2 => 1 << 22,
            Operation::EuclideanDistance => 1 << 25,
            Operation::CosineDistance => 1 << 26,
            Operation::Exp => 1 << 29,
            Operation::Log => 1 << 30,
            Operation::Copy => 1 << 33,
            Operation::Abs => 1 << 41,
            Operation::Floor => 1 << 42,
            Operation::Round => 1 << 43,
            Operation::Ceil => 1 << 44,
        }
    }

    /// Returns true for operations that take two matrix operands at
    /// execution time.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Operation::Add
                | Operation::Multiply
                | Operation::DotProduct
                | Operation::MultiplyElementwise
                | Operation::Subtract
                | Operation::EuclideanDistance
                | Operation::CosineDistance
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Multiply => "multiply",
            Operation::DotProduct => "dot_product",
            Operation::MultiplyElementwise => "multiply_elementwise",
            Operation::Subtract => "subtract",
            Operation::MinIndex => "min_index",
            Operation::MaxIndex => "max_index",
            Operation::GetColumn => "get_column",
            Operation::GetRow => "get_row",
            Operation::Negate => "negate",
            Operation::Normalize => "normalize",
            Operation::Norm2 => "norm2",
            Operation::EuclideanDistance => "euclidean_distance",
            Operation::CosineDistance => "cosine_distance",
            Operation::Exp => "exp",
            Operation::Log => "log",
            Operation::Abs => "abs",
            Operation::Floor => "floor",
            Operation::Round => "round",
            Operation::Ceil => "ceil",
            Operation::Copy => "copy",
        };
        write!(f, "{}", name)
    }
}

/// A set of operations, used by backends to advertise which subset of
/// the catalog they implement.
///
/// This is a set, not a numeric field: membership is tested with
/// [`OpSet::contains`], sets combine with `|`, and no arithmetic on
/// operation identifiers is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpSet(u64);

impl OpSet {
    /// The empty set ("no operations").
    pub const EMPTY: OpSet = OpSet(0);

    /// The set containing every operation in the catalog.
    pub fn all() -> OpSet {
        Operation::ALL.iter().copied().collect()
    }

    /// Returns true if `op` is a member of this set.
    pub fn contains(&self, op: Operation) -> bool {
        self.0 & op.bit() != 0
    }

    /// Adds `op` to this set.
    pub fn insert(&mut self, op: Operation) {
        self.0 |= op.bit();
    }

    /// Returns true if this set contains no operations.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of operations in this set.
    pub fn len(&self) -> usize {
        Operation::ALL
            .iter()
            .filter(|op| self.contains(**op))
            .count()
    }

    /// Iterates over the members of this set in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL
            .iter()
            .copied()
            .filter(move |op| self.contains(*op))
    }
}

impl From<Operation> for OpSet {
    fn from(op: Operation) -> Self {
        OpSet(op.bit())
    }
}

impl FromIterator<Operation> for OpSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut set = OpSet::EMPTY;
        for op in iter {
            set.insert(op);
        }
        set
    }
}

impl BitOr for OpSet {
    type Output = OpSet;

    fn bitor(self, rhs: OpSet) -> OpSet {
        OpSet(self.0 | rhs.0)
    }
}

impl BitOr<Operation> for OpSet {
    type Output = OpSet;

    fn bitor(self, rhs: Operation) -> OpSet {
        OpSet(self.0 | rhs.bit())
    }
}

impl BitOrAssign for OpSet {
    fn bitor_assign(&mut self, rhs: OpSet) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for OpSet {
    type Output = OpSet;

    fn bitand(self, rhs: OpSet) -> OpSet {
        OpSet(self.0 & rhs.0)
    }
}

impl fmt::Display for OpSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, op) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", op)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_distinct() {
        for (i, a) in Operation::ALL.iter().enumerate() {
            for b in &Operation::ALL[i + 1..] {
                assert_ne!(a.bit(), b.bit(), "{} and {} share a bit", a, b);
            }
        }
    }

    #[test]
    fn test_empty_set() {
        let set = OpSet::EMPTY;
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        for op in Operation::ALL {
            assert!(!set.contains(op));
        }
    }

    #[test]
    fn test_union_and_membership() {
        let set = OpSet::from(Operation::Add) | Operation::DotProduct;
        assert!(set.contains(Operation::Add));
        assert!(set.contains(Operation::DotProduct));
        assert!(!set.contains(Operation::Multiply));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_intersection() {
        let a = OpSet::from(Operation::Add) | Operation::Exp | Operation::Log;
        let b = OpSet::from(Operation::Exp) | Operation::Norm2;
        let both = a & b;
        assert!(both.contains(Operation::Exp));
        assert!(!both.contains(Operation::Add));
        assert!(!both.contains(Operation::Norm2));
    }

    #[test]
    fn test_all_contains_everything() {
        let all = OpSet::all();
        assert_eq!(all.len(), Operation::ALL.len());
        for op in Operation::ALL {
            assert!(all.contains(op));
        }
    }

    #[test]
    fn test_from_iterator() {
        let set: OpSet = [Operation::GetRow, Operation::GetColumn].into_iter().collect();
        assert!(set.contains(Operation::GetRow));
        assert!(set.contains(Operation::GetColumn));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_binary_classification() {
        assert!(Operation::Add.is_binary());
        assert!(Operation::DotProduct.is_binary());
        assert!(Operation::EuclideanDistance.is_binary());
        assert!(!Operation::Exp.is_binary());
        assert!(!Operation::GetColumn.is_binary());
    }
}
