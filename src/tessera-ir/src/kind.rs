//! Node kind tags and the capability hierarchy.

use std::fmt;

macro_rules! node_kinds {
    ($( $kind:ident $(: $parent:ident)? ),* $(,)?) => {
        /// Tag of every node type, abstract capability classes included.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($kind),*
        }

        impl NodeKind {
            /// Every kind, parents listed before their children.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$kind),*];

            pub const fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$kind => stringify!($kind)),*
                }
            }

            /// Direct capability supertype, `None` for the root.
            pub const fn parent(self) -> Option<NodeKind> {
                match self {
                    $(NodeKind::$kind => node_kinds!(@parent $($parent)?)),*
                }
            }
        }
    };
    (@parent $parent:ident) => { Some(NodeKind::$parent) };
    (@parent) => { None };
}

node_kinds! {
    Node,
    Value: Node,
    TableNode: Node,
    SortKey: Node,
    NodeList: Node,

    Unary: Value,
    Binary: Value,
    Reduction: Value,
    NAry: Value,

    Literal: Value,
    TableColumn: Value,
    Alias: Value,
    Cast: Value,
    IfNull: Value,
    NullIf: Value,
    Where: Value,
    SimpleCase: Value,
    SearchedCase: Value,
    Between: Value,
    Contains: Value,
    NotContains: Value,

    Negate: Unary,
    Not: Unary,
    BitwiseNot: Unary,
    IsNull: Unary,
    NotNull: Unary,
    IsNan: Unary,
    IsInf: Unary,
    ZeroIfNull: Unary,
    NullIfZero: Unary,

    StringUnary: Unary,
    Lowercase: StringUnary,
    Uppercase: StringUnary,
    Strip: StringUnary,
    LStrip: StringUnary,
    RStrip: StringUnary,
    Capitalize: StringUnary,
    Reverse: StringUnary,
    StringLength: StringUnary,

    MathUnary: Unary,
    Abs: MathUnary,
    Ceil: MathUnary,
    Floor: MathUnary,
    Exp: MathUnary,
    Ln: MathUnary,
    Log2: MathUnary,
    Log10: MathUnary,
    Sqrt: MathUnary,
    Sign: MathUnary,
    Acos: MathUnary,
    Asin: MathUnary,
    Atan: MathUnary,
    Cos: MathUnary,
    Sin: MathUnary,
    Tan: MathUnary,
    Cot: MathUnary,
    Radians: MathUnary,
    Degrees: MathUnary,

    ExtractTemporalField: Unary,
    ExtractYear: ExtractTemporalField,
    ExtractQuarter: ExtractTemporalField,
    ExtractMonth: ExtractTemporalField,
    ExtractWeekOfYear: ExtractTemporalField,
    ExtractDayOfYear: ExtractTemporalField,
    ExtractDay: ExtractTemporalField,
    ExtractHour: ExtractTemporalField,
    ExtractMinute: ExtractTemporalField,
    ExtractSecond: ExtractTemporalField,
    ExtractMillisecond: ExtractTemporalField,
    ExtractEpochSeconds: Unary,
    DayOfWeekIndex: Unary,
    DayOfWeekName: Unary,
    Date: Unary,
    ArrayLength: Unary,

    Comparison: Binary,
    Equals: Comparison,
    NotEquals: Comparison,
    Greater: Comparison,
    GreaterEqual: Comparison,
    Less: Comparison,
    LessEqual: Comparison,

    LogicalBinary: Binary,
    And: LogicalBinary,
    Or: LogicalBinary,
    Xor: LogicalBinary,

    NumericBinary: Binary,
    Add: NumericBinary,
    Subtract: NumericBinary,
    Multiply: NumericBinary,
    Divide: NumericBinary,
    FloorDivide: NumericBinary,
    Modulus: NumericBinary,
    Power: NumericBinary,
    Atan2: NumericBinary,

    BitwiseBinary: Binary,
    BitwiseAnd: BitwiseBinary,
    BitwiseOr: BitwiseBinary,
    BitwiseXor: BitwiseBinary,
    BitwiseLeftShift: BitwiseBinary,
    BitwiseRightShift: BitwiseBinary,

    TemporalBinary: Binary,
    TimestampAdd: TemporalBinary,
    TimestampSub: TemporalBinary,
    TimestampDiff: TemporalBinary,
    DateAdd: TemporalBinary,
    DateSub: TemporalBinary,
    DateDiff: TemporalBinary,
    IntervalSubtract: TemporalBinary,

    Count: Reduction,
    CountDistinct: Reduction,
    CountStar: Reduction,
    Sum: Reduction,
    Mean: Reduction,
    Min: Reduction,
    Max: Reduction,
    StandardDev: Reduction,
    Variance: Reduction,
    ApproxMedian: Reduction,
    ArrayCollect: Reduction,

    Coalesce: NAry,
    Greatest: NAry,
    Least: NAry,
    StringConcat: NAry,

    Substring: Value,
    StrRight: Value,
    StringFind: Value,
    FindInSet: Value,
    StringJoin: Value,
    StringLike: Value,
    StartsWith: Value,
    EndsWith: Value,
    StringContains: Value,
    StringReplace: Value,
    StringSplit: Value,
    RegexSearch: Value,
    RegexExtract: Value,
    RegexReplace: Value,
    LPad: Value,
    RPad: Value,
    Repeat: Value,
    ParseUrl: Value,

    Round: Value,
    Clip: Value,
    Log: Value,

    Strftime: Value,
    StringToTimestamp: Value,
    DateTruncate: Value,
    TimestampTruncate: Value,
    DateFromYmd: Value,
    TimestampFromYmdhms: Value,
    TimestampFromUnix: Value,
    TimestampNow: Value,
    IntervalFromInteger: Value,

    ArrayConcat: Value,
    ArrayColumn: Value,

    DatabaseTable: TableNode,
    InMemoryTable: TableNode,
    Selection: TableNode,
    Aggregation: TableNode,
    Limit: TableNode,
    DropNa: TableNode,
    FillNa: TableNode,
    Distinct: TableNode,
    Join: TableNode,
    InnerJoin: Join,
    LeftJoin: Join,
    RightJoin: Join,
    OuterJoin: Join,
    LeftSemiJoin: Join,
    LeftAntiJoin: Join,
}

impl NodeKind {
    /// This kind followed by its supertypes, most specific first.
    pub fn mro(self) -> Vec<NodeKind> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(parent) = current.parent() {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Whether this kind is `other` or one of its descendants.
    pub fn is_subclass_of(self, other: NodeKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    pub fn is_value(self) -> bool {
        self.is_subclass_of(NodeKind::Value)
    }

    pub fn is_table(self) -> bool {
        self.is_subclass_of(NodeKind::TableNode)
    }

    /// Look a kind up by name.
    pub fn from_name(name: &str) -> Option<NodeKind> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mro_walks_to_root() {
        assert_eq!(
            NodeKind::Lowercase.mro(),
            vec![
                NodeKind::Lowercase,
                NodeKind::StringUnary,
                NodeKind::Unary,
                NodeKind::Value,
                NodeKind::Node
            ]
        );
        assert_eq!(NodeKind::Node.mro(), vec![NodeKind::Node]);
    }

    #[test]
    fn test_subclass_checks() {
        assert!(NodeKind::RightJoin.is_subclass_of(NodeKind::Join));
        assert!(NodeKind::RightJoin.is_table());
        assert!(NodeKind::Negate.is_subclass_of(NodeKind::Unary));
        assert!(!NodeKind::Negate.is_subclass_of(NodeKind::StringUnary));
        assert!(!NodeKind::SortKey.is_value());
    }

    #[test]
    fn test_parents_precede_children() {
        for (i, kind) in NodeKind::ALL.iter().enumerate() {
            if let Some(parent) = kind.parent() {
                let parent_index = NodeKind::ALL.iter().position(|k| *k == parent).unwrap();
                assert!(parent_index < i, "{kind} listed before {parent}");
            }
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(NodeKind::from_name("StringFind"), Some(NodeKind::StringFind));
        assert_eq!(NodeKind::from_name("Nope"), None);
    }
}
