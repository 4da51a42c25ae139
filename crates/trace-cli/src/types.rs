use trace_codec::StageReport;

/// Reports from one pipeline invocation, in stage order.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub reports: Vec<StageReport>,
}

/// Result of encoding a dataset and decoding the encoded table unchanged.
#[derive(Debug)]
pub struct RoundtripResult {
    pub reports: Vec<StageReport>,
    pub columns: Vec<ColumnCheck>,
}

impl RoundtripResult {
    pub fn mismatches(&self) -> impl Iterator<Item = &ColumnCheck> {
        self.columns
            .iter()
            .filter(|check| !matches!(check.status, ColumnStatus::Matched))
    }

    pub fn has_mismatches(&self) -> bool {
        self.mismatches().next().is_some()
    }
}

/// Comparison of one raw column with its decoded counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    pub column: String,
    pub status: ColumnStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnStatus {
    /// Same multiset of values.
    Matched,
    /// Values differ after sorting both sides.
    Differs {
        count: usize,
        example: Option<(String, String)>,
    },
    /// Column absent from the decoded table (dropped or undeclared).
    Missing,
}
