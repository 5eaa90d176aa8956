//! Display colors for risk tiers and incident severities

use crate::types::RiskLevel;

/// Severity colors for 1 through 5
pub const SEVERITY_COLORS: [&str; 5] = ["#4CAF50", "#8BC34A", "#FFEB3B", "#FF9800", "#F44336"];

pub fn risk_level_color(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Variable => "#4CAF50",
        RiskLevel::Increased => "#FF9800",
        RiskLevel::Severe => "#F44336",
        RiskLevel::Extreme => "#D32F2F",
    }
}

/// Color for a severity. Values off the 1-5 scale fall back to the severity-1 color.
pub fn severity_color(severity: i32) -> &'static str {
    usize::try_from(severity.saturating_sub(1))
        .ok()
        .and_then(|idx| SEVERITY_COLORS.get(idx))
        .copied()
        .unwrap_or(SEVERITY_COLORS[0])
}
