//! Plain-text rendering of session reports and history.

use std::fmt;

use till_core::{SessionRecord, SessionReport};

const RULE: &str = "------------------------------------------------------------";

/// Text view of a [`SessionReport`].
pub struct ReportView<'a>(pub &'a SessionReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;

        writeln!(f, "{} ({})", r.company_name, r.company_id)?;
        writeln!(f, "Session {} [{}]", r.session_id, r.status)?;
        writeln!(f, "Opened  {} by {}", r.opened_at.format("%Y-%m-%d %H:%M"), r.opened_by_name)?;
        if let (Some(at), Some(by)) = (r.closed_at, r.closed_by_name.as_deref()) {
            writeln!(f, "Closed  {} by {}", at.format("%Y-%m-%d %H:%M"), by)?;
        }
        writeln!(f, "{RULE}")?;

        writeln!(f, "{:<24}{:>14}", "Opening amount", r.opening_amount)?;
        writeln!(f, "{:<24}{:>14}", "Entries", r.total_entries)?;
        writeln!(f, "{:<24}{:>14}", "Exits", r.total_exits)?;
        writeln!(f, "{:<24}{:>14}", "Expected balance", r.expected_balance)?;
        if let (Some(closing), Some(difference)) = (r.closing_amount, r.difference) {
            writeln!(f, "{:<24}{:>14}", "Counted", closing)?;
            writeln!(f, "{:<24}{:>14}", "Difference", difference)?;
        }
        writeln!(f, "{:<24}{:>14}", "Sales", r.sale_count)?;

        if !r.payment_totals.is_empty() {
            writeln!(f, "{RULE}")?;
            writeln!(f, "{:<24}{:>12}{:>12}{:>12}", "Method", "Tendered", "Applied", "Change")?;
            for total in &r.payment_totals {
                writeln!(
                    f,
                    "{:<24}{:>12}{:>12}{:>12}",
                    total.label, total.total_tendered, total.total_applied, total.total_change
                )?;
            }
        }

        if !r.discounts.is_empty() {
            writeln!(f, "{RULE}")?;
            writeln!(f, "Discounts (total {})", r.total_discount)?;
            for line in &r.discounts {
                writeln!(f, "  {:<16}{:>10}  {}", line.sale_code, line.discount, line.reason)?;
            }
        }

        if !r.manual_movements.is_empty() {
            writeln!(f, "{RULE}")?;
            writeln!(f, "Manual movements")?;
            for line in &r.manual_movements {
                writeln!(
                    f,
                    "  {} {:<6}{:>10}  {:<8}{}",
                    line.recorded_at.format("%H:%M"),
                    line.movement_type,
                    line.amount,
                    line.method_label,
                    line.description
                )?;
            }
        }

        Ok(())
    }
}

/// One line per session, newest first.
pub struct HistoryView<'a>(pub &'a [SessionRecord]);

impl fmt::Display for HistoryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for session in self.0 {
            let closing = session
                .closing_amount
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{}  {}  {:<7}{:>12}{:>12}  {}",
                session.opened_at.format("%Y-%m-%d %H:%M"),
                session.id,
                session.status,
                session.opening_amount,
                closing,
                session.opened_by_name
            )?;
        }
        Ok(())
    }
}
