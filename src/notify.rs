//! Terminal stand-in for the site's toast notifications.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    fn tag(&self) -> &'static str {
        match self {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Warning => "warn",
        }
    }
}

pub fn toast_line(message: &str, severity: Severity) -> String {
    format!("[{}] {}", severity.tag(), message)
}

/// Print a toast: `[ok] Deluxe Room booked successfully!`
pub fn toast(message: &str, severity: Severity) {
    println!("{}", toast_line(message, severity));
}
