use crate::api::HealthReport;

/// Connection indicator shown in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub text: String,
}

impl ConnectionStatus {
    pub fn new(connected: bool, text: impl Into<String>) -> Self {
        Self {
            connected,
            text: text.into(),
        }
    }

    /// Shown before the first health check completes.
    pub fn connecting() -> Self {
        Self::new(false, "Connecting...")
    }

    pub fn from_health(report: &HealthReport) -> Self {
        if report.status == "healthy" && report.mcp_connected {
            Self::new(
                true,
                format!("Connected ({} tools available)", report.tools_available),
            )
        } else {
            Self::new(false, "MCP Server disconnected")
        }
    }

    pub fn connection_failed() -> Self {
        Self::new(false, "Connection failed")
    }

    pub fn session_failed() -> Self {
        Self::new(false, "Failed to create session")
    }

    pub fn css_class(&self) -> &'static str {
        if self.connected {
            "status-dot"
        } else {
            "status-dot disconnected"
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::connecting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: &str, mcp_connected: bool, tools_available: u32) -> HealthReport {
        HealthReport {
            status: status.to_string(),
            mcp_connected,
            tools_available,
        }
    }

    #[test]
    fn test_healthy_and_connected() {
        let status = ConnectionStatus::from_health(&report("healthy", true, 6));
        assert!(status.connected);
        assert_eq!(status.text, "Connected (6 tools available)");
        assert_eq!(status.css_class(), "status-dot");
    }

    #[test]
    fn test_healthy_without_mcp_is_disconnected() {
        let status = ConnectionStatus::from_health(&report("healthy", false, 0));
        assert!(!status.connected);
        assert_eq!(status.text, "MCP Server disconnected");
        assert_eq!(status.css_class(), "status-dot disconnected");
    }

    #[test]
    fn test_degraded_is_disconnected() {
        let status = ConnectionStatus::from_health(&report("degraded", true, 3));
        assert!(!status.connected);
    }

    #[test]
    fn test_failure_texts() {
        assert_eq!(ConnectionStatus::connection_failed().text, "Connection failed");
        assert_eq!(ConnectionStatus::session_failed().text, "Failed to create session");
        assert!(!ConnectionStatus::default().connected);
    }
}
