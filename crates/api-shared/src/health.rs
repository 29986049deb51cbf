use serde::Serialize;

/// Health check response payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service usable by any CRS API boundary.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Checks health for the named service instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health(service_name: &str) -> HealthRes {
        HealthRes {
            ok: true,
            message: format!("{service_name} is alive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_reports_service_name() {
        let res = HealthService::check_health("crs");
        assert!(res.ok);
        assert_eq!(res.message, "crs is alive");
    }
}
