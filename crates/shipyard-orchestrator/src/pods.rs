//! Pod projection: pods are never stored, they are derived from a
//! deployment's ready replica count on every read.

use shipyard_state::{Deployment, Pod, PodPhase};
use uuid::Uuid;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// One running pod per ready replica, aged from the last update.
pub fn project_pods(deployment: &Deployment, now: u64) -> Vec<Pod> {
    let age = format_age(now.saturating_sub(deployment.updated_at));
    (0..deployment.ready_replicas)
        .map(|_| Pod {
            name: pod_name(&deployment.name),
            status: PodPhase::Running,
            ready: true,
            restarts: 0,
            age: age.clone(),
        })
        .collect()
}

/// `<deployment>-<8 hex chars>`; fresh on every projection.
fn pod_name(deployment_name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{deployment_name}-{}", &suffix[..8])
}

/// Largest whole unit only: `"42s"`, `"2m"`, `"3h"`, `"1d"`.
pub fn format_age(secs: u64) -> String {
    match secs {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m", s / MINUTE),
        s if s < DAY => format!("{}h", s / HOUR),
        s => format!("{}d", s / DAY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_uses_largest_unit() {
        assert_eq!(format_age(0), "0s");
        assert_eq!(format_age(42), "42s");
        assert_eq!(format_age(60), "1m");
        assert_eq!(format_age(150), "2m");
        assert_eq!(format_age(3 * 3600 + 59), "3h");
        assert_eq!(format_age(86_400), "1d");
        assert_eq!(format_age(10 * 86_400), "10d");
    }

    #[test]
    fn pod_names_are_prefixed_and_unique() {
        let a = pod_name("web");
        let b = pod_name("web");
        assert!(a.starts_with("web-"));
        assert_eq!(a.len(), "web-".len() + 8);
        assert_ne!(a, b);
    }
}
